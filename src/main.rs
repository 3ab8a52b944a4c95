use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use training_tracker::config::Config;
use training_tracker::handlers::{calendar, health, plans, sessions};
use training_tracker::repositories::{PlanRepository, SessionRepository};
use training_tracker::{db, migrations, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "training_tracker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    tracing::info!("Connecting to database: {}", config.database_url);

    let pool = db::create_pool(&config.database_url)?;

    migrations::run_migrations(&pool)?;

    // Create repositories
    let plan_repo = PlanRepository::new(pool.clone());
    let session_repo = SessionRepository::new(pool.clone());

    // Create handler states
    let calendar_state = calendar::CalendarState {
        session_repo: session_repo.clone(),
    };
    let plans_state = plans::PlansState {
        plan_repo: plan_repo.clone(),
        session_repo: session_repo.clone(),
    };
    let sessions_state = sessions::SessionsState {
        plan_repo: plan_repo.clone(),
        session_repo: session_repo.clone(),
    };
    let health_state = health::HealthState { pool: pool.clone() };

    let app = routes::create_router(calendar_state, plans_state, sessions_state, health_state);

    let addr = config.server_addr();
    tracing::info!(
        "Starting server at http://{} ({})",
        addr,
        training_tracker::version::GIT_VERSION
    );

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
