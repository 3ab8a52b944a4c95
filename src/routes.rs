use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{calendar, health, plans, sessions};

pub fn create_router(
    calendar_state: calendar::CalendarState,
    plans_state: plans::PlansState,
    sessions_state: sessions::SessionsState,
    health_state: health::HealthState,
) -> Router {
    Router::new()
        // Calendar
        .route("/", get(calendar::index))
        .route("/complete-session/{id}", post(calendar::complete_session))
        .with_state(calendar_state)
        // Plans
        .route("/plans", get(plans::list))
        .route("/plans/create", get(plans::new_page).post(plans::create))
        .route("/plans/{id}", get(plans::show))
        .with_state(plans_state)
        // Sessions
        .route(
            "/sessions/create/{plan_id}",
            get(sessions::new_page).post(sessions::create),
        )
        .with_state(sessions_state)
        .route("/health", get(health::health_check))
        .with_state(health_state)
        .layer(TraceLayer::new_for_http())
}
