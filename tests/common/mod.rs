#![allow(dead_code)]

use axum::Router;
use chrono::NaiveDateTime;

use training_tracker::db::{create_memory_pool, DbPool};
use training_tracker::handlers::{calendar, health, plans, sessions};
use training_tracker::migrations::run_migrations_for_tests;
use training_tracker::models::{SessionDraft, TrainingPlan};
use training_tracker::repositories::{PlanRepository, SessionRepository};

pub const CYCLING: i64 = 1;
pub const MOBILITY: i64 = 2;
pub const SANDBAG: i64 = 3;

pub fn setup_test_db() -> DbPool {
    let pool = create_memory_pool().expect("Failed to create test database");
    run_migrations_for_tests(&pool).expect("Failed to run migrations");
    pool
}

pub fn create_test_app(pool: DbPool) -> Router {
    let plan_repo = PlanRepository::new(pool.clone());
    let session_repo = SessionRepository::new(pool.clone());

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
    let health_state = health::HealthState { pool };

    training_tracker::routes::create_router(
        calendar_state,
        plans_state,
        sessions_state,
        health_state,
    )
}

// Test data creation helpers
pub async fn create_test_plan(pool: &DbPool, name: &str, workout_type_id: i64) -> TrainingPlan {
    let plan_repo = PlanRepository::new(pool.clone());
    let workout_type = plan_repo
        .find_workout_type(workout_type_id)
        .await
        .unwrap()
        .unwrap();
    plan_repo.create(name, &workout_type, None).await.unwrap()
}

pub async fn create_test_session(
    pool: &DbPool,
    plan: &TrainingPlan,
    description: &str,
    scheduled_at: NaiveDateTime,
    hf_max: Option<&str>,
) -> i64 {
    let session_repo = SessionRepository::new(pool.clone());
    session_repo
        .create(
            plan,
            SessionDraft {
                order: None,
                description: description.to_string(),
                scheduled_at,
                hf_max: hf_max.map(|s| s.to_string()),
            },
        )
        .await
        .unwrap()
}

pub fn count_rows(pool: &DbPool, table: &str) -> i64 {
    let conn = pool.get().unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })
    .unwrap()
}

pub fn is_completed(pool: &DbPool, session_id: i64) -> bool {
    let conn = pool.get().unwrap();
    conn.query_row(
        "SELECT completed FROM training_sessions WHERE id = ?",
        [session_id],
        |row| row.get(0),
    )
    .unwrap()
}
