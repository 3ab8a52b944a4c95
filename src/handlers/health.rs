use axum::{extract::State, Json};
use serde::Serialize;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::version::GIT_VERSION;

#[derive(Clone)]
pub struct HealthState {
    pub pool: DbPool,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    git_version: &'static str,
}

/// Reports ok only when the store answers a trivial query.
pub async fn health_check(State(state): State<HealthState>) -> Result<Json<HealthResponse>> {
    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let conn = pool.get()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(Json(HealthResponse {
        status: "ok",
        git_version: GIT_VERSION,
    }))
}
