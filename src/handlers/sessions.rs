use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};

use crate::error::{AppError, Result};
use crate::models::{CreateSessionForm, TrainingPlan};
use crate::repositories::{PlanRepository, SessionRepository};

#[derive(Clone)]
pub struct SessionsState {
    pub plan_repo: PlanRepository,
    pub session_repo: SessionRepository,
}

#[derive(Template)]
#[template(path = "sessions/new.html")]
struct NewSessionTemplate {
    plan: TrainingPlan,
    today: String,
}

async fn find_plan(state: &SessionsState, plan_id: i64) -> Result<TrainingPlan> {
    state
        .plan_repo
        .find_by_id(plan_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Plan not found".to_string()))
}

pub async fn new_page(
    State(state): State<SessionsState>,
    Path(plan_id): Path<i64>,
) -> Result<Response> {
    let plan = find_plan(&state, plan_id).await?;
    let today = chrono::Local::now()
        .date_naive()
        .format("%Y-%m-%dT08:00")
        .to_string();

    let template = NewSessionTemplate { plan, today };

    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

pub async fn create(
    State(state): State<SessionsState>,
    Path(plan_id): Path<i64>,
    Form(form): Form<CreateSessionForm>,
) -> Result<Response> {
    let plan = find_plan(&state, plan_id).await?;
    let draft = form.into_draft().map_err(AppError::BadRequest)?;

    let session_id = state.session_repo.create(&plan, draft).await?;
    tracing::info!("Created session {} in plan {}", session_id, plan.id);

    Ok(Redirect::to(&format!("/plans/{}", plan.id)).into_response())
}
