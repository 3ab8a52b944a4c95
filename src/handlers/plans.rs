use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};

use crate::error::{AppError, Result};
use crate::models::{
    check_session_details, parse_session_list, CreatePlanForm, PlanSession, TrainingPlan,
    WorkoutType,
};
use crate::repositories::{PlanRepository, SessionRepository};

#[derive(Clone)]
pub struct PlansState {
    pub plan_repo: PlanRepository,
    pub session_repo: SessionRepository,
}

// Templates
#[derive(Template)]
#[template(path = "plans/list.html")]
struct PlansListTemplate {
    plans: Vec<TrainingPlan>,
}

#[derive(Template)]
#[template(path = "plans/new.html")]
struct NewPlanTemplate {
    workout_types: Vec<WorkoutType>,
    name: String,
    description: String,
    yaml_sessions: String,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "plans/show.html")]
struct ShowPlanTemplate {
    plan: TrainingPlan,
    sessions: Vec<PlanSession>,
    completed: usize,
}

fn render_new_plan(template: NewPlanTemplate, status: StatusCode) -> Result<Response> {
    Ok((
        status,
        Html(
            template
                .render()
                .map_err(|e| AppError::Internal(e.to_string()))?,
        ),
    )
        .into_response())
}

// Handlers
pub async fn list(State(state): State<PlansState>) -> Result<Response> {
    let plans = state.plan_repo.find_all().await?;

    let template = PlansListTemplate { plans };

    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

pub async fn new_page(State(state): State<PlansState>) -> Result<Response> {
    let workout_types = state.plan_repo.workout_types().await?;

    let template = NewPlanTemplate {
        workout_types,
        name: String::new(),
        description: String::new(),
        yaml_sessions: String::new(),
        error: None,
    };

    render_new_plan(template, StatusCode::OK)
}

pub async fn create(
    State(state): State<PlansState>,
    Form(form): Form<CreatePlanForm>,
) -> Result<Response> {
    let name = form.name.trim().to_string();
    let description = form
        .description
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());
    let yaml_sessions = form.yaml_sessions.unwrap_or_default();

    let workout_type = state.plan_repo.find_workout_type(form.workout_type_id).await?;

    let checked = if name.is_empty() {
        Err("Plan name is required".to_string())
    } else if let Some(workout_type) = workout_type {
        parse_session_list(&yaml_sessions).and_then(|drafts| {
            check_session_details(workout_type.kind, &drafts)?;
            Ok((workout_type, drafts))
        })
    } else {
        Err(format!("Unknown workout type {}", form.workout_type_id))
    };

    let (workout_type, drafts) = match checked {
        Ok(valid) => valid,
        Err(message) => {
            tracing::debug!("Rejected plan form: {}", message);
            let template = NewPlanTemplate {
                workout_types: state.plan_repo.workout_types().await?,
                name,
                description: description.unwrap_or_default(),
                yaml_sessions,
                error: Some(message),
            };
            return render_new_plan(template, StatusCode::BAD_REQUEST);
        }
    };

    let plan = state
        .plan_repo
        .create_with_sessions(&name, &workout_type, description.as_deref(), drafts)
        .await?;

    Ok(Redirect::to(&format!("/plans/{}", plan.id)).into_response())
}

pub async fn show(State(state): State<PlansState>, Path(id): Path<i64>) -> Result<Response> {
    let plan = state
        .plan_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Plan not found".to_string()))?;

    let sessions = state.session_repo.find_by_plan(plan.id).await?;
    let completed = sessions.iter().filter(|s| s.completed).count();

    let template = ShowPlanTemplate {
        plan,
        sessions,
        completed,
    };

    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}
