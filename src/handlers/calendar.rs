use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use url::{form_urlencoded, Url};

use crate::calendar::{self, CalendarViewModel};
use crate::error::{AppError, Result};
use crate::repositories::SessionRepository;

#[derive(Clone)]
pub struct CalendarState {
    pub session_repo: SessionRepository,
}

#[derive(Template)]
#[template(path = "calendar/index.html")]
struct CalendarTemplate {
    calendar: CalendarViewModel,
}

#[derive(Deserialize)]
pub struct CalendarQuery {
    #[serde(rename = "weekOffset")]
    week_offset: Option<String>,
}

/// Absent or unparsable offsets fall back to the current week.
pub fn parse_week_offset(raw: Option<&str>) -> i32 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}

/// The `weekOffset` carried by the page the request came from, if it is a
/// valid offset. The value is returned as written, not reformatted.
///
/// The Referer header is client-supplied; it only ever selects which week to
/// show next.
fn referer_week_offset(referer: &str) -> Option<String> {
    let base = Url::parse("http://localhost/").ok()?;
    let url = base.join(referer).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "weekOffset")
        .map(|(_, value)| value.into_owned())
        .filter(|value| value.trim().parse::<i32>().is_ok())
}

/// Where to send the browser after completing a session: back to the week it
/// was looking at.
pub fn calendar_redirect(referer: Option<&str>) -> String {
    match referer.and_then(referer_week_offset) {
        Some(offset) => {
            let encoded: String = form_urlencoded::byte_serialize(offset.as_bytes()).collect();
            format!("/?weekOffset={}", encoded)
        }
        None => "/".to_string(),
    }
}

pub async fn index(
    State(state): State<CalendarState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Response> {
    let week_offset = parse_week_offset(query.week_offset.as_deref());
    let today = chrono::Local::now().date_naive();

    let calendar = calendar::load(&state.session_repo, today, week_offset).await?;

    let template = CalendarTemplate { calendar };

    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

pub async fn complete_session(
    State(state): State<CalendarState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Response> {
    if !state.session_repo.mark_completed(id).await? {
        return Err(AppError::NotFound("Session not found".to_string()));
    }
    tracing::info!("Session {} marked completed", id);

    let referer = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok());

    Ok(Redirect::to(&calendar_redirect(referer)).into_response())
}
