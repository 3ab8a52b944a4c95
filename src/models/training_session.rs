use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rusqlite::Row;
use serde::{Deserialize, Deserializer, Serialize};

use super::{FromSqliteRow, WorkoutKind};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse a scheduled timestamp as entered in forms or session lists.
///
/// Accepts `datetime-local` values, SQLite-style timestamps, RFC 3339 (the
/// wall-clock part is kept, the offset dropped) and bare dates (midnight).
pub fn parse_schedule(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Some(dt);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_local());
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Deserialize an optional integer from a form field.
/// Handles empty strings by returning None instead of failing.
fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// One session on the week grid, joined with its plan, workout type and the
/// cycling detail (absent for every other type).
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: i64,
    pub plan_id: i64,
    pub plan_name: String,
    pub description: String,
    pub scheduled_at: NaiveDateTime,
    pub workout_type: WorkoutKind,
    pub hf_max: Option<String>,
    pub completed: bool,
}

impl SessionSummary {
    pub fn time_label(&self) -> String {
        self.scheduled_at.format("%H:%M").to_string()
    }
}

impl FromSqliteRow for SessionSummary {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            plan_id: row.get("plan_id")?,
            plan_name: row.get("plan_name")?,
            description: row.get("description")?,
            scheduled_at: row.get("scheduled_at")?,
            workout_type: row.get("workout_type")?,
            hf_max: row.get("hf_max")?,
            completed: row.get("completed")?,
        })
    }
}

/// Lighter row for the month grid; no detail join.
#[derive(Debug, Clone, Serialize)]
pub struct MonthSession {
    pub plan_name: String,
    pub workout_type: WorkoutKind,
    pub scheduled_at: NaiveDateTime,
    pub completed: bool,
}

impl FromSqliteRow for MonthSession {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            plan_name: row.get("plan_name")?,
            workout_type: row.get("workout_type")?,
            scheduled_at: row.get("scheduled_at")?,
            completed: row.get("completed")?,
        })
    }
}

/// A session as listed on its plan's page.
#[derive(Debug, Clone, Serialize)]
pub struct PlanSession {
    pub id: i64,
    pub session_order: Option<i64>,
    pub description: String,
    pub scheduled_at: NaiveDateTime,
    pub completed: bool,
    pub hf_max: Option<String>,
}

impl PlanSession {
    pub fn scheduled_label(&self) -> String {
        self.scheduled_at.format("%a %Y-%m-%d %H:%M").to_string()
    }
}

impl FromSqliteRow for PlanSession {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            session_order: row.get("session_order")?,
            description: row.get("description")?,
            scheduled_at: row.get("scheduled_at")?,
            completed: row.get("completed")?,
            hf_max: row.get("hf_max")?,
        })
    }
}

/// Completed-vs-total counts for one (plan, workout type) group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressCount {
    pub plan_name: String,
    pub workout_type: WorkoutKind,
    pub completed: u32,
    pub total: u32,
}

impl FromSqliteRow for ProgressCount {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            plan_name: row.get("plan_name")?,
            workout_type: row.get("workout_type")?,
            completed: row.get("completed")?,
            total: row.get("total")?,
        })
    }
}

/// A session about to be written, before its detail is resolved against the
/// plan's workout type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDraft {
    pub order: Option<i64>,
    pub description: String,
    pub scheduled_at: NaiveDateTime,
    pub hf_max: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionForm {
    pub date: String,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub session_order: Option<i64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hf_max: Option<String>,
}

impl CreateSessionForm {
    pub fn into_draft(self) -> Result<SessionDraft, String> {
        let scheduled_at =
            parse_schedule(&self.date).ok_or_else(|| "Invalid date format".to_string())?;

        Ok(SessionDraft {
            order: self.session_order,
            description: self.description.trim().to_string(),
            scheduled_at,
            hf_max: self
                .hf_max
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        })
    }
}
