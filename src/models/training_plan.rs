use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::{FromSqliteRow, WorkoutKind};

/// A plan with its workout type resolved from `workout_types`.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingPlan {
    pub id: i64,
    pub name: String,
    pub workout_type_id: i64,
    pub workout_type: WorkoutKind,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for TrainingPlan {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            workout_type_id: row.get("workout_type_id")?,
            workout_type: row.get("workout_type")?,
            description: row.get("description")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePlanForm {
    pub name: String,
    pub workout_type_id: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub yaml_sessions: Option<String>,
}
