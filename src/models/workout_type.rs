use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};
use rusqlite::Row;
use serde::Serialize;
use thiserror::Error;

use super::FromSqliteRow;

/// The fixed set of workout types. Each plan has exactly one, and it decides
/// which detail table its sessions extend into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutKind {
    Cycling,
    Mobility,
    Sandbag,
}

impl WorkoutKind {
    pub const ALL: [WorkoutKind; 3] = [
        WorkoutKind::Cycling,
        WorkoutKind::Mobility,
        WorkoutKind::Sandbag,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutKind::Cycling => "cycling",
            WorkoutKind::Mobility => "mobility",
            WorkoutKind::Sandbag => "sandbag",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            WorkoutKind::Cycling => "Cycling",
            WorkoutKind::Mobility => "Mobility",
            WorkoutKind::Sandbag => "Sandbag",
        }
    }

    pub fn is_cycling(&self) -> bool {
        matches!(self, WorkoutKind::Cycling)
    }

    /// Build the detail value for a session of this kind.
    ///
    /// Only cycling sessions carry a heart-rate target; handing one to any
    /// other kind is rejected rather than silently dropped.
    pub fn detail(&self, hf_max: Option<String>) -> Result<SessionDetail, String> {
        match (self, hf_max) {
            (WorkoutKind::Cycling, hf_max) => Ok(SessionDetail::Cycling { hf_max }),
            (WorkoutKind::Mobility, None) => Ok(SessionDetail::Mobility),
            (WorkoutKind::Sandbag, None) => Ok(SessionDetail::Sandbag),
            (kind, Some(_)) => Err(format!("hfmax is not valid for {} sessions", kind)),
        }
    }
}

impl fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown workout type: {0}")]
pub struct UnknownWorkoutKind(pub String);

impl FromStr for WorkoutKind {
    type Err = UnknownWorkoutKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkoutKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownWorkoutKind(s.to_string()))
    }
}

impl FromSql for WorkoutKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Type-specific extension of a session, stored 1:1 in the detail table
/// matching the plan's workout type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SessionDetail {
    Cycling { hf_max: Option<String> },
    Mobility,
    Sandbag,
}

/// A row of `workout_types`.
#[derive(Debug, Clone, Serialize)]
pub struct WorkoutType {
    pub id: i64,
    pub kind: WorkoutKind,
}

impl FromSqliteRow for WorkoutType {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            kind: row.get("name")?,
        })
    }
}
