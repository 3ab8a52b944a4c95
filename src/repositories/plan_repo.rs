use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{FromSqliteRow, SessionDraft, TrainingPlan, WorkoutType};
use crate::repositories::session_repo::{insert_sessions, resolve_details};

const PLAN_COLUMNS: &str = "SELECT p.id, p.name, p.workout_type_id, wt.name AS workout_type,
        p.description, p.created_at
 FROM training_plans p
 JOIN workout_types wt ON p.workout_type_id = wt.id";

#[derive(Clone)]
pub struct PlanRepository {
    pool: DbPool,
}

fn find_plan(conn: &Connection, id: i64) -> rusqlite::Result<Option<TrainingPlan>> {
    conn.query_row(
        &format!("{} WHERE p.id = ?", PLAN_COLUMNS),
        [id],
        TrainingPlan::from_row,
    )
    .optional()
}

fn insert_plan(
    conn: &Connection,
    name: &str,
    workout_type: &WorkoutType,
    description: Option<&str>,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO training_plans (name, workout_type_id, description, created_at)
         VALUES (?, ?, ?, ?)",
        rusqlite::params![name, workout_type.id, description, Utc::now()],
    )?;
    Ok(conn.last_insert_rowid())
}

impl PlanRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn workout_types(&self) -> Result<Vec<WorkoutType>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT id, name FROM workout_types ORDER BY id")?;
            let types = stmt
                .query_map([], WorkoutType::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(types)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_workout_type(&self, id: i64) -> Result<Option<WorkoutType>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let result = conn
                .query_row(
                    "SELECT id, name FROM workout_types WHERE id = ?",
                    [id],
                    WorkoutType::from_row,
                )
                .optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// All plans, newest first.
    pub async fn find_all(&self) -> Result<Vec<TrainingPlan>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(&format!(
                "{} ORDER BY p.created_at DESC, p.id DESC",
                PLAN_COLUMNS
            ))?;
            let plans = stmt
                .query_map([], TrainingPlan::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(plans)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<TrainingPlan>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            Ok(find_plan(&conn, id)?)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn create(
        &self,
        name: &str,
        workout_type: &WorkoutType,
        description: Option<&str>,
    ) -> Result<TrainingPlan> {
        self.create_with_sessions(name, workout_type, description, Vec::new())
            .await
    }

    /// Create a plan together with its initial sessions in one transaction.
    /// A failure anywhere leaves neither the plan nor any session behind.
    pub async fn create_with_sessions(
        &self,
        name: &str,
        workout_type: &WorkoutType,
        description: Option<&str>,
        drafts: Vec<SessionDraft>,
    ) -> Result<TrainingPlan> {
        let sessions = resolve_details(workout_type.kind, drafts)?;

        let pool = self.pool.clone();
        let name = name.to_string();
        let workout_type = workout_type.clone();
        let description = description.map(|s| s.to_string());

        let plan = tokio::task::spawn_blocking(move || -> Result<TrainingPlan> {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;

            let plan_id = insert_plan(&tx, &name, &workout_type, description.as_deref())?;
            insert_sessions(&tx, plan_id, &sessions)?;
            let plan = find_plan(&tx, plan_id)?
                .ok_or_else(|| AppError::Internal("created plan vanished".to_string()))?;

            tx.commit()?;
            Ok(plan)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        tracing::info!(
            "Created plan {} ({}) with workout type {}",
            plan.id,
            plan.name,
            plan.workout_type
        );
        Ok(plan)
    }
}
