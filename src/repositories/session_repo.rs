use chrono::NaiveDate;
use rusqlite::{Connection, Transaction};

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{
    FromSqliteRow, MonthSession, PlanSession, ProgressCount, SessionDetail, SessionDraft,
    SessionSummary, TrainingPlan, WorkoutKind,
};

#[derive(Clone)]
pub struct SessionRepository {
    pool: DbPool,
}

/// Pair every draft with the detail its plan's workout type calls for.
/// Fails before anything is written.
pub(crate) fn resolve_details(
    kind: WorkoutKind,
    drafts: Vec<SessionDraft>,
) -> Result<Vec<(SessionDraft, SessionDetail)>> {
    drafts
        .into_iter()
        .map(|mut draft| {
            let detail = kind
                .detail(draft.hf_max.take())
                .map_err(AppError::Validation)?;
            Ok((draft, detail))
        })
        .collect()
}

fn insert_detail(conn: &Connection, session_id: i64, detail: &SessionDetail) -> rusqlite::Result<()> {
    match detail {
        SessionDetail::Cycling { hf_max } => conn.execute(
            "INSERT INTO cycling_details (session_id, hf_max) VALUES (?, ?)",
            rusqlite::params![session_id, hf_max],
        )?,
        SessionDetail::Mobility => conn.execute(
            "INSERT INTO mobility_details (session_id) VALUES (?)",
            [session_id],
        )?,
        SessionDetail::Sandbag => conn.execute(
            "INSERT INTO sandbag_details (session_id) VALUES (?)",
            [session_id],
        )?,
    };
    Ok(())
}

/// Insert base rows and their detail rows inside the caller's transaction.
pub(crate) fn insert_sessions(
    tx: &Transaction,
    plan_id: i64,
    sessions: &[(SessionDraft, SessionDetail)],
) -> rusqlite::Result<Vec<i64>> {
    let mut ids = Vec::with_capacity(sessions.len());

    for (draft, detail) in sessions {
        tx.execute(
            "INSERT INTO training_sessions (plan_id, session_order, description, scheduled_at)
             VALUES (?, ?, ?, ?)",
            rusqlite::params![plan_id, draft.order, draft.description, draft.scheduled_at],
        )?;
        let session_id = tx.last_insert_rowid();
        insert_detail(tx, session_id, detail)?;
        ids.push(session_id);
    }

    Ok(ids)
}

impl SessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Sessions scheduled on `date` (time of day ignored), earliest first.
    pub async fn sessions_on_date(&self, date: NaiveDate) -> Result<Vec<SessionSummary>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT ts.id, ts.plan_id, p.name AS plan_name, ts.description, ts.scheduled_at,
                        wt.name AS workout_type, cd.hf_max, ts.completed
                 FROM training_sessions ts
                 JOIN training_plans p ON ts.plan_id = p.id
                 JOIN workout_types wt ON p.workout_type_id = wt.id
                 LEFT JOIN cycling_details cd ON ts.id = cd.session_id
                 WHERE DATE(ts.scheduled_at) = DATE(?)
                 ORDER BY ts.scheduled_at, ts.id",
            )?;
            let sessions = stmt
                .query_map([date], SessionSummary::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(sessions)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Sessions whose calendar date lies in `start..=end`, in one query.
    pub async fn sessions_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MonthSession>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT p.name AS plan_name, wt.name AS workout_type, ts.scheduled_at, ts.completed
                 FROM training_sessions ts
                 JOIN training_plans p ON ts.plan_id = p.id
                 JOIN workout_types wt ON p.workout_type_id = wt.id
                 WHERE DATE(ts.scheduled_at) BETWEEN DATE(?) AND DATE(?)
                 ORDER BY ts.scheduled_at, ts.id",
            )?;
            let sessions = stmt
                .query_map([start, end], MonthSession::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(sessions)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Completed and total session counts per (plan, workout type) for every
    /// session dated on or before `cutoff`. Empty groups never appear.
    pub async fn progress_as_of(&self, cutoff: NaiveDate) -> Result<Vec<ProgressCount>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT p.name AS plan_name, wt.name AS workout_type,
                        COALESCE(SUM(CASE WHEN ts.completed = 1 THEN 1 ELSE 0 END), 0) AS completed,
                        COUNT(*) AS total
                 FROM training_sessions ts
                 JOIN training_plans p ON ts.plan_id = p.id
                 JOIN workout_types wt ON p.workout_type_id = wt.id
                 WHERE DATE(ts.scheduled_at) <= DATE(?)
                 GROUP BY p.name, wt.name
                 HAVING COUNT(*) > 0
                 ORDER BY p.name, wt.name",
            )?;
            let counts = stmt
                .query_map([cutoff], ProgressCount::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(counts)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Set `completed` on a session. Repeating it is harmless; returns false
    /// only when no such session exists.
    pub async fn mark_completed(&self, id: i64) -> Result<bool> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "UPDATE training_sessions SET completed = 1 WHERE id = ?",
                [id],
            )?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_by_plan(&self, plan_id: i64) -> Result<Vec<PlanSession>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT ts.id, ts.session_order, ts.description, ts.scheduled_at, ts.completed,
                        cd.hf_max
                 FROM training_sessions ts
                 LEFT JOIN cycling_details cd ON ts.id = cd.session_id
                 WHERE ts.plan_id = ?
                 ORDER BY ts.session_order IS NULL, ts.session_order, ts.scheduled_at, ts.id",
            )?;
            let sessions = stmt
                .query_map([plan_id], PlanSession::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(sessions)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Create one session and its detail row under `plan`.
    pub async fn create(&self, plan: &TrainingPlan, draft: SessionDraft) -> Result<i64> {
        let ids = self.create_bulk(plan, vec![draft]).await?;
        ids.into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("session insert returned no id".to_string()))
    }

    /// Create many sessions under `plan` atomically: either every base row
    /// and detail row is committed, or none is.
    pub async fn create_bulk(
        &self,
        plan: &TrainingPlan,
        drafts: Vec<SessionDraft>,
    ) -> Result<Vec<i64>> {
        let sessions = resolve_details(plan.workout_type, drafts)?;
        let plan_id = plan.id;

        let pool = self.pool.clone();
        let ids = tokio::task::spawn_blocking(move || -> Result<Vec<i64>> {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;
            let ids = insert_sessions(&tx, plan_id, &sessions)?;
            tx.commit()?;
            Ok(ids)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        tracing::debug!("Created {} session(s) for plan {}", ids.len(), plan_id);
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;
    use crate::migrations::run_migrations_for_tests;
    use crate::repositories::PlanRepository;
    use chrono::NaiveDateTime;

    fn setup_test_db() -> DbPool {
        let pool = create_memory_pool().expect("Failed to create test database");
        run_migrations_for_tests(&pool).expect("Failed to run migrations");
        pool
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn draft(description: &str, scheduled_at: NaiveDateTime, hf_max: Option<&str>) -> SessionDraft {
        SessionDraft {
            order: None,
            description: description.to_string(),
            scheduled_at,
            hf_max: hf_max.map(|s| s.to_string()),
        }
    }

    async fn create_plan(pool: &DbPool, name: &str, workout_type_id: i64) -> TrainingPlan {
        let plans = PlanRepository::new(pool.clone());
        let workout_type = plans.find_workout_type(workout_type_id).await.unwrap().unwrap();
        plans.create(name, &workout_type, None).await.unwrap()
    }

    fn count(pool: &DbPool, table: &str) -> i64 {
        let conn = pool.get().unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap()
    }

    #[tokio::test]
    async fn test_sessions_on_date_ignores_time_and_orders() {
        let pool = setup_test_db();
        let plan = create_plan(&pool, "Base", 1).await;
        let repo = SessionRepository::new(pool);

        repo.create_bulk(
            &plan,
            vec![
                draft("Evening", at(2025, 3, 3, 18), Some("75%")),
                draft("Morning", at(2025, 3, 3, 7), None),
                draft("Next day", at(2025, 3, 4, 7), None),
            ],
        )
        .await
        .unwrap();

        let sessions = repo
            .sessions_on_date(NaiveDate::from_ymd_opt(2025, 3, 3).unwrap())
            .await
            .unwrap();

        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].description, "Morning");
        assert_eq!(sessions[1].description, "Evening");
        assert_eq!(sessions[1].hf_max.as_deref(), Some("75%"));
        assert_eq!(sessions[1].plan_name, "Base");
        assert_eq!(sessions[1].workout_type, WorkoutKind::Cycling);
        assert!(!sessions[0].completed);
    }

    #[tokio::test]
    async fn test_sessions_on_date_non_cycling_has_no_hf_max() {
        let pool = setup_test_db();
        let plan = create_plan(&pool, "Stretch", 2).await;
        let repo = SessionRepository::new(pool);

        repo.create(&plan, draft("Hips", at(2025, 3, 3, 8), None))
            .await
            .unwrap();

        let sessions = repo
            .sessions_on_date(NaiveDate::from_ymd_opt(2025, 3, 3).unwrap())
            .await
            .unwrap();

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].workout_type, WorkoutKind::Mobility);
        assert_eq!(sessions[0].hf_max, None);
    }

    #[tokio::test]
    async fn test_sessions_on_date_tolerates_missing_detail_row() {
        let pool = setup_test_db();
        let plan = create_plan(&pool, "Base", 1).await;
        {
            let conn = pool.get().unwrap();
            conn.execute(
                "INSERT INTO training_sessions (plan_id, description, scheduled_at) VALUES (?, 'Orphan', '2025-03-03 09:00:00')",
                [plan.id],
            )
            .unwrap();
        }
        let repo = SessionRepository::new(pool);

        let sessions = repo
            .sessions_on_date(NaiveDate::from_ymd_opt(2025, 3, 3).unwrap())
            .await
            .unwrap();

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].hf_max, None);
    }

    #[tokio::test]
    async fn test_sessions_in_range_is_inclusive() {
        let pool = setup_test_db();
        let plan = create_plan(&pool, "Bag", 3).await;
        let repo = SessionRepository::new(pool);

        repo.create_bulk(
            &plan,
            vec![
                draft("Before", at(2025, 2, 28, 20), None),
                draft("First", at(2025, 3, 1, 6), None),
                draft("Last", at(2025, 3, 10, 23), None),
                draft("After", at(2025, 3, 11, 0), None),
            ],
        )
        .await
        .unwrap();

        let sessions = repo
            .sessions_in_range(
                NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].scheduled_at, at(2025, 3, 1, 6));
        assert_eq!(sessions[1].scheduled_at, at(2025, 3, 10, 23));
        assert_eq!(sessions[1].workout_type, WorkoutKind::Sandbag);
    }

    #[tokio::test]
    async fn test_progress_as_of_counts_up_to_cutoff() {
        let pool = setup_test_db();
        let ride = create_plan(&pool, "Ride", 1).await;
        let bag = create_plan(&pool, "Bag", 3).await;
        let repo = SessionRepository::new(pool);

        let ids = repo
            .create_bulk(
                &ride,
                vec![
                    draft("1", at(2025, 3, 1, 8), None),
                    draft("2", at(2025, 3, 2, 8), None),
                    draft("3", at(2025, 3, 3, 8), None),
                    draft("4", at(2025, 3, 4, 23), None),
                    draft("future", at(2025, 3, 5, 8), None),
                ],
            )
            .await
            .unwrap();
        for id in &ids[..3] {
            repo.mark_completed(*id).await.unwrap();
        }
        repo.create(&bag, draft("later", at(2025, 4, 1, 8), None))
            .await
            .unwrap();

        let progress = repo
            .progress_as_of(NaiveDate::from_ymd_opt(2025, 3, 4).unwrap())
            .await
            .unwrap();

        assert_eq!(
            progress,
            vec![ProgressCount {
                plan_name: "Ride".to_string(),
                workout_type: WorkoutKind::Cycling,
                completed: 3,
                total: 4,
            }]
        );
    }

    #[tokio::test]
    async fn test_mark_completed_is_idempotent() {
        let pool = setup_test_db();
        let plan = create_plan(&pool, "Bag", 3).await;
        let repo = SessionRepository::new(pool);

        let id = repo
            .create(&plan, draft("Carry", at(2025, 3, 3, 8), None))
            .await
            .unwrap();

        assert!(repo.mark_completed(id).await.unwrap());
        assert!(repo.mark_completed(id).await.unwrap());

        let sessions = repo.find_by_plan(plan.id).await.unwrap();
        assert!(sessions[0].completed);
    }

    #[tokio::test]
    async fn test_mark_completed_unknown_session() {
        let pool = setup_test_db();
        let repo = SessionRepository::new(pool);

        assert!(!repo.mark_completed(999).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_writes_matching_detail_table() {
        let pool = setup_test_db();
        let ride = create_plan(&pool, "Ride", 1).await;
        let stretch = create_plan(&pool, "Stretch", 2).await;
        let bag = create_plan(&pool, "Bag", 3).await;
        let repo = SessionRepository::new(pool.clone());

        repo.create(&ride, draft("r", at(2025, 3, 3, 8), None)).await.unwrap();
        repo.create(&stretch, draft("s", at(2025, 3, 3, 8), None)).await.unwrap();
        repo.create(&bag, draft("b", at(2025, 3, 3, 8), None)).await.unwrap();

        assert_eq!(count(&pool, "cycling_details"), 1);
        assert_eq!(count(&pool, "mobility_details"), 1);
        assert_eq!(count(&pool, "sandbag_details"), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_hf_max_for_mobility() {
        let pool = setup_test_db();
        let plan = create_plan(&pool, "Stretch", 2).await;
        let repo = SessionRepository::new(pool.clone());

        let result = repo
            .create(&plan, draft("s", at(2025, 3, 3, 8), Some("80%")))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(count(&pool, "training_sessions"), 0);
    }

    #[tokio::test]
    async fn test_create_bulk_rolls_back_when_detail_insert_fails() {
        let pool = setup_test_db();
        let plan = create_plan(&pool, "Ride", 1).await;
        {
            let conn = pool.get().unwrap();
            conn.execute_batch(
                "CREATE TRIGGER fail_second_detail BEFORE INSERT ON cycling_details
                 WHEN (SELECT COUNT(*) FROM cycling_details) >= 1
                 BEGIN SELECT RAISE(ABORT, 'forced failure'); END;",
            )
            .unwrap();
        }
        let repo = SessionRepository::new(pool.clone());

        let result = repo
            .create_bulk(
                &plan,
                vec![
                    draft("first", at(2025, 3, 3, 8), Some("70%")),
                    draft("second", at(2025, 3, 4, 8), Some("80%")),
                ],
            )
            .await;

        assert!(matches!(result, Err(AppError::Database(_))));
        assert_eq!(count(&pool, "training_sessions"), 0);
        assert_eq!(count(&pool, "cycling_details"), 0);
    }

    #[tokio::test]
    async fn test_find_by_plan_orders_by_session_order_then_date() {
        let pool = setup_test_db();
        let plan = create_plan(&pool, "Ride", 1).await;
        let repo = SessionRepository::new(pool);

        let unordered = draft("unordered", at(2025, 3, 1, 8), None);
        let mut second = draft("second", at(2025, 3, 2, 8), Some("70%"));
        second.order = Some(2);
        let mut first = draft("first", at(2025, 3, 9, 8), None);
        first.order = Some(1);

        repo.create_bulk(&plan, vec![unordered, second, first])
            .await
            .unwrap();

        let sessions = repo.find_by_plan(plan.id).await.unwrap();
        let names: Vec<_> = sessions.iter().map(|s| s.description.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "unordered"]);
        assert_eq!(sessions[1].hf_max.as_deref(), Some("70%"));
        assert_eq!(sessions[0].session_order, Some(1));
    }
}
