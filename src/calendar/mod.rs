//! Calendar view-model: a seven-day week grid, a six-week month grid and
//! per-plan completion progress, rebuilt on every request.

pub mod grid;

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{MonthSession, ProgressCount, SessionSummary, WorkoutKind};
use crate::repositories::SessionRepository;

use grid::{days_from, month_grid_range, same_month, week_start, MONTH_GRID_LEN, WEEK_LEN};

#[derive(Debug, Clone, Serialize)]
pub struct WeekDay {
    pub date: NaiveDate,
    pub is_today: bool,
    pub sessions: Vec<SessionSummary>,
}

impl WeekDay {
    pub fn weekday_label(&self) -> String {
        self.date.format("%a").to_string()
    }

    pub fn date_label(&self) -> String {
        self.date.format("%d %b").to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthDay {
    pub date: NaiveDate,
    pub is_current_month: bool,
    pub is_today: bool,
    pub sessions: Vec<MonthSession>,
}

impl MonthDay {
    pub fn day_of_month(&self) -> u32 {
        self.date.day()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressRow {
    pub plan_name: String,
    pub workout_type: WorkoutKind,
    pub completed: u32,
    pub total: u32,
    pub percentage: f64,
}

impl ProgressRow {
    /// `None` for an empty group; a row with no sessions has no percentage.
    pub fn from_count(count: ProgressCount) -> Option<Self> {
        if count.total == 0 {
            return None;
        }
        let percentage = f64::from(count.completed) / f64::from(count.total) * 100.0;
        Some(Self {
            plan_name: count.plan_name,
            workout_type: count.workout_type,
            completed: count.completed,
            total: count.total,
            percentage,
        })
    }

    pub fn percentage_label(&self) -> String {
        format!("{:.0}%", self.percentage)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarViewModel {
    pub today: NaiveDate,
    pub week_offset: i32,
    pub week_start: NaiveDate,
    pub iso_year: i32,
    pub iso_week: u32,
    pub week_days: Vec<WeekDay>,
    pub month_days: Vec<MonthDay>,
    pub progress: Vec<ProgressRow>,
}

impl CalendarViewModel {
    pub fn previous_offset(&self) -> i32 {
        self.week_offset.saturating_sub(1)
    }

    pub fn next_offset(&self) -> i32 {
        self.week_offset.saturating_add(1)
    }

    pub fn month_label(&self) -> String {
        self.today.format("%B %Y").to_string()
    }
}

/// Lay out the week grid from the seven per-day query results.
pub fn build_week(
    monday: NaiveDate,
    today: NaiveDate,
    sessions_by_day: Vec<Vec<SessionSummary>>,
) -> Vec<WeekDay> {
    let mut sessions_by_day = sessions_by_day.into_iter();
    days_from(monday, WEEK_LEN)
        .map(|date| WeekDay {
            date,
            is_today: date == today,
            sessions: sessions_by_day.next().unwrap_or_default(),
        })
        .collect()
}

/// Lay out the month grid, bucketing one range query's rows by calendar date.
pub fn build_month(
    start: NaiveDate,
    today: NaiveDate,
    sessions: Vec<MonthSession>,
) -> Vec<MonthDay> {
    let mut by_date: HashMap<NaiveDate, Vec<MonthSession>> = HashMap::new();
    for session in sessions {
        by_date
            .entry(session.scheduled_at.date())
            .or_default()
            .push(session);
    }

    days_from(start, MONTH_GRID_LEN)
        .map(|date| MonthDay {
            date,
            is_current_month: same_month(date, today),
            is_today: date == today,
            sessions: by_date.remove(&date).unwrap_or_default(),
        })
        .collect()
}

pub fn progress_rows(counts: Vec<ProgressCount>) -> Vec<ProgressRow> {
    counts.into_iter().filter_map(ProgressRow::from_count).collect()
}

/// Build the full view-model for `today` shifted by `week_offset` weeks.
///
/// Issues one query per week day, one range query for the month and one
/// aggregate query. Any failure aborts the whole build.
pub async fn load(
    repo: &SessionRepository,
    today: NaiveDate,
    week_offset: i32,
) -> Result<CalendarViewModel> {
    let monday = week_start(today, week_offset)
        .ok_or_else(|| AppError::BadRequest(format!("Week offset {} is out of range", week_offset)))?;
    let (iso_year, iso_week) = grid::iso_week(monday);

    let mut sessions_by_day = Vec::with_capacity(WEEK_LEN);
    for date in days_from(monday, WEEK_LEN) {
        sessions_by_day.push(repo.sessions_on_date(date).await?);
    }

    let (month_start, month_end) = month_grid_range(today)
        .ok_or_else(|| AppError::Internal(format!("No month grid for {}", today)))?;
    let month_sessions = repo.sessions_in_range(month_start, month_end).await?;

    let progress = progress_rows(repo.progress_as_of(today).await?);

    tracing::debug!(
        "Calendar for {} (offset {}): week {}-W{:02}, {} month session(s)",
        today,
        week_offset,
        iso_year,
        iso_week,
        month_sessions.len()
    );

    Ok(CalendarViewModel {
        today,
        week_offset,
        week_start: monday,
        iso_year,
        iso_week,
        week_days: build_week(monday, today, sessions_by_day),
        month_days: build_month(month_start, today, month_sessions),
        progress,
    })
}
