pub mod from_row;
pub mod session_import;
pub mod training_plan;
pub mod training_session;
pub mod workout_type;

pub use from_row::FromSqliteRow;
pub use session_import::{check_session_details, parse_session_list};
pub use training_plan::{CreatePlanForm, TrainingPlan};
pub use training_session::{
    CreateSessionForm, MonthSession, PlanSession, ProgressCount, SessionDraft, SessionSummary,
};
pub use workout_type::{SessionDetail, WorkoutKind, WorkoutType};
