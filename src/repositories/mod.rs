pub mod plan_repo;
pub mod session_repo;

pub use plan_repo::PlanRepository;
pub use session_repo::SessionRepository;
