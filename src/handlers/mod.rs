pub mod calendar;
pub mod health;
pub mod plans;
pub mod sessions;
