pub mod analytics;
pub mod habits;
pub mod scheduler;
pub mod streaks;
pub mod tasks;
pub mod users;
