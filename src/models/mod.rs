pub mod analytics;
pub mod habit;
pub mod task;
pub mod user;

pub use analytics::*;
pub use habit::*;
pub use task::*;
pub use user::*;
