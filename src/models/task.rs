use serde::{Deserialize, Serialize};

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_COMPLETED: &str = "completed";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub username: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    /// ISO datetime (YYYY-MM-DD HH:MM:SS).
    pub created_at: String,
}
