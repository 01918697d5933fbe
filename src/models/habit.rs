use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    Increase,
    Decrease,
}

impl GoalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::Increase => "increase",
            GoalType::Decrease => "decrease",
        }
    }

    /// Parse the stored column value. Unknown values fall back to increase,
    /// matching the schema default.
    pub fn from_str(s: &str) -> Self {
        match s {
            "decrease" => GoalType::Decrease,
            _ => GoalType::Increase,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub is_positive: bool,
    pub goal_type: GoalType,
    pub baseline_count: i64,
    pub target_count: i64,
    /// ISO date (YYYY-MM-DD). Fixed at creation.
    pub target_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHabit {
    pub username: String,
    pub name: String,
    pub is_positive: bool,
    pub goal_type: GoalType,
    pub baseline_count: i64,
    pub target_count: i64,
    pub target_date: String,
}

/// One row per (habit, date). Today's row is materialized lazily by the
/// scheduler; `count` only ever increments within a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEntry {
    pub habit_id: i64,
    pub date: String,
    pub count: i64,
    pub suggested_target: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSummary {
    pub current_streak: i64,
    pub longest_streak: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitStreaks {
    pub habit_name: String,
    pub current_streak: i64,
    pub longest_streak: i64,
}
