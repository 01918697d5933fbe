use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Reporting window. All bounds are inclusive; `AllTime` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    Today,
    ThisWeek,
    ThisMonth,
    AllTime,
}

impl TimeRange {
    /// Inclusive (start, end) bounds for the window, or None for all time.
    /// Weeks run Monday-to-today, months 1st-to-today.
    pub fn bounds(self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            TimeRange::Today => Some((today, today)),
            TimeRange::ThisWeek => {
                let monday =
                    today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
                Some((monday, today))
            }
            TimeRange::ThisMonth => {
                let first = today.with_day(1).unwrap_or(today);
                Some((first, today))
            }
            TimeRange::AllTime => None,
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "today" => TimeRange::Today,
            "this_week" => TimeRange::ThisWeek,
            "this_month" => TimeRange::ThisMonth,
            _ => TimeRange::AllTime,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: i64,
    pub completed: i64,
    pub pending: i64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTrends {
    pub dates: Vec<String>,
    /// Cumulative completion rate per day.
    pub completion_rates: Vec<f64>,
    pub daily_created: Vec<i64>,
    pub daily_completed: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub current: f64,
    pub previous: f64,
    pub change: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskComparison {
    pub week_over_week: PeriodComparison,
    pub month_over_month: PeriodComparison,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskForecast {
    pub pending_tasks: i64,
    pub daily_completion_rate: f64,
    pub estimated_completion_date: Option<String>,
    pub days_remaining: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitStats {
    pub total_habits: i64,
    pub active_habits: i64,
    pub avg_completion_rate: f64,
    pub habits_with_streaks: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HabitSeries {
    pub dates: Vec<String>,
    pub completion_rates: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitTrends {
    pub dates: Vec<String>,
    /// Share of habits that met their target, per day.
    pub completion_percentages: Vec<f64>,
    pub per_habit: BTreeMap<i64, HabitSeries>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitForecast {
    pub habit_id: i64,
    pub habit_name: String,
    pub target_date: String,
    pub projected_date: String,
    pub on_track: bool,
    pub current_avg: f64,
    pub target: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallTrends {
    pub dates: Vec<String>,
    pub productivity_scores: Vec<f64>,
    pub task_scores: Vec<f64>,
    pub habit_scores: Vec<f64>,
}
