//! Read-side aggregation over task and habit history: windowed stats, daily
//! trend series, period-over-period comparisons, linear forecasts, and the
//! blended productivity score. Every rate is defined as 0 when its
//! denominator is 0, and malformed date strings are skipped, never fatal.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, NaiveDate};
use rusqlite::Connection;

use crate::database::queries;
use crate::error::Result;
use crate::models::{
    GoalType, HabitForecast, HabitSeries, HabitStats, HabitTrends, OverallTrends,
    PeriodComparison, TaskComparison, TaskForecast, TaskStats, TaskTrends, TimeRange,
    STATUS_COMPLETED, STATUS_PENDING,
};
use crate::utils::{format_date, parse_date, round1};

fn pct(part: i64, whole: i64) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn week_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
}

// --- Tasks ---

pub fn task_stats(
    conn: &Connection,
    username: &str,
    range: TimeRange,
    today: NaiveDate,
) -> Result<TaskStats> {
    let bounds = range
        .bounds(today)
        .map(|(s, e)| (format_date(s), format_date(e)));
    let bounds_ref = bounds.as_ref().map(|(s, e)| (s.as_str(), e.as_str()));

    let total = queries::count_tasks(conn, username, None, bounds_ref)?;
    let completed = queries::count_tasks(conn, username, Some(STATUS_COMPLETED), bounds_ref)?;
    let pending = (total - completed).max(0);

    Ok(TaskStats {
        total,
        completed,
        pending,
        completion_rate: round1(pct(completed, total)),
    })
}

pub fn task_trends(
    conn: &Connection,
    username: &str,
    range: TimeRange,
    today: NaiveDate,
) -> Result<TaskTrends> {
    let (start, end) = match range.bounds(today) {
        Some(b) => b,
        None => {
            let start = queries::min_task_date(conn, username)?
                .as_deref()
                .and_then(parse_date)
                .unwrap_or(today);
            (start, today)
        }
    };

    let rows = queries::list_task_rows(conn, username, &format_date(start), &format_date(end))?;

    // Seed a bucket for every calendar day so the series has no gaps.
    let mut daily: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
    let mut day = start;
    while day <= end {
        daily.insert(day, (0, 0));
        day += Duration::days(1);
    }

    for (created_at, status) in rows {
        let Some(date) = parse_date(&created_at) else {
            log::warn!("skipping task row with malformed created_at {:?}", created_at);
            continue;
        };
        if let Some((created, completed)) = daily.get_mut(&date) {
            *created += 1;
            if status == STATUS_COMPLETED {
                *completed += 1;
            }
        }
    }

    let mut trends = TaskTrends {
        dates: Vec::with_capacity(daily.len()),
        completion_rates: Vec::with_capacity(daily.len()),
        daily_created: Vec::with_capacity(daily.len()),
        daily_completed: Vec::with_capacity(daily.len()),
    };
    let (mut cum_total, mut cum_completed) = (0i64, 0i64);
    for (date, (created, completed)) in &daily {
        cum_total += created;
        cum_completed += completed;
        trends.dates.push(format_date(*date));
        trends.completion_rates.push(pct(cum_completed, cum_total));
        trends.daily_created.push(*created);
        trends.daily_completed.push(*completed);
    }
    Ok(trends)
}

fn completion_rate_between(
    conn: &Connection,
    username: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<f64> {
    let (start, end) = (format_date(start), format_date(end));
    let bounds = Some((start.as_str(), end.as_str()));
    let total = queries::count_tasks(conn, username, None, bounds)?;
    let completed = queries::count_tasks(conn, username, Some(STATUS_COMPLETED), bounds)?;
    Ok(round1(pct(completed, total)))
}

/// Week-over-week and month-over-month completion rates. The previous
/// period is the full preceding calendar week/month.
pub fn task_comparison(
    conn: &Connection,
    username: &str,
    today: NaiveDate,
) -> Result<TaskComparison> {
    let this_week = task_stats(conn, username, TimeRange::ThisWeek, today)?.completion_rate;
    let last_week_end = week_start(today) - Duration::days(1);
    let last_week_start = last_week_end - Duration::days(6);
    let last_week = completion_rate_between(conn, username, last_week_start, last_week_end)?;

    let this_month = task_stats(conn, username, TimeRange::ThisMonth, today)?.completion_rate;
    let last_month_end = today.with_day(1).unwrap_or(today) - Duration::days(1);
    let last_month_start = last_month_end.with_day(1).unwrap_or(last_month_end);
    let last_month = completion_rate_between(conn, username, last_month_start, last_month_end)?;

    Ok(TaskComparison {
        week_over_week: PeriodComparison {
            current: this_week,
            previous: last_week,
            change: round1(this_week - last_week),
        },
        month_over_month: PeriodComparison {
            current: this_month,
            previous: last_month,
            change: round1(this_month - last_month),
        },
    })
}

/// Linear projection: pending backlog divided by the trailing 7-day
/// completion pace. No recent completions or no backlog means no forecast.
pub fn task_forecast(conn: &Connection, username: &str, today: NaiveDate) -> Result<TaskForecast> {
    let pending = queries::count_tasks(conn, username, Some(STATUS_PENDING), None)?;
    let week_ago = format_date(today - Duration::days(7));
    let completed_last_week = queries::count_completed_since(conn, username, &week_ago)?;

    if completed_last_week > 0 && pending > 0 {
        let daily_rate = completed_last_week as f64 / 7.0;
        let days_to_complete = pending as f64 / daily_rate;
        let forecast_date = today + Duration::days(days_to_complete as i64);
        Ok(TaskForecast {
            pending_tasks: pending,
            daily_completion_rate: round1(daily_rate),
            estimated_completion_date: Some(format_date(forecast_date)),
            days_remaining: Some(days_to_complete as i64),
        })
    } else {
        Ok(TaskForecast {
            pending_tasks: pending,
            daily_completion_rate: 0.0,
            estimated_completion_date: None,
            days_remaining: None,
        })
    }
}

// --- Habits ---

pub fn habit_stats(
    conn: &Connection,
    username: &str,
    range: TimeRange,
    today: NaiveDate,
) -> Result<HabitStats> {
    let habits = queries::list_habits(conn, username)?;
    if habits.is_empty() {
        return Ok(HabitStats {
            total_habits: 0,
            active_habits: 0,
            avg_completion_rate: 0.0,
            habits_with_streaks: 0,
        });
    }

    let bounds = range
        .bounds(today)
        .map(|(s, e)| (format_date(s), format_date(e)));
    let bounds_ref = bounds.as_ref().map(|(s, e)| (s.as_str(), e.as_str()));

    let mut rates = Vec::new();
    for habit in &habits {
        let (total, met) = queries::compliance_counts(conn, habit.id, bounds_ref)?;
        if total > 0 {
            rates.push(pct(met, total));
        }
    }

    let streaks = super::streaks::user_streaks(conn, username, today)?;
    let habits_with_streaks = streaks.values().filter(|s| s.current_streak > 0).count() as i64;

    Ok(HabitStats {
        total_habits: habits.len() as i64,
        active_habits: habits.len() as i64,
        avg_completion_rate: round1(mean(&rates)),
        habits_with_streaks,
    })
}

pub fn habit_trends(
    conn: &Connection,
    username: &str,
    range: TimeRange,
    today: NaiveDate,
) -> Result<HabitTrends> {
    let habits = queries::list_habits(conn, username)?;
    if habits.is_empty() {
        return Ok(HabitTrends {
            dates: Vec::new(),
            completion_percentages: Vec::new(),
            per_habit: BTreeMap::new(),
        });
    }

    let (start, end) = match range.bounds(today) {
        Some(b) => b,
        None => {
            let start = queries::min_tracking_date(conn, username)?
                .as_deref()
                .and_then(parse_date)
                .unwrap_or(today);
            (start, today)
        }
    };

    let entries =
        queries::list_tracking_in_range(conn, username, &format_date(start), &format_date(end))?;

    let mut daily: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
    let mut day = start;
    while day <= end {
        daily.insert(day, (0, 0));
        day += Duration::days(1);
    }

    let mut per_habit: BTreeMap<i64, HabitSeries> = habits
        .iter()
        .map(|h| (h.id, HabitSeries::default()))
        .collect();

    for entry in &entries {
        let Some(date) = parse_date(&entry.date) else {
            log::warn!(
                "habit {}: skipping tracking row with malformed date {:?}",
                entry.habit_id,
                entry.date
            );
            continue;
        };
        let Some((met, total)) = daily.get_mut(&date) else {
            continue;
        };
        *total += 1;
        if entry.suggested_target > 0 && entry.count >= entry.suggested_target {
            *met += 1;
        }

        if let Some(series) = per_habit.get_mut(&entry.habit_id) {
            let date_str = format_date(date);
            // Entries arrive date-ordered; one point per day per habit.
            if series.dates.last() != Some(&date_str) {
                let rate = pct(entry.count, entry.suggested_target).min(100.0);
                series.dates.push(date_str);
                series.completion_rates.push(rate);
            }
        }
    }

    let mut dates = Vec::with_capacity(daily.len());
    let mut completion_percentages = Vec::with_capacity(daily.len());
    for (date, (met, total)) in &daily {
        dates.push(format_date(*date));
        completion_percentages.push(pct(*met, *total));
    }

    Ok(HabitTrends {
        dates,
        completion_percentages,
        per_habit,
    })
}

pub fn habit_comparison(
    conn: &Connection,
    username: &str,
    today: NaiveDate,
) -> Result<PeriodComparison> {
    let current = habit_stats(conn, username, TimeRange::ThisWeek, today)?.avg_completion_rate;

    let last_week_end = week_start(today) - Duration::days(1);
    let last_week_start = last_week_end - Duration::days(6);
    let bounds = (format_date(last_week_start), format_date(last_week_end));

    let mut rates = Vec::new();
    for habit in queries::list_habits(conn, username)? {
        let (total, met) =
            queries::compliance_counts(conn, habit.id, Some((bounds.0.as_str(), bounds.1.as_str())))?;
        if total > 0 {
            rates.push(pct(met, total));
        }
    }
    let previous = round1(mean(&rates));

    Ok(PeriodComparison {
        current,
        previous,
        change: round1(current - previous),
    })
}

/// Per-habit deadline projection from the trailing week: the daily change is
/// the net average pace (average target minus average count, signed by goal
/// direction). Habits with no recent rows or a malformed target date are
/// left out rather than guessed at.
pub fn habit_forecasts(
    conn: &Connection,
    username: &str,
    today: NaiveDate,
) -> Result<Vec<HabitForecast>> {
    let week_ago = format_date(today - Duration::days(7));
    let today_str = format_date(today);
    let mut forecasts = Vec::new();

    for habit in queries::list_habits(conn, username)? {
        let Some(target_date) = parse_date(&habit.target_date) else {
            log::warn!(
                "habit {}: skipping forecast, malformed target date {:?}",
                habit.id,
                habit.target_date
            );
            continue;
        };
        let Some((avg_count, avg_target)) =
            queries::trailing_averages(conn, habit.id, &week_ago, &today_str)?
        else {
            continue;
        };
        let avg_target = avg_target.unwrap_or(habit.target_count as f64);

        let (progress_needed, daily_change) = match habit.goal_type {
            GoalType::Increase => (
                habit.target_count as f64 - avg_count,
                avg_target - avg_count,
            ),
            GoalType::Decrease => (
                avg_count - habit.target_count as f64,
                avg_count - avg_target,
            ),
        };

        let projected_date = if daily_change > 0.0 {
            today + Duration::days((progress_needed / daily_change) as i64)
        } else {
            target_date
        };

        forecasts.push(HabitForecast {
            habit_id: habit.id,
            habit_name: habit.name.clone(),
            target_date: format_date(target_date),
            projected_date: format_date(projected_date),
            on_track: projected_date <= target_date,
            current_avg: round1(avg_count),
            target: habit.target_count,
        });
    }
    Ok(forecasts)
}

// --- Combined ---

/// Unweighted 50/50 blend of task completion rate and mean habit compliance.
pub fn productivity_score(
    conn: &Connection,
    username: &str,
    range: TimeRange,
    today: NaiveDate,
) -> Result<f64> {
    let tasks = task_stats(conn, username, range, today)?;
    let habits = habit_stats(conn, username, range, today)?;
    Ok(round1(
        tasks.completion_rate * 0.5 + habits.avg_completion_rate * 0.5,
    ))
}

pub fn overall_trends(
    conn: &Connection,
    username: &str,
    range: TimeRange,
    today: NaiveDate,
) -> Result<OverallTrends> {
    let tasks = task_trends(conn, username, range, today)?;
    let habits = habit_trends(conn, username, range, today)?;

    let task_by_date: HashMap<&str, f64> = tasks
        .dates
        .iter()
        .map(String::as_str)
        .zip(tasks.completion_rates.iter().copied())
        .collect();
    let habit_by_date: HashMap<&str, f64> = habits
        .dates
        .iter()
        .map(String::as_str)
        .zip(habits.completion_percentages.iter().copied())
        .collect();

    let mut dates: Vec<String> = tasks.dates.iter().chain(habits.dates.iter()).cloned().collect();
    dates.sort();
    dates.dedup();

    let mut out = OverallTrends {
        dates: Vec::with_capacity(dates.len()),
        productivity_scores: Vec::with_capacity(dates.len()),
        task_scores: Vec::with_capacity(dates.len()),
        habit_scores: Vec::with_capacity(dates.len()),
    };
    for date in dates {
        let task_score = task_by_date.get(date.as_str()).copied().unwrap_or(0.0);
        let habit_score = habit_by_date.get(date.as_str()).copied().unwrap_or(0.0);
        out.task_scores.push(task_score);
        out.habit_scores.push(habit_score);
        out.productivity_scores
            .push(task_score * 0.5 + habit_score * 0.5);
        out.dates.push(date);
    }
    Ok(out)
}
