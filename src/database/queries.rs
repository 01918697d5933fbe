use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::Result;
use crate::models::{GoalType, Habit, NewHabit, Task, TrackingEntry, UserTraits};

fn habit_from_row(row: &Row) -> rusqlite::Result<Habit> {
    Ok(Habit {
        id: row.get(0)?,
        username: row.get(1)?,
        name: row.get(2)?,
        is_positive: row.get::<_, i64>(3)? != 0,
        goal_type: GoalType::from_str(&row.get::<_, String>(4)?),
        baseline_count: row.get(5)?,
        target_count: row.get(6)?,
        target_date: row.get(7)?,
    })
}

fn tracking_from_row(row: &Row) -> rusqlite::Result<TrackingEntry> {
    Ok(TrackingEntry {
        habit_id: row.get(0)?,
        date: row.get(1)?,
        count: row.get(2)?,
        suggested_target: row.get(3)?,
    })
}

fn task_from_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        username: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
    })
}

// --- Users ---

pub fn user_exists(conn: &Connection, username: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE username = ?1",
        [username],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn insert_user(conn: &Connection, username: &str, traits: UserTraits) -> Result<()> {
    conn.execute(
        "INSERT INTO users (username, concentration, discipline, motivation, energy)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            username,
            traits.concentration,
            traits.discipline,
            traits.motivation,
            traits.energy,
        ],
    )?;
    Ok(())
}

pub fn get_user_traits(conn: &Connection, username: &str) -> Result<Option<UserTraits>> {
    let traits = conn
        .query_row(
            "SELECT concentration, discipline, motivation, energy
             FROM users
             WHERE username = ?1",
            [username],
            |row| {
                Ok(UserTraits {
                    concentration: row.get(0)?,
                    discipline: row.get(1)?,
                    motivation: row.get(2)?,
                    energy: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(traits)
}

// --- Habits ---

pub fn insert_habit(conn: &Connection, habit: &NewHabit) -> Result<i64> {
    conn.execute(
        "INSERT INTO habits (username, habit_name, is_positive, goal_type,
                             baseline_count, target_count, target_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            &habit.username,
            &habit.name,
            habit.is_positive as i64,
            habit.goal_type.as_str(),
            habit.baseline_count,
            habit.target_count,
            &habit.target_date,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_habit(conn: &Connection, habit_id: i64) -> Result<Option<Habit>> {
    let habit = conn
        .query_row(
            "SELECT id, username, habit_name, is_positive, goal_type,
                    baseline_count, target_count, target_date
             FROM habits
             WHERE id = ?1",
            [habit_id],
            habit_from_row,
        )
        .optional()?;
    Ok(habit)
}

pub fn list_habits(conn: &Connection, username: &str) -> Result<Vec<Habit>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, habit_name, is_positive, goal_type,
                baseline_count, target_count, target_date
         FROM habits
         WHERE username = ?1
         ORDER BY id",
    )?;

    let habits = stmt
        .query_map([username], habit_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(habits)
}

/// Tracking rows go with it via the foreign-key cascade.
pub fn delete_habit(conn: &Connection, habit_id: i64) -> Result<usize> {
    let deleted = conn.execute("DELETE FROM habits WHERE id = ?1", [habit_id])?;
    Ok(deleted)
}

// --- Habit tracking ---

pub fn get_tracking_entry(
    conn: &Connection,
    habit_id: i64,
    date: &str,
) -> Result<Option<TrackingEntry>> {
    let entry = conn
        .query_row(
            "SELECT habit_id, date, count, suggested_target
             FROM habit_tracking
             WHERE habit_id = ?1 AND date = ?2",
            params![habit_id, date],
            tracking_from_row,
        )
        .optional()?;
    Ok(entry)
}

pub fn insert_tracking_entry(
    conn: &Connection,
    habit_id: i64,
    date: &str,
    count: i64,
    suggested_target: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO habit_tracking (habit_id, date, count, suggested_target)
         VALUES (?1, ?2, ?3, ?4)",
        params![habit_id, date, count, suggested_target],
    )?;
    Ok(())
}

/// Insert unless a row for (habit, date) already exists. Returns whether a
/// row was written; a false result means another caller materialized the day
/// first and the existing row should be re-read.
pub fn insert_tracking_entry_if_absent(
    conn: &Connection,
    habit_id: i64,
    date: &str,
    count: i64,
    suggested_target: i64,
) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO habit_tracking (habit_id, date, count, suggested_target)
         VALUES (?1, ?2, ?3, ?4)",
        params![habit_id, date, count, suggested_target],
    )?;
    Ok(inserted > 0)
}

pub fn increment_count(conn: &Connection, habit_id: i64, date: &str) -> Result<usize> {
    let updated = conn.execute(
        "UPDATE habit_tracking
         SET count = count + 1
         WHERE habit_id = ?1 AND date = ?2",
        params![habit_id, date],
    )?;
    Ok(updated)
}

pub fn list_tracking_entries(conn: &Connection, habit_id: i64) -> Result<Vec<TrackingEntry>> {
    let mut stmt = conn.prepare(
        "SELECT habit_id, date, count, suggested_target
         FROM habit_tracking
         WHERE habit_id = ?1
         ORDER BY date",
    )?;

    let entries = stmt
        .query_map([habit_id], tracking_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(entries)
}

/// All tracking rows for a user's habits in an inclusive date window.
pub fn list_tracking_in_range(
    conn: &Connection,
    username: &str,
    start: &str,
    end: &str,
) -> Result<Vec<TrackingEntry>> {
    let mut stmt = conn.prepare(
        "SELECT t.habit_id, t.date, t.count, t.suggested_target
         FROM habit_tracking t
         JOIN habits h ON t.habit_id = h.id
         WHERE h.username = ?1 AND t.date >= ?2 AND t.date <= ?3
         ORDER BY t.date",
    )?;

    let entries = stmt
        .query_map(params![username, start, end], tracking_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(entries)
}

pub fn min_tracking_date(conn: &Connection, username: &str) -> Result<Option<String>> {
    let date: Option<String> = conn.query_row(
        "SELECT MIN(t.date)
         FROM habit_tracking t
         JOIN habits h ON t.habit_id = h.id
         WHERE h.username = ?1",
        [username],
        |row| row.get(0),
    )?;
    Ok(date)
}

/// (tracked days, days where the target was met) for a habit, optionally
/// bounded to an inclusive date window.
pub fn compliance_counts(
    conn: &Connection,
    habit_id: i64,
    bounds: Option<(&str, &str)>,
) -> Result<(i64, i64)> {
    let row = match bounds {
        Some((start, end)) => conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN count >= suggested_target THEN 1 ELSE 0 END), 0)
             FROM habit_tracking
             WHERE habit_id = ?1 AND date >= ?2 AND date <= ?3",
            params![habit_id, start, end],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?,
        None => conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN count >= suggested_target THEN 1 ELSE 0 END), 0)
             FROM habit_tracking
             WHERE habit_id = ?1",
            [habit_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?,
    };
    Ok(row)
}

/// Trailing (avg count, avg suggested target) over an inclusive window.
/// None when the habit has no rows in the window.
pub fn trailing_averages(
    conn: &Connection,
    habit_id: i64,
    start: &str,
    end: &str,
) -> Result<Option<(f64, Option<f64>)>> {
    let (avg_count, avg_target): (Option<f64>, Option<f64>) = conn.query_row(
        "SELECT AVG(count), AVG(suggested_target)
         FROM habit_tracking
         WHERE habit_id = ?1 AND date >= ?2 AND date <= ?3",
        params![habit_id, start, end],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(avg_count.map(|c| (c, avg_target)))
}

// --- Tasks ---

pub fn insert_task(
    conn: &Connection,
    username: &str,
    title: &str,
    description: Option<&str>,
) -> Result<Task> {
    conn.execute(
        "INSERT INTO tasks (username, title, description) VALUES (?1, ?2, ?3)",
        params![username, title, description],
    )?;
    let id = conn.last_insert_rowid();

    let task = conn.query_row(
        "SELECT id, username, title, description, status, created_at
         FROM tasks
         WHERE id = ?1",
        [id],
        task_from_row,
    )?;
    Ok(task)
}

pub fn list_tasks(conn: &Connection, username: &str) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, title, description, status, created_at
         FROM tasks
         WHERE username = ?1
         ORDER BY id DESC",
    )?;

    let tasks = stmt
        .query_map([username], task_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(tasks)
}

pub fn update_task_status(conn: &Connection, task_id: i64, status: &str) -> Result<usize> {
    let updated = conn.execute(
        "UPDATE tasks SET status = ?1 WHERE id = ?2",
        params![status, task_id],
    )?;
    Ok(updated)
}

pub fn delete_task(conn: &Connection, task_id: i64) -> Result<usize> {
    let deleted = conn.execute("DELETE FROM tasks WHERE id = ?1", [task_id])?;
    Ok(deleted)
}

/// Count tasks, optionally filtered by status and by an inclusive creation
/// window. The end bound is stretched to the end of its day because
/// created_at carries a time component.
pub fn count_tasks(
    conn: &Connection,
    username: &str,
    status: Option<&str>,
    bounds: Option<(&str, &str)>,
) -> Result<i64> {
    let mut sql = String::from("SELECT COUNT(*) FROM tasks WHERE username = ?1");
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(username.to_string())];
    let mut idx = 2;

    if let Some(status) = status {
        sql.push_str(&format!(" AND status = ?{}", idx));
        params_vec.push(Box::new(status.to_string()));
        idx += 1;
    }
    if let Some((start, end)) = bounds {
        sql.push_str(&format!(
            " AND created_at >= ?{} AND created_at <= ?{}",
            idx,
            idx + 1
        ));
        params_vec.push(Box::new(start.to_string()));
        params_vec.push(Box::new(format!("{} 23:59:59", end)));
    }

    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let count: i64 = conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))?;
    Ok(count)
}

/// (created_at, status) pairs inside an inclusive creation window, for the
/// daily trend buckets.
pub fn list_task_rows(
    conn: &Connection,
    username: &str,
    start: &str,
    end: &str,
) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT created_at, status
         FROM tasks
         WHERE username = ?1 AND created_at >= ?2 AND created_at <= ?3",
    )?;

    let rows = stmt
        .query_map(
            params![username, start, format!("{} 23:59:59", end)],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn min_task_date(conn: &Connection, username: &str) -> Result<Option<String>> {
    let date: Option<String> = conn.query_row(
        "SELECT MIN(created_at) FROM tasks WHERE username = ?1",
        [username],
        |row| row.get(0),
    )?;
    Ok(date)
}

pub fn count_completed_since(conn: &Connection, username: &str, since: &str) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tasks
         WHERE username = ?1 AND status = 'completed' AND created_at >= ?2",
        params![username, since],
        |row| row.get(0),
    )?;
    Ok(count)
}
