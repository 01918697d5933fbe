use anyhow::Result;
use rusqlite::Connection;

pub fn create_tables(conn: &Connection) -> Result<()> {
    // Users table - owns the traits the scheduler reads
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            username TEXT PRIMARY KEY,
            concentration INTEGER DEFAULT 5,
            discipline INTEGER DEFAULT 5,
            motivation INTEGER DEFAULT 5,
            energy INTEGER DEFAULT 5,
            created_at TEXT DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // Tasks table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT DEFAULT NULL,
            status TEXT DEFAULT 'pending',
            created_at TEXT DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tasks_username ON tasks(username)",
        [],
    )?;

    // Habits table - stores habit definitions
    conn.execute(
        "CREATE TABLE IF NOT EXISTS habits (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL,
            habit_name TEXT NOT NULL,
            is_positive INTEGER DEFAULT 1,
            goal_type TEXT DEFAULT 'increase',
            baseline_count INTEGER DEFAULT 0,
            target_count INTEGER DEFAULT 0,
            target_date TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_habits_username ON habits(username)",
        [],
    )?;

    // Habit tracking table - one row per habit per calendar day. The
    // composite primary key is what makes ensure-today-target safe to retry.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS habit_tracking (
            habit_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            count INTEGER DEFAULT 0,
            suggested_target INTEGER DEFAULT 0,
            PRIMARY KEY (habit_id, date),
            FOREIGN KEY (habit_id) REFERENCES habits(id) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tracking_date ON habit_tracking(date)",
        [],
    )?;

    Ok(())
}
