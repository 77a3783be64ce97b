use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use uuid::Uuid;

/// Fixed settings key holding the link a signed-out user tried to open.
pub const PENDING_LINK_KEY: &str = "pendingLessonLink";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("lessonbook.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS user_profiles(
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL UNIQUE,
            is_teacher INTEGER,
            grade_level TEXT,
            school TEXT,
            onboarding_completed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS tracking_events(
            id TEXT PRIMARY KEY,
            user_id TEXT,
            event_type TEXT NOT NULL,
            event_data TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tracking_events_user ON tracking_events(user_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    Ok(conn)
}

pub fn settings_get_json(
    conn: &Connection,
    key: &str,
) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key = ?", [key], |r| {
            r.get(0)
        })
        .optional()?;
    match raw {
        Some(s) => Ok(Some(serde_json::from_str(&s)?)),
        None => Ok(None),
    }
}

pub fn settings_set_json(
    conn: &Connection,
    key: &str,
    value: &serde_json::Value,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        (key, serde_json::to_string(value)?),
    )?;
    Ok(())
}

pub fn settings_delete(conn: &Connection, key: &str) -> anyhow::Result<()> {
    conn.execute("DELETE FROM settings WHERE key = ?", [key])?;
    Ok(())
}

pub fn pending_link_get(conn: &Connection) -> anyhow::Result<Option<String>> {
    Ok(settings_get_json(conn, PENDING_LINK_KEY)?.and_then(|v| v.as_str().map(str::to_string)))
}

pub fn pending_link_set(conn: &Connection, url: &str) -> anyhow::Result<()> {
    settings_set_json(conn, PENDING_LINK_KEY, &serde_json::Value::from(url))
}

pub fn pending_link_clear(conn: &Connection) -> anyhow::Result<()> {
    settings_delete(conn, PENDING_LINK_KEY)
}

/// Upsert an onboarding profile keyed by the auth provider's user id.
/// Answering at all marks onboarding completed.
pub fn upsert_user_profile(
    conn: &Connection,
    user_id: &str,
    is_teacher: Option<bool>,
    grade_level: Option<&str>,
    school: Option<&str>,
) -> anyhow::Result<()> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO user_profiles(
            id, user_id, is_teacher, grade_level, school,
            onboarding_completed, created_at, updated_at
         )
         VALUES(?, ?, ?, ?, ?, 1, ?, ?)
         ON CONFLICT(user_id) DO UPDATE SET
            is_teacher = excluded.is_teacher,
            grade_level = excluded.grade_level,
            school = excluded.school,
            onboarding_completed = 1,
            updated_at = excluded.updated_at",
        (
            Uuid::new_v4().to_string(),
            user_id,
            is_teacher,
            grade_level,
            school,
            &now,
            &now,
        ),
    )?;
    Ok(())
}

pub fn insert_tracking_event(
    conn: &Connection,
    user_id: Option<&str>,
    event_type: &str,
    event_data: Option<&str>,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO tracking_events(id, user_id, event_type, event_data, created_at)
         VALUES(?, ?, ?, ?, ?)",
        (
            Uuid::new_v4().to_string(),
            user_id,
            event_type,
            event_data,
            Utc::now().to_rfc3339(),
        ),
    )?;
    Ok(())
}
