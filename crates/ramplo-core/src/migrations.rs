use crate::config::Config;
use crate::error::Result;
use rusqlite::Connection;

/// Schema steps, applied in order. Index `i` upgrades `user_version` from `i` to `i + 1`.
const SCHEMA: &[&str] = &[
    // v1
    "CREATE TABLE profiles (
         user_id    TEXT PRIMARY KEY,
         profile    TEXT NOT NULL,
         updated_at TEXT NOT NULL
     );
     CREATE TABLE tasks (
         id                TEXT PRIMARY KEY,
         user_id           TEXT NOT NULL,
         title             TEXT NOT NULL,
         description       TEXT NOT NULL,
         category          TEXT NOT NULL,
         estimated_minutes INTEGER NOT NULL,
         week              INTEGER NOT NULL,
         day               INTEGER NOT NULL,
         completed         INTEGER NOT NULL DEFAULT 0,
         completed_at      TEXT,
         created_at        TEXT NOT NULL
     );
     CREATE INDEX idx_tasks_user_slot ON tasks (user_id, week, day);
     CREATE TABLE user_progress (
         user_id                TEXT PRIMARY KEY,
         sprint_id              TEXT NOT NULL,
         start_date             TEXT NOT NULL,
         current_week           INTEGER NOT NULL,
         current_day            INTEGER NOT NULL,
         tasks_completed        INTEGER NOT NULL DEFAULT 0,
         applications_submitted INTEGER NOT NULL DEFAULT 0,
         loans_closed           INTEGER NOT NULL DEFAULT 0,
         last_activity_date     TEXT
     );
     CREATE TABLE daily_connections (
         user_id       TEXT NOT NULL,
         date          TEXT NOT NULL,
         phone_calls   INTEGER NOT NULL DEFAULT 0,
         text_messages INTEGER NOT NULL DEFAULT 0,
         emails        INTEGER NOT NULL DEFAULT 0,
         PRIMARY KEY (user_id, date)
     );",
];

pub fn schema_version() -> u32 {
    SCHEMA.len() as u32
}

/// Bring the database schema up to date using `PRAGMA user_version`.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    let current: u32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    for (i, step) in SCHEMA.iter().enumerate().skip(current as usize) {
        let next = i as u32 + 1;
        tracing::info!(version = next, "migrating database schema");
        let tx = conn.transaction()?;
        tx.execute_batch(step)?;
        tx.pragma_update(None, "user_version", next)?;
        tx.commit()?;
    }
    Ok(())
}

/// Newest config schema this build writes.
pub const CONFIG_VERSION: u32 = 1;

/// Run any pending migrations on a loaded [`Config`].
///
/// Version 0 (files written before the field existed) upgrades in place.
pub fn migrate_config(mut cfg: Config) -> Result<Config> {
    if cfg.version == 0 {
        cfg.version = CONFIG_VERSION;
    }
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_sets_user_version_and_is_repeatable() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();
        let v: u32 = conn
            .query_row("PRAGMA user_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(v, schema_version());
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(tables, 4);
    }
}
