//! Persistence for profiles, tasks, progress and daily connection logs.
//!
//! [`Store`] is the seam the tracker and onboarding flow talk to;
//! [`SqliteStore`] is the only implementation. Counter changes are done with
//! in-SQL increments so concurrent writers cannot lose updates.

use crate::calendar;
use crate::error::{RampError, Result};
use crate::migrations;
use crate::profile::UserProfile;
use crate::progress::{ConnectionCounts, DailyConnections, UserProgress};
use crate::task::{NewTask, Task};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Result of an atomic completion attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Completed(Task),
    AlreadyCompleted,
    NotFound,
}

pub trait Store: Send + Sync {
    /// Create the progress row, store the profile and insert the tasks in one
    /// transaction. Fails with `AlreadyOnboarded`, writing nothing, when the
    /// user already has a progress row.
    fn onboard(
        &self,
        progress: &UserProgress,
        profile: &UserProfile,
        tasks: &[NewTask],
        now: DateTime<Utc>,
    ) -> Result<Vec<Task>>;
    fn profile(&self, user_id: &str) -> Result<Option<UserProfile>>;

    /// The user's tasks in program order, optionally narrowed to a week and/or day.
    fn tasks(&self, user_id: &str, week: Option<u32>, day: Option<u32>) -> Result<Vec<Task>>;
    /// A task, only if it belongs to `user_id`.
    fn task(&self, user_id: &str, task_id: &str) -> Result<Option<Task>>;
    /// Mark a task done and bump the user's counter in one transaction.
    fn complete_task(&self, user_id: &str, task_id: &str, now: DateTime<Utc>) -> Result<Completion>;

    fn progress(&self, user_id: &str) -> Result<Option<UserProgress>>;
    fn set_cursor(&self, user_id: &str, week: u32, day: u32) -> Result<UserProgress>;
    fn add_outcomes(
        &self,
        user_id: &str,
        applications: u32,
        loans: u32,
        today: NaiveDate,
    ) -> Result<UserProgress>;
    /// Record activity on `date`. No-op for users without progress.
    fn touch_activity(&self, user_id: &str, date: NaiveDate) -> Result<()>;

    /// Insert or replace the counts for one user and date.
    fn record_connections(
        &self,
        user_id: &str,
        date: NaiveDate,
        counts: ConnectionCounts,
    ) -> Result<DailyConnections>;
    fn connections(&self, user_id: &str, date: NaiveDate) -> Result<Option<DailyConnections>>;
    /// Logs with `from <= date <= to`, oldest first.
    fn connections_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyConnections>>;
}

// ---------------------------------------------------------------------------
// Row parsing
// ---------------------------------------------------------------------------

const TASK_COLUMNS: &str = "id, user_id, title, description, category, estimated_minutes, \
                            week, day, completed, completed_at, created_at";

fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
        estimated_minutes: row.get(5)?,
        week: row.get(6)?,
        day: row.get(7)?,
        completed: row.get::<_, i64>(8)? != 0,
        completed_at: row.get(9)?,
        created_at: row.get(10)?,
    })
}

const PROGRESS_COLUMNS: &str = "user_id, sprint_id, start_date, current_week, current_day, \
                                tasks_completed, applications_submitted, loans_closed, last_activity_date";

fn parse_progress_row(row: &Row) -> rusqlite::Result<UserProgress> {
    Ok(UserProgress {
        user_id: row.get(0)?,
        sprint_id: row.get(1)?,
        start_date: row.get(2)?,
        current_week: row.get(3)?,
        current_day: row.get(4)?,
        tasks_completed: row.get(5)?,
        applications_submitted: row.get(6)?,
        loans_closed: row.get(7)?,
        last_activity_date: row.get(8)?,
    })
}

fn parse_connections_row(row: &Row) -> rusqlite::Result<DailyConnections> {
    Ok(DailyConnections {
        user_id: row.get(0)?,
        date: row.get(1)?,
        counts: ConnectionCounts {
            phone_calls: row.get(2)?,
            text_messages: row.get(3)?,
            emails: row.get(4)?,
        },
    })
}

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON; PRAGMA busy_timeout=5000;")?;
        migrations::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn progress_in(conn: &Connection, user_id: &str) -> Result<UserProgress> {
        conn.query_row(
            &format!("SELECT {PROGRESS_COLUMNS} FROM user_progress WHERE user_id = ?1"),
            [user_id],
            parse_progress_row,
        )
        .optional()?
        .ok_or_else(|| RampError::ProgressNotFound(user_id.to_string()))
    }

    fn insert_progress(conn: &Connection, p: &UserProgress) -> Result<()> {
        let inserted = conn.execute(
            &format!(
                "INSERT INTO user_progress ({PROGRESS_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT (user_id) DO NOTHING"
            ),
            params![
                p.user_id,
                p.sprint_id,
                p.start_date,
                p.current_week,
                p.current_day,
                p.tasks_completed,
                p.applications_submitted,
                p.loans_closed,
                p.last_activity_date,
            ],
        )?;
        if inserted == 0 {
            return Err(RampError::AlreadyOnboarded(p.user_id.clone()));
        }
        Ok(())
    }

    fn upsert_profile(
        conn: &Connection,
        user_id: &str,
        profile: &UserProfile,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let json = serde_json::to_string(profile)?;
        conn.execute(
            "INSERT INTO profiles (user_id, profile, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id) DO UPDATE SET profile = excluded.profile, updated_at = excluded.updated_at",
            params![user_id, json, now],
        )?;
        Ok(())
    }

    fn insert_tasks(conn: &Connection, tasks: &[NewTask], now: DateTime<Utc>) -> Result<Vec<Task>> {
        let mut stmt = conn.prepare(&format!(
            "INSERT INTO tasks ({TASK_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, NULL, ?9)"
        ))?;
        let mut created = Vec::with_capacity(tasks.len());
        for t in tasks {
            let task = Task {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: t.user_id.clone(),
                title: t.title.clone(),
                description: t.description.clone(),
                category: t.category.clone(),
                estimated_minutes: t.estimated_minutes,
                week: t.week,
                day: t.day,
                completed: false,
                completed_at: None,
                created_at: now,
            };
            stmt.execute(params![
                task.id,
                task.user_id,
                task.title,
                task.description,
                task.category,
                task.estimated_minutes,
                task.week,
                task.day,
                task.created_at,
            ])?;
            created.push(task);
        }
        Ok(created)
    }
}

impl Store for SqliteStore {
    fn onboard(
        &self,
        progress: &UserProgress,
        profile: &UserProfile,
        tasks: &[NewTask],
        now: DateTime<Utc>,
    ) -> Result<Vec<Task>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        Self::insert_progress(&tx, progress)?;
        Self::upsert_profile(&tx, &progress.user_id, profile, now)?;
        let created = Self::insert_tasks(&tx, tasks, now)?;
        tx.commit()?;
        tracing::debug!(user = %progress.user_id, tasks = created.len(), "onboarding committed");
        Ok(created)
    }

    fn profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let json: Option<String> = self
            .conn()
            .query_row(
                "SELECT profile FROM profiles WHERE user_id = ?1",
                [user_id],
                |r| r.get(0),
            )
            .optional()?;
        Ok(json.map(|j| serde_json::from_str(&j)).transpose()?)
    }

    fn tasks(&self, user_id: &str, week: Option<u32>, day: Option<u32>) -> Result<Vec<Task>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE user_id = ?1 AND (?2 IS NULL OR week = ?2) AND (?3 IS NULL OR day = ?3)
             ORDER BY week, day, rowid"
        ))?;
        let rows = stmt.query_map(params![user_id, week, day], parse_task_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn task(&self, user_id: &str, task_id: &str) -> Result<Option<Task>> {
        Ok(self
            .conn()
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 AND user_id = ?2"),
                [task_id, user_id],
                parse_task_row,
            )
            .optional()?)
    }

    fn complete_task(&self, user_id: &str, task_id: &str, now: DateTime<Utc>) -> Result<Completion> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let changed = tx.execute(
            "UPDATE tasks SET completed = 1, completed_at = ?1
             WHERE id = ?2 AND user_id = ?3 AND completed = 0",
            params![now, task_id, user_id],
        )?;
        if changed == 0 {
            let exists = tx
                .query_row(
                    "SELECT 1 FROM tasks WHERE id = ?1 AND user_id = ?2",
                    [task_id, user_id],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            return Ok(if exists {
                Completion::AlreadyCompleted
            } else {
                Completion::NotFound
            });
        }

        tx.execute(
            "UPDATE user_progress
             SET tasks_completed = tasks_completed + 1,
                 last_activity_date = CASE
                     WHEN last_activity_date IS NULL OR last_activity_date < ?2 THEN ?2
                     ELSE last_activity_date
                 END
             WHERE user_id = ?1",
            params![user_id, calendar::local_date(now)],
        )?;
        let task = tx.query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
            [task_id],
            parse_task_row,
        )?;
        tx.commit()?;
        Ok(Completion::Completed(task))
    }

    fn progress(&self, user_id: &str) -> Result<Option<UserProgress>> {
        match Self::progress_in(&self.conn(), user_id) {
            Ok(p) => Ok(Some(p)),
            Err(RampError::ProgressNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set_cursor(&self, user_id: &str, week: u32, day: u32) -> Result<UserProgress> {
        let conn = self.conn();
        conn.execute(
            "UPDATE user_progress SET current_week = ?2, current_day = ?3 WHERE user_id = ?1",
            params![user_id, week, day],
        )?;
        Self::progress_in(&conn, user_id)
    }

    fn add_outcomes(
        &self,
        user_id: &str,
        applications: u32,
        loans: u32,
        today: NaiveDate,
    ) -> Result<UserProgress> {
        let conn = self.conn();
        conn.execute(
            "UPDATE user_progress
             SET applications_submitted = applications_submitted + ?2,
                 loans_closed = loans_closed + ?3,
                 last_activity_date = CASE
                     WHEN last_activity_date IS NULL OR last_activity_date < ?4 THEN ?4
                     ELSE last_activity_date
                 END
             WHERE user_id = ?1",
            params![user_id, applications, loans, today],
        )?;
        Self::progress_in(&conn, user_id)
    }

    fn touch_activity(&self, user_id: &str, date: NaiveDate) -> Result<()> {
        self.conn().execute(
            "UPDATE user_progress
             SET last_activity_date = ?2
             WHERE user_id = ?1 AND (last_activity_date IS NULL OR last_activity_date < ?2)",
            params![user_id, date],
        )?;
        Ok(())
    }

    fn record_connections(
        &self,
        user_id: &str,
        date: NaiveDate,
        counts: ConnectionCounts,
    ) -> Result<DailyConnections> {
        self.conn().execute(
            "INSERT INTO daily_connections (user_id, date, phone_calls, text_messages, emails)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (user_id, date) DO UPDATE SET
                 phone_calls = excluded.phone_calls,
                 text_messages = excluded.text_messages,
                 emails = excluded.emails",
            params![user_id, date, counts.phone_calls, counts.text_messages, counts.emails],
        )?;
        Ok(DailyConnections {
            user_id: user_id.to_string(),
            date,
            counts,
        })
    }

    fn connections(&self, user_id: &str, date: NaiveDate) -> Result<Option<DailyConnections>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT user_id, date, phone_calls, text_messages, emails
                 FROM daily_connections WHERE user_id = ?1 AND date = ?2",
                params![user_id, date],
                parse_connections_row,
            )
            .optional()?)
    }

    fn connections_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyConnections>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT user_id, date, phone_calls, text_messages, emails
             FROM daily_connections
             WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date",
        )?;
        let rows = stmt.query_map(params![user_id, from, to], parse_connections_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
impl SqliteStore {
    pub(crate) fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn().execute_batch(sql)?;
        Ok(())
    }
}
