//! Progress tracking: task completion, daily connection logs, the derived
//! ramp-run streak and the daily performance score.

use crate::calendar;
use crate::catalog::{SprintCatalog, DAYS_PER_WEEK};
use crate::error::{RampError, Result};
use crate::store::{Completion, Store};
use crate::task::Task;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Score points for finishing all of a day's tasks.
pub const TASK_POINTS: u32 = 60;
/// Score points per logged connection.
pub const POINTS_PER_CONNECTION: u32 = 4;
/// Cap on connection points.
pub const MAX_CONNECTION_POINTS: u32 = 40;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub user_id: String,
    pub sprint_id: String,
    pub start_date: NaiveDate,
    pub current_week: u32,
    pub current_day: u32,
    pub tasks_completed: u32,
    pub applications_submitted: u32,
    pub loans_closed: u32,
    pub last_activity_date: Option<NaiveDate>,
}

impl UserProgress {
    /// Fresh progress with the cursor on week 1, day 1.
    pub fn new(user_id: &str, sprint_id: &str, start_date: NaiveDate) -> Self {
        Self {
            user_id: user_id.to_string(),
            sprint_id: sprint_id.to_string(),
            start_date,
            current_week: 1,
            current_day: 1,
            tasks_completed: 0,
            applications_submitted: 0,
            loans_closed: 0,
            last_activity_date: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionCounts {
    pub phone_calls: u32,
    pub text_messages: u32,
    pub emails: u32,
}

impl ConnectionCounts {
    /// Sum of all channels. Widened so no combination of counts can overflow.
    pub fn total(&self) -> u64 {
        u64::from(self.phone_calls) + u64::from(self.text_messages) + u64::from(self.emails)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyConnections {
    pub user_id: String,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub counts: ConnectionCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub week: u32,
    pub day: u32,
    pub date: NaiveDate,
    pub tasks_total: u32,
    pub tasks_completed: u32,
    pub connections: ConnectionCounts,
    pub ramp_run: bool,
    pub performance_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub progress: UserProgress,
    pub ramp_run_days: u32,
    pub current_streak: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub today: Option<DaySummary>,
}

// ---------------------------------------------------------------------------
// Pure rules
// ---------------------------------------------------------------------------

/// A day counts toward the ramp run when it had tasks, every one of them is
/// done, and at least one connection was logged.
pub fn is_ramp_run_day(tasks: &[Task], connections: Option<&ConnectionCounts>) -> bool {
    !tasks.is_empty()
        && tasks.iter().all(|t| t.completed)
        && connections.is_some_and(|c| c.total() > 0)
}

/// Daily score in `0..=100`: task share of 60 points plus 4 per connection, capped at 40.
pub fn performance_score(tasks: &[Task], connections: Option<&ConnectionCounts>) -> u32 {
    let task_points = if tasks.is_empty() {
        0
    } else {
        let done = tasks.iter().filter(|t| t.completed).count() as u32;
        (TASK_POINTS * done + tasks.len() as u32 / 2) / tasks.len() as u32
    };
    let connection_points = connections
        .map(|c| c.total().saturating_mul(u64::from(POINTS_PER_CONNECTION)))
        .unwrap_or(0)
        .min(u64::from(MAX_CONNECTION_POINTS)) as u32;
    task_points + connection_points
}

// ---------------------------------------------------------------------------
// ProgressTracker
// ---------------------------------------------------------------------------

/// Per-slot outcome used to derive run counts and streaks.
struct SlotOutcome {
    week: u32,
    day: u32,
    qualifies: bool,
}

pub struct ProgressTracker {
    store: Arc<dyn Store>,
    catalog: Arc<SprintCatalog>,
}

impl ProgressTracker {
    pub fn new(store: Arc<dyn Store>, catalog: Arc<SprintCatalog>) -> Self {
        Self { store, catalog }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    fn require_progress(&self, user_id: &str) -> Result<UserProgress> {
        self.store
            .progress(user_id)?
            .ok_or_else(|| RampError::ProgressNotFound(user_id.to_string()))
    }

    /// Mark the caller's task complete.
    ///
    /// A task owned by someone else is reported as not found.
    pub fn complete_task(&self, caller: &str, task_id: &str, now: DateTime<Utc>) -> Result<Task> {
        match self.store.complete_task(caller, task_id, now)? {
            Completion::Completed(task) => {
                tracing::info!(user = caller, task = task_id, "task completed");
                Ok(task)
            }
            Completion::AlreadyCompleted => Err(RampError::AlreadyCompleted(task_id.to_string())),
            Completion::NotFound => Err(RampError::TaskNotFound(task_id.to_string())),
        }
    }

    /// Replace the day's connection counts and mark the user active that day.
    ///
    /// Only onboarded users can log connections.
    pub fn record_daily_connections(
        &self,
        user_id: &str,
        date: NaiveDate,
        counts: ConnectionCounts,
    ) -> Result<DailyConnections> {
        self.require_progress(user_id)?;
        let logged = self.store.record_connections(user_id, date, counts)?;
        self.store.touch_activity(user_id, date)?;
        tracing::debug!(user = user_id, %date, total = counts.total(), "connections logged");
        Ok(logged)
    }

    /// Move the cursor to the next slot. Stays put on the final slot.
    pub fn advance(&self, user_id: &str) -> Result<UserProgress> {
        let progress = self.require_progress(user_id)?;
        let sprint = self.catalog.require(&progress.sprint_id)?;
        match sprint.next_slot(progress.current_week, progress.current_day) {
            Some((week, day)) => self.store.set_cursor(user_id, week, day),
            None => Ok(progress),
        }
    }

    pub fn set_cursor(&self, user_id: &str, week: u32, day: u32) -> Result<UserProgress> {
        let progress = self.require_progress(user_id)?;
        let sprint = self.catalog.require(&progress.sprint_id)?;
        if !sprint.contains_slot(week, day) {
            return Err(RampError::InvalidCursor { week, day });
        }
        self.store.set_cursor(user_id, week, day)
    }

    /// Add loan outcomes to the running totals.
    pub fn record_outcomes(
        &self,
        user_id: &str,
        applications: u32,
        loans: u32,
        today: NaiveDate,
    ) -> Result<UserProgress> {
        self.store.add_outcomes(user_id, applications, loans, today)
    }

    /// Evaluate every program slot dated on or before `today`, in order.
    fn slot_outcomes(&self, progress: &UserProgress, tasks: &[Task], today: NaiveDate) -> Result<Vec<SlotOutcome>> {
        let Some((last_week, last_day)) = calendar::last_slot_on_or_before(progress.start_date, today)
        else {
            return Ok(Vec::new());
        };

        let weeks = match self.catalog.get(&progress.sprint_id) {
            Some(sprint) => sprint.week_count(),
            None => tasks.iter().map(|t| t.week).max().unwrap_or(0),
        };

        let mut by_slot: HashMap<(u32, u32), Vec<Task>> = HashMap::new();
        for t in tasks {
            by_slot.entry((t.week, t.day)).or_default().push(t.clone());
        }

        let logs: HashMap<NaiveDate, ConnectionCounts> = self
            .store
            .connections_between(&progress.user_id, progress.start_date, today)?
            .into_iter()
            .map(|c| (c.date, c.counts))
            .collect();

        let last_index = calendar::slot_index(last_week, last_day);
        let mut outcomes = Vec::new();
        for week in 1..=weeks {
            for day in 1..=DAYS_PER_WEEK {
                if calendar::slot_index(week, day) > last_index {
                    return Ok(outcomes);
                }
                let date = calendar::slot_date(progress.start_date, week, day);
                let slot_tasks = by_slot.get(&(week, day)).map(Vec::as_slice).unwrap_or(&[]);
                outcomes.push(SlotOutcome {
                    week,
                    day,
                    qualifies: is_ramp_run_day(slot_tasks, logs.get(&date)),
                });
            }
        }
        Ok(outcomes)
    }

    fn streak(outcomes: &[SlotOutcome]) -> u32 {
        let mut iter = outcomes.iter().rev().peekable();
        // Today's slot still in progress does not break the streak.
        if iter.peek().is_some_and(|o| !o.qualifies) {
            iter.next();
        }
        iter.take_while(|o| o.qualifies).count() as u32
    }

    /// Number of program days so far that qualified as ramp-run days.
    pub fn ramp_run_days(&self, user_id: &str, today: NaiveDate) -> Result<u32> {
        let progress = self.require_progress(user_id)?;
        let tasks = self.store.tasks(user_id, None, None)?;
        let outcomes = self.slot_outcomes(&progress, &tasks, today)?;
        Ok(outcomes.iter().filter(|o| o.qualifies).count() as u32)
    }

    /// Consecutive qualifying days ending today, or yesterday if today is not done yet.
    pub fn current_streak(&self, user_id: &str, today: NaiveDate) -> Result<u32> {
        let progress = self.require_progress(user_id)?;
        let tasks = self.store.tasks(user_id, None, None)?;
        Ok(Self::streak(&self.slot_outcomes(&progress, &tasks, today)?))
    }

    pub fn report(&self, user_id: &str, today: NaiveDate) -> Result<ProgressReport> {
        let progress = self.require_progress(user_id)?;
        let tasks = self.store.tasks(user_id, None, None)?;
        let outcomes = self.slot_outcomes(&progress, &tasks, today)?;

        let today_summary = match calendar::slot_for(progress.start_date, today) {
            Some((week, day)) if outcomes.last().is_some_and(|o| (o.week, o.day) == (week, day)) => {
                let day_tasks: Vec<Task> = tasks
                    .iter()
                    .filter(|t| t.week == week && t.day == day)
                    .cloned()
                    .collect();
                let connections = self
                    .store
                    .connections(user_id, today)?
                    .map(|c| c.counts)
                    .unwrap_or_default();
                Some(DaySummary {
                    week,
                    day,
                    date: today,
                    tasks_total: day_tasks.len() as u32,
                    tasks_completed: day_tasks.iter().filter(|t| t.completed).count() as u32,
                    connections,
                    ramp_run: is_ramp_run_day(&day_tasks, Some(&connections)),
                    performance_score: performance_score(&day_tasks, Some(&connections)),
                })
            }
            _ => None,
        };

        Ok(ProgressReport {
            ramp_run_days: outcomes.iter().filter(|o| o.qualifies).count() as u32,
            current_streak: Self::streak(&outcomes),
            today: today_summary,
            progress,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::sprint;
    use crate::store::SqliteStore;
    use crate::task::materialize;
    use crate::types::{ExperienceLevel, FocusArea, TimeCommitment};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn counts(calls: u32) -> ConnectionCounts {
        ConnectionCounts {
            phone_calls: calls,
            ..Default::default()
        }
    }

    /// Tracker over the two-week test sprint, user "u1" onboarded Monday 2024-06-03.
    fn setup() -> (ProgressTracker, Vec<Task>) {
        let catalog = Arc::new(
            SprintCatalog::from_sprints(vec![sprint(
                "s",
                ExperienceLevel::New,
                FocusArea::Purchase,
                TimeCommitment::Min60,
            )])
            .unwrap(),
        );
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let tasks = materialize(
            store.as_ref(),
            &UserProgress::new("u1", "s", date(2024, 6, 3)),
            &crate::profile::UserProfile::default(),
            catalog.first(),
        )
        .unwrap();
        (ProgressTracker::new(store, catalog), tasks)
    }

    fn task(done: bool) -> Task {
        Task {
            id: "t".into(),
            user_id: "u".into(),
            title: "t".into(),
            description: String::new(),
            category: "c".into(),
            estimated_minutes: 5,
            week: 1,
            day: 1,
            completed: done,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn ramp_run_day_rules() {
        assert!(is_ramp_run_day(&[task(true), task(true)], Some(&counts(1))));
        assert!(!is_ramp_run_day(&[task(true), task(false)], Some(&counts(1))));
        assert!(!is_ramp_run_day(&[task(true)], Some(&counts(0))));
        assert!(!is_ramp_run_day(&[task(true)], None));
        assert!(!is_ramp_run_day(&[], Some(&counts(5))));
    }

    #[test]
    fn performance_score_formula() {
        assert_eq!(performance_score(&[], None), 0);
        assert_eq!(performance_score(&[task(true), task(true)], None), 60);
        assert_eq!(performance_score(&[task(true), task(false), task(false)], Some(&counts(2))), 28);
        assert_eq!(performance_score(&[task(true)], Some(&counts(25))), 100);
    }

    #[test]
    fn complete_task_counts_once() {
        let (tracker, tasks) = setup();
        let now = Utc::now();
        let done = tracker.complete_task("u1", &tasks[0].id, now).unwrap();
        assert!(done.completed);
        assert_eq!(done.completed_at, Some(now));

        let err = tracker.complete_task("u1", &tasks[0].id, now).unwrap_err();
        assert!(matches!(err, RampError::AlreadyCompleted(_)));
        assert_eq!(tracker.store().progress("u1").unwrap().unwrap().tasks_completed, 1);
    }

    #[test]
    fn cross_user_completion_is_not_found() {
        let (tracker, tasks) = setup();
        let err = tracker.complete_task("intruder", &tasks[0].id, Utc::now()).unwrap_err();
        assert!(matches!(err, RampError::TaskNotFound(_)));
        let stored = tracker.store().task("u1", &tasks[0].id).unwrap().unwrap();
        assert!(!stored.completed);
    }

    #[test]
    fn concurrent_completion_increments_once() {
        let (tracker, tasks) = setup();
        let tracker = Arc::new(tracker);
        let id = tasks[0].id.clone();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let tracker = tracker.clone();
                let id = id.clone();
                std::thread::spawn(move || tracker.complete_task("u1", &id, Utc::now()).is_ok())
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
        assert_eq!(tracker.store().progress("u1").unwrap().unwrap().tasks_completed, 1);
    }

    #[test]
    fn streak_and_run_days() {
        let (tracker, tasks) = setup();
        let now = Utc::now();
        // (1,1) two tasks, (1,2) one task, (2,3) and (2,5) one each
        for t in tasks.iter().filter(|t| (t.week, t.day) == (1, 1) || (t.week, t.day) == (1, 2)) {
            tracker.complete_task("u1", &t.id, now).unwrap();
        }
        tracker.record_daily_connections("u1", date(2024, 6, 3), counts(2)).unwrap();
        tracker.record_daily_connections("u1", date(2024, 6, 4), counts(1)).unwrap();
        // connections on a day without tasks never qualify
        tracker.record_daily_connections("u1", date(2024, 6, 5), counts(3)).unwrap();

        assert_eq!(tracker.ramp_run_days("u1", date(2024, 6, 4)).unwrap(), 2);
        assert_eq!(tracker.current_streak("u1", date(2024, 6, 4)).unwrap(), 2);
        // today (1,3) not qualifying: streak counts through yesterday
        assert_eq!(tracker.current_streak("u1", date(2024, 6, 5)).unwrap(), 2);
        // two non-qualifying days in a row break it
        assert_eq!(tracker.current_streak("u1", date(2024, 6, 6)).unwrap(), 0);
        assert_eq!(tracker.ramp_run_days("u1", date(2024, 6, 6)).unwrap(), 2);
        // before the program starts nothing counts
        assert_eq!(tracker.ramp_run_days("u1", date(2024, 6, 1)).unwrap(), 0);
    }

    #[test]
    fn week_two_day_three_qualifies_on_its_own_date() {
        let (tracker, tasks) = setup();
        let slot = tasks.iter().find(|t| (t.week, t.day) == (2, 3)).unwrap();
        // week 2 day 3 of a program started Monday 2024-06-03
        let wednesday = date(2024, 6, 12);
        tracker.record_daily_connections("u1", wednesday, counts(1)).unwrap();

        let pending = tracker.report("u1", wednesday).unwrap();
        assert!(!pending.today.as_ref().unwrap().ramp_run);
        assert_eq!(pending.ramp_run_days, 0);

        tracker.complete_task("u1", &slot.id, Utc::now()).unwrap();
        let report = tracker.report("u1", wednesday).unwrap();
        let today = report.today.unwrap();
        assert_eq!((today.week, today.day), (2, 3));
        assert_eq!(today.date, wednesday);
        assert!(today.ramp_run);
        assert_eq!(report.ramp_run_days, 1);
        assert_eq!(report.current_streak, 1);
        // connections logged on another date do not count for the slot
        assert_eq!(tracker.ramp_run_days("u1", date(2024, 6, 11)).unwrap(), 0);
    }

    #[test]
    fn huge_connection_counts_do_not_overflow() {
        let max = ConnectionCounts {
            phone_calls: u32::MAX,
            text_messages: 1,
            emails: u32::MAX,
        };
        assert_eq!(max.total(), 2 * u64::from(u32::MAX) + 1);
        assert_eq!(performance_score(&[task(false)], Some(&max)), MAX_CONNECTION_POINTS);

        let (tracker, tasks) = setup();
        for t in tasks.iter().filter(|t| (t.week, t.day) == (1, 1)) {
            tracker.complete_task("u1", &t.id, Utc::now()).unwrap();
        }
        tracker.record_daily_connections("u1", date(2024, 6, 3), max).unwrap();
        let report = tracker.report("u1", date(2024, 6, 3)).unwrap();
        let today = report.today.unwrap();
        assert!(today.ramp_run);
        assert_eq!(today.performance_score, 100);
        assert_eq!(report.ramp_run_days, 1);
    }

    #[test]
    fn partial_day_does_not_qualify() {
        let (tracker, tasks) = setup();
        let first = tasks.iter().find(|t| (t.week, t.day) == (1, 1)).unwrap();
        tracker.complete_task("u1", &first.id, Utc::now()).unwrap();
        tracker.record_daily_connections("u1", date(2024, 6, 3), counts(4)).unwrap();
        assert_eq!(tracker.ramp_run_days("u1", date(2024, 6, 3)).unwrap(), 0);
    }

    #[test]
    fn connections_require_onboarding() {
        let (tracker, _) = setup();
        let err = tracker
            .record_daily_connections("stranger", date(2024, 6, 4), counts(1))
            .unwrap_err();
        assert!(matches!(err, RampError::ProgressNotFound(_)));
    }

    #[test]
    fn connections_bump_last_activity() {
        let (tracker, _) = setup();
        tracker.record_daily_connections("u1", date(2024, 6, 4), counts(1)).unwrap();
        let p = tracker.store().progress("u1").unwrap().unwrap();
        assert_eq!(p.last_activity_date, Some(date(2024, 6, 4)));
    }

    #[test]
    fn report_includes_today() {
        let (tracker, tasks) = setup();
        for t in tasks.iter().filter(|t| (t.week, t.day) == (1, 1)) {
            tracker.complete_task("u1", &t.id, Utc::now()).unwrap();
        }
        tracker.record_daily_connections("u1", date(2024, 6, 3), counts(3)).unwrap();

        let report = tracker.report("u1", date(2024, 6, 3)).unwrap();
        assert_eq!(report.ramp_run_days, 1);
        assert_eq!(report.current_streak, 1);
        let today = report.today.unwrap();
        assert_eq!((today.week, today.day), (1, 1));
        assert_eq!(today.tasks_total, 2);
        assert_eq!(today.tasks_completed, 2);
        assert!(today.ramp_run);
        assert_eq!(today.performance_score, 72);

        let weekend = tracker.report("u1", date(2024, 6, 8)).unwrap();
        assert!(weekend.today.is_none());
        let after = tracker.report("u1", date(2024, 9, 2)).unwrap();
        assert!(after.today.is_none());
    }

    #[test]
    fn cursor_moves_within_sprint() {
        let (tracker, _) = setup();
        let p = tracker.set_cursor("u1", 1, 5).unwrap();
        assert_eq!((p.current_week, p.current_day), (1, 5));
        let p = tracker.advance("u1").unwrap();
        assert_eq!((p.current_week, p.current_day), (2, 1));

        tracker.set_cursor("u1", 2, 5).unwrap();
        let p = tracker.advance("u1").unwrap();
        assert_eq!((p.current_week, p.current_day), (2, 5));

        assert!(matches!(
            tracker.set_cursor("u1", 3, 1),
            Err(RampError::InvalidCursor { week: 3, day: 1 })
        ));
        assert!(matches!(
            tracker.set_cursor("u1", 1, 6),
            Err(RampError::InvalidCursor { .. })
        ));
        assert!(matches!(
            tracker.advance("nobody"),
            Err(RampError::ProgressNotFound(_))
        ));
    }

    #[test]
    fn outcomes_accumulate() {
        let (tracker, _) = setup();
        tracker.record_outcomes("u1", 2, 0, date(2024, 6, 4)).unwrap();
        let p = tracker.record_outcomes("u1", 1, 1, date(2024, 6, 5)).unwrap();
        assert_eq!((p.applications_submitted, p.loans_closed), (3, 1));
    }
}
