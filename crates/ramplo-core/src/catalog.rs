//! Sprint catalog: the read-only library of 90-day programs.
//!
//! A catalog is parsed once (from the YAML bundled into the binary or from an
//! override file), validated, and then shared by `Arc` with the selectors and
//! the progress tracker. Nothing mutates it after load.

use crate::error::{RampError, Result};
use crate::types::{ExperienceLevel, FocusArea, TimeCommitment};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Schema version understood by this build.
pub const CATALOG_VERSION: u32 = 1;

/// Business days per program week.
pub const DAYS_PER_WEEK: u32 = 5;

const BUILTIN_SPRINTS: &str = include_str!("../catalog/sprints.yaml");

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayTaskTemplate {
    /// Filled in from the parent week when the source file omits it.
    #[serde(default)]
    pub week: u32,
    pub day: u32,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(alias = "minutes", alias = "estimated_minutes")]
    pub estimated_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekTemplate {
    pub week: u32,
    pub theme: String,
    #[serde(default)]
    pub tasks: Vec<DayTaskTemplate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintTemplate {
    pub id: String,
    pub name: String,
    #[serde(alias = "experience_level")]
    pub experience_level: ExperienceLevel,
    pub focus: FocusArea,
    #[serde(alias = "time_commitment")]
    pub time_commitment: TimeCommitment,
    pub description: String,
    pub weeks: Vec<WeekTemplate>,
}

impl SprintTemplate {
    pub fn week_count(&self) -> u32 {
        self.weeks.len() as u32
    }

    /// Every task template in week/day order as authored.
    pub fn tasks(&self) -> impl Iterator<Item = &DayTaskTemplate> {
        self.weeks.iter().flat_map(|w| w.tasks.iter())
    }

    pub fn tasks_for(&self, week: u32, day: u32) -> Vec<&DayTaskTemplate> {
        self.tasks()
            .filter(|t| t.week == week && t.day == day)
            .collect()
    }

    /// Whether `(week, day)` is a valid cursor position in this sprint.
    pub fn contains_slot(&self, week: u32, day: u32) -> bool {
        (1..=self.week_count()).contains(&week) && (1..=DAYS_PER_WEEK).contains(&day)
    }

    /// The slot after `(week, day)`, or `None` at the end of the program.
    pub fn next_slot(&self, week: u32, day: u32) -> Option<(u32, u32)> {
        if day < DAYS_PER_WEEK {
            Some((week, day + 1))
        } else if week < self.week_count() {
            Some((week + 1, 1))
        } else {
            None
        }
    }

    pub fn summary(&self) -> SprintSummary {
        SprintSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            focus: self.focus,
            experience_level: self.experience_level,
            time_commitment: self.time_commitment,
            description: self.description.clone(),
            weeks: self.week_count(),
            tasks: self.tasks().count() as u32,
        }
    }
}

/// Compact projection of a sprint, used in advisory prompts and API listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintSummary {
    pub id: String,
    pub name: String,
    pub focus: FocusArea,
    pub experience_level: ExperienceLevel,
    pub time_commitment: TimeCommitment,
    pub description: String,
    pub weeks: u32,
    pub tasks: u32,
}

// ---------------------------------------------------------------------------
// SprintCatalog
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CatalogFile {
    version: u32,
    sprints: Vec<SprintTemplate>,
}

#[derive(Debug, Clone)]
pub struct SprintCatalog {
    version: u32,
    sprints: Vec<Arc<SprintTemplate>>,
}

impl SprintCatalog {
    /// The catalog bundled with the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_SPRINTS)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_yaml(&data)
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(data)?;
        if file.version != CATALOG_VERSION {
            return Err(RampError::InvalidCatalog(format!(
                "unsupported catalog version {} (expected {CATALOG_VERSION})",
                file.version
            )));
        }
        Self::from_sprints(file.sprints)
    }

    /// Build a catalog from in-memory sprints, filling denormalized week
    /// numbers and validating every invariant.
    pub fn from_sprints(mut sprints: Vec<SprintTemplate>) -> Result<Self> {
        for sprint in &mut sprints {
            for week in &mut sprint.weeks {
                for task in &mut week.tasks {
                    if task.week == 0 {
                        task.week = week.week;
                    }
                }
            }
        }
        validate(&sprints)?;
        Ok(Self {
            version: CATALOG_VERSION,
            sprints: sprints.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn list(&self) -> &[Arc<SprintTemplate>] {
        &self.sprints
    }

    pub fn get(&self, id: &str) -> Option<&Arc<SprintTemplate>> {
        self.sprints.iter().find(|s| s.id == id)
    }

    pub fn require(&self, id: &str) -> Result<&Arc<SprintTemplate>> {
        self.get(id)
            .ok_or_else(|| RampError::SprintNotFound(id.to_string()))
    }

    /// The default choice when nothing matches. A validated catalog is never empty.
    pub fn first(&self) -> &Arc<SprintTemplate> {
        &self.sprints[0]
    }

    pub fn summaries(&self) -> Vec<SprintSummary> {
        self.sprints.iter().map(|s| s.summary()).collect()
    }
}

/// Check catalog integrity: unique ids, contiguous weeks, business-day tasks.
pub fn validate(sprints: &[SprintTemplate]) -> Result<()> {
    if sprints.is_empty() {
        return Err(RampError::InvalidCatalog("catalog has no sprints".into()));
    }

    let mut seen = HashSet::new();
    for sprint in sprints {
        if sprint.id.trim().is_empty() {
            return Err(RampError::InvalidCatalog("sprint with empty id".into()));
        }
        if !seen.insert(sprint.id.as_str()) {
            return Err(RampError::InvalidCatalog(format!(
                "duplicate sprint id '{}'",
                sprint.id
            )));
        }
        if sprint.weeks.is_empty() {
            return Err(RampError::InvalidCatalog(format!(
                "sprint '{}' has no weeks",
                sprint.id
            )));
        }

        for (i, week) in sprint.weeks.iter().enumerate() {
            let expected = i as u32 + 1;
            if week.week != expected {
                return Err(RampError::InvalidCatalog(format!(
                    "sprint '{}': expected week {expected}, found week {}",
                    sprint.id, week.week
                )));
            }
            for task in &week.tasks {
                if task.week != week.week {
                    return Err(RampError::InvalidCatalog(format!(
                        "sprint '{}': task '{}' claims week {} inside week {}",
                        sprint.id, task.title, task.week, week.week
                    )));
                }
                if !(1..=DAYS_PER_WEEK).contains(&task.day) {
                    return Err(RampError::InvalidCatalog(format!(
                        "sprint '{}': task '{}' has day {} (must be 1-{DAYS_PER_WEEK})",
                        sprint.id, task.title, task.day
                    )));
                }
                if task.estimated_minutes == 0 {
                    return Err(RampError::InvalidCatalog(format!(
                        "sprint '{}': task '{}' has no time estimate",
                        sprint.id, task.title
                    )));
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn task(day: u32, title: &str) -> DayTaskTemplate {
        DayTaskTemplate {
            week: 0,
            day,
            title: title.to_string(),
            description: format!("{title} description"),
            category: "prospecting".to_string(),
            estimated_minutes: 15,
        }
    }

    /// A small two-week sprint for tests that need a custom catalog.
    pub(crate) fn sprint(
        id: &str,
        experience: ExperienceLevel,
        focus: FocusArea,
        time: TimeCommitment,
    ) -> SprintTemplate {
        SprintTemplate {
            id: id.to_string(),
            name: format!("{id} name"),
            experience_level: experience,
            focus,
            time_commitment: time,
            description: format!("{id} description"),
            weeks: vec![
                WeekTemplate {
                    week: 1,
                    theme: "Setup".to_string(),
                    tasks: vec![task(1, "Write bio"), task(1, "List past clients"), task(2, "Call three realtors")],
                },
                WeekTemplate {
                    week: 2,
                    theme: "Outreach".to_string(),
                    tasks: vec![task(3, "Host open house"), task(5, "Weekly review")],
                },
            ],
        }
    }

    #[test]
    fn builtin_catalog_loads() {
        let catalog = SprintCatalog::builtin().unwrap();
        assert_eq!(catalog.version(), CATALOG_VERSION);
        assert!(catalog.list().len() >= 3);
        assert_eq!(catalog.first().id, "foundations-newlo-60min");
    }

    #[test]
    fn builtin_catalog_integrity() {
        let catalog = SprintCatalog::builtin().unwrap();
        for sprint in catalog.list() {
            let weeks: Vec<u32> = sprint.weeks.iter().map(|w| w.week).collect();
            let expected: Vec<u32> = (1..=sprint.week_count()).collect();
            assert_eq!(weeks, expected, "weeks of {}", sprint.id);
            for t in sprint.tasks() {
                assert!((1..=5).contains(&t.day), "{}: {}", sprint.id, t.title);
                assert!(t.estimated_minutes > 0);
            }
        }
    }

    #[test]
    fn builtin_sprints_are_thirteen_weeks_of_three_daily_tasks() {
        let catalog = SprintCatalog::builtin().unwrap();
        for sprint in catalog.list() {
            assert_eq!(sprint.week_count(), 13, "{}", sprint.id);
            for week in 1..=13 {
                for day in 1..=5 {
                    assert_eq!(
                        sprint.tasks_for(week, day).len(),
                        3,
                        "{} week {week} day {day}",
                        sprint.id
                    );
                }
            }
        }
    }

    #[test]
    fn foundations_entry_matches_new_purchase_60() {
        let catalog = SprintCatalog::builtin().unwrap();
        let sprint = catalog.require("foundations-newlo-60min").unwrap();
        assert_eq!(sprint.name, "Foundations – New LO (60-90 min/day)");
        assert_eq!(sprint.experience_level, ExperienceLevel::New);
        assert_eq!(sprint.focus, FocusArea::Purchase);
        assert_eq!(sprint.time_commitment, TimeCommitment::Min60);
    }

    #[test]
    fn require_unknown_id_is_not_found() {
        let catalog = SprintCatalog::builtin().unwrap();
        let err = catalog.require("no-such-sprint").unwrap_err();
        assert!(matches!(err, RampError::SprintNotFound(_)));
        assert!(err.is_not_found());
    }

    #[test]
    fn week_numbers_are_filled_from_parent() {
        let catalog = SprintCatalog::from_sprints(vec![sprint(
            "a",
            ExperienceLevel::New,
            FocusArea::Purchase,
            TimeCommitment::Min30,
        )])
        .unwrap();
        let weeks: Vec<u32> = catalog.first().tasks().map(|t| t.week).collect();
        assert_eq!(weeks, vec![1, 1, 1, 2, 2]);
    }

    #[test]
    fn gap_in_weeks_is_rejected() {
        let mut s = sprint("a", ExperienceLevel::New, FocusArea::Purchase, TimeCommitment::Min30);
        s.weeks[1].week = 3;
        s.weeks[1].tasks.iter_mut().for_each(|t| t.week = 3);
        let err = SprintCatalog::from_sprints(vec![s]).unwrap_err();
        assert!(err.to_string().contains("expected week 2"));
    }

    #[test]
    fn weekend_day_is_rejected() {
        let mut s = sprint("a", ExperienceLevel::New, FocusArea::Purchase, TimeCommitment::Min30);
        s.weeks[0].tasks[0].day = 6;
        let err = SprintCatalog::from_sprints(vec![s]).unwrap_err();
        assert!(matches!(err, RampError::InvalidCatalog(_)));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let a = sprint("a", ExperienceLevel::New, FocusArea::Purchase, TimeCommitment::Min30);
        let err = SprintCatalog::from_sprints(vec![a.clone(), a]).unwrap_err();
        assert!(err.to_string().contains("duplicate sprint id"));
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(SprintCatalog::from_sprints(vec![]).is_err());
    }

    #[test]
    fn wrong_version_is_rejected() {
        let err = SprintCatalog::from_yaml("version: 9\nsprints: []\n").unwrap_err();
        assert!(err.to_string().contains("unsupported catalog version"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sprints.yaml");
        std::fs::write(
            &path,
            r#"
version: 1
sprints:
  - id: tiny
    name: Tiny
    experience_level: "3+"
    focus: heloc
    time_commitment: "30"
    description: One week
    weeks:
      - week: 1
        theme: Only week
        tasks:
          - { day: 1, title: Call, description: Call someone, category: outreach, minutes: 10 }
"#,
        )
        .unwrap();
        let catalog = SprintCatalog::load(&path).unwrap();
        let tiny = catalog.require("tiny").unwrap();
        assert_eq!(tiny.focus, FocusArea::Heloc);
        assert_eq!(tiny.tasks().next().unwrap().estimated_minutes, 10);
    }

    #[test]
    fn slot_navigation() {
        let s = sprint("a", ExperienceLevel::New, FocusArea::Purchase, TimeCommitment::Min30);
        assert!(s.contains_slot(2, 5));
        assert!(!s.contains_slot(3, 1));
        assert!(!s.contains_slot(1, 0));
        assert_eq!(s.next_slot(1, 5), Some((2, 1)));
        assert_eq!(s.next_slot(2, 4), Some((2, 5)));
        assert_eq!(s.next_slot(2, 5), None);
    }
}
