pub mod catalog;
pub mod config;
pub mod connections;
pub mod init;
pub mod onboard;
pub mod progress;
pub mod select;
pub mod serve;
pub mod task;
pub mod templates;

use anyhow::Context;
use chrono::NaiveDate;
use ramplo_core::advisory::{Advisor, DisabledAdvisor};
use ramplo_core::config::Config;
use ramplo_core::profile::{OnboardingAnswers, UserProfile};
use ramplo_core::store::SqliteStore;
use std::path::Path;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

pub(crate) fn load_config(root: &Path) -> anyhow::Result<Config> {
    Config::load(root).context("failed to load config")
}

pub(crate) fn open_store(root: &Path, config: &Config) -> anyhow::Result<SqliteStore> {
    let path = config.database_path(root);
    SqliteStore::open(&path).with_context(|| format!("failed to open database {}", path.display()))
}

/// The configured advisor, or rules only when `offline` is set.
pub(crate) fn advisor(config: &Config, offline: bool) -> Arc<dyn Advisor> {
    if offline {
        Arc::new(DisabledAdvisor)
    } else {
        config.build_advisor()
    }
}

/// Read questionnaire answers from a YAML (or JSON) file and validate them.
pub(crate) fn read_profile(path: &Path) -> anyhow::Result<UserProfile> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read profile {}", path.display()))?;
    let answers: OnboardingAnswers = serde_yaml::from_str(&data)
        .with_context(|| format!("failed to parse profile {}", path.display()))?;
    UserProfile::from_answers(&answers).context("invalid profile")
}

pub(crate) fn today() -> NaiveDate {
    ramplo_core::calendar::today()
}
