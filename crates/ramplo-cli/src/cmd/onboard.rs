use crate::output::print_json;
use anyhow::Context;
use chrono::NaiveDate;
use ramplo_core::onboarding::complete_onboarding;
use ramplo_core::roadmap::roadmap_selector;
use std::path::Path;
use std::sync::Arc;

pub fn run(
    root: &Path,
    user: &str,
    profile_path: &Path,
    start: Option<NaiveDate>,
    offline: bool,
    json: bool,
) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    let profile = super::read_profile(profile_path)?;
    let catalog = Arc::new(config.load_catalog(root).context("failed to load sprint catalog")?);
    let selector = roadmap_selector(catalog, super::advisor(&config, offline));
    let store = super::open_store(root, &config)?;

    let outcome = complete_onboarding(
        &store,
        &selector,
        user,
        &profile,
        start.unwrap_or_else(super::today),
    )?;

    if json {
        let mut value = super::select::selection_json(&outcome.selection);
        value["progress"] = serde_json::to_value(&outcome.progress)?;
        value["tasksCreated"] = outcome.tasks_created.into();
        print_json(&value)?;
    } else {
        super::select::print_selection(&outcome.selection);
        println!();
        println!(
            "Onboarded {user}: {} tasks created, starting {}.",
            outcome.tasks_created, outcome.progress.start_date
        );
    }
    Ok(())
}
