use crate::output::{print_json, print_table};
use anyhow::Context;
use ramplo_core::outreach::{template_selector, TemplateQuery};
use ramplo_core::roadmap::{roadmap_selector, RoadmapSelection};
use std::path::Path;
use std::sync::Arc;

/// Preview the roadmap a profile would be given. Nothing is stored.
pub fn roadmap(root: &Path, profile_path: &Path, offline: bool, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    let profile = super::read_profile(profile_path)?;
    let catalog = Arc::new(config.load_catalog(root).context("failed to load sprint catalog")?);
    let selector = roadmap_selector(catalog, super::advisor(&config, offline));

    let selection = selector.select(&profile);
    if json {
        print_json(&selection_json(&selection))
    } else {
        print_selection(&selection);
        Ok(())
    }
}

/// JSON shape shared with the HTTP API.
pub(crate) fn selection_json(selection: &RoadmapSelection) -> serde_json::Value {
    serde_json::json!({
        "selectedRoadmap": selection.selected.summary(),
        "reasoning": selection.reasoning,
        "alternativeOptions": selection
            .alternatives
            .iter()
            .map(|s| s.summary())
            .collect::<Vec<_>>(),
        "source": selection.source,
    })
}

pub(crate) fn print_selection(selection: &RoadmapSelection) {
    println!("Selected: {} ({})", selection.selected.name, selection.selected.id);
    println!("Source:   {}", selection.source);
    println!("{}", selection.reasoning);
    if !selection.alternatives.is_empty() {
        println!();
        println!("Alternatives:");
        for alt in &selection.alternatives {
            println!("  {} ({})", alt.name, alt.id);
        }
    }
}

pub fn templates(
    root: &Path,
    profile_path: &Path,
    limit: usize,
    offline: bool,
    json: bool,
) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    let profile = super::read_profile(profile_path)?;
    let catalog = Arc::new(
        config
            .load_outreach_catalog(root)
            .context("failed to load outreach catalog")?,
    );
    let selector = template_selector(catalog, super::advisor(&config, offline));

    let selection = selector.select(&TemplateQuery { profile, limit });
    if json {
        return print_json(&selection);
    }
    let rows = selection
        .templates
        .iter()
        .map(|t| vec![t.id.clone(), t.channel.to_string(), t.name.clone()])
        .collect();
    print_table(&["ID", "CHANNEL", "NAME"], rows);
    println!();
    println!("[{}] {}", selection.source, selection.reasoning);
    Ok(())
}
