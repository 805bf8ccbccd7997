use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use ramplo_core::catalog::SprintCatalog;
use ramplo_core::outreach::OutreachCatalog;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum CatalogSubcommand {
    /// List the sprints in the catalog
    List,
    /// Show one sprint week by week
    Show { id: String },
    /// Check a sprint catalog (and optionally an outreach catalog) for errors
    Validate {
        /// Sprint catalog file (default: the configured catalog)
        #[arg(long)]
        file: Option<PathBuf>,
        /// Outreach template catalog file
        #[arg(long)]
        outreach: Option<PathBuf>,
    },
}

pub fn run(root: &Path, subcmd: CatalogSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        CatalogSubcommand::List => list(root, json),
        CatalogSubcommand::Show { id } => show(root, &id, json),
        CatalogSubcommand::Validate { file, outreach } => {
            validate(root, file.as_deref(), outreach.as_deref(), json)
        }
    }
}

fn load(root: &Path) -> anyhow::Result<SprintCatalog> {
    let config = super::load_config(root)?;
    config.load_catalog(root).context("failed to load sprint catalog")
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let summaries = load(root)?.summaries();
    if json {
        return print_json(&summaries);
    }
    let rows = summaries
        .iter()
        .map(|s| {
            vec![
                s.id.clone(),
                s.experience_level.to_string(),
                s.focus.to_string(),
                s.time_commitment.label().to_string(),
                s.weeks.to_string(),
                s.tasks.to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "EXPERIENCE", "FOCUS", "TIME", "WEEKS", "TASKS"], rows);
    Ok(())
}

fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let catalog = load(root)?;
    let sprint = catalog.require(id)?;
    if json {
        return print_json(&**sprint);
    }
    println!("{}  ({})", sprint.name, sprint.id);
    println!("{}", sprint.description);
    for week in &sprint.weeks {
        println!();
        println!("Week {}: {}", week.week, week.theme);
        for task in &week.tasks {
            println!(
                "  day {}  {:<40}  {:>3} min  [{}]",
                task.day, task.title, task.estimated_minutes, task.category
            );
        }
    }
    Ok(())
}

fn validate(
    root: &Path,
    file: Option<&Path>,
    outreach: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let catalog = match file {
        Some(path) => SprintCatalog::load(path)
            .with_context(|| format!("invalid sprint catalog {}", path.display()))?,
        None => load(root)?,
    };
    let templates = match outreach {
        Some(path) => Some(
            OutreachCatalog::load(path)
                .with_context(|| format!("invalid outreach catalog {}", path.display()))?,
        ),
        None => None,
    };

    let tasks: usize = catalog.list().iter().map(|s| s.tasks().count()).sum();
    if json {
        print_json(&serde_json::json!({
            "valid": true,
            "sprints": catalog.list().len(),
            "tasks": tasks,
            "templates": templates.as_ref().map(|t| t.list().len()),
        }))?;
    } else {
        println!(
            "Catalog is valid: {} sprints, {} tasks.",
            catalog.list().len(),
            tasks
        );
        if let Some(t) = &templates {
            println!("Outreach catalog is valid: {} templates.", t.list().len());
        }
    }
    Ok(())
}
