use crate::output::{print_json, print_table, yes_no};
use chrono::Utc;
use clap::Subcommand;
use ramplo_core::progress::ProgressTracker;
use std::path::Path;
use std::sync::Arc;

#[derive(Subcommand)]
pub enum TaskSubcommand {
    /// List a user's tasks
    List {
        #[arg(long)]
        user: String,
        #[arg(long)]
        week: Option<u32>,
        #[arg(long)]
        day: Option<u32>,
    },
    /// Mark a task complete
    Complete {
        #[arg(long)]
        user: String,
        task_id: String,
    },
}

pub fn run(root: &Path, subcmd: TaskSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        TaskSubcommand::List { user, week, day } => list(root, &user, week, day, json),
        TaskSubcommand::Complete { user, task_id } => complete(root, &user, &task_id, json),
    }
}

fn list(root: &Path, user: &str, week: Option<u32>, day: Option<u32>, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    let store = super::open_store(root, &config)?;
    let tasks = ramplo_core::store::Store::tasks(&store, user, week, day)?;

    if json {
        return print_json(&tasks);
    }
    if tasks.is_empty() {
        println!("No tasks.");
        return Ok(());
    }
    let rows = tasks
        .iter()
        .map(|t| {
            vec![
                t.id.clone(),
                format!("{}/{}", t.week, t.day),
                yes_no(t.completed),
                format!("{} min", t.estimated_minutes),
                t.title.clone(),
            ]
        })
        .collect();
    print_table(&["ID", "WEEK/DAY", "DONE", "TIME", "TITLE"], rows);
    Ok(())
}

fn complete(root: &Path, user: &str, task_id: &str, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    let store = Arc::new(super::open_store(root, &config)?);
    let catalog = Arc::new(config.load_catalog(root)?);
    let tracker = ProgressTracker::new(store, catalog);

    let task = tracker.complete_task(user, task_id, Utc::now())?;
    if json {
        print_json(&task)?;
    } else {
        println!("Completed [{}] {}", task.id, task.title);
    }
    Ok(())
}
