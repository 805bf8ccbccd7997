use crate::output::{print_json, yes_no};
use chrono::NaiveDate;
use clap::Subcommand;
use ramplo_core::progress::{ProgressReport, ProgressTracker, UserProgress};
use std::path::Path;
use std::sync::Arc;

#[derive(Subcommand)]
pub enum ProgressSubcommand {
    /// Show counters, ramp-run days and the streak
    Show {
        #[arg(long)]
        user: String,
        /// Evaluate as of this date (default: today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Move to the next program day
    Advance {
        #[arg(long)]
        user: String,
    },
    /// Jump to a specific week and day
    Cursor {
        #[arg(long)]
        user: String,
        #[arg(long)]
        week: u32,
        #[arg(long)]
        day: u32,
    },
    /// Record submitted applications and closed loans
    Outcomes {
        #[arg(long)]
        user: String,
        #[arg(long, default_value = "0")]
        applications: u32,
        #[arg(long, default_value = "0")]
        loans: u32,
    },
}

fn tracker(root: &Path) -> anyhow::Result<ProgressTracker> {
    let config = super::load_config(root)?;
    let store = Arc::new(super::open_store(root, &config)?);
    let catalog = Arc::new(config.load_catalog(root)?);
    Ok(ProgressTracker::new(store, catalog))
}

pub fn run(root: &Path, subcmd: ProgressSubcommand, json: bool) -> anyhow::Result<()> {
    let tracker = tracker(root)?;
    match subcmd {
        ProgressSubcommand::Show { user, today } => {
            let report = tracker.report(&user, today.unwrap_or_else(super::today))?;
            if json {
                print_json(&report)
            } else {
                print_report(&report);
                Ok(())
            }
        }
        ProgressSubcommand::Advance { user } => {
            let progress = tracker.advance(&user)?;
            print_progress(&progress, json)
        }
        ProgressSubcommand::Cursor { user, week, day } => {
            let progress = tracker.set_cursor(&user, week, day)?;
            print_progress(&progress, json)
        }
        ProgressSubcommand::Outcomes {
            user,
            applications,
            loans,
        } => {
            if applications == 0 && loans == 0 {
                anyhow::bail!("nothing to record: pass --applications and/or --loans");
            }
            let progress = tracker.record_outcomes(&user, applications, loans, super::today())?;
            print_progress(&progress, json)
        }
    }
}

fn print_progress(progress: &UserProgress, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(progress);
    }
    println!(
        "{}: week {} day {} of {}",
        progress.user_id, progress.current_week, progress.current_day, progress.sprint_id
    );
    println!(
        "tasks completed {}, applications {}, loans closed {}",
        progress.tasks_completed, progress.applications_submitted, progress.loans_closed
    );
    Ok(())
}

fn print_report(report: &ProgressReport) {
    let p = &report.progress;
    println!("Sprint:          {}", p.sprint_id);
    println!("Started:         {}", p.start_date);
    println!("Cursor:          week {} day {}", p.current_week, p.current_day);
    println!("Tasks completed: {}", p.tasks_completed);
    println!("Applications:    {}", p.applications_submitted);
    println!("Loans closed:    {}", p.loans_closed);
    println!("Ramp-run days:   {}", report.ramp_run_days);
    println!("Current streak:  {}", report.current_streak);
    match &report.today {
        Some(day) => {
            println!();
            println!("Today (week {} day {}):", day.week, day.day);
            println!("  tasks       {}/{}", day.tasks_completed, day.tasks_total);
            println!("  connections {}", day.connections.total());
            println!("  ramp run    {}", yes_no(day.ramp_run));
            println!("  score       {}", day.performance_score);
        }
        None => println!("No program day scheduled today."),
    }
}
