use crate::output::print_json;
use chrono::NaiveDate;
use clap::Subcommand;
use ramplo_core::progress::{ConnectionCounts, ProgressTracker};
use std::path::Path;
use std::sync::Arc;

#[derive(Subcommand)]
pub enum ConnectionsSubcommand {
    /// Record the day's calls, texts and emails (replaces earlier counts)
    Log {
        #[arg(long)]
        user: String,
        /// Day being logged (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "0")]
        calls: u32,
        #[arg(long, default_value = "0")]
        texts: u32,
        #[arg(long, default_value = "0")]
        emails: u32,
    },
}

pub fn run(root: &Path, subcmd: ConnectionsSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConnectionsSubcommand::Log {
            user,
            date,
            calls,
            texts,
            emails,
        } => {
            let config = super::load_config(root)?;
            let store = Arc::new(super::open_store(root, &config)?);
            let catalog = Arc::new(config.load_catalog(root)?);
            let tracker = ProgressTracker::new(store, catalog);

            let counts = ConnectionCounts {
                phone_calls: calls,
                text_messages: texts,
                emails,
            };
            let date = date.unwrap_or_else(super::today);
            let logged = tracker.record_daily_connections(&user, date, counts)?;
            if json {
                print_json(&logged)?;
            } else {
                println!(
                    "Logged {} connections for {} on {}",
                    logged.counts.total(),
                    user,
                    logged.date
                );
            }
            Ok(())
        }
    }
}
