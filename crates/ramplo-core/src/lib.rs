pub mod advisory;
pub mod calendar;
pub mod catalog;
pub mod config;
pub mod error;
pub mod io;
pub mod migrations;
pub mod onboarding;
pub mod outreach;
pub mod paths;
pub mod profile;
pub mod progress;
pub mod roadmap;
pub mod selector;
pub mod store;
pub mod task;
pub mod types;

pub use error::{RampError, Result};
