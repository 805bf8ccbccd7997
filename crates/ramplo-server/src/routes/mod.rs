pub mod catalog;
pub mod connections;
pub mod onboarding;
pub mod profile;
pub mod progress;
pub mod roadmap;
pub mod tasks;
pub mod templates;

/// The server's local calendar date, used when a request does not name one.
pub(crate) fn today() -> chrono::NaiveDate {
    ramplo_core::calendar::today()
}
