use thiserror::Error;

#[derive(Debug, Error)]
pub enum RampError {
    #[error("sprint not found: {0}")]
    SprintNotFound(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("outreach template not found: {0}")]
    TemplateNotFound(String),

    #[error("no progress recorded for user: {0}")]
    ProgressNotFound(String),

    #[error("no profile recorded for user: {0}")]
    ProfileNotFound(String),

    #[error("task already completed: {0}")]
    AlreadyCompleted(String),

    #[error("user already onboarded: {0}")]
    AlreadyOnboarded(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("week {week} day {day} is outside the selected sprint")]
    InvalidCursor { week: u32, day: u32 },

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RampError {
    /// True for the family of "referenced id does not exist" errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RampError::SprintNotFound(_)
                | RampError::TaskNotFound(_)
                | RampError::TemplateNotFound(_)
                | RampError::ProgressNotFound(_)
                | RampError::ProfileNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RampError>;
