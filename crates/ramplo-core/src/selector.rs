//! Strategy seam shared by the roadmap and outreach-template selectors.
//!
//! A selection has a fallible primary path (the advisory service) and an
//! infallible deterministic path. [`FallbackSelector`] tries the first and
//! always lands on the second when it fails, so selection never errors.

use crate::advisory::AdvisoryError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    Advisory,
    Rules,
}

impl SelectionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            SelectionSource::Advisory => "advisory",
            SelectionSource::Rules => "rules",
        }
    }
}

impl fmt::Display for SelectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A selection path that may fail.
pub trait Strategy: Send + Sync {
    type Input;
    type Output;

    fn name(&self) -> &'static str;

    /// Whether this input is worth a call at all.
    fn should_consult(&self, _input: &Self::Input) -> bool {
        true
    }

    fn select(&self, input: &Self::Input) -> Result<Self::Output, AdvisoryError>;
}

/// A selection path that always produces an answer.
pub trait Deterministic: Send + Sync {
    type Input;
    type Output;

    fn select(&self, input: &Self::Input) -> Self::Output;
}

pub struct FallbackSelector<P, F> {
    primary: Option<P>,
    fallback: F,
}

impl<P, F> FallbackSelector<P, F>
where
    P: Strategy,
    F: Deterministic<Input = P::Input, Output = P::Output>,
{
    pub fn new(primary: P, fallback: F) -> Self {
        Self {
            primary: Some(primary),
            fallback,
        }
    }

    pub fn rules_only(fallback: F) -> Self {
        Self {
            primary: None,
            fallback,
        }
    }

    pub fn select(&self, input: &P::Input) -> F::Output {
        if let Some(primary) = self.primary.as_ref().filter(|p| p.should_consult(input)) {
            match primary.select(input) {
                Ok(output) => return output,
                Err(AdvisoryError::Disabled) => {
                    tracing::debug!(strategy = primary.name(), "advisory disabled, using rules");
                }
                Err(e) => {
                    tracing::warn!(strategy = primary.name(), error = %e, "advisory failed, using rules");
                }
            }
        }
        self.fallback.select(input)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
