//! Roadmap (sprint) selection for a loan officer profile.

use crate::advisory::{Advisor, AdvisoryError, AdvisoryRequest};
use crate::catalog::{SprintCatalog, SprintTemplate};
use crate::profile::{or_unspecified, UserProfile};
use crate::selector::{Deterministic, FallbackSelector, SelectionSource, Strategy};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Alternatives offered next to the selected sprint.
pub const MAX_ALTERNATIVES: usize = 2;

const SYSTEM_PROMPT: &str = "You are a ramp-up coach for mortgage loan officers. \
Pick the single best 90-day program for the loan officer from the options given, \
plus up to two alternatives. Only use ids from the options list.";

#[derive(Debug, Clone)]
pub struct RoadmapSelection {
    pub selected: Arc<SprintTemplate>,
    pub alternatives: Vec<Arc<SprintTemplate>>,
    pub reasoning: String,
    pub source: SelectionSource,
}

pub type RoadmapSelector = FallbackSelector<AdvisedRoadmap, RuleBasedRoadmap>;

/// Advisory-first selector with the rule-based path as fallback.
pub fn roadmap_selector(catalog: Arc<SprintCatalog>, advisor: Arc<dyn Advisor>) -> RoadmapSelector {
    FallbackSelector::new(
        AdvisedRoadmap::new(catalog.clone(), advisor),
        RuleBasedRoadmap::new(catalog),
    )
}

// ---------------------------------------------------------------------------
// Advisory path
// ---------------------------------------------------------------------------

pub struct AdvisedRoadmap {
    catalog: Arc<SprintCatalog>,
    advisor: Arc<dyn Advisor>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoadmapReply {
    selected_roadmap_id: String,
    #[serde(default)]
    alternative_ids: Vec<String>,
    #[serde(default)]
    reasoning: String,
}

impl AdvisedRoadmap {
    pub fn new(catalog: Arc<SprintCatalog>, advisor: Arc<dyn Advisor>) -> Self {
        Self { catalog, advisor }
    }

    fn request(&self, profile: &UserProfile) -> AdvisoryRequest {
        let options = serde_json::to_string_pretty(&self.catalog.summaries()).unwrap_or_default();
        AdvisoryRequest {
            system: SYSTEM_PROMPT.to_string(),
            context: format!("{}\n\nOptions:\n{options}", profile_context(profile)),
            response_shape: r#"{"selectedRoadmapId": "<id>", "alternativeIds": ["<id>"], "reasoning": "<one or two sentences>"}"#
                .to_string(),
        }
    }
}

impl Strategy for AdvisedRoadmap {
    type Input = UserProfile;
    type Output = RoadmapSelection;

    fn name(&self) -> &'static str {
        "roadmap"
    }

    fn select(&self, profile: &UserProfile) -> Result<RoadmapSelection, AdvisoryError> {
        let value = self.advisor.advise(&self.request(profile))?;
        let reply: RoadmapReply =
            serde_json::from_value(value).map_err(|e| AdvisoryError::Shape(e.to_string()))?;
        if reply.reasoning.trim().is_empty() {
            return Err(AdvisoryError::Shape("empty reasoning".into()));
        }

        let selected = self
            .catalog
            .get(reply.selected_roadmap_id.trim())
            .cloned()
            .ok_or_else(|| AdvisoryError::UnknownChoice(reply.selected_roadmap_id.clone()))?;

        let mut seen = HashSet::from([selected.id.clone()]);
        let alternatives = reply
            .alternative_ids
            .iter()
            .filter_map(|id| self.catalog.get(id.trim()))
            .filter(|s| seen.insert(s.id.clone()))
            .take(MAX_ALTERNATIVES)
            .cloned()
            .collect();

        Ok(RoadmapSelection {
            selected,
            alternatives,
            reasoning: reply.reasoning.trim().to_string(),
            source: SelectionSource::Advisory,
        })
    }
}

/// Profile facts as handed to the advisory service.
fn profile_context(profile: &UserProfile) -> String {
    let join = |items: Vec<String>| {
        if items.is_empty() {
            "unspecified".to_string()
        } else {
            items.join(", ")
        }
    };
    let mut lines = vec![
        format!("Experience level: {}", or_unspecified(profile.experience_level)),
        format!("Primary focus: {}", or_unspecified(profile.primary_focus())),
        format!(
            "Secondary focus: {}",
            join(profile.secondary_focus().iter().map(|f| f.to_string()).collect())
        ),
        format!(
            "Daily time budget: {}",
            or_unspecified(profile.time_available.map(|t| t.label()))
        ),
        format!("Markets: {}", join(profile.markets.iter().cloned().collect())),
        format!(
            "Borrower types: {}",
            join(profile.borrower_types.iter().map(|b| b.to_string()).collect())
        ),
    ];
    if let Some(goal) = &profile.goal {
        lines.push(format!("Goal: {goal}"));
    }
    format!("Loan officer profile:\n- {}", lines.join("\n- "))
}

// ---------------------------------------------------------------------------
// Rule-based path
// ---------------------------------------------------------------------------

pub struct RuleBasedRoadmap {
    catalog: Arc<SprintCatalog>,
}

impl RuleBasedRoadmap {
    pub fn new(catalog: Arc<SprintCatalog>) -> Self {
        Self { catalog }
    }

    fn exact_match(&self, profile: &UserProfile) -> Option<&Arc<SprintTemplate>> {
        self.catalog.list().iter().find(|s| {
            Some(s.focus) == profile.primary_focus()
                && Some(s.experience_level) == profile.experience_level
                && Some(s.time_commitment) == profile.time_available
        })
    }
}

impl Deterministic for RuleBasedRoadmap {
    type Input = UserProfile;
    type Output = RoadmapSelection;

    fn select(&self, profile: &UserProfile) -> RoadmapSelection {
        let (selected, matched) = match self.exact_match(profile) {
            Some(s) => (s.clone(), true),
            None => (self.catalog.first().clone(), false),
        };

        let facts = format!(
            "experience level {}, primary focus {} and time budget {}",
            or_unspecified(profile.experience_level),
            or_unspecified(profile.primary_focus()),
            or_unspecified(profile.time_available.map(|t| format!("{} min/day", t.minutes()))),
        );
        let reasoning = if matched {
            format!("{} matches your {facts}.", selected.name)
        } else {
            format!(
                "No program matches your {facts} exactly, so {} is the recommended starting point.",
                selected.name
            )
        };

        let alternatives = self
            .catalog
            .list()
            .iter()
            .filter(|s| s.id != selected.id)
            .take(MAX_ALTERNATIVES)
            .cloned()
            .collect();

        RoadmapSelection {
            selected,
            alternatives,
            reasoning,
            source: SelectionSource::Rules,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
