//! Outreach templates: the marketing message library and the selector that
//! picks templates for a loan officer.

use crate::advisory::{Advisor, AdvisoryError, AdvisoryRequest};
use crate::error::{RampError, Result};
use crate::profile::{or_unspecified, UserProfile};
use crate::selector::{Deterministic, FallbackSelector, SelectionSource, Strategy};
use crate::types::{BorrowerType, Channel, FocusArea, Tone};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, OnceLock};

pub const OUTREACH_VERSION: u32 = 1;

/// Templates returned when the caller does not ask for a specific count.
pub const DEFAULT_LIMIT: usize = 3;

const BUILTIN_TEMPLATES: &str = include_str!("../catalog/outreach.yaml");

// ---------------------------------------------------------------------------
// OutreachTemplate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutreachTemplate {
    pub id: String,
    pub name: String,
    pub channel: Channel,
    /// Empty means the template suits any focus.
    #[serde(default, alias = "focus_areas")]
    pub focus_areas: Vec<FocusArea>,
    /// Empty means the template suits any borrower.
    #[serde(default, alias = "borrower_types")]
    pub borrower_types: Vec<BorrowerType>,
    pub tone: Tone,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub body: String,
}

/// Values substituted into `{{placeholder}}` slots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Personalization {
    pub name: Option<String>,
    pub company: Option<String>,
    pub market: Option<String>,
    pub nmls: Option<String>,
}

impl Personalization {
    fn lookup(&self, key: &str) -> Option<&str> {
        let value = match key {
            "name" => self.name.as_deref(),
            "company" => self.company.as_deref(),
            "market" => self.market.as_deref(),
            "nmls" => self.nmls.as_deref(),
            _ => None,
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedTemplate {
    pub id: String,
    pub channel: Channel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub body: String,
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([a-z_]+)\s*\}\}").expect("valid regex"))
}

fn fill(text: &str, values: &Personalization) -> String {
    placeholder_re()
        .replace_all(text, |caps: &Captures| {
            values
                .lookup(&caps[1])
                .map(str::to_string)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

impl OutreachTemplate {
    /// Substitute known placeholders; unknown or unset ones are left as written.
    pub fn render(&self, values: &Personalization) -> RenderedTemplate {
        RenderedTemplate {
            id: self.id.clone(),
            channel: self.channel,
            subject: self.subject.as_deref().map(|s| fill(s, values)),
            body: fill(&self.body, values),
        }
    }

    fn matches_focus(&self, profile: &UserProfile) -> bool {
        profile.focus.is_empty()
            || self.focus_areas.is_empty()
            || self.focus_areas.iter().any(|f| profile.focus.contains(f))
    }

    fn matches_borrowers(&self, profile: &UserProfile) -> bool {
        profile.borrower_types.is_empty()
            || self.borrower_types.is_empty()
            || self.borrower_types.iter().any(|b| profile.borrower_types.contains(b))
    }

    fn matches_tone(&self, profile: &UserProfile) -> bool {
        profile.tone.map_or(true, |t| t == self.tone)
    }

    /// How many of focus, borrower type and tone this template satisfies.
    pub fn match_score(&self, profile: &UserProfile) -> u8 {
        [
            self.matches_focus(profile),
            self.matches_borrowers(profile),
            self.matches_tone(profile),
        ]
        .into_iter()
        .filter(|m| *m)
        .count() as u8
    }
}

// ---------------------------------------------------------------------------
// OutreachCatalog
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct OutreachFile {
    version: u32,
    templates: Vec<OutreachTemplate>,
}

#[derive(Debug, Clone)]
pub struct OutreachCatalog {
    templates: Vec<OutreachTemplate>,
}

impl OutreachCatalog {
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_TEMPLATES)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_yaml(&data)
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        let file: OutreachFile = serde_yaml::from_str(data)?;
        if file.version != OUTREACH_VERSION {
            return Err(RampError::InvalidCatalog(format!(
                "unsupported outreach catalog version {} (expected {OUTREACH_VERSION})",
                file.version
            )));
        }
        Self::from_templates(file.templates)
    }

    pub fn from_templates(templates: Vec<OutreachTemplate>) -> Result<Self> {
        let mut seen = HashSet::new();
        for t in &templates {
            if t.id.trim().is_empty() {
                return Err(RampError::InvalidCatalog("template with empty id".into()));
            }
            if !seen.insert(t.id.as_str()) {
                return Err(RampError::InvalidCatalog(format!(
                    "duplicate template id '{}'",
                    t.id
                )));
            }
            if t.body.trim().is_empty() {
                return Err(RampError::InvalidCatalog(format!(
                    "template '{}' has an empty body",
                    t.id
                )));
            }
            if t.channel == Channel::Email && t.subject.is_none() {
                return Err(RampError::InvalidCatalog(format!(
                    "email template '{}' has no subject",
                    t.id
                )));
            }
        }
        Ok(Self { templates })
    }

    pub fn list(&self) -> &[OutreachTemplate] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&OutreachTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn require(&self, id: &str) -> Result<&OutreachTemplate> {
        self.get(id)
            .ok_or_else(|| RampError::TemplateNotFound(id.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TemplateQuery {
    pub profile: UserProfile,
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSelection {
    pub templates: Vec<OutreachTemplate>,
    pub reasoning: String,
    pub source: SelectionSource,
}

pub type TemplateSelector = FallbackSelector<AdvisedTemplates, RuleBasedTemplates>;

pub fn template_selector(catalog: Arc<OutreachCatalog>, advisor: Arc<dyn Advisor>) -> TemplateSelector {
    FallbackSelector::new(
        AdvisedTemplates::new(catalog.clone(), advisor),
        RuleBasedTemplates::new(catalog),
    )
}

pub struct AdvisedTemplates {
    catalog: Arc<OutreachCatalog>,
    advisor: Arc<dyn Advisor>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplatesReply {
    template_ids: Vec<String>,
    #[serde(default)]
    reasoning: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateOption<'a> {
    id: &'a str,
    name: &'a str,
    channel: Channel,
    focus_areas: &'a [FocusArea],
    borrower_types: &'a [BorrowerType],
    tone: Tone,
}

impl AdvisedTemplates {
    pub fn new(catalog: Arc<OutreachCatalog>, advisor: Arc<dyn Advisor>) -> Self {
        Self { catalog, advisor }
    }

    fn request(&self, query: &TemplateQuery) -> AdvisoryRequest {
        let options: Vec<TemplateOption<'_>> = self
            .catalog
            .list()
            .iter()
            .map(|t| TemplateOption {
                id: &t.id,
                name: &t.name,
                channel: t.channel,
                focus_areas: &t.focus_areas,
                borrower_types: &t.borrower_types,
                tone: t.tone,
            })
            .collect();
        let p = &query.profile;
        let context = format!(
            "Loan officer focus: {}\nBorrower types: {}\nPreferred tone: {}\n\
             Pick up to {} templates.\n\nTemplates:\n{}",
            list_or_unspecified(p.focus.iter()),
            list_or_unspecified(p.borrower_types.iter()),
            or_unspecified(p.tone),
            query.limit,
            serde_json::to_string_pretty(&options).unwrap_or_default(),
        );
        AdvisoryRequest {
            system: "You help mortgage loan officers choose outreach templates. \
                     Only use ids from the template list."
                .to_string(),
            context,
            response_shape: r#"{"templateIds": ["<id>"], "reasoning": "<one sentence>"}"#.to_string(),
        }
    }
}

fn list_or_unspecified<T: std::fmt::Display>(items: impl Iterator<Item = T>) -> String {
    let joined: Vec<String> = items.map(|i| i.to_string()).collect();
    if joined.is_empty() {
        "unspecified".to_string()
    } else {
        joined.join(", ")
    }
}

impl Strategy for AdvisedTemplates {
    type Input = TemplateQuery;
    type Output = TemplateSelection;

    fn name(&self) -> &'static str {
        "templates"
    }

    fn should_consult(&self, query: &TemplateQuery) -> bool {
        query.limit > 0
    }

    fn select(&self, query: &TemplateQuery) -> std::result::Result<TemplateSelection, AdvisoryError> {
        let value = self.advisor.advise(&self.request(query))?;
        let reply: TemplatesReply =
            serde_json::from_value(value).map_err(|e| AdvisoryError::Shape(e.to_string()))?;

        let mut seen = HashSet::new();
        let templates: Vec<OutreachTemplate> = reply
            .template_ids
            .iter()
            .filter_map(|id| self.catalog.get(id.trim()))
            .filter(|t| seen.insert(t.id.clone()))
            .take(query.limit)
            .cloned()
            .collect();
        if templates.is_empty() {
            return Err(AdvisoryError::Shape("no known template ids".into()));
        }

        let reasoning = match reply.reasoning.trim() {
            "" => "Selected by the advisory service.".to_string(),
            r => r.to_string(),
        };
        Ok(TemplateSelection {
            templates,
            reasoning,
            source: SelectionSource::Advisory,
        })
    }
}

pub struct RuleBasedTemplates {
    catalog: Arc<OutreachCatalog>,
}

impl RuleBasedTemplates {
    pub fn new(catalog: Arc<OutreachCatalog>) -> Self {
        Self { catalog }
    }
}

impl Deterministic for RuleBasedTemplates {
    type Input = TemplateQuery;
    type Output = TemplateSelection;

    fn select(&self, query: &TemplateQuery) -> TemplateSelection {
        let profile = &query.profile;
        let all = self.catalog.list();

        let strict: Vec<&OutreachTemplate> =
            all.iter().filter(|t| t.match_score(profile) == 3).collect();

        let (picked, reasoning) = if !strict.is_empty() {
            (
                strict,
                format!(
                    "Templates matching focus {}, borrower types {} and a {} tone.",
                    list_or_unspecified(profile.focus.iter()),
                    list_or_unspecified(profile.borrower_types.iter()),
                    or_unspecified(profile.tone),
                ),
            )
        } else {
            let mut ranked: Vec<(u8, &OutreachTemplate)> = all
                .iter()
                .map(|t| (t.match_score(profile), t))
                .filter(|(score, _)| *score > 0)
                .collect();
            // stable: ties keep catalog order
            ranked.sort_by(|a, b| b.0.cmp(&a.0));
            if ranked.is_empty() {
                (
                    all.iter().collect(),
                    "No template fits your preferences, so these are the general-purpose defaults."
                        .to_string(),
                )
            } else {
                (
                    ranked.into_iter().map(|(_, t)| t).collect(),
                    "No template matches every preference; these match the most of focus, borrower type and tone."
                        .to_string(),
                )
            }
        };

        TemplateSelection {
            templates: picked.into_iter().take(query.limit).cloned().collect(),
            reasoning,
            source: SelectionSource::Rules,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::DisabledAdvisor;
    use crate::profile::BoundedList;
    use serde_json::{json, Value};

    fn builtin() -> Arc<OutreachCatalog> {
        Arc::new(OutreachCatalog::builtin().unwrap())
    }

    fn query(focus: &[FocusArea], borrowers: &[BorrowerType], tone: Option<Tone>, limit: usize) -> TemplateQuery {
        TemplateQuery {
            profile: UserProfile {
                focus: BoundedList::new(focus.to_vec()).unwrap(),
                borrower_types: BoundedList::new(borrowers.to_vec()).unwrap(),
                tone,
                ..Default::default()
            },
            limit,
        }
    }

    fn ids(selection: &TemplateSelection) -> Vec<&str> {
        selection.templates.iter().map(|t| t.id.as_str()).collect()
    }

    struct Fixed(Value);

    impl Advisor for Fixed {
        fn advise(&self, _request: &AdvisoryRequest) -> std::result::Result<Value, AdvisoryError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn builtin_catalog_loads() {
        let catalog = builtin();
        assert!(catalog.list().len() >= 10);
        assert!(catalog.require("rate-drop-refi-email").is_ok());
        assert!(matches!(
            catalog.require("nope"),
            Err(RampError::TemplateNotFound(_))
        ));
    }

    #[test]
    fn strict_intersection_in_catalog_order() {
        let rules = RuleBasedTemplates::new(builtin());
        let q = query(
            &[FocusArea::Purchase],
            &[BorrowerType::FirstTimeBuyers],
            Some(Tone::Friendly),
            5,
        );
        let selection = rules.select(&q);
        assert_eq!(ids(&selection), vec!["sphere-announcement-email"]);
        assert_eq!(selection.source, SelectionSource::Rules);
    }

    #[test]
    fn partial_matches_ranked_by_conditions_met() {
        let rules = RuleBasedTemplates::new(builtin());
        let q = query(
            &[FocusArea::Investor],
            &[BorrowerType::Investors],
            Some(Tone::Friendly),
            3,
        );
        let selection = rules.select(&q);
        assert_eq!(
            ids(&selection),
            vec![
                "dscr-investor-email",
                "investor-meetup-followup-sms",
                "sphere-announcement-email"
            ]
        );
    }

    #[test]
    fn zero_match_catalog_falls_back_to_catalog_order() {
        let catalog = OutreachCatalog::from_yaml(
            r#"
version: 1
templates:
  - { id: a, name: A, channel: sms, focus_areas: [jumbo], borrower_types: [retirees], tone: casual, body: "hi" }
  - { id: b, name: B, channel: sms, focus_areas: [va], borrower_types: [veterans], tone: casual, body: "yo" }
"#,
        )
        .unwrap();
        let rules = RuleBasedTemplates::new(Arc::new(catalog));
        let q = query(
            &[FocusArea::Refi],
            &[BorrowerType::Investors],
            Some(Tone::Professional),
            5,
        );
        assert_eq!(ids(&rules.select(&q)), vec!["a", "b"]);
    }

    #[test]
    fn limit_truncates_and_zero_is_empty() {
        let selector = template_selector(builtin(), Arc::new(DisabledAdvisor));
        let q = query(&[], &[], None, 2);
        assert_eq!(selector.select(&q).templates.len(), 2);

        let advisor = Arc::new(Fixed(json!({"templateIds": ["va-benefits-email"]})));
        let selector = template_selector(builtin(), advisor);
        assert!(selector.select(&query(&[], &[], None, 0)).templates.is_empty());
    }

    #[test]
    fn advisory_ids_filtered_and_deduplicated() {
        let advisor = Arc::new(Fixed(json!({
            "templateIds": ["va-benefits-email", "ghost", "va-benefits-email", "dscr-investor-email"],
            "reasoning": "Veteran-heavy market."
        })));
        let selection = template_selector(builtin(), advisor).select(&query(&[], &[], None, 3));
        assert_eq!(selection.source, SelectionSource::Advisory);
        assert_eq!(ids(&selection), vec!["va-benefits-email", "dscr-investor-email"]);
    }

    #[test]
    fn advisory_with_only_unknown_ids_falls_back() {
        let advisor = Arc::new(Fixed(json!({"templateIds": ["ghost"], "reasoning": "?"})));
        let selection = template_selector(builtin(), advisor).select(&query(
            &[FocusArea::Va],
            &[BorrowerType::Veterans],
            Some(Tone::Friendly),
            3,
        ));
        assert_eq!(selection.source, SelectionSource::Rules);
        assert_eq!(ids(&selection), vec!["va-benefits-email"]);
    }

    #[test]
    fn render_fills_known_placeholders() {
        let catalog = builtin();
        let t = catalog.require("rate-drop-refi-email").unwrap();
        let rendered = t.render(&Personalization {
            name: Some("Dana Reyes".into()),
            company: Some("Summit Home Loans".into()),
            market: None,
            nmls: Some("123456".into()),
        });
        assert!(rendered.body.contains("Dana Reyes"));
        assert!(rendered.body.contains("Summit Home Loans | NMLS #123456"));
        assert!(!rendered.body.contains("{{"));
        assert_eq!(rendered.subject.as_deref(), t.subject.as_deref());
    }

    #[test]
    fn render_leaves_unset_placeholders() {
        let t = OutreachTemplate {
            id: "t".into(),
            name: "T".into(),
            channel: Channel::Sms,
            focus_areas: vec![],
            borrower_types: vec![],
            tone: Tone::Casual,
            subject: None,
            body: "Hi from {{ name }} in {{market}} ({{unknown}})".into(),
        };
        let rendered = t.render(&Personalization {
            name: Some("Sam".into()),
            market: Some("  ".into()),
            ..Default::default()
        });
        assert_eq!(rendered.body, "Hi from Sam in {{market}} ({{unknown}})");
    }

    #[test]
    fn email_without_subject_rejected() {
        let err = OutreachCatalog::from_yaml(
            "version: 1\ntemplates:\n  - { id: e, name: E, channel: email, tone: friendly, body: hi }\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("has no subject"));
    }
}
