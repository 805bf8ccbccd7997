use crate::error::{RampError, Result};
use crate::types::{BorrowerType, ExperienceLevel, FocusArea, OutreachComfort, TimeCommitment, Tone};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// BoundedList
// ---------------------------------------------------------------------------

/// An ordered list holding at most `N` items.
///
/// The bound is enforced when the list is built and when it is deserialized,
/// so a profile read back from storage can never exceed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BoundedList<T, const N: usize>(Vec<T>);

impl<T, const N: usize> BoundedList<T, N> {
    pub const MAX: usize = N;

    pub fn new(items: Vec<T>) -> Result<Self> {
        if items.len() > N {
            return Err(RampError::Validation(format!(
                "at most {N} entries allowed, got {}",
                items.len()
            )));
        }
        Ok(Self(items))
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn first(&self) -> Option<&T> {
        self.0.first()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.0.contains(item)
    }
}

impl<T, const N: usize> Default for BoundedList<T, N> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a BoundedList<T, N> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'de, T: Deserialize<'de>, const N: usize> Deserialize<'de> for BoundedList<T, N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        Self::new(items).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// OnboardingAnswers
// ---------------------------------------------------------------------------

/// Raw questionnaire answers as submitted by the client.
///
/// Every field is optional and stringly typed; [`UserProfile::from_answers`]
/// is the single place they are checked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnboardingAnswers {
    pub experience_level: Option<String>,
    #[serde(alias = "focus")]
    pub focus_areas: Vec<String>,
    pub borrower_types: Vec<String>,
    #[serde(alias = "marketLocations")]
    pub markets: Vec<String>,
    #[serde(alias = "timeAvailableWeekday")]
    pub time_available: Option<String>,
    pub outreach_comfort: Option<String>,
    #[serde(alias = "preferredTone")]
    pub tone: Option<String>,
    #[serde(alias = "goals")]
    pub goal: Option<String>,
}

// ---------------------------------------------------------------------------
// UserProfile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub experience_level: Option<ExperienceLevel>,
    #[serde(default)]
    pub focus: BoundedList<FocusArea, 3>,
    #[serde(default)]
    pub borrower_types: BoundedList<BorrowerType, 4>,
    #[serde(default)]
    pub markets: BoundedList<String, 4>,
    #[serde(default)]
    pub time_available: Option<TimeCommitment>,
    #[serde(default)]
    pub outreach_comfort: Option<OutreachComfort>,
    #[serde(default)]
    pub tone: Option<Tone>,
    #[serde(default)]
    pub goal: Option<String>,
}

impl UserProfile {
    /// Validate loose answers into a profile.
    ///
    /// Blank strings count as "not answered", and so do values no enum
    /// recognizes (logged and dropped). Duplicate list entries are dropped,
    /// keeping the first occurrence. Only a list longer than its bound is
    /// rejected.
    pub fn from_answers(answers: &OnboardingAnswers) -> Result<Self> {
        Ok(Self {
            experience_level: parse_optional("experience level", answers.experience_level.as_deref()),
            focus: parse_list("focus", &answers.focus_areas)?,
            borrower_types: parse_list("borrower types", &answers.borrower_types)?,
            markets: clean_markets(&answers.markets)?,
            time_available: parse_optional("time available", answers.time_available.as_deref()),
            outreach_comfort: parse_optional("outreach comfort", answers.outreach_comfort.as_deref()),
            tone: parse_optional("tone", answers.tone.as_deref()),
            goal: answers
                .goal
                .as_deref()
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(str::to_string),
        })
    }

    pub fn primary_focus(&self) -> Option<FocusArea> {
        self.focus.first().copied()
    }

    pub fn secondary_focus(&self) -> &[FocusArea] {
        self.focus.as_slice().get(1..).unwrap_or(&[])
    }
}

fn parse_optional<T>(field: &str, raw: Option<&str>) -> Option<T>
where
    T: FromStr<Err = RampError>,
{
    match raw.map(str::trim) {
        None | Some("") => None,
        Some(s) => parse_known(field, s),
    }
}

fn parse_known<T>(field: &str, value: &str) -> Option<T>
where
    T: FromStr<Err = RampError>,
{
    match value.parse() {
        Ok(v) => Some(v),
        Err(err) => {
            tracing::warn!(field, value, error = %err, "ignoring unrecognized answer");
            None
        }
    }
}

fn parse_list<T, const N: usize>(field: &str, raw: &[String]) -> Result<BoundedList<T, N>>
where
    T: FromStr<Err = RampError> + PartialEq,
{
    let mut items: Vec<T> = Vec::new();
    for entry in raw.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let Some(item) = parse_known::<T>(field, entry) else {
            continue;
        };
        if !items.contains(&item) {
            items.push(item);
        }
    }
    BoundedList::new(items).map_err(|e| prefix(field, e))
}

fn clean_markets(raw: &[String]) -> Result<BoundedList<String, 4>> {
    let mut markets: Vec<String> = Vec::new();
    for m in raw.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if !markets.iter().any(|x| x.eq_ignore_ascii_case(m)) {
            markets.push(m.to_string());
        }
    }
    BoundedList::new(markets).map_err(|e| prefix("markets", e))
}

fn prefix(field: &str, err: RampError) -> RampError {
    match err {
        RampError::Validation(msg) => RampError::Validation(format!("{field}: {msg}")),
        other => other,
    }
}

/// Renders an optional answer, or `unspecified` when it was skipped.
pub fn or_unspecified<T: fmt::Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "unspecified".to_string())
}

impl fmt::Display for UserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "experience={} focus={} time={}",
            or_unspecified(self.experience_level),
            or_unspecified(self.primary_focus()),
            or_unspecified(self.time_available),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
