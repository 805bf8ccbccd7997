use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Declares a closed string enum with `as_str`, `all`, `Display`, `FromStr`
/// and serde impls that all agree on the same wire spelling.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn all() -> &'static [$name] {
                &[$($name::$variant),+]
            }

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::error::RampError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok($name::$variant),)+
                    other => Err(crate::error::RampError::Validation(format!(
                        "unknown {} '{}'",
                        $what, other
                    ))),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Onboarding answers
// ---------------------------------------------------------------------------

string_enum! {
    /// How long the loan officer has been originating.
    ExperienceLevel, "experience level" {
        New => "new",
        UnderOneYear => "<1y",
        OneToThreeYears => "1-3y",
        ThreePlusYears => "3+",
    }
}

string_enum! {
    FocusArea, "focus area" {
        Purchase => "purchase",
        Refi => "refi",
        Heloc => "heloc",
        Investor => "investor",
        NonQm => "non-qm",
        Va => "va",
        FirstTimeBuyer => "first-time-buyer",
        Jumbo => "jumbo",
    }
}

string_enum! {
    /// Weekday minutes the loan officer can spend on the program.
    TimeCommitment, "time commitment" {
        Min30 => "30",
        Min60 => "60",
        Min90 => "90",
        Min120 => "120",
    }
}

impl TimeCommitment {
    pub fn minutes(self) -> u32 {
        match self {
            TimeCommitment::Min30 => 30,
            TimeCommitment::Min60 => 60,
            TimeCommitment::Min90 => 90,
            TimeCommitment::Min120 => 120,
        }
    }

    /// Range shown to users, e.g. "60-90 min/day".
    pub fn label(self) -> &'static str {
        match self {
            TimeCommitment::Min30 => "30-60 min/day",
            TimeCommitment::Min60 => "60-90 min/day",
            TimeCommitment::Min90 => "90-120 min/day",
            TimeCommitment::Min120 => "2+ hours/day",
        }
    }
}

string_enum! {
    BorrowerType, "borrower type" {
        FirstTimeBuyers => "first-time-buyers",
        MoveUp => "move-up",
        Investors => "investors",
        SelfEmployed => "self-employed",
        Veterans => "veterans",
        Retirees => "retirees",
        Refinance => "refinance",
    }
}

string_enum! {
    OutreachComfort, "outreach comfort" {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

string_enum! {
    Tone, "tone" {
        Professional => "professional",
        Friendly => "friendly",
        Educational => "educational",
        Casual => "casual",
    }
}

string_enum! {
    /// Delivery channel of an outreach template.
    Channel, "channel" {
        Email => "email",
        Sms => "sms",
        Social => "social",
        CallScript => "call-script",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experience_level_uses_short_spellings() {
        assert_eq!(ExperienceLevel::UnderOneYear.as_str(), "<1y");
        assert_eq!(
            "3+".parse::<ExperienceLevel>().unwrap(),
            ExperienceLevel::ThreePlusYears
        );
    }

    #[test]
    fn unknown_value_is_a_validation_error() {
        let err = "mortgage-ninja".parse::<FocusArea>().unwrap_err();
        assert!(err.to_string().contains("unknown focus area"));
    }

    #[test]
    fn parse_trims_whitespace() {
        assert_eq!(" non-qm ".parse::<FocusArea>().unwrap(), FocusArea::NonQm);
    }

    #[test]
    fn serde_uses_wire_spelling() {
        let json = serde_json::to_string(&TimeCommitment::Min60).unwrap();
        assert_eq!(json, "\"60\"");
        let parsed: BorrowerType = serde_json::from_str("\"self-employed\"").unwrap();
        assert_eq!(parsed, BorrowerType::SelfEmployed);
        assert!(serde_json::from_str::<Tone>("\"shouty\"").is_err());
    }

    #[test]
    fn every_variant_parses_back() {
        for &level in ExperienceLevel::all() {
            assert_eq!(level.as_str().parse::<ExperienceLevel>().unwrap(), level);
        }
        for &focus in FocusArea::all() {
            assert_eq!(focus.to_string().parse::<FocusArea>().unwrap(), focus);
        }
    }

    #[test]
    fn time_commitment_label() {
        assert_eq!(TimeCommitment::Min60.label(), "60-90 min/day");
        assert_eq!(TimeCommitment::Min90.minutes(), 90);
    }
}
