// SPDX-License-Identifier: GPL-3.0-only
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, EnumIter};

/// Which rung of the scoring ladder produced a score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Feedback {
    Exact,   // Normalized utterance equals the target
    Variant, // Equal once an article and a trailing "s" are ignored
    Close,   // Within the fuzzy-match similarity band
    Reject,  // Everything else, including empty input
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl Feedback {
    #[must_use]
    pub fn pretty_name(&self) -> &'static str {
        match self {
            Feedback::Exact => "Exact match",
            Feedback::Variant => "Minor variant",
            Feedback::Close => "Close match",
            Feedback::Reject => "Not a match",
        }
    }

    /// Short encouraging message shown to the learner.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Feedback::Exact => "Perfect! You said it exactly right.",
            Feedback::Variant => "Great job! That was very close to the word.",
            Feedback::Close => "Nearly there! Listen once more and try again.",
            Feedback::Reject => "Keep going! Try saying it slowly, one sound at a time.",
        }
    }

    #[must_use]
    pub fn all() -> Vec<Feedback> {
        Feedback::iter().collect()
    }
}

impl std::str::FromStr for Feedback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" => Ok(Feedback::Exact),
            "variant" => Ok(Feedback::Variant),
            "close" => Ok(Feedback::Close),
            "reject" => Ok(Feedback::Reject),
            other => Err(format!("Unknown feedback category: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_display_matches_serde() {
        for feedback in Feedback::all() {
            let json = serde_json::to_string(&feedback).unwrap();
            assert_eq!(json, format!("\"{feedback}\""));
            assert_eq!(Feedback::from_str(&feedback.to_string()), Ok(feedback));
        }
    }

    #[test]
    fn test_from_str_unknown() {
        assert!(Feedback::from_str("perfect").is_err());
        assert_eq!(Feedback::from_str("EXACT"), Ok(Feedback::Exact));
    }
}
