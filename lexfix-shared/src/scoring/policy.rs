// SPDX-License-Identifier: GPL-3.0-only
use serde::{Deserialize, Serialize};

/// Default pass mark shared by every caller of the scorer.
pub const DEFAULT_PASS_THRESHOLD: u8 = 70;

/// Thresholds of the scoring ladder.
///
/// Every value has a default matching the learner-facing behaviour; the
/// daemon reads overrides from its TOML config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    /// Exact matches score 100 only above this confidence
    pub exact_confidence_floor: f64,
    /// Score awarded for an article/plural variant
    pub variant_score: u8,
    /// Lowest similarity (inclusive) still treated as a close match
    pub close_similarity: f64,
    /// Multiplier applied to `similarity * confidence` in the close band
    pub close_weight: f64,
    /// Flat deduction applied to rejected utterances
    pub reject_penalty: u8,
    /// Minimum score counted as a pass
    pub pass_threshold: u8,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            exact_confidence_floor: 0.85,
            variant_score: 90,
            close_similarity: 0.85,
            close_weight: 90.0,
            reject_penalty: 50,
            pass_threshold: DEFAULT_PASS_THRESHOLD,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PolicyError {
    #[error("{field} must be within [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f64 },

    #[error("{field} must be within 0-100, got {value}")]
    OutOfScoreRange { field: &'static str, value: f64 },
}

impl ScoringPolicy {
    /// Check that every threshold is inside its meaningful range.
    ///
    /// # Errors
    ///
    /// Returns a [`PolicyError`] naming the first field out of range.
    pub fn validate(&self) -> Result<(), PolicyError> {
        for (field, value) in [
            ("exact_confidence_floor", self.exact_confidence_floor),
            ("close_similarity", self.close_similarity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PolicyError::OutOfUnitRange { field, value });
            }
        }

        for (field, value) in [
            ("variant_score", f64::from(self.variant_score)),
            ("close_weight", self.close_weight),
            ("reject_penalty", f64::from(self.reject_penalty)),
            ("pass_threshold", f64::from(self.pass_threshold)),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(PolicyError::OutOfScoreRange { field, value });
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn with_pass_threshold(mut self, pass_threshold: u8) -> Self {
        self.pass_threshold = pass_threshold;
        self
    }

    #[must_use]
    pub fn passes(&self, score: u8) -> bool {
        score >= self.pass_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        assert!(ScoringPolicy::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let policy = ScoringPolicy {
            close_similarity: 1.2,
            ..ScoringPolicy::default()
        };
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::OutOfUnitRange {
                field: "close_similarity",
                ..
            })
        ));

        let policy = ScoringPolicy::default().with_pass_threshold(101);
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::OutOfScoreRange {
                field: "pass_threshold",
                ..
            })
        ));

        let policy = ScoringPolicy {
            close_weight: f64::NAN,
            ..ScoringPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_passes_is_inclusive() {
        let policy = ScoringPolicy::default().with_pass_threshold(80);
        assert!(policy.passes(80));
        assert!(!policy.passes(79));
    }

    #[test]
    fn test_partial_policy_fills_defaults() {
        let policy: ScoringPolicy = serde_json::from_str(r#"{"pass_threshold": 85}"#).unwrap();
        assert_eq!(policy.pass_threshold, 85);
        assert_eq!(policy.variant_score, 90);
    }
}
