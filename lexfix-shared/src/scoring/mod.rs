// SPDX-License-Identifier: GPL-3.0-only
//! Pronunciation scoring
//!
//! A single policy for grading a speech-recognition transcript against the
//! word or phrase the learner was asked to say. Strict equality is favoured
//! and near-misses are penalized hard, so children practising exact phrases
//! are not told they got it right when they did not.
//!
//! # Components
//! - `normalize.rs`: lowercase/punctuation normalization and variant forms
//! - `distance.rs`: Levenshtein distance and word alignment
//! - `policy.rs`: configurable ladder thresholds and the pass mark
//! - `phrase.rs`: word-level evaluation of whole sentences

pub mod distance;
pub mod normalize;
pub mod phrase;
pub mod policy;

use serde::{Deserialize, Serialize};

pub use crate::models::feedback::Feedback;
use crate::models::utterance::{Utterance, clamp_confidence};
pub use phrase::{PhraseEvaluation, WordError, evaluate_phrase, evaluate_phrase_with};
pub use policy::{DEFAULT_PASS_THRESHOLD, PolicyError, ScoringPolicy};

use distance::char_similarity;
use normalize::{normalize, variant_form};

/// Result of scoring one utterance against its target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PronunciationScore {
    /// Grade in `0..=100`
    pub score: u8,
    pub feedback: Feedback,
    /// Character similarity of the normalized strings, `0.0..=1.0`
    pub similarity: f64,
    /// Whether `score` reached the policy's pass threshold
    pub passed: bool,
}

impl PronunciationScore {
    fn new(score: u8, feedback: Feedback, similarity: f64, policy: &ScoringPolicy) -> Self {
        Self {
            score,
            feedback,
            similarity,
            passed: policy.passes(score),
        }
    }
}

/// Score `spoken` against `target` with the default [`ScoringPolicy`].
#[must_use]
pub fn score(spoken: &str, target: &str, confidence: f64) -> PronunciationScore {
    score_with(&ScoringPolicy::default(), spoken, target, confidence)
}

/// Score a recognized [`Utterance`] against `target`.
#[must_use]
pub fn score_utterance(
    policy: &ScoringPolicy,
    utterance: &Utterance,
    target: &str,
) -> PronunciationScore {
    score_with(policy, &utterance.text, target, utterance.confidence)
}

/// Score `spoken` against `target`, evaluating the ladder in order:
///
/// 1. identical after normalization: exact
/// 2. identical after dropping a leading article and trailing `s`: variant
/// 3. similarity at or above `close_similarity`: close
/// 4. anything else: reject
///
/// Total over all inputs: empty strings score 0 and confidence is clamped
/// into `[0, 1]` (NaN counts as 0).
#[must_use]
pub fn score_with(
    policy: &ScoringPolicy,
    spoken: &str,
    target: &str,
    confidence: f64,
) -> PronunciationScore {
    let confidence = clamp_confidence(confidence);
    let spoken = normalize(spoken);
    let target = normalize(target);

    if spoken.is_empty() || target.is_empty() {
        return PronunciationScore::new(0, Feedback::Reject, 0.0, policy);
    }

    if spoken == target {
        let score = if confidence > policy.exact_confidence_floor {
            100
        } else {
            to_score(confidence * 100.0)
        };
        return PronunciationScore::new(score, Feedback::Exact, 1.0, policy);
    }

    let similarity = char_similarity(&spoken, &target);

    let spoken_variant = variant_form(&spoken);
    if !spoken_variant.is_empty() && spoken_variant == variant_form(&target) {
        return PronunciationScore::new(policy.variant_score, Feedback::Variant, similarity, policy);
    }

    let weighted = to_score(similarity * confidence * policy.close_weight);
    if similarity >= policy.close_similarity {
        return PronunciationScore::new(weighted, Feedback::Close, similarity, policy);
    }

    // Never above what the close band would give at this similarity, so a
    // worse utterance cannot outscore a better one at low confidence.
    let penalized = to_score(similarity * 100.0 - f64::from(policy.reject_penalty));
    PronunciationScore::new(penalized.min(weighted), Feedback::Reject, similarity, policy)
}

/// Round half away from zero and clamp into `0..=100`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_score(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}
