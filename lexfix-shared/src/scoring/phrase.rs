// SPDX-License-Identifier: GPL-3.0-only
//! Word-level evaluation of a spoken sentence against the expected sentence.

use serde::{Deserialize, Serialize};

use super::distance::{EditOp, align, match_ratio};
use super::normalize::normalize_phrase;
use super::policy::ScoringPolicy;

/// A substituted word still counts when its [`match_ratio`] reaches this value.
pub const WORD_MATCH_SIMILARITY: f64 = 0.6;

const ACCURACY_WEIGHT: f64 = 0.7;
const FLUENCY_WEIGHT: f64 = 0.3;

/// How one expected word was said.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordError {
    pub word: String,
    pub expected: String,
    /// Empty when the word was skipped
    pub spoken: String,
    pub position: usize,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseEvaluation {
    pub overall_score: f64,
    pub accuracy_score: f64,
    pub fluency_score: f64,
    /// One entry per expected word, in order
    pub word_errors: Vec<WordError>,
    pub feedback: String,
    pub spoken_text: String,
    pub expected_text: String,
    pub passed: bool,
}

/// Evaluate `spoken` against `expected` with the default [`ScoringPolicy`].
#[must_use]
pub fn evaluate_phrase(spoken: &str, expected: &str) -> PhraseEvaluation {
    evaluate_phrase_with(&ScoringPolicy::default(), spoken, expected)
}

/// Align the spoken words with the expected words and grade the result.
///
/// Accuracy credits exact words fully and close substitutions by their
/// similarity. Extra spoken words are not penalized beyond their effect on
/// fluency.
#[must_use]
pub fn evaluate_phrase_with(
    policy: &ScoringPolicy,
    spoken: &str,
    expected: &str,
) -> PhraseEvaluation {
    let spoken_clean = normalize_phrase(spoken);
    let expected_clean = normalize_phrase(expected);
    let spoken_words: Vec<&str> = spoken_clean.split_whitespace().collect();
    let expected_words: Vec<&str> = expected_clean.split_whitespace().collect();

    let mut word_errors = Vec::with_capacity(expected_words.len());
    let mut correct = 0.0;

    for op in align(&expected_words, &spoken_words) {
        match op {
            EditOp::Equal { expected, spoken } => {
                correct += 1.0;
                word_errors.push(word_error(
                    expected,
                    expected_words[expected],
                    spoken_words[spoken],
                    true,
                ));
            }
            EditOp::Replace { expected, spoken } => {
                let similarity = match_ratio(expected_words[expected], spoken_words[spoken]);
                let is_close = similarity >= WORD_MATCH_SIMILARITY;
                if is_close {
                    correct += similarity;
                }
                word_errors.push(word_error(
                    expected,
                    expected_words[expected],
                    spoken_words[spoken],
                    is_close,
                ));
            }
            EditOp::Delete { expected } => {
                word_errors.push(word_error(expected, expected_words[expected], "", false));
            }
            EditOp::Insert { .. } => {}
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let accuracy = correct / expected_words.len().max(1) as f64 * 100.0;
    let fluency = fluency_score(spoken_words.len(), expected_words.len());
    let overall = accuracy * ACCURACY_WEIGHT + fluency * FLUENCY_WEIGHT;

    let overall_score = round_score(overall);
    PhraseEvaluation {
        overall_score,
        accuracy_score: round_score(accuracy),
        fluency_score: round_score(fluency),
        word_errors,
        feedback: phrase_feedback(overall).to_string(),
        spoken_text: spoken.to_string(),
        expected_text: expected.to_string(),
        passed: overall_score >= f64::from(policy.pass_threshold),
    }
}

fn word_error(position: usize, expected: &str, spoken: &str, is_correct: bool) -> WordError {
    WordError {
        word: expected.to_string(),
        expected: expected.to_string(),
        spoken: spoken.to_string(),
        position,
        is_correct,
    }
}

/// Fluency from how close the spoken word count is to the expected count.
#[allow(clippy::cast_precision_loss)]
fn fluency_score(spoken_count: usize, expected_count: usize) -> f64 {
    if expected_count == 0 {
        return 100.0;
    }
    let ratio = spoken_count as f64 / expected_count as f64;
    if (0.8..=1.2).contains(&ratio) {
        100.0
    } else if (0.5..=1.5).contains(&ratio) {
        70.0
    } else {
        40.0
    }
}

/// Encouraging, non-shaming message for an overall score.
#[must_use]
pub fn phrase_feedback(score: f64) -> &'static str {
    if score >= 90.0 {
        "Excellent pronunciation! You sound very natural."
    } else if score >= 75.0 {
        "Great job! Just a few words to polish. Keep practising!"
    } else if score >= 60.0 {
        "Good effort! Try listening to the slow version and repeating."
    } else if score >= 40.0 {
        "You're making progress! Focus on the highlighted words and try again."
    } else {
        "Keep going! Every attempt makes you better. Try saying it slowly first."
    }
}

/// Clamp into `[0, 100]` and round to one decimal place.
fn round_score(value: f64) -> f64 {
    (value.clamp(0.0, 100.0) * 10.0).round() / 10.0
}
