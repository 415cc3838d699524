// SPDX-License-Identifier: GPL-3.0-only
pub mod daemon;
pub mod models;
pub mod scoring;
pub mod validation;

// Re-export commonly used types for convenience
pub use models::*;
pub use scoring::{
    Feedback, PhraseEvaluation, PronunciationScore, ScoringPolicy, WordError, evaluate_phrase,
    score,
};
