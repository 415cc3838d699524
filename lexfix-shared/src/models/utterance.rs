// SPDX-License-Identifier: GPL-3.0-only
use serde::{Deserialize, Serialize};

/// One speech-recognition result: the transcript and the recognizer's confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    pub confidence: f64,
}

impl Utterance {
    /// Create an utterance, forcing the confidence into `[0.0, 1.0]`.
    #[must_use]
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence: clamp_confidence(confidence),
        }
    }
}

/// Clamp a recognizer confidence into `[0.0, 1.0]`; NaN becomes 0.
#[must_use]
pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}
