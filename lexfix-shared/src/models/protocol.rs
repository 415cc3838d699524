// SPDX-License-Identifier: GPL-3.0-only
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::scoring::{PhraseEvaluation, PronunciationScore, ScoringPolicy};
use crate::validation::{self, Validate, ValidationError};

/// Confidence assumed when a client sends a transcript without one.
pub const DEFAULT_CONFIDENCE: f64 = 1.0;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct DaemonRequest {
    pub command: String,
    #[serde(default)]
    pub client_id: Option<String>,

    // Scoring fields
    #[serde(default)]
    pub spoken: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,

    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DaemonResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    // Scoring results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<PronunciationScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<PhraseEvaluation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoring_policy: Option<ScoringPolicy>,

    // Daemon status fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests_served: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_connections: Option<u32>,

    // Connection status fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_active: Option<bool>,
}

impl DaemonResponse {
    fn with_status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            message: None,
            client_id: None,
            score: None,
            evaluation: None,
            scoring_policy: None,
            started_at: None,
            uptime_seconds: None,
            requests_served: None,
            active_connections: None,
            connection_active: None,
        }
    }

    #[must_use]
    pub fn success() -> Self {
        Self::with_status("success")
    }

    #[must_use]
    pub fn error(message: &str) -> Self {
        Self::with_status("error").with_message(sanitize_error_message(message))
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    #[must_use]
    pub fn with_message(mut self, message: String) -> Self {
        self.message = Some(message);
        self
    }

    #[must_use]
    pub fn with_client_id(mut self, client_id: String) -> Self {
        self.client_id = Some(client_id);
        self
    }

    #[must_use]
    pub fn with_score(mut self, score: PronunciationScore) -> Self {
        self.score = Some(score);
        self
    }

    #[must_use]
    pub fn with_evaluation(mut self, evaluation: PhraseEvaluation) -> Self {
        self.evaluation = Some(evaluation);
        self
    }

    #[must_use]
    pub fn with_scoring_policy(mut self, policy: ScoringPolicy) -> Self {
        self.scoring_policy = Some(policy);
        self
    }

    #[must_use]
    pub fn with_started_at(mut self, started_at: String) -> Self {
        self.started_at = Some(started_at);
        self
    }

    #[must_use]
    pub fn with_uptime_seconds(mut self, seconds: u64) -> Self {
        self.uptime_seconds = Some(seconds);
        self
    }

    #[must_use]
    pub fn with_requests_served(mut self, count: u64) -> Self {
        self.requests_served = Some(count);
        self
    }

    #[must_use]
    pub fn with_active_connections(mut self, count: u32) -> Self {
        self.active_connections = Some(count);
        self
    }

    #[must_use]
    pub fn with_connection_active(mut self, active: bool) -> Self {
        self.connection_active = Some(active);
        self
    }
}

// Full details stay in the daemon log; clients get the first line up to the
// first colon unless detailed errors are switched on.
fn sanitize_error_message(message: &str) -> String {
    let debug = std::env::var("LEXFIX_DEBUG_ERRORS")
        .map(|v| matches!(v.as_str(), "1"))
        .unwrap_or(false)
        || cfg!(debug_assertions);
    if debug {
        return message.to_string();
    }

    let first_line = message.lines().next().unwrap_or(message).trim();
    if let Some((prefix, _)) = first_line.split_once(':') {
        prefix.trim().to_string()
    } else {
        first_line.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ping {
        client_id: Option<String>,
    },
    Status,
    Score {
        spoken: String,
        target: String,
        confidence: f64,
    },
    Evaluate {
        spoken: String,
        expected: String,
    },
    GetConfig,
    SetPassThreshold {
        threshold: u8,
    },
}

impl Validate for DaemonRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_command(&self.command)?;

        validation::validate_optional_string(
            &self.client_id,
            "client_id",
            validation::limits::MAX_STRING_LENGTH,
        )?;
        validation::validate_optional_string(
            &self.spoken,
            "spoken",
            validation::limits::MAX_UTTERANCE_LENGTH,
        )?;
        validation::validate_optional_string(
            &self.target,
            "target",
            validation::limits::MAX_UTTERANCE_LENGTH,
        )?;

        if let Some(confidence) = self.confidence {
            validation::validate_confidence(confidence)?;
        }

        if let Some(ref data) = self.data {
            validation::validate_json_value(data)?;
        }

        Ok(())
    }
}

impl TryFrom<DaemonRequest> for Command {
    type Error = String;

    fn try_from(request: DaemonRequest) -> Result<Self, Self::Error> {
        if let Err(e) = request.validate() {
            return Err(format!("Request validation failed: {e}"));
        }
        match request.command.as_str() {
            "ping" => Ok(Command::Ping {
                client_id: request.client_id,
            }),
            "status" => Ok(Command::Status),
            "score" => cmd_score(request),
            "evaluate" => cmd_evaluate(request),
            "get_config" => Ok(Command::GetConfig),
            "set_pass_threshold" => cmd_set_pass_threshold(&request),
            _ => Err(format!("Unknown command: {}", request.command)),
        }
    }
}

fn cmd_score(request: DaemonRequest) -> Result<Command, String> {
    let spoken = request
        .spoken
        .ok_or("Missing spoken for score command")?;
    let target = request
        .target
        .ok_or("Missing target for score command")?;
    Ok(Command::Score {
        spoken,
        target,
        confidence: request.confidence.unwrap_or(DEFAULT_CONFIDENCE),
    })
}

fn cmd_evaluate(request: DaemonRequest) -> Result<Command, String> {
    let spoken = request
        .spoken
        .ok_or("Missing spoken for evaluate command")?;
    let expected = request
        .target
        .ok_or("Missing target for evaluate command")?;
    Ok(Command::Evaluate { spoken, expected })
}

fn cmd_set_pass_threshold(request: &DaemonRequest) -> Result<Command, String> {
    let threshold = request
        .data
        .as_ref()
        .and_then(|data| data.get("threshold"))
        .and_then(Value::as_u64)
        .ok_or("Missing threshold for set_pass_threshold command")?;

    validation::validate_pass_threshold(threshold).map_err(|e| e.to_string())?;
    let threshold = u8::try_from(threshold).map_err(|e| e.to_string())?;

    Ok(Command::SetPassThreshold { threshold })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(command: &str) -> DaemonRequest {
        DaemonRequest {
            command: command.to_string(),
            ..DaemonRequest::default()
        }
    }

    #[test]
    fn test_parse_score_command() {
        let req = DaemonRequest {
            spoken: Some("hellos".to_string()),
            target: Some("hello".to_string()),
            confidence: Some(0.9),
            ..request("score")
        };
        assert_eq!(
            Command::try_from(req),
            Ok(Command::Score {
                spoken: "hellos".to_string(),
                target: "hello".to_string(),
                confidence: 0.9,
            })
        );
    }

    #[test]
    fn test_score_defaults_confidence() {
        let req = DaemonRequest {
            spoken: Some("a".to_string()),
            target: Some("a".to_string()),
            ..request("score")
        };
        match Command::try_from(req) {
            Ok(Command::Score { confidence, .. }) => {
                assert!((confidence - DEFAULT_CONFIDENCE).abs() < f64::EPSILON);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_score_missing_fields() {
        let req = DaemonRequest {
            spoken: Some("hello".to_string()),
            ..request("score")
        };
        assert!(Command::try_from(req).unwrap_err().contains("Missing target"));
        assert!(Command::try_from(request("evaluate")).is_err());
    }

    #[test]
    fn test_confidence_out_of_range_is_rejected() {
        let req = DaemonRequest {
            spoken: Some("hello".to_string()),
            target: Some("hello".to_string()),
            confidence: Some(1.5),
            ..request("score")
        };
        assert!(
            Command::try_from(req)
                .unwrap_err()
                .starts_with("Request validation failed")
        );
    }

    #[test]
    fn test_set_pass_threshold() {
        let req = DaemonRequest {
            data: Some(json!({"threshold": 80})),
            ..request("set_pass_threshold")
        };
        assert_eq!(
            Command::try_from(req),
            Ok(Command::SetPassThreshold { threshold: 80 })
        );

        let req = DaemonRequest {
            data: Some(json!({"threshold": 180})),
            ..request("set_pass_threshold")
        };
        assert!(Command::try_from(req).is_err());

        assert!(Command::try_from(request("set_pass_threshold")).is_err());
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(Command::try_from(request("status")), Ok(Command::Status));
        assert_eq!(Command::try_from(request("get_config")), Ok(Command::GetConfig));
        assert!(matches!(
            Command::try_from(request("ping")),
            Ok(Command::Ping { client_id: None })
        ));
    }

    #[test]
    fn test_unknown_and_malformed_commands() {
        assert_eq!(
            Command::try_from(request("transcribe")),
            Err("Unknown command: transcribe".to_string())
        );
        assert!(Command::try_from(request("rm -rf /")).is_err());
    }

    #[test]
    fn test_request_json_shape() {
        let req: DaemonRequest = serde_json::from_value(json!({
            "command": "score",
            "spoken": "Hello!",
            "target": "hello"
        }))
        .unwrap();
        assert_eq!(req.spoken.as_deref(), Some("Hello!"));
        assert!(req.confidence.is_none());
    }

    #[test]
    fn test_response_skips_empty_fields() {
        let json = serde_json::to_value(DaemonResponse::success().with_message("pong".into()))
            .unwrap();
        assert_eq!(json, json!({"status": "success", "message": "pong"}));
    }
}
