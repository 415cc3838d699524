// SPDX-License-Identifier: GPL-3.0-only

use crate::daemon::types::LexfixDaemon;
use chrono::Utc;
use lexfix_shared::models::protocol::DaemonResponse;
use lexfix_shared::scoring::{evaluate_phrase_with, score_with};
use log::{debug, error, info};
use std::sync::atomic::Ordering;

impl LexfixDaemon {
    /// Handle ping command - test connectivity and connection status
    pub async fn handle_ping(&self, client_id: Option<String>) -> DaemonResponse {
        self.cleanup_old_connections().await;

        let mut response = DaemonResponse::success().with_message("pong".to_string());

        if let Some(client_id) = client_id {
            let connection_active = self.is_client_connection_active(&client_id).await;
            response = response.with_connection_active(connection_active);
        }

        response
    }

    /// Handle status command - uptime, traffic and the active policy
    pub async fn handle_status(&self) -> DaemonResponse {
        self.cleanup_old_connections().await;

        let uptime = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        let active_connections = self.active_connections.read().await.len();
        let policy = self.config.read().await.scoring.clone();

        DaemonResponse::success()
            .with_started_at(self.started_at.to_rfc3339())
            .with_uptime_seconds(u64::try_from(uptime).unwrap_or(0))
            .with_requests_served(self.requests_served.load(Ordering::Relaxed))
            .with_active_connections(u32::try_from(active_connections).unwrap_or(u32::MAX))
            .with_scoring_policy(policy)
    }

    /// Handle score command - grade one utterance against its target
    pub async fn handle_score(&self, spoken: &str, target: &str, confidence: f64) -> DaemonResponse {
        let policy = self.config.read().await.scoring.clone();
        let result = score_with(&policy, spoken, target, confidence);
        debug!(
            "Scored {spoken:?} against {target:?}: {} ({})",
            result.score, result.feedback
        );
        DaemonResponse::success().with_score(result)
    }

    /// Handle evaluate command - word-level evaluation of a sentence
    pub async fn handle_evaluate(&self, spoken: &str, expected: &str) -> DaemonResponse {
        let policy = self.config.read().await.scoring.clone();
        let evaluation = evaluate_phrase_with(&policy, spoken, expected);
        debug!(
            "Evaluated {spoken:?} against {expected:?}: overall {}",
            evaluation.overall_score
        );
        DaemonResponse::success().with_evaluation(evaluation)
    }

    /// Handle `get_config` command - return the active scoring policy
    pub async fn handle_get_config(&self) -> DaemonResponse {
        let policy = self.config.read().await.scoring.clone();
        DaemonResponse::success().with_scoring_policy(policy)
    }

    /// Handle `set_pass_threshold` command - change the pass mark and persist it
    pub async fn handle_set_pass_threshold(&self, threshold: u8) -> DaemonResponse {
        let (previous, snapshot) = {
            let mut config = self.config.write().await;
            let previous = config.scoring.pass_threshold;
            config.scoring.pass_threshold = threshold;
            (previous, config.clone())
        };
        info!("Pass threshold changed: {previous} -> {threshold}");

        // The in-memory change stands even if the file cannot be written
        if let Err(e) = snapshot.save_async(&self.config_path).await {
            error!("Failed to save config after pass threshold update: {e}");
        }

        DaemonResponse::success()
            .with_message(format!("Pass threshold set to {threshold}"))
            .with_scoring_policy(snapshot.scoring)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DaemonConfig;
    use lexfix_shared::Feedback;
    use lexfix_shared::models::protocol::DaemonRequest;

    fn test_daemon(dir: &tempfile::TempDir) -> LexfixDaemon {
        LexfixDaemon::new(
            dir.path().join("lexfix.sock"),
            dir.path().join("daemon.toml"),
            None,
        )
    }

    fn score_request(spoken: &str, target: &str, confidence: f64) -> DaemonRequest {
        DaemonRequest {
            command: "score".to_string(),
            spoken: Some(spoken.to_string()),
            target: Some(target.to_string()),
            confidence: Some(confidence),
            ..DaemonRequest::default()
        }
    }

    #[tokio::test]
    async fn test_score_command() {
        let dir = tempfile::tempdir().unwrap();
        let daemon = test_daemon(&dir);

        let response = daemon
            .handle_command(score_request("hellos", "hello", 0.9))
            .await;
        assert!(response.is_success());
        let score = response.score.unwrap();
        assert_eq!(score.score, 90);
        assert_eq!(score.feedback, Feedback::Variant);
        assert!(score.passed);
    }

    #[tokio::test]
    async fn test_evaluate_command() {
        let dir = tempfile::tempdir().unwrap();
        let daemon = test_daemon(&dir);

        let request = DaemonRequest {
            command: "evaluate".to_string(),
            spoken: Some("good teacher".to_string()),
            target: Some("good morning teacher".to_string()),
            ..DaemonRequest::default()
        };
        let evaluation = daemon.handle_command(request).await.evaluation.unwrap();
        assert_eq!(evaluation.word_errors.len(), 3);
        assert!(!evaluation.word_errors[1].is_correct);
    }

    #[tokio::test]
    async fn test_set_pass_threshold_applies_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let daemon = test_daemon(&dir);

        // 30 fails the default threshold
        let response = daemon.handle_command(score_request("helo", "hello", 0.9)).await;
        assert!(!response.score.unwrap().passed);

        let response = daemon.handle_set_pass_threshold(30).await;
        assert_eq!(response.scoring_policy.unwrap().pass_threshold, 30);

        let response = daemon.handle_command(score_request("helo", "hello", 0.9)).await;
        assert!(response.score.unwrap().passed);

        let saved = DaemonConfig::load_from(&dir.path().join("daemon.toml"));
        assert_eq!(saved.scoring.pass_threshold, 30);
    }

    #[tokio::test]
    async fn test_set_pass_threshold_applies_when_save_fails() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the save fail
        let config_path = dir.path().join("daemon.toml");
        std::fs::create_dir_all(&config_path).unwrap();
        let daemon = LexfixDaemon::new(dir.path().join("lexfix.sock"), config_path, None);

        let response = daemon.handle_set_pass_threshold(55).await;
        assert!(response.is_success());
        assert_eq!(response.scoring_policy.unwrap().pass_threshold, 55);

        let config = daemon.config.try_write().unwrap();
        assert_eq!(config.scoring.pass_threshold, 55);
    }

    #[tokio::test]
    async fn test_cli_override_is_saved() {
        let dir = tempfile::tempdir().unwrap();
        let daemon = LexfixDaemon::new(
            dir.path().join("lexfix.sock"),
            dir.path().join("daemon.toml"),
            Some(80),
        );
        let policy = daemon.handle_get_config().await.scoring_policy.unwrap();
        assert_eq!(policy.pass_threshold, 80);

        let saved = DaemonConfig::load_from(&dir.path().join("daemon.toml"));
        assert_eq!(saved.scoring.pass_threshold, 80);
    }

    #[tokio::test]
    async fn test_ping_tracks_connection() {
        let dir = tempfile::tempdir().unwrap();
        let daemon = test_daemon(&dir);

        let request = DaemonRequest {
            command: "ping".to_string(),
            client_id: Some("tester".to_string()),
            ..DaemonRequest::default()
        };
        let response = daemon.handle_command(request).await;
        assert_eq!(response.message.as_deref(), Some("pong"));
        assert_eq!(response.connection_active, Some(true));
        assert_eq!(response.client_id.as_deref(), Some("tester"));

        let status = daemon.handle_status().await;
        assert_eq!(status.active_connections, Some(1));
        assert!(status.started_at.is_some());
    }

    #[tokio::test]
    async fn test_invalid_command_is_an_error_response() {
        let dir = tempfile::tempdir().unwrap();
        let daemon = test_daemon(&dir);

        let request = DaemonRequest {
            command: "record".to_string(),
            ..DaemonRequest::default()
        };
        let response = daemon.handle_command(request).await;
        assert_eq!(response.status, "error");
        assert!(response.message.is_some());
        assert!(response.client_id.is_none());
    }
}
