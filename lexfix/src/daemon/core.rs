// SPDX-License-Identifier: GPL-3.0-only

use crate::daemon::types::LexfixDaemon;
use lexfix_shared::models::protocol::{Command, DaemonRequest, DaemonResponse};

impl LexfixDaemon {
    /// Main command handler - routes commands to appropriate handlers
    pub async fn handle_command(&self, request: DaemonRequest) -> DaemonResponse {
        let client_id = request.client_id.clone();
        if let Some(client_id) = &client_id {
            self.update_client_connection(client_id.clone()).await;
        }

        let response = match Command::try_from(request) {
            Ok(command) => self.route_command(command).await,
            Err(e) => DaemonResponse::error(&e),
        };

        // Echo the caller's id so it can match responses to requests
        match client_id {
            Some(client_id) => response.with_client_id(client_id),
            None => response,
        }
    }

    async fn route_command(&self, command: Command) -> DaemonResponse {
        match command {
            Command::Ping { client_id } => self.handle_ping(client_id).await,
            Command::Status => self.handle_status().await,
            Command::Score {
                spoken,
                target,
                confidence,
            } => self.handle_score(&spoken, &target, confidence).await,
            Command::Evaluate { spoken, expected } => {
                self.handle_evaluate(&spoken, &expected).await
            }
            Command::GetConfig => self.handle_get_config().await,
            Command::SetPassThreshold { threshold } => {
                self.handle_set_pass_threshold(threshold).await
            }
        }
    }
}
