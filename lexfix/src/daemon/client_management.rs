// SPDX-License-Identifier: GPL-3.0-only

use crate::daemon::types::LexfixDaemon;
use anyhow::Result;
use chrono::{DateTime, Utc};
use lexfix_shared::daemon::client::{read_frame, write_frame};
use lexfix_shared::models::protocol::{DaemonRequest, DaemonResponse};
use lexfix_shared::validation::Validate;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use tokio::net::UnixStream;

/// Seconds after which a client that has not been seen counts as gone
pub const CONNECTION_TIMEOUT_SECONDS: i64 = 30;

/// Track active client connections
#[derive(Debug, Clone)]
pub struct ClientConnection {
    pub last_seen: DateTime<Utc>,
}

/// Manages active client connections
pub type ClientConnectionsMap =
    std::sync::Arc<tokio::sync::RwLock<HashMap<String, ClientConnection>>>;

impl LexfixDaemon {
    /// Handle client connection
    ///
    /// # Errors
    ///
    /// Returns an error if writing a response to the stream fails in a way
    /// that is not a client disconnect.
    pub async fn handle_client(&self, mut stream: UnixStream) -> Result<()> {
        debug!("New client connected");

        loop {
            let message = match read_frame(&mut stream).await {
                Ok(Some(message)) => message,
                Ok(None) => {
                    debug!("Client disconnected");
                    break;
                }
                Err(e) => {
                    warn!("Failed to read request frame: {e}");
                    break;
                }
            };

            let request: DaemonRequest = match serde_json::from_slice(&message) {
                Ok(req) => req,
                Err(e) => {
                    warn!("Failed to parse request: {e}");
                    let response = DaemonResponse::error("Invalid JSON request");
                    if let Err(e) = self.send_response(&mut stream, &response).await {
                        warn!("Failed to send error response: {e}");
                        break;
                    }
                    continue;
                }
            };

            if let Err(e) = request.validate() {
                warn!("Request validation failed: {e}");
                let response = DaemonResponse::error(&format!("Request validation failed: {e}"));
                if let Err(e) = self.send_response(&mut stream, &response).await {
                    warn!("Failed to send validation error response: {e}");
                    break;
                }
                continue;
            }

            debug!("Received command: {}", request.command);
            self.requests_served.fetch_add(1, Ordering::Relaxed);

            let response = self.handle_command(request).await;
            if let Err(e) = self.send_response(&mut stream, &response).await {
                warn!("Failed to send response: {e}");
                break;
            }
        }

        Ok(())
    }

    /// Send response to client
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the stream fails.
    pub async fn send_response(
        &self,
        stream: &mut UnixStream,
        response: &DaemonResponse,
    ) -> Result<()> {
        write_frame(stream, response).await?;
        Ok(())
    }

    /// Update client connection timestamp, dropping clients that timed out
    pub async fn update_client_connection(&self, client_id: String) {
        let now = Utc::now();
        let timeout = chrono::Duration::seconds(CONNECTION_TIMEOUT_SECONDS);

        let mut connections = self.active_connections.write().await;
        connections
            .retain(|_, connection| now.signed_duration_since(connection.last_seen) < timeout);
        connections.insert(client_id, ClientConnection { last_seen: now });
    }

    /// Check if a client connection is still active (within timeout)
    pub async fn is_client_connection_active(&self, client_id: &str) -> bool {
        let connections = self.active_connections.read().await;
        connections.get(client_id).is_some_and(|connection| {
            Utc::now().signed_duration_since(connection.last_seen)
                < chrono::Duration::seconds(CONNECTION_TIMEOUT_SECONDS)
        })
    }

    /// Clean up old connections
    pub async fn cleanup_old_connections(&self) {
        let mut connections = self.active_connections.write().await;
        let now = Utc::now();
        let timeout = chrono::Duration::seconds(CONNECTION_TIMEOUT_SECONDS);

        connections
            .retain(|_, connection| now.signed_duration_since(connection.last_seen) < timeout);
    }
}
