// SPDX-License-Identifier: GPL-3.0-only
use crate::config::DaemonConfig;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tokio::net::UnixListener;
use tokio::sync::{RwLock, broadcast};

use super::client_management::ClientConnectionsMap;

#[derive(Clone)]
pub struct LexfixDaemon {
    pub socket_path: PathBuf,
    pub shutdown_tx: broadcast::Sender<()>,
    // Configuration management
    pub config: Arc<RwLock<DaemonConfig>>,
    pub config_path: PathBuf,
    // Connection tracking
    pub active_connections: ClientConnectionsMap,
    // Status counters
    pub started_at: DateTime<Utc>,
    pub requests_served: Arc<AtomicU64>,
}

impl LexfixDaemon {
    /// Create a new `LexfixDaemon`, loading its config from `config_path`.
    ///
    /// A pass threshold given on the command line overrides the file and is
    /// saved back to it.
    #[must_use]
    pub fn new(
        socket_path: PathBuf,
        config_path: PathBuf,
        pass_threshold_override: Option<u8>,
    ) -> Self {
        info!("Initializing Lexfix Daemon...");

        let mut config = DaemonConfig::load_from(&config_path);
        info!("Loaded daemon configuration from {}", config_path.display());

        if let Some(threshold) = pass_threshold_override
            && config.scoring.pass_threshold != threshold
        {
            info!(
                "CLI override: pass threshold {} -> {threshold}",
                config.scoring.pass_threshold
            );
            config.scoring.pass_threshold = threshold;
            if let Err(e) = config.save_to(&config_path) {
                warn!("Failed to save updated daemon config: {e}");
            } else {
                info!("Updated daemon configuration saved to disk");
            }
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        LexfixDaemon {
            socket_path,
            shutdown_tx,
            config: Arc::new(RwLock::new(config)),
            config_path,
            active_connections: Arc::new(RwLock::new(HashMap::new())),
            started_at: Utc::now(),
            requests_served: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start the daemon and listen for connections
    ///
    /// # Errors
    ///
    /// Returns an error if the socket directory cannot be created,
    /// if binding the Unix socket fails, or if setting permissions fails.
    pub async fn start(&self) -> Result<()> {
        info!(
            "Starting Lexfix Daemon on socket: {}",
            self.socket_path.display()
        );

        if let Some(parent) = self.socket_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create socket directory")?;
        }

        // Remove a stale socket left by a previous run
        if self.socket_path.exists() {
            tokio::fs::remove_file(&self.socket_path)
                .await
                .context("Failed to remove existing socket file")?;
        }

        let listener =
            UnixListener::bind(&self.socket_path).context("Failed to bind Unix socket")?;

        // Owner and group only in release builds
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mode = if cfg!(debug_assertions) {
                log::warn!("Debug build - socket permissions set to 0o666 (world accessible)");
                0o666
            } else {
                log::info!("Socket permissions set to 0o660 (owner + group access only)");
                0o660
            };

            let permissions = std::fs::Permissions::from_mode(mode);
            std::fs::set_permissions(&self.socket_path, permissions)
                .context("Failed to set socket permissions")?;
        }

        info!("Daemon listening on socket: {}", self.socket_path.display());

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, _addr)) => {
                            let daemon_clone = self.clone();
                            tokio::spawn(async move {
                                if let Err(e) = daemon_clone.handle_client(stream).await {
                                    log::warn!("Error handling client: {e}");
                                }
                            });
                        }
                        Err(e) => {
                            log::error!("Failed to accept connection: {e}");
                        }
                    }
                }

                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        if self.socket_path.exists() {
            let _ = tokio::fs::remove_file(&self.socket_path).await;
        }

        info!("Daemon shutdown complete");
        Ok(())
    }

    /// Ask a running [`start`](Self::start) loop to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}
