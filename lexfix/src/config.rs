// SPDX-License-Identifier: GPL-3.0-only
use lexfix_shared::scoring::ScoringPolicy;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub scoring: ScoringPolicy,
}

impl DaemonConfig {
    /// Get the config file path
    #[must_use]
    pub fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".config")
            })
            .join("lexfix");

        config_dir.join("daemon.toml")
    }

    /// Load configuration from `config_path`, falling back to defaults when the
    /// file is missing, unparsable, or holds an out-of-range policy.
    #[must_use]
    pub fn load_from(config_path: &Path) -> Self {
        match fs::read_to_string(config_path) {
            Ok(content) => match toml::from_str::<DaemonConfig>(&content) {
                Ok(config) => {
                    if let Err(e) = config.scoring.validate() {
                        warn!(
                            "Invalid scoring policy in {}: {e}. Using defaults.",
                            config_path.display()
                        );
                        return Self::default();
                    }
                    debug!("Loaded daemon config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    warn!(
                        "Failed to parse config file {}: {e}. Using defaults.",
                        config_path.display()
                    );
                    Self::default()
                }
            },
            Err(e) => {
                debug!(
                    "Config file {} not found or unreadable: {e}. Using defaults.",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    /// Save configuration to `config_path`
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration directory cannot be created,
    /// serialization fails, or the file cannot be written.
    pub fn save_to(&self, config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_content = toml::to_string_pretty(self)?;
        fs::write(config_path, toml_content)?;

        debug!("Saved daemon config to {}", config_path.display());
        Ok(())
    }

    /// Save configuration to `config_path` without blocking the runtime
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration directory cannot be created,
    /// serialization fails, or the file cannot be written.
    pub async fn save_async(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let toml_content = toml::to_string_pretty(self)?;
        tokio::fs::write(config_path, toml_content).await?;

        debug!("Saved daemon config to {}", config_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DaemonConfig::load_from(&dir.path().join("absent.toml"));
        assert_eq!(config, DaemonConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("daemon.toml");

        let mut config = DaemonConfig::default();
        config.scoring.pass_threshold = 85;
        config.save_to(&path).unwrap();

        let loaded = DaemonConfig::load_from(&path);
        assert_eq!(loaded.scoring.pass_threshold, 85);
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_save_async_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("daemon.toml");

        let mut config = DaemonConfig::default();
        config.scoring.variant_score = 88;
        config.save_async(&path).await.unwrap();

        assert_eq!(DaemonConfig::load_from(&path), config);
    }

    #[test]
    fn test_partial_scoring_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.toml");
        fs::write(&path, "[scoring]\npass_threshold = 80\nvariant_score = 88\n").unwrap();

        let config = DaemonConfig::load_from(&path);
        assert_eq!(config.scoring.pass_threshold, 80);
        assert_eq!(config.scoring.variant_score, 88);
        assert!((config.scoring.close_similarity - 0.85).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_policy_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.toml");
        fs::write(&path, "[scoring]\nclose_similarity = 3.0\n").unwrap();
        assert_eq!(DaemonConfig::load_from(&path), DaemonConfig::default());

        fs::write(&path, "not toml at all [").unwrap();
        assert_eq!(DaemonConfig::load_from(&path), DaemonConfig::default());
    }
}
