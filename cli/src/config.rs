//! Head Configuration
//!
//! Handles loading and saving head configuration from TOML files. The
//! config carries participant key seeds (hex) so the simulation can derive
//! every participant's signing key deterministically.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use isthmus_multisig::SigningKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Head configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadConfig {
    /// Hex-encoded 32-byte signing-key seeds, one per participant
    pub participant_seeds: Vec<String>,

    /// Seconds before a head stuck collecting commitments is aborted
    #[serde(default = "default_commit_deadline_secs")]
    pub commit_deadline_secs: u64,
}

fn default_commit_deadline_secs() -> u64 {
    600
}

impl HeadConfig {
    /// Generate a config with `n` fresh participant keys
    pub fn generate(n: usize) -> Self {
        let seeds = (0..n)
            .map(|_| {
                use rand::RngCore;
                let mut seed = [0u8; 32];
                rand::thread_rng().fill_bytes(&mut seed);
                hex::encode(seed)
            })
            .collect();
        Self {
            participant_seeds: seeds,
            commit_deadline_secs: default_commit_deadline_secs(),
        }
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.participant_seeds.len() < 2 {
            return Err(ConfigError::Invalid(
                "a head needs at least 2 participants".into(),
            ));
        }
        for seed in &self.participant_seeds {
            let bytes = hex::decode(seed)
                .map_err(|e| ConfigError::Invalid(format!("bad seed hex: {}", e)))?;
            if bytes.len() != 32 {
                return Err(ConfigError::Invalid(format!(
                    "seed must be 32 bytes, got {}",
                    bytes.len()
                )));
            }
        }
        Ok(())
    }

    /// Derive the participant signing keys
    pub fn signing_keys(&self) -> Result<Vec<SigningKey>, ConfigError> {
        self.participant_seeds
            .iter()
            .map(|seed| {
                let bytes = hex::decode(seed)
                    .map_err(|e| ConfigError::Invalid(format!("bad seed hex: {}", e)))?;
                let mut arr = [0u8; 32];
                arr.copy_from_slice(&bytes);
                Ok(SigningKey::from_seed(arr))
            })
            .collect()
    }

    /// The configured commit deadline
    pub fn commit_deadline(&self) -> Duration {
        Duration::from_secs(self.commit_deadline_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_derive_keys() {
        let config = HeadConfig::generate(3);
        let keys = config.signing_keys().unwrap();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn test_short_seed_rejected() {
        let config = HeadConfig {
            participant_seeds: vec!["aabb".into(), "ccdd".into()],
            commit_deadline_secs: 10,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let config = HeadConfig::generate(2);
        let text = toml::to_string_pretty(&config).unwrap();
        let restored: HeadConfig = toml::from_str(&text).unwrap();
        assert_eq!(restored.participant_seeds, config.participant_seeds);
    }
}
