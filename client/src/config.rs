use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anchor_lang::prelude::Pubkey;
use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;

use crate::error::ConfigError;

pub const ENV_RPC_URL: &str = "PEER_LENDING_RPC_URL";
pub const ENV_COMMITMENT: &str = "PEER_LENDING_COMMITMENT";
pub const ENV_PROGRAM_ID: &str = "PEER_LENDING_PROGRAM_ID";
pub const ENV_MIRROR_URL: &str = "PEER_LENDING_MIRROR_URL";
pub const ENV_CONFIRM_TIMEOUT_MS: &str = "PEER_LENDING_CONFIRM_TIMEOUT_MS";

/// Client settings. Missing JSON fields take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub rpc_url: String,
    /// processed | confirmed | finalized
    pub commitment: String,
    pub program_id: String,
    /// Base URL of the marketplace service, including `/api/v1`.
    /// No mirror updates are sent when unset.
    pub mirror_url: Option<String>,
    pub confirm_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.devnet.solana.com".to_string(),
            commitment: "confirmed".to_string(),
            program_id: peer_lending::ID.to_string(),
            mirror_url: Some("http://localhost:8080/api/v1".to_string()),
            confirm_timeout_ms: 60_000,
            poll_interval_ms: 500,
        }
    }
}

impl ClientConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Apply `PEER_LENDING_*` environment overrides
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = lookup(ENV_RPC_URL) {
            self.rpc_url = url;
        }
        if let Some(commitment) = lookup(ENV_COMMITMENT) {
            self.commitment = commitment;
        }
        if let Some(program_id) = lookup(ENV_PROGRAM_ID) {
            self.program_id = program_id;
        }
        if let Some(url) = lookup(ENV_MIRROR_URL) {
            self.mirror_url = (!url.is_empty()).then_some(url);
        }
        if let Some(ms) = lookup(ENV_CONFIRM_TIMEOUT_MS) {
            self.confirm_timeout_ms = ms.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_CONFIRM_TIMEOUT_MS,
                value: ms,
            })?;
        }
        Ok(self)
    }

    pub fn program_id(&self) -> Result<Pubkey, ConfigError> {
        Pubkey::from_str(&self.program_id).map_err(|_| ConfigError::InvalidValue {
            key: "program_id",
            value: self.program_id.clone(),
        })
    }

    pub fn commitment(&self) -> Result<CommitmentConfig, ConfigError> {
        match self.commitment.as_str() {
            "processed" => Ok(CommitmentConfig::processed()),
            "confirmed" => Ok(CommitmentConfig::confirmed()),
            "finalized" => Ok(CommitmentConfig::finalized()),
            other => Err(ConfigError::InvalidValue {
                key: "commitment",
                value: other.to_string(),
            }),
        }
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ClientConfig::from_json(r#"{"rpc_url": "http://127.0.0.1:8899"}"#).unwrap();
        assert_eq!(config.rpc_url, "http://127.0.0.1:8899");
        assert_eq!(config.commitment, "confirmed");
        assert_eq!(config.program_id().unwrap(), peer_lending::ID);
        assert_eq!(config.confirm_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn env_overrides_apply() {
        let config = ClientConfig::default()
            .with_overrides(|key| match key {
                ENV_RPC_URL => Some("http://localhost:8899".into()),
                ENV_MIRROR_URL => Some(String::new()),
                ENV_CONFIRM_TIMEOUT_MS => Some("1500".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.rpc_url, "http://localhost:8899");
        assert_eq!(config.mirror_url, None);
        assert_eq!(config.confirm_timeout(), Duration::from_millis(1_500));
    }

    #[test]
    fn bad_values_are_reported() {
        let err = ClientConfig::default()
            .with_overrides(|key| (key == ENV_CONFIRM_TIMEOUT_MS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: ENV_CONFIRM_TIMEOUT_MS, .. }));

        let config = ClientConfig {
            commitment: "eventually".into(),
            ..ClientConfig::default()
        };
        assert!(config.commitment().is_err());
    }
}
