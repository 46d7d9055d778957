//! Node configuration.

use std::path::Path;

use rpe_auction::AuctionConfig;
use rpe_consensus::ConsensusConfig;
use rpe_core::PriceSourceKind;
use rpe_publisher::{KeySource, PublisherConfig};
use rpe_toxicity::ToxicityConfig;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Reference-market session settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSection {
    /// Extra holidays on top of the built-in calendar, `YYYY-MM-DD`.
    #[serde(default)]
    pub extra_holidays: Vec<String>,
}

/// One external price source endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    pub kind: PriceSourceKind,
}

/// Consensus polling settings plus the aggregator parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusSection {
    /// Asset symbol queried from each source.
    #[serde(default = "default_asset")]
    pub asset: String,

    /// Poll cadence in seconds.
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,

    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    #[serde(flatten)]
    pub aggregator: ConsensusConfig,
}

fn default_asset() -> String {
    "XYZ-USD".to_string()
}
fn default_poll_secs() -> u64 {
    5
}

impl Default for ConsensusSection {
    fn default() -> Self {
        Self {
            asset: default_asset(),
            poll_secs: default_poll_secs(),
            sources: Vec::new(),
            aggregator: ConsensusConfig::default(),
        }
    }
}

/// Auction engine settings plus the sweep cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionSection {
    #[serde(default = "default_sweep_secs")]
    pub sweep_secs: u64,

    #[serde(flatten)]
    pub engine: AuctionConfig,
}

fn default_sweep_secs() -> u64 {
    5
}

impl Default for AuctionSection {
    fn default() -> Self {
        Self {
            sweep_secs: default_sweep_secs(),
            engine: AuctionConfig::default(),
        }
    }
}

/// Publisher settings plus where the signing key comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherSection {
    /// Environment variable holding the hex signing key.
    #[serde(default)]
    pub key_env: Option<String>,

    /// File holding the hex signing key (takes precedence over
    /// `key_env` when both are set).
    #[serde(default)]
    pub key_file: Option<String>,

    #[serde(flatten)]
    pub publisher: PublisherConfig,
}

impl Default for PublisherSection {
    fn default() -> Self {
        Self {
            key_env: None,
            key_file: None,
            publisher: PublisherConfig::default(),
        }
    }
}

impl PublisherSection {
    /// Resolve the signing key source.
    #[must_use]
    pub fn key_source(&self) -> KeySource {
        if let Some(path) = &self.key_file {
            return KeySource::File { path: path.into() };
        }
        KeySource::EnvVar {
            var_name: self
                .key_env
                .clone()
                .unwrap_or_else(|| "RPE_PUBLISHER_KEY".to_string()),
        }
    }
}

/// Full node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub session: SessionSection,

    #[serde(default)]
    pub toxicity: ToxicityConfig,

    #[serde(default)]
    pub consensus: ConsensusSection,

    #[serde(default)]
    pub auction: AuctionSection,

    #[serde(default)]
    pub publisher: PublisherSection,
}

impl NodeConfig {
    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Resolve the config path (explicit override, then `RPE_CONFIG`,
    /// then the default location) and load it, falling back to
    /// defaults when the file does not exist.
    pub fn load(path_override: Option<String>) -> AppResult<Self> {
        let config_path = path_override
            .or_else(|| std::env::var("RPE_CONFIG").ok())
            .unwrap_or_else(|| "config/default.toml".to_string());

        if Path::new(&config_path).exists() {
            tracing::info!(path = %config_path, "Loading configuration");
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }
}
