//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables (`SHIELD_*`)
//!
//! Every knob has a default matching the shipped policy, so `Config::default()`
//! is a fully working configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShieldError};

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Behavior verifier configuration
    #[serde(default)]
    pub verifier: VerifierConfig,

    /// Attack detector configuration
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Cost routing configuration
    #[serde(default)]
    pub routing: RoutingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ShieldError::Config(format!("Failed to read config file: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| ShieldError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Verifier settings
        if let Ok(val) = std::env::var("SHIELD_BASELINE_CAP") {
            if let Ok(val) = val.parse() {
                config.verifier.baseline_cap = val;
            }
        }
        if let Ok(val) = std::env::var("SHIELD_DEVIATION_THRESHOLD") {
            if let Ok(val) = val.parse() {
                config.verifier.deviation_threshold = val;
            }
        }

        // Detector settings
        if let Ok(val) = std::env::var("SHIELD_MAX_RESPONSE_CHARS") {
            if let Ok(val) = val.parse() {
                config.detector.max_response_chars = val;
            }
        }
        if let Ok(val) = std::env::var("SHIELD_MAX_REASONING_TOKENS") {
            if let Ok(val) = val.parse() {
                config.detector.max_reasoning_tokens = val;
            }
        }

        // Routing settings
        if let Ok(val) = std::env::var("SHIELD_USAGE_CAP") {
            if let Ok(val) = val.parse() {
                config.routing.usage_cap = val;
            }
        }

        config
    }
}

/// Behavior verifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Fingerprints retained per agent baseline
    pub baseline_cap: usize,

    /// Minimum similarity required for a fingerprint to be valid (0-1)
    pub deviation_threshold: f64,

    /// Samples required before a baseline counts as established.
    /// Below this the verifier auto-accepts (cold-start policy).
    pub min_samples: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            baseline_cap: 100,
            deviation_threshold: 0.65,
            min_samples: 5,
        }
    }
}

/// Attack detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Response length above which a behavioral anomaly is raised
    pub max_response_chars: usize,

    /// Reasoning token count above which a response anomaly is raised
    pub max_reasoning_tokens: u64,

    /// Verdicts retained in the recent-threats ledger
    pub recent_threats_cap: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_response_chars: 50_000,
            max_reasoning_tokens: 100_000,
            recent_threats_cap: 100,
        }
    }
}

/// Cost routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Usage entries kept before the ledger is trimmed
    pub usage_cap: usize,

    /// Entries retained after a trim
    pub usage_retain: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            usage_cap: 10_000,
            usage_retain: 5_000,
        }
    }
}
