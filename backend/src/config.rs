//! Runtime configuration.
//!
//! Every option can be given on the command line or through a `MAP_*`
//! environment variable, which is how the deployed service is configured.

use crate::matcher::FuzzyConfig;
use crate::urn::UrnRules;
use chrono::Duration;
use clap::Args;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("fuzzy threshold must be in (0, 1], got {0}")]
    FuzzyThreshold(f64),

    #[error("fuzzy candidate limit must be at least 1")]
    FuzzyCandidates,

    #[error("retention period must be at least 1 day")]
    Retention,
}

#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Address the HTTP server binds to.
    #[arg(long, env = "MAP_HOST", default_value = "127.0.0.1", global = true)]
    pub host: String,

    #[arg(long, env = "MAP_PORT", default_value_t = 8080, global = true)]
    pub port: u16,

    /// SQLite database file.
    #[arg(long, env = "MAP_DATABASE_PATH", default_value = "make_a_plea.sqlite", global = true)]
    pub database: PathBuf,

    /// Fall back to matching on defendant details when the URN finds nothing.
    #[arg(long, env = "MAP_FUZZY_MATCHING", global = true)]
    pub fuzzy_matching: bool,

    #[arg(long, env = "MAP_FUZZY_THRESHOLD", default_value_t = 0.85, global = true)]
    pub fuzzy_threshold: f64,

    #[arg(long, env = "MAP_FUZZY_MAX_CANDIDATES", default_value_t = 25, global = true)]
    pub fuzzy_max_candidates: usize,

    /// Accept five digit case sequences.
    #[arg(long, env = "MAP_ACCEPT_LEGACY_URNS", global = true)]
    pub accept_legacy_urns: bool,

    /// Age in days after which cases and audit data are purged.
    #[arg(long, env = "MAP_DATA_RETENTION_DAYS", default_value_t = 365, global = true)]
    pub retention_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        let fuzzy = FuzzyConfig::default();
        Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: PathBuf::from("make_a_plea.sqlite"),
            fuzzy_matching: fuzzy.enabled,
            fuzzy_threshold: fuzzy.threshold,
            fuzzy_max_candidates: fuzzy.max_candidates,
            accept_legacy_urns: false,
            retention_days: 365,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fuzzy_threshold > 0.0 && self.fuzzy_threshold <= 1.0) {
            return Err(ConfigError::FuzzyThreshold(self.fuzzy_threshold));
        }
        if self.fuzzy_max_candidates == 0 {
            return Err(ConfigError::FuzzyCandidates);
        }
        if self.retention_days == 0 {
            return Err(ConfigError::Retention);
        }
        Ok(())
    }

    pub fn fuzzy(&self) -> FuzzyConfig {
        FuzzyConfig {
            enabled: self.fuzzy_matching,
            threshold: self.fuzzy_threshold,
            max_candidates: self.fuzzy_max_candidates,
        }
    }

    pub fn urn_rules(&self) -> UrnRules {
        UrnRules {
            accept_legacy_sequences: self.accept_legacy_urns,
        }
    }

    pub fn retention(&self) -> Duration {
        Duration::days(i64::from(self.retention_days))
    }
}
