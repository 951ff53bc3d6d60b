//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section is optional; anything left out falls back to the game's
//! standard rules and the default rating weights.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::optimizer::chips::ChipType;
use crate::rating::RatingWeights;
use crate::rules::SquadRules;
use crate::solver::SolverConfig;
use crate::sources::fpl::DEFAULT_BASE_URL;
use crate::storage::DEFAULT_CATALOG_FILE;
use crate::transfers::TransferConfig;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub squad: SquadConfig,
    pub rules: SquadRules,
    pub rating: RatingWeights,
    pub transfers: TransferConfig,
    pub solver: SolverConfig,
    pub source: SourceConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SquadConfig {
    /// Budget used when no owned squad is available.
    pub budget: Decimal,
    /// 0 = spend as much as possible on the eleven.
    pub bench_importance: f64,
    pub chip: ChipType,
}

impl Default for SquadConfig {
    fn default() -> Self {
        Self {
            budget: dec!(100.0),
            bench_importance: 0.5,
            chip: ChipType::FreeHit,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SourceConfig {
    pub api_base_url: String,
    pub timeout_secs: u64,
    pub cache_path: String,
    /// Warn when the cached catalog is older than this.
    pub max_cache_age_hours: i64,
    /// Manager id for `entry` and `leagues`.
    pub entry_id: Option<u64>,
    /// Saved `my-team` response; enables rebuild budgets and transfers.
    pub my_team_path: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            cache_path: DEFAULT_CATALOG_FILE.to_string(),
            max_cache_age_hours: 24,
            entry_id: None,
            my_team_path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load `path` if it exists, otherwise use the defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            info!(path, "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }
}
