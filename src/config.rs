//! Engine configuration
//!
//! Loaded from a TOML file with `LOTTO5_`-prefixed environment overrides.
//! The engine and jackpot sections are hot-reloadable: they live behind a
//! shared handle the scheduler re-reads every tick, so `reload` takes
//! effect without restarting anything.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use crate::avoid::AvoidWinParams;
use crate::error::{EngineError, Result};
use crate::jackpot::JackpotConfig;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    /// SQLite connection string
    #[serde(default = "default_database_url")]
    pub url: String,
}

fn default_database_url() -> String {
    "sqlite://lotto5.db?mode=rwc".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

/// Draw-cycle policy. Every field is hot-reloadable.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Probability of letting members win on a given period
    #[serde(default = "default_allow_win_probability")]
    pub allow_win_probability: f64,
    /// Bets below this stake are ignored by the avoid-win expansion
    #[serde(default = "default_min_bet_amount")]
    pub min_bet_amount: Decimal,
    /// Wall-clock budget for the winning-set expansion
    #[serde(default = "default_max_analysis_duration_secs")]
    pub max_analysis_duration_secs: u64,
    /// Betting closes this many seconds before the draw
    #[serde(default = "default_bet_cutoff_secs")]
    pub bet_cutoff_secs: i64,
    /// Persistence retries before a period is surfaced to monitoring
    #[serde(default = "default_max_draw_attempts")]
    pub max_draw_attempts: u32,
    /// When false the clock keeps ticking but no draws execute
    #[serde(default = "default_system_enabled")]
    pub system_enabled: bool,
}

fn default_allow_win_probability() -> f64 {
    1.0 / 59_600_000.0
}

fn default_min_bet_amount() -> Decimal {
    Decimal::ONE
}

fn default_max_analysis_duration_secs() -> u64 {
    30
}

fn default_bet_cutoff_secs() -> i64 {
    10
}

fn default_max_draw_attempts() -> u32 {
    5
}

fn default_system_enabled() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            allow_win_probability: default_allow_win_probability(),
            min_bet_amount: default_min_bet_amount(),
            max_analysis_duration_secs: default_max_analysis_duration_secs(),
            bet_cutoff_secs: default_bet_cutoff_secs(),
            max_draw_attempts: default_max_draw_attempts(),
            system_enabled: default_system_enabled(),
        }
    }
}

impl EngineConfig {
    pub fn avoid_params(&self) -> AvoidWinParams {
        AvoidWinParams {
            allow_win_probability: self.allow_win_probability,
            min_bet_amount: self.min_bet_amount,
            max_analysis_duration: Duration::from_secs(self.max_analysis_duration_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OddsCacheConfig {
    /// Seconds before the odds table is re-read from storage
    #[serde(default = "default_odds_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_odds_ttl_secs() -> u64 {
    300
}

impl Default for OddsCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_odds_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub odds: OddsCacheConfig,
    #[serde(default)]
    pub jackpot: JackpotConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            engine: EngineConfig::default(),
            odds: OddsCacheConfig::default(),
            jackpot: JackpotConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load from a TOML file (optional) layered with `LOTTO5_*` env vars,
    /// e.g. `LOTTO5_ENGINE__BET_CUTOFF_SECS=15`.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("LOTTO5")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| EngineError::Config(e.to_string()))?;
        settings
            .try_deserialize()
            .map_err(|e| EngineError::Config(e.to_string()))
    }
}

/// Hot-reloadable view over the policy sections. The scheduler snapshots
/// these every tick; `reload` swaps them in place.
#[derive(Clone)]
pub struct ConfigHandle {
    path: String,
    engine: Arc<RwLock<EngineConfig>>,
    jackpot: Arc<RwLock<JackpotConfig>>,
}

impl ConfigHandle {
    pub fn new(path: &str, config: &AppConfig) -> Self {
        Self {
            path: path.to_string(),
            engine: Arc::new(RwLock::new(config.engine.clone())),
            jackpot: Arc::new(RwLock::new(config.jackpot.clone())),
        }
    }

    pub fn engine(&self) -> EngineConfig {
        self.engine.read().clone()
    }

    pub fn jackpot(&self) -> JackpotConfig {
        self.jackpot.read().clone()
    }

    /// Re-read the file and swap the policy sections.
    pub fn reload(&self) -> Result<()> {
        let fresh = AppConfig::load(&self.path)?;
        *self.engine.write() = fresh.engine;
        *self.jackpot.write() = fresh.jackpot;
        info!(path = %self.path, "configuration reloaded");
        Ok(())
    }

    /// Replace the engine section directly (admin updates, tests).
    pub fn set_engine(&self, engine: EngineConfig) {
        *self.engine.write() = engine;
    }
}
