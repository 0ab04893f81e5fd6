//! Jackpot engine: probability-gated bonus payouts
//!
//! Runs after the main draw with the same bet set. Each qualifying bet
//! gets an independent secure coin against the configured jackpot
//! probability; winners are capped per period. Jackpot failures never
//! fail the draw.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info};

use crate::rng::NumberGenerator;
use crate::types::{Bet, Digits, JackpotAward};

/// Jackpot policy knobs. Hot-reloadable with the rest of the config.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct JackpotConfig {
    /// Per-bet probability of a bonus award
    #[serde(default = "default_probability")]
    pub probability: f64,
    /// Bonus multiplier applied to the bet stake
    #[serde(default = "default_multiplier")]
    pub multiplier: Decimal,
    /// Cap on awards in a single period
    #[serde(default = "default_max_winners")]
    pub max_winners_per_period: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_probability() -> f64 {
    1.0 / 10_000_000.0
}

fn default_multiplier() -> Decimal {
    Decimal::from(100)
}

fn default_max_winners() -> u32 {
    1
}

fn default_enabled() -> bool {
    true
}

impl Default for JackpotConfig {
    fn default() -> Self {
        Self {
            probability: default_probability(),
            multiplier: default_multiplier(),
            max_winners_per_period: default_max_winners(),
            enabled: default_enabled(),
        }
    }
}

pub struct JackpotEngine {
    generator: Arc<NumberGenerator>,
}

impl JackpotEngine {
    pub fn new(generator: Arc<NumberGenerator>) -> Self {
        Self { generator }
    }

    /// Evaluate the bonus for one period. `digits` is the drawn number;
    /// it rides along for logging only. The jackpot gate is purely
    /// probabilistic and independent of the draw outcome.
    pub fn evaluate(
        &self,
        period_id: &str,
        digits: &Digits,
        bets: &[Bet],
        config: &JackpotConfig,
    ) -> Vec<JackpotAward> {
        if !config.enabled || bets.is_empty() {
            return Vec::new();
        }

        let mut awards = Vec::new();
        for bet in bets {
            if awards.len() as u32 >= config.max_winners_per_period {
                debug!(period_id, "jackpot winner cap reached");
                break;
            }
            if self.generator.unit() < config.probability {
                let amount = bet.amount * config.multiplier;
                info!(
                    period_id,
                    bet_id = %bet.id,
                    %amount,
                    digits = ?digits,
                    "jackpot awarded"
                );
                awards.push(JackpotAward {
                    bet_id: bet.id,
                    period_id: period_id.to_string(),
                    amount,
                    awarded_at: Utc::now(),
                });
            }
        }
        awards
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SeededRandom;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn engine(seed: u64) -> JackpotEngine {
        JackpotEngine::new(Arc::new(NumberGenerator::new(Box::new(SeededRandom::new(
            seed,
        )))))
    }

    fn bet(amount: Decimal) -> Bet {
        Bet {
            id: Uuid::new_v4(),
            period_id: "202501010000".to_string(),
            game_type: "number".to_string(),
            content: None,
            amount,
            odds: dec!(2),
            placed_at: Utc::now(),
        }
    }

    #[test]
    fn test_default_probability_never_fires_in_practice() {
        let e = engine(1);
        let config = JackpotConfig::default();
        let bets: Vec<Bet> = (0..100).map(|_| bet(dec!(10))).collect();
        for _ in 0..100 {
            assert!(e
                .evaluate("202501010000", &[1, 2, 3, 4, 5], &bets, &config)
                .is_empty());
        }
    }

    #[test]
    fn test_certain_probability_awards_up_to_cap() {
        let e = engine(2);
        let config = JackpotConfig {
            probability: 1.0,
            multiplier: dec!(100),
            max_winners_per_period: 2,
            enabled: true,
        };
        let bets: Vec<Bet> = (0..5).map(|_| bet(dec!(10))).collect();
        let awards = e.evaluate("202501010000", &[1, 2, 3, 4, 5], &bets, &config);
        assert_eq!(awards.len(), 2);
        assert!(awards.iter().all(|a| a.amount == dec!(1000)));
        assert_eq!(awards[0].bet_id, bets[0].id);
        assert_eq!(awards[1].bet_id, bets[1].id);
    }

    #[test]
    fn test_disabled_awards_nothing() {
        let e = engine(3);
        let config = JackpotConfig {
            probability: 1.0,
            enabled: false,
            ..JackpotConfig::default()
        };
        let awards = e.evaluate("202501010000", &[0; 5], &[bet(dec!(10))], &config);
        assert!(awards.is_empty());
    }

    #[test]
    fn test_empirical_award_rate() {
        let e = engine(4);
        let config = JackpotConfig {
            probability: 0.1,
            multiplier: dec!(10),
            max_winners_per_period: 1000,
            enabled: true,
        };
        let bets: Vec<Bet> = (0..10_000).map(|_| bet(dec!(1))).collect();
        let awards = e.evaluate("202501010000", &[9, 9, 9, 9, 9], &bets, &config);
        let rate = awards.len() as f64 / 10_000.0;
        assert!((rate - 0.1).abs() < 0.02, "award rate {rate}");
    }

    #[test]
    fn test_config_defaults() {
        let config: JackpotConfig = toml::from_str("").unwrap();
        assert_eq!(config, JackpotConfig::default());
    }
}
