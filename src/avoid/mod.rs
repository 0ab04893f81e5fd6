//! Avoid-win engine: steers the draw away from outstanding winning numbers
//!
//! For every open bet the engine expands the set of 5-digit numbers that
//! would make it win, unions them, then draws one secure coin against the
//! configured allow-win probability. Below the threshold the members are
//! allowed to win (draw taken from the set); otherwise the draw comes from
//! the complement. Expansion runs under a hard wall-clock budget and the
//! whole pipeline degrades to a plain uniform draw on failure; a number
//! is always produced.

mod winning_set;

#[cfg(test)]
mod tests;

pub use winning_set::{content_matches, expand_bet, WinningSet};

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::rng::NumberGenerator;
use crate::types::{
    digits_to_index, index_to_digits, AvoidWinDecision, Bet, DecisionKind, Digits, DRAW_SPACE,
};

/// Bounded attempts for complement rejection sampling.
const REJECTION_ATTEMPTS: u32 = 1000;

/// How many avoided numbers to keep in the audit row.
const AUDIT_SAMPLE_SIZE: usize = 10;

/// Knobs for one analysis run. Snapshotted from the hot-reloadable engine
/// config at draw time.
#[derive(Debug, Clone)]
pub struct AvoidWinParams {
    /// Probability of letting members win this period
    pub allow_win_probability: f64,
    /// Bets below this stake are ignored by the expansion
    pub min_bet_amount: Decimal,
    /// Hard wall-clock budget for the expansion step
    pub max_analysis_duration: Duration,
}

/// Result of one analysis run.
#[derive(Debug)]
pub struct Analysis {
    pub set: WinningSet,
    pub bets_considered: usize,
    pub timed_out: bool,
}

pub struct AvoidWinEngine {
    generator: Arc<NumberGenerator>,
}

impl AvoidWinEngine {
    pub fn new(generator: Arc<NumberGenerator>) -> Self {
        Self { generator }
    }

    /// Expand all qualifying bets into one winning-number set, honoring the
    /// time budget. On overrun the partial set is returned and the draw
    /// proceeds with it.
    pub fn analyze(&self, bets: &[Bet], params: &AvoidWinParams) -> Analysis {
        let deadline = Instant::now() + params.max_analysis_duration;
        let mut set = WinningSet::new();
        let mut considered = 0usize;

        for bet in bets {
            if bet.amount < params.min_bet_amount {
                continue;
            }
            let Some(content) = &bet.content else {
                // Unknown game types settle as losses; nothing to avoid
                continue;
            };
            considered += 1;
            if Instant::now() >= deadline || !expand_bet(content, &mut set, deadline) {
                warn!(
                    budget_ms = params.max_analysis_duration.as_millis() as u64,
                    bets_considered = considered,
                    set_size = set.len(),
                    "analysis budget exhausted, proceeding with partial winning set"
                );
                return Analysis {
                    set,
                    bets_considered: considered,
                    timed_out: true,
                };
            }
        }

        Analysis {
            set,
            bets_considered: considered,
            timed_out: false,
        }
    }

    /// Full selection pipeline for one period: analyze, decide, audit.
    pub fn select_draw(
        &self,
        period_id: &str,
        bets: &[Bet],
        params: &AvoidWinParams,
    ) -> (Digits, AvoidWinDecision) {
        let started = Instant::now();
        let analysis = self.analyze(bets, params);
        let set = &analysis.set;

        let coin = self.generator.unit();
        let threshold = params.allow_win_probability;

        let (digits, kind) = if coin < threshold && !set.is_empty() {
            (self.pick_from_set(set), DecisionKind::Allowed)
        } else if set.is_empty() {
            // Nothing to avoid; trivial case
            (self.generator.generate_valid(), DecisionKind::Avoided)
        } else if set.is_full() {
            // Every number pays out; accept the risk with a uniform draw
            warn!(period_id, "winning set covers the whole space");
            (self.generator.generate_valid(), DecisionKind::Fallback)
        } else {
            self.pick_from_complement(set)
        };

        let decision = AvoidWinDecision {
            period_id: period_id.to_string(),
            kind,
            coin,
            threshold,
            winning_set_size: set.len(),
            analysis_ms: started.elapsed().as_millis() as u64,
            digits,
            avoided_sample: set.sample(AUDIT_SAMPLE_SIZE),
            decided_at: Utc::now(),
        };

        info!(
            period_id,
            decision = kind.as_str(),
            set_size = set.len(),
            bets = analysis.bets_considered,
            timed_out = analysis.timed_out,
            analysis_ms = decision.analysis_ms,
            "draw selected"
        );

        (digits, decision)
    }

    /// Plain uniform draw when the analysis pipeline itself broke (e.g. the
    /// bet ledger was unreachable). The draw must still happen.
    pub fn fallback_draw(&self, period_id: &str, reason: &str) -> (Digits, AvoidWinDecision) {
        warn!(period_id, reason, "avoid-win analysis failed, uniform fallback");
        let digits = self.generator.generate_valid();
        let decision = AvoidWinDecision {
            period_id: period_id.to_string(),
            kind: DecisionKind::AnalysisFailed,
            coin: 0.0,
            threshold: 0.0,
            winning_set_size: 0,
            analysis_ms: 0,
            digits,
            avoided_sample: Vec::new(),
            decided_at: Utc::now(),
        };
        (digits, decision)
    }

    /// Uniform member of the winning set, by rank.
    fn pick_from_set(&self, set: &WinningSet) -> Digits {
        let rank = self.generator.below(set.len());
        // rank < len, so a member always exists
        let index = set.nth_member(rank).unwrap_or(0);
        index_to_digits(index)
    }

    /// Uniform draw outside the set: bounded rejection sampling first, then
    /// exact complement enumeration. Deterministic and exact for any
    /// non-full set.
    fn pick_from_complement(&self, set: &WinningSet) -> (Digits, DecisionKind) {
        for _ in 0..REJECTION_ATTEMPTS {
            let candidate = self.generator.generate_valid();
            if !set.contains(digits_to_index(&candidate)) {
                return (candidate, DecisionKind::Avoided);
            }
        }

        // Dense set; enumerate the complement exactly
        let complement_size = DRAW_SPACE - set.len();
        debug!(complement_size, "rejection sampling exhausted, enumerating complement");
        let rank = self.generator.below(complement_size);
        match set.nth_non_member(rank) {
            Some(index) => (index_to_digits(index), DecisionKind::Fallback),
            None => (self.generator.generate_valid(), DecisionKind::Fallback),
        }
    }
}
