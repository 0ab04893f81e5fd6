//! Period scheduler: the 1-second tick loop driving the draw cycle
//!
//! A single cooperative loop advances periods in strict time order. Each
//! tick recomputes the countdown for the active period and, once its draw
//! time has passed, runs avoid-win selection, result derivation, batch
//! settlement and transactional persistence, then the jackpot pass, then
//! advances the clock. An idempotency check guards against double draws
//! when a tick is delayed or re-entered. Per-period failures are logged
//! and retried up to a bound; the loop itself never dies.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::avoid::AvoidWinEngine;
use crate::clock;
use crate::config::ConfigHandle;
use crate::error::{EngineError, Result};
use crate::evaluator;
use crate::jackpot::JackpotEngine;
use crate::odds::OddsCache;
use crate::profile;
use crate::rng::NumberGenerator;
use crate::store::{BetLedger, DrawStore};
use crate::types::{format_digits, Countdown, Digits, Draw, PeriodStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Counting,
    Drawing,
    Settled,
}

pub struct PeriodScheduler {
    config: ConfigHandle,
    avoid: AvoidWinEngine,
    jackpot: JackpotEngine,
    ledger: Arc<dyn BetLedger>,
    store: Arc<dyn DrawStore>,
    odds: Arc<OddsCache>,
    state: Mutex<SchedulerState>,
    /// Period currently counting down; empty until the first tick
    active: Mutex<String>,
    /// Persistence attempts for the active period
    attempts: Mutex<(String, u32)>,
    countdown_tx: watch::Sender<Option<Countdown>>,
    stop_tx: watch::Sender<bool>,
}

impl PeriodScheduler {
    pub fn new(
        config: ConfigHandle,
        generator: Arc<NumberGenerator>,
        ledger: Arc<dyn BetLedger>,
        store: Arc<dyn DrawStore>,
        odds: Arc<OddsCache>,
    ) -> Self {
        let (countdown_tx, _) = watch::channel(None);
        let (stop_tx, _) = watch::channel(false);
        Self {
            config,
            avoid: AvoidWinEngine::new(generator.clone()),
            jackpot: JackpotEngine::new(generator),
            ledger,
            store,
            odds,
            state: Mutex::new(SchedulerState::Idle),
            active: Mutex::new(String::new()),
            attempts: Mutex::new((String::new(), 0)),
            countdown_tx,
            stop_tx,
        }
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.lock()
    }

    /// Subscribe to per-tick countdown snapshots.
    pub fn countdown(&self) -> watch::Receiver<Option<Countdown>> {
        self.countdown_tx.subscribe()
    }

    /// Whether betting is currently open for the active period.
    pub fn can_bet(&self) -> bool {
        self.countdown_tx
            .borrow()
            .as_ref()
            .map(|c| c.can_bet)
            .unwrap_or(false)
    }

    /// When betting closes for the active period.
    pub fn bet_close_time(&self) -> Option<DateTime<Utc>> {
        self.countdown_tx.borrow().as_ref().map(|c| c.bet_close_time)
    }

    /// Request a stop. Takes effect between ticks; no in-flight draw is
    /// interrupted.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    /// Run the tick loop until `stop()` is called.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut stop_rx = self.stop_tx.subscribe();
        *self.state.lock() = SchedulerState::Counting;
        info!("period scheduler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.tick(Utc::now()).await {
                        // Per-period failures must not kill the loop
                        error!(error = %e, "tick failed");
                    }
                }
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
            }
        }

        *self.state.lock() = SchedulerState::Idle;
        info!("period scheduler stopped");
    }

    /// One scheduler tick at `now`. Draws every period whose draw time has
    /// passed, in order, then publishes the countdown for the active one.
    pub(crate) async fn tick(&self, now: DateTime<Utc>) -> Result<()> {
        if let Err(e) = self.odds.ensure_fresh().await {
            warn!(error = %e, "odds refresh failed, serving cached table");
        }

        let mut active = {
            let mut guard = self.active.lock();
            if guard.is_empty() {
                *guard = clock::current_period(now);
            }
            guard.clone()
        };

        loop {
            let draw_time = clock::draw_time(&active)?;
            if now < draw_time {
                break;
            }

            let engine_config = self.config.engine();
            if engine_config.system_enabled {
                if let Err(e) = self.execute_draw(&active, None, now).await {
                    if self.should_retry(&active, engine_config.max_draw_attempts) {
                        warn!(period_id = %active, error = %e, "draw failed, will retry next tick");
                        self.publish_countdown(&active, now)?;
                        return Err(e);
                    }
                    // Surfaced to operational monitoring; the clock moves on
                    error!(
                        period_id = %active,
                        error = %e,
                        "draw abandoned after retry budget, advancing"
                    );
                }
            } else {
                debug!(period_id = %active, "system disabled, leaving period pending");
            }

            active = clock::next_period(&active)?;
            *self.active.lock() = active.clone();
            *self.state.lock() = SchedulerState::Counting;
        }

        self.publish_countdown(&active, now)
    }

    fn publish_countdown(&self, period_id: &str, now: DateTime<Utc>) -> Result<()> {
        let engine_config = self.config.engine();
        let draw_time = clock::draw_time(period_id)?;
        let bet_close_time = draw_time - Duration::seconds(engine_config.bet_cutoff_secs);
        let countdown = Countdown {
            period_id: period_id.to_string(),
            draw_time,
            remaining_seconds: (draw_time - now).num_seconds().max(0),
            is_active: engine_config.system_enabled,
            can_bet: engine_config.system_enabled && now < bet_close_time,
            bet_close_time,
        };
        // send_replace stores the value even with no live subscribers, so
        // can_bet/bet_close_time stay correct before anyone subscribes
        self.countdown_tx.send_replace(Some(countdown));
        Ok(())
    }

    /// True while the period still has retry budget; bumps the counter.
    fn should_retry(&self, period_id: &str, max_attempts: u32) -> bool {
        let mut attempts = self.attempts.lock();
        if attempts.0 != period_id {
            *attempts = (period_id.to_string(), 0);
        }
        attempts.1 += 1;
        attempts.1 < max_attempts
    }

    /// Manual/forced draw. With explicit digits the avoid-win step is
    /// bypassed; without them the normal selection runs. A duplicate draw
    /// is a logged no-op returning the existing record.
    pub async fn force_draw(&self, period_id: &str, digits: Option<Digits>) -> Result<Draw> {
        clock::parse(period_id)?;
        if let Some(digits) = &digits {
            if digits.iter().any(|&d| d > 9) {
                return Err(EngineError::InvalidManualDraw(format!(
                    "digits out of range: {digits:?}"
                )));
            }
        }
        match self.execute_draw(period_id, digits, Utc::now()).await? {
            DrawOutcome::Drawn(draw) | DrawOutcome::AlreadyDrawn(draw) => Ok(draw),
        }
    }

    /// The full draw pipeline for one period: idempotency check, avoid-win
    /// selection, profile derivation, batch settlement, transactional
    /// persistence, audit row, jackpot pass.
    async fn execute_draw(
        &self,
        period_id: &str,
        manual_digits: Option<Digits>,
        now: DateTime<Utc>,
    ) -> Result<DrawOutcome> {
        // Idempotency guard: a delayed or re-entrant tick must not draw twice
        if let Some(existing) = self.store.get_draw(period_id).await? {
            warn!(period_id, "{}", EngineError::DuplicateDraw(period_id.to_string()));
            return Ok(DrawOutcome::AlreadyDrawn(existing));
        }

        *self.state.lock() = SchedulerState::Drawing;
        let engine_config = self.config.engine();

        let (bets, fetch_failed) = match self.ledger.bets_for_period(period_id).await {
            Ok(bets) => (bets, false),
            Err(e) => {
                warn!(period_id, error = %e, "bet ledger unreachable");
                (Vec::new(), true)
            }
        };

        let (digits, decision) = match manual_digits {
            Some(digits) => {
                info!(period_id, digits = %format_digits(&digits), "manual draw digits supplied");
                (digits, None)
            }
            None if fetch_failed => {
                let (digits, decision) =
                    self.avoid.fallback_draw(period_id, "bet ledger unreachable");
                (digits, Some(decision))
            }
            None => {
                let params = engine_config.avoid_params();
                let (digits, decision) = self.avoid.select_draw(period_id, &bets, &params);
                (digits, Some(decision))
            }
        };

        let result_profile = profile::derive(&digits);
        let batch = evaluator::evaluate_batch(&bets, &result_profile);
        let draw = Draw {
            period_id: period_id.to_string(),
            digits,
            profile: result_profile,
            drawn_at: now,
            status: PeriodStatus::Drawn,
        };

        self.store.persist_draw(&draw, &batch.settlements).await?;

        if let Some(decision) = &decision {
            // Audit only; a failed insert must not undo the draw
            if let Err(e) = self.store.record_decision(decision).await {
                warn!(period_id, error = %e, "failed to record avoid-win decision");
            }
        }

        let jackpot_config = self.config.jackpot();
        let awards = self
            .jackpot
            .evaluate(period_id, &digits, &bets, &jackpot_config);
        if !awards.is_empty() {
            if let Err(e) = self.store.record_jackpot(&awards).await {
                warn!(period_id, error = %e, "failed to record jackpot awards");
            }
        }

        *self.state.lock() = SchedulerState::Settled;
        info!(
            period_id,
            digits = %format_digits(&digits),
            decision = decision.as_ref().map(|d| d.kind.as_str()).unwrap_or("manual"),
            bets = batch.total_bets,
            wins = batch.wins,
            total_stake = %batch.total_stake,
            total_payout = %batch.total_payout,
            jackpots = awards.len(),
            "period drawn and settled"
        );

        Ok(DrawOutcome::Drawn(draw))
    }
}

enum DrawOutcome {
    Drawn(Draw),
    AlreadyDrawn(Draw),
}
