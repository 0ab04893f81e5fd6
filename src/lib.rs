//! Five-Digit Lottery Draw Engine
//!
//! A draw-cycle engine that issues a new drawable period every minute,
//! derives the full attribute profile of each draw, settles bets against
//! it, and steers the drawn number so the operator's payout exposure stays
//! bounded to a configured probability.
//!
//! ## Architecture
//!
//! ```text
//! Clock (period ids) → Scheduler (1s ticks) → AvoidWin (winning-set analysis)
//!                                                  ↓
//!                        Store (tx) ← Evaluator ← Profile (derived attributes)
//!                            ↓
//!                      Jackpot (bonus pass)
//! ```

pub mod avoid;
pub mod clock;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod jackpot;
pub mod odds;
pub mod profile;
pub mod rng;
pub mod scheduler;
pub mod store;
pub mod types;
