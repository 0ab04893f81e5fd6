//! Odds cache: read-through, TTL-refreshed multiplier table
//!
//! Lookups never block on a refresh: the table lives behind an
//! `Arc` snapshot that is swapped wholesale, so readers see either the
//! old table or the new one, never a partially updated map.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::types::GameType;

/// One row of the persisted odds table.
#[derive(Debug, Clone, PartialEq)]
pub struct OddsEntry {
    pub game_type: GameType,
    pub bet_type: String,
    pub multiplier: Decimal,
    pub active: bool,
}

/// Source of truth for the odds table (persistent storage).
#[async_trait]
pub trait OddsSource: Send + Sync {
    async fn load_odds(&self) -> Result<Vec<OddsEntry>>;
}

type OddsTable = HashMap<(GameType, String), Decimal>;

pub struct OddsCache {
    source: Arc<dyn OddsSource>,
    table: RwLock<Arc<OddsTable>>,
    loaded_at: RwLock<Option<Instant>>,
    ttl: Duration,
}

impl OddsCache {
    pub fn new(source: Arc<dyn OddsSource>, ttl: Duration) -> Self {
        Self {
            source,
            table: RwLock::new(Arc::new(HashMap::new())),
            loaded_at: RwLock::new(None),
            ttl,
        }
    }

    /// Multiplier for `(game_type, bet_type)`. Missing or inactive entries
    /// fall back to 1.0 with a warning.
    pub fn get(&self, game_type: GameType, bet_type: &str) -> Decimal {
        let table = self.table.read().clone();
        match table.get(&(game_type, bet_type.to_string())) {
            Some(multiplier) => *multiplier,
            None => {
                warn!(%game_type, bet_type, "no odds configured, defaulting to 1.0");
                Decimal::ONE
            }
        }
    }

    /// Full table snapshot for the status API.
    pub fn snapshot(&self) -> Arc<OddsTable> {
        self.table.read().clone()
    }

    pub fn is_stale(&self) -> bool {
        match *self.loaded_at.read() {
            Some(at) => at.elapsed() > self.ttl,
            None => true,
        }
    }

    /// Drop the freshness marker so the next `ensure_fresh` reloads.
    /// Called after an admin odds update.
    pub fn invalidate(&self) {
        *self.loaded_at.write() = None;
        debug!("odds cache invalidated");
    }

    /// Reload the whole table from storage and swap it in atomically.
    pub async fn refresh(&self) -> Result<()> {
        let entries = self.source.load_odds().await?;
        let mut table = OddsTable::with_capacity(entries.len());
        for entry in entries {
            if entry.active {
                table.insert((entry.game_type, entry.bet_type), entry.multiplier);
            }
        }
        let size = table.len();
        *self.table.write() = Arc::new(table);
        *self.loaded_at.write() = Some(Instant::now());
        info!(entries = size, "odds table refreshed");
        Ok(())
    }

    /// Refresh only when the TTL has lapsed.
    pub async fn ensure_fresh(&self) -> Result<()> {
        if self.is_stale() {
            self.refresh().await?;
        }
        Ok(())
    }
}
