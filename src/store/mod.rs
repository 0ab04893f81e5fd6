//! SQLite persistence and the external ledger seam
//!
//! `BetLedger` is where bet records come from and settlement outcomes go
//! back to (an external collaborator in production); `DrawStore` owns the
//! draw, decision and jackpot records. A draw and its settlements commit
//! in one transaction: either everything lands or nothing does.


use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::odds::{OddsEntry, OddsSource};
use crate::types::{
    format_digits, parse_digits, AvoidWinDecision, Bet, BetContent, Draw, GameType,
    JackpotAward, PeriodStatus, ResultProfile, Settlement,
};

/// Source of bet records for a period.
#[async_trait]
pub trait BetLedger: Send + Sync {
    async fn bets_for_period(&self, period_id: &str) -> Result<Vec<Bet>>;
}

/// Sink for draws, settlements and audit records.
#[async_trait]
pub trait DrawStore: Send + Sync {
    async fn draw_exists(&self, period_id: &str) -> Result<bool>;
    /// Persist the draw, its settlements and the ledger outcome updates in
    /// one transaction.
    async fn persist_draw(&self, draw: &Draw, settlements: &[Settlement]) -> Result<()>;
    async fn record_decision(&self, decision: &AvoidWinDecision) -> Result<()>;
    async fn record_jackpot(&self, awards: &[JackpotAward]) -> Result<()>;
    async fn get_draw(&self, period_id: &str) -> Result<Option<Draw>>;
    async fn latest_draws(&self, limit: u32) -> Result<Vec<Draw>>;
    /// Draws for one UTC date, newest first, paginated.
    async fn draw_history(&self, date: NaiveDate, page: u32, page_size: u32)
        -> Result<Vec<Draw>>;
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Fresh in-memory database. Tests and dry runs. A single pinned
    /// connection: every pooled connection to `:memory:` would otherwise
    /// get its own empty database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(&self) -> Result<()> {
        let statements = [
            "CREATE TABLE IF NOT EXISTS bets (
                id TEXT PRIMARY KEY,
                period_id TEXT NOT NULL,
                game_type TEXT NOT NULL,
                content TEXT,
                amount TEXT NOT NULL,
                odds TEXT NOT NULL,
                placed_at TEXT NOT NULL,
                is_win INTEGER,
                win_amount TEXT
            )",
            "CREATE INDEX IF NOT EXISTS idx_bets_period ON bets(period_id)",
            "CREATE TABLE IF NOT EXISTS draws (
                period_id TEXT PRIMARY KEY,
                digits TEXT NOT NULL,
                profile TEXT NOT NULL,
                drawn_at TEXT NOT NULL,
                status TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS settlements (
                bet_id TEXT PRIMARY KEY,
                period_id TEXT NOT NULL,
                is_win INTEGER NOT NULL,
                win_amount TEXT NOT NULL,
                description TEXT NOT NULL,
                settled_at TEXT NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_settlements_period ON settlements(period_id)",
            "CREATE TABLE IF NOT EXISTS odds_config (
                game_type TEXT NOT NULL,
                bet_type TEXT NOT NULL,
                multiplier TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                PRIMARY KEY (game_type, bet_type)
            )",
            "CREATE TABLE IF NOT EXISTS avoid_decisions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                period_id TEXT NOT NULL,
                decision TEXT NOT NULL,
                coin REAL NOT NULL,
                threshold REAL NOT NULL,
                winning_set_size INTEGER NOT NULL,
                analysis_ms INTEGER NOT NULL,
                digits TEXT NOT NULL,
                avoided_sample TEXT NOT NULL,
                decided_at TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS jackpot_awards (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                bet_id TEXT NOT NULL,
                period_id TEXT NOT NULL,
                amount TEXT NOT NULL,
                awarded_at TEXT NOT NULL
            )",
        ];
        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert a bet row. In production the ledger is written by the betting
    /// API; this exists for fixtures and manual testing.
    pub async fn insert_bet(&self, bet: &Bet) -> Result<()> {
        let content = bet
            .content
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        sqlx::query(
            "INSERT INTO bets (id, period_id, game_type, content, amount, odds, placed_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(bet.id.to_string())
        .bind(&bet.period_id)
        .bind(&bet.game_type)
        .bind(content)
        .bind(bet.amount.to_string())
        .bind(bet.odds.to_string())
        .bind(bet.placed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Upsert one odds row and leave the cache invalidation to the caller.
    pub async fn upsert_odds(&self, entry: &OddsEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO odds_config (game_type, bet_type, multiplier, active)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (game_type, bet_type)
             DO UPDATE SET multiplier = excluded.multiplier, active = excluded.active",
        )
        .bind(entry.game_type.as_str())
        .bind(&entry.bet_type)
        .bind(entry.multiplier.to_string())
        .bind(entry.active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn row_to_draw(row: &sqlx::sqlite::SqliteRow) -> Result<Draw> {
        let digits_text: String = row.get("digits");
        let profile_text: String = row.get("profile");
        let status_text: String = row.get("status");
        let profile: ResultProfile = serde_json::from_str(&profile_text)?;
        let status = match status_text.as_str() {
            "drawn" => PeriodStatus::Drawn,
            "cancelled" => PeriodStatus::Cancelled,
            _ => PeriodStatus::Pending,
        };
        Ok(Draw {
            period_id: row.get("period_id"),
            digits: parse_digits(&digits_text)
                .map_err(|_| EngineError::PersistenceFailure(format!(
                    "corrupt digits column: {digits_text:?}"
                )))?,
            profile,
            drawn_at: row.get::<DateTime<Utc>, _>("drawn_at"),
            status,
        })
    }
}

fn parse_decimal(text: &str, column: &str) -> Result<Decimal> {
    Decimal::from_str(text)
        .map_err(|e| EngineError::PersistenceFailure(format!("bad {column} value {text:?}: {e}")))
}

#[async_trait]
impl BetLedger for SqliteStore {
    async fn bets_for_period(&self, period_id: &str) -> Result<Vec<Bet>> {
        let rows = sqlx::query(
            "SELECT id, period_id, game_type, content, amount, odds, placed_at
             FROM bets WHERE period_id = ? ORDER BY placed_at",
        )
        .bind(period_id)
        .fetch_all(&self.pool)
        .await?;

        let mut bets = Vec::with_capacity(rows.len());
        for row in rows {
            let id_text: String = row.get("id");
            let id = uuid::Uuid::from_str(&id_text).map_err(|e| {
                EngineError::PersistenceFailure(format!("bad bet id {id_text:?}: {e}"))
            })?;
            let content_text: Option<String> = row.get("content");
            // Unknown game types deserialize to None and settle as losses
            let content: Option<BetContent> = content_text.as_deref().and_then(|text| {
                serde_json::from_str(text)
                    .map_err(|e| {
                        warn!(bet_id = %id, error = %e, "unparseable bet content");
                        e
                    })
                    .ok()
            });
            let amount_text: String = row.get("amount");
            let odds_text: String = row.get("odds");
            bets.push(Bet {
                id,
                period_id: row.get("period_id"),
                game_type: row.get("game_type"),
                content,
                amount: parse_decimal(&amount_text, "amount")?,
                odds: parse_decimal(&odds_text, "odds")?,
                placed_at: row.get::<DateTime<Utc>, _>("placed_at"),
            });
        }
        Ok(bets)
    }
}

#[async_trait]
impl DrawStore for SqliteStore {
    async fn draw_exists(&self, period_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM draws WHERE period_id = ?")
            .bind(period_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn persist_draw(&self, draw: &Draw, settlements: &[Settlement]) -> Result<()> {
        let profile_json = serde_json::to_string(&draw.profile)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO draws (period_id, digits, profile, drawn_at, status)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&draw.period_id)
        .bind(format_digits(&draw.digits))
        .bind(profile_json)
        .bind(draw.drawn_at)
        .bind(draw.status.as_str())
        .execute(&mut *tx)
        .await?;

        for settlement in settlements {
            sqlx::query(
                "INSERT INTO settlements (bet_id, period_id, is_win, win_amount, description, settled_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(settlement.bet_id.to_string())
            .bind(&settlement.period_id)
            .bind(settlement.is_win)
            .bind(settlement.win_amount.to_string())
            .bind(&settlement.description)
            .bind(draw.drawn_at)
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE bets SET is_win = ?, win_amount = ? WHERE id = ?")
                .bind(settlement.is_win)
                .bind(settlement.win_amount.to_string())
                .bind(settlement.bet_id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!(
            period_id = draw.period_id,
            settlements = settlements.len(),
            "draw persisted"
        );
        Ok(())
    }

    async fn record_decision(&self, decision: &AvoidWinDecision) -> Result<()> {
        sqlx::query(
            "INSERT INTO avoid_decisions
             (period_id, decision, coin, threshold, winning_set_size, analysis_ms,
              digits, avoided_sample, decided_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&decision.period_id)
        .bind(decision.kind.as_str())
        .bind(decision.coin)
        .bind(decision.threshold)
        .bind(decision.winning_set_size)
        .bind(decision.analysis_ms as i64)
        .bind(format_digits(&decision.digits))
        .bind(serde_json::to_string(&decision.avoided_sample)?)
        .bind(decision.decided_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_jackpot(&self, awards: &[JackpotAward]) -> Result<()> {
        for award in awards {
            sqlx::query(
                "INSERT INTO jackpot_awards (bet_id, period_id, amount, awarded_at)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(award.bet_id.to_string())
            .bind(&award.period_id)
            .bind(award.amount.to_string())
            .bind(award.awarded_at)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn get_draw(&self, period_id: &str) -> Result<Option<Draw>> {
        let row = sqlx::query(
            "SELECT period_id, digits, profile, drawn_at, status
             FROM draws WHERE period_id = ?",
        )
        .bind(period_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| Self::row_to_draw(&r)).transpose()
    }

    async fn latest_draws(&self, limit: u32) -> Result<Vec<Draw>> {
        let rows = sqlx::query(
            "SELECT period_id, digits, profile, drawn_at, status
             FROM draws ORDER BY period_id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_draw).collect()
    }

    async fn draw_history(
        &self,
        date: NaiveDate,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Draw>> {
        let prefix = format!("{}%", date.format("%Y%m%d"));
        let rows = sqlx::query(
            "SELECT period_id, digits, profile, drawn_at, status
             FROM draws WHERE period_id LIKE ?
             ORDER BY period_id DESC LIMIT ? OFFSET ?",
        )
        .bind(prefix)
        .bind(page_size)
        .bind(page.saturating_mul(page_size))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_draw).collect()
    }
}

#[async_trait]
impl OddsSource for SqliteStore {
    async fn load_odds(&self) -> Result<Vec<OddsEntry>> {
        let rows =
            sqlx::query("SELECT game_type, bet_type, multiplier, active FROM odds_config")
                .fetch_all(&self.pool)
                .await?;
        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let game_type_text: String = row.get("game_type");
            let Some(game_type) = GameType::from_str_opt(&game_type_text) else {
                warn!(game_type = %game_type_text, "unknown game type in odds table");
                continue;
            };
            let multiplier_text: String = row.get("multiplier");
            entries.push(OddsEntry {
                game_type,
                bet_type: row.get("bet_type"),
                multiplier: parse_decimal(&multiplier_text, "multiplier")?,
                active: row.get("active"),
            });
        }
        Ok(entries)
    }
}
