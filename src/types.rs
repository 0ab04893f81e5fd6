//! Core domain types for the draw engine
//!
//! Everything that crosses a module boundary lives here: periods, draws,
//! the derived result profile, bets and their typed content, settlements
//! and the avoid-win audit records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, Result};

/// The five ordered draw digits, P1 (ten-thousands) through P5 (units).
pub type Digits = [u8; 5];

/// Size of the draw space: `00000..=99999`.
pub const DRAW_SPACE: u32 = 100_000;

/// Digits considered prime for the primality attribute. 1 is included
/// by the game rules.
pub const PRIME_DIGITS: [u8; 5] = [1, 2, 3, 5, 7];

/// Convert a number in `0..DRAW_SPACE` to ordered digits.
pub fn index_to_digits(index: u32) -> Digits {
    [
        (index / 10_000 % 10) as u8,
        (index / 1_000 % 10) as u8,
        (index / 100 % 10) as u8,
        (index / 10 % 10) as u8,
        (index % 10) as u8,
    ]
}

/// Inverse of [`index_to_digits`].
pub fn digits_to_index(digits: &Digits) -> u32 {
    digits.iter().fold(0u32, |acc, &d| acc * 10 + d as u32)
}

/// Render digits as the canonical zero-padded 5-character string.
pub fn format_digits(digits: &Digits) -> String {
    digits.iter().map(|d| (b'0' + d) as char).collect()
}

/// Parse caller-supplied digits (manual draw). Exactly 5 characters,
/// each `0-9`.
pub fn parse_digits(s: &str) -> Result<Digits> {
    let bytes = s.as_bytes();
    if bytes.len() != 5 || !bytes.iter().all(|b| b.is_ascii_digit()) {
        return Err(EngineError::InvalidManualDraw(format!(
            "expected exactly 5 digits 0-9, got {s:?}"
        )));
    }
    let mut digits = [0u8; 5];
    for (i, b) in bytes.iter().enumerate() {
        digits[i] = b - b'0';
    }
    Ok(digits)
}

/// Lifecycle status of a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    Pending,
    Drawn,
    Cancelled,
}

impl PeriodStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodStatus::Pending => "pending",
            PeriodStatus::Drawn => "drawn",
            PeriodStatus::Cancelled => "cancelled",
        }
    }
}

/// One minute-long betting-and-draw cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// Identifier encoding `YYYYMMDDHHMM` in UTC
    pub id: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// Draw fires at `window_start + 1 minute` (== `window_end`)
    pub draw_time: DateTime<Utc>,
    pub status: PeriodStatus,
}

/// Big/small attribute. A digit is big at `>= 5`; the sum is big at `>= 23`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BigSmall {
    Big,
    Small,
}

impl BigSmall {
    pub fn of_digit(d: u8) -> Self {
        if d >= 5 {
            BigSmall::Big
        } else {
            BigSmall::Small
        }
    }

    pub fn of_sum(sum: u8) -> Self {
        if sum >= 23 {
            BigSmall::Big
        } else {
            BigSmall::Small
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    Odd,
    Even,
}

impl Parity {
    pub fn of(n: u8) -> Self {
        if n % 2 == 1 {
            Parity::Odd
        } else {
            Parity::Even
        }
    }
}

/// Comparison of P1 against P5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragonTiger {
    Dragon,
    Tiger,
    Tie,
}

/// Outcome of the bull-bull hand search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BullResult {
    NoBull,
    /// Bull 1 through bull 9
    Bull(u8),
    BullBull,
}

/// Poker hand classification of the five digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PokerHand {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    FullHouse,
    FourOfAKind,
    FiveOfAKind,
}

/// Per-position derived attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitProfile {
    pub value: u8,
    pub big_small: BigSmall,
    pub parity: Parity,
    pub prime: bool,
}

/// Full derived attribute profile of a draw. Pure function of the five
/// digits, computed once and stored immutably with the draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultProfile {
    pub digits: Digits,
    /// Sum of all digits, `0..=45`
    pub sum: u8,
    pub sum_big_small: BigSmall,
    pub sum_parity: Parity,
    pub positions: [DigitProfile; 5],
    pub dragon_tiger: DragonTiger,
    pub odd_count: u8,
    pub even_count: u8,
    /// max - min over the windows P1-3, P2-4, P3-5
    pub spans: [u8; 3],
    pub bull: BullResult,
    pub poker: PokerHand,
}

/// A drawn period outcome. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draw {
    pub period_id: String,
    pub digits: Digits,
    pub profile: ResultProfile,
    pub drawn_at: DateTime<Utc>,
    pub status: PeriodStatus,
}

/// Closed enumeration of game families, used as the odds-table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    Number,
    DoubleFace,
    Positioning,
    Span,
    DragonTiger,
    Bull,
    Poker,
}

impl GameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::Number => "number",
            GameType::DoubleFace => "double_face",
            GameType::Positioning => "positioning",
            GameType::Span => "span",
            GameType::DragonTiger => "dragon_tiger",
            GameType::Bull => "bull",
            GameType::Poker => "poker",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "number" => Some(GameType::Number),
            "double_face" => Some(GameType::DoubleFace),
            "positioning" => Some(GameType::Positioning),
            "span" => Some(GameType::Span),
            "dragon_tiger" => Some(GameType::DragonTiger),
            "bull" => Some(GameType::Bull),
            "poker" => Some(GameType::Poker),
            _ => None,
        }
    }
}

impl std::fmt::Display for GameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute a double-face bet targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceAttribute {
    Big,
    Small,
    Odd,
    Even,
    Prime,
    Composite,
}

/// One exact-digit pick for a positioning bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionPick {
    /// Position index, 0 (P1) through 4 (P5)
    pub position: u8,
    pub digit: u8,
}

/// Typed bet payload, one variant per game family. The ledger stores this
/// as tagged JSON; rows with an unknown tag deserialize to `None` on the
/// bet and settle as a loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum BetContent {
    /// Exact match on all five digits
    Number { digits: Digits },
    /// Attribute bet on the sum (`position: None`) or one position
    DoubleFace {
        position: Option<u8>,
        attribute: FaceAttribute,
    },
    /// Exact digits at 1-3 chosen positions
    Positioning { picks: Vec<PositionPick> },
    /// Span value for one 3-digit window (0 = P1-3, 1 = P2-4, 2 = P3-5)
    Span { window: u8, value: u8 },
    DragonTiger { pick: DragonTiger },
    Bull { hand: BullResult },
    Poker { hand: PokerHand },
}

impl BetContent {
    pub fn game_type(&self) -> GameType {
        match self {
            BetContent::Number { .. } => GameType::Number,
            BetContent::DoubleFace { .. } => GameType::DoubleFace,
            BetContent::Positioning { .. } => GameType::Positioning,
            BetContent::Span { .. } => GameType::Span,
            BetContent::DragonTiger { .. } => GameType::DragonTiger,
            BetContent::Bull { .. } => GameType::Bull,
            BetContent::Poker { .. } => GameType::Poker,
        }
    }

    /// Sub-type key for the odds table, e.g. `("double_face", "big")`.
    pub fn odds_key(&self) -> (GameType, String) {
        let bet_type = match self {
            BetContent::Number { .. } => "exact".to_string(),
            BetContent::DoubleFace { attribute, .. } => {
                serde_variant_name(attribute)
            }
            BetContent::Positioning { picks } => format!("pick{}", picks.len()),
            BetContent::Span { value, .. } => format!("span{value}"),
            BetContent::DragonTiger { pick } => match pick {
                DragonTiger::Dragon => "dragon".to_string(),
                DragonTiger::Tiger => "tiger".to_string(),
                DragonTiger::Tie => "tie".to_string(),
            },
            BetContent::Bull { hand } => match hand {
                BullResult::NoBull => "no_bull".to_string(),
                BullResult::Bull(n) => format!("bull{n}"),
                BullResult::BullBull => "bull_bull".to_string(),
            },
            BetContent::Poker { hand } => serde_variant_name(hand),
        };
        (self.game_type(), bet_type)
    }
}

fn serde_variant_name<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// A bet record consumed from the (external) ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub id: Uuid,
    pub period_id: String,
    /// Raw game-type tag as stored by the ledger; kept for audit even when
    /// `content` failed to parse
    pub game_type: String,
    /// `None` when the ledger row carried an unknown or malformed payload
    pub content: Option<BetContent>,
    pub amount: Decimal,
    /// Multiplier copied from the odds table at bet time, never re-read
    pub odds: Decimal,
    pub placed_at: DateTime<Utc>,
}

/// Settlement outcome for one bet against one draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub bet_id: Uuid,
    pub period_id: String,
    pub is_win: bool,
    pub win_amount: Decimal,
    pub description: String,
}

/// Batch settlement result with aggregate stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSettlement {
    pub settlements: Vec<Settlement>,
    pub total_bets: usize,
    pub wins: usize,
    pub win_rate: Decimal,
    pub total_stake: Decimal,
    pub total_payout: Decimal,
}

/// What the avoid-win engine decided for a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    /// Winning set avoided; members cannot win this period
    Avoided,
    /// Coin landed below the allow threshold; draw taken from the winning set
    Allowed,
    /// Rejection sampling exhausted or set degenerate; complement/uniform used
    Fallback,
    /// Analysis pipeline broke; plain uniform draw
    AnalysisFailed,
}

impl DecisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::Avoided => "avoided",
            DecisionKind::Allowed => "allowed",
            DecisionKind::Fallback => "fallback",
            DecisionKind::AnalysisFailed => "analysis_failed",
        }
    }
}

/// Append-only audit row for one avoid-win decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvoidWinDecision {
    pub period_id: String,
    pub kind: DecisionKind,
    /// The uniform coin in `[0,1)` compared against the threshold
    pub coin: f64,
    pub threshold: f64,
    pub winning_set_size: u32,
    pub analysis_ms: u64,
    pub digits: Digits,
    /// Sample of winning numbers that were avoided, for audit
    pub avoided_sample: Vec<u32>,
    pub decided_at: DateTime<Utc>,
}

/// Bonus payout awarded by the jackpot engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JackpotAward {
    pub bet_id: Uuid,
    pub period_id: String,
    pub amount: Decimal,
    pub awarded_at: DateTime<Utc>,
}

/// Countdown snapshot published to observers on every scheduler tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    pub period_id: String,
    pub draw_time: DateTime<Utc>,
    pub remaining_seconds: i64,
    pub is_active: bool,
    /// False once the bet cut-off before the draw has passed
    pub can_bet: bool,
    pub bet_close_time: DateTime<Utc>,
}
