//! Win evaluator: settles bets against a derived result profile
//!
//! A total dispatch over the typed bet content. A bet whose content failed
//! to parse (unknown game type in the ledger) is not an error: it logs and
//! settles as a loss, so a misconfigured bet type can never silently pay
//! out.


use rust_decimal::Decimal;
use tracing::warn;

use crate::types::{
    format_digits, BatchSettlement, Bet, BetContent, BigSmall, FaceAttribute, Parity,
    ResultProfile, Settlement,
};

/// Evaluate one bet against one result profile.
pub fn evaluate(bet: &Bet, profile: &ResultProfile) -> Settlement {
    let (is_win, description) = match &bet.content {
        Some(content) => settle_content(content, profile),
        None => {
            warn!(
                bet_id = %bet.id,
                game_type = %bet.game_type,
                "unknown game type, settling as loss"
            );
            (false, format!("unknown game type {:?}", bet.game_type))
        }
    };

    let win_amount = if is_win {
        bet.amount * bet.odds
    } else {
        Decimal::ZERO
    };

    Settlement {
        bet_id: bet.id,
        period_id: bet.period_id.clone(),
        is_win,
        win_amount,
        description,
    }
}

/// Evaluate a batch of bets against one profile with aggregate stats.
pub fn evaluate_batch(bets: &[Bet], profile: &ResultProfile) -> BatchSettlement {
    let mut settlements = Vec::with_capacity(bets.len());
    let mut wins = 0usize;
    let mut total_stake = Decimal::ZERO;
    let mut total_payout = Decimal::ZERO;

    for bet in bets {
        let settlement = evaluate(bet, profile);
        if settlement.is_win {
            wins += 1;
        }
        total_stake += bet.amount;
        total_payout += settlement.win_amount;
        settlements.push(settlement);
    }

    let win_rate = if bets.is_empty() {
        Decimal::ZERO
    } else {
        Decimal::from(wins) / Decimal::from(bets.len())
    };

    BatchSettlement {
        settlements,
        total_bets: bets.len(),
        wins,
        win_rate,
        total_stake,
        total_payout,
    }
}

/// Whether a typed bet wins against the profile. Shared with the avoid-win
/// expansion step, which must agree with settlement exactly.
pub fn content_wins(content: &BetContent, profile: &ResultProfile) -> bool {
    settle_content(content, profile).0
}

fn settle_content(content: &BetContent, profile: &ResultProfile) -> (bool, String) {
    match content {
        BetContent::Number { digits } => (
            *digits == profile.digits,
            format!(
                "number {} vs draw {}",
                format_digits(digits),
                format_digits(&profile.digits)
            ),
        ),
        BetContent::DoubleFace {
            position,
            attribute,
        } => settle_double_face(*position, *attribute, profile),
        BetContent::Positioning { picks } => {
            let valid = !picks.is_empty()
                && picks.len() <= 3
                && picks.iter().all(|p| p.position < 5 && p.digit <= 9);
            if !valid {
                warn!(?picks, "malformed positioning bet, settling as loss");
                return (false, "malformed positioning bet".to_string());
            }
            let is_win = picks
                .iter()
                .all(|p| profile.digits[p.position as usize] == p.digit);
            let desc: Vec<String> = picks
                .iter()
                .map(|p| format!("P{}={}", p.position + 1, p.digit))
                .collect();
            (is_win, format!("positioning {}", desc.join(",")))
        }
        BetContent::Span { window, value } => {
            if *window > 2 {
                warn!(window, "span window out of range, settling as loss");
                return (false, format!("invalid span window {window}"));
            }
            let actual = profile.spans[*window as usize];
            (
                actual == *value,
                format!("span window {} = {} vs {}", window, actual, value),
            )
        }
        BetContent::DragonTiger { pick } => (
            *pick == profile.dragon_tiger,
            format!("dragon/tiger {:?} vs {:?}", pick, profile.dragon_tiger),
        ),
        BetContent::Bull { hand } => (
            *hand == profile.bull,
            format!("bull {:?} vs {:?}", hand, profile.bull),
        ),
        BetContent::Poker { hand } => (
            *hand == profile.poker,
            format!("poker {:?} vs {:?}", hand, profile.poker),
        ),
    }
}

fn settle_double_face(
    position: Option<u8>,
    attribute: FaceAttribute,
    profile: &ResultProfile,
) -> (bool, String) {
    match position {
        None => {
            let is_win = match attribute {
                FaceAttribute::Big => profile.sum_big_small == BigSmall::Big,
                FaceAttribute::Small => profile.sum_big_small == BigSmall::Small,
                FaceAttribute::Odd => profile.sum_parity == Parity::Odd,
                FaceAttribute::Even => profile.sum_parity == Parity::Even,
                FaceAttribute::Prime | FaceAttribute::Composite => {
                    // Primality is a per-digit attribute only
                    warn!("prime/composite bet on sum, settling as loss");
                    return (false, "prime attribute not defined on sum".to_string());
                }
            };
            (is_win, format!("sum {:?} (sum={})", attribute, profile.sum))
        }
        Some(p) if p < 5 => {
            let digit = &profile.positions[p as usize];
            let is_win = match attribute {
                FaceAttribute::Big => digit.big_small == BigSmall::Big,
                FaceAttribute::Small => digit.big_small == BigSmall::Small,
                FaceAttribute::Odd => digit.parity == Parity::Odd,
                FaceAttribute::Even => digit.parity == Parity::Even,
                FaceAttribute::Prime => digit.prime,
                FaceAttribute::Composite => !digit.prime,
            };
            (
                is_win,
                format!("P{} {:?} (digit={})", p + 1, attribute, digit.value),
            )
        }
        Some(p) => {
            warn!(position = p, "double-face position out of range, settling as loss");
            (false, format!("invalid position {p}"))
        }
    }
}
