//! Tests for the avoid-win engine

use super::*;
use crate::evaluator;
use crate::profile;
use crate::rng::SeededRandom;
use crate::types::{BetContent, DecisionKind, DragonTiger, FaceAttribute, PositionPick};
use chrono::Utc;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn engine(seed: u64) -> AvoidWinEngine {
    AvoidWinEngine::new(Arc::new(NumberGenerator::new(Box::new(SeededRandom::new(
        seed,
    )))))
}

fn params() -> AvoidWinParams {
    AvoidWinParams {
        allow_win_probability: 1.0 / 59_600_000.0,
        min_bet_amount: dec!(1),
        max_analysis_duration: Duration::from_secs(30),
    }
}

fn bet(content: BetContent, amount: Decimal) -> Bet {
    Bet {
        id: Uuid::new_v4(),
        period_id: "202501010000".to_string(),
        game_type: content.game_type().as_str().to_string(),
        content: Some(content),
        amount,
        odds: dec!(2),
        placed_at: Utc::now(),
    }
}

#[test]
fn test_winning_set_basics() {
    let mut set = WinningSet::new();
    assert!(set.is_empty());
    set.insert(0);
    set.insert(99_999);
    set.insert(38_217);
    set.insert(38_217);
    assert_eq!(set.len(), 3);
    assert!(set.contains(0));
    assert!(set.contains(99_999));
    assert!(set.contains(38_217));
    assert!(!set.contains(1));
}

#[test]
fn test_winning_set_nth_member() {
    let mut set = WinningSet::new();
    for index in [5u32, 100, 70_000] {
        set.insert(index);
    }
    assert_eq!(set.nth_member(0), Some(5));
    assert_eq!(set.nth_member(1), Some(100));
    assert_eq!(set.nth_member(2), Some(70_000));
    assert_eq!(set.nth_member(3), None);
    assert_eq!(set.nth_non_member(0), Some(0));
    assert_eq!(set.nth_non_member(5), Some(6));
}

#[test]
fn test_positioning_bet_expands_to_ten_thousand() {
    // "First digit is 7" wins exactly the 10,000 numbers 70000-79999
    let content = BetContent::Positioning {
        picks: vec![PositionPick {
            position: 0,
            digit: 7,
        }],
    };
    let mut set = WinningSet::new();
    assert!(expand_bet(
        &content,
        &mut set,
        Instant::now() + Duration::from_secs(30)
    ));
    assert_eq!(set.len(), 10_000);
    assert!(set.contains(70_000));
    assert!(set.contains(79_999));
    assert!(!set.contains(69_999));
    assert!(!set.contains(80_000));
}

#[test]
fn test_number_bet_expands_to_single_member() {
    let content = BetContent::Number {
        digits: [3, 8, 2, 1, 7],
    };
    let mut set = WinningSet::new();
    expand_bet(&content, &mut set, Instant::now() + Duration::from_secs(30));
    assert_eq!(set.len(), 1);
    assert!(set.contains(38_217));
}

#[test]
fn test_expansion_agrees_with_evaluator() {
    let contents = [
        BetContent::DoubleFace {
            position: None,
            attribute: FaceAttribute::Big,
        },
        BetContent::DoubleFace {
            position: Some(2),
            attribute: FaceAttribute::Prime,
        },
        BetContent::Span {
            window: 1,
            value: 4,
        },
        BetContent::DragonTiger {
            pick: DragonTiger::Dragon,
        },
        BetContent::Bull {
            hand: crate::types::BullResult::BullBull,
        },
        BetContent::Poker {
            hand: crate::types::PokerHand::Straight,
        },
    ];
    for content in &contents {
        for index in (0..crate::types::DRAW_SPACE).step_by(317) {
            let digits = crate::types::index_to_digits(index);
            let p = profile::derive(&digits);
            assert_eq!(
                content_matches(content, &digits),
                evaluator::content_wins(content, &p),
                "disagreement for {content:?} at {index}"
            );
        }
    }
}

#[test]
fn test_small_bets_skipped() {
    let e = engine(1);
    let mut p = params();
    p.min_bet_amount = dec!(10);
    let analysis = e.analyze(
        &[bet(
            BetContent::DragonTiger {
                pick: DragonTiger::Tie,
            },
            dec!(5),
        )],
        &p,
    );
    assert_eq!(analysis.bets_considered, 0);
    assert!(analysis.set.is_empty());
}

#[test]
fn test_avoided_draw_never_in_winning_set() {
    let e = engine(2);
    let p = params();
    let bets = vec![bet(
        BetContent::Positioning {
            picks: vec![PositionPick {
                position: 0,
                digit: 7,
            }],
        },
        dec!(10),
    )];

    for _ in 0..50 {
        let (digits, decision) = e.select_draw("202501010000", &bets, &p);
        assert_eq!(decision.kind, DecisionKind::Avoided);
        assert_eq!(decision.winning_set_size, 10_000);
        // Default threshold makes an allowed draw astronomically unlikely;
        // the chosen first digit must differ from 7
        assert_ne!(digits[0], 7);
    }
}

#[test]
fn test_allowed_draw_always_in_winning_set() {
    let e = engine(3);
    let mut p = params();
    p.allow_win_probability = 1.0; // force the allow branch
    let bets = vec![bet(
        BetContent::Span {
            window: 0,
            value: 9,
        },
        dec!(10),
    )];

    for _ in 0..20 {
        let (digits, decision) = e.select_draw("202501010000", &bets, &p);
        assert_eq!(decision.kind, DecisionKind::Allowed);
        assert_eq!(profile::span(&digits, 0), 9);
    }
}

#[test]
fn test_empty_period_is_trivially_avoided() {
    let e = engine(4);
    let (digits, decision) = e.select_draw("202501010000", &[], &params());
    assert_eq!(decision.kind, DecisionKind::Avoided);
    assert_eq!(decision.winning_set_size, 0);
    assert!(decision.avoided_sample.is_empty());
    assert!(digits.iter().all(|&d| d <= 9));
}

#[test]
fn test_allow_rate_converges() {
    let e = engine(5);
    let mut p = params();
    p.allow_win_probability = 0.2; // elevated so the rate is measurable
    let bets = vec![bet(
        BetContent::DragonTiger {
            pick: DragonTiger::Dragon,
        },
        dec!(10),
    )];

    let trials = 2_000;
    let allowed = (0..trials)
        .filter(|_| {
            let (_, decision) = e.select_draw("202501010000", &bets, &p);
            decision.kind == DecisionKind::Allowed
        })
        .count();
    let rate = allowed as f64 / trials as f64;
    assert!(
        (rate - 0.2).abs() < 0.03,
        "empirical allow rate {rate} too far from 0.2"
    );
}

#[test]
fn test_dense_set_falls_back_to_complement_enumeration() {
    let e = engine(6);
    // Everything except 38217 wins: rejection sampling will almost surely
    // exhaust its attempts and the exact complement pick must find 38217.
    let mut set = WinningSet::new();
    for index in 0..crate::types::DRAW_SPACE {
        if index != 38_217 {
            set.insert(index);
        }
    }
    let (digits, kind) = e.pick_from_complement(&set);
    // The sole non-member must be found regardless of which path got there
    assert_eq!(digits, [3, 8, 2, 1, 7]);
    assert!(matches!(kind, DecisionKind::Fallback | DecisionKind::Avoided));
}

#[test]
fn test_full_cover_degenerate_case() {
    let e = engine(7);
    let mut p = params();
    p.min_bet_amount = dec!(0);
    // Big + small on the sum covers the entire space
    let bets = vec![
        bet(
            BetContent::DoubleFace {
                position: None,
                attribute: FaceAttribute::Big,
            },
            dec!(1),
        ),
        bet(
            BetContent::DoubleFace {
                position: None,
                attribute: FaceAttribute::Small,
            },
            dec!(1),
        ),
    ];
    let (digits, decision) = e.select_draw("202501010000", &bets, &p);
    assert_eq!(decision.kind, DecisionKind::Fallback);
    assert_eq!(decision.winning_set_size, crate::types::DRAW_SPACE);
    assert!(digits.iter().all(|&d| d <= 9));
}

#[test]
fn test_zero_budget_times_out_with_partial_set() {
    let e = engine(8);
    let mut p = params();
    p.max_analysis_duration = Duration::from_millis(0);
    let bets = vec![bet(
        BetContent::DragonTiger {
            pick: DragonTiger::Dragon,
        },
        dec!(10),
    )];
    let analysis = e.analyze(&bets, &p);
    assert!(analysis.timed_out);
    // Draw still proceeds with whatever was expanded
    let (digits, _) = e.select_draw("202501010000", &bets, &p);
    assert!(digits.iter().all(|&d| d <= 9));
}

#[test]
fn test_fallback_draw_records_analysis_failed() {
    let e = engine(9);
    let (digits, decision) = e.fallback_draw("202501010000", "ledger unreachable");
    assert_eq!(decision.kind, DecisionKind::AnalysisFailed);
    assert_eq!(decision.digits, digits);
    assert_eq!(decision.winning_set_size, 0);
}

#[test]
fn test_audit_sample_bounded() {
    let e = engine(10);
    let bets = vec![bet(
        BetContent::Positioning {
            picks: vec![PositionPick {
                position: 0,
                digit: 7,
            }],
        },
        dec!(10),
    )];
    let (_, decision) = e.select_draw("202501010000", &bets, &params());
    assert_eq!(decision.avoided_sample.len(), 10);
    assert!(decision.avoided_sample.iter().all(|&n| n >= 70_000));
}
