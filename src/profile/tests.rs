//! Tests for the result calculator

use super::*;
use crate::types::{BigSmall, BullResult, DragonTiger, Parity, PokerHand};

#[test]
fn test_sum_and_sum_attributes() {
    let profile = derive(&[3, 8, 2, 1, 7]);
    assert_eq!(profile.sum, 21);
    assert_eq!(profile.sum_big_small, BigSmall::Small);
    assert_eq!(profile.sum_parity, Parity::Odd);

    let profile = derive(&[9, 9, 9, 9, 9]);
    assert_eq!(profile.sum, 45);
    assert_eq!(profile.sum_big_small, BigSmall::Big);

    // Boundary: 23 is big, 22 is small
    assert_eq!(derive(&[9, 9, 5, 0, 0]).sum_big_small, BigSmall::Big);
    assert_eq!(derive(&[9, 9, 4, 0, 0]).sum_big_small, BigSmall::Small);
}

#[test]
fn test_position_attributes() {
    let profile = derive(&[3, 8, 2, 1, 7]);
    assert_eq!(profile.positions[0].value, 3);
    assert_eq!(profile.positions[0].big_small, BigSmall::Small);
    assert_eq!(profile.positions[0].parity, Parity::Odd);
    assert!(profile.positions[0].prime);
    assert_eq!(profile.positions[1].big_small, BigSmall::Big);
    assert!(!profile.positions[1].prime);
    // 1 counts as prime by the game rules
    assert!(profile.positions[3].prime);
    assert_eq!(profile.odd_count, 3);
    assert_eq!(profile.even_count, 2);
}

#[test]
fn test_digit_big_boundary() {
    let profile = derive(&[4, 5, 0, 9, 4]);
    assert_eq!(profile.positions[0].big_small, BigSmall::Small);
    assert_eq!(profile.positions[1].big_small, BigSmall::Big);
}

#[test]
fn test_dragon_tiger_exactly_one_holds() {
    assert_eq!(derive(&[8, 0, 0, 0, 3]).dragon_tiger, DragonTiger::Dragon);
    assert_eq!(derive(&[2, 0, 0, 0, 6]).dragon_tiger, DragonTiger::Tiger);
    assert_eq!(derive(&[4, 0, 0, 0, 4]).dragon_tiger, DragonTiger::Tie);
}

#[test]
fn test_spans() {
    let profile = derive(&[3, 8, 2, 1, 7]);
    // P1-3: max(3,8,2)-min = 6; P2-4: max(8,2,1)-min = 7; P3-5: max(2,1,7)-min = 6
    assert_eq!(profile.spans, [6, 7, 6]);

    assert_eq!(derive(&[5, 5, 5, 5, 5]).spans, [0, 0, 0]);
    assert_eq!(derive(&[0, 9, 0, 9, 0]).spans, [9, 9, 9]);
}

#[test]
fn test_bull_first_qualifying_subset_fixture() {
    // Subsets in lexicographic order; the first with sum % 10 == 0 is
    // P3+P4+P5 = 2+1+7 = 10. Remainder 3+8 = 11 -> bull 1.
    assert_eq!(bull_result(&[3, 8, 2, 1, 7]), BullResult::Bull(1));
}

#[test]
fn test_bull_bull_and_no_bull() {
    // 1+4+5 = 10 qualifies (P1,P3,P4); remainder 9+1 = 10 -> bull-bull
    assert_eq!(bull_result(&[1, 9, 4, 5, 1]), BullResult::BullBull);
    // No 3-subset of [1,1,1,1,2] sums to a multiple of 10
    assert_eq!(bull_result(&[1, 1, 1, 1, 2]), BullResult::NoBull);
}

#[test]
fn test_bull_order_sensitivity() {
    // [5,5,0,5,5]: first qualifying subset is [0,1,2] = 5+5+0 = 10,
    // remainder 5+5 = 10 -> bull-bull. A different enumeration order
    // could pick [0,1,3] = 15 (not qualifying) paths; the fixed order
    // must land on bull-bull here.
    assert_eq!(bull_result(&[5, 5, 0, 5, 5]), BullResult::BullBull);
    // [2,8,0,5,5]: [0,1,2] = 10 qualifies first, remainder 5+5 -> bull-bull,
    // even though [0,3,4] = 12 and [1,3,4] = 18 would not qualify.
    assert_eq!(bull_result(&[2, 8, 0, 5, 5]), BullResult::BullBull);
}

#[test]
fn test_poker_five_of_a_kind() {
    assert_eq!(poker_hand(&[5, 5, 5, 5, 5]), PokerHand::FiveOfAKind);
}

#[test]
fn test_poker_straight_wrap_case() {
    assert_eq!(poker_hand(&[9, 0, 1, 2, 3]), PokerHand::Straight);
    assert_eq!(poker_hand(&[3, 2, 1, 0, 9]), PokerHand::Straight);
}

#[test]
fn test_poker_ordinary_straight() {
    assert_eq!(poker_hand(&[4, 5, 6, 7, 8]), PokerHand::Straight);
    assert_eq!(poker_hand(&[8, 6, 7, 5, 9]), PokerHand::Straight);
}

#[test]
fn test_poker_non_wrap_across_nine_is_not_straight() {
    // 0 follows 9 only in the 9-0-1-2-3 shape
    assert_eq!(poker_hand(&[6, 7, 8, 9, 0]), PokerHand::HighCard);
}

#[test]
fn test_poker_two_pair() {
    assert_eq!(poker_hand(&[1, 1, 2, 2, 3]), PokerHand::TwoPair);
}

#[test]
fn test_poker_remaining_hands() {
    assert_eq!(poker_hand(&[7, 7, 7, 7, 1]), PokerHand::FourOfAKind);
    assert_eq!(poker_hand(&[7, 7, 7, 1, 1]), PokerHand::FullHouse);
    assert_eq!(poker_hand(&[7, 7, 7, 1, 2]), PokerHand::ThreeOfAKind);
    assert_eq!(poker_hand(&[7, 7, 1, 2, 3]), PokerHand::OnePair);
    assert_eq!(poker_hand(&[0, 2, 5, 7, 9]), PokerHand::HighCard);
}

#[test]
fn test_sum_law_over_samples() {
    for index in (0..100_000u32).step_by(997) {
        let digits = crate::types::index_to_digits(index);
        let profile = derive(&digits);
        assert_eq!(profile.sum as u32, digits.iter().map(|&d| d as u32).sum::<u32>());
        assert_eq!(
            profile.sum_big_small,
            if profile.sum >= 23 { BigSmall::Big } else { BigSmall::Small }
        );
        assert_eq!(profile.odd_count + profile.even_count, 5);
    }
}

#[test]
fn test_profile_serialization_round_trip() {
    let profile = derive(&[3, 8, 2, 1, 7]);
    let json = serde_json::to_string(&profile).unwrap();
    let back: crate::types::ResultProfile = serde_json::from_str(&json).unwrap();
    assert_eq!(back, profile);
}
