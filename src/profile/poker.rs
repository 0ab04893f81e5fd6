//! Poker hand classification of the five digits
//!
//! Digits are grouped by value and classified by the sorted multiplicities.
//! Straight detection treats 0 as the value after 9, so `9-0-1-2-3` (sorted
//! `[0,1,2,3,9]`) counts in addition to ordinary ascending runs.

use crate::types::{Digits, PokerHand};

fn is_straight(digits: &Digits) -> bool {
    let mut sorted = *digits;
    sorted.sort_unstable();
    let distinct = sorted.windows(2).all(|w| w[0] != w[1]);
    if !distinct {
        return false;
    }
    if sorted.windows(2).all(|w| w[1] == w[0] + 1) {
        return true;
    }
    // Wrap case: 9-0-1-2-3
    sorted == [0, 1, 2, 3, 9]
}

/// Classify the poker hand of a 5-digit draw.
pub fn poker_hand(digits: &Digits) -> PokerHand {
    let mut counts = [0u8; 10];
    for &d in digits {
        counts[d as usize] += 1;
    }
    let mut multiplicities: Vec<u8> = counts.iter().copied().filter(|&c| c > 0).collect();
    multiplicities.sort_unstable_by(|a, b| b.cmp(a));

    match multiplicities.as_slice() {
        [5] => PokerHand::FiveOfAKind,
        [4, 1] => PokerHand::FourOfAKind,
        [3, 2] => PokerHand::FullHouse,
        [3, 1, 1] => PokerHand::ThreeOfAKind,
        [2, 2, 1] => PokerHand::TwoPair,
        [2, 1, 1, 1] => PokerHand::OnePair,
        _ => {
            if is_straight(digits) {
                PokerHand::Straight
            } else {
                PokerHand::HighCard
            }
        }
    }
}
