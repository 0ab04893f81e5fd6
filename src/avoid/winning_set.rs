//! Winning-number set over the 100,000-number draw space
//!
//! A fixed-width bitset plus the per-bet expansion rules. Membership must
//! agree exactly with [`crate::evaluator`] settlement: a number is in the
//! set for a bet iff drawing it would settle that bet as a win.

use std::time::Instant;

use crate::profile;
use crate::types::{
    index_to_digits, BetContent, BigSmall, Digits, FaceAttribute, Parity, DRAW_SPACE,
};

const WORDS: usize = (DRAW_SPACE as usize).div_ceil(64);

/// Deadline is re-checked once per this many scanned numbers.
const DEADLINE_STRIDE: u32 = 4096;

/// Set of draw numbers in `0..DRAW_SPACE`.
#[derive(Clone)]
pub struct WinningSet {
    bits: Box<[u64; WORDS]>,
    len: u32,
}

impl WinningSet {
    pub fn new() -> Self {
        Self {
            bits: Box::new([0u64; WORDS]),
            len: 0,
        }
    }

    pub fn insert(&mut self, index: u32) {
        debug_assert!(index < DRAW_SPACE);
        let word = (index / 64) as usize;
        let mask = 1u64 << (index % 64);
        if self.bits[word] & mask == 0 {
            self.bits[word] |= mask;
            self.len += 1;
        }
    }

    pub fn contains(&self, index: u32) -> bool {
        index < DRAW_SPACE && self.bits[(index / 64) as usize] & (1u64 << (index % 64)) != 0
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == DRAW_SPACE
    }

    /// The member with `rank` ones before it (rank in `0..len`).
    pub fn nth_member(&self, rank: u32) -> Option<u32> {
        self.nth_matching(rank, false)
    }

    /// The non-member with `rank` zeros before it (rank in `0..DRAW_SPACE-len`).
    pub fn nth_non_member(&self, rank: u32) -> Option<u32> {
        self.nth_matching(rank, true)
    }

    fn nth_matching(&self, rank: u32, complement: bool) -> Option<u32> {
        let mut remaining = rank;
        for index in 0..DRAW_SPACE {
            let member = self.bits[(index / 64) as usize] & (1u64 << (index % 64)) != 0;
            if member != complement {
                if remaining == 0 {
                    return Some(index);
                }
                remaining -= 1;
            }
        }
        None
    }

    /// Up to `limit` members, lowest first. Audit sample.
    pub fn sample(&self, limit: usize) -> Vec<u32> {
        let mut out = Vec::with_capacity(limit.min(self.len as usize));
        for index in 0..DRAW_SPACE {
            if out.len() >= limit {
                break;
            }
            if self.contains(index) {
                out.push(index);
            }
        }
        out
    }
}

impl Default for WinningSet {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WinningSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WinningSet").field("len", &self.len).finish()
    }
}

/// Whether drawing `digits` would make `content` win. Digit-level math
/// only; no full profile is derived.
pub fn content_matches(content: &BetContent, digits: &Digits) -> bool {
    match content {
        BetContent::Number { digits: picked } => picked == digits,
        BetContent::DoubleFace {
            position,
            attribute,
        } => match position {
            None => sum_face_matches(*attribute, digits.iter().map(|&d| d as u32).sum()),
            Some(p) if *p < 5 => digit_face_matches(*attribute, digits[*p as usize]),
            Some(_) => false,
        },
        BetContent::Positioning { picks } => {
            !picks.is_empty()
                && picks.len() <= 3
                && picks.iter().all(|p| {
                    p.position < 5 && p.digit <= 9 && digits[p.position as usize] == p.digit
                })
        }
        BetContent::Span { window, value } => {
            *window <= 2 && profile::span(digits, *window as usize) == *value
        }
        BetContent::DragonTiger { pick } => *pick == profile::dragon_tiger(digits),
        BetContent::Bull { hand } => *hand == profile::bull_result(digits),
        BetContent::Poker { hand } => *hand == profile::poker_hand(digits),
    }
}

fn sum_face_matches(attribute: FaceAttribute, sum: u32) -> bool {
    match attribute {
        FaceAttribute::Big => BigSmall::of_sum(sum as u8) == BigSmall::Big,
        FaceAttribute::Small => BigSmall::of_sum(sum as u8) == BigSmall::Small,
        FaceAttribute::Odd => sum % 2 == 1,
        FaceAttribute::Even => sum % 2 == 0,
        // Primality is per-digit only; the evaluator settles these as losses
        FaceAttribute::Prime | FaceAttribute::Composite => false,
    }
}

fn digit_face_matches(attribute: FaceAttribute, digit: u8) -> bool {
    match attribute {
        FaceAttribute::Big => digit >= 5,
        FaceAttribute::Small => digit < 5,
        FaceAttribute::Odd => Parity::of(digit) == Parity::Odd,
        FaceAttribute::Even => Parity::of(digit) == Parity::Even,
        FaceAttribute::Prime => profile::is_prime_digit(digit),
        FaceAttribute::Composite => !profile::is_prime_digit(digit),
    }
}

/// Expand one bet into the set. Returns false when the deadline lapsed
/// mid-scan; whatever was inserted so far stays (partial expansion).
pub fn expand_bet(content: &BetContent, set: &mut WinningSet, deadline: Instant) -> bool {
    // Exact-number bets need no scan
    if let BetContent::Number { digits } = content {
        set.insert(crate::types::digits_to_index(digits));
        return true;
    }

    for index in 0..DRAW_SPACE {
        if index % DEADLINE_STRIDE == 0 && Instant::now() >= deadline {
            return false;
        }
        let digits = index_to_digits(index);
        if content_matches(content, &digits) {
            set.insert(index);
        }
    }
    true
}
