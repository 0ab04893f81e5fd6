//! Bull-bull hand derivation
//!
//! All C(5,3) = 10 three-digit subsets are tried in a fixed lexicographic
//! index order; the first subset whose sum is a multiple of 10 determines
//! the hand. The enumeration order is part of the contract: when several
//! subsets qualify they can leave different remainders, and callers must
//! see the first one.

use crate::types::{BullResult, Digits};

/// Index triples in lexicographic order. Must not be reordered.
const SUBSETS: [[usize; 3]; 10] = [
    [0, 1, 2],
    [0, 1, 3],
    [0, 1, 4],
    [0, 2, 3],
    [0, 2, 4],
    [0, 3, 4],
    [1, 2, 3],
    [1, 2, 4],
    [1, 3, 4],
    [2, 3, 4],
];

/// Classify the bull hand of a 5-digit draw.
pub fn bull_result(digits: &Digits) -> BullResult {
    let total: u8 = digits.iter().sum();
    for subset in SUBSETS {
        let subset_sum = subset.iter().map(|&i| digits[i]).sum::<u8>();
        if subset_sum % 10 == 0 {
            let remainder = (total - subset_sum) % 10;
            return if remainder == 0 {
                BullResult::BullBull
            } else {
                BullResult::Bull(remainder)
            };
        }
    }
    BullResult::NoBull
}
