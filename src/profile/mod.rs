//! Result calculator: derived attribute profile of a 5-digit draw
//!
//! Everything here is a pure function of the five digits. The profile is
//! computed once at draw time and stored immutably with the draw.

mod bull;
mod poker;

#[cfg(test)]
mod tests;

pub use bull::bull_result;
pub use poker::poker_hand;

use crate::types::{
    BigSmall, DigitProfile, Digits, DragonTiger, Parity, ResultProfile, PRIME_DIGITS,
};

/// Whether a digit belongs to the game's prime set {1, 2, 3, 5, 7}.
pub fn is_prime_digit(d: u8) -> bool {
    PRIME_DIGITS.contains(&d)
}

/// Dragon/tiger: P1 against P5.
pub fn dragon_tiger(digits: &Digits) -> DragonTiger {
    match digits[0].cmp(&digits[4]) {
        std::cmp::Ordering::Greater => DragonTiger::Dragon,
        std::cmp::Ordering::Less => DragonTiger::Tiger,
        std::cmp::Ordering::Equal => DragonTiger::Tie,
    }
}

/// Span (max - min) over the 3-digit window starting at `start`.
pub fn span(digits: &Digits, start: usize) -> u8 {
    let window = &digits[start..start + 3];
    let max = *window.iter().max().unwrap_or(&0);
    let min = *window.iter().min().unwrap_or(&0);
    max - min
}

/// Derive the full profile for a draw.
pub fn derive(digits: &Digits) -> ResultProfile {
    let sum: u8 = digits.iter().sum();

    let mut positions = [DigitProfile {
        value: 0,
        big_small: BigSmall::Small,
        parity: Parity::Even,
        prime: false,
    }; 5];
    let mut odd_count = 0u8;
    for (i, &d) in digits.iter().enumerate() {
        let parity = Parity::of(d);
        if parity == Parity::Odd {
            odd_count += 1;
        }
        positions[i] = DigitProfile {
            value: d,
            big_small: BigSmall::of_digit(d),
            parity,
            prime: is_prime_digit(d),
        };
    }

    ResultProfile {
        digits: *digits,
        sum,
        sum_big_small: BigSmall::of_sum(sum),
        sum_parity: Parity::of(sum),
        positions,
        dragon_tiger: dragon_tiger(digits),
        odd_count,
        even_count: 5 - odd_count,
        spans: [span(digits, 0), span(digits, 1), span(digits, 2)],
        bull: bull_result(digits),
        poker: poker_hand(digits),
    }
}
