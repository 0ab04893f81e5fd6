//! Cryptographically secure number generation with pattern rejection
//!
//! Candidates come from an OS-seeded CSPRNG. "Too regular" outputs
//! (all-identical, strictly sequential, all-odd/all-even) are rejected
//! probabilistically: each class has a small escape probability with which
//! the candidate is accepted anyway, so the ban is never an observable
//! hard rule. Generation is bounded and never blocks indefinitely.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::Digits;

/// Randomness seam. Production uses [`OsRandom`]; tests inject a seeded rng.
pub trait RandomSource: Send {
    /// Uniform digit in `0..=9`
    fn next_digit(&mut self) -> u8;
    /// Uniform value in `[0,1)`
    fn next_unit(&mut self) -> f64;
    /// Uniform value in `0..bound`
    fn next_below(&mut self, bound: u32) -> u32;
}

/// CSPRNG seeded from OS entropy.
pub struct OsRandom {
    rng: StdRng,
}

impl OsRandom {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl Default for OsRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for OsRandom {
    fn next_digit(&mut self) -> u8 {
        self.rng.random_range(0..10)
    }

    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn next_below(&mut self, bound: u32) -> u32 {
        self.rng.random_range(0..bound)
    }
}

/// Deterministic source for tests.
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_digit(&mut self) -> u8 {
        self.rng.random_range(0..10)
    }

    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn next_below(&mut self, bound: u32) -> u32 {
        self.rng.random_range(0..bound)
    }
}

/// Pattern classes the validator screens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    AllIdentical,
    Sequential,
    AllOdd,
    AllEven,
}

impl Pattern {
    /// Probability with which a candidate in this class escapes rejection.
    /// Generator tuning, not operator policy.
    pub fn escape_probability(&self) -> f64 {
        match self {
            Pattern::AllIdentical => 0.001,
            Pattern::Sequential => 0.005,
            Pattern::AllOdd | Pattern::AllEven => 0.01,
        }
    }
}

/// Classify a digit tuple, or `None` if it looks irregular enough.
pub fn pattern_of(digits: &Digits) -> Option<Pattern> {
    if digits.iter().all(|&d| d == digits[0]) {
        return Some(Pattern::AllIdentical);
    }
    let ascending = digits.windows(2).all(|w| w[1] == w[0] + 1);
    let descending = digits.windows(2).all(|w| w[0] == w[1] + 1);
    if ascending || descending {
        return Some(Pattern::Sequential);
    }
    if digits.iter().all(|&d| d % 2 == 1) {
        return Some(Pattern::AllOdd);
    }
    if digits.iter().all(|&d| d % 2 == 0) {
        return Some(Pattern::AllEven);
    }
    None
}

const MAX_GENERATE_ATTEMPTS: u32 = 100;

/// Draw-number generator with bounded rejection sampling.
pub struct NumberGenerator {
    source: Mutex<Box<dyn RandomSource>>,
}

impl NumberGenerator {
    pub fn new(source: Box<dyn RandomSource>) -> Self {
        Self {
            source: Mutex::new(source),
        }
    }

    pub fn from_os() -> Self {
        Self::new(Box::new(OsRandom::new()))
    }

    /// One raw candidate: five independent uniform digits.
    pub fn generate(&self) -> Digits {
        let mut source = self.source.lock();
        let mut digits = [0u8; 5];
        for d in digits.iter_mut() {
            *d = source.next_digit();
        }
        digits
    }

    /// Probabilistic pattern check. Returns true when the candidate may be
    /// used as-is.
    pub fn validate(&self, digits: &Digits) -> bool {
        match pattern_of(digits) {
            None => true,
            Some(pattern) => {
                let escaped = self.source.lock().next_unit() < pattern.escape_probability();
                if !escaped {
                    tracing::debug!(pattern = ?pattern, digits = ?digits, "rejected candidate");
                }
                escaped
            }
        }
    }

    /// Generate-and-validate, bounded at 100 attempts. Past the bound the
    /// last candidate is accepted regardless so a draw is always produced.
    pub fn generate_valid(&self) -> Digits {
        let mut candidate = self.generate();
        for _ in 1..MAX_GENERATE_ATTEMPTS {
            if self.validate(&candidate) {
                return candidate;
            }
            candidate = self.generate();
        }
        candidate
    }

    /// Uniform coin in `[0,1)` from the same secure source.
    pub fn unit(&self) -> f64 {
        self.source.lock().next_unit()
    }

    /// Uniform value in `0..bound` from the same secure source.
    pub fn below(&self, bound: u32) -> u32 {
        self.source.lock().next_below(bound)
    }
}
