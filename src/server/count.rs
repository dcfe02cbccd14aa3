//! The `/api/{n}` workload: sum 0..=n the slow way.
//!
//! The loop is deliberately O(n) and runs on the worker's only thread, so a
//! large `n` stalls that worker. That stall is what the process pool exists
//! to absorb.

use std::hint::black_box;

/// Largest `n` that is actually summed.
pub const MAX_COUNT: u64 = 5_000_000_000;

/// The `n` path segment after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountArg {
    /// A non-negative integer, saturated at `u64::MAX`.
    Value(u64),
    /// A negative integer. The loop runs zero times.
    Negative,
    /// No leading digits at all. The loop runs zero times.
    NotANumber,
}

impl CountArg {
    /// Parse the leading integer of `raw`.
    ///
    /// Leading whitespace and one sign are accepted, then the longest run
    /// of ASCII digits; anything after it is ignored (`"12abc"` is 12).
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim_start();
        let (negative, rest) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let digits = rest
            .bytes()
            .take_while(u8::is_ascii_digit)
            .map(|d| u64::from(d - b'0'));

        let mut seen = false;
        let value = digits.fold(0u64, |acc, d| {
            seen = true;
            acc.saturating_mul(10).saturating_add(d)
        });

        match (seen, negative) {
            (false, _) => CountArg::NotANumber,
            (true, true) if value > 0 => CountArg::Negative,
            (true, _) => CountArg::Value(value),
        }
    }

    /// Upper bound for the summation loop, or `None` if it should not run.
    pub fn clamped(self) -> Option<u64> {
        match self {
            CountArg::Value(n) => Some(n.min(MAX_COUNT)),
            CountArg::Negative | CountArg::NotANumber => None,
        }
    }
}

/// Sum `0..=limit` one step at a time. `None` sums nothing.
///
/// `limit` must be at most [`MAX_COUNT`]; the result then fits in `u64`.
pub fn accumulate(limit: Option<u64>) -> u64 {
    let Some(limit) = limit else {
        return 0;
    };
    debug_assert!(limit <= MAX_COUNT);

    let mut count: u64 = 0;
    for i in 0..=limit {
        // black_box keeps the optimizer from folding this into n(n+1)/2.
        count += black_box(i);
    }
    count
}
