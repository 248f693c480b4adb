//! Mock exchange rates.
//!
//! A rate is an anchor taken from [BASE_RATES] perturbed by a bounded random factor. The random
//! draw comes from a generator constructed and seeded inside each call from the timestamp of the
//! requested moment, so the same pair and moment always give the same rate and calls share no
//! state.
//!
//! Rates for `(A, B)` and `(B, A)` are perturbed independently after any inversion of the table
//! entry, so their product is only approximately one.
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};

use crate::clock::DateTime;

/// Precision used for live, by-date and history rates.
pub const QUOTE_PRECISION: u32 = 4;
/// Precision used when seeding stored rates.
pub const SEED_PRECISION: u32 = 6;

/// Anchor used for pairs that are not in [BASE_RATES] in either direction.
pub const DEFAULT_ANCHOR: f64 = 1.2296;
/// Total width of the band around the anchor, so rates move at most half of this either way.
pub const VOLATILITY: f64 = 0.02;

pub const BASE_RATES: [(&str, f64); 19] = [
    ("USD_EUR", 0.85),
    ("USD_GBP", 0.73),
    ("USD_JPY", 110.0),
    ("USD_MYR", 4.15),
    ("USD_SGD", 1.35),
    ("USD_PHP", 50.0),
    ("USD_CNY", 6.45),
    ("USD_AUD", 1.35),
    ("USD_CAD", 1.25),
    ("USD_HKD", 7.8),
    ("USD_KRW", 1200.0),
    ("USD_HUF", 300.0),
    ("USD_MXN", 20.0),
    ("USD_NZD", 1.42),
    ("USD_CHF", 0.92),
    ("USD_SEK", 10.5),
    ("USD_NOK", 10.8),
    ("USD_THB", 35.0),
    ("USD_INR", 75.0),
];

pub fn pair_key(base: &str, quote: &str) -> String {
    format!("{base}_{quote}")
}

pub fn base_rate(key: &str) -> Option<f64> {
    BASE_RATES
        .iter()
        .find(|(pair, _)| *pair == key)
        .map(|(_, rate)| *rate)
}

/// Rate before perturbation: direct entry, then the inverse of the reverse entry, then
/// [DEFAULT_ANCHOR].
pub fn anchor_rate(base: &str, quote: &str) -> f64 {
    if let Some(rate) = base_rate(&pair_key(base, quote)) {
        return rate;
    }

    match base_rate(&pair_key(quote, base)) {
        Some(rate) if rate != 0.0 => 1.0 / rate,
        _ => DEFAULT_ANCHOR,
    }
}

/// Multiplicative factor in `[1 - VOLATILITY / 2, 1 + VOLATILITY / 2)` for a seed.
pub fn perturbation(seed: i64) -> f64 {
    let mut rng = StdRng::seed_from_u64(seed as u64);
    let sample = Uniform::new(0.0, 1.0).sample(&mut rng);
    1.0 + (sample - 0.5) * VOLATILITY
}

pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10_f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Generates the rate for `base`/`quote` at `as_of`, or at the current second if `as_of` is
/// `None`.
pub fn generate_rate(base: &str, quote: &str, as_of: Option<DateTime>, precision: u32) -> f64 {
    let seed = as_of.unwrap_or_else(DateTime::now);
    round_to(anchor_rate(base, quote) * perturbation(*seed), precision)
}
