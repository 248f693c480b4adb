//! # What is forex?
//!
//! forex produces mock exchange rates for a fixed set of currencies and serves the operations a
//! currency-exchange frontend needs: current rates, rates on a date, conversion, a currency list
//! and a daily history for a pair. The JSON server over these operations lives in `forex-http`.
//!
//! # Implementation
//!
//! - [generator](crate::generator) is the core. A rate is a table anchor for the pair perturbed by
//! at most ±1%, with the perturbation drawn from a generator seeded by the timestamp of the
//! requested moment. The same pair and moment always produce the same rate.
//! - [clock](crate::clock) wraps epoch seconds. Every dated operation truncates to 00:00 UTC so a
//! calendar day always maps to one rate per pair. Current rates are seeded by the current second.
//! - [store](crate::store) holds currencies, snapshots of generated rates and a log of
//! conversions. Stored rates are a cache of past generations, not a source of truth.
//! - [seed](crate::seed) fills a store with currencies and a trailing window of USD rates.
//! - [service](crate::service) composes the above with a short TTL cache over the rate lists.
//!
//! Rates for `(A, B)` and `(B, A)` are perturbed independently so their product is only
//! approximately one.
pub mod cache;
pub mod clock;
pub mod currency;
pub mod error;
pub mod generator;
pub mod seed;
pub mod service;
pub mod store;
