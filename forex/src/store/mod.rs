//! Stores hold currencies, snapshots of generated rates and the log of conversions. Rates held in
//! a store are a record of a past generation, the generator remains the source of truth.
//!
//! [MemoryStore](crate::store::memory::MemoryStore) is used in tests and by the server when no
//! database is configured, [PostgresStore](crate::store::postgres::PostgresStore) otherwise.
pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::clock::DateTime;
use crate::currency::Currency;
use crate::error::Result;

#[derive(Clone, Debug, PartialEq)]
pub struct ExchangeRate {
    pub base_currency: String,
    pub target_currency: String,
    pub rate: f64,
    //Always the start of the day
    pub rate_date: DateTime,
    pub fetched_at: Option<DateTime>,
    pub source: Option<String>,
}

impl ExchangeRate {
    pub fn inverse_rate(&self) -> f64 {
        if self.rate > 0.0 {
            1.0 / self.rate
        } else {
            0.0
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewConversion {
    pub user_id: Option<i64>,
    pub from_currency: String,
    pub to_currency: String,
    pub from_amount: f64,
    pub to_amount: f64,
    pub exchange_rate: f64,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CurrencyConversion {
    pub id: i64,
    pub user_id: Option<i64>,
    pub from_currency: String,
    pub to_currency: String,
    pub from_amount: f64,
    pub to_amount: f64,
    pub exchange_rate: f64,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime,
}

impl CurrencyConversion {
    pub const FEE_RATE: f64 = 0.005;

    pub fn conversion_fee(&self) -> f64 {
        self.from_amount * Self::FEE_RATE
    }

    pub fn from_new(id: i64, created_at: DateTime, conversion: NewConversion) -> Self {
        Self {
            id,
            user_id: conversion.user_id,
            from_currency: conversion.from_currency,
            to_currency: conversion.to_currency,
            from_amount: conversion.from_amount,
            to_amount: conversion.to_amount,
            exchange_rate: conversion.exchange_rate,
            ip_address: conversion.ip_address,
            user_agent: conversion.user_agent,
            created_at,
        }
    }
}

#[async_trait]
pub trait RateStore: Send + Sync {
    /// Active currencies ordered by code.
    async fn active_currencies(&self) -> Result<Vec<Currency>>;
    async fn upsert_currency(&self, currency: Currency) -> Result<()>;
    async fn find_rate(
        &self,
        base: &str,
        target: &str,
        date: DateTime,
    ) -> Result<Option<ExchangeRate>>;
    /// Inserts or replaces the row for the pair on `rate.rate_date`.
    async fn upsert_rate(&self, rate: ExchangeRate) -> Result<()>;
    async fn record_conversion(&self, conversion: NewConversion) -> Result<CurrencyConversion>;
    async fn rate_count(&self) -> Result<usize>;
    async fn conversions(&self) -> Result<Vec<CurrencyConversion>>;
}
