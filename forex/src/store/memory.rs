use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;

use super::{CurrencyConversion, ExchangeRate, NewConversion, RateStore};
use crate::clock::DateTime;
use crate::currency::Currency;
use crate::error::{ForexError, Result};

type RateKey = (String, String, DateTime);

#[derive(Debug, Default)]
pub struct MemoryStore {
    currencies: DashMap<String, Currency>,
    rates: DashMap<RateKey, ExchangeRate>,
    conversions: Mutex<Vec<CurrencyConversion>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(base: &str, target: &str, date: DateTime) -> RateKey {
        (base.to_string(), target.to_string(), date.start_of_day())
    }
}

#[async_trait]
impl RateStore for MemoryStore {
    async fn active_currencies(&self) -> Result<Vec<Currency>> {
        let mut currencies: Vec<Currency> = self
            .currencies
            .iter()
            .filter(|entry| entry.is_active)
            .map(|entry| entry.value().clone())
            .collect();
        currencies.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(currencies)
    }

    async fn upsert_currency(&self, currency: Currency) -> Result<()> {
        self.currencies.insert(currency.code.clone(), currency);
        Ok(())
    }

    async fn find_rate(
        &self,
        base: &str,
        target: &str,
        date: DateTime,
    ) -> Result<Option<ExchangeRate>> {
        Ok(self
            .rates
            .get(&Self::key(base, target, date))
            .map(|entry| entry.value().clone()))
    }

    async fn upsert_rate(&self, rate: ExchangeRate) -> Result<()> {
        let key = Self::key(&rate.base_currency, &rate.target_currency, rate.rate_date);
        self.rates.insert(key, rate);
        Ok(())
    }

    async fn record_conversion(&self, conversion: NewConversion) -> Result<CurrencyConversion> {
        let mut log = self.conversions.lock().map_err(|_| ForexError::Store {
            reason: "conversion log lock poisoned".to_string(),
        })?;
        let id = log.len() as i64 + 1;
        let recorded = CurrencyConversion::from_new(id, DateTime::now(), conversion);
        log.push(recorded.clone());
        Ok(recorded)
    }

    async fn rate_count(&self) -> Result<usize> {
        Ok(self.rates.len())
    }

    async fn conversions(&self) -> Result<Vec<CurrencyConversion>> {
        let log = self.conversions.lock().map_err(|_| ForexError::Store {
            reason: "conversion log lock poisoned".to_string(),
        })?;
        Ok(log.clone())
    }
}
