use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::cache::TtlCache;
use crate::clock::DateTime;
use crate::currency::{default_currencies, is_currency_code};
use crate::error::{ForexError, Result};
use crate::generator::{generate_rate, round_to, QUOTE_PRECISION};
use crate::store::{NewConversion, RateStore};

/// Rates by date are always quoted against this currency.
pub const DATED_BASE: &str = "USD";
pub const DEFAULT_HISTORY_DAYS: u32 = 30;
pub const MAX_HISTORY_DAYS: u32 = 365;
pub const MIN_AMOUNT: f64 = 0.01;
pub const MAX_AMOUNT: f64 = 1_000_000.0;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CurrentRates {
    pub base: String,
    pub rates: BTreeMap<String, f64>,
    pub last_updated: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DatedRates {
    pub base: String,
    pub date: String,
    pub rates: BTreeMap<String, f64>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ConvertRequest {
    pub from: String,
    pub to: String,
    pub amount: f64,
}

impl ConvertRequest {
    pub fn validate(&self) -> Result<()> {
        if !is_currency_code(&self.from) {
            return Err(ForexError::validation(
                "Source currency code must be 3 characters",
            ));
        }
        if !is_currency_code(&self.to) {
            return Err(ForexError::validation(
                "Target currency code must be 3 characters",
            ));
        }
        if !self.amount.is_finite() || self.amount < MIN_AMOUNT {
            return Err(ForexError::validation("Amount must be at least 0.01"));
        }
        if self.amount > MAX_AMOUNT {
            return Err(ForexError::validation("Amount cannot exceed 1,000,000"));
        }
        Ok(())
    }

    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: f64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Conversion {
    pub from: String,
    pub to: String,
    pub amount: f64,
    pub converted_amount: f64,
    pub rate: f64,
    pub timestamp: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct HistoryPoint {
    pub date: String,
    pub rate: f64,
    pub timestamp: i64,
}

/// Who asked for a conversion. A conversion is only logged when one of `user_id` or
/// `ip_address` is known.
#[derive(Clone, Debug, Default)]
pub struct Origin {
    pub user_id: Option<i64>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Origin {
    fn is_known(&self) -> bool {
        self.user_id.is_some() || self.ip_address.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub current_rates_ttl: Duration,
    pub dated_rates_ttl: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            current_rates_ttl: Duration::from_secs(300),
            dated_rates_ttl: Duration::from_secs(3600),
        }
    }
}

/// Serves rates, conversions and history on top of the generator and a [RateStore].
pub struct ForexService {
    store: Arc<dyn RateStore>,
    current_cache: TtlCache<CurrentRates>,
    dated_cache: TtlCache<DatedRates>,
}

impl ForexService {
    pub fn new(store: Arc<dyn RateStore>, config: ServiceConfig) -> Self {
        Self {
            store,
            current_cache: TtlCache::new(config.current_rates_ttl),
            dated_cache: TtlCache::new(config.dated_rates_ttl),
        }
    }

    pub fn store(&self) -> &Arc<dyn RateStore> {
        &self.store
    }

    /// Active currencies from the store, or the built-in list if the store has none.
    pub async fn currencies(&self) -> Result<BTreeMap<String, String>> {
        let mut currencies = self.store.active_currencies().await?;
        if currencies.is_empty() {
            currencies = default_currencies();
        }
        Ok(currencies.into_iter().map(|c| (c.code, c.name)).collect())
    }

    pub async fn current_rates(&self, base: &str) -> Result<CurrentRates> {
        let key = format!("forex_rates_{base}");
        if let Some(cached) = self.current_cache.get(&key) {
            return Ok(cached);
        }

        let now = DateTime::now();
        let rates = self
            .currencies()
            .await?
            .into_keys()
            .filter(|code| code != base)
            .map(|code| {
                let rate = generate_rate(base, &code, Some(now), QUOTE_PRECISION);
                (code, rate)
            })
            .collect();

        let result = CurrentRates {
            base: base.to_string(),
            rates,
            last_updated: now.to_iso_string(),
        };
        self.current_cache.insert(key, result.clone());
        Ok(result)
    }

    pub async fn rates_by_date(&self, date: DateTime) -> Result<DatedRates> {
        let day = date.start_of_day();
        let key = format!("forex_rates_{}", day.to_date_string());
        if let Some(cached) = self.dated_cache.get(&key) {
            return Ok(cached);
        }

        let rates = self
            .currencies()
            .await?
            .into_keys()
            .filter(|code| code != DATED_BASE)
            .map(|code| {
                let rate = generate_rate(DATED_BASE, &code, Some(day), QUOTE_PRECISION);
                (code, rate)
            })
            .collect();

        let result = DatedRates {
            base: DATED_BASE.to_string(),
            date: day.to_date_string(),
            rates,
        };
        self.dated_cache.insert(key, result.clone());
        Ok(result)
    }

    /// Converts using today's stored rate for the pair if there is one, otherwise the current
    /// generated rate.
    pub async fn convert(&self, request: &ConvertRequest, origin: &Origin) -> Result<Conversion> {
        request.validate()?;
        let now = DateTime::now();

        if request.from == request.to {
            return Ok(Conversion {
                from: request.from.clone(),
                to: request.to.clone(),
                amount: request.amount,
                converted_amount: request.amount,
                rate: 1.0,
                timestamp: now.to_iso_string(),
            });
        }

        let rate = match self
            .store
            .find_rate(&request.from, &request.to, now.start_of_day())
            .await?
        {
            Some(stored) => stored.rate,
            None => {
                let current = self.current_rates(&request.from).await?;
                match current.rates.get(&request.to) {
                    Some(rate) => *rate,
                    None => {
                        warn!("CONVERT: No rate for pair {}/{}", request.from, request.to);
                        return Err(ForexError::PairNotFound {
                            from: request.from.clone(),
                            to: request.to.clone(),
                        });
                    }
                }
            }
        };

        let converted_amount = round_to(request.amount * rate, QUOTE_PRECISION);

        if origin.is_known() {
            let recorded = self
                .store
                .record_conversion(NewConversion {
                    user_id: origin.user_id,
                    from_currency: request.from.clone(),
                    to_currency: request.to.clone(),
                    from_amount: request.amount,
                    to_amount: converted_amount,
                    exchange_rate: rate,
                    ip_address: origin.ip_address.clone(),
                    user_agent: origin.user_agent.clone(),
                })
                .await?;
            info!(
                "CONVERT: Recorded conversion {:?} of {:?} {} to {:?} {}",
                recorded.id, request.amount, request.from, converted_amount, request.to
            );
        }

        Ok(Conversion {
            from: request.from.clone(),
            to: request.to.clone(),
            amount: request.amount,
            converted_amount,
            rate,
            timestamp: now.to_iso_string(),
        })
    }

    /// One point per day for `days` days ending today, oldest first. Zero days is an empty series.
    pub fn history(&self, from: &str, to: &str, days: u32) -> Result<Vec<HistoryPoint>> {
        if days > MAX_HISTORY_DAYS {
            return Err(ForexError::HistoryTooLong {
                days,
                max: MAX_HISTORY_DAYS,
            });
        }

        Ok(DateTime::trailing_days(DateTime::now(), days)
            .into_iter()
            .map(|day| HistoryPoint {
                date: day.to_date_string(),
                rate: generate_rate(from, to, Some(day), QUOTE_PRECISION),
                timestamp: *day,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{ConvertRequest, ForexService, Origin, ServiceConfig};
    use crate::clock::DateTime;
    use crate::currency::Currency;
    use crate::error::ForexError;
    use crate::generator::{generate_rate, QUOTE_PRECISION};
    use crate::seed::seed_currencies;
    use crate::store::memory::MemoryStore;
    use crate::store::{ExchangeRate, RateStore};

    fn service() -> (ForexService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = ForexService::new(store.clone(), ServiceConfig::default());
        (service, store)
    }

    fn web_origin() -> Origin {
        Origin {
            user_id: None,
            ip_address: Some("127.0.0.1".to_string()),
            user_agent: Some("test".to_string()),
        }
    }

    #[tokio::test]
    async fn test_that_currencies_fall_back_to_defaults() {
        let (service, _store) = service();
        let currencies = service.currencies().await.unwrap();
        assert_eq!(currencies.len(), 20);
        assert_eq!(currencies.get("EUR").unwrap(), "Euro");
    }

    #[tokio::test]
    async fn test_that_currencies_come_from_store_when_present() {
        let (service, store) = service();
        store
            .upsert_currency(Currency::new("USD", "US Dollar", Some("$"), 2))
            .await
            .unwrap();
        store
            .upsert_currency(Currency::new("EUR", "Euro", Some("€"), 2))
            .await
            .unwrap();

        let currencies = service.currencies().await.unwrap();
        assert_eq!(currencies.len(), 2);
    }

    #[tokio::test]
    async fn test_that_current_rates_exclude_base_and_are_cached() {
        let (service, _store) = service();
        let first = service.current_rates("EUR").await.unwrap();
        assert_eq!(first.base, "EUR");
        assert_eq!(first.rates.len(), 19);
        assert!(!first.rates.contains_key("EUR"));

        let second = service.current_rates("EUR").await.unwrap();
        assert_eq!(first.rates, second.rates);
        assert_eq!(first.last_updated, second.last_updated);
    }

    #[tokio::test]
    async fn test_that_rates_by_date_are_pinned_to_usd_and_deterministic() {
        let (service, _store) = service();
        let date = DateTime::from_date_string("2021-03-31").unwrap();
        let rates = service.rates_by_date(date).await.unwrap();

        assert_eq!(rates.base, "USD");
        assert_eq!(rates.date, "2021-03-31");
        assert!(!rates.rates.contains_key("USD"));
        assert_eq!(
            *rates.rates.get("MYR").unwrap(),
            generate_rate("USD", "MYR", Some(date), QUOTE_PRECISION)
        );

        // A different time on the same day maps to the same rates
        let later = DateTime::from(*date + 7_200);
        let again = service.rates_by_date(later).await.unwrap();
        assert_eq!(rates.rates, again.rates);
    }

    #[tokio::test]
    async fn test_that_identity_conversion_skips_lookup() {
        let (service, store) = service();
        let request = ConvertRequest::new("USD", "USD", 100.0);
        let result = service.convert(&request, &web_origin()).await.unwrap();

        assert_eq!(result.converted_amount, 100.0);
        assert_eq!(result.rate, 1.0);
        assert!(store.conversions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_that_stored_rate_for_today_is_preferred() {
        let (service, store) = service();
        let today = DateTime::now().start_of_day();
        store
            .upsert_rate(ExchangeRate {
                base_currency: "USD".to_string(),
                target_currency: "EUR".to_string(),
                rate: 0.5,
                rate_date: today,
                fetched_at: Some(today),
                source: Some("test".to_string()),
            })
            .await
            .unwrap();

        let request = ConvertRequest::new("USD", "EUR", 10.0);
        let result = service.convert(&request, &web_origin()).await.unwrap();
        assert_eq!(result.rate, 0.5);
        assert_eq!(result.converted_amount, 5.0);
    }

    #[tokio::test]
    async fn test_that_conversion_falls_back_to_current_rates() {
        let (service, store) = service();
        seed_currencies(store.as_ref()).await.unwrap();

        let request = ConvertRequest::new("USD", "EUR", 100.0);
        let result = service.convert(&request, &web_origin()).await.unwrap();

        let current = service.current_rates("USD").await.unwrap();
        assert_eq!(result.rate, *current.rates.get("EUR").unwrap());
        assert!(result.rate >= 0.85 * 0.99 - 1e-4 && result.rate <= 0.85 * 1.01 + 1e-4);
        assert_eq!(
            result.converted_amount,
            ((100.0 * result.rate) * 10_000.0_f64).round() / 10_000.0
        );

        let log = store.conversions().await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log.first().unwrap().ip_address.as_deref(), Some("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_that_anonymous_conversion_is_not_recorded() {
        let (service, store) = service();
        let request = ConvertRequest::new("USD", "GBP", 10.0);
        service.convert(&request, &Origin::default()).await.unwrap();
        assert!(store.conversions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_that_unknown_target_is_not_found() {
        let (service, _store) = service();
        let request = ConvertRequest::new("USD", "XXX", 10.0);
        let result = service.convert(&request, &Origin::default()).await;
        assert!(matches!(result, Err(ForexError::PairNotFound { .. })));
    }

    #[tokio::test]
    async fn test_that_invalid_requests_are_rejected() {
        let (service, _store) = service();
        for request in [
            ConvertRequest::new("US", "EUR", 10.0),
            ConvertRequest::new("USD", "EURO", 10.0),
            ConvertRequest::new("USD", "EUR", 0.001),
            ConvertRequest::new("USD", "EUR", 2_000_000.0),
            ConvertRequest::new("USD", "EUR", f64::NAN),
        ] {
            let result = service.convert(&request, &Origin::default()).await;
            assert!(result.unwrap_err().is_validation());
        }
    }

    #[test]
    fn test_that_history_is_ordered_and_ends_today() {
        let (service, _store) = service();
        let history = service.history("USD", "EUR", 5).unwrap();

        assert_eq!(history.len(), 5);
        for pair in history.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
            assert!(pair[0].date < pair[1].date);
        }
        assert_eq!(
            history.last().unwrap().date,
            DateTime::now().to_date_string()
        );
    }

    #[test]
    fn test_that_history_is_repeatable() {
        let (service, _store) = service();
        let first = service.history("GBP", "JPY", 7).unwrap();
        let second = service.history("GBP", "JPY", 7).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_that_history_of_zero_days_is_empty() {
        let (service, _store) = service();
        assert!(service.history("USD", "EUR", 0).unwrap().is_empty());
    }

    #[test]
    fn test_that_history_rejects_more_than_a_year() {
        let (service, _store) = service();
        assert_eq!(service.history("USD", "EUR", 365).unwrap().len(), 365);

        let result = service.history("USD", "EUR", 366);
        let err = result.unwrap_err();
        assert!(matches!(err, ForexError::HistoryTooLong { days: 366, .. }));
        assert!(!err.is_validation());
    }
}
