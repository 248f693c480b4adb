//! Populates a store with the supported currencies and a trailing window of generated USD rates.
use log::info;

use crate::clock::DateTime;
use crate::currency::default_currencies;
use crate::error::Result;
use crate::generator::{generate_rate, round_to, SEED_PRECISION};
use crate::store::{ExchangeRate, RateStore};

pub const SEED_BASE: &str = "USD";
pub const SEED_SOURCE: &str = "seeder";
pub const DEFAULT_SEED_DAYS: u32 = 30;

pub async fn seed_currencies(store: &dyn RateStore) -> Result<usize> {
    let currencies = default_currencies();
    let count = currencies.len();
    for currency in currencies {
        store.upsert_currency(currency).await?;
    }
    info!("SEED: Upserted {:?} currencies", count);
    Ok(count)
}

/// Writes the direct and reciprocal row for every active currency on each of `days` days ending
/// on `end`. Returns the number of rows written.
pub async fn seed_rates(store: &dyn RateStore, end: DateTime, days: u32) -> Result<usize> {
    let currencies = store.active_currencies().await?;
    let mut written = 0;

    for day in DateTime::trailing_days(end, days) {
        for target in currencies.iter().filter(|c| c.code != SEED_BASE) {
            let rate = generate_rate(SEED_BASE, &target.code, Some(day), SEED_PRECISION);
            let reverse = if rate > 0.0 {
                round_to(1.0 / rate, SEED_PRECISION)
            } else {
                0.0
            };

            store
                .upsert_rate(seeded_rate(SEED_BASE, &target.code, rate, day))
                .await?;
            store
                .upsert_rate(seeded_rate(&target.code, SEED_BASE, reverse, day))
                .await?;
            written += 2;
        }
    }
    info!(
        "SEED: Wrote {:?} rates over {:?} days ending {}",
        written,
        days,
        end.to_date_string()
    );
    Ok(written)
}

pub async fn seed_all(store: &dyn RateStore, end: DateTime, days: u32) -> Result<usize> {
    seed_currencies(store).await?;
    seed_rates(store, end, days).await
}

fn seeded_rate(base: &str, target: &str, rate: f64, day: DateTime) -> ExchangeRate {
    ExchangeRate {
        base_currency: base.to_string(),
        target_currency: target.to_string(),
        rate,
        rate_date: day,
        fetched_at: Some(day),
        source: Some(SEED_SOURCE.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{seed_all, seed_currencies, seed_rates, SEED_SOURCE};
    use crate::clock::DateTime;
    use crate::generator::{generate_rate, SEED_PRECISION};
    use crate::store::memory::MemoryStore;
    use crate::store::RateStore;

    #[tokio::test]
    async fn test_that_currencies_are_seeded() {
        let store = MemoryStore::new();
        let count = seed_currencies(&store).await.unwrap();
        assert_eq!(count, 20);

        let currencies = store.active_currencies().await.unwrap();
        assert_eq!(currencies.len(), 20);
        assert!(currencies.iter().any(|c| c.code == "JPY"));
    }

    #[tokio::test]
    async fn test_that_rates_are_seeded_in_both_directions() {
        let store = MemoryStore::new();
        let end = DateTime::from_date_string("2021-03-31").unwrap();
        let written = seed_all(&store, end, 30).await.unwrap();

        // 19 non-USD currencies, 30 days, two rows each
        assert_eq!(written, 19 * 30 * 2);
        assert_eq!(store.rate_count().await.unwrap(), written);

        let direct = store.find_rate("USD", "MYR", end).await.unwrap().unwrap();
        let reverse = store.find_rate("MYR", "USD", end).await.unwrap().unwrap();
        assert_eq!(
            direct.rate,
            generate_rate("USD", "MYR", Some(end), SEED_PRECISION)
        );
        assert!((4.1085..=4.1915).contains(&direct.rate));
        assert!((direct.rate * reverse.rate - 1.0).abs() < 1e-5);
        assert_eq!(direct.source.as_deref(), Some(SEED_SOURCE));
        assert_eq!(direct.fetched_at, Some(end));
    }

    #[tokio::test]
    async fn test_that_seeding_twice_does_not_duplicate() {
        let store = MemoryStore::new();
        let end = DateTime::from_date_string("2021-03-31").unwrap();
        seed_all(&store, end, 3).await.unwrap();
        seed_rates(&store, end, 3).await.unwrap();
        assert_eq!(store.rate_count().await.unwrap(), 19 * 3 * 2);
    }

    #[tokio::test]
    async fn test_that_window_covers_trailing_days() {
        let store = MemoryStore::new();
        let end = DateTime::from_date_string("2021-03-31").unwrap();
        seed_all(&store, end, 30).await.unwrap();

        let first = end.minus_days(29);
        assert!(store.find_rate("USD", "EUR", first).await.unwrap().is_some());
        assert!(store
            .find_rate("USD", "EUR", end.minus_days(30))
            .await
            .unwrap()
            .is_none());
    }
}
