use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use time::OffsetDateTime;
use tokio_postgres::{NoTls, Row};

use super::{CurrencyConversion, ExchangeRate, NewConversion, RateStore};
use crate::clock::DateTime;
use crate::currency::Currency;
use crate::error::{ForexError, Result};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS currencies (
    code VARCHAR(3) PRIMARY KEY,
    name TEXT NOT NULL,
    symbol TEXT,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    decimal_places INTEGER NOT NULL DEFAULT 2
);
CREATE TABLE IF NOT EXISTS exchange_rates (
    id BIGSERIAL PRIMARY KEY,
    base_currency VARCHAR(3) NOT NULL REFERENCES currencies(code) ON DELETE CASCADE,
    target_currency VARCHAR(3) NOT NULL REFERENCES currencies(code) ON DELETE CASCADE,
    rate DOUBLE PRECISION NOT NULL,
    rate_date DATE NOT NULL,
    fetched_at TIMESTAMPTZ,
    source TEXT,
    UNIQUE (base_currency, target_currency, rate_date)
);
CREATE INDEX IF NOT EXISTS exchange_rates_rate_date_idx ON exchange_rates (rate_date);
CREATE TABLE IF NOT EXISTS currency_conversions (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT,
    from_currency VARCHAR(3) NOT NULL REFERENCES currencies(code) ON DELETE CASCADE,
    to_currency VARCHAR(3) NOT NULL REFERENCES currencies(code) ON DELETE CASCADE,
    from_amount DOUBLE PRECISION NOT NULL,
    to_amount DOUBLE PRECISION NOT NULL,
    exchange_rate DOUBLE PRECISION NOT NULL,
    ip_address VARCHAR(45),
    user_agent TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS currency_conversions_pair_idx
    ON currency_conversions (from_currency, to_currency);
";

const CONVERSION_COLUMNS: &str = "id, user_id, from_currency, to_currency, from_amount, \
     to_amount, exchange_rate, ip_address, user_agent, created_at";

pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    pub fn new(host: &str, user: &str, password: &str, dbname: &str) -> Result<Self> {
        let mut config = Config::new();
        config.host = Some(host.to_string());
        config.user = Some(user.to_string());
        config.password = Some(password.to_string());
        config.dbname = Some(dbname.to_string());
        config.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ForexError::Store {
                reason: e.to_string(),
            })?;
        Ok(Self { pool })
    }

    /// Creates the tables if they do not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        let client = self.pool.get().await?;
        client.batch_execute(SCHEMA).await?;
        Ok(())
    }

    fn currency_from_row(row: &Row) -> Result<Currency> {
        Ok(Currency {
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            symbol: row.try_get("symbol")?,
            is_active: row.try_get("is_active")?,
            decimal_places: row.try_get("decimal_places")?,
        })
    }

    fn rate_from_row(row: &Row) -> Result<ExchangeRate> {
        let rate_date: time::Date = row.try_get("rate_date")?;
        let fetched_at: Option<OffsetDateTime> = row.try_get("fetched_at")?;
        Ok(ExchangeRate {
            base_currency: row.try_get("base_currency")?,
            target_currency: row.try_get("target_currency")?,
            rate: row.try_get("rate")?,
            rate_date: rate_date.into(),
            fetched_at: fetched_at.map(DateTime::from),
            source: row.try_get("source")?,
        })
    }

    fn conversion_from_row(row: &Row) -> Result<CurrencyConversion> {
        let created_at: OffsetDateTime = row.try_get("created_at")?;
        Ok(CurrencyConversion {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            from_currency: row.try_get("from_currency")?,
            to_currency: row.try_get("to_currency")?,
            from_amount: row.try_get("from_amount")?,
            to_amount: row.try_get("to_amount")?,
            exchange_rate: row.try_get("exchange_rate")?,
            ip_address: row.try_get("ip_address")?,
            user_agent: row.try_get("user_agent")?,
            created_at: created_at.into(),
        })
    }
}

#[async_trait]
impl RateStore for PostgresStore {
    async fn active_currencies(&self) -> Result<Vec<Currency>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT code, name, symbol, is_active, decimal_places FROM currencies \
                 WHERE is_active ORDER BY code",
                &[],
            )
            .await?;
        rows.iter().map(Self::currency_from_row).collect()
    }

    async fn upsert_currency(&self, currency: Currency) -> Result<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO currencies (code, name, symbol, is_active, decimal_places) \
                 VALUES ($1, $2, $3, $4, $5) \
                 ON CONFLICT (code) DO UPDATE SET name = EXCLUDED.name, \
                 symbol = EXCLUDED.symbol, is_active = EXCLUDED.is_active, \
                 decimal_places = EXCLUDED.decimal_places",
                &[
                    &currency.code,
                    &currency.name,
                    &currency.symbol,
                    &currency.is_active,
                    &currency.decimal_places,
                ],
            )
            .await?;
        Ok(())
    }

    async fn find_rate(
        &self,
        base: &str,
        target: &str,
        date: DateTime,
    ) -> Result<Option<ExchangeRate>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT base_currency, target_currency, rate, rate_date, fetched_at, source \
                 FROM exchange_rates \
                 WHERE base_currency = $1 AND target_currency = $2 AND rate_date = $3 \
                 LIMIT 1",
                &[&base, &target, &date.date()],
            )
            .await?;
        row.as_ref().map(Self::rate_from_row).transpose()
    }

    async fn upsert_rate(&self, rate: ExchangeRate) -> Result<()> {
        let client = self.pool.get().await?;
        let fetched_at: Option<OffsetDateTime> = rate.fetched_at.map(OffsetDateTime::from);
        client
            .execute(
                "INSERT INTO exchange_rates \
                 (base_currency, target_currency, rate, rate_date, fetched_at, source) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 ON CONFLICT (base_currency, target_currency, rate_date) DO UPDATE SET \
                 rate = EXCLUDED.rate, fetched_at = EXCLUDED.fetched_at, source = EXCLUDED.source",
                &[
                    &rate.base_currency,
                    &rate.target_currency,
                    &rate.rate,
                    &rate.rate_date.date(),
                    &fetched_at,
                    &rate.source,
                ],
            )
            .await?;
        Ok(())
    }

    async fn record_conversion(&self, conversion: NewConversion) -> Result<CurrencyConversion> {
        let client = self.pool.get().await?;
        let query = format!(
            "INSERT INTO currency_conversions \
             (user_id, from_currency, to_currency, from_amount, to_amount, exchange_rate, \
             ip_address, user_agent) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {CONVERSION_COLUMNS}"
        );
        let row = client
            .query_one(
                query.as_str(),
                &[
                    &conversion.user_id,
                    &conversion.from_currency,
                    &conversion.to_currency,
                    &conversion.from_amount,
                    &conversion.to_amount,
                    &conversion.exchange_rate,
                    &conversion.ip_address,
                    &conversion.user_agent,
                ],
            )
            .await?;
        Self::conversion_from_row(&row)
    }

    async fn rate_count(&self) -> Result<usize> {
        let client = self.pool.get().await?;
        let row = client
            .query_one("SELECT COUNT(*) FROM exchange_rates", &[])
            .await?;
        let count: i64 = row.try_get(0)?;
        Ok(count as usize)
    }

    async fn conversions(&self) -> Result<Vec<CurrencyConversion>> {
        let client = self.pool.get().await?;
        let query = format!("SELECT {CONVERSION_COLUMNS} FROM currency_conversions ORDER BY id");
        let rows = client.query(query.as_str(), &[]).await?;
        rows.iter().map(Self::conversion_from_row).collect()
    }
}
