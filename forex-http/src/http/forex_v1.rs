use std::collections::BTreeMap;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

use forex::error::ForexError;
use forex::service::{Conversion, CurrentRates, DatedRates, ForexService, HistoryPoint};

pub type ForexState = ForexService;

#[derive(Debug, Deserialize, Serialize)]
pub struct RatesResponse {
    pub success: bool,
    pub data: CurrentRates,
    pub timestamp: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RatesByDateResponse {
    pub success: bool,
    pub data: DatedRates,
    pub date: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ConvertResponse {
    pub success: bool,
    pub data: Conversion,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CurrenciesResponse {
    pub success: bool,
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub data: Vec<HistoryPoint>,
    pub pair: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub error: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RatesQuery {
    pub base: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HistoryQuery {
    pub days: Option<u32>,
}

/// Failure of one endpoint. `message` says which operation failed, `error` why.
#[derive(Debug, Display, Error)]
#[display("{message}: {error}")]
pub struct ApiError {
    pub message: &'static str,
    #[error(source)]
    pub error: ForexError,
}

impl ApiError {
    pub fn new(message: &'static str, error: ForexError) -> Self {
        Self { message, error }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        if self.error.is_validation() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            success: false,
            message: self.message.to_string(),
            error: self.error.to_string(),
        })
    }
}

pub mod server {
    use actix_web::http::header;
    use actix_web::{get, post, web, HttpRequest};
    use log::error;

    use forex::clock::DateTime;
    use forex::service::{ConvertRequest, Origin, DEFAULT_HISTORY_DAYS};

    use super::{
        ApiError, ConvertResponse, CurrenciesResponse, ForexError, ForexState, HistoryQuery,
        HistoryResponse, RatesByDateResponse, RatesQuery, RatesResponse,
    };

    const DEFAULT_BASE: &str = "USD";

    fn failed(message: &'static str) -> impl Fn(ForexError) -> ApiError {
        move |error| {
            if !error.is_validation() {
                error!("{message}: {error}");
            }
            ApiError::new(message, error)
        }
    }

    /// Registers every route along with extractor configs that answer malformed input with the
    /// JSON error body. Malformed convert bodies are 422, malformed query strings are 500.
    pub fn configure(cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
            ApiError::new("Invalid request", ForexError::validation(err.to_string())).into()
        }))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| {
            let reason = err.to_string();
            error!("Invalid request: {reason}");
            ApiError::new("Invalid request", ForexError::InvalidQuery { reason }).into()
        }))
        .service(rates)
        .service(rates_by_date)
        .service(convert)
        .service(currencies)
        .service(history);
    }

    #[get("/forex/rates")]
    pub async fn rates(
        app: web::Data<ForexState>,
        query: web::Query<RatesQuery>,
    ) -> Result<web::Json<RatesResponse>, ApiError> {
        let base = query.base.as_deref().unwrap_or(DEFAULT_BASE);
        let data = app
            .current_rates(base)
            .await
            .map_err(failed("Failed to fetch rates"))?;

        Ok(web::Json(RatesResponse {
            success: true,
            data,
            timestamp: DateTime::now().to_iso_string(),
        }))
    }

    #[get("/forex/rates/{date}")]
    pub async fn rates_by_date(
        app: web::Data<ForexState>,
        path: web::Path<(String,)>,
    ) -> Result<web::Json<RatesByDateResponse>, ApiError> {
        let (date,) = path.into_inner();
        let on_error = failed("Failed to fetch historical rates");

        let date = DateTime::from_date_string(&date).map_err(&on_error)?;
        let data = app.rates_by_date(date).await.map_err(&on_error)?;

        Ok(web::Json(RatesByDateResponse {
            success: true,
            date: data.date.clone(),
            data,
        }))
    }

    #[post("/forex/convert")]
    pub async fn convert(
        app: web::Data<ForexState>,
        req: HttpRequest,
        body: web::Json<ConvertRequest>,
    ) -> Result<web::Json<ConvertResponse>, ApiError> {
        let origin = Origin {
            user_id: None,
            ip_address: req.peer_addr().map(|addr| addr.ip().to_string()),
            user_agent: req
                .headers()
                .get(header::USER_AGENT)
                .and_then(|value| value.to_str().ok())
                .map(String::from),
        };

        let data = app
            .convert(&body, &origin)
            .await
            .map_err(failed("Conversion failed"))?;

        Ok(web::Json(ConvertResponse {
            success: true,
            data,
        }))
    }

    #[get("/forex/currencies")]
    pub async fn currencies(
        app: web::Data<ForexState>,
    ) -> Result<web::Json<CurrenciesResponse>, ApiError> {
        let data = app
            .currencies()
            .await
            .map_err(failed("Failed to fetch currencies"))?;

        Ok(web::Json(CurrenciesResponse {
            success: true,
            data,
        }))
    }

    #[get("/forex/history/{from}/{to}")]
    pub async fn history(
        app: web::Data<ForexState>,
        path: web::Path<(String, String)>,
        query: web::Query<HistoryQuery>,
    ) -> Result<web::Json<HistoryResponse>, ApiError> {
        let (from, to) = path.into_inner();
        let days = query.days.unwrap_or(DEFAULT_HISTORY_DAYS);

        let data = app
            .history(&from, &to, days)
            .map_err(failed("Failed to fetch historical data"))?;

        Ok(web::Json(HistoryResponse {
            success: true,
            data,
            pair: format!("{from}/{to}"),
        }))
    }
}

pub mod client {
    use anyhow::{bail, Result};
    use serde::de::DeserializeOwned;

    use forex::service::ConvertRequest;

    use super::{
        ConvertResponse, CurrenciesResponse, ErrorResponse, HistoryResponse,
        RatesByDateResponse, RatesResponse,
    };

    pub struct Client {
        pub path: String,
        pub client: reqwest::Client,
    }

    impl Client {
        async fn read<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
            let status = resp.status();
            let body = resp.text().await?;
            if status.is_success() {
                return Ok(serde_json::from_str::<T>(&body)?);
            }

            match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) => bail!("{} ({}): {}", err.message, status, err.error),
                Err(_) => bail!("Request failed ({}): {}", status, body),
            }
        }

        pub async fn rates(&self, base: &str) -> Result<RatesResponse> {
            let resp = self
                .client
                .get(self.path.clone() + "/forex/rates")
                .query(&[("base", base)])
                .send()
                .await?;
            Self::read(resp).await
        }

        pub async fn rates_by_date(&self, date: &str) -> Result<RatesByDateResponse> {
            let resp = self
                .client
                .get(self.path.clone() + format!("/forex/rates/{date}").as_str())
                .send()
                .await?;
            Self::read(resp).await
        }

        pub async fn convert(&self, from: &str, to: &str, amount: f64) -> Result<ConvertResponse> {
            let req = ConvertRequest::new(from, to, amount);
            let resp = self
                .client
                .post(self.path.clone() + "/forex/convert")
                .json(&req)
                .send()
                .await?;
            Self::read(resp).await
        }

        pub async fn currencies(&self) -> Result<CurrenciesResponse> {
            let resp = self
                .client
                .get(self.path.clone() + "/forex/currencies")
                .send()
                .await?;
            Self::read(resp).await
        }

        pub async fn history(&self, from: &str, to: &str, days: u32) -> Result<HistoryResponse> {
            let resp = self
                .client
                .get(self.path.clone() + format!("/forex/history/{from}/{to}").as_str())
                .query(&[("days", days)])
                .send()
                .await?;
            Self::read(resp).await
        }

        pub fn new(path: String) -> Self {
            Self {
                path,
                client: reqwest::Client::new(),
            }
        }
    }
}
