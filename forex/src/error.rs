use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ForexError {
    #[display("Currency pair {from}/{to} not found")]
    PairNotFound { from: String, to: String },
    #[display("Invalid date: {value}")]
    InvalidDate { value: String },
    #[display("Invalid request: {reason}")]
    Validation { reason: String },
    #[display("Invalid query: {reason}")]
    InvalidQuery { reason: String },
    #[display("History limited to {max} days, got {days}")]
    HistoryTooLong { days: u32, max: u32 },
    #[display("Store error: {reason}")]
    Store { reason: String },
}

impl ForexError {
    pub fn validation(reason: impl Into<String>) -> Self {
        ForexError::Validation {
            reason: reason.into(),
        }
    }

    /// Only rejected conversion requests count, every other failure is a server error.
    pub fn is_validation(&self) -> bool {
        matches!(self, ForexError::Validation { .. })
    }
}

impl From<tokio_postgres::Error> for ForexError {
    fn from(value: tokio_postgres::Error) -> Self {
        ForexError::Store {
            reason: value.to_string(),
        }
    }
}

impl From<deadpool_postgres::PoolError> for ForexError {
    fn from(value: deadpool_postgres::PoolError) -> Self {
        ForexError::Store {
            reason: value.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ForexError>;
