//! Error types for dated-money

use crate::currency::Currency;
use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for dated-money
#[derive(Error, Debug)]
pub enum MoneyError {
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// Every rate tier was consulted and none had a table for the date
    #[error("No exchange rates available for {date}")]
    RatesUnavailable { date: NaiveDate },

    #[error("Conversion rate for {currency} unavailable on {date}")]
    ConversionRateUnavailable { currency: Currency, date: NaiveDate },

    /// The API tier refused a historical date (access level, missing data)
    #[error("Historical rates for {date} unavailable from the rate API: {reason}")]
    HistoricalRateUnavailable { date: NaiveDate, reason: String },

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Rate cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Rate API error: {0}")]
    RateApi(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Division by zero")]
    DivisionByZero,

    /// Result does not fit in a 96-bit decimal
    #[error("Numerical overflow in {operation}")]
    Overflow { operation: &'static str },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl MoneyError {
    /// True for the conditions that mean "no rate", as opposed to
    /// infrastructure or input failures.
    pub fn is_rate_unavailable(&self) -> bool {
        matches!(
            self,
            MoneyError::RatesUnavailable { .. }
                | MoneyError::ConversionRateUnavailable { .. }
                | MoneyError::HistoricalRateUnavailable { .. }
        )
    }
}

/// Result type alias for dated-money operations
pub type Result<T> = std::result::Result<T, MoneyError>;
