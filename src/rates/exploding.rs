//! Exploding rate source - testing stub
//!
//! Panics on any lookup. Use it wherever a computation must never need
//! exchange rates, e.g. arithmetic and comparison between values that share
//! a currency.

use super::base::{RateQuote, RateSource};
use crate::currency::Currency;
use crate::error::Result;
use chrono::NaiveDate;

/// Rate source that panics when asked for rates
///
/// # Example
/// ```should_panic
/// use dated_money::rates::{ExplodingRateSource, RateSource};
/// use dated_money::Currency;
/// use chrono::NaiveDate;
///
/// let source = ExplodingRateSource::new();
/// let date = NaiveDate::from_ymd_opt(2022, 7, 14).unwrap();
///
/// // This will panic!
/// source.get_rates(date, &[Currency::EUR]).unwrap();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplodingRateSource {
    message: Option<&'static str>,
}

impl ExplodingRateSource {
    /// Create new exploding rate source
    pub fn new() -> Self {
        Self { message: None }
    }

    /// Create new exploding rate source with a custom panic message
    pub fn with_message(message: &'static str) -> Self {
        Self {
            message: Some(message),
        }
    }

    fn panic_message(&self) -> &'static str {
        self.message
            .unwrap_or("Exchange rate access not allowed! These values should share a currency.")
    }
}

impl RateSource for ExplodingRateSource {
    fn get_rates(&self, date: NaiveDate, currencies: &[Currency]) -> Result<RateQuote> {
        let codes: Vec<&str> = currencies.iter().map(|c| c.code()).collect();
        panic!(
            "{}\n\nAttempted lookup: [{}] on {}",
            self.panic_message(),
            codes.join(", "),
            date
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 7, 14).unwrap()
    }

    #[test]
    #[should_panic(expected = "Exchange rate access not allowed")]
    fn test_lookup_panics() {
        let _ = ExplodingRateSource::new().get_rates(date(), &[Currency::EUR]);
    }

    #[test]
    #[should_panic(expected = "Custom error message")]
    fn test_custom_message() {
        let _ = ExplodingRateSource::with_message("Custom error message")
            .get_rate(date(), Currency::USD);
    }

    #[test]
    fn test_same_currency_cross_rate_never_looks_up() {
        let source = ExplodingRateSource::new();
        let rate = source.cross_rate(date(), Currency::EUR, Currency::EUR).unwrap();
        assert_eq!(rate, rust_decimal::Decimal::ONE);
    }
}
