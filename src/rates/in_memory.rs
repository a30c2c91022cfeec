//! In-memory rate source
//!
//! Holds pre-loaded rate tables keyed by date. Useful for tests and for
//! sessions that work from a fixed set of rates without touching disk or
//! the network. Every `get_rates` call is counted so callers can check how
//! often a computation reached for rates.
//!
//! # Example
//! ```
//! use dated_money::rates::{InMemoryRateSource, RateSource};
//! use dated_money::Currency;
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//!
//! let date = NaiveDate::from_ymd_opt(2022, 7, 14).unwrap();
//! let source = InMemoryRateSource::new();
//! source.add_rate(date, Currency::EUR, dec!(0.995)).unwrap();
//!
//! assert_eq!(source.get_rate(date, Currency::EUR).unwrap(), Some(dec!(0.995)));
//! assert_eq!(source.calls(), 1);
//! ```

use super::base::{RateQuote, RateSource, RateTable};
use crate::currency::Currency;
use crate::error::{MoneyError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryRateSource {
    tables: RwLock<HashMap<NaiveDate, RateTable>>,
    calls: AtomicUsize,
}

impl InMemoryRateSource {
    /// Create new source with no tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`InMemoryRateSource::add_table`]
    pub fn with_table(self, table: RateTable) -> Self {
        if let Ok(mut tables) = self.tables.write() {
            tables.insert(table.date(), table);
        }
        self
    }

    /// Add or replace the table for its date
    pub fn add_table(&self, table: RateTable) -> Result<()> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        tables.insert(table.date(), table);
        Ok(())
    }

    /// Add a single rate, creating the date's table if needed
    pub fn add_rate(&self, date: NaiveDate, currency: Currency, rate: Decimal) -> Result<()> {
        if rate <= Decimal::ZERO {
            return Err(MoneyError::ParseError(format!(
                "Exchange rate must be positive, got: {}",
                rate
            )));
        }

        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        tables
            .entry(date)
            .or_insert_with(|| RateTable::new(date))
            .insert(currency, rate);
        Ok(())
    }

    /// Number of `get_rates` calls since creation or the last reset
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Reset the lookup counter
    pub fn reset_calls(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    /// Get all dates with a table, ascending
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self
            .tables
            .read()
            .map(|t| t.keys().copied().collect())
            .unwrap_or_default();
        dates.sort();
        dates
    }
}

fn poisoned() -> MoneyError {
    MoneyError::CacheUnavailable("in-memory rate source lock poisoned".to_string())
}

impl RateSource for InMemoryRateSource {
    fn get_rates(&self, date: NaiveDate, currencies: &[Currency]) -> Result<RateQuote> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let tables = self.tables.read().map_err(|_| poisoned())?;
        tables
            .get(&date)
            .map(|table| table.quote(currencies))
            .ok_or(MoneyError::RatesUnavailable { date })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 7, 14).unwrap()
    }

    #[test]
    fn test_lookup_and_call_count() {
        let source = InMemoryRateSource::new().with_table(
            RateTable::new(date())
                .with_rate(Currency::USD, dec!(1))
                .with_rate(Currency::EUR, dec!(0.995)),
        );

        let quote = source.get_rates(date(), &[Currency::EUR, Currency::GBP]).unwrap();
        assert_eq!(quote.rate(Currency::EUR), Some(dec!(0.995)));
        assert_eq!(quote.rate(Currency::GBP), None);
        assert_eq!(source.calls(), 1);

        source.reset_calls();
        assert_eq!(source.calls(), 0);
    }

    #[test]
    fn test_missing_date() {
        let source = InMemoryRateSource::new();
        let err = source.get_rates(date(), &[Currency::EUR]).unwrap_err();
        assert!(matches!(err, MoneyError::RatesUnavailable { .. }));
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn test_rejects_non_positive_rates() {
        let source = InMemoryRateSource::new();
        assert!(source.add_rate(date(), Currency::EUR, dec!(0)).is_err());
        assert!(source.add_rate(date(), Currency::EUR, dec!(-1.2)).is_err());
        assert!(source.dates().is_empty());
    }

    #[test]
    fn test_add_rate_extends_table() {
        let source = InMemoryRateSource::new();
        source.add_rate(date(), Currency::EUR, dec!(0.995)).unwrap();
        source.add_rate(date(), Currency::GBP, dec!(0.8407)).unwrap();

        assert_eq!(source.dates(), vec![date()]);
        assert_eq!(source.cross_rate(date(), Currency::EUR, Currency::EUR).unwrap(), dec!(1));
        assert_eq!(source.get_rate(date(), Currency::GBP).unwrap(), Some(dec!(0.8407)));
    }
}
