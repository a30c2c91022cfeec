//! Persistent rate cache interface
//!
//! A store holds at most one row per calendar date. Writing a date again
//! replaces the previous row (last write wins).

use super::base::{RateQuote, RateTable};
use crate::currency::Currency;
use crate::error::{MoneyError, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// File name of the persistent cache inside the cache directory
pub const CACHE_FILE_NAME: &str = "exchange-rates.db";

/// Keeps a store's connection (or file, or handle) open while alive.
/// Dropping it releases whatever it holds.
pub struct StoreHold<'a> {
    guard: Option<Box<dyn Send + 'a>>,
}

impl<'a> StoreHold<'a> {
    /// Hold that keeps nothing open
    pub fn none() -> Self {
        Self { guard: None }
    }

    /// Hold owning `guard` until dropped
    pub fn new(guard: impl Send + 'a) -> Self {
        Self {
            guard: Some(Box::new(guard)),
        }
    }

    /// True when something is actually held open
    pub fn is_holding(&self) -> bool {
        self.guard.is_some()
    }
}

/// Get/put store for rate tables keyed by date
pub trait RateStore: Send + Sync {
    /// Full row for `date`, or `None` if the date was never stored
    fn get_table(&self, date: NaiveDate) -> Result<Option<RateTable>>;

    /// Store a full table, replacing any row for the same date
    fn put(&self, table: &RateTable) -> Result<()>;

    /// Requested columns of the row for `date`. A currency without a
    /// column maps to `None`; only a missing row yields `Ok(None)`.
    fn get(&self, date: NaiveDate, currencies: &[Currency]) -> Result<Option<RateQuote>> {
        Ok(self.get_table(date)?.map(|table| table.quote(currencies)))
    }

    /// Every stored date, ascending
    fn dates(&self) -> Result<Vec<NaiveDate>>;

    /// Keep the store open until the returned hold is dropped, so a batch
    /// of reads and writes reuses one connection
    fn hold(&self) -> Result<StoreHold<'_>> {
        Ok(StoreHold::none())
    }
}

/// In-memory store, used in tests and for throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryRateStore {
    tables: RwLock<BTreeMap<NaiveDate, RateTable>>,
}

impl MemoryRateStore {
    /// Create new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored dates
    pub fn len(&self) -> usize {
        self.tables.read().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> MoneyError {
    MoneyError::CacheUnavailable("in-memory store lock poisoned".to_string())
}

impl RateStore for MemoryRateStore {
    fn get_table(&self, date: NaiveDate) -> Result<Option<RateTable>> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables.get(&date).cloned())
    }

    fn put(&self, table: &RateTable) -> Result<()> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        tables.insert(table.date(), table.clone());
        Ok(())
    }

    fn dates(&self) -> Result<Vec<NaiveDate>> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables.keys().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryRateStore::new();
        let date = NaiveDate::from_ymd_opt(2022, 7, 14).unwrap();
        assert!(store.get(date, &[Currency::EUR]).unwrap().is_none());

        store
            .put(&RateTable::new(date).with_rate(Currency::EUR, dec!(0.995)))
            .unwrap();

        let quote = store.get(date, &[Currency::EUR, Currency::GBP]).unwrap().unwrap();
        assert_eq!(quote.rate(Currency::EUR), Some(dec!(0.995)));
        assert_eq!(quote.rate(Currency::GBP), None);
        assert_eq!(store.dates().unwrap(), vec![date]);
    }

    #[test]
    fn test_last_write_wins() {
        let store = MemoryRateStore::new();
        let date = NaiveDate::from_ymd_opt(2022, 7, 14).unwrap();

        store.put(&RateTable::new(date).with_rate(Currency::EUR, dec!(0.9))).unwrap();
        store.put(&RateTable::new(date).with_rate(Currency::EUR, dec!(0.95))).unwrap();

        assert_eq!(store.len(), 1);
        let table = store.get_table(date).unwrap().unwrap();
        assert_eq!(table.get(Currency::EUR), Some(dec!(0.95)));
    }

    #[test]
    fn test_memory_store_holds_nothing() {
        let store = MemoryRateStore::new();
        assert!(!store.hold().unwrap().is_holding());
    }
}
