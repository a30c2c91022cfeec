//! Rate source that falls back through the configured tiers
//!
//! For a date, in order, first hit wins:
//!
//! 1. the persistent store (requested columns only),
//! 2. the snapshot repository (synced on a miss),
//! 3. the rate API.
//!
//! Tables found in tiers 2 and 3 are written back to the store whole before
//! the requested rates are returned. Store failures propagate as
//! [`MoneyError::CacheUnavailable`]; they are not treated as a miss.

use super::api::RateApi;
use super::base::{RateQuote, RateSource, RateTable};
use super::snapshot::SnapshotRepo;
use super::store::{RateStore, StoreHold};
use crate::currency::Currency;
use crate::error::{MoneyError, Result};
use chrono::NaiveDate;
use std::fmt;
use std::sync::Arc;

/// Where a table was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateTier {
    Cache,
    Snapshot,
    Api,
}

impl fmt::Display for RateTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateTier::Cache => write!(f, "cache"),
            RateTier::Snapshot => write!(f, "snapshot"),
            RateTier::Api => write!(f, "api"),
        }
    }
}

/// Cache, snapshot and API tiers behind one [`RateSource`]
#[derive(Default)]
pub struct TieredRateSource {
    store: Option<Arc<dyn RateStore>>,
    snapshots: Option<SnapshotRepo>,
    api: Option<Box<dyn RateApi>>,
}

impl TieredRateSource {
    /// Source with no tiers; every lookup fails until tiers are added
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the persistent cache tier
    pub fn with_store(mut self, store: Arc<dyn RateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Add the snapshot repository tier
    pub fn with_snapshots(mut self, snapshots: SnapshotRepo) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    /// Add the rate API tier
    pub fn with_api(mut self, api: Box<dyn RateApi>) -> Self {
        self.api = Some(api);
        self
    }

    /// Get the cache tier, if configured
    pub fn store(&self) -> Option<&Arc<dyn RateStore>> {
        self.store.as_ref()
    }

    /// Get the snapshot tier, if configured
    pub fn snapshots(&self) -> Option<&SnapshotRepo> {
        self.snapshots.as_ref()
    }

    /// Table for `date` from the snapshot or API tier, without the cache
    fn fetch_uncached(&self, date: NaiveDate) -> Result<Option<(RateTable, RateTier)>> {
        if let Some(snapshots) = &self.snapshots {
            log::debug!("Looking for a {} snapshot in {}", date, snapshots.root().display());
            if let Some(table) = snapshots.read(date)? {
                return Ok(Some((table, RateTier::Snapshot)));
            }
        }

        if let Some(api) = &self.api {
            log::debug!("Requesting {} rates from the API", date);
            return Ok(Some((api.fetch(date)?, RateTier::Api)));
        }

        Ok(None)
    }

    /// Full table for `date` and the tier it came from, writing back to
    /// the store when it was not already cached
    pub fn resolve(&self, date: NaiveDate) -> Result<(RateTable, RateTier)> {
        let _hold = self.hold()?;
        if let Some(store) = &self.store {
            if let Some(table) = store.get_table(date)? {
                return Ok((table, RateTier::Cache));
            }
        }

        let (table, tier) = self
            .fetch_uncached(date)?
            .ok_or(MoneyError::RatesUnavailable { date })?;
        self.write_back(&table, tier)?;
        Ok((table, tier))
    }

    fn write_back(&self, table: &RateTable, tier: RateTier) -> Result<()> {
        if let Some(store) = &self.store {
            store.put(table)?;
            log::info!(
                "Cached {} rates for {} from the {} tier",
                table.len(),
                table.date(),
                tier
            );
        }
        Ok(())
    }

    /// Copy every snapshot file into the store. Returns the number of
    /// dates written.
    pub fn import_snapshots(&self) -> Result<usize> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| MoneyError::ConfigError("no rate cache configured".to_string()))?;
        let snapshots = self.snapshots.as_ref().ok_or_else(|| {
            MoneyError::ConfigError("no snapshot repository configured".to_string())
        })?;

        let dates = snapshots.dates()?;
        let _hold = store.hold()?;
        let mut imported = 0;
        for date in dates {
            if let Some(table) = snapshots.read(date)? {
                store.put(&table)?;
                imported += 1;
            }
        }
        log::info!(
            "Imported {} snapshots from {}",
            imported,
            snapshots.snapshot_dir().display()
        );
        Ok(imported)
    }
}

impl RateSource for TieredRateSource {
    fn get_rates(&self, date: NaiveDate, currencies: &[Currency]) -> Result<RateQuote> {
        // Cache read and write-back share one connection
        let _hold = self.hold()?;
        if let Some(store) = &self.store {
            if let Some(quote) = store.get(date, currencies)? {
                log::debug!("Rates for {} served from cache", date);
                return Ok(quote);
            }
        }

        match self.fetch_uncached(date)? {
            Some((table, tier)) => {
                self.write_back(&table, tier)?;
                Ok(table.quote(currencies))
            }
            None => Err(MoneyError::RatesUnavailable { date }),
        }
    }

    fn hold(&self) -> Result<StoreHold<'_>> {
        match &self.store {
            Some(store) => store.hold(),
            None => Ok(StoreHold::none()),
        }
    }
}
