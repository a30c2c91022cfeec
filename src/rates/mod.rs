//! Exchange rate system
//!
//! Resolves, per calendar date, the rate of each currency against a single
//! base currency (USD).
//!
//! # Components
//!
//! - **base**: Core types (RateTable, RateQuote) and the RateSource trait
//! - **store**: Persistent cache interface plus an in-memory store
//! - **sqlite**: SQLite-backed cache, one row per date
//! - **snapshot**: Per-date JSON snapshots in a git-synced repository
//! - **api**: exchangerate-api.com client
//! - **tiered**: Cache -> snapshot -> API fallback with write-back
//! - **in_memory**: Fixed tables for tests and offline use
//! - **exploding**: Testing stub that panics on any lookup
//! - **prefetch**: Paced bulk fetch over a date range
//!
//! # Example
//!
//! ```rust
//! use dated_money::rates::{InMemoryRateSource, RateSource, RateTable};
//! use dated_money::Currency;
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//!
//! let date = NaiveDate::from_ymd_opt(2022, 7, 14).unwrap();
//! let source = InMemoryRateSource::new().with_table(
//!     RateTable::new(date)
//!         .with_rate(Currency::EUR, dec!(0.8))
//!         .with_rate(Currency::GBP, dec!(0.5)),
//! );
//!
//! // 1 GBP = 0.8 / 0.5 EUR
//! let rate = source.cross_rate(date, Currency::GBP, Currency::EUR).unwrap();
//! assert_eq!(rate, dec!(1.6));
//! ```

pub mod api;
pub mod base;
pub mod exploding;
pub mod in_memory;
pub mod prefetch;
pub mod snapshot;
#[cfg(feature = "rusqlite-support")]
pub mod sqlite;
pub mod store;
pub mod tiered;

pub use api::RateApi;
#[cfg(feature = "api")]
pub use api::ExchangeRateApi;
pub use base::{parse_date, today, RateQuote, RateSource, RateTable, DEFAULT_BASE_CURRENCY};
pub use exploding::ExplodingRateSource;
pub use in_memory::InMemoryRateSource;
pub use prefetch::{prefetch_range, FailurePolicy, PrefetchOptions, PrefetchReport};
pub use snapshot::{SnapshotRepo, SyncMode};
#[cfg(feature = "rusqlite-support")]
pub use sqlite::SqliteRateStore;
pub use store::{MemoryRateStore, RateStore, StoreHold};
pub use tiered::{RateTier, TieredRateSource};
