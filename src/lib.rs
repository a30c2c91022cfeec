//! # dated-money
//!
//! Monetary amounts bound to a currency and a reference date, converted with
//! the exchange rates of that date.
//!
//! Rates are resolved per calendar date through a [`rates::RateSource`];
//! the usual one is [`rates::TieredRateSource`], which looks in a SQLite
//! cache, then a git-synced directory of JSON snapshots, then
//! exchangerate-api.com, caching whatever it finds.
//!
//! ## Example
//!
//! ```rust
//! use dated_money::prelude::*;
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use std::sync::Arc;
//!
//! let date = NaiveDate::from_ymd_opt(2022, 7, 14).unwrap();
//! let rates = InMemoryRateSource::new().with_table(
//!     RateTable::new(date)
//!         .with_rate(Currency::USD, dec!(1))
//!         .with_rate(Currency::EUR, dec!(0.995)),
//! );
//!
//! let money = MoneyFactory::create(FactoryConfig::new(Currency::EUR).on(date), Arc::new(rates));
//! let price = money.money(40).unwrap();
//!
//! let in_usd = price.convert_to(Currency::USD).unwrap();
//! assert_eq!(in_usd.amount_in(Currency::USD, true).unwrap(), dec!(40.20));
//! assert_eq!(price.to_string(), "EUR 40.00");
//! ```

pub mod config;
pub mod currency;
pub mod error;
pub mod factory;
pub mod money;
pub mod rates;

pub use currency::Currency;
pub use error::{MoneyError, Result};
pub use factory::{FactoryConfig, MoneyFactory};
pub use money::{Amount, MoneyValue};

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::config::RatesConfig;
    pub use crate::currency::Currency;
    pub use crate::error::{MoneyError, Result};
    pub use crate::factory::{FactoryConfig, MoneyFactory};
    pub use crate::money::{Amount, MoneyValue};
    pub use crate::rates::{
        InMemoryRateSource, RateQuote, RateSource, RateStore, RateTable, TieredRateSource,
    };
}
