//! Money factories
//!
//! A [`MoneyFactory`] fills in what a caller leaves out when creating a
//! [`MoneyValue`]: the currency, the reference date, the currency used for
//! formatting and the comparison precision. Values created by different
//! factories still interoperate; the factory only decides defaults.
//!
//! # Example
//! ```
//! use dated_money::{Currency, FactoryConfig, MoneyFactory};
//! use dated_money::rates::{InMemoryRateSource, RateTable};
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use std::sync::Arc;
//!
//! let date = NaiveDate::from_ymd_opt(2022, 7, 14).unwrap();
//! let rates = InMemoryRateSource::new().with_table(
//!     RateTable::new(date)
//!         .with_rate(Currency::USD, dec!(1))
//!         .with_rate(Currency::GBP, dec!(0.8407)),
//! );
//!
//! let money = MoneyFactory::create(
//!     FactoryConfig::new(Currency::GBP)
//!         .on(date)
//!         .with_display_currency(Currency::USD),
//!     Arc::new(rates),
//! );
//! assert_eq!(money.money(20).unwrap().format().unwrap(), "$23.79");
//! ```

use crate::currency::Currency;
use crate::error::{MoneyError, Result};
use crate::money::{Amount, MoneyValue};
use crate::rates::base::{parse_date, today, RateSource};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Defaults applied by a [`MoneyFactory`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    pub default_currency: Currency,
    /// Fixed reference date; today's date when unset
    pub reference_date: Option<NaiveDate>,
    /// Currency used by [`MoneyValue::format`]; the value's own when unset
    pub display_currency: Option<Currency>,
    /// Decimal digits of a minor unit kept when comparing; 0 compares
    /// whole minor units
    pub precision: u32,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self::new(Currency::USD)
    }
}

impl FactoryConfig {
    /// Create new config dated today, formatting in each value's own currency
    pub fn new(default_currency: Currency) -> Self {
        Self {
            default_currency,
            reference_date: None,
            display_currency: None,
            precision: 0,
        }
    }

    /// Fix the reference date
    pub fn on(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Format values in `currency`
    pub fn with_display_currency(mut self, currency: Currency) -> Self {
        self.display_currency = Some(currency);
        self
    }

    /// Set the comparison precision
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }
}

struct Family {
    default_currency: Currency,
    reference_date: NaiveDate,
    display_currency: Option<Currency>,
    precision: u32,
    rates: Arc<dyn RateSource>,
}

/// Creates [`MoneyValue`]s from bare amounts.
///
/// Cheap to clone; every value it creates holds a handle to the same
/// configuration and rate source.
#[derive(Clone)]
pub struct MoneyFactory {
    inner: Arc<Family>,
}

impl MoneyFactory {
    /// Factory for `config`. An unset reference date is fixed to today now,
    /// not at each use.
    pub fn create(config: FactoryConfig, rates: Arc<dyn RateSource>) -> Self {
        Self {
            inner: Arc::new(Family {
                default_currency: config.default_currency,
                reference_date: config.reference_date.unwrap_or_else(today),
                display_currency: config.display_currency,
                precision: config.precision,
                rates,
            }),
        }
    }

    /// Create new factory dated today
    pub fn new(default_currency: Currency, rates: Arc<dyn RateSource>) -> Self {
        Self::create(FactoryConfig::new(default_currency), rates)
    }

    /// Currency for values created without one, and the common currency of
    /// mixed-currency operations
    pub fn default_currency(&self) -> Currency {
        self.inner.default_currency
    }

    /// Get the reference date
    pub fn reference_date(&self) -> NaiveDate {
        self.inner.reference_date
    }

    /// Currency `MoneyValue::format` renders in, if not the value's own
    pub fn display_currency(&self) -> Option<Currency> {
        self.inner.display_currency
    }

    /// Decimal digits of a minor unit kept when comparing
    pub fn precision(&self) -> u32 {
        self.inner.precision
    }

    /// Get the rate source
    pub fn rates(&self) -> &Arc<dyn RateSource> {
        &self.inner.rates
    }

    /// Configuration with the reference date resolved
    pub fn config(&self) -> FactoryConfig {
        FactoryConfig {
            default_currency: self.inner.default_currency,
            reference_date: Some(self.inner.reference_date),
            display_currency: self.inner.display_currency,
            precision: self.inner.precision,
        }
    }

    fn derive(&self, config: FactoryConfig) -> Self {
        Self::create(config, Arc::clone(&self.inner.rates))
    }

    /// New factory with another reference date. Values already created
    /// keep theirs.
    pub fn on(&self, date: NaiveDate) -> Self {
        self.derive(self.config().on(date))
    }

    /// New factory formatting in `currency`
    pub fn with_display_currency(&self, currency: Currency) -> Self {
        self.derive(self.config().with_display_currency(currency))
    }

    /// New factory comparing at `precision`
    pub fn with_precision(&self, precision: u32) -> Self {
        self.derive(self.config().with_precision(precision))
    }

    /// Value in the default currency on the reference date
    pub fn money(&self, amount: impl Into<Amount>) -> Result<MoneyValue> {
        self.money_on(amount, self.inner.default_currency, self.inner.reference_date)
    }

    /// Value in `currency` on the reference date
    pub fn money_in(&self, amount: impl Into<Amount>, currency: Currency) -> Result<MoneyValue> {
        self.money_on(amount, currency, self.inner.reference_date)
    }

    /// Value in `currency` on `date`. Fails with [`MoneyError::Overflow`]
    /// when a major amount does not fit once expressed in minor units.
    pub fn money_on(
        &self,
        amount: impl Into<Amount>,
        currency: Currency,
        date: NaiveDate,
    ) -> Result<MoneyValue> {
        MoneyValue::new(amount, currency, date, self)
    }

    /// Value from textual parts as typed by a user: an amount (`"12.34"` or
    /// `"1234c"`), a currency code or symbol and a `YYYY-MM-DD` date
    pub fn from_parts(
        &self,
        amount: &str,
        currency: Option<&str>,
        date: Option<&str>,
    ) -> Result<MoneyValue> {
        let amount: Amount = amount.parse()?;
        let currency = match currency {
            Some(token) => Currency::parse(token)?,
            None => self.inner.default_currency,
        };
        let date = match date {
            Some(text) => parse_date(text)?,
            None => self.inner.reference_date,
        };
        self.money_on(amount, currency, date)
    }

    /// Parse the descriptive form written by `MoneyValue`'s `Display`:
    /// `"[YYYY-MM-DD ]CODE amount"`
    pub fn parse(&self, text: &str) -> Result<MoneyValue> {
        let parts: Vec<&str> = text.split_whitespace().collect();
        match parts.as_slice() {
            [date, currency, amount] => self.from_parts(amount, Some(*currency), Some(*date)),
            [currency, amount] => self.from_parts(amount, Some(*currency), None),
            _ => Err(MoneyError::ParseError(format!(
                "Expected '[date] CURRENCY amount', got '{}'",
                text
            ))),
        }
    }

    /// Zero in the default currency
    pub fn zero(&self) -> MoneyValue {
        MoneyValue::from_minor_units(
            Decimal::ZERO,
            self.inner.default_currency,
            self.inner.reference_date,
            self,
        )
    }

    /// Add up `values` from zero in the default currency
    pub fn sum<'a, I>(&self, values: I) -> Result<MoneyValue>
    where
        I: IntoIterator<Item = &'a MoneyValue>,
    {
        values
            .into_iter()
            .try_fold(self.zero(), |total, value| total.add(value))
    }
}

impl PartialEq for MoneyFactory {
    /// Same configuration and the same rate source instance
    fn eq(&self, other: &Self) -> bool {
        let same_rates = std::ptr::eq(
            Arc::as_ptr(&self.inner.rates) as *const (),
            Arc::as_ptr(&other.inner.rates) as *const (),
        );
        same_rates && self.config() == other.config()
    }
}

impl fmt::Debug for MoneyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MoneyFactory")
            .field("default_currency", &self.inner.default_currency)
            .field("reference_date", &self.inner.reference_date)
            .field("display_currency", &self.inner.display_currency)
            .field("precision", &self.inner.precision)
            .finish()
    }
}
