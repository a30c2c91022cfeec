//! Base rate types - RateTable, RateQuote and the RateSource trait

use super::store::StoreHold;
use crate::currency::Currency;
use crate::error::{MoneyError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

/// Currency every external table is quoted against
pub const DEFAULT_BASE_CURRENCY: Currency = Currency::USD;

/// Today's date in local time
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|e| MoneyError::ParseError(format!("Invalid date '{}': {}", text, e)))
}

/// Decimal from a JSON number, keeping the digits as written
pub(crate) fn decimal_from_json(number: &serde_json::Number) -> Option<Decimal> {
    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Full set of rates for one calendar date, all quoted against one base.
///
/// Immutable once handed out by a source; tiers build it and the cache
/// stores it whole.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    date: NaiveDate,
    base: Currency,
    rates: BTreeMap<Currency, Decimal>,
}

impl RateTable {
    /// Empty table quoted against USD
    pub fn new(date: NaiveDate) -> Self {
        Self::with_base(date, DEFAULT_BASE_CURRENCY)
    }

    /// Create new empty table quoted against `base`
    pub fn with_base(date: NaiveDate, base: Currency) -> Self {
        Self {
            date,
            base,
            rates: BTreeMap::new(),
        }
    }

    /// Builder-style insert
    pub fn with_rate(mut self, currency: Currency, rate: Decimal) -> Self {
        self.rates.insert(currency, rate);
        self
    }

    /// Set the rate for `currency`, replacing any previous one
    pub fn insert(&mut self, currency: Currency, rate: Decimal) {
        self.rates.insert(currency, rate);
    }

    /// Build from a `conversion_rates` JSON object. Codes outside the
    /// catalog and values that are not decimals are skipped.
    pub fn from_json_rates(
        date: NaiveDate,
        base: Currency,
        rates: &BTreeMap<String, serde_json::Number>,
    ) -> Self {
        let mut table = Self::with_base(date, base);
        for (code, value) in rates {
            match (Currency::from_code(code), decimal_from_json(value)) {
                (Some(currency), Some(rate)) => table.insert(currency, rate),
                (None, _) => log::debug!("Skipping unsupported currency {} on {}", code, date),
                (_, None) => log::warn!("Skipping unreadable rate {} for {} on {}", value, code, date),
            }
        }
        table
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Currency every rate is quoted against
    pub fn base(&self) -> Currency {
        self.base
    }

    /// Get the rate for a currency
    pub fn get(&self, currency: Currency) -> Option<Decimal> {
        self.rates.get(&currency).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Rates in currency order
    pub fn iter(&self) -> impl Iterator<Item = (Currency, Decimal)> + '_ {
        self.rates.iter().map(|(c, r)| (*c, *r))
    }

    /// Restrict the table to the requested currencies
    pub fn quote(&self, currencies: &[Currency]) -> RateQuote {
        let mut quote = RateQuote::new(self.date);
        for currency in currencies {
            quote.insert(*currency, self.get(*currency));
        }
        quote
    }
}

/// Rates for the currencies requested from a source on one date.
///
/// A requested currency the source has no column for maps to `None`;
/// absence only becomes an error when a conversion actually needs it.
#[derive(Debug, Clone, PartialEq)]
pub struct RateQuote {
    date: NaiveDate,
    rates: HashMap<Currency, Option<Decimal>>,
}

impl RateQuote {
    /// Create new empty quote for `date`
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            rates: HashMap::new(),
        }
    }

    pub fn insert(&mut self, currency: Currency, rate: Option<Decimal>) {
        self.rates.insert(currency, rate);
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Rate for `currency`; `None` when requested but not stored
    pub fn rate(&self, currency: Currency) -> Option<Decimal> {
        self.rates.get(&currency).copied().flatten()
    }

    /// Whether `currency` was requested
    pub fn contains(&self, currency: Currency) -> bool {
        self.rates.contains_key(&currency)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Rate that must be present and non-zero
    pub fn require(&self, currency: Currency) -> Result<Decimal> {
        match self.rate(currency) {
            Some(rate) if !rate.is_zero() => Ok(rate),
            _ => Err(MoneyError::ConversionRateUnavailable {
                currency,
                date: self.date,
            }),
        }
    }

    /// Units of `to` per unit of `from`: `rate(to) / rate(from)`
    pub fn cross_rate(&self, from: Currency, to: Currency) -> Result<Decimal> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        let to_rate = self.require(to)?;
        let from_rate = self.require(from)?;
        to_rate
            .checked_div(from_rate)
            .ok_or(MoneyError::Overflow { operation: "cross rate" })
    }

    /// Convert an amount: `amount * rate(to) / rate(from)`
    pub fn convert(&self, amount: Decimal, from: Currency, to: Currency) -> Result<Decimal> {
        if from == to {
            return Ok(amount);
        }
        let to_rate = self.require(to)?;
        let from_rate = self.require(from)?;
        // Dividing first loses digits, so only when the product overflows
        amount
            .checked_mul(to_rate)
            .and_then(|scaled| scaled.checked_div(from_rate))
            .or_else(|| amount.checked_div(from_rate)?.checked_mul(to_rate))
            .ok_or(MoneyError::Overflow { operation: "currency conversion" })
    }
}

/// Trait for resolving exchange rates by calendar date
pub trait RateSource: Send + Sync {
    /// Rates against the base currency for each requested currency on
    /// `date`. Fails with [`MoneyError::RatesUnavailable`] when the source
    /// has no table at all for the date.
    fn get_rates(&self, date: NaiveDate, currencies: &[Currency]) -> Result<RateQuote>;

    /// Single-currency convenience over [`RateSource::get_rates`]
    fn get_rate(&self, date: NaiveDate, currency: Currency) -> Result<Option<Decimal>> {
        Ok(self.get_rates(date, &[currency])?.rate(currency))
    }

    /// Conversion factor from `from` to `to` on `date`
    fn cross_rate(&self, date: NaiveDate, from: Currency, to: Currency) -> Result<Decimal> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        self.get_rates(date, &[from, to])?.cross_rate(from, to)
    }

    /// Keep any backing store open until the returned hold is dropped.
    /// Sources without one return an empty hold.
    fn hold(&self) -> Result<StoreHold<'_>> {
        Ok(StoreHold::none())
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
    fn test_table_quote_marks_missing_currencies() {
        let table = RateTable::new(date())
            .with_rate(Currency::USD, dec!(1))
            .with_rate(Currency::EUR, dec!(0.995));

        let quote = table.quote(&[Currency::EUR, Currency::GBP]);
        assert_eq!(quote.rate(Currency::EUR), Some(dec!(0.995)));
        assert!(quote.contains(Currency::GBP));
        assert_eq!(quote.rate(Currency::GBP), None);
        assert!(!quote.contains(Currency::USD));
    }

    #[test]
    fn test_cross_rate_uses_ratio_of_base_quotes() {
        let table = RateTable::new(date())
            .with_rate(Currency::EUR, dec!(0.8))
            .with_rate(Currency::GBP, dec!(0.5));
        let quote = table.quote(&[Currency::EUR, Currency::GBP]);

        // 1 GBP = 0.8 / 0.5 EUR
        assert_eq!(quote.cross_rate(Currency::GBP, Currency::EUR).unwrap(), dec!(1.6));
        assert_eq!(quote.convert(dec!(1000), Currency::GBP, Currency::EUR).unwrap(), dec!(1600));
        assert_eq!(quote.cross_rate(Currency::EUR, Currency::EUR).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_convert_reports_overflow() {
        let quote = RateTable::new(date())
            .with_rate(Currency::USD, dec!(100))
            .with_rate(Currency::INR, dec!(79.6))
            .quote(&[Currency::USD, Currency::INR]);

        // The product overflows but the result itself fits
        let large = Decimal::from_i128_with_scale(10i128.pow(27), 0);
        let expected = Decimal::from_i128_with_scale(796 * 10i128.pow(24), 0);
        assert_eq!(quote.convert(large, Currency::USD, Currency::INR).unwrap(), expected);

        let err = quote
            .convert(Decimal::MAX, Currency::INR, Currency::USD)
            .unwrap_err();
        assert!(matches!(err, MoneyError::Overflow { .. }));
    }

    #[test]
    fn test_zero_or_missing_rate_is_unavailable() {
        let quote = RateTable::new(date())
            .with_rate(Currency::EUR, Decimal::ZERO)
            .quote(&[Currency::EUR, Currency::USD]);

        let err = quote.convert(dec!(100), Currency::EUR, Currency::USD).unwrap_err();
        assert!(matches!(err, MoneyError::ConversionRateUnavailable { currency: Currency::USD, .. }));

        let err = quote.require(Currency::EUR).unwrap_err();
        assert!(matches!(err, MoneyError::ConversionRateUnavailable { currency: Currency::EUR, .. }));
    }

    #[test]
    fn test_from_json_rates_skips_unknown_codes() {
        let json = r#"{"USD": 1, "EUR": 0.93, "XBT": 0.00003, "JPY": 1.5e2}"#;
        let rates: BTreeMap<String, serde_json::Number> = serde_json::from_str(json).unwrap();
        let table = RateTable::from_json_rates(date(), Currency::USD, &rates);

        assert_eq!(table.len(), 3);
        assert_eq!(table.get(Currency::EUR), Some(dec!(0.93)));
        assert_eq!(table.get(Currency::JPY), Some(dec!(150)));
        assert_eq!(table.base(), Currency::USD);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2022-07-14").unwrap(), date());
        assert!(matches!(parse_date("14/07/2022"), Err(MoneyError::ParseError(_))));
    }
}
