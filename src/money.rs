//! Dated monetary values
//!
//! A [`MoneyValue`] is an amount in minor units (hundredths), a currency and
//! a reference date. The reference date selects the rate table used when the
//! value has to be expressed in another currency. Values are immutable;
//! every operation returns a new one.
//!
//! Same-currency work (conversion to the own currency, arithmetic and
//! comparison between values sharing a currency) never consults the rate
//! source. Anything else issues exactly one [`RateSource::get_rates`] call
//! covering every currency it needs.
//!
//! Binary operations between values in different currencies express both
//! operands in the left operand's default currency, using the rates of the
//! later of the two reference dates.

use crate::currency::Currency;
use crate::error::{MoneyError, Result};
use crate::factory::MoneyFactory;
use crate::rates::base::RateSource;
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

const MINOR_PER_MAJOR: Decimal = Decimal::ONE_HUNDRED;
const MINOR_SUFFIX: char = 'c';

/// An amount as given by a caller, before it becomes minor units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Amount {
    /// Major units, e.g. `12.34` dollars
    Major(Decimal),
    /// Minor units, e.g. `1234` cents
    Minor(Decimal),
}

impl Amount {
    /// Amount in minor units. Fails only for major amounts too large to
    /// scale up by a hundred.
    pub fn minor_units(self) -> Result<Decimal> {
        match self {
            Amount::Major(value) => value
                .checked_mul(MINOR_PER_MAJOR)
                .ok_or(overflow("major to minor units")),
            Amount::Minor(value) => Ok(value),
        }
    }

    fn in_range(self, text: &str) -> Result<Self> {
        self.minor_units()
            .map(|_| self)
            .map_err(|_| MoneyError::ParseError(format!("Amount '{}' out of range", text)))
    }
}

fn overflow(operation: &'static str) -> MoneyError {
    MoneyError::Overflow { operation }
}

fn parse_decimal(text: &str) -> Result<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| MoneyError::ParseError(format!("Invalid amount '{}'", text)))
}

impl FromStr for Amount {
    type Err = MoneyError;

    /// `"12.34"` is major units; a trailing `c` (`"1234c"`) marks minor units
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let amount = match s.strip_suffix(MINOR_SUFFIX) {
            Some(minor) => Amount::Minor(parse_decimal(minor)?),
            None => Amount::Major(parse_decimal(s)?),
        };
        amount.in_range(s)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::Major(value)
    }
}

macro_rules! amount_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Amount {
            fn from(value: $t) -> Self {
                Amount::Major(Decimal::from(value))
            }
        })*
    };
}

amount_from_int!(i32, i64, u32, u64);

impl TryFrom<f64> for Amount {
    type Error = MoneyError;

    /// Uses the shortest decimal that round-trips, so `0.1` is exactly `0.1`
    fn try_from(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(MoneyError::ParseError(format!("Invalid amount {}", value)));
        }
        let text = value.to_string();
        Amount::Major(parse_decimal(&text)?).in_range(&text)
    }
}

/// Round to whole minor units, halves away from zero
fn round_minor(minor: Decimal) -> Decimal {
    minor.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Major units with exactly two decimals, from unrounded minor units
fn two_places(minor: Decimal) -> Decimal {
    let mut major = round_minor(minor) / MINOR_PER_MAJOR;
    major.rescale(2);
    major
}

/// Amount of money in a currency, bound to a reference date
#[derive(Clone)]
pub struct MoneyValue {
    minor_units: Decimal,
    currency: Currency,
    reference_date: NaiveDate,
    family: MoneyFactory,
}

impl MoneyValue {
    /// Value from minor units, used as given
    pub fn from_minor_units(
        minor_units: Decimal,
        currency: Currency,
        reference_date: NaiveDate,
        family: &MoneyFactory,
    ) -> Self {
        Self {
            minor_units,
            currency,
            reference_date,
            family: family.clone(),
        }
    }

    /// Value from a major or minor amount
    pub fn new(
        amount: impl Into<Amount>,
        currency: Currency,
        reference_date: NaiveDate,
        family: &MoneyFactory,
    ) -> Result<Self> {
        let minor_units = amount.into().minor_units()?;
        Ok(Self::from_minor_units(minor_units, currency, reference_date, family))
    }

    fn with_parts(&self, minor_units: Decimal, currency: Currency, date: NaiveDate) -> Self {
        Self::from_minor_units(minor_units, currency, date, &self.family)
    }

    /// Amount in minor units of the own currency, unrounded
    pub fn minor_units(&self) -> Decimal {
        self.minor_units
    }

    /// Get the currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Date whose rate table governs conversions of this value
    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Factory this value was created by
    pub fn family(&self) -> &MoneyFactory {
        &self.family
    }

    fn rates(&self) -> &dyn RateSource {
        self.family.rates().as_ref()
    }

    /// Minor units expressed in `target` on the reference date:
    /// `minor * rate(target) / rate(own)`
    pub fn in_minor_units(&self, target: Currency) -> Result<Decimal> {
        if target == self.currency {
            return Ok(self.minor_units);
        }
        let quote = self
            .rates()
            .get_rates(self.reference_date, &[target, self.currency])?;
        quote.convert(self.minor_units, self.currency, target)
    }

    /// Major units in the own currency, unrounded
    pub fn amount(&self) -> Decimal {
        self.minor_units / MINOR_PER_MAJOR
    }

    /// Major units in `target`, optionally rounded to whole minor units first
    pub fn amount_in(&self, target: Currency, rounded: bool) -> Result<Decimal> {
        let minor = self.in_minor_units(target)?;
        let minor = if rounded { round_minor(minor) } else { minor };
        Ok(minor / MINOR_PER_MAJOR)
    }

    /// Same value in `target`, keeping the reference date
    pub fn convert_to(&self, target: Currency) -> Result<MoneyValue> {
        let minor = self.in_minor_units(target)?;
        Ok(self.with_parts(minor, target, self.reference_date))
    }

    /// Same amount and currency on another date. Nothing is converted.
    pub fn rebind_date(&self, date: NaiveDate) -> MoneyValue {
        self.with_parts(self.minor_units, self.currency, date)
    }

    /// Same value with the sign flipped
    pub fn negate(&self) -> MoneyValue {
        self.with_parts(-self.minor_units, self.currency, self.reference_date)
    }

    /// Multiply by a plain number, keeping currency and date
    pub fn scale(&self, factor: Decimal) -> Result<MoneyValue> {
        let minor = self
            .minor_units
            .checked_mul(factor)
            .ok_or(overflow("scale"))?;
        Ok(self.with_parts(minor, self.currency, self.reference_date))
    }

    /// Divide by a plain number, keeping currency and date
    pub fn divide(&self, divisor: Decimal) -> Result<MoneyValue> {
        if divisor.is_zero() {
            return Err(MoneyError::DivisionByZero);
        }
        let minor = self
            .minor_units
            .checked_div(divisor)
            .ok_or(overflow("divide"))?;
        Ok(self.with_parts(minor, self.currency, self.reference_date))
    }

    /// `self / other` as a plain number, with `other` expressed in this
    /// value's currency
    pub fn ratio(&self, other: &MoneyValue) -> Result<Decimal> {
        let (left, right, _) = self.normalized_pair(other, self.currency)?;
        if right.is_zero() {
            return Err(MoneyError::DivisionByZero);
        }
        left.checked_div(right).ok_or(overflow("ratio"))
    }

    /// Both operands in `target` minor units at the later reference date,
    /// plus that date. At most one rate lookup.
    fn normalized_pair(
        &self,
        other: &MoneyValue,
        target: Currency,
    ) -> Result<(Decimal, Decimal, NaiveDate)> {
        let date = self.reference_date.max(other.reference_date);
        if self.currency == target && other.currency == target {
            return Ok((self.minor_units, other.minor_units, date));
        }

        let mut currencies = vec![target];
        for currency in [self.currency, other.currency] {
            if !currencies.contains(&currency) {
                currencies.push(currency);
            }
        }
        let quote = self.rates().get_rates(date, &currencies)?;
        let left = quote.convert(self.minor_units, self.currency, target)?;
        let right = quote.convert(other.minor_units, other.currency, target)?;
        Ok((left, right, date))
    }

    /// Operands as seen by binary operations: untouched when the
    /// currencies match, otherwise in the left family's default currency
    fn common_terms(
        &self,
        other: &MoneyValue,
    ) -> Result<(Decimal, Decimal, Currency, NaiveDate)> {
        if self.currency == other.currency {
            let date = self.reference_date.max(other.reference_date);
            return Ok((self.minor_units, other.minor_units, self.currency, date));
        }
        let target = self.family.default_currency();
        let (left, right, date) = self.normalized_pair(other, target)?;
        Ok((left, right, target, date))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add(&self, other: &MoneyValue) -> Result<MoneyValue> {
        let (left, right, currency, date) = self.common_terms(other)?;
        let sum = left.checked_add(right).ok_or(overflow("add"))?;
        Ok(self.with_parts(sum, currency, date))
    }

    /// `self - other`, normalized the same way as [`MoneyValue::add`]
    pub fn subtract(&self, other: &MoneyValue) -> Result<MoneyValue> {
        let (left, right, currency, date) = self.common_terms(other)?;
        let difference = left.checked_sub(right).ok_or(overflow("subtract"))?;
        Ok(self.with_parts(difference, currency, date))
    }

    /// Add a bare amount in this value's currency and date
    pub fn add_amount(&self, amount: impl Into<Amount>) -> Result<MoneyValue> {
        let minor = amount.into().minor_units()?;
        let sum = self.minor_units.checked_add(minor).ok_or(overflow("add"))?;
        Ok(self.with_parts(sum, self.currency, self.reference_date))
    }

    /// Subtract a bare amount in this value's currency and date
    pub fn sub_amount(&self, amount: impl Into<Amount>) -> Result<MoneyValue> {
        let minor = amount.into().minor_units()?;
        let difference = self
            .minor_units
            .checked_sub(minor)
            .ok_or(overflow("subtract"))?;
        Ok(self.with_parts(difference, self.currency, self.reference_date))
    }

    /// Round minor units to the family's comparison precision
    fn at_precision(&self, minor: Decimal) -> Decimal {
        minor.round_dp_with_strategy(
            self.family.precision(),
            RoundingStrategy::MidpointAwayFromZero,
        )
    }

    /// Order of the two values after normalization and rounding
    pub fn compare(&self, other: &MoneyValue) -> Result<Ordering> {
        let (left, right, _, _) = self.common_terms(other)?;
        Ok(self.at_precision(left).cmp(&self.at_precision(right)))
    }

    /// Equal once normalized and rounded to the family precision
    pub fn equals(&self, other: &MoneyValue) -> Result<bool> {
        Ok(self.compare(other)? == Ordering::Equal)
    }

    /// Get whether `self < other`
    pub fn less_than(&self, other: &MoneyValue) -> Result<bool> {
        Ok(self.compare(other)? == Ordering::Less)
    }

    pub fn greater_than(&self, other: &MoneyValue) -> Result<bool> {
        Ok(self.compare(other)? == Ordering::Greater)
    }

    pub fn less_or_equal(&self, other: &MoneyValue) -> Result<bool> {
        Ok(self.compare(other)? != Ordering::Greater)
    }

    pub fn greater_or_equal(&self, other: &MoneyValue) -> Result<bool> {
        Ok(self.compare(other)? != Ordering::Less)
    }

    /// `{symbol}{amount}` in the family's display currency (own currency
    /// when none is set), rounded to two decimals
    pub fn format(&self) -> Result<String> {
        let currency = self.family.display_currency().unwrap_or(self.currency);
        let minor = self.in_minor_units(currency)?;
        Ok(format!("{}{}", currency.symbol(), two_places(minor)))
    }
}

impl Neg for MoneyValue {
    type Output = MoneyValue;

    fn neg(self) -> MoneyValue {
        self.negate()
    }
}

impl Neg for &MoneyValue {
    type Output = MoneyValue;

    fn neg(self) -> MoneyValue {
        self.negate()
    }
}

impl fmt::Display for MoneyValue {
    /// Descriptive form `"[YYYY-MM-DD ]CODE amount"`, the date only when it
    /// differs from the family's reference date
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reference_date != self.family.reference_date() {
            write!(f, "{} ", self.reference_date)?;
        }
        write!(f, "{} {}", self.currency.code(), two_places(self.minor_units))
    }
}

impl fmt::Debug for MoneyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MoneyValue")
            .field("minor_units", &self.minor_units)
            .field("currency", &self.currency)
            .field("reference_date", &self.reference_date)
            .finish()
    }
}
