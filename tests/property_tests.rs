//! Property-based tests for the currency catalog and money arithmetic

use chrono::NaiveDate;
use dated_money::prelude::*;
use dated_money::rates::ExplodingRateSource;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 7, 14).unwrap()
}

fn any_currency() -> impl Strategy<Value = Currency> {
    prop::sample::select(Currency::VARIANTS.to_vec())
}

/// Minor units with up to two extra decimals, as produced by scaling
fn any_minor_units() -> impl Strategy<Value = Decimal> {
    (-10_000_000i64..10_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Positive rate with four decimals, between 0.0001 and 10000
fn any_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|n| Decimal::new(n, 4))
}

fn table_with(rates: &[(Currency, Decimal)]) -> RateTable {
    rates
        .iter()
        .fold(RateTable::new(date()), |t, (c, r)| t.with_rate(*c, *r))
}

proptest! {
    #[test]
    fn prop_every_symbol_parses(currency in any_currency()) {
        prop_assert!(Currency::parse(currency.symbol()).is_ok());
        prop_assert_eq!(Currency::parse(currency.code()).unwrap(), currency);
        prop_assert_eq!(Currency::parse(&currency.code().to_lowercase()).unwrap(), currency);
    }

    #[test]
    fn prop_same_currency_never_reads_rates(
        currency in any_currency(),
        a in any_minor_units(),
        b in any_minor_units(),
    ) {
        let money = MoneyFactory::create(
            FactoryConfig::new(Currency::USD).on(date()),
            Arc::new(ExplodingRateSource::new()),
        );
        let x = money.money_in(Amount::Minor(a), currency).unwrap();
        let y = money.money_in(Amount::Minor(b), currency).unwrap();

        prop_assert_eq!(x.in_minor_units(currency).unwrap(), a);
        prop_assert_eq!(x.add(&y).unwrap().minor_units(), a + b);
        prop_assert_eq!(x.subtract(&y).unwrap().minor_units(), a - b);
        x.compare(&y).unwrap();
    }

    #[test]
    fn prop_addition_commutes(
        a in any_minor_units(),
        b in any_minor_units(),
        eur in any_rate(),
        gbp in any_rate(),
    ) {
        let rates = InMemoryRateSource::new().with_table(table_with(&[
            (Currency::USD, Decimal::ONE),
            (Currency::EUR, eur),
            (Currency::GBP, gbp),
        ]));
        let money = MoneyFactory::create(FactoryConfig::new(Currency::USD).on(date()), Arc::new(rates));
        let x = money.money_in(Amount::Minor(a), Currency::EUR).unwrap();
        let y = money.money_in(Amount::Minor(b), Currency::GBP).unwrap();

        let xy = x.add(&y).unwrap();
        let yx = y.add(&x).unwrap();
        prop_assert_eq!(xy.currency(), yx.currency());
        prop_assert_eq!(xy.minor_units(), yx.minor_units());
    }

    #[test]
    fn prop_conversion_round_trip(
        whole in -1_000_000i64..1_000_000i64,
        from_rate in any_rate(),
        to_rate in any_rate(),
    ) {
        let rates = InMemoryRateSource::new().with_table(table_with(&[
            (Currency::CHF, from_rate),
            (Currency::JPY, to_rate),
        ]));
        let money = MoneyFactory::create(FactoryConfig::new(Currency::CHF).on(date()), Arc::new(rates));
        let original = money.money(Amount::Minor(Decimal::from(whole))).unwrap();

        let back = original
            .convert_to(Currency::JPY)
            .unwrap()
            .convert_to(Currency::CHF)
            .unwrap();
        prop_assert!(back.equals(&original).unwrap());
    }

    #[test]
    fn prop_descriptive_form_round_trips(
        currency in any_currency(),
        cents in -100_000_000i64..100_000_000i64,
        offset in 0i64..3650,
    ) {
        let money = MoneyFactory::create(
            FactoryConfig::new(Currency::USD).on(date()),
            Arc::new(ExplodingRateSource::new()),
        );
        let on = date() - chrono::Duration::days(offset);
        let value = money.money_on(Amount::Minor(Decimal::from(cents)), currency, on).unwrap();

        let parsed = money.parse(&value.to_string()).unwrap();
        prop_assert_eq!(parsed.currency(), currency);
        prop_assert_eq!(parsed.reference_date(), on);
        prop_assert_eq!(parsed.minor_units(), value.minor_units());
    }
}
