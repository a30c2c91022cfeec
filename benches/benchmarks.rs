use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dated_money::prelude::*;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn factory() -> MoneyFactory {
    let date = NaiveDate::from_ymd_opt(2022, 7, 14).unwrap();
    let rates = InMemoryRateSource::new().with_table(
        RateTable::new(date)
            .with_rate(Currency::USD, dec!(1))
            .with_rate(Currency::EUR, dec!(0.995))
            .with_rate(Currency::GBP, dec!(0.8407)),
    );
    MoneyFactory::create(FactoryConfig::new(Currency::USD).on(date), Arc::new(rates))
}

fn benchmark_same_currency(c: &mut Criterion) {
    let money = factory();
    let a = money.money(dec!(12.34)).unwrap();
    let b = money.money(dec!(56.78)).unwrap();

    c.bench_function("add_same_currency", |bench| {
        bench.iter(|| black_box(&a).add(black_box(&b)).unwrap())
    });
    c.bench_function("equals_same_currency", |bench| {
        bench.iter(|| black_box(&a).equals(black_box(&b)).unwrap())
    });
}

fn benchmark_cross_currency(c: &mut Criterion) {
    let money = factory();
    let a = money.money_in(dec!(12.34), Currency::EUR).unwrap();
    let b = money.money_in(dec!(56.78), Currency::GBP).unwrap();

    c.bench_function("add_cross_currency", |bench| {
        bench.iter(|| black_box(&a).add(black_box(&b)).unwrap())
    });
    c.bench_function("convert_to", |bench| {
        bench.iter(|| black_box(&a).convert_to(Currency::GBP).unwrap())
    });
}

fn benchmark_parse(c: &mut Criterion) {
    let money = factory();

    c.bench_function("parse_descriptive", |bench| {
        bench.iter(|| money.parse(black_box("2022-01-07 GBP 20.00")).unwrap())
    });
    c.bench_function("currency_parse_symbol", |bench| {
        bench.iter(|| Currency::parse(black_box("£")).unwrap())
    });
}

criterion_group!(
    benches,
    benchmark_same_currency,
    benchmark_cross_currency,
    benchmark_parse
);
criterion_main!(benches);
