use criterion::{criterion_group, criterion_main, Criterion};

use forex::clock::DateTime;
use forex::currency::default_currencies;
use forex::generator::{generate_rate, QUOTE_PRECISION};

fn rates_for_month() {
    let end = DateTime::from(1_617_148_800);
    let currencies = default_currencies();
    for day in DateTime::trailing_days(end, 30) {
        for currency in &currencies {
            generate_rate("USD", &currency.code, Some(day), QUOTE_PRECISION);
        }
    }
}

fn benchmarks(c: &mut Criterion) {
    c.bench_function("single rate", |b| {
        b.iter(|| generate_rate("USD", "EUR", Some(DateTime::from(1_617_148_800)), 4))
    });
    c.bench_function("rates for month", |b| b.iter(rates_for_month));
}

criterion_group!(benches, benchmarks);
criterion_main!(benches);
