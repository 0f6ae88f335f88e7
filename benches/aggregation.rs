//! Benchmarks for SensorGate simulation, aggregation and export

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sensorgate::{
    simplify, simulate_value, to_csv, CompanyAggregator, CompanyRequest, Domain,
    FeatureContribution, SensorCatalog,
};

fn full_request(catalog: &SensorCatalog, domain: Domain) -> CompanyRequest {
    CompanyRequest {
        sensors: catalog.sensors(domain).map(|e| e.sensor_id.clone()).collect(),
        date: "2025-06-30".to_string(),
        company: "acme".to_string(),
    }
}

fn bench_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation");
    let mut rng = StdRng::seed_from_u64(42);

    group.throughput(Throughput::Elements(1000));

    group.bench_function("simulate_1000_readings", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                black_box(simulate_value("pm2.5", Domain::Air, &mut rng));
            }
        })
    });

    group.finish();
}

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");

    let catalog = SensorCatalog::standard();
    let aggregator = CompanyAggregator::new(&catalog);
    let request = full_request(&catalog, Domain::Air);
    // 14:00 UTC is 22:00 at UTC+8: full 19-hour series
    let now = Utc.with_ymd_and_hms(2025, 6, 30, 14, 0, 0).unwrap();
    let mut rng = StdRng::seed_from_u64(42);

    group.throughput(Throughput::Elements(request.sensors.len() as u64 * 19));

    group.bench_function("aggregate_all_air_sensors", |b| {
        b.iter(|| {
            let result = aggregator.aggregate(&request, Domain::Air, now, &mut rng);
            black_box(result)
        })
    });

    let result = aggregator
        .aggregate(&request, Domain::Air, now, &mut rng)
        .unwrap();

    group.bench_function("export_all_air_sensors", |b| {
        b.iter(|| black_box(to_csv(&result)))
    });

    group.finish();
}

fn bench_simplify(c: &mut Criterion) {
    let mut group = c.benchmark_group("features");

    let mut contributions: Vec<FeatureContribution> = (0..20)
        .map(|i| FeatureContribution {
            feature: format!("Color_{i}"),
            contribution: 0.01 * i as f64,
            percent: i as f64,
        })
        .collect();
    contributions.extend(["pm10", "co", "co2", "pm10 & co"].iter().map(|f| {
        FeatureContribution {
            feature: f.to_string(),
            contribution: 0.1,
            percent: 10.0,
        }
    }));

    group.bench_function("simplify_24_features", |b| {
        b.iter(|| black_box(simplify(&contributions)))
    });

    group.finish();
}

criterion_group!(benches, bench_simulation, bench_aggregation, bench_simplify);
criterion_main!(benches);
