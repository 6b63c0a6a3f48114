//! Benchmarks for basin hierarchy queries

use basmati_algorithms::hierarchy::{area_select, find_downstream, find_upstream};
use basmati_core::basin::{BasinRecord, BasinTable};
use basmati_core::pfaf::PfafCode;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::HashMap;

/// Full nine-way Pfafstetter subdivision of one basin down to `depth` levels
fn create_river_system(depth: usize) -> BasinTable {
    let mut codes = vec!["1".to_string()];
    let mut frontier = codes.clone();
    for _ in 1..depth {
        frontier = frontier
            .iter()
            .flat_map(|parent| (1..=9).map(move |d| format!("{}{}", parent, d)))
            .collect();
        codes.extend(frontier.iter().cloned());
    }

    fn downstream_code(code: &str) -> Option<String> {
        let (parent, last) = code.split_at(code.len().checked_sub(1)?);
        match last.parse::<u8>().ok()? {
            _ if parent.is_empty() => None,
            1 => downstream_code(parent).map(|q| format!("{}9", q)),
            d if d % 2 == 1 => Some(format!("{}{}", parent, d - 2)),
            d => Some(format!("{}{}", parent, d - 1)),
        }
    }

    let ids: HashMap<&str, u64> = codes
        .iter()
        .enumerate()
        .map(|(i, code)| (code.as_str(), i as u64 + 1))
        .collect();
    let records = codes
        .iter()
        .map(|code| {
            let down = downstream_code(code).map_or(0, |d| ids[d.as_str()]);
            let area = 10f64.powi((depth - code.len()) as i32 + 1);
            BasinRecord::new(ids[code.as_str()], PfafCode::new(code.as_str()).unwrap(), code.len() as u8)
                .with_next_down(down)
                .with_sub_area(area)
        })
        .collect();
    BasinTable::new(records, None).unwrap()
}

fn bench_downstream(c: &mut Criterion) {
    let mut group = c.benchmark_group("hierarchy/find_downstream");
    for depth in [4, 5, 6] {
        let table = create_river_system(depth);
        let start = "9".repeat(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| find_downstream(black_box(&table), start.as_str()).unwrap().len())
        });
    }
    group.finish();
}

fn bench_upstream(c: &mut Criterion) {
    let mut group = c.benchmark_group("hierarchy/find_upstream");
    for depth in [4, 5, 6] {
        let table = create_river_system(depth);
        let outlet = "1".repeat(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| find_upstream(black_box(&table), outlet.as_str()).unwrap().len())
        });
    }
    group.finish();
}

fn bench_area_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("hierarchy/area_select");
    for depth in [4, 5, 6] {
        let table = create_river_system(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| area_select(black_box(&table), 50.0, 500.0).unwrap().len())
        });
    }
    group.finish();
}

fn bench_table_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("hierarchy/table_indices");
    for depth in [5, 6] {
        let records = create_river_system(depth).records().to_vec();
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| BasinTable::new(black_box(records.clone()), None).unwrap().len())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_downstream,
    bench_upstream,
    bench_area_select,
    bench_table_build,
);
criterion_main!(benches);
