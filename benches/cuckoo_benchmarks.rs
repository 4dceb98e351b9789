use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use cuckoofilter_client::cuckoo::CuckooFilter;

// Helper to create test data
fn generate_test_data(count: usize) -> Vec<String> {
    (0..count)
        .map(|_| format!("{:016x}", rand::random::<u64>()))
        .collect()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_operations");

    for capacity in [1_000, 10_000, 100_000] {
        let test_data = generate_test_data(capacity);

        group.bench_with_input(
            BenchmarkId::new("cuckoo", capacity),
            &(capacity, &test_data),
            |b, (cap, data)| {
                b.iter_batched(
                    || {
                        CuckooFilter::new(*cap)
                            .expect("Failed to create cuckoo filter")
                    },
                    |mut filter| {
                        for item in data.iter() {
                            if let Err(e) = filter.insert(item.as_bytes()) {
                                eprintln!("Insert error (continuing): {}", e);
                                continue;
                            }
                        }
                    },
                    criterion::BatchSize::SmallInput,
                )
            },
        );
    }
    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup_operations");

    for capacity in [1_000, 10_000, 100_000] {
        // 80% known elements, 20% unknown
        let known_data = generate_test_data((capacity as f64 * 0.8) as usize);
        let unknown_data = generate_test_data((capacity as f64 * 0.2) as usize);

        let mut filter =
            CuckooFilter::new(capacity).expect("Failed to create cuckoo filter");
        for item in known_data.iter() {
            filter.insert(item.as_bytes()).expect("Insert within capacity");
        }

        group.bench_with_input(
            BenchmarkId::new("cuckoo", capacity),
            &(&filter, &known_data, &unknown_data),
            |b, (filter, known, unknown)| {
                b.iter(|| {
                    for item in known.iter() {
                        std::hint::black_box(filter.contains(item.as_bytes()));
                    }
                    for item in unknown.iter() {
                        std::hint::black_box(filter.contains(item.as_bytes()));
                    }
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_lookup);
criterion_main!(benches);
