use core::hash::BuildHasherDefault;
use core::hint::black_box;

use collision_tables::KeyGenerator;
use collision_tables::KeyTable;
use collision_tables::Strategy;
use collision_tables::Table;
use collision_tables::TableConfig;
use collision_tables::workload::REFERENCE_LOAD_FACTORS;
use criterion::AxisScale;
use criterion::BatchSize;
use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::PlotConfiguration;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use hashbrown::HashSet as HashbrownSet;
use rand::Rng;
use rand::SeedableRng;
use rand::TryRngCore;
use rand::rngs::OsRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand_distr::Zipf;
use siphasher::sip::SipHasher;

const CAPACITY: usize = 10_000;
const OPERATIONS: usize = 1_000;
const KEY_LENGTH: usize = 8;

const STRATEGIES: [Strategy; 2] = [Strategy::Chaining, Strategy::OpenAddressing];

fn strategy_name(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::Chaining => "chained",
        Strategy::OpenAddressing => "probed",
    }
}

fn seed() -> u64 {
    OsRng.try_next_u64().unwrap()
}

fn prefilled(strategy: Strategy, load_factor: f64, seed: u64) -> Table {
    let config = TableConfig::new(CAPACITY)
        .load_factor(load_factor)
        .key_length(KEY_LENGTH)
        .seed(seed);
    Table::with_config(strategy, &config).unwrap()
}

fn fresh_keys(count: usize) -> Vec<String> {
    KeyGenerator::seeded(seed(), KEY_LENGTH).take(count).collect()
}

/// Keys already stored in `table`, sampled through its own `random_key`.
fn stored_keys(table: &Table, count: usize) -> Vec<String> {
    let mut rng = SmallRng::from_os_rng();
    (0..count)
        .map(|_| table.random_key(&mut rng).unwrap().clone())
        .collect()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Linear));
    group.throughput(Throughput::Elements(OPERATIONS as u64));

    for &load_factor in REFERENCE_LOAD_FACTORS {
        for strategy in STRATEGIES {
            let table = prefilled(strategy, load_factor, seed());
            let keys = fresh_keys(OPERATIONS);
            group.bench_with_input(
                BenchmarkId::new(strategy_name(strategy), load_factor),
                &load_factor,
                |b, _| {
                    b.iter_batched(
                        || (table.clone(), keys.clone()),
                        |(mut table, keys)| {
                            for key in keys {
                                table.insert(key).unwrap();
                            }
                            black_box(table)
                        },
                        BatchSize::LargeInput,
                    )
                },
            );
        }

        let mut baseline = HashbrownSet::with_capacity(CAPACITY);
        let prefill_count = TableConfig::new(CAPACITY)
            .load_factor(load_factor)
            .prefill_count();
        baseline.extend(fresh_keys(prefill_count));
        let keys = fresh_keys(OPERATIONS);
        group.bench_with_input(
            BenchmarkId::new("hashbrown", load_factor),
            &load_factor,
            |b, _| {
                b.iter_batched(
                    || (baseline.clone(), keys.clone()),
                    |(mut set, keys)| {
                        for key in keys {
                            black_box(set.insert(key));
                        }
                        black_box(set)
                    },
                    BatchSize::LargeInput,
                )
            },
        );
    }

    group.finish();
}

fn bench_lookup_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup_hit");
    group.throughput(Throughput::Elements(OPERATIONS as u64));

    for &load_factor in &REFERENCE_LOAD_FACTORS[1..] {
        for strategy in STRATEGIES {
            let table = prefilled(strategy, load_factor, seed());
            let mut keys = stored_keys(&table, OPERATIONS);
            keys.shuffle(&mut SmallRng::from_os_rng());
            group.bench_with_input(
                BenchmarkId::new(strategy_name(strategy), load_factor),
                &load_factor,
                |b, _| {
                    b.iter(|| {
                        for key in &keys {
                            black_box(table.lookup(key.as_str()));
                        }
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_lookup_miss(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup_miss");
    group.throughput(Throughput::Elements(OPERATIONS as u64));

    for &load_factor in REFERENCE_LOAD_FACTORS {
        for strategy in STRATEGIES {
            let table = prefilled(strategy, load_factor, seed());
            // Longer than any stored key, so every probe misses.
            let keys: Vec<String> = KeyGenerator::seeded(seed(), KEY_LENGTH + 1)
                .take(OPERATIONS)
                .collect();
            group.bench_with_input(
                BenchmarkId::new(strategy_name(strategy), load_factor),
                &load_factor,
                |b, _| {
                    b.iter(|| {
                        for key in &keys {
                            black_box(table.lookup(key.as_str()));
                        }
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_lookup_zipf(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup_zipf");
    group.throughput(Throughput::Elements(OPERATIONS as u64));

    let load_factor = 0.7;
    for strategy in STRATEGIES {
        let table = prefilled(strategy, load_factor, seed());
        let hot = stored_keys(&table, OPERATIONS);
        let distr = Zipf::new(hot.len() as f32, 1.0).unwrap();
        let mut rng = SmallRng::from_os_rng();
        let keys: Vec<&str> = (0..OPERATIONS)
            .map(|_| hot[rng.sample(distr) as usize - 1].as_str())
            .collect();

        group.bench_function(strategy_name(strategy), |b| {
            b.iter(|| {
                for key in &keys {
                    black_box(table.lookup(*key));
                }
            })
        });
    }

    group.finish();
}

fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove");
    group.throughput(Throughput::Elements(OPERATIONS as u64));

    for &load_factor in &REFERENCE_LOAD_FACTORS[1..] {
        for strategy in STRATEGIES {
            let table = prefilled(strategy, load_factor, seed());
            let keys = stored_keys(&table, OPERATIONS);
            group.bench_with_input(
                BenchmarkId::new(strategy_name(strategy), load_factor),
                &load_factor,
                |b, _| {
                    b.iter_batched(
                        || table.clone(),
                        |mut table| {
                            for key in &keys {
                                black_box(table.remove(key.as_str()));
                            }
                            black_box(table)
                        },
                        BatchSize::LargeInput,
                    )
                },
            );
        }
    }

    group.finish();
}

fn bench_hashers(c: &mut Criterion) {
    type Sip = BuildHasherDefault<SipHasher>;

    let mut group = c.benchmark_group("hashers");
    group.throughput(Throughput::Elements(OPERATIONS as u64));

    let load_factor = 0.5;
    let config = TableConfig::new(CAPACITY)
        .load_factor(load_factor)
        .seed(seed());
    for strategy in STRATEGIES {
        let default: Table = Table::with_config(strategy, &config).unwrap();
        let sip: Table<String, Sip> = Table::with_config(strategy, &config).unwrap();
        let keys = stored_keys(&default, OPERATIONS);

        group.bench_function(format!("{}_default", strategy_name(strategy)), |b| {
            b.iter(|| {
                for key in &keys {
                    black_box(default.lookup(key.as_str()));
                }
            })
        });
        group.bench_function(format!("{}_siphash", strategy_name(strategy)), |b| {
            b.iter(|| {
                for key in &keys {
                    black_box(sip.lookup(key.as_str()));
                }
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_insert,
    bench_lookup_hit,
    bench_lookup_miss,
    bench_lookup_zipf,
    bench_remove,
    bench_hashers,
);

criterion_main!(benches);
