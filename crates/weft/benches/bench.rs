use core::{convert::Infallible, hint::black_box, time::Duration};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::{
    sync::{Arc, Barrier},
    thread::{self, scope},
    time::Instant,
};
use weft::{
    BufferedProcessor, GeneratorConfig, IdGenStatus, SequentialIdGenerator, TimeSource,
};

struct FixedMockTime {
    millis: u64,
}

impl TimeSource for FixedMockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

// Number of IDs generated per benchmark iteration (per-thread for
// multi-threaded). Exactly one millisecond's worth of sequence space.
const TOTAL_IDS: usize = 4096;

/// Benchmarks the hot path where IDs are always `Ready`.
fn bench_generator_hot(c: &mut Criterion) {
    let mut group = c.benchmark_group("generator/fixed_clock");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let generator = SequentialIdGenerator::with_time(
                    GeneratorConfig::new(1, 1).with_epoch(Duration::ZERO),
                    FixedMockTime { millis: 1 },
                )
                .unwrap();
                for _ in 0..TOTAL_IDS {
                    match generator.try_poll_id().unwrap() {
                        IdGenStatus::Ready { id } => {
                            black_box(id);
                        }
                        IdGenStatus::Pending { .. } => unreachable!(),
                    }
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmarks the wall-clock generator, including waits on sequence
/// exhaustion.
fn bench_generator_system_clock(c: &mut Criterion) {
    let mut group = c.benchmark_group("generator/system_clock");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    let generator = SequentialIdGenerator::new(1, 1).unwrap();
    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter(|| {
            for _ in 0..TOTAL_IDS {
                black_box(generator.next_id().unwrap());
            }
        });
    });

    group.finish();
}

/// Benchmarks one generator shared by several threads.
fn bench_generator_contended(c: &mut Criterion) {
    let threads = num_cpus::get().clamp(2, 8);
    let mut group = c.benchmark_group("generator/contended");
    group.throughput(Throughput::Elements((TOTAL_IDS * threads) as u64));

    group.bench_function(format!("threads/{threads}"), |b| {
        b.iter_custom(|iters| {
            let generator = Arc::new(SequentialIdGenerator::new(2, 2).unwrap());
            let barrier = Arc::new(Barrier::new(threads + 1));
            let start = scope(|s| {
                for _ in 0..threads {
                    let generator = Arc::clone(&generator);
                    let barrier = Arc::clone(&barrier);
                    s.spawn(move || {
                        barrier.wait();
                        for _ in 0..iters {
                            for _ in 0..TOTAL_IDS {
                                black_box(generator.next_id().unwrap());
                            }
                        }
                    });
                }
                barrier.wait();
                Instant::now()
            });
            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmarks producer-side `enqueue` cost plus the time to drain.
fn bench_processor(c: &mut Criterion) {
    let mut group = c.benchmark_group("processor/enqueue_and_drain");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let processor = BufferedProcessor::new("bench", |item: u64| {
                black_box(item);
                Ok::<(), Infallible>(())
            });
            let expected = iters * TOTAL_IDS as u64;

            let start = Instant::now();
            for i in 0..expected {
                processor.enqueue(i).unwrap();
            }
            while processor.stats().completed() < expected {
                thread::yield_now();
            }
            start.elapsed()
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_generator_hot,
    bench_generator_system_clock,
    bench_generator_contended,
    bench_processor
);
criterion_main!(benches);
