//! Criterion benchmarks for the tick loop.
//!
//! - `converter_fleet`: 500 converters drawing from shared tanks into a
//!   shared sink, one tick per iteration.
//! - `counting_parts`: 2000 no-op parts with mixed interval skips, to
//!   measure scheduler overhead.

use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use shipflow_core::converter::Converter;
use shipflow_core::error::PartError;
use shipflow_core::fixed::Seconds;
use shipflow_core::part::Part;
use shipflow_core::provider::ResourceProvider;
use shipflow_core::scheduler::{SchedulerConfig, TickScheduler};
use shipflow_core::test_utils::*;

#[derive(Debug)]
struct ConverterPart {
    converter: Converter,
}

impl Part for ConverterPart {
    fn name(&self) -> &str {
        "bench-converter"
    }

    fn update_any_thread(&self, dt: Seconds) -> Result<(), PartError> {
        self.converter.transfer_full(dt)?;
        Ok(())
    }

    fn destroy(&self) {}

    fn is_destroyed(&self) -> bool {
        false
    }
}

fn build_converter_fleet() -> TickScheduler {
    let mut sched = TickScheduler::new(SchedulerConfig::default()).unwrap();
    let sink: Arc<dyn ResourceProvider> = shared_tank(1.0e6, 0.0);
    let tanks: Vec<Arc<dyn ResourceProvider>> = (0..50)
        .map(|_| shared_tank(1.0e6, 1.0e6) as Arc<dyn ResourceProvider>)
        .collect();

    for i in 0..500 {
        let converter = Converter::new(
            Some(Arc::clone(&tanks[i % tanks.len()])),
            Some(Arc::clone(&sink)),
            fixed(0.9),
            fixed(2.0),
        )
        .unwrap();
        sched.add_part(Arc::new(ConverterPart { converter }));
    }
    sched
}

fn build_counting_parts() -> TickScheduler {
    let mut sched = TickScheduler::new(SchedulerConfig::default()).unwrap();
    for i in 0..2000u32 {
        sched.add_part(Arc::new(
            CountingPart::new("bench").with_any_thread_skips(i % 4),
        ));
    }
    sched
}

fn bench_converter_fleet(c: &mut Criterion) {
    let mut sched = build_converter_fleet();
    c.bench_function("converter_fleet", |b| b.iter(|| sched.step()));
}

fn bench_counting_parts(c: &mut Criterion) {
    let mut sched = build_counting_parts();
    c.bench_function("counting_parts", |b| b.iter(|| sched.step()));
}

criterion_group!(benches, bench_converter_fleet, bench_counting_parts);
criterion_main!(benches);
