use std::{
    collections::HashSet,
    io::{self, Write},
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use anyhow::bail;
use tokio::{runtime::Handle, task::JoinHandle};
use weft::{
    BufferedProcessor, GeneratorConfig, LogReporter, SequentialId, SequentialIdGenerator,
    SystemClock, TokioSpawner,
};

use crate::config::PumpConfig;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Writes `count` ids to stdout.
pub fn next(config: GeneratorConfig, count: usize) -> anyhow::Result<()> {
    let generator = SequentialIdGenerator::with_time(config, SystemClock)?;
    let mut out = io::stdout().lock();
    for _ in 0..count {
        writeln!(out, "{}", generator.next_id()?)?;
    }
    Ok(())
}

/// Writes the fields of `id` to stdout. The epoch is only needed to recover
/// wall-clock time.
pub fn decode(config: GeneratorConfig, id: SequentialId) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "id:            {id}")?;
    writeln!(out, "timestamp:     {}", id.timestamp())?;
    writeln!(out, "unix millis:   {}", id.unix_millis(config.epoch))?;
    writeln!(out, "datacenter id: {}", id.datacenter_id())?;
    writeln!(out, "worker id:     {}", id.worker_id())?;
    writeln!(out, "sequence:      {}", id.sequence())?;
    Ok(())
}

/// Generates ids on `producers` blocking tasks, enqueues every id into one
/// processor and checks in the handler that none repeats.
pub async fn pump(generator: GeneratorConfig, config: PumpConfig) -> anyhow::Result<()> {
    let total = config.producers * config.items;
    let generator = Arc::new(SequentialIdGenerator::with_time(generator, SystemClock)?);
    let seen = Arc::new(Mutex::new(HashSet::with_capacity(total)));

    let sink = Arc::clone(&seen);
    let processor = BufferedProcessor::with_parts(
        config.processor,
        move |id: i64| {
            let mut seen = sink.lock().unwrap_or_else(PoisonError::into_inner);
            if !seen.insert(id) {
                bail!("duplicate id {id}");
            }
            Ok(())
        },
        LogReporter,
        TokioSpawner::new(Handle::current()),
    );

    tracing::info!(
        producers = config.producers,
        items = config.items,
        write_threshold = ?processor.config().write_threshold,
        "pumping ids through processor"
    );
    let started = Instant::now();

    let producers: Vec<JoinHandle<anyhow::Result<()>>> = (0..config.producers)
        .map(|_| {
            let generator = Arc::clone(&generator);
            let processor = processor.clone();
            tokio::task::spawn_blocking(move || {
                for _ in 0..config.items {
                    processor.enqueue(generator.next_id()?)?;
                }
                Ok(())
            })
        })
        .collect();
    for producer in producers {
        producer.await??;
    }
    let produced_in = started.elapsed();

    while processor.stats().completed() < total as u64 {
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
    let drained_in = started.elapsed();

    let stats = processor.stats();
    tracing::info!(
        enqueued = stats.enqueued,
        handled = stats.handled,
        failed = stats.failed,
        passes = stats.passes,
        produced_ms = produced_in.as_millis() as u64,
        drained_ms = drained_in.as_millis() as u64,
        "pump finished"
    );

    let unique = seen.lock().unwrap_or_else(PoisonError::into_inner).len();
    writeln!(
        io::stdout().lock(),
        "{unique} unique ids from {total} enqueued in {drained_in:?} ({} passes)",
        stats.passes
    )?;

    if stats.failed > 0 {
        bail!("{} items failed, see log for details", stats.failed);
    }
    Ok(())
}
