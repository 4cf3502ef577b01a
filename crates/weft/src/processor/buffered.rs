use core::{fmt, mem};
use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread,
};

use portable_atomic::{AtomicBool, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::{Error, Result},
    mutex::{Mutex, MutexGuard},
    processor::{
        ErrorReporter, Handler, LogReporter, ProcessError, ProcessorConfig, ProcessorStats,
        Spawner, ThreadSpawner, stats::Counters,
    },
};

/// A double-buffered, single-flight queue processor.
///
/// Producers on any number of threads call [`Self::enqueue`], which appends
/// to an *incoming* buffer and returns immediately. At most one processing
/// pass runs at a time: it swaps the incoming buffer with its own (empty)
/// *active* buffer in O(1), then drains the active buffer through the handler
/// without holding any lock. An atomic `in_flight` flag is the only thing
/// that decides which pass runs.
///
/// ## Guarantees
/// - Every enqueued item is delivered to the handler exactly once.
/// - The handler is never running on two threads at once.
/// - Items enqueued before a swap are handled before items enqueued after it.
///   Items from different producers racing into the same batch have no
///   defined relative order.
/// - A failing or panicking handler call is reported to the
///   [`ErrorReporter`] and does not affect the rest of the batch.
///
/// There is no shutdown. Once both buffers are empty no pass is running and
/// the processor costs nothing beyond the incoming buffer's allocation. A
/// buffer left much larger than the batches passing through it is shrunk
/// after a drain, so a single burst does not pin its peak memory.
///
/// ## Example
/// ```
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
/// use weft::BufferedProcessor;
///
/// let seen = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&seen);
/// let processor = BufferedProcessor::new("audit", move |_line: String| {
///     counter.fetch_add(1, Ordering::Relaxed);
///     Ok::<(), std::convert::Infallible>(())
/// });
///
/// processor.enqueue("login".to_owned()).unwrap();
/// processor.enqueue("logout".to_owned()).unwrap();
///
/// while processor.stats().completed() < 2 {
///     std::thread::yield_now();
/// }
/// assert_eq!(seen.load(Ordering::Relaxed), 2);
/// ```
pub struct BufferedProcessor<T, H, R = LogReporter, S = ThreadSpawner>
where
    T: Send + 'static,
    H: Handler<T>,
    R: ErrorReporter<H::Error>,
    S: Spawner,
{
    shared: Arc<Shared<T, H, R>>,
    spawner: S,
}

struct Shared<T, H, R> {
    config: ProcessorConfig,
    handler: H,
    reporter: R,
    incoming: Mutex<Vec<T>>,
    #[cfg(feature = "cache-padded")]
    in_flight: crossbeam_utils::CachePadded<AtomicBool>,
    #[cfg(not(feature = "cache-padded"))]
    in_flight: AtomicBool,
    counters: Counters,
}

impl<T, H> BufferedProcessor<T, H>
where
    T: Send + 'static,
    H: Handler<T>,
    H::Error: fmt::Display,
{
    /// Creates a processor that logs handler failures and runs passes on
    /// dedicated threads. Backpressure is disabled.
    pub fn new(name: impl Into<String>, handler: H) -> Self {
        Self::with_config(ProcessorConfig::new(name), handler)
    }

    /// Like [`Self::new`], with an explicit configuration.
    pub fn with_config(config: ProcessorConfig, handler: H) -> Self {
        Self::with_parts(config, handler, LogReporter, ThreadSpawner)
    }
}

impl<T, H, R, S> BufferedProcessor<T, H, R, S>
where
    T: Send + 'static,
    H: Handler<T>,
    R: ErrorReporter<H::Error>,
    S: Spawner,
{
    /// Creates a processor from every collaborator.
    ///
    /// # Parameters
    /// - `config`: name and optional backpressure
    /// - `handler`: called once per item
    /// - `reporter`: receives `(name, error)` for every failed item
    /// - `spawner`: decides where processing passes run
    pub fn with_parts(config: ProcessorConfig, handler: H, reporter: R, spawner: S) -> Self {
        let shared = Shared {
            config,
            handler,
            reporter,
            incoming: Mutex::new(Vec::new()),
            #[cfg(feature = "cache-padded")]
            in_flight: crossbeam_utils::CachePadded::new(AtomicBool::new(false)),
            #[cfg(not(feature = "cache-padded"))]
            in_flight: AtomicBool::new(false),
            counters: Counters::default(),
        };
        Self {
            shared: Arc::new(shared),
            spawner,
        }
    }

    /// Queues `item` for the handler and makes sure a pass will pick it up.
    ///
    /// Never blocks, unless a write threshold is configured and the incoming
    /// buffer is above it; the caller then sleeps for the configured delay
    /// after the item has been queued.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if a new pass was needed but could not be
    /// scheduled. The item stays queued and is handled by the next pass that
    /// starts.
    ///
    /// [`Error::Spawn`]: crate::Error::Spawn
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "trace", skip(self, item), fields(processor = %self.shared.config.name))
    )]
    pub fn enqueue(&self, item: T) -> Result<()> {
        self.shared.counters.record_enqueued();
        let pending = {
            let mut incoming = self.shared.lock_incoming();
            incoming.push(item);
            incoming.len()
        };

        self.try_start_processing()?;

        let config = &self.shared.config;
        if config.should_throttle(pending) {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                pending,
                threshold = config.write_threshold,
                delay_ms = config.backpressure_delay.as_millis() as u64,
                "incoming buffer over threshold, throttling producer"
            );
            thread::sleep(config.backpressure_delay);
        }
        Ok(())
    }

    /// Starts a pass unless one is already running.
    ///
    /// Losing the race is fine: the running pass re-checks the incoming
    /// buffer after it releases the flag.
    ///
    /// A failed spawn is retried once. Producers that enqueued while it was
    /// failing lost the flag to this call and were told their items are
    /// scheduled; the retry schedules them.
    fn try_start_processing(&self) -> Result<()> {
        let Err(_first) = self.start_pass() else {
            return Ok(());
        };
        #[cfg(feature = "tracing")]
        tracing::warn!(processor = %self.shared.config.name, error = %_first, "failed to start processing pass, retrying");

        self.start_pass().inspect_err(|_e| {
            #[cfg(feature = "tracing")]
            tracing::error!(
                processor = %self.shared.config.name,
                pending = self.pending(),
                error = %_e,
                "failed to start processing pass"
            );
        })
    }

    fn start_pass(&self) -> Result<()> {
        if !self.shared.try_acquire() {
            return Ok(());
        }

        // The ticket owns the flag from here on. If the spawner drops the
        // task without running it, the ticket releases the flag.
        let abandoned = Arc::new(AtomicBool::new(false));
        let ticket = PassTicket {
            shared: Arc::clone(&self.shared),
            abandoned: Arc::clone(&abandoned),
            ran: false,
        };
        self.spawner
            .spawn(&self.shared.config.name, move || ticket.run())?;

        if abandoned.load(Ordering::Acquire) {
            return Err(Error::Spawn {
                name: self.shared.config.name.clone(),
                reason: String::from("pass was dropped before it ran"),
            });
        }
        Ok(())
    }

    /// Returns the diagnostic name given at construction.
    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    /// Returns the processor's configuration.
    pub fn config(&self) -> &ProcessorConfig {
        &self.shared.config
    }

    /// Number of items waiting in the incoming buffer. Items in the batch
    /// currently being drained are not included.
    pub fn pending(&self) -> usize {
        self.shared.lock_incoming().len()
    }

    /// Returns true while a pass holds the in-flight flag.
    pub fn is_processing(&self) -> bool {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    /// Returns true if no pass is running and nothing is queued.
    pub fn is_idle(&self) -> bool {
        !self.is_processing() && self.pending() == 0
    }

    /// Returns a snapshot of the processor's counters.
    pub fn stats(&self) -> ProcessorStats {
        self.shared.counters.snapshot()
    }
}

impl<T, H, R> Shared<T, H, R> {
    fn try_acquire(&self) -> bool {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn release(&self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

impl<T, H, R> Shared<T, H, R>
where
    T: Send + 'static,
    H: Handler<T>,
    R: ErrorReporter<H::Error>,
{
    fn lock_incoming(&self) -> MutexGuard<'_, Vec<T>> {
        #[cfg(feature = "parking-lot")]
        {
            self.incoming.lock()
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            // No user code runs under this lock and a `Vec` push cannot leave
            // it half-written, so a poisoned guard is still consistent.
            self.incoming
                .lock()
                .unwrap_or_else(crate::mutex::PoisonError::into_inner)
        }
    }

    /// A processing pass. Must only be entered while holding `in_flight`.
    fn run(&self) {
        let mut active = Vec::new();
        loop {
            {
                let mut incoming = self.lock_incoming();
                debug_assert!(active.is_empty());
                mem::swap(&mut *incoming, &mut active);
            }
            self.counters.record_pass();

            let batch = active.len();
            #[cfg(feature = "tracing")]
            tracing::trace!(processor = %self.config.name, batch, "draining batch");

            for item in active.drain(..) {
                self.dispatch(item);
            }
            shrink_drained(&mut active, batch);

            self.release();

            // Producers that enqueued during the drain lost the race for the
            // flag; take it back on their behalf or leave it to whoever won.
            if self.lock_incoming().is_empty() || !self.try_acquire() {
                break;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(processor = %self.config.name, "processing pass finished");
    }

    fn dispatch(&self, item: T) {
        let error = match panic::catch_unwind(AssertUnwindSafe(|| self.handler.handle(item))) {
            Ok(Ok(())) => {
                self.counters.record_handled();
                return;
            }
            Ok(Err(e)) => ProcessError::Failed(e),
            Err(payload) => ProcessError::from_panic(payload.as_ref()),
        };
        self.counters.record_failed();

        let reported = panic::catch_unwind(AssertUnwindSafe(|| {
            self.reporter.report(&self.config.name, &error);
        }));
        if reported.is_err() {
            #[cfg(feature = "tracing")]
            tracing::error!(processor = %self.config.name, "error reporter panicked");
        }
    }
}

/// Capacity a drained buffer may always keep.
const RETAINED_CAPACITY: usize = 1024;

/// Releases the memory of a drained buffer that is far larger than the batch
/// it just held. Buffers that stay busy keep their allocation.
fn shrink_drained<T>(buffer: &mut Vec<T>, batch: usize) {
    debug_assert!(buffer.is_empty());
    let keep = RETAINED_CAPACITY.max(batch);
    if buffer.capacity() > keep.saturating_mul(4) {
        buffer.shrink_to(keep);
    }
}

/// Holds the in-flight flag on behalf of a scheduled pass.
///
/// Dropping a ticket that never ran releases the flag and marks it
/// abandoned, so a spawner that discards the task cannot wedge the
/// processor.
struct PassTicket<T, H, R> {
    shared: Arc<Shared<T, H, R>>,
    abandoned: Arc<AtomicBool>,
    ran: bool,
}

impl<T, H, R> PassTicket<T, H, R>
where
    T: Send + 'static,
    H: Handler<T>,
    R: ErrorReporter<H::Error>,
{
    fn run(mut self) {
        self.shared.run();
        // `run` releases the flag itself.
        self.ran = true;
    }
}

impl<T, H, R> Drop for PassTicket<T, H, R> {
    fn drop(&mut self) {
        if !self.ran {
            self.abandoned.store(true, Ordering::Release);
            self.shared.release();
        }
    }
}

impl<T, H, R, S> Clone for BufferedProcessor<T, H, R, S>
where
    T: Send + 'static,
    H: Handler<T>,
    R: ErrorReporter<H::Error>,
    S: Spawner + Clone,
{
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            spawner: self.spawner.clone(),
        }
    }
}

impl<T, H, R, S> fmt::Debug for BufferedProcessor<T, H, R, S>
where
    T: Send + 'static,
    H: Handler<T>,
    R: ErrorReporter<H::Error>,
    S: Spawner,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedProcessor")
            .field("name", &self.shared.config.name)
            .field("pending", &self.pending())
            .field("in_flight", &self.is_processing())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
