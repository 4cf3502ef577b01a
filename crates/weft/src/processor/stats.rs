use portable_atomic::{AtomicU64, Ordering};

/// A point-in-time snapshot of a processor's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProcessorStats {
    /// Items accepted by `enqueue`.
    pub enqueued: u64,
    /// Items the handler processed successfully.
    pub handled: u64,
    /// Items whose handler call returned an error or panicked.
    pub failed: u64,
    /// Buffer swaps performed by processing passes.
    pub passes: u64,
}

impl ProcessorStats {
    /// Items delivered to the handler, whatever the outcome.
    pub const fn completed(&self) -> u64 {
        self.handled + self.failed
    }

    /// Items accepted but not yet delivered.
    pub const fn outstanding(&self) -> u64 {
        self.enqueued.saturating_sub(self.completed())
    }
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    enqueued: AtomicU64,
    handled: AtomicU64,
    failed: AtomicU64,
    passes: AtomicU64,
}

impl Counters {
    pub(crate) fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_handled(&self) {
        self.handled.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn record_pass(&self) {
        self.passes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ProcessorStats {
        ProcessorStats {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            handled: self.handled.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
            passes: self.passes.load(Ordering::Relaxed),
        }
    }
}
