/// A result type defaulting to the crate-wide [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `weft` can emit.
///
/// Handler failures inside a [`BufferedProcessor`] are *not* represented here;
/// those are delivered to the processor's error reporter as a
/// [`ProcessError`] and never reach the producer.
///
/// [`BufferedProcessor`]: crate::BufferedProcessor
/// [`ProcessError`]: crate::ProcessError
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The configured worker id does not fit in its 5-bit field.
    #[error("worker id {value} is out of range (expected 0..={max})")]
    WorkerIdOutOfRange {
        /// The rejected value.
        value: u64,
        /// The largest accepted value.
        max: u64,
    },

    /// The configured datacenter id does not fit in its 5-bit field.
    #[error("datacenter id {value} is out of range (expected 0..={max})")]
    DatacenterIdOutOfRange {
        /// The rejected value.
        value: u64,
        /// The largest accepted value.
        max: u64,
    },

    /// A restored timestamp does not fit in its 41-bit field.
    #[error("timestamp {value} is out of range (expected 0..={max})")]
    TimestampOutOfRange {
        /// The rejected value.
        value: u64,
        /// The largest accepted value.
        max: u64,
    },

    /// A restored sequence does not fit in its 12-bit field.
    #[error("sequence {value} is out of range (expected 0..={max})")]
    SequenceOutOfRange {
        /// The rejected value.
        value: u64,
        /// The largest accepted value.
        max: u64,
    },

    /// The time source reported a timestamp earlier than the last one used.
    ///
    /// Retrying without fixing the clock repeats the failure until the clock
    /// catches up with `last_millis`.
    #[error("clock moved backwards: last timestamp {last_millis}ms, now {now_millis}ms")]
    ClockMovedBackwards {
        /// Last timestamp (ms since the UNIX epoch) encoded into an id.
        last_millis: u64,
        /// Timestamp (ms since the UNIX epoch) just observed.
        now_millis: u64,
    },

    /// The time source reported a timestamp earlier than the configured epoch.
    #[error("clock ({now_millis}ms) is earlier than the configured epoch ({epoch_millis}ms)")]
    ClockBeforeEpoch {
        /// Timestamp (ms since the UNIX epoch) just observed.
        now_millis: u64,
        /// The generator's epoch (ms since the UNIX epoch).
        epoch_millis: u64,
    },

    /// The operation failed because the lock was **poisoned**.
    ///
    /// This occurs when a thread panics while holding the lock. When the
    /// `parking-lot` feature is enabled, mutexes do **not** poison, so this
    /// variant is not available.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("lock poisoned")]
    LockPoisoned,

    /// A processing pass could not be scheduled.
    ///
    /// The enqueued item is retained and is picked up by the next pass that
    /// does start.
    #[error("failed to spawn processing pass for `{name}`: {reason}")]
    Spawn {
        /// Diagnostic name of the processor.
        name: String,
        /// Why the spawner refused the task.
        reason: String,
    },
}

#[cfg(not(feature = "parking-lot"))]
use crate::mutex::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
