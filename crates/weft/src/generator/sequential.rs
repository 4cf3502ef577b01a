use core::{cmp::Ordering, time::Duration};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::{Error, Result},
    generator::{GeneratorConfig, IdGenStatus},
    id::SequentialId,
    mutex::{Mutex, MutexGuard},
    time::{SystemClock, TimeSource},
};

/// A lock-based, clock-aware generator of 64-bit [`SequentialId`]s.
///
/// The last issued timestamp and its sequence are stored together as one
/// packed [`SequentialId`] behind a single mutex, so they always change as a
/// unit. Every call to [`Self::next_id`] runs entirely inside that critical
/// section; concurrent callers serialize.
///
/// ## Guarantees
/// - For a fixed (`worker_id`, `datacenter_id`), ids are distinct and
///   non-decreasing as long as the clock never moves backward.
/// - At most 4096 ids per millisecond. When the sequence is exhausted the call
///   waits for the clock to reach the next millisecond.
/// - A clock that moves backward fails the call with
///   [`Error::ClockMovedBackwards`]. A timestamp is never reused or
///   fabricated.
///
/// ## Example
/// ```
/// use weft::SequentialIdGenerator;
///
/// let generator = SequentialIdGenerator::new(1, 2).unwrap();
/// let a = generator.next_id().unwrap();
/// let b = generator.next_id().unwrap();
/// assert!(a < b);
/// ```
pub struct SequentialIdGenerator<T = SystemClock>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<Mutex<SequentialId>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Mutex<SequentialId>,
    config: GeneratorConfig,
    time: T,
}

impl SequentialIdGenerator<SystemClock> {
    /// Creates a generator on the system clock and [`DEFAULT_EPOCH`].
    ///
    /// # Errors
    ///
    /// Fails fast with [`Error::WorkerIdOutOfRange`] or
    /// [`Error::DatacenterIdOutOfRange`] if either value is above 31.
    ///
    /// [`DEFAULT_EPOCH`]: crate::DEFAULT_EPOCH
    pub fn new(worker_id: u64, datacenter_id: u64) -> Result<Self> {
        Self::with_time(GeneratorConfig::new(worker_id, datacenter_id), SystemClock)
    }
}

impl<T> SequentialIdGenerator<T>
where
    T: TimeSource,
{
    /// Creates a generator from a configuration and an explicit time source.
    ///
    /// # Errors
    ///
    /// Returns the range errors of [`GeneratorConfig::validate`].
    pub fn with_time(config: GeneratorConfig, time: T) -> Result<Self> {
        Self::from_components(config, 0, 0, time)
    }

    /// Creates a generator preloaded with the last issued timestamp (relative
    /// to the epoch) and sequence.
    ///
    /// This is primarily useful for restoring state or for tests. In typical
    /// use you should prefer [`Self::with_time`].
    ///
    /// # Errors
    ///
    /// - the range errors of [`GeneratorConfig::validate`]
    /// - [`Error::TimestampOutOfRange`] if `timestamp` exceeds 41 bits
    /// - [`Error::SequenceOutOfRange`] if `sequence > 4095`
    pub fn from_components(
        config: GeneratorConfig,
        timestamp: u64,
        sequence: u64,
        time: T,
    ) -> Result<Self> {
        config.validate()?;
        // Truncating either field would rewind the state.
        if timestamp > SequentialId::max_timestamp() {
            return Err(Error::TimestampOutOfRange {
                value: timestamp,
                max: SequentialId::max_timestamp(),
            });
        }
        if sequence > SequentialId::max_sequence() {
            return Err(Error::SequenceOutOfRange {
                value: sequence,
                max: SequentialId::max_sequence(),
            });
        }
        Ok(Self::build(config, timestamp, sequence, time))
    }

    pub(crate) fn build(config: GeneratorConfig, timestamp: u64, sequence: u64, time: T) -> Self {
        let id = SequentialId::from_components(
            timestamp,
            config.datacenter_id,
            config.worker_id,
            sequence,
        );
        Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(Mutex::new(id)),
            #[cfg(not(feature = "cache-padded"))]
            state: Mutex::new(id),
            config,
            time,
        }
    }

    /// Returns the worker id embedded in every generated id.
    pub const fn worker_id(&self) -> u64 {
        self.config.worker_id
    }

    /// Returns the datacenter id embedded in every generated id.
    pub const fn datacenter_id(&self) -> u64 {
        self.config.datacenter_id
    }

    /// Returns the epoch timestamps are encoded against.
    pub const fn epoch(&self) -> Duration {
        self.config.epoch
    }

    /// Returns the configuration this generator was built from.
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates the next id as a signed 64-bit value, spinning if the
    /// current millisecond's sequence is exhausted.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockMovedBackwards`] if the clock regressed
    /// - [`Error::ClockBeforeEpoch`] if the clock reads earlier than the epoch
    /// - [`Error::LockPoisoned`] if another caller panicked inside the lock
    pub fn next_id(&self) -> Result<i64> {
        self.next_sequential_id().map(|id| id.as_i64())
    }

    /// Like [`Self::next_id`], with a caller-supplied wait strategy.
    ///
    /// `wait` receives the number of milliseconds to back off and is invoked
    /// while the lock is held. It must let the time source advance; with a
    /// frozen clock the call never returns.
    ///
    /// # Errors
    ///
    /// Same as [`Self::next_id`].
    pub fn next_id_with(&self, wait: impl FnMut(u64)) -> Result<i64> {
        self.next_sequential_id_with(wait).map(|id| id.as_i64())
    }

    /// Generates the next id as a typed [`SequentialId`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::next_id`].
    pub fn next_sequential_id(&self) -> Result<SequentialId> {
        self.next_sequential_id_with(|_| core::hint::spin_loop())
    }

    /// Generates the next id as a typed [`SequentialId`] with a caller-supplied
    /// wait strategy. See [`Self::next_id_with`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::next_id`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self, wait)))]
    pub fn next_sequential_id_with(&self, mut wait: impl FnMut(u64)) -> Result<SequentialId> {
        let mut state = self.lock()?;
        loop {
            match self.step(&mut state)? {
                IdGenStatus::Ready { id } => break Ok(id),
                IdGenStatus::Pending { yield_for } => wait(yield_for),
            }
        }
    }

    /// Makes a single, non-blocking attempt to generate an id.
    ///
    /// # Returns
    /// - `Ok(IdGenStatus::Ready { id })`: a new id is available
    /// - `Ok(IdGenStatus::Pending { yield_for })`: the sequence is exhausted;
    ///   retry after `yield_for` milliseconds
    ///
    /// # Errors
    ///
    /// Same as [`Self::next_id`].
    ///
    /// # Example
    /// ```
    /// use weft::{IdGenStatus, SequentialIdGenerator};
    ///
    /// let generator = SequentialIdGenerator::new(0, 0).unwrap();
    /// let id = loop {
    ///     match generator.try_poll_id().unwrap() {
    ///         IdGenStatus::Ready { id } => break id,
    ///         IdGenStatus::Pending { .. } => std::thread::yield_now(),
    ///     }
    /// };
    /// assert_eq!(id.worker_id(), 0);
    /// ```
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self) -> Result<IdGenStatus> {
        let mut state = self.lock()?;
        self.step(&mut state)
    }

    fn lock(&self) -> Result<MutexGuard<'_, SequentialId>> {
        #[cfg(feature = "parking-lot")]
        {
            Ok(self.state.lock())
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            Ok(self.state.lock()?)
        }
    }

    /// Advances `state` by one id. Must be called with the lock held.
    fn step(&self, state: &mut SequentialId) -> Result<IdGenStatus> {
        let now_millis = self.time.current_millis();
        let epoch_millis = self.config.epoch_millis();
        let Some(now) = now_millis.checked_sub(epoch_millis) else {
            return Err(Self::cold_before_epoch(now_millis, epoch_millis));
        };
        debug_assert!(now <= SequentialId::max_timestamp(), "epoch must be rotated");

        let current_ts = state.timestamp();
        match now.cmp(&current_ts) {
            Ordering::Equal => {
                if state.has_sequence_room() {
                    *state = state.increment_sequence();
                    Ok(IdGenStatus::Ready { id: *state })
                } else {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(timestamp = now, "sequence exhausted, waiting for next tick");
                    Ok(IdGenStatus::Pending { yield_for: 1 })
                }
            }
            Ordering::Greater => {
                *state = state.rollover_to_timestamp(now);
                Ok(IdGenStatus::Ready { id: *state })
            }
            Ordering::Less => Err(Self::cold_clock_behind(
                now_millis,
                current_ts + epoch_millis,
            )),
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now_millis: u64, last_millis: u64) -> Error {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            last_millis,
            now_millis,
            behind_ms = last_millis - now_millis,
            "clock moved backwards, refusing to generate id"
        );
        Error::ClockMovedBackwards {
            last_millis,
            now_millis,
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_before_epoch(now_millis: u64, epoch_millis: u64) -> Error {
        #[cfg(feature = "tracing")]
        tracing::warn!(now_millis, epoch_millis, "clock is earlier than the epoch");
        Error::ClockBeforeEpoch {
            now_millis,
            epoch_millis,
        }
    }
}

impl<T> core::fmt::Debug for SequentialIdGenerator<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SequentialIdGenerator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
