use crate::id::SequentialId;

/// Represents the result of a single, non-blocking attempt to generate an id.
///
/// This type models the outcome of
/// [`SequentialIdGenerator::try_poll_id`](crate::SequentialIdGenerator::try_poll_id):
///
/// - [`IdGenStatus::Ready`] indicates a new id was successfully generated.
/// - [`IdGenStatus::Pending`] means the sequence space of the current
///   millisecond is exhausted and the caller should wait before retrying.
///
/// This allows non-blocking generation loops and custom backoff strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus {
    /// A unique id was generated and is ready to use.
    Ready {
        /// The generated id.
        id: SequentialId,
    },
    /// No id could be generated because the sequence has been exhausted for
    /// the current millisecond.
    Pending {
        /// Milliseconds to wait before the clock is expected to have advanced.
        yield_for: u64,
    },
}
