use core::{fmt, time::Duration};

/// A 64-bit Snowflake-style id with a datacenter/worker split machine field.
///
/// - 1 bit reserved (always zero, so the value is a non-negative `i64`)
/// - 41 bits timestamp (ms since the generator's epoch)
/// - 5 bits datacenter id
/// - 5 bits worker id
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63           63 62            22 21              17 16          12 11             0
///              +--------------+----------------+------------------+--------------+---------------+
///  Field:      | reserved (1) | timestamp (41) | datacenter ID (5)| worker ID (5)| sequence (12) |
///              +--------------+----------------+------------------+--------------+---------------+
///              |<------------------- MSB ---------- 64 bits ----------- LSB -------------------->|
/// ```
///
/// Ids compare by their raw value, so for a single generator they sort by
/// time, then by sequence.
///
/// # Example
///
/// ```
/// use weft::SequentialId;
///
/// let id = SequentialId::from_components(1000, 3, 2, 1);
/// assert_eq!(id.timestamp(), 1000);
/// assert_eq!(id.datacenter_id(), 3);
/// assert_eq!(id.worker_id(), 2);
/// assert_eq!(id.sequence(), 1);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequentialId {
    id: u64,
}

impl SequentialId {
    /// Bitmask for the reserved most significant bit.
    pub const RESERVED_MASK: u64 = 1;
    /// Bitmask for extracting the 41-bit timestamp field.
    pub const TIMESTAMP_MASK: u64 = (1 << 41) - 1;
    /// Bitmask for extracting the 5-bit datacenter id field.
    pub const DATACENTER_ID_MASK: u64 = (1 << 5) - 1;
    /// Bitmask for extracting the 5-bit worker id field.
    pub const WORKER_ID_MASK: u64 = (1 << 5) - 1;
    /// Bitmask for extracting the 12-bit sequence field.
    pub const SEQUENCE_MASK: u64 = (1 << 12) - 1;

    /// Shift of the reserved bit (bit 63).
    pub const RESERVED_SHIFT: u64 = 63;
    /// Shift of the timestamp field (bits 22 through 62).
    pub const TIMESTAMP_SHIFT: u64 = 22;
    /// Shift of the datacenter id field (bits 17 through 21).
    pub const DATACENTER_ID_SHIFT: u64 = 17;
    /// Shift of the worker id field (bits 12 through 16).
    pub const WORKER_ID_SHIFT: u64 = 12;
    /// Shift of the sequence field (bits 0 through 11).
    pub const SEQUENCE_SHIFT: u64 = 0;

    /// Builds an id from its fields. Out-of-range values are truncated to
    /// their field width.
    pub const fn from_components(
        timestamp: u64,
        datacenter_id: u64,
        worker_id: u64,
        sequence: u64,
    ) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let datacenter_id = (datacenter_id & Self::DATACENTER_ID_MASK) << Self::DATACENTER_ID_SHIFT;
        let worker_id = (worker_id & Self::WORKER_ID_MASK) << Self::WORKER_ID_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | datacenter_id | worker_id | sequence,
        }
    }

    /// Extracts the timestamp (ms since the generator's epoch).
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the datacenter id.
    pub const fn datacenter_id(&self) -> u64 {
        (self.id >> Self::DATACENTER_ID_SHIFT) & Self::DATACENTER_ID_MASK
    }

    /// Extracts the worker id.
    pub const fn worker_id(&self) -> u64 {
        (self.id >> Self::WORKER_ID_SHIFT) & Self::WORKER_ID_MASK
    }

    /// Extracts the sequence number.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Returns the reserved bit. Always zero for generated ids.
    pub const fn reserved(&self) -> u64 {
        (self.id >> Self::RESERVED_SHIFT) & Self::RESERVED_MASK
    }

    pub const fn max_timestamp() -> u64 {
        Self::TIMESTAMP_MASK
    }

    pub const fn max_datacenter_id() -> u64 {
        Self::DATACENTER_ID_MASK
    }

    pub const fn max_worker_id() -> u64 {
        Self::WORKER_ID_MASK
    }

    pub const fn max_sequence() -> u64 {
        Self::SEQUENCE_MASK
    }

    /// Returns the raw packed value.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Wraps a raw packed value without validation.
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns the packed value as a signed integer.
    ///
    /// The reserved bit is zero for every generated id, so the result is
    /// non-negative.
    pub const fn as_i64(&self) -> i64 {
        self.id as i64
    }

    /// Converts the embedded timestamp back to milliseconds since the UNIX
    /// epoch, given the epoch the id was generated against.
    pub const fn unix_millis(&self, epoch: Duration) -> u64 {
        self.timestamp() + epoch.as_millis() as u64
    }

    /// Returns true if the current sequence value can be incremented.
    pub const fn has_sequence_room(&self) -> bool {
        self.sequence() < Self::max_sequence()
    }

    /// Returns a new id with the sequence incremented.
    pub const fn increment_sequence(&self) -> Self {
        Self::from_components(
            self.timestamp(),
            self.datacenter_id(),
            self.worker_id(),
            self.sequence() + 1,
        )
    }

    /// Returns a new id for a newer timestamp with the sequence reset to zero.
    pub const fn rollover_to_timestamp(&self, timestamp: u64) -> Self {
        Self::from_components(timestamp, self.datacenter_id(), self.worker_id(), 0)
    }
}

impl From<SequentialId> for u64 {
    fn from(id: SequentialId) -> Self {
        id.to_raw()
    }
}

impl From<SequentialId> for i64 {
    fn from(id: SequentialId) -> Self {
        id.as_i64()
    }
}

impl TryFrom<i64> for SequentialId {
    type Error = core::num::TryFromIntError;

    /// Rejects negative values, which would set the reserved bit.
    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value).map(Self::from_raw)
    }
}

impl fmt::Display for SequentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SequentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequentialId")
            .field("raw", &format_args!("0x{:016x} ({})", self.id, self.id))
            .field("timestamp", &self.timestamp())
            .field("datacenter_id", &self.datacenter_id())
            .field("worker_id", &self.worker_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}
