use core::time::Duration;

use crate::{
    error::{Error, Result},
    id::SequentialId,
    time::DEFAULT_EPOCH,
};

/// Immutable configuration of a [`SequentialIdGenerator`].
///
/// Uniqueness across processes holds only if every running generator uses a
/// distinct (`worker_id`, `datacenter_id`) pair. Nothing here can enforce
/// that; it is an operational contract.
///
/// [`SequentialIdGenerator`]: crate::SequentialIdGenerator
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Worker id, `0..=31`.
    pub worker_id: u64,
    /// Datacenter id, `0..=31`.
    pub datacenter_id: u64,
    /// Reference instant, as a duration since the UNIX epoch. Timestamps are
    /// encoded relative to it.
    pub epoch: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            worker_id: 0,
            datacenter_id: 0,
            epoch: DEFAULT_EPOCH,
        }
    }
}

impl GeneratorConfig {
    /// Creates a configuration using [`DEFAULT_EPOCH`].
    pub const fn new(worker_id: u64, datacenter_id: u64) -> Self {
        Self {
            worker_id,
            datacenter_id,
            epoch: DEFAULT_EPOCH,
        }
    }

    /// Replaces the epoch.
    #[must_use]
    pub const fn with_epoch(mut self, epoch: Duration) -> Self {
        self.epoch = epoch;
        self
    }

    /// The epoch in milliseconds since the UNIX epoch.
    pub const fn epoch_millis(&self) -> u64 {
        self.epoch.as_millis() as u64
    }

    /// Checks both coordinates against their 5-bit fields.
    ///
    /// # Errors
    ///
    /// - [`Error::WorkerIdOutOfRange`] if `worker_id > 31`
    /// - [`Error::DatacenterIdOutOfRange`] if `datacenter_id > 31`
    pub fn validate(&self) -> Result<()> {
        if self.worker_id > SequentialId::max_worker_id() {
            return Err(Error::WorkerIdOutOfRange {
                value: self.worker_id,
                max: SequentialId::max_worker_id(),
            });
        }
        if self.datacenter_id > SequentialId::max_datacenter_id() {
            return Err(Error::DatacenterIdOutOfRange {
                value: self.datacenter_id,
                max: SequentialId::max_datacenter_id(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_zero_coordinates_on_default_epoch() {
        let config = GeneratorConfig::default();
        assert_eq!(config, GeneratorConfig::new(0, 0));
        assert_eq!(config.epoch, DEFAULT_EPOCH);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(GeneratorConfig::new(31, 31).validate().is_ok());
        assert_eq!(
            GeneratorConfig::new(32, 0).validate(),
            Err(Error::WorkerIdOutOfRange { value: 32, max: 31 })
        );
        assert_eq!(
            GeneratorConfig::new(0, 32).validate(),
            Err(Error::DatacenterIdOutOfRange { value: 32, max: 31 })
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: GeneratorConfig = serde_json::from_str(r#"{ "worker_id": 4 }"#).unwrap();
        assert_eq!(config.worker_id, 4);
        assert_eq!(config.datacenter_id, 0);
        assert_eq!(config.epoch, DEFAULT_EPOCH);
    }
}
