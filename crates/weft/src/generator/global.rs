use std::sync::OnceLock;

use crate::{
    error::Result,
    generator::{GeneratorConfig, SequentialIdGenerator},
    time::SystemClock,
};

static DEFAULT_GENERATOR: OnceLock<SequentialIdGenerator> = OnceLock::new();

/// Returns the process-wide generator (worker 0, datacenter 0, default epoch).
pub fn default_generator() -> &'static SequentialIdGenerator {
    DEFAULT_GENERATOR
        .get_or_init(|| SequentialIdGenerator::build(GeneratorConfig::default(), 0, 0, SystemClock))
}

/// Generates an id from the process-wide generator.
///
/// Every process calling this uses the same (0, 0) coordinates, so ids are
/// only unique within a single node. Build a [`SequentialIdGenerator`] with a
/// distinct worker/datacenter pair for distributed use.
///
/// # Errors
///
/// Same as [`SequentialIdGenerator::next_id`].
///
/// # Example
/// ```
/// let a = weft::generate_next_id().unwrap();
/// let b = weft::generate_next_id().unwrap();
/// assert!(b > a);
/// ```
pub fn generate_next_id() -> Result<i64> {
    default_generator().next_id()
}
