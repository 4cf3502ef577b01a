use core::time::Duration;

/// Default pause applied to a producer when backpressure is configured and
/// the incoming buffer is over its threshold.
pub const DEFAULT_BACKPRESSURE_DELAY: Duration = Duration::from_millis(1);

/// Configuration of a [`BufferedProcessor`].
///
/// [`BufferedProcessor`]: crate::BufferedProcessor
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Diagnostic name, used in logs, error reports and thread names.
    pub name: String,
    /// Number of pending items above which producers are briefly put to
    /// sleep. `None` (the default) disables backpressure entirely.
    ///
    /// This is a crude throttle, not admission control: the item is always
    /// accepted.
    pub write_threshold: Option<usize>,
    /// How long a throttled producer sleeps.
    pub backpressure_delay: Duration,
}

impl ProcessorConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            write_threshold: None,
            backpressure_delay: DEFAULT_BACKPRESSURE_DELAY,
        }
    }

    #[must_use]
    pub const fn with_write_threshold(mut self, threshold: usize) -> Self {
        self.write_threshold = Some(threshold);
        self
    }

    #[must_use]
    pub const fn with_backpressure_delay(mut self, delay: Duration) -> Self {
        self.backpressure_delay = delay;
        self
    }

    /// Returns true if a producer that just observed `pending` queued items
    /// should be throttled.
    pub(crate) fn should_throttle(&self, pending: usize) -> bool {
        self.write_threshold
            .is_some_and(|threshold| pending > threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backpressure_is_opt_in() {
        let config = ProcessorConfig::new("orders");
        assert_eq!(config.name, "orders");
        assert_eq!(config.write_threshold, None);
        assert!(!config.should_throttle(usize::MAX));
    }

    #[test]
    fn threshold_is_exclusive() {
        let config = ProcessorConfig::new("orders").with_write_threshold(10);
        assert!(!config.should_throttle(10));
        assert!(config.should_throttle(11));
    }
}
