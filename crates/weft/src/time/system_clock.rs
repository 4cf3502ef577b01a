use std::time::{SystemTime, UNIX_EPOCH};

use crate::time::TimeSource;

/// The operating system's wall clock.
///
/// Every call reads [`SystemTime::now`], so adjustments to the system clock
/// (including backward NTP steps) are visible to the generator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        // A clock set before 1970 reads as 0, which is always before any
        // usable epoch and surfaces as `Error::ClockBeforeEpoch`.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TWITTER_EPOCH;

    #[test]
    fn system_clock_is_after_twitter_epoch() {
        let now = SystemClock.current_millis();
        assert!(now > TWITTER_EPOCH.as_millis() as u64);
    }
}
