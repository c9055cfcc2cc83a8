//! Time and timestamp helpers.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// UTC timestamp used for event times and adjustment start times.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Time elapsed between `earlier` and `later`, zero if the clock went backwards.
#[must_use]
pub fn elapsed(earlier: Timestamp, later: Timestamp) -> Duration {
    (later - earlier).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_current_utc_time() {
        let before = Utc::now();
        let ts = now();
        let after = Utc::now();
        assert!(ts >= before);
        assert!(ts <= after);
    }

    #[test]
    fn should_measure_elapsed_seconds() {
        let start = now();
        let later = start + chrono::Duration::seconds(90);
        assert_eq!(elapsed(start, later), Duration::from_secs(90));
    }

    #[test]
    fn should_saturate_to_zero_when_clock_goes_backwards() {
        let start = now();
        let earlier = start - chrono::Duration::seconds(5);
        assert_eq!(elapsed(start, earlier), Duration::ZERO);
    }
}
