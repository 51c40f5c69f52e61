//! Inter-action delays and the wait between actions.

use std::time::Duration;

/// Compute how long to wait between two capture timestamps.
///
/// Negative or non-finite differences produce a zero delay; playback never
/// waits backwards.
#[must_use]
pub fn compute_delay(prev: f64, current: f64) -> Duration {
    let delta = current - prev;
    if delta.is_finite() && delta > 0.0 {
        Duration::try_from_secs_f64(delta).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

/// Current wall-clock time in seconds since the Unix epoch.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Suspends the calling thread between actions.
///
/// Only the calling thread blocks; listeners on other threads keep running.
pub trait Sleeper: Send + Sync {
    /// Block for `duration` (best effort).
    fn suspend(&self, duration: Duration);
}

/// A [`Sleeper`] backed by [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn suspend(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn suspend(&self, duration: Duration) {
        (**self).suspend(duration);
    }
}

impl<S: Sleeper + ?Sized> Sleeper for std::sync::Arc<S> {
    fn suspend(&self, duration: Duration) {
        (**self).suspend(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_delay() {
        let delay = compute_delay(10.0, 10.25);
        assert_eq!(delay, Duration::from_millis(250));
    }

    #[test]
    fn test_equal_timestamps() {
        assert_eq!(compute_delay(5.0, 5.0), Duration::ZERO);
    }

    #[test]
    fn test_backwards_clock_clamps_to_zero() {
        assert_eq!(compute_delay(5.0, 4.0), Duration::ZERO);
        assert_eq!(compute_delay(1e9, 0.0), Duration::ZERO);
    }

    #[test]
    fn test_non_finite_clamps_to_zero() {
        assert_eq!(compute_delay(0.0, f64::NAN), Duration::ZERO);
        assert_eq!(compute_delay(f64::INFINITY, f64::INFINITY), Duration::ZERO);
    }

    #[test]
    fn test_delay_never_negative_over_unordered_sequence() {
        let times = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        for pair in times.windows(2) {
            let delay = compute_delay(pair[0], pair[1]);
            assert!(delay >= Duration::ZERO);
            if pair[1] <= pair[0] {
                assert_eq!(delay, Duration::ZERO);
            }
        }
    }

    #[test]
    fn test_now_secs_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(now_secs() > 1_577_836_800.0);
    }

    #[test]
    fn test_thread_sleeper_waits() {
        let start = std::time::Instant::now();
        ThreadSleeper.suspend(Duration::from_millis(20));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
