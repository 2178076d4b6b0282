//! Clock abstraction for the cache engine.
//!
//! All time-sensitive operations in the engine take an explicit timestamp;
//! when the caller omits one, the engine reads it from a [`ClockSource`]
//! exactly once at operation entry. Injecting a fake clock (or passing
//! explicit timestamps) makes TTL and LRU behavior fully deterministic
//! in tests.

use std::time::{SystemTime, UNIX_EPOCH};

/// Abstraction over the system clock for dependency injection.
///
/// Allows deterministic testing by replacing the real clock with a virtual
/// one. The default implementation ([`SystemClock`]) delegates to
/// `std::time::SystemTime`.
pub trait ClockSource: Send + Sync {
    /// Returns the current time as seconds since the Unix epoch.
    fn now(&self) -> f64;
}

/// Default clock source that reads the real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClock(f64);

    impl ClockSource for FixedClock {
        fn now(&self) -> f64 {
            self.0
        }
    }

    #[test]
    fn system_clock_is_non_zero_and_non_decreasing() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(a > 0.0);
        assert!(b >= a);
    }

    #[test]
    fn fixed_clock_returns_injected_value() {
        let clock = FixedClock(1234.5);
        assert!((clock.now() - 1234.5).abs() < f64::EPSILON);
    }

    /// Verifies the trait is usable as a boxed trait object.
    #[test]
    fn clock_source_is_object_safe() {
        let boxed: Box<dyn ClockSource> = Box::new(FixedClock(7.0));
        assert!((boxed.now() - 7.0).abs() < f64::EPSILON);
    }
}
