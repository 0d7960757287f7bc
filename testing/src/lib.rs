//! # Event Wizard Testing
//!
//! Testing utilities and helpers for the event wizard.
//!
//! This crate provides:
//! - Deterministic clocks
//! - The [`ReducerTest`] Given-When-Then builder
//! - Assertion helpers for reducer effects
//! - Effect resolution for driving a reducer without a Store
//!
//! ## Example
//!
//! ```ignore
//! use event_wizard_testing::{ReducerTest, assertions, test_clock};
//!
//! ReducerTest::new(WizardReducer::new())
//!     .with_env(test_environment())
//!     .given_state(WizardState::default())
//!     .when_action(WizardAction::SubmitEventStep)
//!     .then_effects(assertions::assert_has_future_effect)
//!     .run();
//! ```

use chrono::{DateTime, Duration, Utc};
use event_wizard_core::environment::Clock;
use std::sync::{Arc, Mutex};


pub use reducer_test::{ReducerTest, assertions, resolve_effects};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Arc, Clock, DateTime, Duration, Mutex, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use event_wizard_testing::mocks::FixedClock;
    /// use event_wizard_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when a test advances it
    ///
    /// Clones share the same time, so a test can keep one handle and give
    /// the other to the code under test.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a clock starting at `start`
        #[must_use]
        pub fn new(start: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(start)),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, by: Duration) {
            if let Ok(mut time) = self.time.lock() {
                *time += by;
            }
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
                .lock()
                .map_or_else(|poisoned| *poisoned.into_inner(), |time| *time)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse, which never happens.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Install a test-friendly tracing subscriber
///
/// Honors `RUST_LOG` and writes through the test harness capture. Safe to
/// call from every test; only the first call installs anything.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub use mocks::{FixedClock, ManualClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn manual_clock_advances_all_clones() {
        let clock = ManualClock::new(test_clock().now());
        let shared = clock.clone();

        clock.advance(Duration::seconds(3));

        assert_eq!(shared.now() - test_clock().now(), Duration::seconds(3));
    }

    #[test]
    fn init_test_tracing_is_idempotent() {
        init_test_tracing();
        init_test_tracing();
    }
}
