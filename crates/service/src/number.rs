//! Order number generation.
//!
//! Order numbers are human-readable identifiers of the form
//! `ORD-{epoch_millis}-{suffix}` where the suffix is a zero-padded value in
//! `[0, 1000)`. The format alone does not guarantee uniqueness — the service
//! checks candidates against the orders table and the table carries a UNIQUE
//! constraint as a backstop.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;

/// Time source for order numbers and entity timestamps.
///
/// Injected instead of calling `Utc::now()` directly so that generated
/// numbers are reproducible in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Source of the order-number suffix, a value in `[0, 1000)`.
pub trait SuffixSource: Send + Sync {
    fn next_suffix(&self) -> u32;
}

/// Production suffix source backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSuffix;

impl SuffixSource for RandomSuffix {
    fn next_suffix(&self) -> u32 {
        rand::thread_rng().gen_range(0..1000)
    }
}

/// Generates order numbers from an injected clock and suffix source.
pub struct OrderNumberGenerator {
    clock: Arc<dyn Clock>,
    suffix: Arc<dyn SuffixSource>,
}

impl OrderNumberGenerator {
    pub fn new(clock: Arc<dyn Clock>, suffix: Arc<dyn SuffixSource>) -> Self {
        Self { clock, suffix }
    }

    /// Generator wired to the system clock and thread-local RNG.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(RandomSuffix))
    }

    /// Produces one candidate order number, e.g. `ORD-1717171717171-042`.
    pub fn generate(&self) -> String {
        let timestamp = self.clock.now().timestamp_millis();
        let suffix = self.suffix.next_suffix() % 1000;
        format!("ORD-{timestamp}-{suffix:03}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    struct FixedSuffix(u32);

    impl SuffixSource for FixedSuffix {
        fn next_suffix(&self) -> u32 {
            self.0
        }
    }

    #[test]
    fn test_generate_is_deterministic_with_injected_sources() {
        let clock = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
        ));
        let generator = OrderNumberGenerator::new(clock, Arc::new(FixedSuffix(42)));
        let number = generator.generate();
        assert_eq!(number, "ORD-1705320000000-042");
        assert_eq!(generator.generate(), number);
    }

    #[test]
    fn test_generate_matches_expected_format() {
        let generator = OrderNumberGenerator::system();
        let number = generator.generate();

        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        // 13-digit millisecond timestamp for the current epoch.
        assert_eq!(parts[1].len(), 13);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 3);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_suffix_is_zero_padded_to_three_digits() {
        let clock = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
        ));
        let generator = OrderNumberGenerator::new(clock, Arc::new(FixedSuffix(7)));
        assert!(generator.generate().ends_with("-007"));
    }
}
