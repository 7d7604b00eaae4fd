//! Environment abstraction for deterministic testing.
//!
//! Decouples session logic from system resources (monotonic time, wall
//! clock, randomness). Production wires in a system-backed implementation;
//! tests drive a virtual clock so typing expiry, debounce, and reconnect
//! timing are exact rather than sleep-based.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Abstract environment providing time and randomness.
///
/// Implementations must guarantee that `now()` never goes backwards
/// within one execution context.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The instant type used by this environment.
    ///
    /// Production uses `std::time::Instant`; tests use a virtual clock
    /// built on the same type.
    type Instant: Copy
        + Ord
        + Send
        + Sync
        + std::ops::Sub<Output = Duration>
        + std::ops::Add<Duration, Output = Self::Instant>;

    /// Current monotonic time.
    fn now(&self) -> Self::Instant;

    /// Current wall-clock time, used for envelope timestamps and
    /// credential expiry checks.
    fn wall_clock(&self) -> DateTime<Utc>;

    /// Sleep for the given duration.
    ///
    /// Only driver code should await this; state-machine logic receives
    /// time as data.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fill the buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Short random base36 suffix for provisional message identities.
    fn random_suffix(&self) -> String {
        const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

        let mut bytes = [0u8; 5];
        self.random_bytes(&mut bytes);
        bytes
            .iter()
            .map(|byte| char::from(ALPHABET[usize::from(byte % 36)]))
            .collect()
    }
}

/// Deterministic environment for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::{Duration, Instant},
    };

    use chrono::{DateTime, TimeDelta, Utc};

    use super::Environment;

    /// Virtual-time environment with a seeded RNG.
    ///
    /// Time stands still until [`MockEnv::advance`] is called, which makes
    /// deadline-driven behavior (typing expiry, debounce, reconnect delay)
    /// exactly reproducible. Clones share the same clock and RNG stream.
    #[derive(Clone)]
    pub struct MockEnv {
        origin: Instant,
        wall_origin: DateTime<Utc>,
        offset_nanos: Arc<AtomicU64>,
        rng: Arc<AtomicU64>,
    }

    impl MockEnv {
        /// Create an environment with the default seed.
        #[must_use]
        pub fn new() -> Self {
            Self::with_seed(0x5EED)
        }

        /// Create an environment with a specific RNG seed.
        #[must_use]
        pub fn with_seed(seed: u64) -> Self {
            Self {
                origin: Instant::now(),
                // Fixed epoch so wall-clock assertions are stable.
                wall_origin: DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(1_750_000_000),
                offset_nanos: Arc::new(AtomicU64::new(0)),
                // Zero would freeze the xorshift stream.
                rng: Arc::new(AtomicU64::new(seed | 1)),
            }
        }

        /// Advance the virtual clock (monotonic and wall) by `duration`.
        pub fn advance(&self, duration: Duration) {
            let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
            self.offset_nanos.fetch_add(nanos, Ordering::Relaxed);
        }

        fn offset(&self) -> Duration {
            Duration::from_nanos(self.offset_nanos.load(Ordering::Relaxed))
        }
    }

    impl Default for MockEnv {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Environment for MockEnv {
        type Instant = Instant;

        fn now(&self) -> Instant {
            self.origin + self.offset()
        }

        fn wall_clock(&self) -> DateTime<Utc> {
            let offset = self.offset();
            self.wall_origin
                + TimeDelta::nanoseconds(i64::try_from(offset.as_nanos()).unwrap_or(i64::MAX))
        }

        fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
            // Virtual time: sleeping is a no-op; tests advance explicitly.
            std::future::ready(())
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            for chunk in buffer.chunks_mut(8) {
                let mut state = self.rng.load(Ordering::Relaxed);
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                self.rng.store(state, Ordering::Relaxed);

                for (i, byte) in chunk.iter_mut().enumerate() {
                    *byte = (state >> (8 * i)) as u8;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Environment, test_utils::MockEnv};

    #[test]
    fn clock_advances_only_on_demand() {
        let env = MockEnv::new();
        let t0 = env.now();
        let w0 = env.wall_clock();

        assert_eq!(env.now(), t0);

        env.advance(Duration::from_millis(3100));
        assert_eq!(env.now() - t0, Duration::from_millis(3100));
        assert_eq!((env.wall_clock() - w0).num_milliseconds(), 3100);
    }

    #[test]
    fn clones_share_the_clock() {
        let env = MockEnv::new();
        let clone = env.clone();

        env.advance(Duration::from_secs(5));
        assert_eq!(clone.now(), env.now());
    }

    #[test]
    fn seeded_rng_is_deterministic() {
        let a = MockEnv::with_seed(42);
        let b = MockEnv::with_seed(42);

        assert_eq!(a.random_suffix(), b.random_suffix());

        // The stream advances on each draw.
        let first = a.random_suffix();
        let second = a.random_suffix();
        assert_ne!(first, second);
    }

    #[test]
    fn suffix_is_five_base36_chars() {
        let env = MockEnv::new();
        let suffix = env.random_suffix();

        assert_eq!(suffix.len(), 5);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
