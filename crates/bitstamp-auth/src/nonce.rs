//! Strictly increasing request nonces
//!
//! Bitstamp rejects any nonce that is not greater than the last one it saw
//! for the key. A bare millisecond timestamp collides when several requests
//! are signed in the same millisecond, so each nonce is the timestamp
//! followed by a fixed-width per-millisecond sequence number.

use chrono::Utc;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Digits reserved for the per-millisecond sequence
pub const NONCE_SEQUENCE_WIDTH: usize = 4;

/// Largest sequence value that fits the padding
const NONCE_SEQUENCE_MAX: u32 = 9_999;

/// Source of wall-clock milliseconds
pub trait Clock: Send + Sync + fmt::Debug {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> u64;
}

/// Wall clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Manually driven clock for deterministic nonces
#[derive(Debug, Default)]
pub struct FixedClock {
    millis: AtomicU64,
}

impl FixedClock {
    /// Create a clock frozen at `millis`
    pub fn new(millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(millis),
        }
    }

    /// Move the clock to `millis`
    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    /// Move the clock forward
    pub fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

/// Single-use request token
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nonce(String);

impl Nonce {
    /// Wrap an existing nonce string (e.g. a fixed value in tests)
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the nonce as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the nonce
    pub fn as_u128(&self) -> Option<u128> {
        self.0.parse().ok()
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Default)]
struct NonceState {
    last_millis: u64,
    sequence: u32,
}

/// Generator of strictly increasing nonces
///
/// Nonces are `{millis}{sequence:04}`. When more than 10 000 nonces are
/// requested within one millisecond, the generator borrows the next
/// millisecond instead of widening the sequence, and a clock that steps
/// backwards is treated as the last millisecond used. Either way every
/// nonce is greater than the previous one.
#[derive(Debug)]
pub struct NonceGenerator {
    clock: Arc<dyn Clock>,
    state: Mutex<NonceState>,
}

impl Default for NonceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl NonceGenerator {
    /// Create a generator reading the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a generator reading a custom clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Mutex::new(NonceState::default()),
        }
    }

    /// Produce the next nonce
    pub fn next(&self) -> Nonce {
        let now = self.clock.now_millis();
        let mut state = self.state.lock();

        if now > state.last_millis {
            state.last_millis = now;
            state.sequence = 0;
        } else if state.sequence >= NONCE_SEQUENCE_MAX {
            state.last_millis += 1;
            state.sequence = 0;
        } else {
            state.sequence += 1;
        }

        let nonce = format!(
            "{}{:0width$}",
            state.last_millis,
            state.sequence,
            width = NONCE_SEQUENCE_WIDTH
        );
        trace!(nonce = %nonce, "generated nonce");
        Nonce(nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: u64 = 1_617_181_920_212;

    fn fixed(millis: u64) -> (Arc<FixedClock>, NonceGenerator) {
        let clock = Arc::new(FixedClock::new(millis));
        let generator = NonceGenerator::with_clock(clock.clone());
        (clock, generator)
    }

    fn assert_strictly_increasing(nonces: &[Nonce]) {
        for pair in nonces.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
            assert!(pair[0].as_u128().unwrap() < pair[1].as_u128().unwrap());
        }
    }

    #[test]
    fn test_first_nonce_format() {
        let (_clock, generator) = fixed(T0);
        assert_eq!(generator.next().as_str(), "16171819202120000");
        assert_eq!(generator.next().as_str(), "16171819202120001");
    }

    #[test]
    fn test_same_millisecond_burst_is_strictly_increasing() {
        let (_clock, generator) = fixed(T0);
        let nonces: Vec<Nonce> = (0..5000).map(|_| generator.next()).collect();

        assert_strictly_increasing(&nonces);
        assert_eq!(nonces[4999].as_str(), "16171819202124999");
    }

    #[test]
    fn test_sequence_resets_when_clock_advances() {
        let (clock, generator) = fixed(T0);
        generator.next();
        generator.next();

        clock.advance(1);
        assert_eq!(generator.next().as_str(), format!("{}0000", T0 + 1));
    }

    #[test]
    fn test_sequence_overflow_borrows_next_millisecond() {
        let (_clock, generator) = fixed(T0);
        let nonces: Vec<Nonce> = (0..10_002).map(|_| generator.next()).collect();

        assert_strictly_increasing(&nonces);
        assert_eq!(nonces[9_999].as_str(), format!("{}9999", T0));
        assert_eq!(nonces[10_000].as_str(), format!("{}0000", T0 + 1));
        assert!(nonces.iter().all(|n| n.as_str().len() == 17));
    }

    #[test]
    fn test_clock_going_backwards_stays_monotonic() {
        let (clock, generator) = fixed(T0);
        let first = generator.next();

        clock.set(T0 - 50);
        let second = generator.next();

        assert!(first < second);
        assert_eq!(second.as_str(), format!("{}0001", T0));
    }

    #[test]
    fn test_system_clock_nonces_increase() {
        let generator = NonceGenerator::new();
        let nonces: Vec<Nonce> = (0..1000).map(|_| generator.next()).collect();
        assert_strictly_increasing(&nonces);
    }
}
