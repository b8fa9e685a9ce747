//! Injectable time source used for token expiry computation.

// self
use crate::_prelude::*;

/// Supplies the current instant to expiry and freshness checks.
///
/// The cache and policies never read the system clock directly; they go through
/// this trait so tests can pin or advance time deterministically.
pub trait Clock
where
	Self: Send + Sync + Debug,
{
	/// Returns the current UTC instant.
	fn now(&self) -> OffsetDateTime;
}

/// Default production clock backed by the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Manually driven clock for deterministic tests.
#[derive(Debug)]
pub struct ManualClock(Mutex<OffsetDateTime>);
impl ManualClock {
	/// Creates a clock pinned at the provided instant.
	pub fn new(start: OffsetDateTime) -> Self {
		Self(Mutex::new(start))
	}

	/// Repins the clock at the provided instant.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.0.lock() = instant;
	}

	/// Moves the clock forward (or backward, with a negative delta).
	pub fn advance(&self, delta: Duration) {
		let mut guard = self.0.lock();

		*guard += delta;
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.lock()
	}
}
