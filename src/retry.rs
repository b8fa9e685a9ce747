//! Retry policy, per-call attempt state, backoff computation, and idempotency helpers.

// crates.io
use rand::Rng;
use reqwest::header::{HeaderName, RETRY_AFTER};
use time::format_description::well_known::Rfc2822;
// self
use crate::_prelude::*;

/// Header that marks a non-idempotent request as safely replayable.
pub const IDEMPOTENCY_KEY: HeaderName = HeaderName::from_static("idempotency-key");

/// Transient-failure retry configuration shared by one transport.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
	/// Maximum number of transient retries per logical request (the 401 auth
	/// retry runs on its own independent counter).
	pub max_transient_retries: u32,
	/// Base delay fed into exponential full-jitter backoff.
	pub backoff_base: StdDuration,
	/// Upper bound for any computed backoff delay.
	pub backoff_cap: StdDuration,
	/// HTTP statuses treated as transient.
	pub retry_on_status: Vec<u16>,
}
impl RetryPolicy {
	/// Overrides the transient retry budget.
	pub fn with_max_transient_retries(mut self, max: u32) -> Self {
		self.max_transient_retries = max;

		self
	}

	/// Overrides the backoff base delay.
	pub fn with_backoff_base(mut self, base: StdDuration) -> Self {
		self.backoff_base = base;

		self
	}

	/// Overrides the backoff cap.
	pub fn with_backoff_cap(mut self, cap: StdDuration) -> Self {
		self.backoff_cap = cap;

		self
	}

	/// Replaces the set of statuses treated as transient.
	pub fn with_retry_on_status(mut self, statuses: impl Into<Vec<u16>>) -> Self {
		self.retry_on_status = statuses.into();

		self
	}

	pub(crate) fn retries_status(&self, status: u16) -> bool {
		self.retry_on_status.contains(&status)
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_transient_retries: 3,
			backoff_base: StdDuration::from_millis(200),
			backoff_cap: StdDuration::from_secs(10),
			retry_on_status: vec![429, 500, 502, 503, 504],
		}
	}
}

/// Attempt bookkeeping scoped to a single logical call; discarded afterwards.
///
/// The transient counter and the 401 auth retry flag live in separate fields so
/// the two budgets never borrow from each other.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct RetryState {
	attempts: u32,
	transient_retries: u32,
}
impl RetryState {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	pub(crate) fn attempts(&self) -> u32 {
		self.attempts
	}

	pub(crate) fn record_attempt(&mut self) {
		self.attempts += 1;
	}

	pub(crate) fn can_retry_transient(&self, policy: &RetryPolicy) -> bool {
		self.transient_retries < policy.max_transient_retries
	}

	/// Consumes one transient retry and computes the delay before the resend.
	///
	/// A valid server hint is honored as a floor (with a small positive wiggle
	/// so synchronized clients do not realign); otherwise exponential
	/// full-jitter backoff applies.
	pub(crate) fn next_transient_delay(
		&mut self,
		policy: &RetryPolicy,
		server_hint: Option<StdDuration>,
	) -> StdDuration {
		self.transient_retries += 1;

		match server_hint {
			Some(hint) => wiggle(hint),
			None => full_jitter(policy.backoff_base, self.transient_retries, policy.backoff_cap),
		}
	}
}

/// Generates a fresh idempotency key suitable for the `idempotency-key` header.
pub fn idempotency_key() -> String {
	format!("{:032x}", rand::rng().random::<u128>())
}

pub(crate) fn is_idempotent(method: &Method) -> bool {
	*method == Method::GET
		|| *method == Method::HEAD
		|| *method == Method::OPTIONS
		|| *method == Method::DELETE
}

/// Retries are allowed for idempotent methods, or when the caller marked a
/// write as replayable via an idempotency key.
pub(crate) fn can_retry(request: &Request) -> bool {
	is_idempotent(request.method()) || request.headers().contains_key(IDEMPOTENCY_KEY)
}

/// Returns the delay requested by a `Retry-After` header, either as delta
/// seconds or as an HTTP-date in the future.
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<StdDuration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(StdDuration::from_secs(secs));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return StdDuration::try_from(delta).ok();
		}
	}

	None
}

/// AWS-style full jitter: `U(0, min(cap, base * 2^retry))`.
fn full_jitter(base: StdDuration, retry: u32, cap: StdDuration) -> StdDuration {
	let exponential = base.as_secs_f64() * 2_f64.powi(retry.min(16) as i32);
	let max_sleep = exponential.min(cap.as_secs_f64());

	StdDuration::from_secs_f64(rand::rng().random_range(0.0..=max_sleep))
}

/// Honors a server hint as a floor while adding up to 10% positive wiggle.
fn wiggle(hint: StdDuration) -> StdDuration {
	let secs = hint.as_secs_f64();

	StdDuration::from_secs_f64(rand::rng().random_range(secs..=secs * 1.1))
}
