//! Observer hook points invoked by the transport at request milestones.
//!
//! Hook arguments are redaction-safe by construction: the info structs carry
//! methods, URLs, statuses, attempt counters, and delays, never header
//! material, credentials, or token values. Scheme labels identify the policy
//! kind as an opaque marker. Hook implementations must not panic; the
//! transport calls them inline on the request path.

// self
use crate::{_prelude::*, auth::AuthScheme};

/// Observer invoked by the transport at defined points of a logical call.
///
/// All methods default to no-ops so implementations override only the
/// milestones they care about.
pub trait TransportHook
where
	Self: Send + Sync,
{
	/// Called before each send attempt (including resends).
	fn on_request(&self, info: &RequestInfo) {
		let _ = info;
	}

	/// Called after every received response, including ones that will be retried.
	fn on_response(&self, info: &ResponseInfo) {
		let _ = info;
	}

	/// Called when the service answered 401 and the policy was consulted.
	fn on_unauthorized(&self, info: &UnauthorizedInfo) {
		let _ = info;
	}

	/// Called when a transient retry has been scheduled.
	fn on_retry(&self, info: &RetryInfo) {
		let _ = info;
	}
}

/// Milestone data for an outgoing attempt.
#[derive(Clone, Debug)]
pub struct RequestInfo {
	/// HTTP method of the request.
	pub method: Method,
	/// Full request URL.
	pub url: Url,
	/// 1-based send attempt number within the logical call.
	pub attempt: u32,
	/// Scheme label of the active policy, if one is attached.
	pub scheme: Option<AuthScheme>,
}

/// Milestone data for a received response.
#[derive(Clone, Debug)]
pub struct ResponseInfo {
	/// HTTP method of the request.
	pub method: Method,
	/// Full request URL.
	pub url: Url,
	/// Response status code.
	pub status: StatusCode,
	/// 1-based send attempt number within the logical call.
	pub attempt: u32,
	/// Wall-clock duration of the attempt.
	pub elapsed: StdDuration,
	/// Correlation identifier from the `x-request-id` response header.
	pub request_id: Option<String>,
}

/// Milestone data for a 401 consultation.
#[derive(Clone, Copy, Debug)]
pub struct UnauthorizedInfo {
	/// 1-based send attempt that received the 401.
	pub attempt: u32,
	/// Whether the policy refreshed and a resend follows.
	pub will_retry: bool,
}

/// Why a transient retry was scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryReason {
	/// A retryable HTTP status (429/5xx) was received.
	Status(u16),
	/// The attempt failed at the network layer (timeout, connection error).
	Network,
}
impl Display for RetryReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			RetryReason::Status(status) => write!(f, "status_{status}"),
			RetryReason::Network => f.write_str("network"),
		}
	}
}

/// Milestone data for a scheduled transient retry.
#[derive(Clone, Copy, Debug)]
pub struct RetryInfo {
	/// 1-based send attempt that triggered the retry.
	pub attempt: u32,
	/// Delay before the resend.
	pub delay: StdDuration,
	/// What made the attempt transiently fail.
	pub reason: RetryReason,
	/// Whether the delay came from a server `Retry-After` hint.
	pub server_hinted: bool,
}

/// Hook that logs milestones through [`tracing`] events.
#[cfg(feature = "tracing")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingHook;
#[cfg(feature = "tracing")]
impl TransportHook for TracingHook {
	fn on_request(&self, info: &RequestInfo) {
		tracing::debug!(
			method = %info.method,
			url = %info.url,
			attempt = info.attempt,
			scheme = info.scheme.map(|s| s.as_str()),
			"sending request",
		);
	}

	fn on_response(&self, info: &ResponseInfo) {
		tracing::info!(
			method = %info.method,
			url = %info.url,
			status = info.status.as_u16(),
			attempt = info.attempt,
			elapsed_ms = info.elapsed.as_millis() as u64,
			request_id = info.request_id.as_deref(),
			"received response",
		);
	}

	fn on_unauthorized(&self, info: &UnauthorizedInfo) {
		tracing::warn!(attempt = info.attempt, will_retry = info.will_retry, "unauthorized");
	}

	fn on_retry(&self, info: &RetryInfo) {
		tracing::info!(
			attempt = info.attempt,
			delay_ms = info.delay.as_millis() as u64,
			reason = %info.reason,
			server_hinted = info.server_hinted,
			"retry scheduled",
		);
	}
}
