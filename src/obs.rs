//! Optional observability helpers for transport calls and token refreshes.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `gavaconnect.call` with the `call`
//!   (operation) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `gavaconnect_call_total` counter for every
//!   attempt/retry/success/failure, labeled by `call` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the SDK.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// A resource request traveling through the shared transport.
	Request,
	/// A client-credentials exchange against the token endpoint.
	TokenRefresh,
}
impl CallKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallKind::Request => "request",
			CallKind::TokenRefresh => "token_refresh",
		}
	}
}
impl Display for CallKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to an SDK operation.
	Attempt,
	/// A retry was scheduled for the operation.
	Retry,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Retry => "retry",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
