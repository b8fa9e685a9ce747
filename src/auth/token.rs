//! Immutable bearer token snapshots and freshness helpers.

// self
use crate::{_prelude::*, auth::SecretString};

/// Immutable bearer token produced by one token-endpoint exchange.
///
/// A refresh always builds a new value that atomically replaces the cached one;
/// tokens are never mutated in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
	/// Opaque access token secret; callers must avoid logging it.
	pub access_token: SecretString,
	/// Instant the token was obtained from the endpoint.
	pub obtained_at: OffsetDateTime,
	/// Absolute expiry instant (`obtained_at + expires_in`).
	pub expires_at: OffsetDateTime,
}
impl Token {
	/// Creates a token snapshot from an endpoint response.
	pub fn new(
		access_token: impl Into<String>,
		obtained_at: OffsetDateTime,
		expires_at: OffsetDateTime,
	) -> Self {
		Self { access_token: SecretString::new(access_token), obtained_at, expires_at }
	}

	/// Returns `true` while the token stays valid beyond the safety margin.
	///
	/// A token inside the margin is treated as already stale so callers renew it
	/// proactively instead of riding it into a 401.
	pub fn is_fresh_at(&self, instant: OffsetDateTime, margin: Duration) -> bool {
		instant < self.expires_at - margin
	}

	/// Returns `true` once the expiry instant has passed.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Remaining validity at the provided instant (negative once expired).
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		self.expires_at - instant
	}
}
