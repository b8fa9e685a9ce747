//! Pluggable authentication policy contract consumed by the transport.
//!
//! New schemes (API key, HMAC, mTLS) are added by implementing [`AuthPolicy`],
//! never by teaching the transport about scheme internals.

// self
use crate::_prelude::*;

/// Boxed future returned by [`AuthPolicy`] methods.
pub type PolicyFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a + Send>>;

/// Strategy object that attaches authentication material to a request.
///
/// One policy instance is bound to exactly one resource client for its lifetime;
/// policies own their credential material and never share it across families.
pub trait AuthPolicy
where
	Self: Send + Sync,
{
	/// Returns the scheme label used in hook and span fields.
	fn scheme(&self) -> AuthScheme;

	/// Attaches the scheme's `Authorization` header to the request.
	///
	/// Bearer implementations may suspend here while a token refresh completes;
	/// acquisition failures propagate to the caller of the logical request.
	fn authorize<'a>(&'a self, request: &'a mut Request) -> PolicyFuture<'a, Result<()>>;

	/// Reacts to a 401 from the service.
	///
	/// Returns `true` when the policy refreshed (or invalidated) its material and
	/// a single resend is worth attempting. The transport, not the policy,
	/// enforces that at most one auth retry happens per logical request.
	fn on_unauthorized(&self) -> PolicyFuture<'_, bool> {
		Box::pin(async { false })
	}
}

/// Authentication scheme labels observed by hooks and spans.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthScheme {
	/// Static `Basic` header derived from a credential pair.
	Basic,
	/// `Bearer` token obtained from a token endpoint.
	Bearer,
}
impl AuthScheme {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthScheme::Basic => "basic",
			AuthScheme::Bearer => "bearer",
		}
	}
}
impl Display for AuthScheme {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
