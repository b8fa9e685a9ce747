//! Bearer authentication policy backed by a cached, refreshable token.

// self
use crate::{
	_prelude::*,
	auth::{AuthPolicy, AuthScheme, PolicyFuture},
	cache::TokenCache,
	error::TokenAcquisitionError,
};

/// Policy that attaches `Bearer <token>` headers sourced from a [`TokenCache`].
///
/// The policy owns its cache; a 401 invalidates the cached token so the next
/// `authorize` call performs a fresh exchange. Whether that retry actually
/// happens (and happens at most once) is the transport's decision.
pub struct BearerAuthPolicy {
	cache: Arc<TokenCache>,
}
impl BearerAuthPolicy {
	/// Creates a policy around the provided cache.
	pub fn new(cache: impl Into<Arc<TokenCache>>) -> Self {
		Self { cache: cache.into() }
	}

	/// Returns the cache backing this policy.
	pub fn cache(&self) -> &Arc<TokenCache> {
		&self.cache
	}
}
impl AuthPolicy for BearerAuthPolicy {
	fn scheme(&self) -> AuthScheme {
		AuthScheme::Bearer
	}

	fn authorize<'a>(&'a self, request: &'a mut Request) -> PolicyFuture<'a, Result<()>> {
		Box::pin(async move {
			let token = self.cache.get_token().await?;
			let mut value =
				HeaderValue::try_from(format!("Bearer {}", token.access_token.expose()))
					.map_err(|_| TokenAcquisitionError::TokenNotHeaderSafe)?;

			value.set_sensitive(true);
			request.headers_mut().insert(AUTHORIZATION, value);

			Ok(())
		})
	}

	fn on_unauthorized(&self) -> PolicyFuture<'_, bool> {
		Box::pin(async move {
			// The server's view of validity may differ from the cached expiry.
			self.cache.invalidate().await;

			true
		})
	}
}
impl Debug for BearerAuthPolicy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BearerAuthPolicy").field("cache", &self.cache).finish()
	}
}
