//! Basic authentication policy with a precomputed static header.

// self
use crate::{
	_prelude::*,
	auth::{AuthPolicy, AuthScheme, BasicCredentials, PolicyFuture},
};

/// Policy that attaches a deterministic `Basic` authorization header.
///
/// The header value is computed once at construction; `authorize` performs no
/// network call and never fails past credential validation.
#[derive(Clone, Debug)]
pub struct BasicAuthPolicy {
	credentials: BasicCredentials,
}
impl BasicAuthPolicy {
	/// Creates a policy from validated credentials.
	pub fn new(credentials: BasicCredentials) -> Self {
		Self { credentials }
	}

	/// Returns the client identifier bound to this policy.
	pub fn client_id(&self) -> &str {
		self.credentials.client_id()
	}
}
impl AuthPolicy for BasicAuthPolicy {
	fn scheme(&self) -> AuthScheme {
		AuthScheme::Basic
	}

	fn authorize<'a>(&'a self, request: &'a mut Request) -> PolicyFuture<'a, Result<()>> {
		Box::pin(async move {
			request.headers_mut().insert(AUTHORIZATION, self.credentials.authorization().clone());

			Ok(())
		})
	}
}
