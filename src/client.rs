//! Top-level SDK facade wiring the shared transport and per-family policies.

// self
use crate::{
	_prelude::*,
	auth::{AuthPolicy, BearerAuthPolicy, BearerCredentials, TokenEndpointStyle},
	cache::TokenCache,
	config::ClientConfig,
	error::ConfigError,
	resources::CheckersClient,
	transport::Transport,
};

/// Token endpoint used by the hosted sandbox environment.
pub const SANDBOX_TOKEN_ENDPOINT: &str = "https://sbx.kra.go.ke/v1/token/generate";

/// Async SDK facade with per-family credentials.
///
/// Every resource family owns its own policy and token cache, injected here at
/// construction; there is no process-wide credential state, so two facades (or
/// two families) can never observe each other's secrets.
pub struct GavaConnect {
	transport: Arc<Transport>,
	/// Checkers resource family client.
	pub checkers: CheckersClient,
}
impl GavaConnect {
	/// Builds a facade from a configuration and the checkers family credentials.
	pub fn new(config: ClientConfig, checkers: BearerCredentials) -> Result<Self> {
		let margin = config.token_refresh_margin;
		let transport = Arc::new(Transport::new(config)?);
		let cache = TokenCache::new(checkers, transport.http().clone())
			.with_refresh_margin(margin);
		let policy: Arc<dyn AuthPolicy> = Arc::new(BearerAuthPolicy::new(cache));
		let checkers = CheckersClient::new(transport.clone(), policy);

		Ok(Self { transport, checkers })
	}

	/// Convenience constructor that points the checkers family at the sandbox
	/// token endpoint, which still speaks the legacy GET exchange.
	pub fn sandbox(
		config: ClientConfig,
		checkers_client_id: impl Into<String>,
		checkers_client_secret: impl Into<String>,
	) -> Result<Self> {
		let endpoint = Url::parse(SANDBOX_TOKEN_ENDPOINT)
			.map_err(|source| ConfigError::InvalidTokenEndpoint { source })?;
		let credentials =
			BearerCredentials::new(checkers_client_id, checkers_client_secret, endpoint)?
				.with_endpoint_style(TokenEndpointStyle::LegacyGet);

		Self::new(config, credentials)
	}

	/// Returns the shared transport (for hook registration inspection or
	/// advanced callers issuing raw requests).
	pub fn transport(&self) -> &Arc<Transport> {
		&self.transport
	}
}
impl Debug for GavaConnect {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GavaConnect").field("transport", &self.transport).finish()
	}
}
