//! PIN validation client for the checkers resource family.

// self
use crate::{
	_prelude::*,
	api,
	auth::AuthPolicy,
	error::ConfigError,
	retry,
	transport::Transport,
};

/// Result of an online PIN validation check.
#[derive(Clone, Debug, Deserialize)]
pub struct PinCheck {
	/// Echoed PIN value.
	#[serde(default, alias = "PIN")]
	pub pin: Option<String>,
	/// Registered taxpayer name for the PIN.
	#[serde(default, alias = "TaxPayerName")]
	pub taxpayer_name: Option<String>,
	/// Registration status string reported by the service.
	#[serde(default)]
	pub status: Option<String>,
	/// Service verdict on the PIN's validity.
	#[serde(default)]
	pub valid: Option<bool>,
}

/// Client for the checkers family's PIN validation endpoints.
///
/// Holds exactly one [`AuthPolicy`] for its lifetime; credentials for other
/// resource families never flow through this client.
pub struct CheckersClient {
	transport: Arc<Transport>,
	policy: Arc<dyn AuthPolicy>,
}
impl CheckersClient {
	const VALIDATE_PATH: &'static str = "checker/v1/pinbypin";

	/// Creates a client over the shared transport and its bound policy.
	pub fn new(transport: Arc<Transport>, policy: Arc<dyn AuthPolicy>) -> Self {
		Self { transport, policy }
	}

	/// Validates a PIN via `POST` with a JSON payload.
	///
	/// The request carries an idempotency key so the transport may safely
	/// replay it on transient failures.
	pub async fn validate_pin(&self, pin: &str) -> Result<PinCheck> {
		let request = self
			.transport
			.request(Method::POST, Self::VALIDATE_PATH)?
			.json(&serde_json::json!({ "PIN": pin }))
			.header(retry::IDEMPOTENCY_KEY, retry::idempotency_key())
			.build()
			.map_err(ConfigError::request_build)?;

		self.fetch(request).await
	}

	/// Validates a PIN via `GET` with a query parameter.
	pub async fn validate_pin_get(&self, pin: &str) -> Result<PinCheck> {
		let request = self
			.transport
			.request(Method::GET, Self::VALIDATE_PATH)?
			.query(&[("PIN", pin)])
			.build()
			.map_err(ConfigError::request_build)?;

		self.fetch(request).await
	}

	async fn fetch(&self, request: Request) -> Result<PinCheck> {
		let response = self.transport.send(request, Some(self.policy.as_ref())).await?;
		let response = api::error_for(response).await?;

		Ok(api::read_json(response).await?)
	}
}
impl Debug for CheckersClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CheckersClient")
			.field("transport", &self.transport)
			.field("scheme", &self.policy.scheme())
			.finish()
	}
}
