//! Immutable credential material for resource families, validated at construction.

// crates.io
use base64::Engine;
// self
use crate::{_prelude::*, auth::SecretString, error::CredentialError};

/// How client credentials are presented to the token endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClientAuthMethod {
	/// `Authorization: Basic <id:secret>` header (RFC 7617).
	#[default]
	SecretBasic,
	/// `client_id` + `client_secret` form fields in the request body.
	SecretPost,
}

/// Wire shape of the token-endpoint exchange.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TokenEndpointStyle {
	/// `POST` with a `grant_type=client_credentials` form body.
	#[default]
	FormPost,
	/// `GET` with a Basic authorization header and no body, as used by the
	/// sandbox `token/generate` endpoint.
	LegacyGet,
}

/// Static credential pair for the Basic authentication scheme.
///
/// Immutable after construction and owned exclusively by one policy instance;
/// credentials are never shared across resource families.
#[derive(Clone, Debug)]
pub struct BasicCredentials {
	client_id: String,
	authorization: HeaderValue,
}
impl BasicCredentials {
	/// Validates the pair and precomputes the deterministic authorization header.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Result<Self, CredentialError> {
		let client_id = client_id.into();
		let client_secret = SecretString::new(client_secret);

		validate_client_id(&client_id)?;
		validate_field("Client secret", client_secret.expose())?;

		let authorization = encode_basic(&client_id, &client_secret)?;

		Ok(Self { client_id, authorization })
	}

	/// Returns the client identifier.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	pub(crate) fn authorization(&self) -> &HeaderValue {
		&self.authorization
	}
}

/// Static credentials plus token-endpoint coordinates for the Bearer scheme.
#[derive(Clone, Debug)]
pub struct BearerCredentials {
	client_id: String,
	client_secret: SecretString,
	token_endpoint: Url,
	scope: Option<String>,
	auth_method: ClientAuthMethod,
	endpoint_style: TokenEndpointStyle,
	authorization: HeaderValue,
}
impl BearerCredentials {
	/// Validates the credential material and precomputes the Basic header used
	/// for token-endpoint client authentication.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		token_endpoint: Url,
	) -> Result<Self, CredentialError> {
		let client_id = client_id.into();
		let client_secret = SecretString::new(client_secret);

		validate_client_id(&client_id)?;
		validate_field("Client secret", client_secret.expose())?;

		let authorization = encode_basic(&client_id, &client_secret)?;

		Ok(Self {
			client_id,
			client_secret,
			token_endpoint,
			scope: None,
			auth_method: ClientAuthMethod::default(),
			endpoint_style: TokenEndpointStyle::default(),
			authorization,
		})
	}

	/// Requests the provided scope during token acquisition.
	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Overrides how client credentials reach the token endpoint.
	pub fn with_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.auth_method = method;

		self
	}

	/// Overrides the wire shape of the token exchange.
	pub fn with_endpoint_style(mut self, style: TokenEndpointStyle) -> Self {
		self.endpoint_style = style;

		self
	}

	/// Returns the client identifier.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// Returns the token endpoint URL.
	pub fn token_endpoint(&self) -> &Url {
		&self.token_endpoint
	}

	/// Returns the requested scope, if any.
	pub fn scope(&self) -> Option<&str> {
		self.scope.as_deref()
	}

	/// Returns the configured client authentication method.
	pub fn auth_method(&self) -> ClientAuthMethod {
		self.auth_method
	}

	/// Returns the configured token-endpoint wire shape.
	pub fn endpoint_style(&self) -> TokenEndpointStyle {
		self.endpoint_style
	}

	pub(crate) fn client_secret(&self) -> &SecretString {
		&self.client_secret
	}

	pub(crate) fn authorization(&self) -> &HeaderValue {
		&self.authorization
	}
}

fn validate_client_id(client_id: &str) -> Result<(), CredentialError> {
	validate_field("Client identifier", client_id)?;

	if client_id.contains(':') {
		return Err(CredentialError::ClientIdContainsColon);
	}

	Ok(())
}

fn validate_field(field: &'static str, value: &str) -> Result<(), CredentialError> {
	if value.trim().is_empty() {
		return Err(CredentialError::Empty { field });
	}
	if value.chars().any(|c| c.is_control()) {
		return Err(CredentialError::NotHeaderSafe { field });
	}

	Ok(())
}

fn encode_basic(
	client_id: &str,
	client_secret: &SecretString,
) -> Result<HeaderValue, CredentialError> {
	let encoded = base64::engine::general_purpose::STANDARD
		.encode(format!("{client_id}:{}", client_secret.expose()));
	let mut value = HeaderValue::try_from(format!("Basic {encoded}"))
		.map_err(|_| CredentialError::NotHeaderSafe { field: "Credential pair" })?;

	value.set_sensitive(true);

	Ok(value)
}
