//! Structured error-envelope helpers shared by resource clients.
//!
//! The transport hands every non-retryable status back as a plain response;
//! resource clients opt into envelope interpretation through [`error_for`].

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, error::SerializationError};

/// Structured service error decoded from the standard envelope.
#[derive(Debug, ThisError)]
#[error("Service returned HTTP {status}: {message}")]
pub struct ApiError {
	/// HTTP status code of the response.
	pub status: u16,
	/// Error type reported by the service (`api_error` when absent).
	pub kind: String,
	/// Human-readable message from the envelope, or the raw body text.
	pub message: String,
	/// Service-specific error code, when present.
	pub code: Option<String>,
	/// Correlation identifier from the `x-request-id` response header.
	pub request_id: Option<String>,
	/// Retry hint in seconds carried inside the envelope.
	pub retry_after: Option<f64>,
	/// Raw response body text, when non-empty.
	pub body: Option<String>,
}
impl ApiError {
	/// Returns `true` when the service throttled the caller.
	pub fn is_rate_limited(&self) -> bool {
		self.status == 429
	}
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
	#[serde(default)]
	error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
	#[serde(default, rename = "type")]
	kind: Option<String>,
	#[serde(default)]
	message: Option<String>,
	#[serde(default)]
	code: Option<String>,
	#[serde(default)]
	retry_after: Option<f64>,
}

/// Passes non-error responses through and converts 4xx/5xx into [`ApiError`].
///
/// Bodies that do not match the envelope still produce a usable error carrying
/// the raw text.
pub async fn error_for(response: Response) -> Result<Response> {
	let status = response.status().as_u16();

	if status < 400 {
		return Ok(response);
	}

	let request_id = response
		.headers()
		.get("x-request-id")
		.and_then(|v| v.to_str().ok())
		.map(str::to_owned);
	let body = response.text().await.unwrap_or_default();
	let envelope: ErrorEnvelope = serde_json::from_str(&body).unwrap_or_default();

	Err(Box::new(ApiError {
		status,
		kind: envelope.error.kind.unwrap_or_else(|| "api_error".into()),
		message: envelope.error.message.unwrap_or_else(|| body.clone()),
		code: envelope.error.code,
		request_id,
		retry_after: envelope.error.retry_after,
		body: (!body.is_empty()).then_some(body),
	})
	.into())
}

/// Reads a response body and decodes it into the expected model.
pub async fn read_json<T>(response: Response) -> Result<T, SerializationError>
where
	T: DeserializeOwned,
{
	let bytes = response
		.bytes()
		.await
		.map_err(|source| SerializationError::Read { source: Box::new(source) })?;
	let mut deserializer = serde_json::Deserializer::from_slice(&bytes);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| SerializationError::Decode { source })
}
