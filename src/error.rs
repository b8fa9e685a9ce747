//! SDK-level error types shared across auth policies, the token cache, and the transport.

// self
use crate::_prelude::*;

/// SDK-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical SDK error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Static credential material was malformed at construction time.
	#[error(transparent)]
	Credential(#[from] CredentialError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The token endpoint could not produce a usable bearer token.
	#[error(transparent)]
	TokenAcquisition(#[from] TokenAcquisitionError),
	/// The service kept rejecting the request after the single permitted auth retry.
	#[error(transparent)]
	Authentication(#[from] AuthenticationError),
	/// Retry budget exhausted for 429/5xx/timeout failures.
	#[error(transparent)]
	Transient(#[from] TransientFailureError),
	/// The service returned a structured error envelope.
	#[error(transparent)]
	Api(#[from] Box<crate::api::ApiError>),
	/// A response body could not be deserialized into the expected model.
	#[error(transparent)]
	Serialization(#[from] SerializationError),
}

/// Construction-time validation failures for static credentials.
///
/// These are fatal: a policy built from malformed credentials is never retried,
/// so the failure surfaces immediately instead of at send time.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CredentialError {
	/// A required credential field was empty or whitespace.
	#[error("{field} must not be empty.")]
	Empty {
		/// Name of the offending field.
		field: &'static str,
	},
	/// Basic client identifiers cannot contain a colon (RFC 7617 delimiter).
	#[error("Client identifier must not contain a colon.")]
	ClientIdContainsColon,
	/// A credential field contains bytes that cannot travel in an HTTP header.
	#[error("{field} contains characters that cannot appear in an HTTP header.")]
	NotHeaderSafe {
		/// Name of the offending field.
		field: &'static str,
	},
}

/// Configuration and client-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be parsed.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Token endpoint URL cannot be parsed.
	#[error("Token endpoint URL is invalid.")]
	InvalidTokenEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A relative endpoint path cannot be joined to the configured base URL.
	#[error("Endpoint path cannot be joined to the configured base URL.")]
	InvalidPath {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// An outgoing request could not be assembled.
	#[error("Request could not be assembled.")]
	RequestBuild {
		/// Underlying builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	/// Wraps a request assembly failure inside [`ConfigError`].
	pub fn request_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::RequestBuild { source: Box::new(src) }
	}
}

/// Failures raised while acquiring a bearer token from the token endpoint.
///
/// Surfaced by [`TokenCache::get_token`](crate::cache::TokenCache::get_token) and
/// propagated through `authorize`; the transport retries acquisition only as part
/// of its single 401-driven refresh, never on its own schedule.
#[derive(Debug, ThisError)]
pub enum TokenAcquisitionError {
	/// Token endpoint answered with a non-2xx status.
	#[error("Token endpoint returned HTTP {status}.")]
	Endpoint {
		/// HTTP status code returned by the endpoint.
		status: u16,
		/// Truncated response body for diagnostics.
		body_preview: Option<String>,
	},
	/// Token endpoint responded with JSON that does not match the token contract.
	#[error("Token endpoint returned a malformed token response.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Token endpoint reported a zero or negative `expires_in`.
	#[error("Token endpoint reported a non-positive expires_in.")]
	NonPositiveExpiresIn,
	/// The issued access token contains bytes that cannot travel in an HTTP header.
	#[error("Issued access token cannot be carried in an HTTP header.")]
	TokenNotHeaderSafe,
	/// Network-level failure while calling the token endpoint.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TokenAcquisitionError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TokenAcquisitionError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Terminal authentication failure for a logical request.
///
/// Raised when a 401 persists after the single permitted refresh-and-retry, or
/// when the active policy declines to refresh at all.
#[derive(Debug, ThisError)]
#[error("Request remained unauthorized after {attempts} attempt(s).")]
pub struct AuthenticationError {
	/// Number of send attempts made for the logical request.
	pub attempts: u32,
	/// Whether a credential refresh was performed before giving up.
	pub refreshed: bool,
}

/// Transient-failure retry budget exhausted for a logical request.
#[derive(Debug, ThisError)]
#[error("Transient retry budget exhausted after {attempts} attempt(s).")]
pub struct TransientFailureError {
	/// Number of send attempts made for the logical request.
	pub attempts: u32,
	/// HTTP status of the last attempt, absent when the failure never produced a response.
	pub last_status: Option<u16>,
	/// Network error from the last attempt, when the failure was not an HTTP status.
	#[source]
	pub source: Option<BoxError>,
}

/// Response-deserialization failures raised by resource clients.
#[derive(Debug, ThisError)]
pub enum SerializationError {
	/// Response body could not be read from the wire.
	#[error("Response body could not be read.")]
	Read {
		/// Underlying transport failure.
		#[source]
		source: BoxError,
	},
	/// Response body is not valid JSON for the expected model.
	#[error("Response body does not match the expected model.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
