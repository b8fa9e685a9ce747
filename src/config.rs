//! SDK configuration consumed by the transport and per-family token caches.

// crates.io
use serde::{Deserializer, de::Error as DeError};
// self
use crate::{_prelude::*, error::ConfigError};
pub use crate::retry::RetryPolicy;

/// Configuration for one SDK client instance.
///
/// Deserializes from the recognized option names (`timeout_seconds`,
/// `max_transient_retries`, `backoff_base_seconds`,
/// `token_refresh_margin_seconds`, …); every option except `base_url` falls
/// back to its default.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// Base URL all relative endpoint paths are joined to.
	pub base_url: Url,
	/// Connection-establishment timeout per attempt.
	pub connect_timeout: StdDuration,
	/// Total timeout per send attempt (connect + read).
	pub timeout: StdDuration,
	/// Value of the `user-agent` and `x-client-version` request headers.
	pub user_agent: String,
	/// Transient-failure retry configuration.
	pub retry: RetryPolicy,
	/// Early-refresh safety margin applied to cached bearer tokens.
	pub token_refresh_margin: Duration,
}
impl ClientConfig {
	/// Default `user-agent` value sent with every request.
	pub const DEFAULT_USER_AGENT: &'static str =
		concat!("gavaconnect-rs/", env!("CARGO_PKG_VERSION"));

	/// Creates a configuration with defaults for everything except the base URL.
	pub fn new(base_url: impl AsRef<str>) -> Result<Self, ConfigError> {
		let base_url = Url::parse(base_url.as_ref())
			.map_err(|source| ConfigError::InvalidBaseUrl { source })?;

		Ok(Self {
			base_url,
			connect_timeout: StdDuration::from_secs(5),
			timeout: StdDuration::from_secs(30),
			user_agent: Self::DEFAULT_USER_AGENT.into(),
			retry: RetryPolicy::default(),
			token_refresh_margin: Duration::seconds(60),
		})
	}

	/// Overrides the per-attempt connection timeout.
	pub fn with_connect_timeout(mut self, timeout: StdDuration) -> Self {
		self.connect_timeout = timeout;

		self
	}

	/// Overrides the per-attempt total timeout.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the user-agent header value.
	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = user_agent.into();

		self
	}

	/// Replaces the retry configuration.
	pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;

		self
	}

	/// Overrides the early-refresh margin (negative values clamp to zero).
	pub fn with_token_refresh_margin(mut self, margin: Duration) -> Self {
		self.token_refresh_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}
}
impl<'de> Deserialize<'de> for ClientConfig {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = RawClientConfig::deserialize(deserializer)?;
		let mut config = ClientConfig::new(&raw.base_url).map_err(D::Error::custom)?;

		if let Some(secs) = raw.timeout_seconds {
			config.timeout = seconds_field::<D::Error>("timeout_seconds", secs)?;
		}
		if let Some(secs) = raw.connect_timeout_seconds {
			config.connect_timeout = seconds_field::<D::Error>("connect_timeout_seconds", secs)?;
		}
		if let Some(max) = raw.max_transient_retries {
			config.retry.max_transient_retries = max;
		}
		if let Some(secs) = raw.backoff_base_seconds {
			config.retry.backoff_base = seconds_field::<D::Error>("backoff_base_seconds", secs)?;
		}
		if let Some(secs) = raw.backoff_cap_seconds {
			config.retry.backoff_cap = seconds_field::<D::Error>("backoff_cap_seconds", secs)?;
		}
		if let Some(statuses) = raw.retry_on_status {
			config.retry.retry_on_status = statuses;
		}
		if let Some(secs) = raw.token_refresh_margin_seconds {
			if secs < 0 {
				return Err(D::Error::custom(
					"token_refresh_margin_seconds must be non-negative",
				));
			}

			config.token_refresh_margin = Duration::seconds(secs);
		}
		if let Some(user_agent) = raw.user_agent {
			config.user_agent = user_agent;
		}

		Ok(config)
	}
}

#[derive(Deserialize)]
struct RawClientConfig {
	base_url: String,
	#[serde(default)]
	timeout_seconds: Option<f64>,
	#[serde(default)]
	connect_timeout_seconds: Option<f64>,
	#[serde(default)]
	max_transient_retries: Option<u32>,
	#[serde(default)]
	backoff_base_seconds: Option<f64>,
	#[serde(default)]
	backoff_cap_seconds: Option<f64>,
	#[serde(default)]
	retry_on_status: Option<Vec<u16>>,
	#[serde(default)]
	token_refresh_margin_seconds: Option<i64>,
	#[serde(default)]
	user_agent: Option<String>,
}

fn seconds_field<E>(field: &'static str, secs: f64) -> Result<StdDuration, E>
where
	E: DeError,
{
	if !secs.is_finite() || secs < 0.0 {
		return Err(E::custom(format!("{field} must be a non-negative number")));
	}

	Ok(StdDuration::from_secs_f64(secs))
}
