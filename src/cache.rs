//! Concurrency-safe bearer token cache with single-flight refresh.
//!
//! [`TokenCache::get_token`] serves the cached token while it stays outside the
//! early-refresh margin and otherwise performs (or waits on) a refresh. The
//! async mutex around the cache slot is held across the endpoint call, so
//! concurrent callers collapse onto one outbound exchange: the winner fetches,
//! everyone else blocks on the gate and then reads the winner's result. A
//! caller cancelled mid-fetch simply releases the gate and the next waiter
//! takes over the refresh, so a stampede can never form.

// self
use crate::{
	_prelude::*,
	auth::{BearerCredentials, ClientAuthMethod, Token, TokenEndpointStyle},
	clock::{Clock, SystemClock},
	error::TokenAcquisitionError,
	obs::{self, CallKind, CallOutcome, CallSpan},
};

const DEFAULT_REFRESH_MARGIN: Duration = Duration::seconds(60);
const BODY_PREVIEW_LIMIT: usize = 256;

/// Wire contract of the token endpoint response; unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
	access_token: String,
	expires_in: i64,
}

/// Holder of the current bearer token for one resource family.
///
/// Owned by exactly one [`BearerAuthPolicy`](crate::auth::BearerAuthPolicy);
/// never shared across families. State lives only in process memory.
pub struct TokenCache {
	credentials: BearerCredentials,
	http: ReqwestClient,
	clock: Arc<dyn Clock>,
	refresh_margin: Duration,
	serve_stale: bool,
	slot: AsyncMutex<Option<Token>>,
}
impl TokenCache {
	/// Creates a cache around validated credentials and a shared HTTP client.
	pub fn new(credentials: BearerCredentials, http: ReqwestClient) -> Self {
		Self {
			credentials,
			http,
			clock: Arc::new(SystemClock),
			refresh_margin: DEFAULT_REFRESH_MARGIN,
			serve_stale: false,
			slot: AsyncMutex::new(None),
		}
	}

	/// Overrides the time source (tests pin this to a [`ManualClock`](crate::clock::ManualClock)).
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Overrides the early-refresh safety margin (defaults to 60 seconds).
	pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
		self.refresh_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Serves the last-known-good token when a refresh fails, as long as that
	/// token has not hard-expired. Defaults to off: refresh failures propagate.
	pub fn with_serve_stale(mut self, serve_stale: bool) -> Self {
		self.serve_stale = serve_stale;

		self
	}

	/// Returns a currently valid token, refreshing when missing, expired, or
	/// inside the early-refresh margin.
	///
	/// Concurrent callers against a cold or stale cache trigger exactly one
	/// endpoint exchange and all observe its result.
	pub async fn get_token(&self) -> Result<Token, TokenAcquisitionError> {
		let mut slot = self.slot.lock().await;
		let now = self.clock.now();

		if let Some(current) =
			slot.as_ref().filter(|token| token.is_fresh_at(now, self.refresh_margin))
		{
			return Ok(current.clone());
		}

		match self.refresh().await {
			Ok(token) => {
				*slot = Some(token.clone());

				Ok(token)
			},
			Err(err) => {
				if self.serve_stale
					&& let Some(stale) =
						slot.as_ref().filter(|token| !token.is_expired_at(self.clock.now()))
				{
					return Ok(stale.clone());
				}

				Err(err)
			},
		}
	}

	/// Forces the next [`get_token`](TokenCache::get_token) call to refresh
	/// regardless of the locally computed expiry.
	pub async fn invalidate(&self) {
		self.slot.lock().await.take();
	}

	async fn refresh(&self) -> Result<Token, TokenAcquisitionError> {
		let span = CallSpan::new(CallKind::TokenRefresh, "refresh");

		obs::record_call_outcome(CallKind::TokenRefresh, CallOutcome::Attempt);

		let result = span.instrument(self.fetch()).await;

		match &result {
			Ok(_) => obs::record_call_outcome(CallKind::TokenRefresh, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(CallKind::TokenRefresh, CallOutcome::Failure),
		}

		result
	}

	async fn fetch(&self) -> Result<Token, TokenAcquisitionError> {
		let builder = match self.credentials.endpoint_style() {
			TokenEndpointStyle::FormPost => {
				let mut form: Vec<(&str, &str)> = vec![("grant_type", "client_credentials")];

				if let Some(scope) = self.credentials.scope() {
					form.push(("scope", scope));
				}

				match self.credentials.auth_method() {
					ClientAuthMethod::SecretBasic => self
						.http
						.post(self.credentials.token_endpoint().clone())
						.header(AUTHORIZATION, self.credentials.authorization().clone())
						.form(&form),
					ClientAuthMethod::SecretPost => {
						form.push(("client_id", self.credentials.client_id()));
						form.push(("client_secret", self.credentials.client_secret().expose()));

						self.http.post(self.credentials.token_endpoint().clone()).form(&form)
					},
				}
			},
			TokenEndpointStyle::LegacyGet => self
				.http
				.get(self.credentials.token_endpoint().clone())
				.header(AUTHORIZATION, self.credentials.authorization().clone()),
		};
		let response = builder.send().await?;
		let status = response.status();

		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();

			return Err(TokenAcquisitionError::Endpoint {
				status: status.as_u16(),
				body_preview: preview(body),
			});
		}

		let bytes = response.bytes().await?;
		let mut deserializer = serde_json::Deserializer::from_slice(&bytes);
		let payload: TokenEndpointResponse = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| TokenAcquisitionError::MalformedResponse { source })?;

		if payload.expires_in <= 0 {
			return Err(TokenAcquisitionError::NonPositiveExpiresIn);
		}

		let obtained_at = self.clock.now();
		let expires_at = obtained_at + Duration::seconds(payload.expires_in);

		Ok(Token::new(payload.access_token, obtained_at, expires_at))
	}
}
impl Debug for TokenCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCache")
			.field("client_id", &self.credentials.client_id())
			.field("token_endpoint", &self.credentials.token_endpoint().as_str())
			.field("refresh_margin", &self.refresh_margin)
			.field("serve_stale", &self.serve_stale)
			.finish()
	}
}

fn preview(body: String) -> Option<String> {
	let trimmed = body.trim();

	if trimmed.is_empty() {
		return None;
	}
	if trimmed.chars().count() <= BODY_PREVIEW_LIMIT {
		return Some(trimmed.to_owned());
	}

	let mut buf: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();

	buf.push('…');

	Some(buf)
}
