//! Shared HTTP transport: policy application, single 401 refresh-and-retry, and
//! bounded transient retries with backoff.
//!
//! Per logical call the transport (1) asks the policy to authorize the attempt,
//! (2) sends it, (3) on 401 consults the policy once and resends with fresh
//! authorization, (4) on 429/5xx/timeout retries under the transient budget,
//! preferring a `Retry-After` hint over computed backoff. The 401 counter and
//! the transient counter are independent, so a worst-case call makes one
//! auth-driven resend plus up to `max_transient_retries` transient resends.

// std
use std::time::Instant;
// crates.io
use reqwest::RequestBuilder;
// self
use crate::{
	_prelude::*,
	auth::AuthPolicy,
	config::ClientConfig,
	error::{AuthenticationError, ConfigError, TransientFailureError},
	hooks::{RequestInfo, ResponseInfo, RetryInfo, RetryReason, TransportHook, UnauthorizedInfo},
	obs::{self, CallKind, CallOutcome, CallSpan},
	retry::{self, RetryState},
};

/// Shared HTTP transport bound to one base URL and retry configuration.
///
/// One transport instance is shared by every resource client of an SDK facade;
/// all per-call state lives on the stack of [`send`](Transport::send).
pub struct Transport {
	client: ReqwestClient,
	config: ClientConfig,
	hooks: Vec<Arc<dyn TransportHook>>,
}
impl Transport {
	/// Builds a transport and its HTTP client from the provided configuration.
	pub fn new(config: ClientConfig) -> Result<Self> {
		let mut default_headers = HeaderMap::new();

		default_headers.insert(
			"x-client-version",
			HeaderValue::try_from(config.user_agent.as_str())
				.map_err(ConfigError::http_client_build)?,
		);

		let client = ReqwestClient::builder()
			.connect_timeout(config.connect_timeout)
			.timeout(config.timeout)
			.user_agent(config.user_agent.clone())
			.default_headers(default_headers)
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self::with_client(config, client))
	}

	/// Wraps an existing HTTP client; the caller keeps timeout responsibility.
	pub fn with_client(config: ClientConfig, client: ReqwestClient) -> Self {
		Self { client, config, hooks: Vec::new() }
	}

	/// Registers an observer hook invoked at request milestones.
	pub fn with_hook(mut self, hook: Arc<dyn TransportHook>) -> Self {
		self.hooks.push(hook);

		self
	}

	/// Returns the underlying HTTP client (shared with token caches).
	pub fn http(&self) -> &ReqwestClient {
		&self.client
	}

	/// Returns the active configuration.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Joins a relative endpoint path to the configured base URL.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		self.config.base_url.join(path).map_err(|source| ConfigError::InvalidPath { source })
	}

	/// Starts a request builder for a relative endpoint path.
	pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ConfigError> {
		Ok(self.client.request(method, self.endpoint(path)?))
	}

	/// Sends a request through the retry state machine.
	///
	/// 2xx and non-retryable statuses come back as plain responses (the
	/// transport never interprets application error bodies); terminal auth and
	/// budget-exhaustion failures surface as typed errors.
	pub async fn send(
		&self,
		request: Request,
		policy: Option<&dyn AuthPolicy>,
	) -> Result<Response> {
		let span = CallSpan::new(CallKind::Request, "send");

		obs::record_call_outcome(CallKind::Request, CallOutcome::Attempt);

		let result = span.instrument(self.dispatch(request, policy)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(CallKind::Request, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(CallKind::Request, CallOutcome::Failure),
		}

		result
	}

	async fn dispatch(
		&self,
		request: Request,
		policy: Option<&dyn AuthPolicy>,
	) -> Result<Response> {
		let transient_allowed = retry::can_retry(&request);
		let mut state = RetryState::new();
		let mut auth_retried = false;
		let mut current = request;

		loop {
			// Cloned before authorization so a resend never reuses a consumed
			// body or carries a stale Authorization header.
			let replay = current.try_clone();
			let method = current.method().clone();
			let url = current.url().clone();

			if let Some(policy) = policy {
				policy.authorize(&mut current).await?;
			}

			state.record_attempt();
			self.emit(|hook| {
				hook.on_request(&RequestInfo {
					method: method.clone(),
					url: url.clone(),
					attempt: state.attempts(),
					scheme: policy.map(|p| p.scheme()),
				})
			});

			let started = Instant::now();
			let response = match self.client.execute(current).await {
				Ok(response) => response,
				Err(source) => {
					// Timeouts and connection failures share the transient budget.
					match replay.filter(|_| transient_allowed) {
						Some(request) if state.can_retry_transient(&self.config.retry) => {
							let delay = state.next_transient_delay(&self.config.retry, None);

							self.emit(|hook| {
								hook.on_retry(&RetryInfo {
									attempt: state.attempts(),
									delay,
									reason: RetryReason::Network,
									server_hinted: false,
								})
							});
							obs::record_call_outcome(CallKind::Request, CallOutcome::Retry);
							tokio::time::sleep(delay).await;

							current = request;

							continue;
						},
						_ =>
							return Err(TransientFailureError {
								attempts: state.attempts(),
								last_status: None,
								source: Some(Box::new(source)),
							}
							.into()),
					}
				},
			};
			let status = response.status();

			self.emit(|hook| {
				hook.on_response(&ResponseInfo {
					method: method.clone(),
					url: url.clone(),
					status,
					attempt: state.attempts(),
					elapsed: started.elapsed(),
					request_id: request_id(&response),
				})
			});

			if status == StatusCode::UNAUTHORIZED {
				let Some(policy) = policy else {
					// Nothing to refresh; hand the 401 back untouched.
					return Ok(response);
				};

				if !auth_retried && let Some(request) = replay {
					let refreshed = policy.on_unauthorized().await;

					self.emit(|hook| {
						hook.on_unauthorized(&UnauthorizedInfo {
							attempt: state.attempts(),
							will_retry: refreshed,
						})
					});

					if refreshed {
						auth_retried = true;
						current = request;

						continue;
					}

					return Err(AuthenticationError {
						attempts: state.attempts(),
						refreshed: false,
					}
					.into());
				}

				self.emit(|hook| {
					hook.on_unauthorized(&UnauthorizedInfo {
						attempt: state.attempts(),
						will_retry: false,
					})
				});

				return Err(AuthenticationError {
					attempts: state.attempts(),
					refreshed: auth_retried,
				}
				.into());
			}

			let code = status.as_u16();

			if self.config.retry.retries_status(code) {
				match replay.filter(|_| transient_allowed) {
					Some(request) if state.can_retry_transient(&self.config.retry) => {
						let hint = retry::parse_retry_after(response.headers());
						let delay = state.next_transient_delay(&self.config.retry, hint);

						self.emit(|hook| {
							hook.on_retry(&RetryInfo {
								attempt: state.attempts(),
								delay,
								reason: RetryReason::Status(code),
								server_hinted: hint.is_some(),
							})
						});
						obs::record_call_outcome(CallKind::Request, CallOutcome::Retry);
						tokio::time::sleep(delay).await;

						current = request;

						continue;
					},
					Some(_) =>
						return Err(TransientFailureError {
							attempts: state.attempts(),
							last_status: Some(code),
							source: None,
						}
						.into()),
					// The request was never retry-eligible; hand the response
					// back untouched.
					None => return Ok(response),
				}
			}

			return Ok(response);
		}
	}

	fn emit(&self, f: impl Fn(&dyn TransportHook)) {
		for hook in &self.hooks {
			f(hook.as_ref());
		}
	}
}
impl Debug for Transport {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Transport")
			.field("base_url", &self.config.base_url.as_str())
			.field("retry", &self.config.retry)
			.field("hooks", &self.hooks.len())
			.finish()
	}
}

fn request_id(response: &Response) -> Option<String> {
	response.headers().get("x-request-id").and_then(|v| v.to_str().ok()).map(str::to_owned)
}
