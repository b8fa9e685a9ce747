// std
use std::time::Instant;
// crates.io
use httpmock::prelude::*;
// self
use gavaconnect::{
	_preludet::*,
	config::{ClientConfig, RetryPolicy},
	error::Error,
	reqwest::Method as HttpMethod,
	retry,
	transport::Transport,
};

fn get_request(transport: &Transport, path: &str) -> Request {
	transport
		.request(HttpMethod::GET, path)
		.expect("Relative path should join.")
		.build()
		.expect("GET request should build.")
}

#[tokio::test]
async fn retry_after_hint_delays_the_resend() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/throttled");
			then.status(429).header("retry-after", "2").body("slow down");
		})
		.await;
	let transport = Transport::new(
		test_config(&server.base_url())
			.with_retry(RetryPolicy::default().with_max_transient_retries(1)),
	)
	.expect("Transport should build.");
	let request = get_request(&transport, "throttled");
	let started = Instant::now();
	let err = transport
		.send(request, None)
		.await
		.expect_err("Exhausted budget should surface a transient failure.");

	// The resend may not be scheduled earlier than the server hint.
	assert!(started.elapsed() >= StdDuration::from_secs(2));
	assert!(matches!(
		err,
		Error::Transient(ref failure)
			if failure.attempts == 2 && failure.last_status == Some(429),
	));

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn transient_budget_bounds_5xx_retries() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/unstable");
			then.status(503).body("upstream down");
		})
		.await;
	let transport = Transport::new(
		test_config(&server.base_url())
			.with_retry(
				RetryPolicy::default()
					.with_max_transient_retries(2)
					.with_backoff_base(StdDuration::from_millis(5))
					.with_backoff_cap(StdDuration::from_millis(20)),
			),
	)
	.expect("Transport should build.");
	let request = get_request(&transport, "unstable");
	let err = transport
		.send(request, None)
		.await
		.expect_err("503 past the budget should surface a transient failure.");

	assert!(matches!(
		err,
		Error::Transient(ref failure)
			if failure.attempts == 3 && failure.last_status == Some(503),
	));

	mock.assert_calls_async(3).await;
}

#[tokio::test]
async fn plain_4xx_responses_pass_through_unmodified() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/missing");
			then.status(404).body("{\"error\":{\"type\":\"not_found\"}}");
		})
		.await;
	let transport = test_transport(&server.base_url());
	let request = get_request(&transport, "missing");
	let response = transport
		.send(request, None)
		.await
		.expect("Non-retryable statuses must come back as plain responses.");

	assert_eq!(response.status(), StatusCode::NOT_FOUND);

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn writes_without_an_idempotency_key_are_not_retried() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/submit");
			then.status(503).body("upstream down");
		})
		.await;
	let transport = test_transport(&server.base_url());
	let request = transport
		.request(HttpMethod::POST, "submit")
		.expect("Relative path should join.")
		.body("{\"value\":1}")
		.build()
		.expect("POST request should build.");
	let response = transport
		.send(request, None)
		.await
		.expect("A non-replayable write should surface its response untouched.");

	assert_eq!(response.status().as_u16(), 503);

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn keyed_writes_share_the_transient_budget() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/submit");
			then.status(503).body("upstream down");
		})
		.await;
	let transport = Transport::new(
		test_config(&server.base_url())
			.with_retry(
				RetryPolicy::default()
					.with_max_transient_retries(1)
					.with_backoff_base(StdDuration::from_millis(5)),
			),
	)
	.expect("Transport should build.");
	let request = transport
		.request(HttpMethod::POST, "submit")
		.expect("Relative path should join.")
		.header(retry::IDEMPOTENCY_KEY, retry::idempotency_key())
		.body("{\"value\":1}")
		.build()
		.expect("POST request should build.");
	let err = transport
		.send(request, None)
		.await
		.expect_err("Keyed writes retry and then exhaust the budget.");

	assert!(matches!(err, Error::Transient(ref failure) if failure.attempts == 2));

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn timeouts_count_against_the_transient_budget() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/sluggish");
			then.status(200).body("late").delay(StdDuration::from_secs(2));
		})
		.await;
	let transport = Transport::new(
		ClientConfig::new(server.base_url())
			.expect("Base URL should parse.")
			.with_timeout(StdDuration::from_millis(300))
			.with_retry(
				RetryPolicy::default()
					.with_max_transient_retries(1)
					.with_backoff_base(StdDuration::from_millis(5)),
			),
	)
	.expect("Transport should build.");
	let request = get_request(&transport, "sluggish");
	let err = transport
		.send(request, None)
		.await
		.expect_err("Per-attempt timeouts should exhaust the transient budget.");

	assert!(matches!(
		err,
		Error::Transient(ref failure)
			if failure.attempts == 2 && failure.last_status.is_none() && failure.source.is_some(),
	));

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn success_responses_return_without_retries() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/healthy");
			then.status(200)
				.header("x-request-id", "req-42")
				.body("{\"ok\":true}");
		})
		.await;
	let transport = test_transport(&server.base_url());
	let request = get_request(&transport, "healthy");
	let response =
		transport.send(request, None).await.expect("2xx responses should pass through.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(
		response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
		Some("req-42"),
	);

	mock.assert_calls_async(1).await;
}
