// crates.io
use httpmock::prelude::*;
// self
use gavaconnect::{
	_preludet::*,
	auth::{ClientAuthMethod, TokenEndpointStyle},
	cache::TokenCache,
	clock::ManualClock,
	error::TokenAcquisitionError,
};

const BASIC_TEST_HEADER: &str = "Basic dGVzdC1jbGllbnQ6dGVzdC1zZWNyZXQ=";

fn start_clock() -> Arc<ManualClock> {
	Arc::new(ManualClock::new(test_epoch()))
}

#[tokio::test]
async fn concurrent_cold_calls_collapse_into_one_fetch() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").header("authorization", BASIC_TEST_HEADER);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\",\"token_type\":\"Bearer\",\"expires_in\":3600}")
				.delay(StdDuration::from_millis(100));
		})
		.await;
	let cache = Arc::new(TokenCache::new(
		test_bearer_credentials(&server.url("/token")),
		ReqwestClient::default(),
	));
	let handles: Vec<_> = (0..8)
		.map(|_| {
			let cache = cache.clone();

			tokio::spawn(async move { cache.get_token().await })
		})
		.collect();

	for handle in handles {
		let token = handle
			.await
			.expect("Concurrent task should not panic.")
			.expect("Every concurrent caller should resolve to the winning fetch.");

		assert_eq!(token.access_token.expose(), "T1");
	}

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn cached_token_is_reused_until_expiry_and_refetched_after() {
	let server = MockServer::start_async().await;
	let clock = start_clock();
	let mut first = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\",\"expires_in\":60}");
		})
		.await;
	let cache = TokenCache::new(
		test_bearer_credentials(&server.url("/token")),
		ReqwestClient::default(),
	)
	.with_clock(clock.clone())
	.with_refresh_margin(Duration::ZERO);
	let token = cache.get_token().await.expect("Cold cache should fetch T1.");

	assert_eq!(token.access_token.expose(), "T1");

	clock.advance(Duration::seconds(59));

	let token = cache.get_token().await.expect("Cached token should be served within expiry.");

	assert_eq!(token.access_token.expose(), "T1");

	first.assert_calls_async(1).await;
	first.delete_async().await;

	let second = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T2\",\"expires_in\":60}");
		})
		.await;

	clock.advance(Duration::seconds(2));

	let token = cache.get_token().await.expect("Expired cache should fetch T2.");

	assert_eq!(token.access_token.expose(), "T2");

	second.assert_calls_async(1).await;
}

#[tokio::test]
async fn tokens_inside_the_margin_are_refreshed_early() {
	let server = MockServer::start_async().await;
	let clock = start_clock();
	let mut first = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\",\"expires_in\":60}");
		})
		.await;
	let cache = TokenCache::new(
		test_bearer_credentials(&server.url("/token")),
		ReqwestClient::default(),
	)
	.with_clock(clock.clone())
	.with_refresh_margin(Duration::seconds(10));

	cache.get_token().await.expect("Cold cache should fetch T1.");

	// Still outside the margin: expiry minus margin is at t+50.
	clock.advance(Duration::seconds(49));
	cache.get_token().await.expect("Token outside the margin should be served as-is.");

	first.assert_calls_async(1).await;
	first.delete_async().await;

	let second = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T2\",\"expires_in\":60}");
		})
		.await;

	// Crosses into the margin; the stale-to-be token must not be returned.
	clock.advance(Duration::seconds(2));

	let token = cache.get_token().await.expect("Margin crossing should trigger a refresh.");

	assert_eq!(token.access_token.expose(), "T2");

	second.assert_calls_async(1).await;
}

#[tokio::test]
async fn invalidate_forces_the_next_call_to_refetch() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\",\"expires_in\":3600}");
		})
		.await;
	let cache = TokenCache::new(
		test_bearer_credentials(&server.url("/token")),
		ReqwestClient::default(),
	);

	cache.get_token().await.expect("Cold cache should fetch.");
	cache.invalidate().await;
	cache.get_token().await.expect("Invalidated cache should fetch again.");

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn refresh_failures_surface_as_acquisition_errors() {
	let server = MockServer::start_async().await;
	let _endpoint = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(503).body("upstream unavailable");
		})
		.await;
	let cache = TokenCache::new(
		test_bearer_credentials(&server.url("/token")),
		ReqwestClient::default(),
	);
	let err = cache.get_token().await.expect_err("Endpoint failure should propagate.");

	assert!(matches!(
		err,
		TokenAcquisitionError::Endpoint { status: 503, body_preview: Some(_) },
	));
}

#[tokio::test]
async fn malformed_token_bodies_are_rejected() {
	let server = MockServer::start_async().await;
	let _missing_field = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"token_type\":\"Bearer\",\"expires_in\":3600}");
		})
		.await;
	let cache = TokenCache::new(
		test_bearer_credentials(&server.url("/token")),
		ReqwestClient::default(),
	);
	let err = cache.get_token().await.expect_err("Missing access_token should be rejected.");

	assert!(matches!(err, TokenAcquisitionError::MalformedResponse { .. }));
}

#[tokio::test]
async fn non_positive_expiry_is_rejected() {
	let server = MockServer::start_async().await;
	let _endpoint = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\",\"expires_in\":0}");
		})
		.await;
	let cache = TokenCache::new(
		test_bearer_credentials(&server.url("/token")),
		ReqwestClient::default(),
	);
	let err = cache.get_token().await.expect_err("Zero expiry should be rejected.");

	assert!(matches!(err, TokenAcquisitionError::NonPositiveExpiresIn));
}

#[tokio::test]
async fn stale_serving_is_opt_in_and_bounded_by_hard_expiry() {
	let server = MockServer::start_async().await;
	let clock = start_clock();
	let mut seed = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\",\"expires_in\":60}");
		})
		.await;
	let credentials = test_bearer_credentials(&server.url("/token"));
	let strict = TokenCache::new(credentials.clone(), ReqwestClient::default())
		.with_clock(clock.clone())
		.with_refresh_margin(Duration::seconds(10));
	let lenient = TokenCache::new(credentials, ReqwestClient::default())
		.with_clock(clock.clone())
		.with_refresh_margin(Duration::seconds(10))
		.with_serve_stale(true);

	strict.get_token().await.expect("Strict cache should warm up.");
	lenient.get_token().await.expect("Lenient cache should warm up.");

	seed.assert_calls_async(2).await;
	seed.delete_async().await;

	let _broken = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(500).body("boom");
		})
		.await;

	// Inside the margin but before hard expiry: only the lenient cache keeps serving.
	clock.advance(Duration::seconds(55));

	strict
		.get_token()
		.await
		.expect_err("Default hard-fail cache must propagate the refresh failure.");

	let stale = lenient
		.get_token()
		.await
		.expect("Stale-serving cache should fall back to the last-known-good token.");

	assert_eq!(stale.access_token.expose(), "T1");

	// Past hard expiry nothing may be served.
	clock.advance(Duration::seconds(10));

	lenient
		.get_token()
		.await
		.expect_err("A hard-expired token must never be served, stale mode or not.");
}

#[tokio::test]
async fn secret_post_sends_credentials_in_the_form_body() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\",\"expires_in\":3600}");
		})
		.await;
	let credentials = test_bearer_credentials(&server.url("/token"))
		.with_auth_method(ClientAuthMethod::SecretPost)
		.with_scope("checkers.read");
	let cache = TokenCache::new(credentials, ReqwestClient::default());

	cache.get_token().await.expect("Secret-post exchange should succeed.");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn legacy_get_style_uses_a_basic_authorized_get() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/token").header("authorization", BASIC_TEST_HEADER);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\",\"expires_in\":3600}");
		})
		.await;
	let credentials = test_bearer_credentials(&server.url("/token"))
		.with_endpoint_style(TokenEndpointStyle::LegacyGet);
	let cache = TokenCache::new(credentials, ReqwestClient::default());
	let token = cache.get_token().await.expect("Legacy GET exchange should succeed.");

	assert_eq!(token.access_token.expose(), "T1");

	mock.assert_calls_async(1).await;
}
