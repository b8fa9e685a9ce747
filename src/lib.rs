//! Async client SDK for the GavaConnect government API—per-family auth policies,
//! single-flight bearer token caching, and a retry-aware shared transport.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod cache;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod hooks;
pub mod obs;
pub mod resources;
pub mod retry;
pub mod transport;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::BearerCredentials,
		config::{ClientConfig, RetryPolicy},
		transport::Transport,
	};

	/// Builds a [`ClientConfig`] pointed at a mock server with fast, bounded backoff.
	pub fn test_config(base_url: &str) -> ClientConfig {
		ClientConfig::new(base_url)
			.expect("Failed to parse test base URL.")
			.with_retry(
				RetryPolicy::default()
					.with_backoff_base(StdDuration::from_millis(10))
					.with_backoff_cap(StdDuration::from_millis(50)),
			)
			.with_timeout(StdDuration::from_secs(5))
	}

	/// Builds a [`Transport`] against the provided mock server base URL.
	pub fn test_transport(base_url: &str) -> Transport {
		Transport::new(test_config(base_url)).expect("Failed to build test transport.")
	}

	/// Builds validated bearer credentials pointed at a mock token endpoint.
	pub fn test_bearer_credentials(token_url: &str) -> BearerCredentials {
		let endpoint = Url::parse(token_url).expect("Failed to parse test token endpoint URL.");

		BearerCredentials::new("test-client", "test-secret", endpoint)
			.expect("Test bearer credentials should be valid.")
	}

	/// Fixed instant used as the origin for manual-clock tests.
	pub fn test_epoch() -> OffsetDateTime {
		time::macros::datetime!(2025-01-01 00:00 UTC)
	}
}

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	pub use reqwest::{
		Client as ReqwestClient, Error as ReqwestError, Method, Request, Response, StatusCode,
		header::{AUTHORIZATION, HeaderMap, HeaderValue},
	};
	pub use serde::Deserialize;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
