//! Transport seam for fetching remote key sets.
//!
//! [`KeySetFetcher`] is the key cache's only dependency on an HTTP stack. The default
//! [`ReqwestKeySetFetcher`] issues a plain `GET`, maps non-2xx statuses to
//! [`FetchError::Status`], and parses the body with [`parse_key_set`]. Custom fetchers (other
//! HTTP clients, static fixtures, or file-backed sets) implement the trait directly.

// std
#[cfg(feature = "reqwest")] use std::{ops::Deref, time::Duration as StdDuration};
// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::{ACCEPT, HeaderValue};
// self
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, jwks::parse_key_set};
use crate::{_prelude::*, error::FetchError, jwks::JwkDescriptor};

/// Boxed future returned by [`KeySetFetcher::fetch`].
pub type FetchFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Vec<JwkDescriptor>, FetchError>> + 'a + Send>>;

/// Retrieves the complete list of key descriptors published at an endpoint.
///
/// Implementations must be `Send + Sync` so one fetcher can back a key cache shared across
/// tasks. Each call returns the full set; filtering happens in the cache.
pub trait KeySetFetcher
where
	Self: Send + Sync,
{
	/// Fetches every descriptor published at `url`.
	fn fetch<'a>(&'a self, url: &'a Url) -> FetchFuture<'a>;
}

/// Thin wrapper around [`ReqwestClient`] so key set requests share one connection pool.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestKeySetFetcher(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestKeySetFetcher {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a dedicated client whose requests give up after `timeout`.
	pub fn with_timeout(timeout: StdDuration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().timeout(timeout).build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl KeySetFetcher for ReqwestKeySetFetcher {
	fn fetch<'a>(&'a self, url: &'a Url) -> FetchFuture<'a> {
		Box::pin(async move {
			let response = self
				.0
				.get(url.clone())
				.header(ACCEPT, HeaderValue::from_static("application/json"))
				.send()
				.await
				.map_err(FetchError::transport)?;
			let status = response.status();

			if !status.is_success() {
				return Err(FetchError::Status { status: status.as_u16() });
			}

			let body = response.bytes().await.map_err(FetchError::transport)?;

			parse_key_set(&body)
		})
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestKeySetFetcher {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestKeySetFetcher {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
