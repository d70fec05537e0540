//! Key cache configuration and its validating builder.

// self
use crate::{_prelude::*, error::ConfigError, policy::TtlPolicy};

/// Validated key cache configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCacheConfig {
	/// Endpoint publishing the key set.
	pub jwks_url: Url,
	/// Maximum age of a cache build before the next lookup rebuilds it.
	pub ttl: Duration,
}
impl KeyCacheConfig {
	/// Default cache TTL (10 minutes).
	pub const DEFAULT_TTL: Duration = Duration::minutes(10);

	/// Starts a builder for the provided endpoint.
	pub fn builder(jwks_url: Url) -> KeyCacheConfigBuilder {
		KeyCacheConfigBuilder::new(jwks_url)
	}

	/// Parses `jwks_url` and starts a builder for it.
	pub fn builder_from_str(jwks_url: &str) -> Result<KeyCacheConfigBuilder, ConfigError> {
		let url = Url::parse(jwks_url).map_err(|source| ConfigError::InvalidEndpoint { source })?;

		Ok(KeyCacheConfigBuilder::new(url))
	}

	/// Returns the TTL policy derived from this configuration.
	pub fn policy(&self) -> TtlPolicy {
		TtlPolicy::new(self.ttl)
	}

	/// Checks the invariants a built configuration must hold.
	pub fn validate(&self, require_https: bool) -> Result<(), ConfigError> {
		if !self.ttl.is_positive() {
			return Err(ConfigError::NonPositiveTtl);
		}
		if require_https && self.jwks_url.scheme() != "https" {
			return Err(ConfigError::InsecureEndpoint { url: self.jwks_url.to_string() });
		}

		Ok(())
	}
}

/// Builder for [`KeyCacheConfig`] values.
#[derive(Debug)]
pub struct KeyCacheConfigBuilder {
	/// Endpoint publishing the key set.
	pub jwks_url: Url,
	/// Cache TTL; defaults to [`KeyCacheConfig::DEFAULT_TTL`].
	pub ttl: Duration,
	/// Whether non-HTTPS endpoints are rejected; defaults to `true`.
	pub require_https: bool,
}
impl KeyCacheConfigBuilder {
	/// Creates a builder seeded with the defaults.
	pub fn new(jwks_url: Url) -> Self {
		Self { jwks_url, ttl: KeyCacheConfig::DEFAULT_TTL, require_https: true }
	}

	/// Overrides the cache TTL.
	pub fn ttl(mut self, ttl: Duration) -> Self {
		self.ttl = ttl;

		self
	}

	/// Allows plain HTTP endpoints when set to `false` (local development and tests).
	pub fn require_https(mut self, require_https: bool) -> Self {
		self.require_https = require_https;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<KeyCacheConfig, ConfigError> {
		let config = KeyCacheConfig { jwks_url: self.jwks_url, ttl: self.ttl };

		config.validate(self.require_https)?;

		Ok(config)
	}
}
