//! Shared fixtures for the integration tests.

#![allow(dead_code)]

pub mod keys;

// std
use std::sync::Arc;
// crates.io
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};
use time::{Duration, OffsetDateTime};
// self
use token_keeper::{
	auth::{MemoryTokenSource, SourceFuture, TokenSecret, TokenSource},
	jwks::KeyCacheConfig,
	url::Url,
};

/// Token source whose silent refresh takes `delay` before delegating to a memory source.
pub struct SlowSource {
	pub inner: Arc<MemoryTokenSource>,
	pub delay: std::time::Duration,
}
impl TokenSource for SlowSource {
	fn is_authenticated(&self) -> bool {
		self.inner.is_authenticated()
	}

	fn access_token(&self) -> TokenSecret {
		self.inner.access_token()
	}

	fn expires_at(&self) -> OffsetDateTime {
		self.inner.expires_at()
	}

	fn silent_refresh(&self) -> SourceFuture<'_, ()> {
		Box::pin(async move {
			tokio::time::sleep(self.delay).await;

			self.inner.silent_refresh().await
		})
	}
}

/// Builds a signing JWK carrying RSA components.
pub fn component_jwk(kid: &str, n: &str) -> Value {
	json!({ "kty": "RSA", "use": "sig", "alg": "RS256", "kid": kid, "n": n, "e": keys::RSA_E })
}

/// Builds a signing JWK that only carries an X.509 certificate chain.
pub fn certificate_jwk(kid: &str, x5c: &str) -> Value {
	json!({ "kty": "RSA", "use": "sig", "alg": "RS256", "kid": kid, "x5c": [x5c] })
}

/// Wraps descriptors in a standard key set document.
pub fn key_set(keys: impl IntoIterator<Item = Value>) -> Value {
	json!({ "keys": keys.into_iter().collect::<Vec<_>>() })
}

/// Signs `claims` with RS256 under `kid`.
pub fn sign(kid: &str, private_key: &str, claims: &Value) -> String {
	let mut header = Header::new(Algorithm::RS256);

	header.kid = Some(kid.to_owned());

	let key = EncodingKey::from_rsa_pem(private_key.as_bytes())
		.expect("Fixture private key should parse.");

	jsonwebtoken::encode(&header, claims, &key).expect("Fixture token should encode.")
}

/// Standard claims expiring `lifetime` from now.
pub fn claims(subject: &str, lifetime: Duration) -> Value {
	let now = OffsetDateTime::now_utc();

	json!({
		"sub": subject,
		"iss": "https://idp.example.com",
		"aud": "api",
		"iat": now.unix_timestamp(),
		"exp": (now + lifetime).unix_timestamp(),
	})
}

/// Cache configuration pointing at a plain HTTP mock endpoint.
pub fn cache_config(url: &str, ttl: Duration) -> KeyCacheConfig {
	KeyCacheConfig::builder(Url::parse(url).expect("Mock key set URL should parse."))
		.ttl(ttl)
		.require_https(false)
		.build()
		.expect("Mock cache configuration should be valid.")
}
