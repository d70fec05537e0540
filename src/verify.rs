//! JWT verification against the signing key cache.
//!
//! [`TokenVerifier`] reads the `kid` from the token header, resolves it through
//! [`KeyCacheCoordinator::get_key`] (which rebuilds a stale cache first), and lets
//! `jsonwebtoken` check the signature and registered claims. Only RSA-family algorithms are
//! accepted because the cache holds RSA keys exclusively.

// crates.io
use jsonwebtoken::{Algorithm, TokenData, Validation};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	error::VerificationError,
	jwks::KeyCacheCoordinator,
	obs::{self, OperationKind},
};

const RSA_FAMILY: [Algorithm; 6] = [
	Algorithm::RS256,
	Algorithm::RS384,
	Algorithm::RS512,
	Algorithm::PS256,
	Algorithm::PS384,
	Algorithm::PS512,
];

/// Per-call verification settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOptions {
	/// Skip the `exp` check (and stop requiring the claim).
	pub ignore_expiration: bool,
	/// Clock skew tolerated for `exp` and `nbf`, in seconds.
	pub leeway: u64,
	/// Accepted `iss` values; `None` skips the issuer check.
	pub issuer: Option<Vec<String>>,
	/// Accepted `aud` values; `None` skips the audience check.
	pub audience: Option<Vec<String>>,
}
impl VerifyOptions {
	/// Default clock skew tolerance (60 seconds).
	pub const DEFAULT_LEEWAY: u64 = 60;

	/// Sets whether the expiry check is skipped.
	pub fn ignore_expiration(mut self, ignore: bool) -> Self {
		self.ignore_expiration = ignore;

		self
	}

	/// Overrides the clock skew tolerance.
	pub fn leeway(mut self, seconds: u64) -> Self {
		self.leeway = seconds;

		self
	}

	/// Requires `iss` to match one of `issuers`.
	pub fn issuer<I, S>(mut self, issuers: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.issuer = Some(issuers.into_iter().map(Into::into).collect());

		self
	}

	/// Requires `aud` to contain one of `audiences`.
	pub fn audience<I, S>(mut self, audiences: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.audience = Some(audiences.into_iter().map(Into::into).collect());

		self
	}

	fn validation(&self, alg: Algorithm) -> Validation {
		let mut validation = Validation::new(alg);

		validation.leeway = self.leeway;

		if self.ignore_expiration {
			validation.validate_exp = false;
			validation.required_spec_claims.remove("exp");
		}
		if let Some(issuer) = &self.issuer {
			validation.set_issuer(issuer.as_slice());
		}

		match &self.audience {
			Some(audience) => validation.set_audience(audience.as_slice()),
			None => validation.validate_aud = false,
		}

		validation
	}
}
impl Default for VerifyOptions {
	fn default() -> Self {
		Self { ignore_expiration: false, leeway: Self::DEFAULT_LEEWAY, issuer: None, audience: None }
	}
}

/// Registered claims plus everything else the token carried.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
	/// Subject.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sub: Option<String>,
	/// Issuer.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub iss: Option<String>,
	/// Audience; a string or an array of strings.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub aud: Option<Value>,
	/// Expiry (seconds since the Unix epoch).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exp: Option<i64>,
	/// Not-before (seconds since the Unix epoch).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub nbf: Option<i64>,
	/// Issued-at (seconds since the Unix epoch).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub iat: Option<i64>,
	/// Token id.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub jti: Option<String>,
	/// Private claims.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
impl Claims {
	/// Returns the expiry as an instant, when present and representable.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.exp.and_then(|exp| OffsetDateTime::from_unix_timestamp(exp).ok())
	}
}

/// Verifies JWTs with keys from a shared [`KeyCacheCoordinator`].
#[derive(Clone, Debug)]
pub struct TokenVerifier {
	keys: Arc<KeyCacheCoordinator>,
}
impl TokenVerifier {
	/// Creates a verifier backed by `keys`.
	pub fn new(keys: Arc<KeyCacheCoordinator>) -> Self {
		Self { keys }
	}

	/// Returns the key cache backing this verifier.
	pub fn keys(&self) -> &Arc<KeyCacheCoordinator> {
		&self.keys
	}

	/// Verifies `token` and returns its claims.
	pub async fn verify(&self, token: &str, options: &VerifyOptions) -> Result<Claims> {
		self.verify_as(token, options).await
	}

	/// Verifies `token` and deserializes its claims into `C`.
	pub async fn verify_as<C>(&self, token: &str, options: &VerifyOptions) -> Result<C>
	where
		C: DeserializeOwned,
	{
		obs::observe(OperationKind::TokenVerify, "verify", async move {
			let header = jsonwebtoken::decode_header(token)
				.map_err(|e| Error::MalformedToken { reason: e.to_string() })?;
			let kid = header
				.kid
				.filter(|kid| !kid.is_empty())
				.ok_or_else(|| Error::MalformedToken { reason: "header has no `kid`".into() })?;

			if !RSA_FAMILY.contains(&header.alg) {
				let alg = alg_name(header.alg);

				return Err(VerificationError::UnsupportedAlgorithm { alg }.into());
			}

			let key = self.keys.get_key(&kid).await?;

			if let Some(key_alg) = key.alg.as_deref().filter(|alg| *alg != alg_name(header.alg)) {
				return Err(VerificationError::AlgorithmMismatch {
					kid,
					key_alg: key_alg.to_owned(),
					token_alg: alg_name(header.alg),
				}
				.into());
			}

			let decoding_key = key
				.decoding_key()
				.map_err(|source| VerificationError::InvalidKey { kid: kid.clone(), source })?;
			let TokenData { claims, .. } =
				jsonwebtoken::decode::<C>(token, &decoding_key, &options.validation(header.alg))
					.map_err(VerificationError::from)?;

			Ok(claims)
		})
		.await
	}
}

fn alg_name(alg: Algorithm) -> String {
	format!("{alg:?}")
}
