//! Wire model for published key descriptors and the usability filter applied to them.

// crates.io
use base64::{
	Engine,
	engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
// self
use crate::{_prelude::*, error::FetchError};

/// Key descriptor as published by a JWKS endpoint.
///
/// Only the members needed to select and build RSA verification keys are modelled; unknown
/// members are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkDescriptor {
	/// Key type (`RSA`, `EC`, ...).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub kty: Option<String>,
	/// Key id referenced by token headers.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub kid: Option<String>,
	/// Algorithm the key is bound to, if any.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub alg: Option<String>,
	/// Intended use (`sig` or `enc`).
	#[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
	pub key_use: Option<String>,
	/// X.509 certificate chain; the first entry carries the key.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub x5c: Vec<String>,
	/// Base64url RSA modulus.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub n: Option<String>,
	/// Base64url RSA public exponent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub e: Option<String>,
}

/// Usable public-key representation extracted from a descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum UsableMaterial {
	/// Modulus and exponent, both decodable base64url.
	RsaComponents { n: String, e: String },
	/// DER certificate decoded from the first `x5c` entry.
	Certificate { der: Vec<u8> },
}

/// Why a descriptor was left out of the key cache.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum KeyRejection {
	/// `use` is absent or not `sig`.
	#[error("key is not published for signature use")]
	NotForSigning,
	/// `kty` is absent or not `RSA`.
	#[error("key type is not RSA")]
	UnsupportedKeyType,
	/// `kid` is absent or empty.
	#[error("key has no id")]
	MissingKeyId,
	/// Neither `x5c` nor both `n` and `e` are present.
	#[error("key carries no usable public key material")]
	MissingMaterial,
	/// Key material is present but not valid base64.
	#[error("key material is not valid base64")]
	InvalidEncoding,
	/// The first `x5c` entry is not a parseable X.509 certificate.
	#[error("certificate chain entry is not a valid X.509 certificate")]
	InvalidCertificate,
}

impl JwkDescriptor {
	/// Checks whether the descriptor can verify RS* signatures.
	pub fn check_usable(&self) -> Result<(), KeyRejection> {
		self.usable_material().map(|_| ())
	}

	/// Returns the non-empty key id, if any.
	pub fn key_id(&self) -> Option<&str> {
		self.kid.as_deref().filter(|kid| !kid.is_empty())
	}

	/// Picks the key material to cache; RSA components win over the certificate chain.
	pub(crate) fn usable_material(&self) -> Result<UsableMaterial, KeyRejection> {
		if self.key_use.as_deref() != Some("sig") {
			return Err(KeyRejection::NotForSigning);
		}
		if self.kty.as_deref() != Some("RSA") {
			return Err(KeyRejection::UnsupportedKeyType);
		}
		if self.key_id().is_none() {
			return Err(KeyRejection::MissingKeyId);
		}

		let components = self
			.n
			.as_deref()
			.filter(|n| !n.is_empty())
			.zip(self.e.as_deref().filter(|e| !e.is_empty()));

		if let Some((n, e)) = components {
			if URL_SAFE_NO_PAD.decode(n).is_err() || URL_SAFE_NO_PAD.decode(e).is_err() {
				return Err(KeyRejection::InvalidEncoding);
			}

			return Ok(UsableMaterial::RsaComponents { n: n.to_owned(), e: e.to_owned() });
		}

		match self.x5c.first().filter(|cert| !cert.is_empty()) {
			Some(cert) => STANDARD
				.decode(cert)
				.map(|der| UsableMaterial::Certificate { der })
				.map_err(|_| KeyRejection::InvalidEncoding),
			None => Err(KeyRejection::MissingMaterial),
		}
	}
}

#[derive(Deserialize)]
struct KeySetDocument {
	keys: Vec<JwkDescriptor>,
}

/// Parses a key set body.
///
/// Accepts either a bare JSON array of descriptors or a standard `{ "keys": [...] }` document.
/// Parse failures report the JSON path at which the body diverged from the expected shape.
pub fn parse_key_set(body: &[u8]) -> Result<Vec<JwkDescriptor>, FetchError> {
	let bare = body.iter().find(|byte| !byte.is_ascii_whitespace()) == Some(&b'[');
	let mut deserializer = serde_json::Deserializer::from_slice(body);
	let parsed = if bare {
		serde_path_to_error::deserialize::<_, Vec<JwkDescriptor>>(&mut deserializer)
	} else {
		serde_path_to_error::deserialize::<_, KeySetDocument>(&mut deserializer)
			.map(|document| document.keys)
	};

	parsed.map_err(|err| FetchError::Parse {
		path: err.path().to_string(),
		message: err.inner().to_string(),
	})
}
