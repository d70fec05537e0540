//! Verification keys built from usable descriptors.

// crates.io
use base64::{
	Engine,
	engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use jsonwebtoken::DecodingKey;
use rsa::{
	BigUint, RsaPublicKey,
	pkcs8::{EncodePublicKey, LineEnding},
};
use sha2::{Digest, Sha256};
use x509_parser::{certificate::X509Certificate, prelude::FromDer};
// self
use crate::{
	_prelude::*,
	jwks::descriptor::{JwkDescriptor, KeyRejection, UsableMaterial},
};

/// Public key material retained for a cached signing key.
#[derive(Clone, PartialEq, Eq)]
pub enum KeyMaterial {
	/// RSA modulus and exponent, base64url encoded.
	RsaComponents {
		/// Modulus.
		n: String,
		/// Public exponent.
		e: String,
	},
	/// Certificate published in `x5c`.
	Certificate {
		/// PEM rendering of the certificate (`CERTIFICATE` block).
		pem: String,
		/// PEM rendering of the certificate's subject public key (`PUBLIC KEY` block).
		public_key_pem: String,
	},
}
impl Debug for KeyMaterial {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::RsaComponents { .. } => f.write_str("RsaComponents(..)"),
			Self::Certificate { .. } => f.write_str("Certificate(..)"),
		}
	}
}

/// Signing key held by the key cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigningKey {
	/// Key id referenced by token headers.
	pub kid: String,
	/// Algorithm the key is bound to, if the descriptor named one.
	pub alg: Option<String>,
	/// Public key material.
	pub material: KeyMaterial,
}
impl SigningKey {
	/// Returns the PEM rendering of the key's certificate, when it was published with one.
	pub fn pem(&self) -> Option<&str> {
		match &self.material {
			KeyMaterial::Certificate { pem, .. } => Some(pem.as_str()),
			KeyMaterial::RsaComponents { .. } => None,
		}
	}

	/// Returns the public key as an SPKI `PUBLIC KEY` PEM block.
	///
	/// `None` when the RSA components do not decode into a valid public key.
	pub fn public_key_pem(&self) -> Option<String> {
		match &self.material {
			KeyMaterial::RsaComponents { n, e } => {
				let n = BigUint::from_bytes_be(&URL_SAFE_NO_PAD.decode(n).ok()?);
				let e = BigUint::from_bytes_be(&URL_SAFE_NO_PAD.decode(e).ok()?);

				RsaPublicKey::new(n, e).ok()?.to_public_key_pem(LineEnding::LF).ok()
			},
			KeyMaterial::Certificate { public_key_pem, .. } => Some(public_key_pem.clone()),
		}
	}

	/// Returns a stable SHA-256 fingerprint (lowercase hex) of the key material.
	pub fn fingerprint(&self) -> String {
		let mut hasher = Sha256::new();

		match &self.material {
			KeyMaterial::RsaComponents { n, e } => {
				hasher.update(n.as_bytes());
				hasher.update(b".");
				hasher.update(e.as_bytes());
			},
			KeyMaterial::Certificate { public_key_pem, .. } =>
				hasher.update(public_key_pem.as_bytes()),
		}

		hasher.finalize().iter().map(|byte| format!("{byte:02x}")).collect()
	}

	/// Builds the `jsonwebtoken` verification key.
	pub fn decoding_key(&self) -> Result<DecodingKey, jsonwebtoken::errors::Error> {
		match &self.material {
			KeyMaterial::RsaComponents { n, e } => DecodingKey::from_rsa_components(n, e),
			KeyMaterial::Certificate { public_key_pem, .. } =>
				DecodingKey::from_rsa_pem(public_key_pem.as_bytes()),
		}
	}
}
impl TryFrom<&JwkDescriptor> for SigningKey {
	type Error = KeyRejection;

	fn try_from(descriptor: &JwkDescriptor) -> Result<Self, Self::Error> {
		let material = match descriptor.usable_material()? {
			UsableMaterial::RsaComponents { n, e } => KeyMaterial::RsaComponents { n, e },
			UsableMaterial::Certificate { der } => {
				let (_, certificate) =
					X509Certificate::from_der(&der).map_err(|_| KeyRejection::InvalidCertificate)?;

				KeyMaterial::Certificate {
					public_key_pem: pem_block("PUBLIC KEY", certificate.public_key().raw),
					pem: pem_block("CERTIFICATE", &der),
				}
			},
		};
		let kid = descriptor.key_id().ok_or(KeyRejection::MissingKeyId)?.to_owned();

		Ok(Self { kid, alg: descriptor.alg.clone(), material })
	}
}

fn pem_block(label: &str, der: &[u8]) -> String {
	let encoded = STANDARD.encode(der);
	let mut pem = format!("-----BEGIN {label}-----\n");

	// Base64 output is ASCII, so byte chunks are valid UTF-8.
	for line in encoded.as_bytes().chunks(64) {
		pem.push_str(&String::from_utf8_lossy(line));
		pem.push('\n');
	}

	pem.push_str(&format!("-----END {label}-----\n"));

	pem
}
