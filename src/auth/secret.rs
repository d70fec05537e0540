//! Access token value handed out by a token source and presented to transports.

// self
use crate::_prelude::*;

/// Access token pulled from a [`TokenSource`](crate::auth::TokenSource).
///
/// `Debug` and `Display` print `<redacted>`, so credentials and the types holding them can be
/// logged without leaking the token. The empty default stands for "not pulled yet".
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a token issued by a source.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the raw token for a transport handshake.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` for the placeholder held before the first sync.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
