//! Immutable bearer credential snapshots.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Bearer token together with the instant it stops being valid.
///
/// Credentials are never mutated in place: every refresh installs a new value, so `expires_at`
/// always describes the token stored next to it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	/// Bearer token; callers must avoid logging it.
	pub token: TokenSecret,
	/// Expiry instant reported by the token source when the token was pulled.
	pub expires_at: OffsetDateTime,
}
impl Credential {
	/// Creates a credential from a token and its expiry.
	pub fn new(token: TokenSecret, expires_at: OffsetDateTime) -> Self {
		Self { token, expires_at }
	}

	/// Placeholder held before the first refresh: no token, expired at the Unix epoch.
	pub fn empty() -> Self {
		Self { token: TokenSecret::default(), expires_at: OffsetDateTime::UNIX_EPOCH }
	}

	/// Returns `true` while no token has been pulled from the source.
	pub fn is_empty(&self) -> bool {
		self.token.is_empty()
	}

	/// Remaining lifetime relative to `now` (negative once expired).
	pub fn remaining_at(&self, now: OffsetDateTime) -> Duration {
		self.expires_at - now
	}
}
impl Default for Credential {
	fn default() -> Self {
		Self::empty()
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("token", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
