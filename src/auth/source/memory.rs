//! In-process [`TokenSource`] for local development, demos, and tests.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	auth::{SourceFuture, TokenSecret, TokenSource},
	clock::Clock,
};

/// Failure produced by [`MemoryTokenSource::silent_refresh`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Silent refresh failed: {reason}.")]
pub struct SilentRefreshError {
	/// Human-readable failure reason.
	pub reason: String,
}

#[derive(Clone, Debug)]
struct Session {
	token: TokenSecret,
	expires_at: OffsetDateTime,
}

/// Token source that mints sequential tokens (`token-1`, `token-2`, ...) on silent refresh.
///
/// Each minted token lives for the configured lifetime, measured from the injected clock.
pub struct MemoryTokenSource {
	clock: Arc<dyn Clock>,
	lifetime: Duration,
	session: RwLock<Option<Session>>,
	pending_failure: Mutex<Option<String>>,
	refreshes: AtomicU64,
}
impl MemoryTokenSource {
	/// Creates a signed-out source whose refreshed tokens live for `lifetime`.
	pub fn new(clock: Arc<dyn Clock>, lifetime: Duration) -> Self {
		Self {
			clock,
			lifetime,
			session: RwLock::new(None),
			pending_failure: Mutex::new(None),
			refreshes: AtomicU64::new(0),
		}
	}

	/// Establishes a session holding `token` until `expires_at`.
	pub fn sign_in(&self, token: impl Into<String>, expires_at: OffsetDateTime) {
		*self.session.write() = Some(Session { token: TokenSecret::new(token), expires_at });
	}

	/// Drops the session; later privileged operations fail with an authorization error.
	pub fn sign_out(&self) {
		*self.session.write() = None;
	}

	/// Makes the next silent refresh fail with `reason`.
	pub fn fail_next_refresh(&self, reason: impl Into<String>) {
		*self.pending_failure.lock() = Some(reason.into());
	}

	/// Number of successful silent refreshes performed so far.
	pub fn refresh_count(&self) -> u64 {
		self.refreshes.load(Ordering::SeqCst)
	}

	fn refresh_now(&self) -> Result<(), SilentRefreshError> {
		if let Some(reason) = self.pending_failure.lock().take() {
			return Err(SilentRefreshError { reason });
		}

		let mut session = self.session.write();

		if session.is_none() {
			return Err(SilentRefreshError { reason: "no session to refresh".into() });
		}

		let sequence = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;

		*session = Some(Session {
			token: TokenSecret::new(format!("token-{sequence}")),
			expires_at: self.clock.now() + self.lifetime,
		});

		Ok(())
	}
}
impl Debug for MemoryTokenSource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MemoryTokenSource")
			.field("lifetime", &self.lifetime)
			.field("authenticated", &self.is_authenticated())
			.field("refreshes", &self.refresh_count())
			.finish()
	}
}
impl TokenSource for MemoryTokenSource {
	fn is_authenticated(&self) -> bool {
		self.session.read().is_some()
	}

	fn access_token(&self) -> TokenSecret {
		self.session.read().as_ref().map(|session| session.token.clone()).unwrap_or_default()
	}

	fn expires_at(&self) -> OffsetDateTime {
		self.session
			.read()
			.as_ref()
			.map(|session| session.expires_at)
			.unwrap_or(OffsetDateTime::UNIX_EPOCH)
	}

	fn silent_refresh(&self) -> SourceFuture<'_, ()> {
		Box::pin(async move { self.refresh_now().map_err(Into::into) })
	}
}
