//! Authenticated wrapper around an event transport.
//!
//! [`SecureSocket`] composes a [`Transport`] with a [`CredentialRefreshCoordinator`]. Every
//! `connect` and `emit` first makes sure the credential is fresh; when that check rotates the
//! credential, the transport is torn down and reconnected with the new token *inside* the refresh
//! flight. An emit that triggered the rotation, and every emit that joined it, is only delivered
//! once the transport reports `connected` again. A failed reconnect leaves the previous credential
//! installed, so the next `connect` or `emit` retries it.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenSecret},
	coordinator::CredentialRefreshCoordinator,
	error::TransportError,
	obs::{self, OperationKind},
};

/// Boxed future returned by [`Transport`] operations.
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<(), TransportError>> + 'a + Send>>;

/// Bidirectional event transport (e.g. a socket.io-style client).
pub trait Transport
where
	Self: 'static + Send + Sync,
{
	/// Starts connecting with `token` as the bearer credential.
	///
	/// May resolve before the connection is usable; [`Transport::connected`] signals readiness.
	fn connect<'a>(&'a self, token: &'a TokenSecret) -> TransportFuture<'a>;

	/// Closes the current connection; a no-op when not connected.
	fn disconnect(&self) -> TransportFuture<'_>;

	/// Sends `payload` under `event` on the current connection.
	fn emit<'a>(&'a self, event: &'a str, payload: Value) -> TransportFuture<'a>;

	/// One-shot notification resolved by the next `connected` event.
	///
	/// Implementations must register interest when this method is called, not when the returned
	/// future is first polled, because the socket subscribes before calling
	/// [`Transport::connect`].
	fn connected(&self) -> TransportFuture<'_>;
}

/// Transport wrapper that gates `connect` and `emit` on a fresh credential.
pub struct SecureSocket<T>
where
	T: ?Sized + Transport,
{
	coordinator: Arc<CredentialRefreshCoordinator>,
	transport: Arc<T>,
	lifecycle: AsyncMutex<()>,
	// Expiry of the credential the live connection was opened with.
	live: Mutex<Option<OffsetDateTime>>,
}
impl<T> SecureSocket<T>
where
	T: ?Sized + Transport,
{
	/// Wraps `transport`, authenticating it with credentials from `coordinator`.
	pub fn new(coordinator: Arc<CredentialRefreshCoordinator>, transport: impl Into<Arc<T>>) -> Self {
		Self {
			coordinator,
			transport: transport.into(),
			lifecycle: AsyncMutex::new(()),
			live: Mutex::new(None),
		}
	}

	/// Returns the coordinator that owns the credential.
	pub fn coordinator(&self) -> &Arc<CredentialRefreshCoordinator> {
		&self.coordinator
	}

	/// Returns the wrapped transport.
	pub fn transport(&self) -> &Arc<T> {
		&self.transport
	}

	/// Returns `true` while the transport is connected with the installed credential.
	pub fn is_connected(&self) -> bool {
		let expires_at = self.coordinator.credential().expires_at;

		*self.live.lock() == Some(expires_at)
	}

	/// Connects the transport with a fresh credential and waits until it reports `connected`.
	///
	/// A no-op when the transport is already connected with the current credential, including
	/// when this call joined a rotation that reconnected it.
	pub async fn connect(&self) -> Result<()> {
		obs::observe(OperationKind::SocketConnect, "connect", async move {
			self.ensure_authenticated()?;

			let refreshed =
				self.coordinator.ensure_fresh_then(|credential| self.reconnect(credential)).await?;

			if !refreshed {
				let _lifecycle = self.lifecycle.lock().await;

				if !self.is_connected() {
					self.open(&self.coordinator.credential()).await?;
				}
			}

			Ok(())
		})
		.await
	}

	/// Emits `payload` under `event` once the credential is fresh.
	///
	/// When the freshness check rotates the credential, the emit is delivered after the
	/// transport has reconnected with the new token.
	pub async fn emit(&self, event: &str, payload: Value) -> Result<()> {
		obs::observe(OperationKind::SocketEmit, "emit", async move {
			self.ensure_authenticated()?;
			self.coordinator.ensure_fresh_then(|credential| self.reconnect(credential)).await?;
			self.transport.emit(event, payload).await?;

			Ok(())
		})
		.await
	}

	/// Closes the transport connection.
	pub async fn disconnect(&self) -> Result<()> {
		let _lifecycle = self.lifecycle.lock().await;

		self.live.lock().take();
		self.transport.disconnect().await?;

		Ok(())
	}

	fn ensure_authenticated(&self) -> Result<()> {
		if self.coordinator.is_authenticated() {
			Ok(())
		} else {
			Err(Error::Unauthorized { reason: "no authenticated session is established".into() })
		}
	}

	async fn reconnect(&self, credential: Credential) -> Result<()> {
		let _lifecycle = self.lifecycle.lock().await;

		#[cfg(feature = "tracing")]
		tracing::debug!("credential rotated; reconnecting transport");

		self.live.lock().take();
		self.transport.disconnect().await?;
		self.open(&credential).await
	}

	async fn open(&self, credential: &Credential) -> Result<()> {
		let connected = self.transport.connected();

		self.transport.connect(&credential.token).await?;
		connected.await?;
		*self.live.lock() = Some(credential.expires_at);

		Ok(())
	}
}
impl<T> Debug for SecureSocket<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SecureSocket").field("coordinator", &self.coordinator).finish()
	}
}
