//! Contract for the external token source (identity provider session) behind a credential.

pub mod memory;

pub use memory::MemoryTokenSource;

// self
use crate::{_prelude::*, auth::TokenSecret, error::BoxError};

/// Boxed future returned by [`TokenSource::silent_refresh`].
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BoxError>> + 'a + Send>>;

/// External session that owns token issuance.
///
/// The getters report the source's *current* view and must be cheap; the coordinator calls them
/// on every privileged operation. Only [`TokenSource::silent_refresh`] may suspend.
pub trait TokenSource
where
	Self: Send + Sync,
{
	/// Returns `true` when a user identity is established at all.
	fn is_authenticated(&self) -> bool;

	/// Returns the access token the source currently holds.
	fn access_token(&self) -> TokenSecret;

	/// Returns the expiry of the token the source currently holds.
	fn expires_at(&self) -> OffsetDateTime;

	/// Asks the source to obtain a new token without user interaction.
	fn silent_refresh(&self) -> SourceFuture<'_, ()>;
}
