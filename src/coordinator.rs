//! Credential refresh orchestration with a single-flight latch.
//!
//! [`CredentialRefreshCoordinator::ensure_fresh`] is called before every privileged operation.
//! It joins any refresh already in flight and evaluates the [`ThresholdPolicy`] against the token
//! source. When the credential is stale, exactly one caller triggers the source's silent refresh
//! and installs the new [`Credential`]. Every other caller waits on the same flight and
//! shares its outcome, including its failure.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenSource},
	clock::{Clock, SystemClock},
	error::RefreshError,
	latch::{Acquired, Latch},
	obs::{self, OperationKind},
	policy::{Staleness, ThresholdPolicy},
};

/// Owns one bearer credential and keeps it in sync with a [`TokenSource`].
///
/// Instances are independent: each owns its own latch, so two coordinators never wait on each
/// other's refreshes.
pub struct CredentialRefreshCoordinator {
	/// Shared counters for freshness checks and refresh outcomes.
	pub metrics: Arc<RefreshMetrics>,
	source: Arc<dyn TokenSource>,
	policy: ThresholdPolicy,
	clock: Arc<dyn Clock>,
	credential: RwLock<Credential>,
	latch: Latch,
}
impl CredentialRefreshCoordinator {
	/// Creates a coordinator with an empty credential and the system clock.
	pub fn new(source: Arc<dyn TokenSource>, policy: ThresholdPolicy) -> Self {
		Self {
			metrics: Default::default(),
			source,
			policy,
			clock: Arc::new(SystemClock),
			credential: RwLock::new(Credential::empty()),
			latch: Latch::new(),
		}
	}

	/// Replaces the clock used for staleness decisions.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Returns the configured policy.
	pub fn policy(&self) -> ThresholdPolicy {
		self.policy
	}

	/// Returns the token source backing this coordinator.
	pub fn source(&self) -> &Arc<dyn TokenSource> {
		&self.source
	}

	/// Returns a snapshot of the credential installed by the latest refresh.
	pub fn credential(&self) -> Credential {
		self.credential.read().clone()
	}

	/// Returns `true` when the token source has an established identity.
	pub fn is_authenticated(&self) -> bool {
		self.source.is_authenticated()
	}

	/// Returns `true` while a refresh flight is open.
	pub fn is_refreshing(&self) -> bool {
		self.latch.is_pending()
	}

	/// Evaluates the threshold policy against the token source without side effects.
	pub fn staleness(&self) -> Staleness {
		let local = self.credential.read().expires_at;

		self.policy.evaluate(local, self.source.expires_at(), self.clock.now())
	}

	/// Makes sure the local credential is fresh, refreshing it when required.
	///
	/// Returns `true` only for the caller that performed the refresh; callers that joined
	/// another caller's refresh, or found the credential fresh, receive `false`.
	pub async fn ensure_fresh(&self) -> Result<bool> {
		self.ensure_fresh_then(|_| async { Ok(()) }).await
	}

	/// Same as [`ensure_fresh`](Self::ensure_fresh), but the refreshing caller also runs `after`
	/// with the new credential before the flight is released.
	///
	/// Callers that join the flight therefore resume only once `after` has finished, and a
	/// failure in `after` reaches all of them.
	pub async fn ensure_fresh_then<F, Fut>(&self, after: F) -> Result<bool>
	where
		F: FnOnce(Credential) -> Fut,
		Fut: Future<Output = Result<()>>,
	{
		obs::observe(OperationKind::CredentialRefresh, "ensure_fresh", async move {
			self.metrics.record_attempt();

			let result = self.check_and_refresh(after).await;

			if result.is_err() {
				self.metrics.record_failure();
			}

			result
		})
		.await
	}

	async fn check_and_refresh<F, Fut>(&self, after: F) -> Result<bool>
	where
		F: FnOnce(Credential) -> Fut,
		Fut: Future<Output = Result<()>>,
	{
		// A successful flight leaves the credential as fresh as the source can make it.
		if let Some(outcome) = self.latch.join().await {
			self.metrics.record_join();

			return outcome.map(|_| false).map_err(Into::into);
		}
		if !self.staleness().needs_refresh() {
			return Ok(false);
		}

		match self.latch.acquire_or_join().await {
			Acquired::Joined(outcome) => {
				self.metrics.record_join();

				outcome.map(|_| false).map_err(Into::into)
			},
			Acquired::Owner(guard) => {
				// A flight may have completed between the check and the acquisition.
				if !self.staleness().needs_refresh() {
					guard.release(Ok(())).await;

					return Ok(false);
				}

				let outcome = self.refresh_as_owner(after).await;

				guard.release(outcome.clone()).await;
				outcome?;
				self.metrics.record_refresh();

				Ok(true)
			},
		}
	}

	async fn refresh_as_owner<F, Fut>(&self, after: F) -> Result<(), RefreshError>
	where
		F: FnOnce(Credential) -> Fut,
		Fut: Future<Output = Result<()>>,
	{
		if self.policy.expiring(self.source.expires_at(), self.clock.now()) {
			#[cfg(feature = "tracing")]
			tracing::debug!("credential is inside the refresh threshold; requesting silent refresh");

			self.source.silent_refresh().await.map_err(RefreshError::token_source)?;
		}

		let credential = Credential::new(self.source.access_token(), self.source.expires_at());

		// Until `after` succeeds the old credential stays installed, so the next check retries it.
		after(credential.clone()).await.map_err(RefreshError::follow_up)?;

		#[cfg(feature = "tracing")]
		tracing::debug!(expires_at = %credential.expires_at, "installing refreshed credential");

		*self.credential.write() = credential;

		Ok(())
	}
}
impl Debug for CredentialRefreshCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialRefreshCoordinator")
			.field("policy", &self.policy)
			.field("credential", &*self.credential.read())
			.field("refreshing", &self.latch.is_pending())
			.finish()
	}
}
