//! Key cache coordinator: TTL-driven, single-flight rebuilds of the `kid → key` map.

// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
	coordinator::RefreshMetrics,
	error::{FetchError, RefreshError},
	http::KeySetFetcher,
	jwks::{JwkDescriptor, KeyCacheConfig, SigningKey},
	latch::{Acquired, Latch},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
};

/// Immutable view of one cache build.
#[derive(Clone, Debug, Default)]
pub struct KeySnapshot {
	keys: HashMap<String, SigningKey>,
	last_updated_at: Option<OffsetDateTime>,
}
impl KeySnapshot {
	/// Returns the key registered under `kid`.
	pub fn get(&self, kid: &str) -> Option<&SigningKey> {
		self.keys.get(kid)
	}

	/// Returns the cached key ids in ascending order.
	pub fn kids(&self) -> Vec<&str> {
		let mut kids = self.keys.keys().map(String::as_str).collect::<Vec<_>>();

		kids.sort_unstable();

		kids
	}

	/// Iterates over the cached keys in no particular order.
	pub fn iter(&self) -> impl Iterator<Item = &SigningKey> {
		self.keys.values()
	}

	/// Returns the number of cached keys.
	pub fn len(&self) -> usize {
		self.keys.len()
	}

	/// Returns `true` when the build produced no usable key.
	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}

	/// Returns the instant the build was installed, or `None` before the first build.
	pub fn last_updated_at(&self) -> Option<OffsetDateTime> {
		self.last_updated_at
	}
}

/// Cache freshness metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
	/// Instant of the last successful rebuild; `None` means never built.
	pub last_updated_at: Option<OffsetDateTime>,
	/// Configured maximum age of a build.
	pub ttl: Duration,
}

/// Keeps the signing keys published at a JWKS endpoint fresh for concurrent verifiers.
///
/// Lookups rebuild the whole map once it is older than the configured TTL. Only one rebuild is
/// in flight at a time; lookups arriving meanwhile wait for it and then read the new map.
pub struct KeyCacheCoordinator {
	/// Shared counters for lookups and rebuild outcomes.
	pub metrics: Arc<RefreshMetrics>,
	config: KeyCacheConfig,
	fetcher: Arc<dyn KeySetFetcher>,
	clock: Arc<dyn Clock>,
	snapshot: RwLock<Arc<KeySnapshot>>,
	latch: Latch,
}
impl KeyCacheCoordinator {
	/// Creates an empty (never built) cache backed by `fetcher`.
	pub fn new(config: KeyCacheConfig, fetcher: Arc<dyn KeySetFetcher>) -> Self {
		Self {
			metrics: Default::default(),
			config,
			fetcher,
			clock: Arc::new(SystemClock),
			snapshot: Default::default(),
			latch: Latch::new(),
		}
	}

	/// Creates a cache that fetches through a default reqwest client.
	#[cfg(feature = "reqwest")]
	pub fn with_reqwest(config: KeyCacheConfig) -> Self {
		Self::new(config, Arc::new(crate::http::ReqwestKeySetFetcher::default()))
	}

	/// Replaces the clock used for TTL decisions.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Returns the cache configuration.
	pub fn config(&self) -> &KeyCacheConfig {
		&self.config
	}

	/// Returns the current build.
	pub fn keys(&self) -> Arc<KeySnapshot> {
		self.snapshot.read().clone()
	}

	/// Returns the cache freshness metadata.
	pub fn metadata(&self) -> CacheMetadata {
		CacheMetadata { last_updated_at: self.snapshot.read().last_updated_at, ttl: self.config.ttl }
	}

	/// Returns `true` while a rebuild is in flight.
	pub fn is_rebuilding(&self) -> bool {
		self.latch.is_pending()
	}

	/// Resolves `kid`, rebuilding the cache first when it is stale.
	///
	/// A key that is still absent after a fresh build yields [`Error::Lookup`]; the miss never
	/// triggers a second rebuild.
	pub async fn get_key(&self, kid: &str) -> Result<SigningKey> {
		obs::observe(OperationKind::KeyLookup, "get_key", async move {
			self.metrics.record_attempt();

			let result = self.ensure_built(false).await.and_then(|_| self.lookup(kid));

			if result.is_err() {
				self.metrics.record_failure();
			}

			result
		})
		.await
	}

	/// Rebuilds the cache regardless of its age.
	///
	/// Joins the in-flight rebuild instead when one is already running.
	pub async fn rebuild(&self) -> Result<()> {
		obs::observe(OperationKind::KeyForcedRebuild, "rebuild", async move {
			self.metrics.record_attempt();

			let result = self.ensure_built(true).await;

			if result.is_err() {
				self.metrics.record_failure();
			}

			result
		})
		.await
	}

	fn lookup(&self, kid: &str) -> Result<SigningKey> {
		self.snapshot
			.read()
			.get(kid)
			.cloned()
			.ok_or_else(|| Error::Lookup { kid: kid.to_owned() })
	}

	fn is_stale(&self) -> bool {
		let last_updated_at = self.snapshot.read().last_updated_at;

		self.config.policy().evaluate(last_updated_at, self.clock.now()).needs_refresh()
	}

	async fn ensure_built(&self, force: bool) -> Result<()> {
		// Joiners of a successful rebuild go straight to the lookup.
		if let Some(outcome) = self.latch.join().await {
			self.metrics.record_join();

			return Ok(outcome?);
		}
		if !force && !self.is_stale() {
			return Ok(());
		}

		match self.latch.acquire_or_join().await {
			Acquired::Joined(outcome) => {
				self.metrics.record_join();

				Ok(outcome?)
			},
			Acquired::Owner(guard) => {
				if !force && !self.is_stale() {
					guard.release(Ok(())).await;

					return Ok(());
				}

				let outcome = self.fetch_and_install().await.map_err(RefreshError::from);

				guard.release(outcome.clone()).await;
				outcome?;
				self.metrics.record_refresh();

				Ok(())
			},
		}
	}

	async fn fetch_and_install(&self) -> Result<(), FetchError> {
		let span = OperationSpan::new(OperationKind::KeyRebuild, "fetch_and_install")
			.with_endpoint(&self.config.jwks_url);

		obs::record_outcome(OperationKind::KeyRebuild, OperationOutcome::Attempt);

		let result = span.instrument(self.fetcher.fetch(&self.config.jwks_url)).await;
		let descriptors = match result {
			Ok(descriptors) => descriptors,
			Err(e) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(
					url = %self.config.jwks_url,
					error = %e,
					"key set fetch failed; keeping the previous build"
				);

				obs::record_outcome(OperationKind::KeyRebuild, OperationOutcome::Failure);

				return Err(e);
			},
		};
		let keys = collect_keys(&descriptors);
		let snapshot = KeySnapshot { keys, last_updated_at: Some(self.clock.now()) };

		#[cfg(feature = "tracing")]
		tracing::debug!(keys = snapshot.len(), "installing rebuilt key set");

		*self.snapshot.write() = Arc::new(snapshot);

		obs::record_outcome(OperationKind::KeyRebuild, OperationOutcome::Success);

		Ok(())
	}
}
impl Debug for KeyCacheCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let snapshot = self.snapshot.read();

		f.debug_struct("KeyCacheCoordinator")
			.field("config", &self.config)
			.field("kids", &snapshot.kids())
			.field("last_updated_at", &snapshot.last_updated_at)
			.field("rebuilding", &self.latch.is_pending())
			.finish()
	}
}

fn collect_keys(descriptors: &[JwkDescriptor]) -> HashMap<String, SigningKey> {
	let mut keys = HashMap::with_capacity(descriptors.len());
	let mut _rejected = 0_usize;

	for descriptor in descriptors {
		let key = match SigningKey::try_from(descriptor) {
			Ok(key) => key,
			Err(_reason) => {
				#[cfg(feature = "tracing")]
				tracing::debug!(kid = ?descriptor.kid, reason = %_reason, "skipping unusable key");

				_rejected += 1;

				continue;
			},
		};

		if keys.contains_key(&key.kid) {
			#[cfg(feature = "tracing")]
			tracing::warn!(kid = %key.kid, "duplicate key id in key set; keeping the first entry");

			continue;
		}

		keys.insert(key.kid.clone(), key);
	}

	#[cfg(feature = "tracing")]
	tracing::debug!(accepted = keys.len(), rejected = _rejected, "filtered key set");

	keys
}
