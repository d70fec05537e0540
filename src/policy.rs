//! Pure staleness decisions for time-limited resources.
//!
//! [`ThresholdPolicy`] governs bearer credentials (refresh shortly before expiry, or whenever the
//! token source reports an expiry the local copy does not know about). [`TtlPolicy`] governs the
//! key cache (rebuild once the last successful rebuild is older than the TTL).

// self
use crate::_prelude::*;

/// Whether a cached resource may be used as is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Staleness {
	/// The resource is within tolerance.
	Fresh,
	/// The resource must be refreshed before use; expiry is the strongest case of this.
	NeedsRefresh,
}
impl Staleness {
	/// Returns `true` for [`Staleness::NeedsRefresh`].
	pub const fn needs_refresh(self) -> bool {
		matches!(self, Self::NeedsRefresh)
	}
}

/// Threshold policy applied to bearer credentials.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdPolicy {
	/// Minimum remaining lifetime a credential must have to be considered fresh.
	pub threshold: Duration,
}
impl ThresholdPolicy {
	/// Default refresh threshold (60 seconds).
	pub const DEFAULT_THRESHOLD: Duration = Duration::seconds(60);

	/// Creates a policy; negative thresholds are clamped to zero.
	pub fn new(threshold: Duration) -> Self {
		Self { threshold: if threshold.is_negative() { Duration::ZERO } else { threshold } }
	}

	/// Returns `true` when a credential expiring at `expires_at` has less than the threshold left.
	pub fn expiring(&self, expires_at: OffsetDateTime, now: OffsetDateTime) -> bool {
		expires_at - now < self.threshold
	}

	/// Decides whether the locally cached credential must be refreshed.
	///
	/// `source_expires_at` is the expiry currently reported by the token source. A mismatch with
	/// `local_expires_at` means the source rotated the token on its own, which also requires a
	/// refresh even when the new token is far from expiry.
	pub fn evaluate(
		&self,
		local_expires_at: OffsetDateTime,
		source_expires_at: OffsetDateTime,
		now: OffsetDateTime,
	) -> Staleness {
		if self.expiring(source_expires_at, now) || source_expires_at != local_expires_at {
			Staleness::NeedsRefresh
		} else {
			Staleness::Fresh
		}
	}
}
impl Default for ThresholdPolicy {
	fn default() -> Self {
		Self::new(Self::DEFAULT_THRESHOLD)
	}
}

/// TTL policy applied to the key cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlPolicy {
	/// Maximum age of a cache build.
	pub ttl: Duration,
}
impl TtlPolicy {
	/// Creates a policy with the provided TTL.
	pub const fn new(ttl: Duration) -> Self {
		Self { ttl }
	}

	/// Decides whether a cache last built at `last_updated_at` must be rebuilt.
	///
	/// A cache that was never built is always stale.
	pub fn evaluate(
		&self,
		last_updated_at: Option<OffsetDateTime>,
		now: OffsetDateTime,
	) -> Staleness {
		match last_updated_at {
			Some(updated) if now - updated <= self.ttl => Staleness::Fresh,
			_ => Staleness::NeedsRefresh,
		}
	}
}
