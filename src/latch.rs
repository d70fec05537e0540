//! Single-flight gate shared by the refresh coordinators.
//!
//! A [`Latch`] has at most one open *flight*. The first caller of [`Latch::acquire_or_join`]
//! becomes the owner and receives a [`LatchGuard`]; everyone arriving while the flight is open
//! suspends until the owner calls [`LatchGuard::release`] and then receives the owner's outcome.
//! Dropping the guard without releasing it publishes [`RefreshError::Abandoned`], so a panicking
//! or cancelled owner can never wedge later callers.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use async_lock::OnceCell;
// self
use crate::{_prelude::*, error::RefreshError};

/// Outcome published by a flight owner to every waiter.
pub type FlightOutcome = Result<(), RefreshError>;

#[derive(Clone, Debug)]
struct Flight {
	id: u64,
	outcome: Arc<OnceCell<FlightOutcome>>,
}

/// Result of [`Latch::acquire_or_join`].
#[derive(Debug)]
pub enum Acquired<'a> {
	/// The caller owns the flight and must release it.
	Owner(LatchGuard<'a>),
	/// Another caller owned the flight; this is its outcome.
	Joined(FlightOutcome),
}

/// Reusable single-flight gate.
#[derive(Debug, Default)]
pub struct Latch {
	slot: Mutex<Option<Flight>>,
	next_id: AtomicU64,
}
impl Latch {
	/// Creates an idle latch.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns `true` while a flight is open.
	pub fn is_pending(&self) -> bool {
		self.slot.lock().is_some()
	}

	/// Becomes the owner of a new flight, or waits for the open one and returns its outcome.
	pub async fn acquire_or_join(&self) -> Acquired<'_> {
		let open = {
			let mut slot = self.slot.lock();
			let open = slot.as_ref().map(|flight| flight.outcome.clone());

			match open {
				Some(outcome) => outcome,
				None => {
					let id = self.next_id.fetch_add(1, Ordering::Relaxed);
					let outcome = Arc::new(OnceCell::new());

					*slot = Some(Flight { id, outcome: outcome.clone() });

					return Acquired::Owner(LatchGuard { latch: self, id, outcome: Some(outcome) });
				},
			}
		};

		Acquired::Joined(open.wait().await.clone())
	}

	/// Waits for the open flight, if any, without ever taking ownership.
	///
	/// Returns `None` immediately when the latch is idle.
	pub async fn join(&self) -> Option<FlightOutcome> {
		let outcome = self.slot.lock().as_ref().map(|flight| flight.outcome.clone())?;

		Some(outcome.wait().await.clone())
	}

	fn close(&self, id: u64) {
		let mut slot = self.slot.lock();

		if slot.as_ref().is_some_and(|flight| flight.id == id) {
			*slot = None;
		}
	}
}

/// Ownership handle for an open flight.
#[must_use = "dropping the guard without releasing it reports the flight as abandoned"]
pub struct LatchGuard<'a> {
	latch: &'a Latch,
	id: u64,
	outcome: Option<Arc<OnceCell<FlightOutcome>>>,
}
impl LatchGuard<'_> {
	/// Closes the flight and wakes every waiter with `outcome`.
	///
	/// The slot is cleared before the outcome is published, so callers arriving afterwards start
	/// a new flight instead of inheriting this one's result.
	pub async fn release(mut self, outcome: FlightOutcome) {
		if let Some(cell) = self.outcome.clone() {
			self.latch.close(self.id);

			let _ = cell.set(outcome).await;

			self.outcome = None;
		}
	}
}
impl Debug for LatchGuard<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LatchGuard").field("id", &self.id).finish()
	}
}
impl Drop for LatchGuard<'_> {
	fn drop(&mut self) {
		if let Some(cell) = self.outcome.take() {
			self.latch.close(self.id);

			// Only the owner ever initializes the cell, so this never contends.
			let _ = cell.set_blocking(Err(RefreshError::Abandoned));
		}
	}
}
