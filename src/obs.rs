//! Optional observability helpers for coordinator operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `token_keeper.op` with the `op` (operation)
//!   and `stage` (call site) fields, plus debug/warn events at refresh boundaries.
//! - Enable `metrics` to increment the `token_keeper_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`, and to record caller-observed latency
//!   in the `token_keeper_op_duration_seconds` histogram.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// std
use std::time::Instant;
// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Credential freshness check (and refresh, when required).
	CredentialRefresh,
	/// Key lookup against the signing key cache.
	KeyLookup,
	/// Full rebuild of the signing key cache.
	KeyRebuild,
	/// Caller-requested rebuild of the signing key cache, ignoring its TTL.
	KeyForcedRebuild,
	/// Token verification.
	TokenVerify,
	/// Socket connect.
	SocketConnect,
	/// Socket emit.
	SocketEmit,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::CredentialRefresh => "credential_refresh",
			OperationKind::KeyLookup => "key_lookup",
			OperationKind::KeyRebuild => "key_rebuild",
			OperationKind::KeyForcedRebuild => "key_forced_rebuild",
			OperationKind::TokenVerify => "token_verify",
			OperationKind::SocketConnect => "socket_connect",
			OperationKind::SocketEmit => "socket_emit",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside an operation span and records attempt + success/failure outcomes.
pub(crate) async fn observe<T, Fut>(kind: OperationKind, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = OperationSpan::new(kind, stage);
	let started = Instant::now();

	record_outcome(kind, OperationOutcome::Attempt);

	let result = span.instrument(fut).await;

	record_duration(kind, started.elapsed());

	match &result {
		Ok(_) => record_outcome(kind, OperationOutcome::Success),
		Err(_err) => {
			#[cfg(feature = "tracing")]
			::tracing::debug!(op = kind.as_str(), stage, error = %_err, "operation failed");

			record_outcome(kind, OperationOutcome::Failure);
		},
	}

	result
}
