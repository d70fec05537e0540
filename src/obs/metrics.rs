//! Counters and latency histograms for coordinator operations; no-ops without `metrics`.

// std
use std::time::Duration as StdDuration;
// self
use crate::obs::{OperationKind, OperationOutcome};

/// Bumps `token_keeper_op_total{op, outcome}`.
pub fn record_outcome(kind: OperationKind, outcome: OperationOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!("token_keeper_op_total", "op" => kind.as_str(), "outcome" => outcome.as_str())
		.increment(1);

	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

/// Records how long a finished operation took in `token_keeper_op_duration_seconds{op}`.
///
/// Includes time spent waiting on a joined flight.
pub fn record_duration(kind: OperationKind, elapsed: StdDuration) {
	#[cfg(feature = "metrics")]
	metrics::histogram!("token_keeper_op_duration_seconds", "op" => kind.as_str())
		.record(elapsed.as_secs_f64());

	#[cfg(not(feature = "metrics"))]
	let _ = (kind, elapsed);
}
