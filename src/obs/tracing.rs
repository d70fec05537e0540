//! Span plumbing for coordinator operations; compiles to passthroughs without `tracing`.

// self
use crate::{_prelude::*, obs::OperationKind};

/// Future returned by [`OperationSpan::instrument`].
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`OperationSpan::instrument`].
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// `token_keeper.op` span carrying the operation label, the call site and, for remote work,
/// the endpoint being contacted.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Opens a span for `kind` at `stage`.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"token_keeper.op",
				op = kind.as_str(),
				stage,
				endpoint = tracing::field::Empty
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Tags the span with the remote endpoint (e.g. a key set URL).
	pub fn with_endpoint(self, endpoint: &Url) -> Self {
		#[cfg(feature = "tracing")]
		self.span.record("endpoint", endpoint.as_str());
		#[cfg(not(feature = "tracing"))]
		let _ = endpoint;

		self
	}

	/// Runs `fut` inside the span; no guard is held across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}
