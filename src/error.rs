//! Crate-level error types shared by the coordinators, the socket wrapper, and the verifier.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error returned by external collaborators (token sources, transports).
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Shareable error used where a single failure must reach several waiters.
pub type SharedError = Arc<dyn StdError + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// A refresh (credential or key set) failed; every caller that joined it sees this error.
	#[error(transparent)]
	Refresh(#[from] RefreshError),
	/// Transport failure while connecting, reconnecting, or emitting.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token signature or claims could not be verified.
	#[error("Token verification failed: {0}")]
	Verification(#[from] VerificationError),

	/// No identity is established; the user must authenticate again.
	#[error("Not authorized: {reason}.")]
	Unauthorized {
		/// Human-readable explanation.
		reason: String,
	},
	/// The requested key id is absent from the freshly built key cache.
	#[error("No signing key matches kid `{kid}`.")]
	Lookup {
		/// Key id taken from the token header.
		kid: String,
	},
	/// The token header is missing or cannot be decoded.
	#[error("Token is malformed: {reason}.")]
	MalformedToken {
		/// Human-readable explanation.
		reason: String,
	},
}
impl Error {
	/// Returns `true` for failures that a later call may resolve by refreshing again.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::Refresh(_) | Self::Transport(_))
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Key set HTTP client could not be constructed.
	#[error("Key set HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Key set endpoint must use HTTPS.
	#[error("The key set endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Key set endpoint URL cannot be parsed.
	#[error("Key set endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Cache TTL must be strictly positive.
	#[error("Cache TTL must be positive.")]
	NonPositiveTtl,
}
impl ConfigError {
	/// Wraps an HTTP client builder failure.
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Outcome of a failed refresh flight.
///
/// Cloneable so the owner can hand the same failure to every waiter that joined the flight.
#[derive(Clone, Debug, ThisError)]
pub enum RefreshError {
	/// The token source failed to perform its silent refresh.
	#[error("Token source failed to refresh the credential.")]
	TokenSource {
		/// Failure reported by the token source.
		#[source]
		source: SharedError,
	},
	/// The remote key set could not be fetched.
	#[error(transparent)]
	KeyFetch(#[from] FetchError),
	/// A step chained onto the refresh (e.g. reconnecting a socket) failed.
	#[error("Post-refresh step failed.")]
	FollowUp {
		/// Failure reported by the chained step.
		#[source]
		source: SharedError,
	},
	/// The flight owner went away without publishing an outcome.
	#[error("Refresh owner exited before publishing an outcome.")]
	Abandoned,
}
impl RefreshError {
	/// Wraps a token source failure.
	pub fn token_source(src: BoxError) -> Self {
		Self::TokenSource { source: Arc::from(src) }
	}

	/// Wraps a failure raised by a step chained onto the refresh.
	pub fn follow_up(src: Error) -> Self {
		Self::FollowUp { source: Arc::new(src) }
	}
}

/// Failures raised while fetching a remote key set.
#[derive(Clone, Debug, ThisError)]
pub enum FetchError {
	/// Endpoint responded with a non-2xx status.
	#[error("Key set endpoint responded with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
	},
	/// Network failure (DNS, TCP, TLS, body read).
	#[error("Network error occurred while fetching the key set.")]
	Transport {
		/// Transport-specific failure.
		#[source]
		source: SharedError,
	},
	/// Body is not a key set document.
	#[error("Key set endpoint returned a malformed body at `{path}`: {message}.")]
	Parse {
		/// JSON path where parsing failed.
		path: String,
		/// Parser message.
		message: String,
	},
}
impl FetchError {
	/// Wraps a transport-specific network error.
	pub fn transport(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Transport { source: Arc::new(src) }
	}
}

/// Transport-level failures (socket connect, emit, disconnect).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying transport reported a network failure.
	#[error("Network error occurred on the transport.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Connection closed before the transport signalled `connected`.
	#[error("Transport closed before the connection was established.")]
	Closed,
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred on the transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}
}

/// Reasons a token failed verification.
#[derive(Debug, ThisError)]
pub enum VerificationError {
	/// Signature or registered-claim validation failed.
	#[error("{0}")]
	Jwt(#[from] jsonwebtoken::errors::Error),
	/// Header algorithm is outside the RSA family accepted for JWKS keys.
	#[error("algorithm {alg} is not accepted")]
	UnsupportedAlgorithm {
		/// Algorithm named by the header.
		alg: String,
	},
	/// Key advertises a different algorithm than the token header.
	#[error("key `{kid}` is bound to {key_alg}, token uses {token_alg}")]
	AlgorithmMismatch {
		/// Key id.
		kid: String,
		/// Algorithm advertised by the key.
		key_alg: String,
		/// Algorithm named by the token header.
		token_alg: String,
	},
	/// Cached key material cannot be turned into a verification key.
	#[error("key `{kid}` is unusable: {source}")]
	InvalidKey {
		/// Key id.
		kid: String,
		/// Conversion failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
}
