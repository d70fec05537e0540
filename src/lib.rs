//! Single-flight credential refresh and JWKS key-cache coordination for async Rust: keep bearer
//! tokens and remotely published signing keys fresh under concurrent access.
//!
//! The crate is built around one primitive, [`latch::Latch`], which lets exactly one caller own a
//! refresh while every concurrent caller waits for (and then shares) its outcome. Two
//! coordinators sit on top of it:
//!
//! - [`coordinator::CredentialRefreshCoordinator`] keeps a bearer token in sync with an external
//!   [`auth::TokenSource`], and [`socket::SecureSocket`] gates transport `connect`/`emit` calls on
//!   it.
//! - [`jwks::KeyCacheCoordinator`] keeps a `kid → key` map rebuilt from a JWKS endpoint, and
//!   [`verify::TokenVerifier`] validates JWTs against it.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod clock;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod jwks;
pub mod latch;
pub mod obs;
pub mod policy;
pub mod socket;
pub mod verify;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use jsonwebtoken;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
