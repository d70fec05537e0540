//! Remote signing-key cache (JWKS) with single-flight rebuilds.
//!
//! The cache fetches the complete key set published by an identity provider, keeps only entries
//! usable for RS* signature verification, and swaps the whole `kid → key` map in one step so a
//! rotated-out key disappears the moment a rebuild completes.

pub mod cache;
pub mod config;
pub mod descriptor;
pub mod key;

pub use cache::*;
pub use config::*;
pub use descriptor::*;
pub use key::*;
