//! Credential model and the token-source contract the credential coordinator consumes.

pub mod credential;
pub mod secret;
pub mod source;

pub use credential::*;
pub use secret::*;
pub use source::*;
