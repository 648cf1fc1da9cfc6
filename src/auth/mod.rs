//! Authentication system
//!
//! Resolves HTTP Basic credentials against the configured accounts and
//! decides what the resulting principal may do.

pub mod credentials;
pub mod validator;

pub use credentials::CredentialStore;
pub use validator::{Principal, authenticate, require_superuser};
