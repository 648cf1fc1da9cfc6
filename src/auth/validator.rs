//! Authentication validator
//!
//! Parses `Authorization: Basic` headers and checks them against the
//! credential store. Authorization itself is a single capability: superusers
//! manage the tree, everybody else is turned away.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::warn;

use super::credentials::CredentialStore;
use crate::error::AuthError;

const MAX_CREDENTIAL_LENGTH: usize = 256;

/// An authenticated user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub superuser: bool,
}

impl Principal {
    /// Whether this user may browse and change the folder tree
    pub fn can_manage(&self) -> bool {
        self.superuser
    }
}

/// Performs basic input sanitation on decoded credentials.
fn is_valid_input(input: &str) -> bool {
    !input.trim().is_empty()
        && input.len() <= MAX_CREDENTIAL_LENGTH
        && !input.contains(['\r', '\n', '\0'])
}

/// Authenticates the value of an `Authorization` header.
pub fn authenticate(
    store: &CredentialStore,
    header: Option<&str>,
) -> Result<Principal, AuthError> {
    let header = header.ok_or(AuthError::MissingCredentials)?;

    let encoded = header
        .strip_prefix("Basic ")
        .ok_or_else(|| AuthError::MalformedCredentials("expected Basic scheme".into()))?;

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| AuthError::MalformedCredentials("invalid base64".into()))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| AuthError::MalformedCredentials("invalid UTF-8".into()))?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or_else(|| AuthError::MalformedCredentials("missing password".into()))?;

    if !is_valid_input(username) || !is_valid_input(password) {
        return Err(AuthError::MalformedCredentials("invalid credential format".into()));
    }

    match store.verify(username, password) {
        Some(superuser) => Ok(Principal {
            username: username.to_string(),
            superuser,
        }),
        None => {
            warn!("Rejected credentials for user {}", username);
            Err(AuthError::InvalidCredentials(username.to_string()))
        }
    }
}

/// Fails with `PermissionDenied` unless the principal manages the tree.
pub fn require_superuser(principal: &Principal) -> Result<(), AuthError> {
    if principal.can_manage() {
        Ok(())
    } else {
        Err(AuthError::PermissionDenied(principal.username.clone()))
    }
}
