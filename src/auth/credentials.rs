//! Credential storage
//!
//! Holds the accounts declared in the configuration.

use std::collections::HashMap;

use crate::config::UserConfig;

#[derive(Debug, Clone)]
struct StoredUser {
    password: String,
    superuser: bool,
}

/// In-memory account store built once from the configuration
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    users: HashMap<String, StoredUser>,
}

impl CredentialStore {
    pub fn from_users(users: &[UserConfig]) -> Self {
        let users = users
            .iter()
            .map(|u| {
                (
                    u.username.clone(),
                    StoredUser {
                        password: u.password.clone(),
                        superuser: u.superuser,
                    },
                )
            })
            .collect();
        Self { users }
    }

    /// Checks a password; returns the superuser flag when it matches.
    pub fn verify(&self, username: &str, password: &str) -> Option<bool> {
        match self.users.get(username) {
            Some(user) if user.password == password => Some(user.superuser),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
