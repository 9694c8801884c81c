//! Bind credentials.
//!
//! The password is kept in a [`SecretString`] so it never shows up in `Debug` output, logs or
//! serialized forms.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

/// Credentials used for a simple bind against the directory.
///
/// `username` is the short account name (e.g. `jdoe`); the account suffix from the client
/// configuration is appended to it to form the bind principal.
#[derive(Debug, Serialize)]
pub struct BindCredentials {
    /// Account name to bind as, without suffix
    pub username: String,

    /// Bind password
    #[serde(skip_serializing)]
    password: SecretString,
}

impl BindCredentials {
    /// Create new bind credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Get the account name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Get the bind password.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// Builds the bind principal by appending `suffix` to the username.
    ///
    /// `jdoe` with suffix `@corp.example` binds as `jdoe@corp.example`.
    #[must_use]
    pub fn principal(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.username)
    }
}
