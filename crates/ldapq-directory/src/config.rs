//! Configuration types for directory client usage.

use crate::{dn, Result};
use ldapq_core::Error;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Default connection timeout (seconds).
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 10;
/// Default operation timeout (seconds).
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 10;
/// Port used when the address names a host without one.
pub const DEFAULT_LDAPS_PORT: u16 = 636;

/// Configuration for connecting to a directory server.
#[derive(Debug, Clone, Validate)]
pub struct DirectoryConfig {
    #[validate(length(min = 1))]
    url: String,
    #[validate(length(min = 1))]
    base_dn: String,
    account_suffix: String,
    tls_verify: bool,
    tls_ca_cert: Option<PathBuf>,
    #[validate(range(min = 1, max = 300))]
    connection_timeout_secs: u64,
    #[validate(range(min = 1, max = 300))]
    operation_timeout_secs: u64,
}

impl DirectoryConfig {
    /// Creates a new directory configuration.
    ///
    /// `address` is either `host:port` (connected with LDAPS) or a full `ldaps://` / `ldap://`
    /// URL. `account_suffix` is appended to usernames to form the bind principal, e.g.
    /// `@corp.example`.
    ///
    /// TLS certificates are verified unless [`DirectoryConfig::with_tls_verification`] turns it
    /// off.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the address or base DN is invalid.
    pub fn new(
        address: impl AsRef<str>,
        base_dn: impl Into<String>,
        account_suffix: impl Into<String>,
    ) -> Result<Self> {
        let url = normalize_address(address.as_ref())?;
        let base_dn = base_dn.into();
        dn::validate(&base_dn)?;

        let config = Self {
            url,
            base_dn,
            account_suffix: account_suffix.into(),
            tls_verify: true,
            tls_ca_cert: None,
            connection_timeout_secs: DEFAULT_CONNECTION_TIMEOUT_SECS,
            operation_timeout_secs: DEFAULT_OPERATION_TIMEOUT_SECS,
        };
        config.check()?;
        Ok(config)
    }

    /// Re-runs validation, e.g. after builder overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when a field is out of range.
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))
    }

    /// Returns the directory URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the search base distinguished name.
    #[must_use]
    pub fn base_dn(&self) -> &str {
        &self.base_dn
    }

    /// Returns the suffix appended to usernames before binding.
    #[must_use]
    pub fn account_suffix(&self) -> &str {
        &self.account_suffix
    }

    /// Returns the connection timeout duration.
    #[must_use]
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Returns the operation timeout duration.
    #[must_use]
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Returns whether TLS certificate verification is enabled.
    #[must_use]
    pub const fn tls_verify(&self) -> bool {
        self.tls_verify
    }

    /// Optional custom CA certificate path.
    #[must_use]
    pub fn tls_ca_cert(&self) -> Option<&PathBuf> {
        self.tls_ca_cert.as_ref()
    }

    /// Enables or disables TLS certificate verification.
    ///
    /// Disabling skips both certificate chain and hostname checks. Only do this when the
    /// network path to the directory is otherwise trusted.
    #[must_use]
    pub const fn with_tls_verification(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Sets the custom CA certificate path for TLS verification.
    #[must_use]
    pub fn with_tls_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Overrides the connection timeout in seconds.
    #[must_use]
    pub const fn with_connection_timeout_secs(mut self, seconds: u64) -> Self {
        self.connection_timeout_secs = seconds;
        self
    }

    /// Overrides the operation timeout in seconds.
    #[must_use]
    pub const fn with_operation_timeout_secs(mut self, seconds: u64) -> Self {
        self.operation_timeout_secs = seconds;
        self
    }
}

fn normalize_address(address: &str) -> Result<String> {
    let address = address.trim();
    if address.is_empty() {
        return Err(Error::ConfigError(
            "directory address cannot be empty".to_string(),
        ));
    }

    let candidate = if address.contains("://") {
        address.to_string()
    } else {
        format!("ldaps://{address}")
    };

    let url = Url::parse(&candidate)?;
    match url.scheme() {
        "ldaps" | "ldap" => {}
        other => {
            return Err(Error::ConfigError(format!(
                "unsupported directory URL scheme `{other}`"
            )))
        }
    }
    let host = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| Error::ConfigError(format!("directory address `{address}` has no host")))?;
    let port = url.port().unwrap_or(match url.scheme() {
        "ldap" => 389,
        _ => DEFAULT_LDAPS_PORT,
    });

    Ok(format!("{}://{host}:{port}", url.scheme()))
}
