//! Directory client implementation.

use crate::{config::DirectoryConfig, filter::account_filter, record::DirectoryRecord, Result};
use async_trait::async_trait;
use ldap3::{
    DerefAliases, LdapConnAsync, LdapConnSettings, LdapError, Scope, SearchEntry, SearchOptions,
};
use ldapq_core::{BindCredentials, Error};
use native_tls::{Certificate, TlsConnector};
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, instrument};

/// LDAP result code for a rejected simple bind.
const INVALID_CREDENTIALS_RC: u32 = 49;
/// LDAP result code sent by a server too busy to process the request.
const BUSY_RC: u32 = 51;
/// LDAP result code sent by a server that is shutting down or not serving.
const UNAVAILABLE_RC: u32 = 52;

/// A single entry returned by a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapEntry {
    /// Distinguished name of the entry.
    pub dn: String,
    /// Attribute map (values preserve the order returned by the server).
    pub attributes: HashMap<String, Vec<String>>,
}

impl From<LdapEntry> for DirectoryRecord {
    fn from(entry: LdapEntry) -> Self {
        DirectoryRecord::new(entry.attributes)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub(crate) trait LdapSession: Send {
    async fn simple_bind(&mut self, principal: &str, password: &str) -> Result<()>;
    async fn search(&mut self, base_dn: &str, filter: &str) -> Result<Vec<LdapEntry>>;
    async fn unbind(&mut self) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub(crate) trait LdapConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn LdapSession>>;
}

/// Directory client with pluggable LDAP backend.
///
/// The client itself holds no connection. [`DirectoryClient::connect`] and
/// [`DirectoryClient::authenticate`] open a [`DirectorySession`] that owns one; the one-shot
/// [`DirectoryClient::fetch_record`] opens and closes its own.
pub struct DirectoryClient {
    config: Arc<DirectoryConfig>,
    connector: Box<dyn LdapConnector>,
}

impl DirectoryClient {
    /// Creates a directory client that uses the real LDAP connector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the configuration fails validation.
    pub fn new(config: DirectoryConfig) -> Result<Self> {
        config.check()?;
        let config = Arc::new(config);
        let connector: Box<dyn LdapConnector> = Box::new(RealLdapConnector::new(config.clone()));
        Ok(Self { config, connector })
    }

    #[cfg(test)]
    #[must_use]
    pub(crate) fn with_connector(config: DirectoryConfig, connector: Box<dyn LdapConnector>) -> Self {
        Self {
            config: Arc::new(config),
            connector,
        }
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Opens an unauthenticated session to the directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] or [`Error::Timeout`] if the server cannot be reached.
    #[instrument(skip(self), fields(url = %self.config.url()))]
    pub async fn connect(&self) -> Result<DirectorySession> {
        let session = self.connector.connect().await?;
        debug!("connected");
        Ok(DirectorySession {
            config: self.config.clone(),
            inner: session,
        })
    }

    /// Opens a session and binds as `credentials.username + account suffix`.
    ///
    /// On bind failure the connection is closed before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] when the bind is rejected, or a network-kind error
    /// when the server cannot be reached.
    #[instrument(skip(self, credentials), fields(username = %credentials.username()))]
    pub async fn authenticate(&self, credentials: &BindCredentials) -> Result<DirectorySession> {
        ensure_password(credentials)?;

        let mut session = self.connect().await?;
        if let Err(err) = session.bind(credentials).await {
            if let Err(close_err) = session.close().await {
                debug!("closing after failed bind: {close_err}");
            }
            return Err(err);
        }
        Ok(session)
    }

    /// Connects, binds, fetches the record of `account_name` and closes the connection.
    ///
    /// A failure to close after the lookup is logged and does not discard the result.
    ///
    /// # Errors
    ///
    /// Any error from [`DirectoryClient::authenticate`] or [`DirectorySession::full_record`].
    pub async fn fetch_record(
        &self,
        credentials: &BindCredentials,
        account_name: &str,
    ) -> Result<DirectoryRecord> {
        let mut session = self.authenticate(credentials).await?;
        let record = session.full_record(account_name).await;
        if let Err(close_err) = session.close().await {
            debug!("closing after lookup: {close_err}");
        }
        record
    }
}

/// An open connection to the directory.
///
/// Dropping the session releases the connection; [`DirectorySession::close`] additionally sends
/// an unbind request.
pub struct DirectorySession {
    config: Arc<DirectoryConfig>,
    inner: Box<dyn LdapSession>,
}

impl DirectorySession {
    /// Binds as `credentials.username + account suffix`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] when the bind is rejected or the password is empty.
    pub async fn bind(&mut self, credentials: &BindCredentials) -> Result<()> {
        ensure_password(credentials)?;
        let principal = credentials.principal(self.config.account_suffix());
        self.inner
            .simple_bind(&principal, credentials.password())
            .await?;
        debug!(%principal, "bound");
        Ok(())
    }

    /// Returns every entry below `base_dn` that matches `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SearchRejected`] if the server refuses the search.
    pub async fn search(&mut self, base_dn: &str, filter: &str) -> Result<Vec<LdapEntry>> {
        let entries = self.inner.search(base_dn, filter).await?;
        debug!(base_dn, filter, count = entries.len(), "search complete");
        Ok(entries)
    }

    /// Returns the only entry below `base_dn` that matches `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for zero entries and [`Error::Ambiguous`] for more than one.
    pub async fn search_one(&mut self, base_dn: &str, filter: &str) -> Result<LdapEntry> {
        let mut entries = self.search(base_dn, filter).await?;
        match entries.len() {
            1 => Ok(entries.remove(0)),
            0 => Err(Error::NotFound {
                filter: filter.to_string(),
            }),
            count => Err(Error::Ambiguous {
                filter: filter.to_string(),
                count,
            }),
        }
    }

    /// Fetches the full record of the user whose `sAMAccountName` is `account_name`.
    ///
    /// # Errors
    ///
    /// Same as [`DirectorySession::search_one`].
    pub async fn full_record(&mut self, account_name: &str) -> Result<DirectoryRecord> {
        let filter = account_filter(account_name);
        let base_dn = self.config.base_dn().to_string();
        let entry = self.search_one(&base_dn, &filter).await?;
        Ok(entry.into())
    }

    /// Unbinds and closes the connection.
    ///
    /// # Errors
    ///
    /// Returns a network-kind error if the unbind could not be sent.
    pub async fn close(mut self) -> Result<()> {
        self.inner.unbind().await
    }
}

fn ensure_password(credentials: &BindCredentials) -> Result<()> {
    // An empty password turns a simple bind into an unauthenticated one, which servers accept.
    if credentials.password().is_empty() {
        return Err(Error::InvalidCredentials(format!(
            "empty password for `{}`",
            credentials.username()
        )));
    }
    Ok(())
}

/// Real LDAP connector backed by `ldap3`.
pub(crate) struct RealLdapConnector {
    config: Arc<DirectoryConfig>,
}

impl RealLdapConnector {
    pub(crate) fn new(config: Arc<DirectoryConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LdapConnector for RealLdapConnector {
    async fn connect(&self) -> Result<Box<dyn LdapSession>> {
        let settings = build_ldap_settings(&self.config)?;
        let (conn, ldap) = timeout(
            self.config.connection_timeout(),
            LdapConnAsync::with_settings(settings, self.config.url()),
        )
        .await
        .map_err(|_| Error::Timeout(format!("connecting to {}", self.config.url())))?
        .map_err(map_transport_error)?;
        ldap3::drive!(conn);
        Ok(Box::new(RealLdapSession {
            inner: ldap,
            operation_timeout: self.config.operation_timeout(),
        }))
    }
}

struct RealLdapSession {
    inner: ldap3::Ldap,
    operation_timeout: Duration,
}

#[async_trait]
impl LdapSession for RealLdapSession {
    async fn simple_bind(&mut self, principal: &str, password: &str) -> Result<()> {
        let result = timeout(
            self.operation_timeout,
            self.inner.simple_bind(principal, password),
        )
        .await
        .map_err(|_| Error::Timeout("bind".to_string()))?
        .map_err(map_transport_error)?;

        bind_outcome(principal, result.rc, &result.text)
    }

    async fn search(&mut self, base_dn: &str, filter: &str) -> Result<Vec<LdapEntry>> {
        let options = SearchOptions::new()
            .deref(DerefAliases::Never)
            .sizelimit(0)
            .timelimit(0)
            .typesonly(false);
        let result = timeout(
            self.operation_timeout,
            self.inner.with_search_options(options).search(
                base_dn,
                Scope::Subtree,
                filter,
                Vec::<&str>::new(),
            ),
        )
        .await
        .map_err(|_| Error::Timeout("search".to_string()))?
        .map_err(map_transport_error)?;

        let (entries, _) = result.success().map_err(map_search_error)?;
        Ok(entries
            .into_iter()
            .filter(|entry| !entry.is_ref() && !entry.is_intermediate())
            .map(SearchEntry::construct)
            .map(entry_from_search)
            .collect())
    }

    async fn unbind(&mut self) -> Result<()> {
        timeout(self.operation_timeout, self.inner.unbind())
            .await
            .map_err(|_| Error::Timeout("unbind".to_string()))?
            .map_err(map_transport_error)
    }
}

/// Classifies a bind result code.
fn bind_outcome(principal: &str, rc: u32, text: &str) -> Result<()> {
    match rc {
        0 => Ok(()),
        INVALID_CREDENTIALS_RC => Err(Error::InvalidCredentials(format!(
            "bind as `{principal}` rejected: {text}"
        ))),
        BUSY_RC | UNAVAILABLE_RC => Err(Error::Network(format!(
            "server refused bind as `{principal}` with result code {rc}: {text}"
        ))),
        rc => Err(Error::InvalidCredentials(format!(
            "bind as `{principal}` failed with result code {rc}: {text}"
        ))),
    }
}

fn build_ldap_settings(config: &DirectoryConfig) -> Result<LdapConnSettings> {
    let mut settings = LdapConnSettings::new().set_conn_timeout(config.connection_timeout());

    if !config.tls_verify() {
        let connector = TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()
            .map_err(|err| {
                Error::ConfigError(format!("failed to construct TLS connector: {err}"))
            })?;
        settings = settings.set_connector(connector).set_no_tls_verify(true);
    } else if let Some(cert_path) = config.tls_ca_cert() {
        let pem = fs::read(cert_path).map_err(|err| {
            Error::ConfigError(format!(
                "failed to read CA certificate {}: {err}",
                cert_path.display()
            ))
        })?;
        let certificate = Certificate::from_pem(&pem)
            .map_err(|err| Error::ConfigError(format!("invalid CA certificate: {err}")))?;
        let connector = TlsConnector::builder()
            .add_root_certificate(certificate)
            .build()
            .map_err(|err| Error::ConfigError(format!("failed to load CA certificate: {err}")))?;
        settings = settings.set_connector(connector);
    }

    Ok(settings)
}

fn map_transport_error(err: LdapError) -> Error {
    match err {
        LdapError::Timeout { .. } => Error::Timeout(err.to_string()),
        other => Error::Network(other.to_string()),
    }
}

fn map_search_error(err: LdapError) -> Error {
    match err {
        LdapError::LdapResult { result } => Error::SearchRejected(format!(
            "result code {}: {}",
            result.rc, result.text
        )),
        other => map_transport_error(other),
    }
}

/// Flattens a search entry, folding binary-only attributes in as lossy UTF-8.
fn entry_from_search(entry: SearchEntry) -> LdapEntry {
    let mut attributes = entry.attrs;
    for (name, values) in entry.bin_attrs {
        attributes.entry(name).or_insert_with(|| {
            values
                .iter()
                .map(|value| String::from_utf8_lossy(value).into_owned())
                .collect()
        });
    }
    LdapEntry {
        dn: entry.dn,
        attributes,
    }
}
