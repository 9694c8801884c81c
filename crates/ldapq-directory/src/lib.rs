//! Active Directory record lookup over LDAPS.
//!
//! This crate binds to a directory server with a `username + suffix` principal, fetches the
//! single user entry matching a `sAMAccountName`, and derives group, organizational unit and
//! name fields from it.

#![deny(missing_docs)]

mod client;
mod config;
pub mod dn;
mod filter;
mod record;

pub use client::{DirectoryClient, DirectorySession, LdapEntry};
pub use config::{
    DirectoryConfig, DEFAULT_CONNECTION_TIMEOUT_SECS, DEFAULT_LDAPS_PORT,
    DEFAULT_OPERATION_TIMEOUT_SECS,
};
pub use dn::DistinguishedNameError;
pub use filter::account_filter;
pub use record::{DirectoryRecord, CN, DISTINGUISHED_NAME, MEMBER_OF, SAM_ACCOUNT_NAME};

pub use ldapq_core::{BindCredentials, Error, ErrorKind};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = ldapq_core::Result<T>;
