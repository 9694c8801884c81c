//! # ldapq-core
//!
//! Shared types for the `ldapq` directory client.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and error-kind classification
//! - [`credentials`] - Bind credentials with a secret password

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod credentials;
pub mod error;

// Re-export commonly used types
pub use credentials::BindCredentials;
pub use error::{Error, ErrorKind, Result};
