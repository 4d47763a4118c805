//! credo - an embeddable HTTP(S) client with persistent trust and cached
//! authentication
//!
//! This crate maintains a file-backed trust store of server certificates and
//! layers pluggable authentication protocols (Basic, Cookie) over plain
//! request execution, caching the derived credential artifact so repeated
//! requests do not re-authenticate.

pub mod auth;
pub mod error;
pub mod http;
pub mod logging;
pub mod session;
pub mod trust;
pub mod utils;

pub use auth::{AuthOutcome, AuthProtocol, AuthScheme, Credential};
pub use error::{CredoError, Result};
pub use http::{execute, HttpMethod, Request, Response};
pub use session::Session;
pub use trust::TrustStore;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
