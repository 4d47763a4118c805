//! Error handling for credo

use thiserror::Error;

/// Main error type for credo operations
#[derive(Error, Debug)]
pub enum CredoError {
    /// The trust store file exists but cannot be decrypted or parsed under
    /// the supplied password. Fatal to that store instance.
    #[error("trust store is corrupt or the password is wrong: {0}")]
    TrustStoreCorrupt(String),

    #[error("trust store has not been initialized")]
    NotInitialized,

    #[error("certificate could not be parsed: {0}")]
    CertificateParse(String),

    /// Persisting the trust store failed; the in-memory change was rolled
    /// back, memory and disk stay consistent.
    #[error("trust store could not be persisted: {0}")]
    Persist(String),

    /// The authentication endpoint definitively rejected the credentials
    /// (HTTP 401). Every other non-success outcome is a soft failure.
    #[error("credentials were rejected by the authentication endpoint")]
    NotAuthorized,

    #[error("connection error: {0}")]
    Connection(#[from] reqwest::Error),

    #[error("malformed credential: {0}")]
    MalformedCredential(String),

    #[error("payload is not valid structured data: {0}")]
    PayloadParse(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for credo operations
pub type Result<T> = std::result::Result<T, CredoError>;
