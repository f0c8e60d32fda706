//! Error types for the core crate.

use thiserror::Error;

/// Core error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Service name does not match `[a-zA-Z.]+`.
    #[error("Invalid service name: '{0}'")]
    InvalidServiceName(String),

    /// Value is not a usable hostname.
    #[error("Invalid hostname: {0}")]
    InvalidHostname(String),

    /// Fingerprint value is not hex.
    #[error("Bad hex string: '{0}'")]
    InvalidFingerprint(String),

    /// Fingerprint query is too short or too long for a key lookup.
    #[error("Invalid fingerprint query: {0}")]
    InvalidFingerprintQuery(String),

    /// Keybase username failed validation.
    #[error("Bad keybase username '{0}': must be 2-16 letters, digits or single underscores")]
    InvalidUsername(String),

    /// No value was given for a service that requires one.
    #[error("Bad assertion, no value given (key={0})")]
    EmptyValue(String),

    /// Service whose proofs are not checked remotely.
    #[error("Service '{0}' cannot hold a remote proof")]
    NotRemoteService(String),

    /// Unknown numeric proof state.
    #[error("Invalid proof state code: {0}")]
    InvalidProofState(u8),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

/// Result type alias for CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;
