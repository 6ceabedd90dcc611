//! Error types for token verification and role fetching.
//!
//! Neither error ever reaches an HTTP client. The guard collapses every
//! [`TokenError`] into a redirect to the login page, and the role resolver
//! collapses every [`FetchError`] into an empty cache. The variants exist so
//! the logs can say what actually went wrong.

use thiserror::Error;

/// Why an access token was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// No cookie, or an empty one.
    #[error("access token missing")]
    Missing,

    /// Signature was valid but `exp` is in the past.
    #[error("access token expired")]
    Expired,

    /// Signature does not match the shared secret.
    #[error("access token signature mismatch")]
    InvalidSignature,

    /// Anything else: bad structure, unsupported algorithm, missing or
    /// mistyped claims, or an error kind the verifier does not recognise.
    #[error("access token malformed: {0}")]
    Malformed(String),
}

/// Failure while fetching the user's role status from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read.
    #[error("role check request failed: {0}")]
    Request(String),

    /// The backend answered with a non-2xx status.
    #[error("role check returned status {0}")]
    Status(u16),

    /// The body was not a valid user status document.
    #[error("role check response invalid: {0}")]
    Parse(String),
}
