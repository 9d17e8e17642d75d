//! Common error types shared across crates.

use thiserror::Error;

/// Top-level client error type.
///
/// Variants map to process exit codes returned to scripted callers:
/// - success → 0
/// - [`StashError::Remote`] / [`StashError::Internal`] / [`StashError::RngExhausted`] → 1
/// - [`StashError::Input`] / [`StashError::Validation`] → 2
/// - [`StashError::NotFound`] → 3
/// - [`StashError::Expired`] → 4
/// - [`StashError::Network`] / [`StashError::Cancelled`] → 5
/// - [`StashError::AuthenticationFailed`] → 6
#[derive(Debug, Error)]
pub enum StashError {
    /// The secret or token supplied by the user is malformed — empty,
    /// oversized, whitespace-only, or not matching the token grammar.
    #[error("invalid input: {0}")]
    Input(String),

    /// A payload failed structural validation — wrong component length,
    /// wrong encoding, non-JSON body, missing or mistyped field.
    #[error("invalid payload: {0}")]
    Validation(String),

    /// Tag verification failed on decrypt. Reported generically: a tampered
    /// ciphertext, a wrong key, and a corrupted payload are indistinguishable.
    #[error("decryption failed: the token does not match the stored secret")]
    AuthenticationFailed,

    /// The backend has no secret under this id (HTTP 404).
    #[error("secret not found")]
    NotFound,

    /// The secret expired or was already claimed (HTTP 410).
    #[error("{0}")]
    Expired(String),

    /// A transient network fault persisted through all retries, the attempt
    /// timed out, or the request could not be issued at all.
    #[error("network failure: {0}")]
    Network(String),

    /// The backend answered with a status the client has no mapping for.
    #[error("HTTP {status} after {attempts} attempts")]
    Remote { status: u16, attempts: u32 },

    /// The OS random source failed. Fatal — never retried.
    #[error("random source unavailable")]
    RngExhausted,

    /// The operation was aborted by the caller or by an interrupt.
    #[error("operation cancelled")]
    Cancelled,

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StashError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            StashError::Input(_) | StashError::Validation(_) => 2,
            StashError::NotFound => 3,
            StashError::Expired(_) => 4,
            StashError::Network(_) | StashError::Cancelled => 5,
            StashError::AuthenticationFailed => 6,
            StashError::Remote { .. } | StashError::RngExhausted | StashError::Internal(_) => 1,
        }
    }
}
