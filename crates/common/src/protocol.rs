//! Request and response types exchanged with the stash backend.
//!
//! These types are serialised as JSON over the backend HTTP API:
//! `POST /enstash`, `GET /destash/:id`, `DELETE /unstash/:id`.

use serde::{Deserialize, Serialize};

/// Maximum plaintext secret size accepted by the client, in bytes.
///
/// Enforced at the ingestion boundary, before any encryption or network call.
pub const MAX_SECRET_LEN: usize = 4096;

/// Maximum serialised wire-payload size, in bytes.
///
/// Enforced locally on both the outbound body and inbound response bodies so
/// an oversized payload fails fast instead of round-tripping to the backend.
pub const MAX_WIRE_LEN: usize = 10240;

// ---------------------------------------------------------------------------
// Wire payload
// ---------------------------------------------------------------------------

/// The server-stored ciphertext bundle.
///
/// Request body for `POST /enstash` and response body for `GET /destash/:id`.
/// Each field is an unpadded base64url string; decoded lengths are 12 bytes
/// (`iv`), 16 bytes (`tag`), and at least 1 byte (`ciphertext`). Field order
/// is stable (`iv`, `tag`, `ciphertext`) for deterministic output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePayload {
    /// Base64url-encoded 12-byte AES-GCM nonce.
    pub iv: String,
    /// Base64url-encoded 16-byte authentication tag.
    pub tag: String,
    /// Base64url-encoded ciphertext, at least 1 byte decoded.
    pub ciphertext: String,
}

// ---------------------------------------------------------------------------
// Store / delete responses
// ---------------------------------------------------------------------------

/// Successful response body for `POST /enstash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreResponse {
    /// Backend-minted v4 UUID identifying the stored secret.
    pub id: String,
}

/// Successful response body for `DELETE /unstash/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// The id of the deleted secret, echoed back.
    pub id: String,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Error response body returned by the backend on non-2xx statuses.
///
/// On HTTP 410 the `error` value distinguishes an expired secret
/// (`"Expired"`) from one that was already claimed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error description.
    pub error: String,
}
