//! Core library for the `stash` one-time-secret client.
//!
//! A secret travels through these layers, leaves first:
//!
//! ```text
//! plaintext ──► crypto::envelope (AES-256-GCM) ──► payload (wire JSON)
//!                                                      │
//!                                 net (retries, backoff, cancellation)
//!                                                      │
//!                                         api ──► stash backend
//! ```
//!
//! and symmetrically back: `token` parses the shareable `id:key` token, `api`
//! fetches the wire payload, `payload` validates it byte-for-byte, and
//! `crypto::envelope` refuses to decrypt anything that has not already passed
//! structural validation.
//!
//! Key material and plaintext only exist in zeroize-on-drop buffers; see
//! [`crypto::envelope::SecretKey`].

pub mod api;
pub mod codec;
pub mod crypto;
pub mod net;
pub mod payload;
pub mod token;

pub use api::StashApi;
pub use crypto::envelope::{Envelope, SecretKey, KEY_LEN, NONCE_LEN, TAG_LEN};
pub use net::retry::RetryPolicy;
