//! AES-256-GCM envelope encryption primitives.
//!
//! This module is intentionally free of HTTP and protocol dependencies.
//! It provides the encrypt/decrypt pair used by the stash commands.
//!
//! # Envelope shape
//!
//! Encryption produces `(key, iv, tag, ciphertext)`: a fresh 32-byte key and
//! 12-byte nonce per call, a 16-byte detached authentication tag, and the
//! ciphertext body. The key is detached into the shareable token; the other
//! three components travel as the server-stored wire payload.

pub mod envelope;

pub use envelope::{Envelope, SecretKey, KEY_LEN, NONCE_LEN, TAG_LEN};
