//! AES-256-GCM encryption and decryption of a single secret.
//!
//! **One key, one encryption.** Every call to [`encrypt`] draws a fresh key
//! and nonce from the OS CSPRNG, so a (key, nonce) pair is never reused.
//!
//! Decryption validates every component length before the cipher is touched,
//! and a tag mismatch fails atomically — no partial plaintext ever escapes.

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, OsRng},
    Aes256Gcm, KeyInit, Nonce,
};
use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

use common::protocol::WirePayload;

use crate::codec;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of an AES-GCM nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the GCM authentication tag.
pub const TAG_LEN: usize = 16;

/// Errors produced by the envelope layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// The key is the wrong length (must be [`KEY_LEN`] bytes).
    #[error("invalid key length: expected {KEY_LEN} bytes, got {0}")]
    InvalidKeyLength(usize),

    /// The decoded iv is the wrong length (must be [`NONCE_LEN`] bytes).
    #[error("invalid iv length: expected {NONCE_LEN} bytes, got {0}")]
    InvalidIvLength(usize),

    /// The decoded tag is the wrong length (must be [`TAG_LEN`] bytes).
    #[error("invalid tag length: expected {TAG_LEN} bytes, got {0}")]
    InvalidTagLength(usize),

    /// A payload component is not decodable base64.
    #[error("payload component is not valid base64")]
    InvalidEncoding,

    /// The decoded ciphertext is empty.
    #[error("ciphertext is empty")]
    EmptyCiphertext,

    /// There is nothing to encrypt.
    #[error("plaintext is empty")]
    EmptyPlaintext,

    /// Tag verification failed: tampered ciphertext, wrong key, or corrupted
    /// payload. Reported generically to all callers.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The AEAD rejected the encrypt operation (unreachable with a valid key
    /// and nonce).
    #[error("aead operation failed")]
    AeadFailure,

    /// The OS random source failed. Fatal — never retried.
    #[error("random source failure")]
    RngFailure,
}

impl From<CipherError> for common::StashError {
    fn from(e: CipherError) -> Self {
        match e {
            CipherError::AuthenticationFailed => common::StashError::AuthenticationFailed,
            CipherError::RngFailure => common::StashError::RngExhausted,
            CipherError::EmptyPlaintext => common::StashError::Input(e.to_string()),
            other => common::StashError::Validation(other.to_string()),
        }
    }
}

/// Fixed-size key buffer holding exactly [`KEY_LEN`] bytes.
///
/// The memory is overwritten with zeroes on drop, and `Debug` never prints
/// key material.
#[derive(Clone)]
pub struct SecretKey(Box<[u8; KEY_LEN]>);

impl SecretKey {
    /// Generate a fresh key from the OS CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::RngFailure`] if the random source fails.
    pub fn generate() -> Result<Self, CipherError> {
        let mut buf = Box::new([0u8; KEY_LEN]);
        OsRng
            .try_fill_bytes(&mut buf[..])
            .map_err(|_| CipherError::RngFailure)?;
        Ok(Self(buf))
    }

    /// Wrap existing key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyLength`] if `bytes` is not exactly
    /// [`KEY_LEN`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CipherError> {
        if bytes.len() != KEY_LEN {
            return Err(CipherError::InvalidKeyLength(bytes.len()));
        }
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material — not even in debug builds.
        f.write_str("SecretKey([REDACTED])")
    }
}

/// The tuple produced by [`encrypt`].
///
/// `key` is detached into the shareable token; `(iv, tag, ciphertext)` become
/// the server-stored wire payload.
#[derive(Debug)]
pub struct Envelope {
    /// Freshly generated encryption key.
    pub key: SecretKey,
    /// Raw nonce bytes.
    pub iv: [u8; NONCE_LEN],
    /// Detached authentication tag.
    pub tag: [u8; TAG_LEN],
    /// Ciphertext body, at least 1 byte.
    pub ciphertext: Vec<u8>,
}

/// Encrypt `plaintext` under a freshly generated key and nonce.
///
/// # Errors
///
/// Returns [`CipherError::EmptyPlaintext`] for empty input and
/// [`CipherError::RngFailure`] if the OS random source fails. Any other
/// failure is unreachable with a valid key and nonce.
pub fn encrypt(plaintext: &[u8]) -> Result<Envelope, CipherError> {
    if plaintext.is_empty() {
        return Err(CipherError::EmptyPlaintext);
    }

    let key = SecretKey::generate()?;

    let mut iv = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|_| CipherError::RngFailure)?;

    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CipherError::AeadFailure)?;

    // The aead crate appends the tag to the ciphertext; split it back off so
    // the envelope carries it detached.
    let mut combined = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|_| CipherError::AeadFailure)?;
    let tag_bytes = combined.split_off(combined.len() - TAG_LEN);
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&tag_bytes);

    Ok(Envelope {
        key,
        iv,
        tag,
        ciphertext: combined,
    })
}

/// Decrypt a wire payload with `key`.
///
/// Component lengths are checked before any cryptographic call: a payload
/// that merely has the right shape but wrong lengths never reaches the
/// cipher.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] before anything else if `key`
/// is not [`KEY_LEN`] bytes, the length-specific variants for mismatched
/// components, and [`CipherError::AuthenticationFailed`] when tag
/// verification fails — with no partial plaintext.
pub fn decrypt(payload: &WirePayload, key: &[u8]) -> Result<Zeroizing<Vec<u8>>, CipherError> {
    if key.len() != KEY_LEN {
        return Err(CipherError::InvalidKeyLength(key.len()));
    }

    let iv = codec::decode(&payload.iv).map_err(|_| CipherError::InvalidEncoding)?;
    if iv.len() != NONCE_LEN {
        return Err(CipherError::InvalidIvLength(iv.len()));
    }

    let tag = codec::decode(&payload.tag).map_err(|_| CipherError::InvalidEncoding)?;
    if tag.len() != TAG_LEN {
        return Err(CipherError::InvalidTagLength(tag.len()));
    }

    let ciphertext = codec::decode(&payload.ciphertext).map_err(|_| CipherError::InvalidEncoding)?;
    if ciphertext.is_empty() {
        return Err(CipherError::EmptyCiphertext);
    }

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CipherError::AeadFailure)?;

    // GCM authenticates ciphertext || tag as one unit; rejoin them for the
    // aead crate, which verifies the tag before releasing any plaintext.
    let mut combined = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    combined.extend_from_slice(&ciphertext);
    combined.extend_from_slice(&tag);

    let plaintext = cipher
        .decrypt(Nonce::from_slice(&iv), combined.as_ref())
        .map_err(|_| CipherError::AuthenticationFailed)?;

    Ok(Zeroizing::new(plaintext))
}
