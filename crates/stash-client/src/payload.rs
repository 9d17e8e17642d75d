//! Wire payload serialisation and validation.
//!
//! The backend stores an opaque `{iv, tag, ciphertext}` JSON object. This
//! module is the only place that turns that text into a [`WirePayload`], and
//! it validates shape, field types, encoding, and exact decoded lengths
//! **before** anything reaches the cipher — a payload with the right shape
//! but wrong lengths must never make it to a cryptographic call.

use serde_json::Value;
use thiserror::Error;

use common::protocol::{WirePayload, MAX_WIRE_LEN};

use crate::codec;
use crate::crypto::envelope::{Envelope, NONCE_LEN, TAG_LEN};

/// Errors produced while encoding or decoding a wire payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    /// The text is not JSON at all.
    #[error("payload is not valid JSON")]
    NotJson,

    /// The JSON value is not an object.
    #[error("payload is not a JSON object")]
    NotAnObject,

    /// A required field is absent.
    #[error("payload is missing required field '{0}'")]
    MissingField(&'static str),

    /// A required field is present but not a string.
    #[error("payload field '{0}' is not a string")]
    WrongType(&'static str),

    /// A field is not decodable base64url.
    #[error("payload field '{0}' is not valid base64url")]
    InvalidEncoding(&'static str),

    /// A field decodes to the wrong number of bytes.
    #[error("payload field '{field}' decodes to {got} bytes, expected {expected}")]
    InvalidFieldLength {
        field: &'static str,
        expected: usize,
        got: usize,
    },

    /// The ciphertext field decodes to zero bytes.
    #[error("payload ciphertext is empty")]
    EmptyCiphertext,

    /// The serialised payload exceeds [`MAX_WIRE_LEN`] bytes.
    #[error("serialised payload is {got} bytes, limit is {MAX_WIRE_LEN}")]
    TooLarge { got: usize },
}

impl From<PayloadError> for common::StashError {
    fn from(e: PayloadError) -> Self {
        common::StashError::Validation(e.to_string())
    }
}

/// Build the wire form of an [`Envelope`], leaving the key behind.
pub fn from_envelope(envelope: &Envelope) -> WirePayload {
    WirePayload {
        iv: codec::encode(&envelope.iv),
        tag: codec::encode(&envelope.tag),
        ciphertext: codec::encode(&envelope.ciphertext),
    }
}

/// Serialise a payload to its canonical JSON text.
///
/// # Errors
///
/// Returns [`PayloadError::TooLarge`] if the serialised text exceeds
/// [`MAX_WIRE_LEN`] bytes — rejected locally so an oversized secret fails
/// fast instead of round-tripping to the backend.
pub fn encode(payload: &WirePayload) -> Result<String, PayloadError> {
    let text = serde_json::to_string(payload).map_err(|_| PayloadError::NotJson)?;
    if text.len() > MAX_WIRE_LEN {
        return Err(PayloadError::TooLarge { got: text.len() });
    }
    Ok(text)
}

/// Parse and validate wire-payload text.
///
/// Field presence and type are checked explicitly so each failure mode gets
/// its own diagnostic, then decoded lengths are verified via the
/// length-aware codec before any decode-and-store.
///
/// # Errors
///
/// Returns the [`PayloadError`] of the first stage that fails.
pub fn decode(text: &str) -> Result<WirePayload, PayloadError> {
    if text.len() > MAX_WIRE_LEN {
        return Err(PayloadError::TooLarge { got: text.len() });
    }

    let value: Value = serde_json::from_str(text).map_err(|_| PayloadError::NotJson)?;
    let object = value.as_object().ok_or(PayloadError::NotAnObject)?;

    let iv = require_string(object, "iv")?;
    let tag = require_string(object, "tag")?;
    let ciphertext = require_string(object, "ciphertext")?;

    check_decoded_len(iv, "iv", NONCE_LEN)?;
    check_decoded_len(tag, "tag", TAG_LEN)?;

    match codec::decoded_len(ciphertext) {
        Ok(0) => return Err(PayloadError::EmptyCiphertext),
        Ok(_) => {}
        Err(_) => return Err(PayloadError::InvalidEncoding("ciphertext")),
    }
    // Residual malformed encoding (bad characters, non-canonical trailing
    // bits) is caught by an actual decode of each component.
    for (field, encoded) in [("iv", iv), ("tag", tag), ("ciphertext", ciphertext)] {
        codec::decode(encoded).map_err(|_| PayloadError::InvalidEncoding(field))?;
    }

    Ok(WirePayload {
        iv: iv.to_owned(),
        tag: tag.to_owned(),
        ciphertext: ciphertext.to_owned(),
    })
}

fn require_string<'a>(
    object: &'a serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, PayloadError> {
    let value = object.get(field).ok_or(PayloadError::MissingField(field))?;
    value.as_str().ok_or(PayloadError::WrongType(field))
}

fn check_decoded_len(
    encoded: &str,
    field: &'static str,
    expected: usize,
) -> Result<(), PayloadError> {
    match codec::decoded_len(encoded) {
        Ok(got) if got == expected => Ok(()),
        Ok(got) => Err(PayloadError::InvalidFieldLength {
            field,
            expected,
            got,
        }),
        Err(_) => Err(PayloadError::InvalidEncoding(field)),
    }
}
