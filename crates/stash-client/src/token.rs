//! Stash-token grammar: the shareable `"<uuid>:<base64url key>"` string.
//!
//! Parsing is staged so the cheapest check runs first and every failure mode
//! gets its own diagnostic: structure, UUID shape, key alphabet, then the
//! length-aware fast rejection ([`crate::codec::decoded_len`]) before any
//! decode is attempted.
//!
//! Tokens are emitted with an unpadded base64url key; padded and
//! standard-alphabet keys from older clients are accepted on parse.

use thiserror::Error;

use crate::codec;
use crate::crypto::envelope::{SecretKey, KEY_LEN};

/// Errors produced while parsing a stash token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The input is empty or whitespace-only.
    #[error("token is empty")]
    Empty,

    /// The input has no `:` separating id and key.
    #[error("token is missing the ':' separator between id and key")]
    MissingSeparator,

    /// The id part is not a canonical v4 UUID.
    #[error("token id is not a valid v4 UUID")]
    InvalidUuid,

    /// The key part is absent.
    #[error("token has no key after the ':' separator")]
    MissingKey,

    /// The key part contains characters outside the base64 alphabets.
    #[error("token key contains characters outside the base64 alphabet")]
    InvalidKeyAlphabet,

    /// The key part would not decode to exactly [`KEY_LEN`] bytes.
    /// Detected from the encoded length alone, before any decode.
    #[error("token key decodes to {got} bytes, expected {KEY_LEN}")]
    InvalidKeyLength { got: usize },

    /// The key part passed the length check but still failed to decode.
    #[error("token key is not valid base64")]
    InvalidKeyEncoding,
}

impl From<TokenError> for common::StashError {
    fn from(e: TokenError) -> Self {
        common::StashError::Input(e.to_string())
    }
}

/// A successfully parsed token: the backend id and the decryption key.
#[derive(Debug)]
pub struct ParsedToken {
    /// Lowercased canonical v4 UUID identifying the stored secret.
    pub id: String,
    /// The 32-byte decryption key.
    pub key: SecretKey,
}

/// Parse a stash token into its id and key.
///
/// # Errors
///
/// Returns the most specific [`TokenError`] for the first stage that fails;
/// see the variant docs for the order.
pub fn parse(input: &str) -> Result<ParsedToken, TokenError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TokenError::Empty);
    }

    let (id, key_part) = trimmed.split_once(':').ok_or(TokenError::MissingSeparator)?;

    if !validate_uuid(id) {
        return Err(TokenError::InvalidUuid);
    }
    if key_part.is_empty() {
        return Err(TokenError::MissingKey);
    }
    if !codec::is_valid_alphabet(key_part) {
        return Err(TokenError::InvalidKeyAlphabet);
    }

    // Fast rejection on encoded length alone — no allocation, no decode.
    match codec::decoded_len(key_part) {
        Ok(KEY_LEN) => {}
        Ok(got) => return Err(TokenError::InvalidKeyLength { got }),
        Err(_) => return Err(TokenError::InvalidKeyEncoding),
    }

    let key_bytes = codec::decode(key_part).map_err(|_| TokenError::InvalidKeyEncoding)?;
    let key = SecretKey::from_bytes(&key_bytes).map_err(|_| TokenError::InvalidKeyEncoding)?;

    Ok(ParsedToken {
        id: id.to_ascii_lowercase(),
        key,
    })
}

/// Render a shareable token from an id and key.
pub fn format(id: &str, key: &SecretKey) -> String {
    format!("{id}:{}", codec::encode(key.as_bytes()))
}

/// Pure predicate: is `input` a canonical 36-character hyphenated v4 UUID?
///
/// Case-insensitive; the version nibble must be `4` and the variant nibble
/// one of `8`, `9`, `a`, `b`.
pub fn validate_uuid(input: &str) -> bool {
    let bytes = input.as_bytes();
    if bytes.len() != 36 {
        return false;
    }
    for (i, &b) in bytes.iter().enumerate() {
        match i {
            8 | 13 | 18 | 23 => {
                if b != b'-' {
                    return false;
                }
            }
            14 => {
                if b != b'4' {
                    return false;
                }
            }
            19 => {
                if !matches!(b, b'8' | b'9' | b'a' | b'b' | b'A' | b'B') {
                    return false;
                }
            }
            _ => {
                if !b.is_ascii_hexdigit() {
                    return false;
                }
            }
        }
    }
    true
}

/// Extract the UUID from either a full token or a bare UUID.
///
/// Used by delete and lookup paths that do not need the key. Returns the
/// lowercased UUID, or `None` when the input matches neither shape.
pub fn extract_uuid(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if validate_uuid(trimmed) {
        return Some(trimmed.to_ascii_lowercase());
    }
    let (id, _) = trimmed.split_once(':')?;
    validate_uuid(id).then(|| id.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "a1b2c3d4-e5f6-4890-abcd-ef1234567890";

    /// 43 unpadded base64url characters decode to exactly 32 bytes.
    fn key_43() -> String {
        "A".repeat(43)
    }

    #[test]
    fn valid_token_parses() {
        let token = format!("{ID}:{}", key_43());
        let parsed = parse(&token).unwrap();
        assert_eq!(parsed.id, ID);
        assert_eq!(parsed.key.as_bytes(), &[0u8; 32]);
    }

    #[test]
    fn parse_round_trips_format() {
        let key = SecretKey::from_bytes(&[7u8; 32]).unwrap();
        let token = format(ID, &key);
        let parsed = parse(&token).unwrap();
        assert_eq!(parsed.key.as_bytes(), key.as_bytes());
    }

    #[test]
    fn uppercase_uuid_accepted_and_lowercased() {
        let token = format!("{}:{}", ID.to_ascii_uppercase(), key_43());
        assert_eq!(parse(&token).unwrap().id, ID);
    }

    #[test]
    fn padded_standard_key_accepted() {
        // 32 bytes in padded standard base64: 44 characters ending in '='.
        let encoded = {
            use base64::{engine::general_purpose::STANDARD, Engine as _};
            STANDARD.encode([0xfbu8; 32])
        };
        assert!(encoded.ends_with('='));
        let parsed = parse(&format!("{ID}:{encoded}")).unwrap();
        assert_eq!(parsed.key.as_bytes(), &[0xfbu8; 32]);
    }

    #[test]
    fn empty_input_rejected() {
        assert_eq!(parse("").unwrap_err(), TokenError::Empty);
        assert_eq!(parse("   \n").unwrap_err(), TokenError::Empty);
    }

    #[test]
    fn missing_separator_rejected() {
        assert_eq!(parse(ID).unwrap_err(), TokenError::MissingSeparator);
    }

    #[test]
    fn invalid_uuid_rejected() {
        let err = parse(&format!("not-a-uuid:{}", key_43())).unwrap_err();
        assert_eq!(err, TokenError::InvalidUuid);
    }

    #[test]
    fn missing_key_rejected() {
        assert_eq!(parse(&format!("{ID}:")).unwrap_err(), TokenError::MissingKey);
    }

    #[test]
    fn key_alphabet_rejected() {
        let err = parse(&format!("{ID}:{}!", "A".repeat(42))).unwrap_err();
        assert_eq!(err, TokenError::InvalidKeyAlphabet);
    }

    #[test]
    fn short_key_fails_with_length_error_before_decode() {
        // 42 characters decode to 31 bytes: the length-specific error fires,
        // not the decode-failure one — the fast path rejected it first.
        let err = parse(&format!("{ID}:{}", "A".repeat(42))).unwrap_err();
        assert_eq!(err, TokenError::InvalidKeyLength { got: 31 });
    }

    #[test]
    fn long_key_fails_with_length_error() {
        let err = parse(&format!("{ID}:{}", "A".repeat(44))).unwrap_err();
        assert_eq!(err, TokenError::InvalidKeyLength { got: 33 });
    }

    #[test]
    fn residual_decode_failure_has_distinct_error() {
        // 43 characters pass the length check, but a final symbol with
        // non-zero trailing bits is not canonical base64.
        let err = parse(&format!("{ID}:{}B", "A".repeat(42))).unwrap_err();
        assert_eq!(err, TokenError::InvalidKeyEncoding);
    }

    #[test]
    fn validate_uuid_accepts_canonical_v4() {
        assert!(validate_uuid("a1b2c3d4-e5f6-4890-abcd-ef1234567890"));
        assert!(validate_uuid("A1B2C3D4-E5F6-4890-ABCD-EF1234567890"));
        assert!(validate_uuid("00000000-0000-4000-8000-000000000000"));
    }

    #[test]
    fn validate_uuid_rejects_wrong_version() {
        // Version nibble must be 4.
        for v in ['1', '3', '5', '7'] {
            let s = format!("a1b2c3d4-e5f6-{v}890-abcd-ef1234567890");
            assert!(!validate_uuid(&s), "version {v} accepted");
        }
    }

    #[test]
    fn validate_uuid_rejects_wrong_variant() {
        // Variant nibble must be 8, 9, a, or b.
        for v in ['0', '7', 'c', 'f'] {
            let s = format!("a1b2c3d4-e5f6-4890-{v}bcd-ef1234567890");
            assert!(!validate_uuid(&s), "variant {v} accepted");
        }
    }

    #[test]
    fn validate_uuid_rejects_wrong_shape() {
        assert!(!validate_uuid(""));
        assert!(!validate_uuid("a1b2c3d4e5f64890abcdef1234567890"));
        assert!(!validate_uuid("a1b2c3d4-e5f6-4890-abcd-ef12345678901"));
        assert!(!validate_uuid("g1b2c3d4-e5f6-4890-abcd-ef1234567890"));
    }

    #[test]
    fn extract_uuid_from_bare_uuid() {
        assert_eq!(extract_uuid(ID).as_deref(), Some(ID));
        assert_eq!(
            extract_uuid(&ID.to_ascii_uppercase()).as_deref(),
            Some(ID)
        );
    }

    #[test]
    fn extract_uuid_from_full_token() {
        let token = format!("{ID}:{}", key_43());
        assert_eq!(extract_uuid(&token).as_deref(), Some(ID));
    }

    #[test]
    fn extract_uuid_rejects_junk() {
        assert_eq!(extract_uuid("neither"), None);
        assert_eq!(extract_uuid("bad-uuid:key"), None);
        assert_eq!(extract_uuid(""), None);
    }
}
