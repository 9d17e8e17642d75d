//! Length-aware base64url codec.
//!
//! Encoding always emits unpadded URL-safe text. Decoding additionally
//! accepts standard-alphabet base64, padded or not, by normalising the input
//! before handing it to the engine — tokens minted by older clients used the
//! standard alphabet.
//!
//! [`decoded_len`] computes the decoded byte count from the encoded length
//! alone, without allocating, so callers can reject a key of the wrong length
//! before any decode is attempted.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use thiserror::Error;

/// Errors produced by the codec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The encoded length cannot correspond to any byte sequence.
    #[error("encoded length {0} is not a valid base64 length")]
    InvalidLength(usize),

    /// The input contains characters outside the accepted alphabets.
    #[error("input contains characters outside the base64 alphabet")]
    InvalidCharacter,
}

/// Compute the decoded byte length of `encoded` without decoding it.
///
/// Padded input (contains `=`) must be a multiple of 4 characters long and
/// yields `len / 4 * 3 - pad_count`. Unpadded input yields
/// `(len + pad_needed) * 3 / 4 - pad_needed` where `pad_needed` completes the
/// final quantum.
///
/// # Errors
///
/// Returns [`CodecError::InvalidLength`] for padded input whose length is not
/// a multiple of 4, and [`CodecError::InvalidCharacter`] for more than two
/// padding characters.
pub fn decoded_len(encoded: &str) -> Result<usize, CodecError> {
    let len = encoded.len();
    if encoded.contains('=') {
        if len % 4 != 0 {
            return Err(CodecError::InvalidLength(len));
        }
        let pad_count = encoded.bytes().rev().take_while(|&b| b == b'=').count();
        if pad_count > 2 {
            return Err(CodecError::InvalidCharacter);
        }
        Ok(len / 4 * 3 - pad_count)
    } else {
        let pad_needed = (4 - len % 4) % 4;
        Ok((len + pad_needed) * 3 / 4 - pad_needed)
    }
}

/// Returns `true` if every character of `input` is acceptable in an encoded
/// key: the standard and URL-safe alphabets plus padding.
pub fn is_valid_alphabet(input: &str) -> bool {
    !input.is_empty()
        && input
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=' | b'-' | b'_'))
}

/// Encode `data` as unpadded base64url text.
pub fn encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decode base64url or standard base64 text, padded or unpadded.
///
/// # Errors
///
/// Returns [`CodecError::InvalidLength`] if a padded input is not a multiple
/// of 4 characters, and [`CodecError::InvalidCharacter`] for any character
/// outside the accepted alphabets (including `=` before the end).
pub fn decode(input: &str) -> Result<Vec<u8>, CodecError> {
    let stripped = if input.contains('=') {
        if input.len() % 4 != 0 {
            return Err(CodecError::InvalidLength(input.len()));
        }
        let stripped = input.trim_end_matches('=');
        if stripped.contains('=') {
            return Err(CodecError::InvalidCharacter);
        }
        stripped
    } else {
        input
    };

    // Normalise the standard alphabet to URL-safe before decoding.
    let normalised: String = stripped
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();

    URL_SAFE_NO_PAD.decode(normalised).map_err(|e| match e {
        base64::DecodeError::InvalidLength(n) => CodecError::InvalidLength(n),
        _ => CodecError::InvalidCharacter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoded_len_padded() {
        assert_eq!(decoded_len("QQ=="), Ok(1));
        assert_eq!(decoded_len("QUE="), Ok(2));
        assert_eq!(decoded_len("QUJDRA=="), Ok(4));
    }

    #[test]
    fn decoded_len_padded_rejects_non_quantum_length() {
        assert_eq!(decoded_len("QQ="), Err(CodecError::InvalidLength(3)));
        assert_eq!(decoded_len("QQQQQ=="), Err(CodecError::InvalidLength(7)));
    }

    #[test]
    fn decoded_len_rejects_excess_padding() {
        assert_eq!(decoded_len("===="), Err(CodecError::InvalidCharacter));
        assert_eq!(decoded_len("QRST===="), Err(CodecError::InvalidCharacter));
    }

    #[test]
    fn decoded_len_unpadded() {
        assert_eq!(decoded_len(""), Ok(0));
        assert_eq!(decoded_len("QQ"), Ok(1));
        assert_eq!(decoded_len("QUE"), Ok(2));
        assert_eq!(decoded_len("QUJD"), Ok(3));
    }

    #[test]
    fn decoded_len_key_sized_strings() {
        // A 32-byte key encodes to 43 unpadded characters.
        assert_eq!(decoded_len(&"A".repeat(43)), Ok(32));
        assert_eq!(decoded_len(&"A".repeat(42)), Ok(31));
        assert_eq!(decoded_len(&"A".repeat(44)), Ok(33));
    }

    #[test]
    fn encode_is_unpadded_url_safe() {
        let encoded = encode(&[0xfb, 0xef, 0xbe]);
        assert_eq!(encoded, "----");
        assert!(!encode(b"A").contains('='));
    }

    #[test]
    fn decode_inverts_encode() {
        let data: Vec<u8> = (0u8..=255).collect();
        let encoded = encode(&data);
        assert_eq!(decoded_len(&encoded), Ok(data.len()));
        assert_eq!(decode(&encoded).unwrap(), data);
    }

    #[test]
    fn decode_accepts_standard_alphabet() {
        assert_eq!(decode("++++").unwrap(), vec![0xfb, 0xef, 0xbe]);
        assert_eq!(decode("----").unwrap(), vec![0xfb, 0xef, 0xbe]);
    }

    #[test]
    fn decode_accepts_padded_form() {
        assert_eq!(decode("QQ==").unwrap(), b"A");
        assert_eq!(decode("++A=").unwrap(), vec![0xfb, 0xe0]);
    }

    #[test]
    fn decode_rejects_bad_padding() {
        assert_eq!(decode("QQ="), Err(CodecError::InvalidLength(3)));
        assert_eq!(decode("Q=Q="), Err(CodecError::InvalidCharacter));
    }

    #[test]
    fn decode_rejects_foreign_characters() {
        assert_eq!(decode("abc!"), Err(CodecError::InvalidCharacter));
        assert_eq!(decode("ab c"), Err(CodecError::InvalidCharacter));
    }

    #[test]
    fn alphabet_check() {
        assert!(is_valid_alphabet("AZaz09+/=-_"));
        assert!(!is_valid_alphabet(""));
        assert!(!is_valid_alphabet("abc!"));
        assert!(!is_valid_alphabet("ab c"));
    }
}
