//! # Binary-Text Codec
//!
//! WebAuthn moves a lot of raw bytes around (challenges, user handles,
//! credential ids, signatures). JSON has no byte type, so every binary field
//! crosses the wire as a base64url token:
//!
//! - alphabet: standard base64 with `-` and `_` in place of `+` and `/`
//! - no `=` padding
//!
//! The server is trusted to emit valid tokens, but a bad token still comes
//! back as a [`CodecError`] instead of a panic.

use base64::prelude::*;
use thiserror::Error;

/// A text token could not be turned back into bytes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid base64url token: {0}")]
pub struct CodecError(#[from] base64::DecodeError);

/// Encode bytes as an unpadded base64url token
///
/// ## Example
/// ```
/// use passkey_ceremony_client::codec::encode;
///
/// assert_eq!(encode(&[0, 1, 2]), "AAEC");
/// assert_eq!(encode(&[0xfb, 0xff]), "-_8");
/// ```
pub fn encode(bytes: &[u8]) -> String {
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode a base64url token back into bytes
///
/// The padding the encoder stripped is restored from `text.len() % 4` before
/// decoding. Tokens that already carry their padding are accepted as well.
///
/// ## Errors
/// Returns [`CodecError`] when the token contains characters outside the
/// base64url alphabet or has a length no encoder could have produced.
pub fn decode(text: &str) -> Result<Vec<u8>, CodecError> {
    let unpadded = text.trim_end_matches('=');
    let pad_len = (4 - unpadded.len() % 4) % 4;

    let mut padded = String::with_capacity(unpadded.len() + pad_len);
    padded.push_str(unpadded);
    padded.extend(std::iter::repeat('=').take(pad_len));

    Ok(BASE64_URL_SAFE.decode(padded.as_bytes())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: usize) -> Vec<u8> {
        // Walk the whole byte range so both alphabet substitutions get hit
        (0..len).map(|i| (i * 37 + 251) as u8).collect()
    }

    #[test]
    fn decode_reverses_encode_across_padding_boundaries() {
        for len in [0, 1, 2, 3, 4, 17, 255] {
            let bytes = sample(len);
            let token = encode(&bytes);
            assert_eq!(decode(&token).unwrap(), bytes, "length {len}");
        }
    }

    #[test]
    fn encode_output_is_url_safe_and_unpadded() {
        for len in [1, 2, 3, 4, 17, 255] {
            let token = encode(&sample(len));
            assert!(!token.contains('+'), "{token}");
            assert!(!token.contains('/'), "{token}");
            assert!(!token.contains('='), "{token}");
        }
        assert_eq!(encode(&[0xfb, 0xff, 0xbf]), "-_-_");
    }

    #[test]
    fn decode_known_tokens() {
        assert_eq!(decode("AAEC").unwrap(), vec![0, 1, 2]);
        assert_eq!(decode("AQ").unwrap(), vec![1]);
        assert_eq!(decode("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn decode_accepts_padded_tokens() {
        assert_eq!(decode("AQ==").unwrap(), vec![1]);
        assert_eq!(decode("AQI=").unwrap(), vec![1, 2]);
    }

    #[test]
    fn decode_rejects_bad_tokens() {
        assert!(decode("AA+C").is_err());
        assert!(decode("A").is_err());
        assert!(decode("not base64!").is_err());
    }
}
