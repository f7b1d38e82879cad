//! Base64url helpers.
//!
//! Every byte field on the wire uses the URL-safe alphabet with padding.

use crate::MessageError;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use shared_crypto::PublicKey;

/// Encode bytes as padded base64url.
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE.encode(bytes)
}

/// Decode a padded base64url field, naming the field on failure.
pub fn decode(field: &'static str, value: &str) -> Result<Vec<u8>, MessageError> {
    URL_SAFE
        .decode(value)
        .map_err(|_| MessageError::InvalidBase64 { field })
}

/// Encode a public key the way it appears in `sender` fields.
pub fn encode_key(key: &PublicKey) -> String {
    encode(key.as_bytes())
}

/// Decode a `sender`-style field into a public key.
pub fn decode_key(field: &'static str, value: &str) -> Result<PublicKey, MessageError> {
    let bytes = decode(field, value)?;
    PublicKey::from_slice(&bytes).map_err(|_| MessageError::InvalidSender)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_crypto::KeyPair;

    #[test]
    fn test_url_safe_alphabet() {
        let encoded = encode(&[0xfb, 0xff]);
        assert_eq!(encoded, "-_8=");
        assert_eq!(decode("data", &encoded).unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn test_decode_names_field() {
        assert_eq!(
            decode("signature", "not base64!"),
            Err(MessageError::InvalidBase64 { field: "signature" })
        );
    }

    #[test]
    fn test_key_roundtrip() {
        let key = KeyPair::generate().public_key();
        assert_eq!(decode_key("sender", &encode_key(&key)).unwrap(), key);
    }

    #[test]
    fn test_short_key_rejected() {
        let value = encode(&[1u8; 16]);
        assert_eq!(
            decode_key("sender", &value),
            Err(MessageError::InvalidSender)
        );
    }
}
