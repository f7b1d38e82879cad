//! # Field Hashing
//!
//! SHA-256 over a sequence of length-prefixed string fields. This is the
//! hash every server uses to derive message IDs (`[data, signature]`) and
//! consensus instance IDs (`["consensus", type, id, property]`), so it must
//! be reproducible byte-for-byte across implementations.

use crate::CryptoError;
use sha2::{Digest, Sha256};

/// SHA-256 output (256-bit).
pub type Hash = [u8; 32];

/// Hash the given fields.
///
/// Each field contributes its decimal UTF-8 byte length followed by its
/// bytes. Empty fields are rejected.
pub fn hash_fields(fields: &[&str]) -> Result<Hash, CryptoError> {
    let mut hasher = Sha256::new();
    for (index, field) in fields.iter().enumerate() {
        if field.is_empty() {
            return Err(CryptoError::EmptyHashField(index));
        }
        hasher.update(field.len().to_string().as_bytes());
        hasher.update(field.as_bytes());
    }
    Ok(hasher.finalize().into())
}
