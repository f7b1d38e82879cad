//! # Shared Crypto
//!
//! Cryptographic primitives used by witness servers.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `signatures` | Ed25519 | Server and organizer identities, message signing |
//! | `hashing` | SHA-256 | Content-addressed message IDs, instance IDs |
//!
//! ## Security Properties
//!
//! - **Ed25519**: Deterministic nonces, no RNG dependency when signing
//! - **Field hash**: Every field is length-prefixed, so `("ab", "c")` and
//!   `("a", "bc")` never collide

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{hash_fields, Hash};
pub use signatures::{KeyPair, PublicKey, Signature};
