//! # Cryptographic Building Blocks
//!
//! Thin, type-safe wrappers around audited implementations:
//!
//! - **Ed25519** (`ed25519-dalek`) for signatures.
//! - **SHA-256** (`sha2`) for key derivation, signing digests and IDs.
//! - **BLAKE3** for the key hash inside addresses.
//! - **base58check** (`bs58`) for address encoding.
//!
//! The pipeline itself never calls these directly; it goes through the
//! [`crate::primitives::CryptoPrimitives`] port, whose default
//! implementation is built on this module.

pub mod address;
pub mod hash;
pub mod keys;

pub use address::{decode_address, derive_address, is_valid_address, AddressError};
pub use hash::{blake3_hash, double_sha256, sha256};
pub use keys::{KeyError, Keypair, Passphrase, PublicKey, Signature};
