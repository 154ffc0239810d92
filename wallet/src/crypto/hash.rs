//! # Hashing Utilities
//!
//! Two hash functions, no more:
//!
//! - **SHA-256** for key derivation, signing digests, transaction IDs and
//!   address checksums (double SHA-256).
//! - **BLAKE3** for the public-key hash embedded in addresses.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use arkwright_wallet::crypto::sha256;
///
/// let hash = sha256(b"arkwright");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute the double-SHA-256 hash: `SHA-256(SHA-256(data))`.
///
/// Only used for base58check checksums.
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Compute the BLAKE3 hash of the input data.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// The 20-byte key hash embedded in an address.
pub fn key_hash(public_key: &[u8]) -> [u8; 20] {
    let digest = blake3_hash(public_key);
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest[..20]);
    out
}
