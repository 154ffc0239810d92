//! # Addresses
//!
//! An address is the base58check encoding of a network version byte
//! followed by the 20-byte hash of the owner's public key:
//!
//! ```text
//! public_key (32 bytes)
//!     -> BLAKE3(public_key)[..20]
//!     -> version || key_hash            (21 bytes)
//!     -> || double_sha256(..)[..4]      (25 bytes)
//!     -> base58                         (D... on devnet, A... on mainnet)
//! ```
//!
//! The version byte ties an address to one network: a mainnet address is
//! never valid on devnet and vice versa.

use thiserror::Error;

use super::hash::{double_sha256, key_hash};
use super::keys::PublicKey;
use crate::config::{ADDRESS_ENCODED_LENGTH, ADDRESS_PAYLOAD_LENGTH};

/// Reasons an address string fails to decode.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("not valid base58")]
    Base58,

    #[error("wrong decoded length: expected {expected} bytes, got {got}")]
    Length { expected: usize, got: usize },

    #[error("checksum mismatch")]
    Checksum,

    #[error("network version mismatch: expected {expected:#04x}, got {got:#04x}")]
    Version { expected: u8, got: u8 },
}

/// Derives the address owned by `public_key` on the network identified by
/// `network_version`.
pub fn derive_address(public_key: &PublicKey, network_version: u8) -> String {
    let mut payload = Vec::with_capacity(ADDRESS_ENCODED_LENGTH);
    payload.push(network_version);
    payload.extend_from_slice(&key_hash(public_key.as_bytes()));
    let checksum = double_sha256(&payload);
    payload.extend_from_slice(&checksum[..4]);
    bs58::encode(payload).into_string()
}

/// Decodes an address into its 21-byte payload (version byte + key hash),
/// checking the checksum and the network version.
pub fn decode_address(
    address: &str,
    network_version: u8,
) -> Result<[u8; ADDRESS_PAYLOAD_LENGTH], AddressError> {
    let raw = bs58::decode(address)
        .into_vec()
        .map_err(|_| AddressError::Base58)?;
    if raw.len() != ADDRESS_ENCODED_LENGTH {
        return Err(AddressError::Length {
            expected: ADDRESS_ENCODED_LENGTH,
            got: raw.len(),
        });
    }

    let (payload, checksum) = raw.split_at(ADDRESS_PAYLOAD_LENGTH);
    if double_sha256(payload)[..4] != *checksum {
        return Err(AddressError::Checksum);
    }
    if payload[0] != network_version {
        return Err(AddressError::Version {
            expected: network_version,
            got: payload[0],
        });
    }

    let mut out = [0u8; ADDRESS_PAYLOAD_LENGTH];
    out.copy_from_slice(payload);
    Ok(out)
}

/// Returns `true` if `address` is well formed for the given network.
pub fn is_valid_address(address: &str, network_version: u8) -> bool {
    decode_address(address, network_version).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEVNET_VERSION, MAINNET_VERSION};
    use crate::crypto::keys::Passphrase;

    fn sample_key() -> PublicKey {
        Passphrase::from("address test").keypair().public_key()
    }

    #[test]
    fn derived_address_is_valid_on_its_network() {
        let addr = derive_address(&sample_key(), DEVNET_VERSION);
        assert!(is_valid_address(&addr, DEVNET_VERSION));
        assert!(addr.starts_with('D'));
    }

    #[test]
    fn mainnet_addresses_start_with_a() {
        let addr = derive_address(&sample_key(), MAINNET_VERSION);
        assert!(addr.starts_with('A'));
    }

    #[test]
    fn address_is_rejected_on_other_network() {
        let addr = derive_address(&sample_key(), MAINNET_VERSION);
        assert_eq!(
            decode_address(&addr, DEVNET_VERSION),
            Err(AddressError::Version {
                expected: DEVNET_VERSION,
                got: MAINNET_VERSION
            })
        );
    }

    #[test]
    fn tampered_address_fails_checksum() {
        let addr = derive_address(&sample_key(), DEVNET_VERSION);
        let mut raw = bs58::decode(&addr).into_vec().unwrap();
        raw[5] ^= 0x01;
        let tampered = bs58::encode(raw).into_string();
        assert_eq!(
            decode_address(&tampered, DEVNET_VERSION),
            Err(AddressError::Checksum)
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(
            decode_address("0OIl", DEVNET_VERSION),
            Err(AddressError::Base58)
        );
        assert!(matches!(
            decode_address("abc", DEVNET_VERSION),
            Err(AddressError::Length { .. })
        ));
        assert!(!is_valid_address("", DEVNET_VERSION));
    }

    #[test]
    fn decode_returns_version_and_key_hash() {
        let pk = sample_key();
        let addr = derive_address(&pk, DEVNET_VERSION);
        let payload = decode_address(&addr, DEVNET_VERSION).unwrap();
        assert_eq!(payload[0], DEVNET_VERSION);
        assert_eq!(&payload[1..], &key_hash(pk.as_bytes())[..]);
    }
}
