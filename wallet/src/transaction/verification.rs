//! Verification of finalized transactions.
//!
//! Cheap structural checks run first, the signature check last. Only the
//! first signature can be checked here: the second passphrase's public key
//! lives in account state, not in the transaction.

use thiserror::Error;

use super::builder::Transaction;
use crate::crypto::Signature;

/// Reasons a finalized transaction fails verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
    /// No `id` has been attached.
    #[error("transaction has no id")]
    MissingId,

    /// The stored `id` differs from the recomputed one.
    #[error("transaction id mismatch: expected {expected}, got {actual}")]
    IdMismatch { expected: String, actual: String },

    #[error("transaction is unsigned")]
    MissingSignature,

    #[error("transaction has no sender public key")]
    MissingSenderPublicKey,

    #[error("malformed signature")]
    MalformedSignature,

    #[error("signature does not verify against the sender public key")]
    InvalidSignature,
}

/// Verifies that a finalized transaction is internally consistent:
///
/// 1. `id` is present and equals [`Transaction::compute_id`].
/// 2. A signature and a sender public key are present.
/// 3. The signature verifies over [`Transaction::signing_digest`].
pub fn verify_transaction(tx: &Transaction) -> Result<(), VerificationError> {
    let actual = tx.id.as_ref().ok_or(VerificationError::MissingId)?;
    let expected = tx.compute_id();
    if *actual != expected {
        return Err(VerificationError::IdMismatch {
            expected,
            actual: actual.clone(),
        });
    }

    let sig_hex = tx
        .signature
        .as_ref()
        .ok_or(VerificationError::MissingSignature)?;
    let public_key = tx
        .sender_public_key
        .as_ref()
        .ok_or(VerificationError::MissingSenderPublicKey)?;
    let signature =
        Signature::from_hex(sig_hex).map_err(|_| VerificationError::MalformedSignature)?;

    if !public_key.verify(&tx.signing_digest(), &signature) {
        return Err(VerificationError::InvalidSignature);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
