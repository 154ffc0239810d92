//! Local signing with passphrase-derived key pairs.
//!
//! Signing is a separate step from building because the key may not be
//! available at construction time: on the hardware path the device signs
//! and the pipeline only attaches the result.

use super::builder::Transaction;
use crate::crypto::Keypair;

/// Signs a transaction in place with the sender's key pair.
///
/// Sets `sender_public_key` first (it is part of the signed bytes), then
/// stores the hex-encoded signature over [`Transaction::signing_digest`].
/// Any previous second signature is cleared because it covered the old
/// first signature.
pub fn sign_transaction<'a>(tx: &'a mut Transaction, keypair: &Keypair) -> &'a Transaction {
    tx.sender_public_key = Some(keypair.public_key());
    tx.sign_signature = None;
    let signature = keypair.sign(&tx.signing_digest());
    tx.signature = Some(signature.to_hex());
    tx
}

/// Adds the second-passphrase signature. Must run after
/// [`sign_transaction`], since it covers the first signature.
pub fn second_sign_transaction<'a>(
    tx: &'a mut Transaction,
    second_keypair: &Keypair,
) -> &'a Transaction {
    let signature = second_keypair.sign(&tx.second_signing_digest());
    tx.sign_signature = Some(signature.to_hex());
    tx
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Passphrase, Signature};
    use crate::transaction::builder::TransactionBuilder;
    use crate::transaction::types::TransactionKind;

    fn unsigned() -> Transaction {
        TransactionBuilder::new(TransactionKind::Transfer)
            .amount(500)
            .fee(10)
            .timestamp(1_000)
            .build()
    }

    #[test]
    fn sign_sets_signature_and_public_key() {
        let kp = Passphrase::from("sender").keypair();
        let mut tx = unsigned();
        sign_transaction(&mut tx, &kp);

        assert!(tx.is_signed());
        assert_eq!(tx.sender_public_key, Some(kp.public_key()));
        assert_eq!(tx.signature.as_ref().unwrap().len(), 128);
    }

    #[test]
    fn signature_verifies_over_signing_digest() {
        let kp = Passphrase::from("sender").keypair();
        let mut tx = unsigned();
        sign_transaction(&mut tx, &kp);

        let sig = Signature::from_hex(tx.signature.as_ref().unwrap()).unwrap();
        assert!(kp.public_key().verify(&tx.signing_digest(), &sig));
    }

    #[test]
    fn signing_is_deterministic() {
        let kp = Passphrase::from("sender").keypair();
        let mut a = unsigned();
        let mut b = unsigned();
        sign_transaction(&mut a, &kp);
        sign_transaction(&mut b, &kp);
        assert_eq!(a.signature, b.signature);
    }

    #[test]
    fn second_signature_covers_first() {
        let kp = Passphrase::from("first").keypair();
        let second = Passphrase::from("second").keypair();
        let mut tx = unsigned();
        sign_transaction(&mut tx, &kp);
        second_sign_transaction(&mut tx, &second);

        let sig = Signature::from_hex(tx.sign_signature.as_ref().unwrap()).unwrap();
        assert!(second.public_key().verify(&tx.second_signing_digest(), &sig));
        assert!(!second.public_key().verify(&tx.signing_digest(), &sig));
    }

    #[test]
    fn re_signing_drops_stale_second_signature() {
        let kp = Passphrase::from("first").keypair();
        let mut tx = unsigned();
        sign_transaction(&mut tx, &kp);
        second_sign_transaction(&mut tx, &Passphrase::from("second").keypair());

        sign_transaction(&mut tx, &kp);
        assert!(tx.sign_signature.is_none());
    }
}
