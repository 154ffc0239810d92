//! Transaction construction.
//!
//! The factory turns a validated request into a transaction by calling the
//! matching [`CryptoPrimitives`] builder, then stamps the sender address.
//! On the local backend the primitives sign as they build; on the hardware
//! backend the result is an unsigned payload for the device.

use std::sync::Arc;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::primitives::CryptoPrimitives;
use crate::request::{Operation, SigningBackend, TransactionRequest};
use crate::transaction::Transaction;

/// Builds transactions of every kind through the primitives port.
#[derive(Clone)]
pub struct TransactionFactory {
    primitives: Arc<dyn CryptoPrimitives>,
    network_version: u8,
}

impl TransactionFactory {
    pub fn new(primitives: Arc<dyn CryptoPrimitives>, network_version: u8) -> Self {
        Self {
            primitives,
            network_version,
        }
    }

    /// Builds the transaction for `request` with `fee` attached.
    ///
    /// Builder failures come back as [`PipelineError::Build`] and leave
    /// nothing behind.
    pub fn build(&self, request: &TransactionRequest, fee: u64) -> Result<Transaction> {
        let kind = request.kind();
        let credentials = match &request.backend {
            SigningBackend::Local(credentials) => Some(credentials),
            SigningBackend::Hardware { .. } => None,
        };

        let built = match &request.operation {
            Operation::Transfer {
                recipient,
                amount,
                memo,
            } => self
                .primitives
                .create_transfer(recipient, *amount, memo.as_deref(), fee, credentials),
            Operation::SecondSignature { second_passphrase } => self
                .primitives
                .create_second_signature(second_passphrase, fee, credentials),
            Operation::DelegateRegistration { username } => {
                self.primitives.create_delegate(username, fee, credentials)
            }
            Operation::Vote { votes } => {
                self.primitives
                    .create_vote(votes, fee, self.network_version, credentials)
            }
        };

        let mut tx = built.map_err(|source| PipelineError::Build { kind, source })?;
        tx.fee = fee;
        tx.sender_id = Some(request.from_address.clone());

        debug!(kind = %kind, backend = request.backend.label(), "transaction built");
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEVNET_VERSION, MAINNET_VERSION};
    use crate::crypto::{derive_address, Passphrase};
    use crate::error::BuildError;
    use crate::primitives::Ed25519Primitives;
    use crate::transaction::{verify_transaction, Asset, TransactionKind};

    fn factory() -> TransactionFactory {
        TransactionFactory::new(
            Arc::new(Ed25519Primitives::new().with_fixed_timestamp(42)),
            DEVNET_VERSION,
        )
    }

    fn address(seed: &str) -> String {
        derive_address(&Passphrase::from(seed).keypair().public_key(), DEVNET_VERSION)
    }

    fn vote_for(seed: &str) -> String {
        format!("+{}", Passphrase::from(seed).keypair().public_key())
    }

    #[test]
    fn local_transfer_carries_fee_and_sender() {
        let request = TransactionRequest::new(
            address("sender"),
            Operation::Transfer {
                recipient: address("bob"),
                amount: 500,
                memo: Some("rent".into()),
            },
            SigningBackend::local("sender"),
        );
        let tx = factory().build(&request, 10).unwrap();
        assert_eq!(tx.kind, TransactionKind::Transfer);
        assert_eq!(tx.amount, 500);
        assert_eq!(tx.fee, 10);
        assert_eq!(tx.sender_id, Some(address("sender")));
        assert_eq!(verify_transaction(&tx), Ok(()));
    }

    #[test]
    fn hardware_build_is_unsigned() {
        let device_key = Passphrase::from("device").keypair().public_key();
        let request = TransactionRequest::new(
            address("device"),
            Operation::DelegateRegistration {
                username: "genesis".into(),
            },
            SigningBackend::hardware("44'/111'/0'/0/0", device_key),
        );
        let tx = factory().build(&request, 25).unwrap();
        assert!(!tx.is_signed());
        assert!(tx.id.is_none());
        assert_eq!(
            tx.asset,
            Some(Asset::Delegate {
                username: "genesis".into()
            })
        );
    }

    #[test]
    fn builder_failure_is_tagged_with_kind() {
        let request = TransactionRequest::new(
            address("sender"),
            Operation::Vote { votes: vec![] },
            SigningBackend::local("sender"),
        );
        let err = factory().build(&request, 1).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Build {
                kind: TransactionKind::Vote,
                source: BuildError::EmptyVotes
            }
        ));
    }

    #[test]
    fn second_signature_and_vote_kinds() {
        let f = factory();
        let second = TransactionRequest::new(
            address("sender"),
            Operation::SecondSignature {
                second_passphrase: Passphrase::from("second"),
            },
            SigningBackend::local("sender"),
        );
        assert_eq!(
            f.build(&second, 5).unwrap().kind,
            TransactionKind::SecondSignature
        );

        let vote = TransactionRequest::new(
            address("sender"),
            Operation::Vote {
                votes: vec![vote_for("delegate")],
            },
            SigningBackend::local("sender"),
        );
        let tx = f.build(&vote, 1).unwrap();
        assert_eq!(tx.recipient_id, Some(address("sender")));
    }

    #[test]
    fn local_vote_is_addressed_on_the_factory_network() {
        let f = TransactionFactory::new(Arc::new(Ed25519Primitives::new()), MAINNET_VERSION);
        let from = derive_address(
            &Passphrase::from("sender").keypair().public_key(),
            MAINNET_VERSION,
        );
        let vote = TransactionRequest::new(
            from.clone(),
            Operation::Vote {
                votes: vec![vote_for("delegate")],
            },
            SigningBackend::local("sender"),
        );
        let tx = f.build(&vote, 1).unwrap();
        assert_eq!(tx.recipient_id, Some(from));
        assert_eq!(verify_transaction(&tx), Ok(()));
    }
}
