//! The cryptographic primitives port.
//!
//! Everything the pipeline needs from cryptography goes through
//! [`CryptoPrimitives`]: address derivation and validation, the four
//! kind-specific transaction builders, and identifier computation. The
//! pipeline owns sequencing and policy; the primitives own bytes.
//!
//! [`Ed25519Primitives`] is the default implementation, built on
//! [`crate::crypto`] and [`crate::transaction`].

use crate::config::{
    MAX_MEMO_LENGTH, MAX_USERNAME_LENGTH, MAX_VOTES_PER_TRANSACTION, USERNAME_SYMBOLS,
};
use crate::crypto::{self, Passphrase, PublicKey};
use crate::error::BuildError;
use crate::request::LocalCredentials;
use crate::transaction::{
    second_sign_transaction, sign_transaction, Asset, Transaction, TransactionBuilder,
    TransactionKind,
};

/// Cryptographic operations consumed by the pipeline.
///
/// Builders take the fee up front so that it is covered by the signature,
/// and optional local credentials. With credentials the returned
/// transaction is fully signed (first signature, second signature when a
/// second passphrase is given, `senderPublicKey` and `id`). Without them it
/// is an unsigned payload for an external signer.
///
/// Builders must not mutate anything on failure: either a fresh transaction
/// comes back or a [`BuildError`] does.
pub trait CryptoPrimitives: Send + Sync {
    /// The address `public_key` owns on the network `network_version`.
    fn derive_address(&self, public_key: &PublicKey, network_version: u8) -> String;

    /// Whether `address` is well formed for `network_version`.
    fn is_valid_address(&self, address: &str, network_version: u8) -> bool;

    fn create_transfer(
        &self,
        recipient: &str,
        amount: u64,
        memo: Option<&str>,
        fee: u64,
        credentials: Option<&LocalCredentials>,
    ) -> Result<Transaction, BuildError>;

    /// Registers `second_passphrase`. Only the first passphrase of
    /// `credentials` signs.
    fn create_second_signature(
        &self,
        second_passphrase: &Passphrase,
        fee: u64,
        credentials: Option<&LocalCredentials>,
    ) -> Result<Transaction, BuildError>;

    fn create_delegate(
        &self,
        username: &str,
        fee: u64,
        credentials: Option<&LocalCredentials>,
    ) -> Result<Transaction, BuildError>;

    /// A vote is addressed to the voter, so a locally signed vote derives
    /// its `recipientId` on `network_version`.
    fn create_vote(
        &self,
        votes: &[String],
        fee: u64,
        network_version: u8,
        credentials: Option<&LocalCredentials>,
    ) -> Result<Transaction, BuildError>;

    /// Identifier over the transaction's current fields.
    fn compute_id(&self, transaction: &Transaction) -> String;
}

// ---------------------------------------------------------------------------
// Ed25519Primitives
// ---------------------------------------------------------------------------

/// Default primitives: Ed25519 signatures over SHA-256 digests,
/// base58check addresses.
#[derive(Debug, Clone, Default)]
pub struct Ed25519Primitives {
    /// Fixed timestamp for reproducible output; `None` means "now".
    timestamp: Option<u32>,
}

impl Ed25519Primitives {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps every built transaction with `timestamp` instead of the
    /// current time.
    pub fn with_fixed_timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    fn builder(&self, kind: TransactionKind, fee: u64) -> TransactionBuilder {
        let builder = TransactionBuilder::new(kind).fee(fee);
        match self.timestamp {
            Some(ts) => builder.timestamp(ts),
            None => builder,
        }
    }

    /// Signs with the first (and optionally second) passphrase and attaches
    /// the identifier.
    fn finish(&self, mut tx: Transaction, credentials: Option<&LocalCredentials>, second: bool) -> Transaction {
        let Some(credentials) = credentials else {
            return tx;
        };
        sign_transaction(&mut tx, &credentials.passphrase.keypair());
        if second {
            if let Some(second_passphrase) = &credentials.second_passphrase {
                second_sign_transaction(&mut tx, &second_passphrase.keypair());
            }
        }
        tx.id = Some(self.compute_id(&tx));
        tx
    }
}

impl CryptoPrimitives for Ed25519Primitives {
    fn derive_address(&self, public_key: &PublicKey, network_version: u8) -> String {
        crypto::derive_address(public_key, network_version)
    }

    fn is_valid_address(&self, address: &str, network_version: u8) -> bool {
        crypto::is_valid_address(address, network_version)
    }

    fn create_transfer(
        &self,
        recipient: &str,
        amount: u64,
        memo: Option<&str>,
        fee: u64,
        credentials: Option<&LocalCredentials>,
    ) -> Result<Transaction, BuildError> {
        let mut builder = self
            .builder(TransactionKind::Transfer, fee)
            .recipient(recipient)
            .amount(amount);
        if let Some(memo) = memo {
            check_memo(memo)?;
            builder = builder.memo(memo);
        }
        Ok(self.finish(builder.build(), credentials, true))
    }

    fn create_second_signature(
        &self,
        second_passphrase: &Passphrase,
        fee: u64,
        credentials: Option<&LocalCredentials>,
    ) -> Result<Transaction, BuildError> {
        let tx = self
            .builder(TransactionKind::SecondSignature, fee)
            .asset(Asset::Signature {
                public_key: second_passphrase.keypair().public_key(),
            })
            .build();
        Ok(self.finish(tx, credentials, false))
    }

    fn create_delegate(
        &self,
        username: &str,
        fee: u64,
        credentials: Option<&LocalCredentials>,
    ) -> Result<Transaction, BuildError> {
        check_username(username)?;
        let tx = self
            .builder(TransactionKind::DelegateRegistration, fee)
            .asset(Asset::Delegate {
                username: username.to_string(),
            })
            .build();
        Ok(self.finish(tx, credentials, true))
    }

    fn create_vote(
        &self,
        votes: &[String],
        fee: u64,
        network_version: u8,
        credentials: Option<&LocalCredentials>,
    ) -> Result<Transaction, BuildError> {
        check_votes(votes)?;
        let mut tx = self
            .builder(TransactionKind::Vote, fee)
            .asset(Asset::Votes(votes.to_vec()))
            .build();
        // Votes are addressed to the voter. Only known here when signing
        // locally; the hardware path sets it before dispatch.
        if let Some(credentials) = credentials {
            let own = credentials.passphrase.keypair().public_key();
            tx.recipient_id = Some(self.derive_address(&own, network_version));
        }
        Ok(self.finish(tx, credentials, true))
    }

    fn compute_id(&self, transaction: &Transaction) -> String {
        transaction.compute_id()
    }
}

// ---------------------------------------------------------------------------
// Input checks
// ---------------------------------------------------------------------------

fn check_memo(memo: &str) -> Result<(), BuildError> {
    if memo.len() > MAX_MEMO_LENGTH {
        return Err(BuildError::MemoTooLong {
            length: memo.len(),
            max: MAX_MEMO_LENGTH,
        });
    }
    Ok(())
}

fn check_username(username: &str) -> Result<(), BuildError> {
    let valid_chars = username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || USERNAME_SYMBOLS.contains(c));
    if username.is_empty() || username.len() > MAX_USERNAME_LENGTH || !valid_chars {
        return Err(BuildError::InvalidUsername {
            username: username.to_string(),
        });
    }
    Ok(())
}

fn check_votes(votes: &[String]) -> Result<(), BuildError> {
    if votes.is_empty() {
        return Err(BuildError::EmptyVotes);
    }
    if votes.len() > MAX_VOTES_PER_TRANSACTION {
        return Err(BuildError::TooManyVotes {
            count: votes.len(),
            max: MAX_VOTES_PER_TRANSACTION,
        });
    }
    for vote in votes {
        let key = vote
            .strip_prefix('+')
            .or_else(|| vote.strip_prefix('-'))
            .ok_or_else(|| BuildError::MalformedVote { vote: vote.clone() })?;
        PublicKey::from_hex(key).map_err(|_| BuildError::MalformedVote { vote: vote.clone() })?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
