//! Core type definitions for wallet transactions.
//!
//! The vocabulary shared by every stage of the pipeline: which kind of
//! transaction is being built, the kind-specific asset it carries, and a
//! small helper for showing arktoshi amounts to humans.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{ARKTOSHI_PER_TOKEN, TOKEN_DECIMALS};
use crate::crypto::PublicKey;

// ---------------------------------------------------------------------------
// TransactionKind
// ---------------------------------------------------------------------------

/// The operation a transaction performs. Serialized as its wire type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TransactionKind {
    /// Value transfer to a recipient address.
    Transfer,
    /// Registers a second passphrase on the sender account.
    SecondSignature,
    /// Registers the sender as a delegate under a username.
    DelegateRegistration,
    /// Casts or withdraws a delegate vote.
    Vote,
}

impl TransactionKind {
    /// Wire type code.
    pub fn code(self) -> u8 {
        match self {
            Self::Transfer => 0,
            Self::SecondSignature => 1,
            Self::DelegateRegistration => 2,
            Self::Vote => 3,
        }
    }
}

impl TryFrom<u8> for TransactionKind {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Transfer),
            1 => Ok(Self::SecondSignature),
            2 => Ok(Self::DelegateRegistration),
            3 => Ok(Self::Vote),
            other => Err(format!("unknown transaction type {}", other)),
        }
    }
}

impl From<TransactionKind> for u8 {
    fn from(kind: TransactionKind) -> Self {
        kind.code()
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transfer => write!(f, "transfer"),
            Self::SecondSignature => write!(f, "second-signature"),
            Self::DelegateRegistration => write!(f, "delegate-registration"),
            Self::Vote => write!(f, "vote"),
        }
    }
}

// ---------------------------------------------------------------------------
// Asset
// ---------------------------------------------------------------------------

/// Kind-specific payload. Transfers carry none.
///
/// Serialized the way nodes expect it: `{"signature": {"publicKey": ..}}`,
/// `{"delegate": {"username": ..}}` or `{"votes": [..]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Asset {
    Signature {
        #[serde(rename = "publicKey")]
        public_key: PublicKey,
    },
    Delegate {
        username: String,
    },
    Votes(Vec<String>),
}

impl Asset {
    /// Bytes contributed to the canonical serialization.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Signature { public_key } => public_key.as_bytes().to_vec(),
            Self::Delegate { username } => username.as_bytes().to_vec(),
            Self::Votes(votes) => votes.concat().into_bytes(),
        }
    }
}

// ---------------------------------------------------------------------------
// Arktoshi
// ---------------------------------------------------------------------------

/// An amount in arktoshi, the smallest indivisible unit of the token.
///
/// Formatting only; all arithmetic stays on plain `u64`.
///
/// ```
/// use arkwright_wallet::transaction::Arktoshi;
///
/// assert_eq!(Arktoshi(150_000_000).to_string(), "1.50000000");
/// assert_eq!(Arktoshi(25).with_token("DARK"), "0.00000025 DARK");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Arktoshi(pub u64);

impl Arktoshi {
    /// Formats the amount followed by a token ticker.
    pub fn with_token(self, token: &str) -> String {
        format!("{} {}", self, token)
    }
}

impl fmt::Display for Arktoshi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:0>width$}",
            self.0 / ARKTOSHI_PER_TOKEN,
            self.0 % ARKTOSHI_PER_TOKEN,
            width = TOKEN_DECIMALS as usize
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
