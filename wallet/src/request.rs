//! User-supplied transaction requests.
//!
//! A request says *what* to build ([`Operation`]) and *who signs it*
//! ([`SigningBackend`]). The backend is a sum type: each variant carries
//! exactly what its signing path needs, so a request can never be half
//! local and half hardware.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::{Passphrase, PublicKey};
use crate::transaction::TransactionKind;

// ---------------------------------------------------------------------------
// Signing backend
// ---------------------------------------------------------------------------

/// Identifies one hardware device (and key slot) to the signer, e.g. a
/// derivation path such as `44'/111'/0'/0/0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceRef(pub String);

impl fmt::Display for DeviceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Passphrases for the local backend.
#[derive(Debug, Clone)]
pub struct LocalCredentials {
    pub passphrase: Passphrase,
    /// Present when the account has a registered second passphrase.
    pub second_passphrase: Option<Passphrase>,
}

impl LocalCredentials {
    pub fn new(passphrase: impl Into<Passphrase>) -> Self {
        Self {
            passphrase: passphrase.into(),
            second_passphrase: None,
        }
    }

    pub fn with_second(mut self, second: impl Into<Passphrase>) -> Self {
        self.second_passphrase = Some(second.into());
        self
    }
}

/// Who produces the signature.
#[derive(Debug, Clone)]
pub enum SigningBackend {
    /// Signed in-process with passphrase-derived keys.
    Local(LocalCredentials),
    /// Signed by an external device. The device never reveals its key, so
    /// the sender public key has to be supplied out of band.
    Hardware {
        device: DeviceRef,
        public_key: PublicKey,
    },
}

impl SigningBackend {
    pub fn local(passphrase: impl Into<Passphrase>) -> Self {
        Self::Local(LocalCredentials::new(passphrase))
    }

    pub fn hardware(device: impl Into<String>, public_key: PublicKey) -> Self {
        Self::Hardware {
            device: DeviceRef(device.into()),
            public_key,
        }
    }

    pub fn is_hardware(&self) -> bool {
        matches!(self, Self::Hardware { .. })
    }

    /// Backend name for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            Self::Hardware { .. } => "hardware",
        }
    }
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// What the transaction does, with the kind-specific inputs.
#[derive(Debug, Clone)]
pub enum Operation {
    Transfer {
        recipient: String,
        amount: u64,
        memo: Option<String>,
    },
    /// Registers `second_passphrase` as the account's second passphrase.
    SecondSignature { second_passphrase: Passphrase },
    DelegateRegistration { username: String },
    /// Each vote is `+<public key hex>` or `-<public key hex>`.
    Vote { votes: Vec<String> },
}

impl Operation {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Self::Transfer { .. } => TransactionKind::Transfer,
            Self::SecondSignature { .. } => TransactionKind::SecondSignature,
            Self::DelegateRegistration { .. } => TransactionKind::DelegateRegistration,
            Self::Vote { .. } => TransactionKind::Vote,
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A request for a single transaction.
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    /// The address the caller claims to send from.
    pub from_address: String,
    pub operation: Operation,
    pub backend: SigningBackend,
}

impl TransactionRequest {
    pub fn new(from_address: impl Into<String>, operation: Operation, backend: SigningBackend) -> Self {
        Self {
            from_address: from_address.into(),
            operation,
            backend,
        }
    }

    pub fn kind(&self) -> TransactionKind {
        self.operation.kind()
    }
}

/// One recipient of a multi-recipient batch. Amounts are in arktoshi.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferItem {
    pub address: String,
    pub amount: u64,
    #[serde(default, alias = "smartbridge", skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl TransferItem {
    pub fn new(address: impl Into<String>, amount: u64) -> Self {
        Self {
            address: address.into(),
            amount,
            memo: None,
        }
    }
}

/// A batch of transfers from one sender, signed by one backend.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub from_address: String,
    pub items: Vec<TransferItem>,
    pub backend: SigningBackend,
}

impl BatchRequest {
    /// The single-transaction request for item `index`.
    pub fn item_request(&self, index: usize) -> Option<TransactionRequest> {
        let item = self.items.get(index)?;
        Some(TransactionRequest {
            from_address: self.from_address.clone(),
            operation: Operation::Transfer {
                recipient: item.address.clone(),
                amount: item.amount,
                memo: item.memo.clone(),
            },
            backend: self.backend.clone(),
        })
    }
}
