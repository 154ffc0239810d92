//! Transaction record and its fluent builder.
//!
//! The [`TransactionBuilder`] assembles the unsigned fields of a
//! [`Transaction`]. It does not sign and does not set an `id`; signing
//! happens in [`super::signing`] and the identifier is computed last, once
//! every other field is final.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::types::{Asset, TransactionKind};
use crate::config::{self, ADDRESS_ENCODED_LENGTH, ADDRESS_PAYLOAD_LENGTH, MAX_MEMO_LENGTH};
use crate::crypto::{sha256, PublicKey};

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A wallet transaction, signed or not.
///
/// Serialized with the camelCase field names nodes accept
/// (`type`, `recipientId`, `senderPublicKey`, `signSignature`, ...).
/// Optional fields are omitted while unset.
///
/// # Canonical Byte Format
///
/// [`Transaction::to_bytes`] concatenates, in order: type (1 byte),
/// timestamp (u32 LE), sender public key (32 bytes), recipient (21 bytes),
/// vendor field (64 bytes, zero padded), amount (u64 LE), fee (u64 LE),
/// asset bytes, then the signature and second signature when requested.
/// Unset keys and recipients are written as zeroes. `sender_id` and `id`
/// are never part of the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// `hex(sha256(to_bytes(with all signatures)))`. Set once signing is done.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub kind: TransactionKind,

    /// Seconds since the transaction epoch.
    pub timestamp: u32,

    /// Transfer amount in arktoshi. Zero for every other kind.
    pub amount: u64,

    /// Fee in arktoshi.
    pub fee: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,

    /// The claimed sender address. Attached by the factory after building.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_public_key: Option<PublicKey>,

    /// Free-form memo ("smartbridge"), at most 64 bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_field: Option<String>,

    /// Hex-encoded signature over [`Transaction::signing_digest`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,

    /// Hex-encoded second-passphrase signature over
    /// [`Transaction::second_signing_digest`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_signature: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<Asset>,
}

impl Transaction {
    /// Returns the canonical byte representation.
    ///
    /// `include_signature` and `include_second_signature` select whether
    /// the (hex-decoded) signatures are appended. A signature that fails to
    /// decode contributes nothing.
    pub fn to_bytes(&self, include_signature: bool, include_second_signature: bool) -> Vec<u8> {
        let mut buf = Vec::with_capacity(256);

        buf.push(self.kind.code());
        buf.extend_from_slice(&self.timestamp.to_le_bytes());

        match &self.sender_public_key {
            Some(pk) => buf.extend_from_slice(pk.as_bytes()),
            None => buf.extend_from_slice(&[0u8; 32]),
        }

        buf.extend_from_slice(&recipient_bytes(self.recipient_id.as_deref()));

        let mut vendor = [0u8; MAX_MEMO_LENGTH];
        if let Some(memo) = &self.vendor_field {
            let bytes = memo.as_bytes();
            let len = bytes.len().min(MAX_MEMO_LENGTH);
            vendor[..len].copy_from_slice(&bytes[..len]);
        }
        buf.extend_from_slice(&vendor);

        buf.extend_from_slice(&self.amount.to_le_bytes());
        buf.extend_from_slice(&self.fee.to_le_bytes());

        if let Some(asset) = &self.asset {
            buf.extend_from_slice(&asset.to_bytes());
        }

        if include_signature {
            if let Some(sig) = self.signature.as_deref().and_then(|s| hex::decode(s).ok()) {
                buf.extend_from_slice(&sig);
            }
        }
        if include_second_signature {
            if let Some(sig) = self
                .sign_signature
                .as_deref()
                .and_then(|s| hex::decode(s).ok())
            {
                buf.extend_from_slice(&sig);
            }
        }

        buf
    }

    /// Digest the sender's first signature covers.
    pub fn signing_digest(&self) -> [u8; 32] {
        sha256(&self.to_bytes(false, false))
    }

    /// Digest the second-passphrase signature covers (includes the first
    /// signature).
    pub fn second_signing_digest(&self) -> [u8; 32] {
        sha256(&self.to_bytes(true, false))
    }

    /// Computes the identifier from the current field values.
    ///
    /// Pure: recomputing over unchanged fields always yields the same ID,
    /// and any field change (signatures included) changes it.
    pub fn compute_id(&self) -> String {
        hex::encode(sha256(&self.to_bytes(true, true)))
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

/// The 21-byte payload of a recipient address, or zeroes when absent or
/// undecodable. Recipient validity is checked before building, not here.
fn recipient_bytes(recipient: Option<&str>) -> [u8; ADDRESS_PAYLOAD_LENGTH] {
    let mut out = [0u8; ADDRESS_PAYLOAD_LENGTH];
    if let Some(raw) = recipient.and_then(|r| bs58::decode(r).into_vec().ok()) {
        if raw.len() == ADDRESS_ENCODED_LENGTH {
            out.copy_from_slice(&raw[..ADDRESS_PAYLOAD_LENGTH]);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for unsigned [`Transaction`] values.
///
/// ```rust
/// use arkwright_wallet::transaction::{TransactionBuilder, TransactionKind};
///
/// let tx = TransactionBuilder::new(TransactionKind::Transfer)
///     .recipient("DRecipientAddress")
///     .amount(50_000_000)
///     .memo("rent")
///     .timestamp(1_000)
///     .build();
/// assert!(!tx.is_signed());
/// ```
///
/// The timestamp defaults to "now", in seconds since the transaction epoch.
pub struct TransactionBuilder {
    kind: TransactionKind,
    timestamp: Option<u32>,
    amount: u64,
    fee: u64,
    recipient: Option<String>,
    memo: Option<String>,
    asset: Option<Asset>,
}

impl TransactionBuilder {
    pub fn new(kind: TransactionKind) -> Self {
        Self {
            kind,
            timestamp: None,
            amount: 0,
            fee: 0,
            recipient: None,
            memo: None,
            asset: None,
        }
    }

    pub fn recipient(mut self, address: &str) -> Self {
        self.recipient = Some(address.to_string());
        self
    }

    pub fn amount(mut self, amount: u64) -> Self {
        self.amount = amount;
        self
    }

    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    pub fn memo(mut self, memo: &str) -> Self {
        self.memo = Some(memo.to_string());
        self
    }

    pub fn asset(mut self, asset: Asset) -> Self {
        self.asset = Some(asset);
        self
    }

    /// Sets the timestamp explicitly (seconds since the transaction epoch).
    pub fn timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Consumes the builder and produces an unsigned transaction with no ID.
    pub fn build(self) -> Transaction {
        let timestamp = self
            .timestamp
            .unwrap_or_else(|| config::epoch_timestamp(Utc::now()));

        Transaction {
            id: None,
            kind: self.kind,
            timestamp,
            amount: self.amount,
            fee: self.fee,
            recipient_id: self.recipient,
            sender_id: None,
            sender_public_key: None,
            vendor_field: self.memo,
            signature: None,
            sign_signature: None,
            asset: self.asset,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
