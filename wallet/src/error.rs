//! Error types for the transaction pipeline.
//!
//! Every pipeline operation that can fail returns a [`PipelineError`]. The
//! variants carry the offending values as data; turning them into words
//! for a user (token names, translations) is left to the caller.

use thiserror::Error;

use crate::transaction::TransactionKind;

/// Terminal failure of a single transaction or of a whole batch.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A recipient address fails the network's address check.
    #[error("destination address {address} is not valid for network version {network_version:#04x}")]
    InvalidAddress {
        address: String,
        network_version: u8,
    },

    /// The account cannot cover amount plus fee (or the kind's fee floor).
    #[error("insufficient funds on {address}: required {required}, available {available}")]
    InsufficientFunds {
        address: String,
        /// Arktoshi the operation needs. Saturates at `u64::MAX`.
        required: u64,
        /// Arktoshi the account snapshot holds.
        available: u64,
    },

    /// The signing key does not belong to the claimed sender.
    #[error("signing key does not correspond to account {expected} (derives {derived})")]
    AddressMismatch { expected: String, derived: String },

    /// Kind-specific input was rejected by the builder.
    #[error("failed to build {kind} transaction: {source}")]
    Build {
        kind: TransactionKind,
        #[source]
        source: BuildError,
    },

    /// The signing backend failed.
    #[error("signing failed: {0}")]
    Signing(#[from] SigningError),

    /// The sender account could not be resolved.
    #[error("account lookup failed: {0}")]
    Account(#[source] ProviderError),

    /// The fee schedule could not be resolved.
    #[error("fee lookup failed: {0}")]
    Fees(#[source] ProviderError),
}

/// Malformed kind-specific input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("memo is {length} bytes, maximum is {max}")]
    MemoTooLong { length: usize, max: usize },

    #[error("invalid delegate username {username:?}")]
    InvalidUsername { username: String },

    #[error("vote list is empty")]
    EmptyVotes,

    #[error("{count} votes given, maximum is {max}")]
    TooManyVotes { count: usize, max: usize },

    #[error("malformed vote {vote:?}: expected '+' or '-' followed by a public key")]
    MalformedVote { vote: String },
}

/// Failure reported by a hardware device.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("device is not connected")]
    Disconnected,

    #[error("request was rejected on the device")]
    Rejected,

    #[error("device error: {0}")]
    Other(String),
}

/// Failure of a signing backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SigningError {
    /// The device failed or refused to sign.
    #[error("device {device} failed: {source}")]
    Device {
        device: String,
        #[source]
        source: DeviceError,
    },

    /// The device answered with something that is not a signature.
    #[error("device {device} returned a malformed signature")]
    MalformedSignature { device: String },

    /// A hardware request arrived but no signer is configured.
    #[error("no hardware signer is configured")]
    NoHardwareSigner,

    /// The request was cancelled before it reached the device.
    #[error("signing request for batch item {index} was cancelled before dispatch")]
    Cancelled { index: usize },

    /// The task driving a signing request ended abnormally.
    #[error("signing task aborted: {0}")]
    TaskAborted(String),
}

/// Failure of an account or fee collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("unknown account {address}")]
    UnknownAccount { address: String },

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;
