// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Arkwright Wallet: Transaction Pipeline
//!
//! Builds and signs ARK-style wallet transactions. A request names what to
//! build (a transfer, a second passphrase registration, a delegate
//! registration or a vote) and who signs it: the local passphrase, or an
//! external hardware device that never reveals its key.
//!
//! ## Architecture
//!
//! - **config**: network versions, protocol limits and pipeline settings.
//! - **crypto**: Ed25519 keys, hashing and base58check addresses.
//! - **transaction**: the transaction record, canonical bytes, signing
//!   and verification.
//! - **account**: account and fee snapshot ports with in-memory stores.
//! - **primitives**: the cryptographic port the pipeline builds through.
//! - **hardware**: the hardware signer port and its single-slot channel.
//! - **request**: what callers ask for.
//! - **pipeline**: validation, building, signing, batching and the
//!   [`TransactionService`] facade.
//!
//! ## Guarantees
//!
//! 1. Nothing is built until the request has been validated against the
//!    account and fee snapshot. Nothing is signed until it is built.
//! 2. A locally signed transaction is only returned if its key derives the
//!    claimed sender address.
//! 3. A hardware device never sees two requests at once.
//! 4. A batch returns every transaction, in input order, or an error.
//!
//! Broadcasting, persistence and key storage are the caller's business.

pub mod account;
pub mod config;
pub mod crypto;
pub mod error;
pub mod hardware;
pub mod pipeline;
pub mod primitives;
pub mod request;
pub mod transaction;

pub use account::{Account, AccountProvider, FeeResolver, FeeSchedule, InMemoryAccounts, StaticFees};
pub use config::{HardwareSenderCheck, Network, PipelineConfig};
pub use error::{BuildError, DeviceError, PipelineError, ProviderError, SigningError};
pub use hardware::{HardwareChannel, HardwareSignature, HardwareSigner, SoftwareDevice};
pub use pipeline::{TransactionService, TransactionServiceBuilder};
pub use primitives::{CryptoPrimitives, Ed25519Primitives};
pub use request::{BatchRequest, DeviceRef, LocalCredentials, Operation, SigningBackend, TransactionRequest, TransferItem};
pub use transaction::{Transaction, TransactionKind};
