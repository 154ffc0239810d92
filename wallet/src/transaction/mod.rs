//! # Transaction Module
//!
//! The transaction record, its canonical serialization, local signing and
//! verification.
//!
//! ## Architecture
//!
//! ```text
//! types.rs        TransactionKind, Asset, Arktoshi
//! builder.rs      Transaction record and fluent TransactionBuilder
//! signing.rs      First and second signatures with passphrase key pairs
//! verification.rs Consistency checks on finalized transactions
//! ```
//!
//! ## Design Decisions
//!
//! - The `id` is `sha256` over the canonical bytes *including* signatures,
//!   so it can only be computed once signing is complete. It is recomputed,
//!   never cached across field changes.
//! - All amounts are `u64` arktoshi. No floating point near money.

pub mod builder;
pub mod signing;
pub mod types;
pub mod verification;

pub use builder::{Transaction, TransactionBuilder};
pub use signing::{second_sign_transaction, sign_transaction};
pub use types::{Arktoshi, Asset, TransactionKind};
pub use verification::{verify_transaction, VerificationError};
