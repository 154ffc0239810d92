//! # Transaction Pipeline
//!
//! Validator, factory, signing coordinator and batch orchestrator, plus the
//! [`TransactionService`] facade that sequences them:
//!
//! ```text
//! request ─▶ TransactionValidator ─▶ TransactionFactory ─▶ SigningCoordinator ─▶ signed tx
//!                                                               │
//!                                                               └─▶ HardwareChannel ─▶ device
//! ```
//!
//! Validation always completes before anything is built, and building
//! always completes before anything is signed.

pub mod batch;
pub mod coordinator;
pub mod factory;
pub mod lifecycle;
pub mod service;
pub mod validator;

pub use batch::BatchOrchestrator;
pub use coordinator::SigningCoordinator;
pub use factory::TransactionFactory;
pub use lifecycle::{SigningPath, Stage, TransactionLifecycle};
pub use service::{TransactionService, TransactionServiceBuilder};
pub use validator::TransactionValidator;
