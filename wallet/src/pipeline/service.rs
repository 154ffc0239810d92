//! The transaction service: one entry point per transaction kind.
//!
//! Each call resolves the fee schedule and the sender account, then runs
//! validation, building and signing in that order, tracking the
//! transaction's [`TransactionLifecycle`]. Batches take the same snapshot
//! once and hand it to the [`BatchOrchestrator`].

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, info_span, Instrument};

use super::batch::BatchOrchestrator;
use super::coordinator::SigningCoordinator;
use super::factory::TransactionFactory;
use super::lifecycle::{SigningPath, TransactionLifecycle};
use super::validator::TransactionValidator;
use crate::account::{Account, AccountProvider, FeeResolver, FeeSchedule};
use crate::config::PipelineConfig;
use crate::crypto::Passphrase;
use crate::error::{PipelineError, Result, SigningError};
use crate::hardware::{HardwareChannel, HardwareSigner};
use crate::primitives::{CryptoPrimitives, Ed25519Primitives};
use crate::request::{BatchRequest, Operation, SigningBackend, TransactionRequest};
use crate::transaction::Transaction;

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Assembles a [`TransactionService`] from its collaborators.
pub struct TransactionServiceBuilder {
    fees: Arc<dyn FeeResolver>,
    accounts: Arc<dyn AccountProvider>,
    primitives: Option<Arc<dyn CryptoPrimitives>>,
    hardware: Option<Arc<dyn HardwareSigner>>,
    config: PipelineConfig,
}

impl TransactionServiceBuilder {
    /// Defaults to [`Ed25519Primitives`].
    pub fn primitives(mut self, primitives: Arc<dyn CryptoPrimitives>) -> Self {
        self.primitives = Some(primitives);
        self
    }

    pub fn hardware_signer(mut self, signer: Arc<dyn HardwareSigner>) -> Self {
        self.hardware = Some(signer);
        self
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> TransactionService {
        let version = self.config.network_version();
        let primitives = self
            .primitives
            .unwrap_or_else(|| Arc::new(Ed25519Primitives::new()));

        let validator = TransactionValidator::new(primitives.clone(), version);
        let factory = TransactionFactory::new(primitives.clone(), version);
        let mut coordinator = SigningCoordinator::new(primitives, version)
            .with_sender_check(self.config.hardware_sender_check);
        if let Some(signer) = self.hardware {
            coordinator = coordinator.with_hardware(HardwareChannel::new(signer));
        }
        let batch = BatchOrchestrator::new(
            validator.clone(),
            factory.clone(),
            coordinator.clone(),
            self.config.hardware_stagger,
        );

        TransactionService {
            fees: self.fees,
            accounts: self.accounts,
            config: self.config,
            validator,
            factory,
            coordinator,
            batch,
        }
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Builds, validates and signs wallet transactions.
pub struct TransactionService {
    fees: Arc<dyn FeeResolver>,
    accounts: Arc<dyn AccountProvider>,
    config: PipelineConfig,
    validator: TransactionValidator,
    factory: TransactionFactory,
    coordinator: SigningCoordinator,
    batch: BatchOrchestrator,
}

impl TransactionService {
    pub fn builder(
        fees: Arc<dyn FeeResolver>,
        accounts: Arc<dyn AccountProvider>,
    ) -> TransactionServiceBuilder {
        TransactionServiceBuilder {
            fees,
            accounts,
            primitives: None,
            hardware: None,
            config: PipelineConfig::default(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs one request through the whole pipeline.
    pub async fn create(&self, request: TransactionRequest) -> Result<Transaction> {
        let span = info_span!(
            "transaction",
            kind = %request.kind(),
            from = %request.from_address,
            backend = request.backend.label(),
        );
        async {
            let mut lifecycle = TransactionLifecycle::new(request.kind());
            let result = self.run(&request, &mut lifecycle).await;
            match &result {
                Ok(tx) => info!(
                    id = tx.id.as_deref().unwrap_or_default(),
                    elapsed_ms = lifecycle.elapsed_ms(),
                    "transaction finalized"
                ),
                Err(err) => {
                    let recorded = lifecycle.mark_failed(err);
                    debug_assert!(recorded, "failure after a terminal stage");
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        request: &TransactionRequest,
        lifecycle: &mut TransactionLifecycle,
    ) -> Result<Transaction> {
        let (account, fees) = self.snapshot(&request.from_address).await?;
        self.validator.validate(request, &account, &fees)?;

        if request.backend.is_hardware() && !self.coordinator.has_hardware() {
            error!("hardware signing requested but no signer is configured");
            return Err(SigningError::NoHardwareSigner.into());
        }

        let advanced = lifecycle.mark_building();
        debug_assert!(advanced, "building entered out of order");
        let tx = self.factory.build(request, fees.fee_for(request.kind()))?;

        let advanced = lifecycle.mark_signing(match request.backend {
            SigningBackend::Local(_) => SigningPath::Local,
            SigningBackend::Hardware { .. } => SigningPath::Hardware,
        });
        debug_assert!(advanced, "signing entered out of order");
        let signed = self.coordinator.sign(tx, request).await?;

        let advanced = lifecycle.mark_finalized(signed.id.clone().unwrap_or_default());
        debug_assert!(advanced, "finalized out of order");
        Ok(signed)
    }

    /// Fetches the account and the fee schedule concurrently.
    async fn snapshot(&self, address: &str) -> Result<(Account, FeeSchedule)> {
        let (account, fees) = tokio::join!(self.accounts.get_account(address), self.fees.get_fees());
        Ok((
            account.map_err(PipelineError::Account)?,
            fees.map_err(PipelineError::Fees)?,
        ))
    }

    // -----------------------------------------------------------------------
    // Per-kind entry points
    // -----------------------------------------------------------------------

    /// A transfer of `amount` arktoshi to `recipient`.
    pub async fn create_send(
        &self,
        from_address: impl Into<String>,
        backend: SigningBackend,
        recipient: impl Into<String>,
        amount: u64,
        memo: Option<String>,
    ) -> Result<Transaction> {
        let operation = Operation::Transfer {
            recipient: recipient.into(),
            amount,
            memo,
        };
        self.create(TransactionRequest::new(from_address, operation, backend))
            .await
    }

    /// Registers a second passphrase on the sender account.
    pub async fn create_second_passphrase(
        &self,
        from_address: impl Into<String>,
        backend: SigningBackend,
        second_passphrase: impl Into<Passphrase>,
    ) -> Result<Transaction> {
        let operation = Operation::SecondSignature {
            second_passphrase: second_passphrase.into(),
        };
        self.create(TransactionRequest::new(from_address, operation, backend))
            .await
    }

    /// Registers the sender as a delegate named `username`.
    pub async fn create_delegate(
        &self,
        from_address: impl Into<String>,
        backend: SigningBackend,
        username: impl Into<String>,
    ) -> Result<Transaction> {
        let operation = Operation::DelegateRegistration {
            username: username.into(),
        };
        self.create(TransactionRequest::new(from_address, operation, backend))
            .await
    }

    /// Casts or removes votes, each `+<public key>` or `-<public key>`.
    pub async fn create_vote(
        &self,
        from_address: impl Into<String>,
        backend: SigningBackend,
        votes: Vec<String>,
    ) -> Result<Transaction> {
        self.create(TransactionRequest::new(
            from_address,
            Operation::Vote { votes },
            backend,
        ))
        .await
    }

    /// Builds and signs a batch of transfers. All or nothing.
    pub async fn create_multiple_sends(&self, batch: BatchRequest) -> Result<Vec<Transaction>> {
        let (_never, cancel) = watch::channel(false);
        self.create_multiple_sends_with_cancel(batch, cancel).await
    }

    /// Like [`Self::create_multiple_sends`], but sending `true` on `cancel`
    /// abandons every item that has not reached the device yet.
    pub async fn create_multiple_sends_with_cancel(
        &self,
        batch: BatchRequest,
        cancel: watch::Receiver<bool>,
    ) -> Result<Vec<Transaction>> {
        let (account, fees) = self.snapshot(&batch.from_address).await?;
        self.batch.build_batch(&batch, &account, &fees, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{InMemoryAccounts, StaticFees};
    use crate::config::DEVNET_VERSION;
    use crate::crypto::derive_address;
    use crate::error::ProviderError;
    use crate::transaction::{verify_transaction, Asset, TransactionKind};

    fn address(seed: &str) -> String {
        derive_address(&Passphrase::from(seed).keypair().public_key(), DEVNET_VERSION)
    }

    fn service(balance: u64) -> TransactionService {
        let accounts = InMemoryAccounts::with_accounts([Account {
            address: address("alice"),
            public_key: None,
            balance,
        }]);
        TransactionService::builder(Arc::new(StaticFees::default()), Arc::new(accounts)).build()
    }

    #[tokio::test]
    async fn send_end_to_end() {
        let tx = service(1_000_000_000)
            .create_send(
                address("alice"),
                SigningBackend::local("alice"),
                address("bob"),
                250_000_000,
                Some("thanks".into()),
            )
            .await
            .unwrap();
        assert_eq!(tx.fee, FeeSchedule::default().send);
        assert_eq!(tx.vendor_field.as_deref(), Some("thanks"));
        assert_eq!(verify_transaction(&tx), Ok(()));
    }

    #[tokio::test]
    async fn delegate_registration_needs_delegate_fee() {
        let fee = FeeSchedule::default().delegate;
        let svc = service(fee - 1);
        let err = svc
            .create_delegate(address("alice"), SigningBackend::local("alice"), "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientFunds { .. }));

        let svc = service(fee);
        let tx = svc
            .create_delegate(address("alice"), SigningBackend::local("alice"), "alice")
            .await
            .unwrap();
        assert_eq!(tx.kind, TransactionKind::DelegateRegistration);
        assert_eq!(tx.fee, fee);
    }

    #[tokio::test]
    async fn second_passphrase_and_vote() {
        let svc = service(10_000_000_000);
        let tx = svc
            .create_second_passphrase(address("alice"), SigningBackend::local("alice"), "second")
            .await
            .unwrap();
        assert!(matches!(tx.asset, Some(Asset::Signature { .. })));

        let vote = format!("+{}", Passphrase::from("delegate").keypair().public_key());
        let tx = svc
            .create_vote(address("alice"), SigningBackend::local("alice"), vec![vote])
            .await
            .unwrap();
        assert_eq!(tx.recipient_id, Some(address("alice")));
    }

    #[tokio::test]
    async fn unknown_account_is_a_lookup_error() {
        let err = service(0)
            .create_delegate(address("carol"), SigningBackend::local("carol"), "carol")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Account(ProviderError::UnknownAccount { .. })
        ));
    }

    #[tokio::test]
    async fn wrong_passphrase_is_address_mismatch() {
        let err = service(1_000_000_000)
            .create_send(
                address("alice"),
                SigningBackend::local("not alice"),
                address("bob"),
                1,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::AddressMismatch { .. }));
    }
}
