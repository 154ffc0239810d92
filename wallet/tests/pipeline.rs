//! End-to-end pipeline behaviour through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arkwright_wallet::config::{DEVNET_VERSION, MAINNET_VERSION};
use arkwright_wallet::crypto::{derive_address, Keypair, Passphrase, PublicKey};
use arkwright_wallet::error::{BuildError, DeviceError, PipelineError, SigningError};
use arkwright_wallet::transaction::verify_transaction;
use arkwright_wallet::{
    Account, BatchRequest, CryptoPrimitives, Ed25519Primitives, FeeSchedule, HardwareSenderCheck,
    InMemoryAccounts, LocalCredentials, Network, PipelineConfig, SigningBackend, SoftwareDevice,
    StaticFees, Transaction, TransactionKind, TransactionService, TransferItem,
};

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// Real primitives that count every build call.
struct CountingPrimitives {
    inner: Ed25519Primitives,
    builds: AtomicUsize,
}

impl CountingPrimitives {
    fn new() -> Self {
        Self {
            inner: Ed25519Primitives::new().with_fixed_timestamp(100),
            builds: AtomicUsize::new(0),
        }
    }

    fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.builds.fetch_add(1, Ordering::SeqCst);
    }
}

impl CryptoPrimitives for CountingPrimitives {
    fn derive_address(&self, public_key: &PublicKey, network_version: u8) -> String {
        self.inner.derive_address(public_key, network_version)
    }

    fn is_valid_address(&self, address: &str, network_version: u8) -> bool {
        self.inner.is_valid_address(address, network_version)
    }

    fn create_transfer(
        &self,
        recipient: &str,
        amount: u64,
        memo: Option<&str>,
        fee: u64,
        credentials: Option<&LocalCredentials>,
    ) -> Result<Transaction, BuildError> {
        self.count();
        self.inner
            .create_transfer(recipient, amount, memo, fee, credentials)
    }

    fn create_second_signature(
        &self,
        second_passphrase: &Passphrase,
        fee: u64,
        credentials: Option<&LocalCredentials>,
    ) -> Result<Transaction, BuildError> {
        self.count();
        self.inner
            .create_second_signature(second_passphrase, fee, credentials)
    }

    fn create_delegate(
        &self,
        username: &str,
        fee: u64,
        credentials: Option<&LocalCredentials>,
    ) -> Result<Transaction, BuildError> {
        self.count();
        self.inner.create_delegate(username, fee, credentials)
    }

    fn create_vote(
        &self,
        votes: &[String],
        fee: u64,
        network_version: u8,
        credentials: Option<&LocalCredentials>,
    ) -> Result<Transaction, BuildError> {
        self.count();
        self.inner
            .create_vote(votes, fee, network_version, credentials)
    }

    fn compute_id(&self, transaction: &Transaction) -> String {
        self.inner.compute_id(transaction)
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const SEND_FEE: u64 = 10;

fn address_of(pk: &PublicKey) -> String {
    derive_address(pk, DEVNET_VERSION)
}

fn address(seed: &str) -> String {
    address_of(&Passphrase::from(seed).keypair().public_key())
}

fn fees() -> FeeSchedule {
    FeeSchedule {
        send: SEND_FEE,
        secondsignature: 50,
        delegate: 250,
        vote: 20,
    }
}

struct Harness {
    service: TransactionService,
    primitives: Arc<CountingPrimitives>,
}

fn harness(address: String, balance: u64, device: Option<Arc<SoftwareDevice>>) -> Harness {
    harness_with(address, balance, device, PipelineConfig::default())
}

fn harness_with(
    address: String,
    balance: u64,
    device: Option<Arc<SoftwareDevice>>,
    config: PipelineConfig,
) -> Harness {
    let primitives = Arc::new(CountingPrimitives::new());
    let accounts = InMemoryAccounts::with_accounts([Account {
        address,
        public_key: None,
        balance,
    }]);
    let mut builder = TransactionService::builder(Arc::new(StaticFees(fees())), Arc::new(accounts))
        .primitives(primitives.clone())
        .config(config);
    if let Some(device) = device {
        builder = builder.hardware_signer(device);
    }
    Harness {
        service: builder.build(),
        primitives,
    }
}

fn transfers(amounts: &[u64]) -> Vec<TransferItem> {
    amounts
        .iter()
        .enumerate()
        .map(|(i, amount)| TransferItem::new(address(&format!("recipient-{i}")), *amount))
        .collect()
}

// ---------------------------------------------------------------------------
// Single transactions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn send_within_balance_succeeds() {
    let h = harness(address("alice"), 1_000, None);
    let tx = h
        .service
        .create_send(address("alice"), SigningBackend::local("alice"), address("bob"), 500, None)
        .await
        .unwrap();

    assert_eq!(tx.kind, TransactionKind::Transfer);
    assert_eq!(tx.amount, 500);
    assert_eq!(tx.fee, SEND_FEE);
    assert_eq!(tx.sender_id, Some(address("alice")));
    assert_eq!(verify_transaction(&tx), Ok(()));
}

#[tokio::test]
async fn send_over_balance_fails_before_any_build() {
    let h = harness(address("alice"), 1_000, None);
    let err = h
        .service
        .create_send(address("alice"), SigningBackend::local("alice"), address("bob"), 995, None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::InsufficientFunds {
            required: 1_005,
            available: 1_000,
            ..
        }
    ));
    assert_eq!(h.primitives.builds(), 0);
}

#[tokio::test]
async fn wrong_passphrase_produces_no_transaction() {
    let h = harness(address("alice"), 1_000, None);
    let err = h
        .service
        .create_send(address("alice"), SigningBackend::local("eve"), address("bob"), 1, None)
        .await
        .unwrap_err();

    match err {
        PipelineError::AddressMismatch { expected, derived } => {
            assert_eq!(expected, address("alice"));
            assert_eq!(derived, address("eve"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_vote_is_a_build_failure() {
    let h = harness(address("alice"), 1_000, None);
    let err = h
        .service
        .create_vote(address("alice"), SigningBackend::local("alice"), vec!["+zz".into()])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Build {
            kind: TransactionKind::Vote,
            source: BuildError::MalformedVote { .. }
        }
    ));
}

#[tokio::test]
async fn mainnet_vote_is_addressed_to_the_mainnet_sender() {
    let from = derive_address(
        &Passphrase::from("alice").keypair().public_key(),
        MAINNET_VERSION,
    );
    let accounts = InMemoryAccounts::with_accounts([Account {
        address: from.clone(),
        public_key: None,
        balance: 1_000,
    }]);
    let service = TransactionService::builder(Arc::new(StaticFees(fees())), Arc::new(accounts))
        .primitives(Arc::new(Ed25519Primitives::default()))
        .config(PipelineConfig::for_network(Network::mainnet()))
        .build();

    let vote = format!("+{}", Passphrase::from("delegate").keypair().public_key());
    let tx = service
        .create_vote(from.clone(), SigningBackend::local("alice"), vec![vote])
        .await
        .unwrap();

    assert_eq!(tx.recipient_id.as_deref(), Some(from.as_str()));
    assert_eq!(tx.sender_id.as_deref(), Some(from.as_str()));
    assert_eq!(verify_transaction(&tx), Ok(()));
}

#[tokio::test]
async fn identifier_is_reproducible() {
    let h = harness(address("alice"), 1_000, None);
    let tx = h
        .service
        .create_send(address("alice"), SigningBackend::local("alice"), address("bob"), 1, None)
        .await
        .unwrap();

    let first = h.primitives.compute_id(&tx);
    let second = h.primitives.compute_id(&tx);
    assert_eq!(first, second);
    assert_eq!(tx.id.as_deref(), Some(first.as_str()));

    let mut changed = tx.clone();
    changed.amount += 1;
    assert_ne!(h.primitives.compute_id(&changed), first);
}

#[tokio::test]
async fn hardware_vote_is_self_addressed_and_signed_by_device() {
    let device = Arc::new(SoftwareDevice::new(Keypair::generate()));
    let pk = device.public_key();
    let from = address_of(&pk);
    let h = harness(from.clone(), 1_000, Some(device.clone()));

    let vote = format!("-{}", Passphrase::from("delegate").keypair().public_key());
    let tx = h
        .service
        .create_vote(from.clone(), SigningBackend::hardware("44'/111'/0'/0/0", pk), vec![vote])
        .await
        .unwrap();

    assert_eq!(tx.recipient_id.as_deref(), Some(from.as_str()));
    assert_eq!(tx.sender_public_key, Some(pk));
    assert_eq!(tx.fee, 20);
    assert_eq!(verify_transaction(&tx), Ok(()));

    let dispatched = &device.dispatches()[0];
    assert_eq!(dispatched.device.0, "44'/111'/0'/0/0");
    assert!(dispatched.transaction.signature.is_none());
}

#[tokio::test]
async fn device_failure_is_surfaced_without_retry() {
    let device = Arc::new(
        SoftwareDevice::new(Keypair::generate()).fail_call(0, DeviceError::Disconnected),
    );
    let pk = device.public_key();
    let from = address_of(&pk);
    let h = harness(from.clone(), 1_000, Some(device.clone()));

    let err = h
        .service
        .create_send(from, SigningBackend::hardware("d", pk), address("bob"), 1, None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Signing(SigningError::Device {
            source: DeviceError::Disconnected,
            ..
        })
    ));
    assert_eq!(device.dispatches().len(), 1);
}

#[tokio::test]
async fn hardware_trusts_supplied_key_unless_enforced() {
    let device = Arc::new(SoftwareDevice::new(Keypair::generate()));
    let pk = device.public_key();
    // The claimed sender does not belong to the device key.
    let claimed = address("alice");

    let trusting = harness(claimed.clone(), 1_000, Some(device.clone()));
    assert!(trusting
        .service
        .create_send(claimed.clone(), SigningBackend::hardware("d", pk), address("bob"), 1, None)
        .await
        .is_ok());

    let config = PipelineConfig {
        hardware_sender_check: HardwareSenderCheck::Enforce,
        ..PipelineConfig::default()
    };
    let enforcing = harness_with(claimed.clone(), 1_000, Some(device.clone()), config);
    let err = enforcing
        .service
        .create_send(claimed, SigningBackend::hardware("d", pk), address("bob"), 1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::AddressMismatch { .. }));
    // Only the trusting request reached the device.
    assert_eq!(device.dispatches().len(), 1);
}

#[tokio::test]
async fn hardware_request_without_signer_builds_nothing() {
    let pk = Keypair::generate().public_key();
    let from = address_of(&pk);
    let h = harness(from.clone(), 1_000, None);

    let err = h
        .service
        .create_send(from, SigningBackend::hardware("d", pk), address("bob"), 1, None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Signing(SigningError::NoHardwareSigner)
    ));
    assert_eq!(h.primitives.builds(), 0);
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

#[tokio::test]
async fn batch_of_three_succeeds_in_order() {
    let h = harness(address("alice"), 400, None);
    let items = transfers(&[100, 100, 100]);
    let signed = h
        .service
        .create_multiple_sends(BatchRequest {
            from_address: address("alice"),
            items: items.clone(),
            backend: SigningBackend::local("alice"),
        })
        .await
        .unwrap();

    assert_eq!(signed.len(), 3);
    for (tx, item) in signed.iter().zip(&items) {
        assert_eq!(tx.recipient_id.as_deref(), Some(item.address.as_str()));
        assert_eq!(tx.amount, 100);
        assert_eq!(tx.fee, SEND_FEE);
    }
}

#[tokio::test]
async fn batch_with_wrong_passphrase_is_address_mismatch() {
    let h = harness(address("alice"), 10_000, None);
    let result = h
        .service
        .create_multiple_sends(BatchRequest {
            from_address: address("alice"),
            items: transfers(&[100, 100, 100]),
            backend: SigningBackend::local("eve"),
        })
        .await;

    match result {
        Err(PipelineError::AddressMismatch { expected, derived }) => {
            assert_eq!(expected, address("alice"));
            assert_eq!(derived, address("eve"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn batch_with_invalid_recipient_builds_nothing() {
    let h = harness(address("alice"), 10_000, None);
    let mut items = transfers(&[100, 100, 100]);
    items[1].address = "DefinitelyNotAnAddress".into();

    let err = h
        .service
        .create_multiple_sends(BatchRequest {
            from_address: address("alice"),
            items,
            backend: SigningBackend::local("alice"),
        })
        .await
        .unwrap_err();

    match err {
        PipelineError::InvalidAddress { address, .. } => {
            assert_eq!(address, "DefinitelyNotAnAddress")
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(h.primitives.builds(), 0);
}

#[tokio::test]
async fn batch_total_counts_fee_per_item() {
    // 3 * 100 + 3 * 10 = 330 > 329
    let h = harness(address("alice"), 329, None);
    let err = h
        .service
        .create_multiple_sends(BatchRequest {
            from_address: address("alice"),
            items: transfers(&[100, 100, 100]),
            backend: SigningBackend::local("alice"),
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::InsufficientFunds {
            required: 330,
            available: 329,
            ..
        }
    ));
    assert_eq!(h.primitives.builds(), 0);
}

#[tokio::test(start_paused = true)]
async fn hardware_batch_dispatches_on_stagger() {
    let device = Arc::new(
        SoftwareDevice::new(Keypair::generate()).with_latency(Duration::from_millis(300)),
    );
    let pk = device.public_key();
    let from = address_of(&pk);
    let h = harness(from.clone(), 10_000, Some(device.clone()));

    let start = tokio::time::Instant::now();
    let signed = h
        .service
        .create_multiple_sends(BatchRequest {
            from_address: from.clone(),
            items: transfers(&[10, 20, 30, 40]),
            backend: SigningBackend::hardware("d", pk),
        })
        .await
        .unwrap();

    let stagger = PipelineConfig::default().hardware_stagger;
    for (k, dispatch) in device.dispatches().iter().enumerate() {
        assert!(
            dispatch.at - start >= stagger * k as u32,
            "request {k} dispatched before its stagger slot"
        );
    }
    assert_eq!(device.max_in_flight(), 1);
    assert_eq!(
        signed.iter().map(|tx| tx.amount).collect::<Vec<_>>(),
        vec![10, 20, 30, 40]
    );
    assert!(signed.iter().all(|tx| verify_transaction(tx).is_ok()));
}

#[tokio::test(start_paused = true)]
async fn hardware_batch_fails_with_failing_item_error() {
    let device = Arc::new(
        SoftwareDevice::new(Keypair::generate()).fail_call(1, DeviceError::Rejected),
    );
    let pk = device.public_key();
    let from = address_of(&pk);
    let h = harness(from.clone(), 10_000, Some(device.clone()));

    let err = h
        .service
        .create_multiple_sends(BatchRequest {
            from_address: from,
            items: transfers(&[1, 2, 3]),
            backend: SigningBackend::hardware("d", pk),
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Signing(SigningError::Device {
            source: DeviceError::Rejected,
            ..
        })
    ));
}
