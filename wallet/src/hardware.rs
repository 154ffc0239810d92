//! Hardware signer port and device serialization.
//!
//! A hardware signer holds private key material and signs a transaction
//! payload on request without ever exposing the key. The device talks over
//! a single channel and cannot process two requests at once, so every
//! request goes through a [`HardwareChannel`]: a FIFO lock in front of the
//! signer. Requests queue in arrival order and reach the device one at a
//! time.
//!
//! [`SoftwareDevice`] is an in-process stand-in for a real device, used for
//! development and tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tokio::time::Instant;
use tracing::debug;

use crate::crypto::{Keypair, PublicKey, Signature};
use crate::error::{DeviceError, SigningError};
use crate::request::DeviceRef;
use crate::transaction::Transaction;

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

/// What a device returns for a successful signing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareSignature {
    /// Hex-encoded signature over the transaction's signing digest.
    pub signature: String,
}

/// An external signing device.
///
/// Implementations receive the transaction exactly as it will be
/// finalized, minus the signature: `senderPublicKey` and any kind-specific
/// fields are already set. No retry happens on failure.
#[async_trait]
pub trait HardwareSigner: Send + Sync {
    async fn sign(
        &self,
        device: &DeviceRef,
        transaction: &Transaction,
    ) -> Result<HardwareSignature, DeviceError>;
}

// ---------------------------------------------------------------------------
// HardwareChannel
// ---------------------------------------------------------------------------

/// Single-slot access to a hardware signer.
///
/// Cloning shares the slot. `tokio::sync::Mutex` is fair, so waiters are
/// served in the order they started waiting.
#[derive(Clone)]
pub struct HardwareChannel {
    signer: Arc<dyn HardwareSigner>,
    slot: Arc<tokio::sync::Mutex<()>>,
}

impl HardwareChannel {
    pub fn new(signer: Arc<dyn HardwareSigner>) -> Self {
        Self {
            signer,
            slot: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Waits for exclusive use of the device. Dropping the returned slot
    /// before calling [`HardwareSlot::sign`] gives up the place without
    /// anything reaching the device.
    pub async fn reserve(&self) -> HardwareSlot {
        HardwareSlot {
            _guard: self.slot.clone().lock_owned().await,
            signer: self.signer.clone(),
        }
    }

    /// Reserves the device and signs in one step.
    pub async fn sign(
        &self,
        device: &DeviceRef,
        transaction: &Transaction,
    ) -> Result<Signature, SigningError> {
        self.reserve().await.sign(device, transaction).await
    }
}

/// Exclusive use of the device, held until the signature comes back.
pub struct HardwareSlot {
    _guard: OwnedMutexGuard<()>,
    signer: Arc<dyn HardwareSigner>,
}

impl HardwareSlot {
    /// Asks the device to sign. The returned signature has been checked
    /// for shape, not validity.
    pub async fn sign(
        self,
        device: &DeviceRef,
        transaction: &Transaction,
    ) -> Result<Signature, SigningError> {
        debug!(device = %device, kind = %transaction.kind, "dispatching to hardware signer");

        let response = self
            .signer
            .sign(device, transaction)
            .await
            .map_err(|source| SigningError::Device {
                device: device.to_string(),
                source,
            })?;

        Signature::from_hex(&response.signature).map_err(|_| SigningError::MalformedSignature {
            device: device.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// SoftwareDevice
// ---------------------------------------------------------------------------

/// A device record kept by [`SoftwareDevice`] for each request it served.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub device: DeviceRef,
    pub transaction: Transaction,
    /// When the request reached the device.
    pub at: Instant,
}

/// An in-process "hardware" signer backed by a key pair.
///
/// Records every dispatch with a timestamp, can simulate device latency
/// and can be told to fail specific calls. It also tracks how many
/// requests were ever in flight at once, which must stay at one when the
/// device sits behind a [`HardwareChannel`].
pub struct SoftwareDevice {
    keypair: Keypair,
    latency: Duration,
    failures: Mutex<HashMap<usize, DeviceError>>,
    dispatches: Mutex<Vec<Dispatch>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl SoftwareDevice {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair,
            latency: Duration::ZERO,
            failures: Mutex::new(HashMap::new()),
            dispatches: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Time the device spends on each request.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Makes the `call`-th request (0-based, in dispatch order) fail.
    pub fn fail_call(self, call: usize, error: DeviceError) -> Self {
        self.failures.lock().insert(call, error);
        self
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    /// Every request served so far, in dispatch order.
    pub fn dispatches(&self) -> Vec<Dispatch> {
        self.dispatches.lock().clone()
    }

    /// Highest number of concurrently running requests observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HardwareSigner for SoftwareDevice {
    async fn sign(
        &self,
        device: &DeviceRef,
        transaction: &Transaction,
    ) -> Result<HardwareSignature, DeviceError> {
        let _in_flight = InFlight::enter(&self.in_flight, &self.max_in_flight);

        let call = {
            let mut dispatches = self.dispatches.lock();
            dispatches.push(Dispatch {
                device: device.clone(),
                transaction: transaction.clone(),
                at: Instant::now(),
            });
            dispatches.len() - 1
        };

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if let Some(error) = self.failures.lock().remove(&call) {
            return Err(error);
        }
        Ok(HardwareSignature {
            signature: self.keypair.sign(&transaction.signing_digest()).to_hex(),
        })
    }
}

/// Counts one running request; leaves on drop, including when the caller
/// abandons the request mid-flight.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize, max: &AtomicUsize) -> Self {
        let running = counter.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(running, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{TransactionBuilder, TransactionKind};

    fn payload() -> Transaction {
        TransactionBuilder::new(TransactionKind::Transfer)
            .amount(10)
            .timestamp(1)
            .build()
    }

    struct Garbage;

    #[async_trait]
    impl HardwareSigner for Garbage {
        async fn sign(
            &self,
            _device: &DeviceRef,
            _transaction: &Transaction,
        ) -> Result<HardwareSignature, DeviceError> {
            Ok(HardwareSignature {
                signature: "zz".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn channel_returns_device_signature() {
        let device = Arc::new(SoftwareDevice::new(Keypair::generate()));
        let channel = HardwareChannel::new(device.clone());
        let tx = payload();

        let sig = channel.sign(&DeviceRef("slot-0".into()), &tx).await.unwrap();
        assert!(device.public_key().verify(&tx.signing_digest(), &sig));
        assert_eq!(device.dispatches().len(), 1);
    }

    #[tokio::test]
    async fn device_failure_is_wrapped() {
        let device = Arc::new(SoftwareDevice::new(Keypair::generate()).fail_call(0, DeviceError::Rejected));
        let channel = HardwareChannel::new(device);

        let err = channel.sign(&DeviceRef("slot-0".into()), &payload()).await.unwrap_err();
        assert_eq!(
            err,
            SigningError::Device {
                device: "slot-0".to_string(),
                source: DeviceError::Rejected
            }
        );
    }

    #[tokio::test]
    async fn malformed_device_signature_is_rejected() {
        let channel = HardwareChannel::new(Arc::new(Garbage));
        let err = channel.sign(&DeviceRef("d".into()), &payload()).await.unwrap_err();
        assert!(matches!(err, SigningError::MalformedSignature { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn channel_serializes_concurrent_requests() {
        let device = Arc::new(
            SoftwareDevice::new(Keypair::generate()).with_latency(Duration::from_millis(500)),
        );
        let channel = HardwareChannel::new(device.clone());
        let tx = payload();
        let dev = DeviceRef("d".into());

        let (a, b, c) = tokio::join!(
            channel.sign(&dev, &tx),
            channel.sign(&dev, &tx),
            channel.sign(&dev, &tx)
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(device.max_in_flight(), 1);

        let times: Vec<_> = device.dispatches().iter().map(|d| d.at).collect();
        assert!(times[1] - times[0] >= Duration::from_millis(500));
        assert!(times[2] - times[1] >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_request_leaves_the_in_flight_count() {
        let device =
            SoftwareDevice::new(Keypair::generate()).with_latency(Duration::from_millis(500));
        let dev = DeviceRef("d".into());
        let tx = payload();

        let abandoned =
            tokio::time::timeout(Duration::from_millis(100), device.sign(&dev, &tx)).await;
        assert!(abandoned.is_err());

        device.sign(&dev, &tx).await.unwrap();
        assert_eq!(device.max_in_flight(), 1);
        assert_eq!(device.dispatches().len(), 2);
    }

    #[tokio::test]
    async fn dropped_reservation_never_reaches_device() {
        let device = Arc::new(SoftwareDevice::new(Keypair::generate()));
        let channel = HardwareChannel::new(device.clone());

        drop(channel.reserve().await);
        channel.sign(&DeviceRef("d".into()), &payload()).await.unwrap();
        assert_eq!(device.dispatches().len(), 1);
    }
}
