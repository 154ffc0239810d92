//! Batched multi-recipient transfers.
//!
//! A batch is validated as one unit: every recipient address, then the
//! whole-batch total `sum(amount_i) + n * fee.send`, before anything is
//! built. Only then is each item built and signed.
//!
//! ## Hardware batches
//!
//! Item `i` may not reach the device before `i * stagger` has passed since
//! the batch started. On top of the stagger, every request queues on the
//! [`HardwareChannel`](crate::hardware::HardwareChannel), so a slow device
//! still never sees two requests at once.
//!
//! Each item is signed on its own task. When one fails the batch fails
//! with that error, but the sibling tasks are left running: a request that
//! is already on the device is not interrupted. Callers that want pending
//! items abandoned pass a cancellation receiver and send `true`; items that
//! have not been dispatched yet then fail with
//! [`SigningError::Cancelled`].

use futures::stream::{FuturesUnordered, StreamExt};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::coordinator::SigningCoordinator;
use super::factory::TransactionFactory;
use super::validator::TransactionValidator;
use crate::account::{Account, FeeSchedule};
use crate::crypto::PublicKey;
use crate::error::{PipelineError, Result, SigningError};
use crate::request::{BatchRequest, DeviceRef, SigningBackend};
use crate::transaction::{Transaction, TransactionKind};

/// Builds and signs a batch of transfers from one sender.
#[derive(Clone)]
pub struct BatchOrchestrator {
    validator: TransactionValidator,
    factory: TransactionFactory,
    coordinator: SigningCoordinator,
    stagger: Duration,
}

impl BatchOrchestrator {
    pub fn new(
        validator: TransactionValidator,
        factory: TransactionFactory,
        coordinator: SigningCoordinator,
        stagger: Duration,
    ) -> Self {
        Self {
            validator,
            factory,
            coordinator,
            stagger,
        }
    }

    /// Runs the batch against one account and fee snapshot.
    ///
    /// Returns every signed transaction in input order, or the first
    /// failure. An empty batch yields an empty result.
    pub async fn build_batch(
        &self,
        batch: &BatchRequest,
        account: &Account,
        fees: &FeeSchedule,
        cancel: watch::Receiver<bool>,
    ) -> Result<Vec<Transaction>> {
        let span = info_span!(
            "batch",
            batch_id = %Uuid::new_v4(),
            from = %batch.from_address,
            items = batch.items.len(),
            backend = batch.backend.label(),
        );
        self.run(batch, account, fees, cancel).instrument(span).await
    }

    async fn run(
        &self,
        batch: &BatchRequest,
        account: &Account,
        fees: &FeeSchedule,
        cancel: watch::Receiver<bool>,
    ) -> Result<Vec<Transaction>> {
        self.validator
            .validate_batch(&batch.from_address, &batch.items, account, fees)?;
        if batch.items.is_empty() {
            return Ok(Vec::new());
        }

        if batch.backend.is_hardware() && !self.coordinator.has_hardware() {
            error!("hardware batch requested but no signer is configured");
            return Err(SigningError::NoHardwareSigner.into());
        }

        let fee = fees.fee_for(TransactionKind::Transfer);
        let mut built = Vec::with_capacity(batch.items.len());
        for request in (0..batch.items.len()).filter_map(|i| batch.item_request(i)) {
            built.push(self.factory.build(&request, fee)?);
        }
        debug!(count = built.len(), "batch built");

        let started = Instant::now();
        let signed = match &batch.backend {
            SigningBackend::Local(_) => built
                .into_iter()
                .map(|tx| self.coordinator.finalize_local(tx, &batch.from_address))
                .collect::<Result<Vec<_>>>()?,
            SigningBackend::Hardware { device, public_key } => {
                self.sign_on_device(built, &batch.from_address, device, public_key, cancel)
                    .await?
            }
        };

        info!(
            count = signed.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch finalized"
        );
        Ok(signed)
    }

    async fn sign_on_device(
        &self,
        built: Vec<Transaction>,
        from_address: &str,
        device: &DeviceRef,
        public_key: &PublicKey,
        cancel: watch::Receiver<bool>,
    ) -> Result<Vec<Transaction>> {
        let payloads = built
            .into_iter()
            .map(|tx| {
                self.coordinator
                    .prepare_hardware(tx, from_address, public_key)
            })
            .collect::<Result<Vec<_>>>()?;

        let count = payloads.len();
        let start = Instant::now();
        let mut tasks: FuturesUnordered<_> = payloads
            .into_iter()
            .enumerate()
            .map(|(index, tx)| {
                let handle = tokio::spawn(
                    sign_item(
                        self.coordinator.clone(),
                        index,
                        tx,
                        device.clone(),
                        start + self.stagger_for(index),
                        cancel.clone(),
                    )
                    .in_current_span(),
                );
                async move { (index, handle.await) }
            })
            .collect();

        let mut signed: Vec<Option<Transaction>> = vec![None; count];
        while let Some((index, joined)) = tasks.next().await {
            let outcome = joined.map_err(|e| {
                error!(index, error = %e, "batch signing task aborted");
                PipelineError::from(SigningError::TaskAborted(e.to_string()))
            })?;
            match outcome {
                Ok(tx) => signed[index] = Some(tx),
                Err(err) => {
                    warn!(index, error = %err, "batch item failed, remaining requests left running");
                    return Err(err);
                }
            }
        }
        Ok(signed.into_iter().flatten().collect())
    }

    fn stagger_for(&self, index: usize) -> Duration {
        self.stagger
            .saturating_mul(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

/// Waits for the item's stagger slot and the device, then signs. Either
/// wait can be cut short by cancellation; the device call cannot.
async fn sign_item(
    coordinator: SigningCoordinator,
    index: usize,
    tx: Transaction,
    device: DeviceRef,
    ready_at: Instant,
    mut cancel: watch::Receiver<bool>,
) -> Result<Transaction> {
    tokio::select! {
        biased;
        _ = cancelled(&mut cancel) => return Err(SigningError::Cancelled { index }.into()),
        _ = sleep_until(ready_at) => {}
    }

    let slot = tokio::select! {
        biased;
        _ = cancelled(&mut cancel) => return Err(SigningError::Cancelled { index }.into()),
        slot = coordinator.reserve_hardware() => slot?,
    };

    debug!(index, "batch item dispatched");
    coordinator.sign_on_slot(slot, tx, &device).await
}

/// Resolves once `true` is observed. A dropped sender never cancels.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
