//! Signing coordination.
//!
//! Two backends sit behind one contract:
//!
//! - **Local**: the primitives already signed while building. The
//!   coordinator re-derives the sender address from `senderPublicKey` and
//!   refuses the transaction if it is not the claimed account.
//! - **Hardware**: the built payload is prepared for the device (signature
//!   stripped, externally supplied public key set, votes addressed to the
//!   sender), queued on the [`HardwareChannel`], and finalized with the
//!   returned signature and a fresh identifier.
//!
//! Hardware failures are logged and surfaced; nothing is retried here.

use std::sync::Arc;
use tracing::{debug, error};

use crate::config::HardwareSenderCheck;
use crate::crypto::PublicKey;
use crate::error::{PipelineError, Result, SigningError};
use crate::hardware::{HardwareChannel, HardwareSlot};
use crate::primitives::CryptoPrimitives;
use crate::request::{DeviceRef, SigningBackend, TransactionRequest};
use crate::transaction::{Transaction, TransactionKind};

/// Produces finalized, identified transactions from built ones.
#[derive(Clone)]
pub struct SigningCoordinator {
    primitives: Arc<dyn CryptoPrimitives>,
    hardware: Option<HardwareChannel>,
    network_version: u8,
    sender_check: HardwareSenderCheck,
}

impl SigningCoordinator {
    pub fn new(primitives: Arc<dyn CryptoPrimitives>, network_version: u8) -> Self {
        Self {
            primitives,
            hardware: None,
            network_version,
            sender_check: HardwareSenderCheck::default(),
        }
    }

    pub fn with_hardware(mut self, channel: HardwareChannel) -> Self {
        self.hardware = Some(channel);
        self
    }

    pub fn with_sender_check(mut self, check: HardwareSenderCheck) -> Self {
        self.sender_check = check;
        self
    }

    pub fn has_hardware(&self) -> bool {
        self.hardware.is_some()
    }

    /// Signs `tx` with the backend selected by `request`.
    pub async fn sign(&self, tx: Transaction, request: &TransactionRequest) -> Result<Transaction> {
        match &request.backend {
            SigningBackend::Local(_) => self.finalize_local(tx, &request.from_address),
            SigningBackend::Hardware { device, public_key } => {
                let payload = self.prepare_hardware(tx, &request.from_address, public_key)?;
                self.dispatch_hardware(payload, device).await
            }
        }
    }

    // -----------------------------------------------------------------------
    // Local backend
    // -----------------------------------------------------------------------

    /// Accepts a locally signed transaction if its key belongs to
    /// `from_address`. Returns it untouched.
    pub fn finalize_local(&self, tx: Transaction, from_address: &str) -> Result<Transaction> {
        let derived = tx
            .sender_public_key
            .map(|pk| self.primitives.derive_address(&pk, self.network_version))
            .unwrap_or_default();

        if derived != from_address {
            return Err(PipelineError::AddressMismatch {
                expected: from_address.to_string(),
                derived,
            });
        }
        debug!(kind = %tx.kind, "local signature accepted");
        Ok(tx)
    }

    // -----------------------------------------------------------------------
    // Hardware backend
    // -----------------------------------------------------------------------

    /// Turns a built transaction into the payload the device signs.
    ///
    /// With [`HardwareSenderCheck::Enforce`] the supplied public key must
    /// derive `from_address`; the default trusts it.
    pub fn prepare_hardware(
        &self,
        mut tx: Transaction,
        from_address: &str,
        public_key: &PublicKey,
    ) -> Result<Transaction> {
        if self.sender_check == HardwareSenderCheck::Enforce {
            let derived = self.primitives.derive_address(public_key, self.network_version);
            if derived != from_address {
                return Err(PipelineError::AddressMismatch {
                    expected: from_address.to_string(),
                    derived,
                });
            }
        }

        tx.signature = None;
        tx.sign_signature = None;
        tx.id = None;
        tx.sender_public_key = Some(*public_key);
        if tx.kind == TransactionKind::Vote {
            tx.recipient_id = Some(from_address.to_string());
        }
        Ok(tx)
    }

    /// Waits for the device slot. Fails at once when no hardware signer is
    /// configured.
    pub async fn reserve_hardware(&self) -> Result<HardwareSlot> {
        match &self.hardware {
            Some(channel) => Ok(channel.reserve().await),
            None => {
                error!("hardware signing requested but no signer is configured");
                Err(SigningError::NoHardwareSigner.into())
            }
        }
    }

    /// Has the device sign a prepared payload on an already reserved slot,
    /// then attaches the signature and the identifier.
    pub async fn sign_on_slot(
        &self,
        slot: HardwareSlot,
        mut tx: Transaction,
        device: &DeviceRef,
    ) -> Result<Transaction> {
        let signature = slot.sign(device, &tx).await.map_err(|err| {
            error!(device = %device, kind = %tx.kind, error = %err, "hardware signing failed");
            err
        })?;

        tx.signature = Some(signature.to_hex());
        tx.id = Some(self.primitives.compute_id(&tx));
        debug!(device = %device, kind = %tx.kind, "hardware signature attached");
        Ok(tx)
    }

    /// Reserves the device and signs a prepared payload.
    pub async fn dispatch_hardware(&self, tx: Transaction, device: &DeviceRef) -> Result<Transaction> {
        let slot = self.reserve_hardware().await?;
        self.sign_on_slot(slot, tx, device).await
    }
}
