//! Request validation.
//!
//! Runs against the account and fee snapshot before any transaction is
//! built. Validation is pure: it reads the request and the snapshot and
//! either accepts or returns the first failure.

use std::sync::Arc;
use tracing::warn;

use crate::account::{Account, FeeSchedule};
use crate::error::{PipelineError, Result};
use crate::primitives::CryptoPrimitives;
use crate::request::{Operation, TransactionRequest, TransferItem};
use crate::transaction::TransactionKind;

/// Checks recipient addresses and balance sufficiency.
#[derive(Clone)]
pub struct TransactionValidator {
    primitives: Arc<dyn CryptoPrimitives>,
    network_version: u8,
}

impl TransactionValidator {
    pub fn new(primitives: Arc<dyn CryptoPrimitives>, network_version: u8) -> Self {
        Self {
            primitives,
            network_version,
        }
    }

    /// Validates a single-transaction request.
    ///
    /// Transfers need a valid recipient and `amount + fee <= balance`. The
    /// other kinds carry no amount; they need `balance >= fee` for their
    /// kind.
    pub fn validate(
        &self,
        request: &TransactionRequest,
        account: &Account,
        fees: &FeeSchedule,
    ) -> Result<()> {
        let fee = fees.fee_for(request.kind());
        let result = match &request.operation {
            Operation::Transfer {
                recipient, amount, ..
            } => self
                .check_address(recipient)
                .and_then(|()| check_funds(account, amount.checked_add(fee))),
            Operation::SecondSignature { .. }
            | Operation::DelegateRegistration { .. }
            | Operation::Vote { .. } => check_funds(account, Some(fee)),
        };

        if let Err(err) = &result {
            warn!(
                kind = %request.kind(),
                from = %request.from_address,
                error = %err,
                "request rejected"
            );
        }
        result
    }

    /// Validates a whole batch of transfers.
    ///
    /// Every recipient address is checked before the balance, and the
    /// balance is checked against `sum(amount_i) + n * fee.send` for the
    /// batch as a whole.
    pub fn validate_batch(
        &self,
        from_address: &str,
        items: &[TransferItem],
        account: &Account,
        fees: &FeeSchedule,
    ) -> Result<()> {
        let result = items
            .iter()
            .try_for_each(|item| self.check_address(&item.address))
            .and_then(|()| check_funds(account, batch_total(items, fees)));

        if let Err(err) = &result {
            warn!(
                from = %from_address,
                items = items.len(),
                error = %err,
                "batch rejected"
            );
        }
        result
    }

    fn check_address(&self, address: &str) -> Result<()> {
        if self
            .primitives
            .is_valid_address(address, self.network_version)
        {
            Ok(())
        } else {
            Err(PipelineError::InvalidAddress {
                address: address.to_string(),
                network_version: self.network_version,
            })
        }
    }
}

/// `sum(amount_i) + n * fee`, or `None` on overflow.
fn batch_total(items: &[TransferItem], fees: &FeeSchedule) -> Option<u64> {
    let fee = fees.fee_for(TransactionKind::Transfer);
    items.iter().try_fold(0u64, |total, item| {
        total.checked_add(item.amount)?.checked_add(fee)
    })
}

/// `required` of `None` means the sum overflowed, which no balance covers.
fn check_funds(account: &Account, required: Option<u64>) -> Result<()> {
    match required {
        Some(required) if required <= account.balance => Ok(()),
        required => Err(PipelineError::InsufficientFunds {
            address: account.address.clone(),
            required: required.unwrap_or(u64::MAX),
            available: account.balance,
        }),
    }
}
