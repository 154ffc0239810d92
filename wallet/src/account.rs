//! Account state and fee schedule ports.
//!
//! Balance and fee retrieval are somebody else's job (a node client, a
//! cache, a snapshot file). The pipeline sees them only through the
//! [`AccountProvider`] and [`FeeResolver`] traits and treats whatever they
//! return as a read-only, point-in-time snapshot.
//!
//! In-memory implementations are provided for offline use and tests.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::crypto::PublicKey;
use crate::error::ProviderError;
use crate::transaction::TransactionKind;

// ---------------------------------------------------------------------------
// Data
// ---------------------------------------------------------------------------

/// Snapshot of a sender account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub address: String,
    /// Unknown until the account has sent its first transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<PublicKey>,
    /// Balance in arktoshi at fetch time. Not re-verified afterwards.
    pub balance: u64,
}

/// Current fee, in arktoshi, for each transaction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub struct FeeSchedule {
    pub send: u64,
    pub secondsignature: u64,
    pub delegate: u64,
    pub vote: u64,
}

impl FeeSchedule {
    /// The fee charged for `kind`.
    pub fn fee_for(&self, kind: TransactionKind) -> u64 {
        match kind {
            TransactionKind::Transfer => self.send,
            TransactionKind::SecondSignature => self.secondsignature,
            TransactionKind::DelegateRegistration => self.delegate,
            TransactionKind::Vote => self.vote,
        }
    }
}

impl Default for FeeSchedule {
    /// Network defaults: 0.1 / 5 / 25 / 1 tokens.
    fn default() -> Self {
        Self {
            send: 10_000_000,
            secondsignature: 500_000_000,
            delegate: 2_500_000_000,
            vote: 100_000_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Supplies the current fee schedule. Called once per request (once per
/// batch); the pipeline never caches the result.
#[async_trait]
pub trait FeeResolver: Send + Sync {
    async fn get_fees(&self) -> Result<FeeSchedule, ProviderError>;
}

/// Supplies the current state of a sender account.
#[async_trait]
pub trait AccountProvider: Send + Sync {
    async fn get_account(&self, address: &str) -> Result<Account, ProviderError>;
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

/// A fixed fee schedule.
#[derive(Debug, Clone, Default)]
pub struct StaticFees(pub FeeSchedule);

#[async_trait]
impl FeeResolver for StaticFees {
    async fn get_fees(&self) -> Result<FeeSchedule, ProviderError> {
        Ok(self.0)
    }
}

/// Accounts held in a map. Unknown addresses are an error, not an empty
/// account.
#[derive(Debug, Default)]
pub struct InMemoryAccounts {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the store from a list of accounts.
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let store = Self::new();
        for account in accounts {
            store.insert(account);
        }
        store
    }

    /// Inserts or replaces an account.
    pub fn insert(&self, account: Account) {
        self.accounts.write().insert(account.address.clone(), account);
    }

    /// Overwrites the balance of a known account. Returns `false` if the
    /// address is unknown.
    pub fn set_balance(&self, address: &str, balance: u64) -> bool {
        match self.accounts.write().get_mut(address) {
            Some(account) => {
                account.balance = balance;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl AccountProvider for InMemoryAccounts {
    async fn get_account(&self, address: &str) -> Result<Account, ProviderError> {
        self.accounts
            .read()
            .get(address)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownAccount {
                address: address.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(address: &str, balance: u64) -> Account {
        Account {
            address: address.to_string(),
            public_key: None,
            balance,
        }
    }

    #[test]
    fn fee_for_each_kind() {
        let fees = FeeSchedule {
            send: 1,
            secondsignature: 2,
            delegate: 3,
            vote: 4,
        };
        assert_eq!(fees.fee_for(TransactionKind::Transfer), 1);
        assert_eq!(fees.fee_for(TransactionKind::SecondSignature), 2);
        assert_eq!(fees.fee_for(TransactionKind::DelegateRegistration), 3);
        assert_eq!(fees.fee_for(TransactionKind::Vote), 4);
    }

    #[test]
    fn fee_schedule_json_keys() {
        let json = serde_json::to_value(FeeSchedule::default()).unwrap();
        assert_eq!(json["send"], 10_000_000);
        assert_eq!(json["secondsignature"], 500_000_000);
        assert_eq!(json["delegate"], 2_500_000_000u64);
        assert_eq!(json["vote"], 100_000_000);
    }

    #[tokio::test]
    async fn in_memory_accounts_lookup() {
        let store = InMemoryAccounts::with_accounts([account("Dalice", 1_000)]);
        assert_eq!(store.get_account("Dalice").await.unwrap().balance, 1_000);
        assert_eq!(
            store.get_account("Dbob").await,
            Err(ProviderError::UnknownAccount {
                address: "Dbob".to_string()
            })
        );
    }

    #[tokio::test]
    async fn set_balance_updates_known_accounts_only() {
        let store = InMemoryAccounts::with_accounts([account("Dalice", 1_000)]);
        assert!(store.set_balance("Dalice", 5));
        assert!(!store.set_balance("Dbob", 5));
        assert_eq!(store.get_account("Dalice").await.unwrap().balance, 5);
    }

    #[tokio::test]
    async fn static_fees_returns_schedule() {
        let fees = StaticFees(FeeSchedule::default());
        assert_eq!(fees.get_fees().await.unwrap(), FeeSchedule::default());
    }
}
