//! Account and fee snapshot files.
//!
//! ```json
//! {
//!   "fees": { "send": 10000000, "secondsignature": 500000000,
//!             "delegate": 2500000000, "vote": 100000000 },
//!   "accounts": [ { "address": "D...", "balance": 100000000 } ]
//! }
//! ```
//!
//! A missing `fees` object means the network defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use arkwright_wallet::{Account, FeeSchedule, InMemoryAccounts, StaticFees};

#[derive(Debug, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub fees: FeeSchedule,
    #[serde(default)]
    pub accounts: Vec<Account>,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse snapshot {}", path.display()))
    }

    /// The in-memory collaborators serving this snapshot.
    pub fn into_providers(self) -> (StaticFees, InMemoryAccounts) {
        (
            StaticFees(self.fees),
            InMemoryAccounts::with_accounts(self.accounts),
        )
    }
}
