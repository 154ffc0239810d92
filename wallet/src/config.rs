//! # Pipeline Configuration & Constants
//!
//! Every protocol constant the pipeline depends on lives here: network
//! version bytes, the transaction epoch, field limits and the hardware
//! stagger. Components receive a [`PipelineConfig`] instead of reading
//! globals, so tests can run mainnet and devnet side by side.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Network Identifiers
// ---------------------------------------------------------------------------

/// Address version byte for mainnet. Mainnet addresses start with `A`.
pub const MAINNET_VERSION: u8 = 0x17;

/// Address version byte for devnet. Devnet addresses start with `D`.
pub const DEVNET_VERSION: u8 = 0x1e;

/// Ticker shown next to mainnet amounts.
pub const MAINNET_TOKEN: &str = "ARK";

/// Ticker shown next to devnet amounts.
pub const DEVNET_TOKEN: &str = "DARK";

// ---------------------------------------------------------------------------
// Amounts & Time
// ---------------------------------------------------------------------------

/// Number of arktoshi in one whole token.
pub const ARKTOSHI_PER_TOKEN: u64 = 100_000_000;

/// Decimal places used when formatting arktoshi as whole tokens.
pub const TOKEN_DECIMALS: u32 = 8;

/// Transaction timestamps count seconds since this instant
/// (2017-03-21T13:00:00Z), not since the Unix epoch.
pub const EPOCH_UNIX_SECONDS: i64 = 1_490_101_200;

// ---------------------------------------------------------------------------
// Field Limits
// ---------------------------------------------------------------------------

/// Maximum length of the vendor field (memo) in bytes.
pub const MAX_MEMO_LENGTH: usize = 64;

/// Maximum length of a delegate username.
pub const MAX_USERNAME_LENGTH: usize = 20;

/// Characters allowed in a delegate username besides `a-z` and `0-9`.
pub const USERNAME_SYMBOLS: &str = "!@$&_.";

/// A vote transaction carries at most one unvote and one vote.
pub const MAX_VOTES_PER_TRANSACTION: usize = 2;

/// Decoded address length: version byte plus 20-byte key hash.
pub const ADDRESS_PAYLOAD_LENGTH: usize = 21;

/// Base58check-decoded address length: payload plus 4-byte checksum.
pub const ADDRESS_ENCODED_LENGTH: usize = 25;

// ---------------------------------------------------------------------------
// Hardware Signing
// ---------------------------------------------------------------------------

/// Delay between consecutive hardware signing requests in a batch. The
/// device handles a single request at a time; item `i` is dispatched no
/// earlier than `i * HARDWARE_STAGGER` after the batch starts.
pub const HARDWARE_STAGGER: Duration = Duration::from_millis(2_000);

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// The network a wallet is operating on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    /// Short name, used for lookups and logging.
    pub name: String,
    /// Address version byte.
    pub version: u8,
    /// Token ticker, for display only.
    pub token: String,
}

impl Network {
    pub fn mainnet() -> Self {
        Self {
            name: "mainnet".to_string(),
            version: MAINNET_VERSION,
            token: MAINNET_TOKEN.to_string(),
        }
    }

    pub fn devnet() -> Self {
        Self {
            name: "devnet".to_string(),
            version: DEVNET_VERSION,
            token: DEVNET_TOKEN.to_string(),
        }
    }

    /// Looks up a known network by name, ignoring case. Unknown names
    /// return `None`.
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "mainnet" => Some(Self::mainnet()),
            "devnet" => Some(Self::devnet()),
            _ => None,
        }
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::devnet()
    }
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Whether the hardware backend checks the externally supplied public key
/// against the claimed sender before asking the device to sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HardwareSenderCheck {
    /// Trust the supplied public key; the device is the authority.
    #[default]
    Trust,
    /// Derive the address from the supplied public key and fail with
    /// `AddressMismatch` when it differs from the sender.
    Enforce,
}

/// Tunable parameters shared by every pipeline component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Network whose version byte is used for address checks.
    pub network: Network,
    /// Per-item delay used to stagger batch hardware signing requests.
    pub hardware_stagger: Duration,
    /// Sender check applied on the hardware path.
    pub hardware_sender_check: HardwareSenderCheck,
}

impl PipelineConfig {
    /// Default configuration for the given network.
    pub fn for_network(network: Network) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }

    /// The active network's address version byte.
    pub fn network_version(&self) -> u8 {
        self.network.version
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            hardware_stagger: HARDWARE_STAGGER,
            hardware_sender_check: HardwareSenderCheck::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// The transaction epoch as a `DateTime`.
pub fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(EPOCH_UNIX_SECONDS, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Seconds elapsed since the transaction epoch, saturating at zero for
/// clocks set before it.
pub fn epoch_timestamp(now: DateTime<Utc>) -> u32 {
    let secs = now.timestamp() - EPOCH_UNIX_SECONDS;
    secs.clamp(0, u32::MAX as i64) as u32
}
