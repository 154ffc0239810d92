//! # CLI Interface
//!
//! Command-line structure for `arkwright` using `clap` derive. Every
//! transaction subcommand signs locally with a passphrase and reads account
//! balances and fees from a snapshot file.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Offline transaction builder for ARK wallets.
///
/// Builds, validates and signs transactions against a JSON snapshot of
/// account balances and fees, and prints them as JSON. Nothing is
/// broadcast.
#[derive(Parser, Debug)]
#[command(
    name = "arkwright",
    about = "Offline transaction builder for ARK wallets",
    version,
    propagate_version = true
)]
pub struct ArkwrightCli {
    /// Network to build for: mainnet or devnet.
    #[arg(long, global = true, env = "ARKWRIGHT_NETWORK", default_value = "devnet")]
    pub network: String,

    /// Log output format: pretty or json. Logs go to stderr.
    #[arg(long, global = true, env = "ARKWRIGHT_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the address a passphrase controls.
    Address(AddressArgs),
    /// Transfer tokens to one recipient.
    Send(SendArgs),
    /// Register a second passphrase on the account.
    SecondPassphrase(SecondPassphraseArgs),
    /// Register the account as a delegate.
    Delegate(DelegateArgs),
    /// Vote for or unvote delegates.
    Vote(VoteArgs),
    /// Transfer to several recipients at once, all or nothing.
    Batch(BatchArgs),
    /// Check the signature and identifier of a signed transaction.
    Verify(VerifyArgs),
}

/// Arguments for the `address` subcommand.
#[derive(Args, Debug)]
pub struct AddressArgs {
    /// Account passphrase.
    #[arg(long, env = "ARKWRIGHT_PASSPHRASE", hide_env_values = true)]
    pub passphrase: String,
}

/// The signing account, shared by every transaction subcommand.
#[derive(Args, Debug)]
pub struct SenderArgs {
    /// JSON snapshot with `fees` and `accounts`.
    #[arg(long, short = 's', env = "ARKWRIGHT_SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Sender address. Defaults to the address of `--passphrase`.
    #[arg(long)]
    pub from: Option<String>,

    /// Account passphrase.
    #[arg(long, env = "ARKWRIGHT_PASSPHRASE", hide_env_values = true)]
    pub passphrase: String,

    /// Second passphrase, when the account has one registered.
    #[arg(long, env = "ARKWRIGHT_SECOND_PASSPHRASE", hide_env_values = true)]
    pub second_passphrase: Option<String>,
}

/// Arguments for the `send` subcommand.
#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub sender: SenderArgs,

    /// Recipient address.
    #[arg(long)]
    pub to: String,

    /// Amount in arktoshi.
    #[arg(long)]
    pub amount: u64,

    /// Optional memo (smartbridge), at most 64 bytes.
    #[arg(long)]
    pub memo: Option<String>,
}

/// Arguments for the `second-passphrase` subcommand.
#[derive(Args, Debug)]
pub struct SecondPassphraseArgs {
    #[command(flatten)]
    pub sender: SenderArgs,

    /// The second passphrase to register.
    #[arg(long, env = "ARKWRIGHT_NEW_SECOND_PASSPHRASE", hide_env_values = true)]
    pub new_second_passphrase: String,
}

/// Arguments for the `delegate` subcommand.
#[derive(Args, Debug)]
pub struct DelegateArgs {
    #[command(flatten)]
    pub sender: SenderArgs,

    /// Delegate name: 1 to 20 characters of a-z, 0-9 and `!@$&_.`.
    #[arg(long)]
    pub username: String,
}

/// Arguments for the `vote` subcommand.
#[derive(Args, Debug)]
pub struct VoteArgs {
    #[command(flatten)]
    pub sender: SenderArgs,

    /// `+<public key>` to vote, `-<public key>` to unvote. Repeatable.
    #[arg(long = "vote", required = true, allow_hyphen_values = true)]
    pub votes: Vec<String>,
}

/// Arguments for the `batch` subcommand.
#[derive(Args, Debug)]
pub struct BatchArgs {
    #[command(flatten)]
    pub sender: SenderArgs,

    /// JSON list of `{ "address", "amount", "memo"? }` items.
    #[arg(long)]
    pub items: PathBuf,
}

/// Arguments for the `verify` subcommand.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// File holding one signed transaction as JSON.
    pub file: PathBuf,
}
