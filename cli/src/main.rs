// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Arkwright
//!
//! Entry point for the `arkwright` binary. Parses arguments, initializes
//! logging, loads the account snapshot and runs one pipeline operation.
//! Signed transactions are printed to stdout as JSON.
//!
//! - `address`           print the address of a passphrase
//! - `send`              one transfer
//! - `second-passphrase` register a second passphrase
//! - `delegate`          register as a delegate
//! - `vote`              vote or unvote
//! - `batch`             several transfers, all or nothing
//! - `verify`            check a signed transaction

mod cli;
mod logging;
mod snapshot;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use arkwright_wallet::crypto::{derive_address, Passphrase};
use arkwright_wallet::transaction::{verify_transaction, Arktoshi};
use arkwright_wallet::{
    BatchRequest, LocalCredentials, Network, PipelineConfig, SigningBackend, Transaction,
    TransactionService, TransferItem,
};

use cli::{ArkwrightCli, Commands, SenderArgs};
use logging::LogFormat;
use snapshot::Snapshot;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ArkwrightCli::parse();
    logging::init_logging(&cli.log_level, LogFormat::from_str_lossy(&cli.log_format));

    let network = Network::by_name(&cli.network)
        .ok_or_else(|| anyhow!("unknown network {:?} (expected mainnet or devnet)", cli.network))?;

    match cli.command {
        Commands::Address(args) => {
            let pk = Passphrase::from(args.passphrase.as_str()).keypair().public_key();
            println!("{}", derive_address(&pk, network.version));
            Ok(())
        }
        Commands::Send(args) => {
            let session = Session::open(&args.sender, &network)?;
            let tx = session
                .service
                .create_send(
                    session.from.clone(),
                    session.backend(),
                    args.to,
                    args.amount,
                    args.memo,
                )
                .await
                .context("failed to create transfer")?;
            session.report(&tx);
            print_json(&tx)
        }
        Commands::SecondPassphrase(args) => {
            let session = Session::open(&args.sender, &network)?;
            let tx = session
                .service
                .create_second_passphrase(
                    session.from.clone(),
                    session.backend(),
                    args.new_second_passphrase.as_str(),
                )
                .await
                .context("failed to create second passphrase registration")?;
            session.report(&tx);
            print_json(&tx)
        }
        Commands::Delegate(args) => {
            let session = Session::open(&args.sender, &network)?;
            let tx = session
                .service
                .create_delegate(session.from.clone(), session.backend(), args.username)
                .await
                .context("failed to create delegate registration")?;
            session.report(&tx);
            print_json(&tx)
        }
        Commands::Vote(args) => {
            let session = Session::open(&args.sender, &network)?;
            let tx = session
                .service
                .create_vote(session.from.clone(), session.backend(), args.votes)
                .await
                .context("failed to create vote")?;
            session.report(&tx);
            print_json(&tx)
        }
        Commands::Batch(args) => {
            let session = Session::open(&args.sender, &network)?;
            let items = load_items(&args.items)?;
            let txs = session
                .service
                .create_multiple_sends(BatchRequest {
                    from_address: session.from.clone(),
                    items,
                    backend: session.backend(),
                })
                .await
                .context("failed to create batch")?;
            for tx in &txs {
                session.report(tx);
            }
            print_json(&txs)
        }
        Commands::Verify(args) => verify(&args.file),
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A service wired to one snapshot, plus the sender's credentials.
struct Session {
    service: TransactionService,
    credentials: LocalCredentials,
    from: String,
    network: Network,
}

impl Session {
    fn open(args: &SenderArgs, network: &Network) -> Result<Self> {
        let (fees, accounts) = Snapshot::load(&args.snapshot)?.into_providers();

        let mut credentials = LocalCredentials::new(args.passphrase.as_str());
        if let Some(second) = &args.second_passphrase {
            credentials = credentials.with_second(second.as_str());
        }
        let from = match &args.from {
            Some(from) => from.clone(),
            None => derive_address(
                &credentials.passphrase.keypair().public_key(),
                network.version,
            ),
        };

        let service = TransactionService::builder(Arc::new(fees), Arc::new(accounts))
            .config(PipelineConfig::for_network(network.clone()))
            .build();

        tracing::info!(from = %from, network = %network.name, "session opened");
        Ok(Self {
            service,
            credentials,
            from,
            network: network.clone(),
        })
    }

    fn backend(&self) -> SigningBackend {
        SigningBackend::Local(self.credentials.clone())
    }

    /// One human-readable summary line on stderr.
    fn report(&self, tx: &Transaction) {
        eprintln!(
            "{} {} amount={} fee={}",
            tx.kind,
            tx.id.as_deref().unwrap_or("-"),
            Arktoshi(tx.amount).with_token(&self.network.token),
            Arktoshi(tx.fee).with_token(&self.network.token),
        );
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_items(path: &Path) -> Result<Vec<TransferItem>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read batch items {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse batch items {}", path.display()))
}

fn verify(path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read transaction {}", path.display()))?;
    let tx: Transaction = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse transaction {}", path.display()))?;

    if let Err(err) = verify_transaction(&tx) {
        bail!("transaction is not valid: {err}");
    }
    print_json(&serde_json::json!({
        "id": tx.id,
        "valid": true,
    }))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{out}");
    Ok(())
}
