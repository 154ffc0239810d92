//! Per-transaction lifecycle tracking.
//!
//! A transaction moves `Validating -> Building -> Signing -> Finalized`,
//! or to `Failed` from any non-terminal stage. Transitions only move
//! forward: once signing has started nothing re-enters validation or
//! building, and terminal stages never change again.

use std::fmt;
use tokio::time::Instant;
use tracing::debug;

use crate::transaction::TransactionKind;

/// Which backend is producing the signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningPath {
    Local,
    Hardware,
}

/// Where a transaction currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Building,
    Signing(SigningPath),
    /// Terminal: signed and identified.
    Finalized { id: String },
    /// Terminal: failed while in `during`.
    Failed { during: &'static str, reason: String },
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Building => "building",
            Self::Signing(SigningPath::Local) => "signing-local",
            Self::Signing(SigningPath::Hardware) => "signing-hardware",
            Self::Finalized { .. } => "finalized",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized { .. } | Self::Failed { .. })
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tracks one transaction through the pipeline.
///
/// Every `mark_*` method returns `true` if the transition happened and
/// `false` if it was refused because it is not legal from the current
/// stage.
#[derive(Debug)]
pub struct TransactionLifecycle {
    kind: TransactionKind,
    stage: Stage,
    started_at: Instant,
}

impl TransactionLifecycle {
    /// Starts tracking in `Validating`.
    pub fn new(kind: TransactionKind) -> Self {
        debug!(kind = %kind, stage = "validating", "lifecycle started");
        Self {
            kind,
            stage: Stage::Validating,
            started_at: Instant::now(),
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }

    #[must_use]
    pub fn mark_building(&mut self) -> bool {
        match self.stage {
            Stage::Validating => self.enter(Stage::Building),
            _ => false,
        }
    }

    #[must_use]
    pub fn mark_signing(&mut self, path: SigningPath) -> bool {
        match self.stage {
            Stage::Building => self.enter(Stage::Signing(path)),
            _ => false,
        }
    }

    #[must_use]
    pub fn mark_finalized(&mut self, id: impl Into<String>) -> bool {
        match self.stage {
            Stage::Signing(_) => self.enter(Stage::Finalized { id: id.into() }),
            _ => false,
        }
    }

    #[must_use]
    pub fn mark_failed(&mut self, reason: impl fmt::Display) -> bool {
        if self.stage.is_terminal() {
            return false;
        }
        let during = self.stage.name();
        self.enter(Stage::Failed {
            during,
            reason: reason.to_string(),
        })
    }

    fn enter(&mut self, next: Stage) -> bool {
        debug!(
            kind = %self.kind,
            from = %self.stage,
            to = %next,
            elapsed_ms = self.elapsed_ms(),
            "lifecycle transition"
        );
        self.stage = next;
        true
    }
}
