//! Applies one ledger call per invocation against the persisted snapshot.
//!
//! A call is one transaction: load, apply, save. The snapshot is only
//! replaced when the call succeeded, so a rejected call leaves nothing behind.
//! Once the snapshot is saved the call has committed and `execute` returns `Ok`.

use crate::config::NodeConfig;
use crate::journal::Journal;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use testament_core::state::{read_json, write_json};
use testament_core::{
    Amount, Custody, EventLog, Identity, Ledger, LedgerEvent, LedgerState, Phase, Vault,
};

/// A single call against the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create the ledger from the configured roles and genesis accounts
    Deploy,
    /// Credit an external account in the simulated vault
    Fund { identity: Identity, amount: Amount },
    Bequeath {
        beneficiary: Identity,
        amount: Amount,
    },
    SetDoctor { doctor: Identity },
    EndPeriod,
    Withdraw,
}

impl Command {
    /// Whether the call must name a caller
    pub fn needs_caller(&self) -> bool {
        !matches!(self, Command::Deploy | Command::Fund { .. })
    }
}

/// Everything persisted between invocations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub ledger: LedgerState,
    pub vault: Vault,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let snapshot: Snapshot = read_json(path).with_context(|| {
            format!(
                "Failed to load ledger snapshot from {} (has it been deployed?)",
                path.display()
            )
        })?;
        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self)
            .with_context(|| format!("Failed to save ledger snapshot to {}", path.display()))
    }
}

/// Read-only view of the ledger, printed by `show`
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub owner: Identity,
    pub doctor: Identity,
    pub is_contract_over: bool,
    pub phase: Phase,
    pub total_legacy: Amount,
    pub held: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<IdentitySummary>,
}

/// Balances of one identity
#[derive(Debug, Clone, Serialize)]
pub struct IdentitySummary {
    pub identity: Identity,
    pub legacy: Amount,
    pub account_balance: Amount,
}

/// Execute one call and commit its effects. Returns the events it emitted.
pub fn execute(
    config: &NodeConfig,
    caller: Option<Identity>,
    command: &Command,
) -> Result<Vec<LedgerEvent>> {
    let snapshot_path = config.snapshot_path();

    std::fs::create_dir_all(&config.node.data_dir).with_context(|| {
        format!(
            "Failed to create data dir: {}",
            config.node.data_dir.display()
        )
    })?;

    let (snapshot, events) = match command {
        Command::Deploy => deploy(config, &snapshot_path)?,
        Command::Fund { identity, amount } => {
            anyhow::ensure!(!identity.is_zero(), "Cannot fund the null identity");
            let mut snapshot = Snapshot::load(&snapshot_path)?;
            snapshot
                .vault
                .credit(*identity, *amount)
                .with_context(|| format!("Failed to fund {}", identity))?;
            log::info!("Funded {} with {}", identity, amount);
            (snapshot, Vec::new())
        }
        call => {
            let caller = caller.context("this call requires --caller <identity>")?;
            let snapshot = Snapshot::load(&snapshot_path)?;
            apply(snapshot, caller, call)?
        }
    };

    // An unopenable journal rejects the call before anything is committed
    let journal_path = config.journal_path();
    let mut journal = Journal::open(&journal_path)?;

    snapshot.save(&snapshot_path)?;
    if let Err(e) = journal.append(&events) {
        log::warn!(
            "Call committed but {} event(s) missing from {}: {:#}",
            events.len(),
            journal_path.display(),
            e
        );
    }

    Ok(events)
}

fn deploy(config: &NodeConfig, snapshot_path: &Path) -> Result<(Snapshot, Vec<LedgerEvent>)> {
    anyhow::ensure!(
        !snapshot_path.exists(),
        "A ledger is already deployed at {}",
        snapshot_path.display()
    );

    let mut vault = Vault::new();
    for (identity, amount) in config.genesis_accounts()? {
        vault
            .credit(identity, amount)
            .with_context(|| format!("Failed to credit genesis account {}", identity))?;
    }

    let ledger = Ledger::create(config.owner()?, config.doctor()?, vault, EventLog::new())
        .context("Deployment rejected")?;
    let (ledger, vault, events) = ledger.into_parts();

    Ok((ledger_snapshot(ledger, vault), events))
}

fn apply(
    snapshot: Snapshot,
    caller: Identity,
    command: &Command,
) -> Result<(Snapshot, Vec<LedgerEvent>)> {
    let mut ledger = Ledger::restore(snapshot.ledger, snapshot.vault, EventLog::new())
        .context("Persisted ledger is inconsistent")?;

    match command {
        Command::Bequeath {
            beneficiary,
            amount,
        } => {
            ledger
                .bequeath(caller, *beneficiary, *amount)
                .context("Bequeath rejected")?;
        }
        Command::SetDoctor { doctor } => {
            ledger
                .set_doctor(caller, *doctor)
                .context("SetDoctor rejected")?;
        }
        Command::EndPeriod => {
            ledger.end_period(caller).context("EndPeriod rejected")?;
        }
        Command::Withdraw => {
            ledger.withdraw(caller).context("Withdraw rejected")?;
        }
        Command::Deploy | Command::Fund { .. } => {
            anyhow::bail!("{:?} is not a ledger call", command);
        }
    }

    let (state, vault, events) = ledger.into_parts();
    Ok((ledger_snapshot(state, vault), events))
}

fn ledger_snapshot(ledger: LedgerState, vault: Vault) -> Snapshot {
    Snapshot { ledger, vault }
}

/// Read-only query of the persisted ledger
pub fn show(config: &NodeConfig, identity: Option<Identity>) -> Result<Summary> {
    let snapshot = Snapshot::load(&config.snapshot_path())?;
    let state = &snapshot.ledger;

    Ok(Summary {
        owner: state.owner,
        doctor: state.doctor,
        is_contract_over: state.is_contract_over,
        phase: state.phase(),
        total_legacy: state.total_legacy(),
        held: snapshot.vault.held(),
        query: identity.map(|identity| IdentitySummary {
            identity,
            legacy: state.legacy_of(&identity),
            account_balance: snapshot.vault.balance_of(&identity),
        }),
    })
}
