//! Node configuration — parsed from TOML file + environment variable overrides.
//!
//! Priority: environment variables > config file > defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use testament_core::{Amount, Identity};

/// Top-level node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// General node settings
    #[serde(default)]
    pub node: NodeSection,

    /// Roles the ledger is deployed with
    pub ledger: LedgerSection,

    /// External accounts funded at deployment
    #[serde(default)]
    pub genesis: Vec<GenesisAccount>,
}

/// General node settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSection {
    /// Data directory (ledger snapshot, event journal)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// Roles assigned at deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSection {
    /// Owner identity (`0x` + 40 hex digits)
    pub owner: String,

    /// Initial doctor identity
    pub doctor: String,
}

/// An external account and its starting balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub identity: String,
    pub amount: u64,
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_data_dir() -> PathBuf {
    PathBuf::from("/data")
}

fn default_log_level() -> String {
    "info".to_string()
}

// ============================================================================
// Loading & environment override
// ============================================================================

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: NodeConfig =
            toml::from_str(&contents).with_context(|| "Failed to parse TOML config")?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `TESTAMENT_DATA_DIR`
    /// - `TESTAMENT_LOG_LEVEL`
    /// - `TESTAMENT_OWNER`
    /// - `TESTAMENT_DOCTOR`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("TESTAMENT_DATA_DIR") {
            self.node.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("TESTAMENT_LOG_LEVEL") {
            self.node.log_level = v;
        }
        if let Ok(v) = std::env::var("TESTAMENT_OWNER") {
            self.ledger.owner = v;
        }
        if let Ok(v) = std::env::var("TESTAMENT_DOCTOR") {
            self.ledger.doctor = v;
        }
    }

    pub fn owner(&self) -> Result<Identity> {
        Identity::from_str(&self.ledger.owner)
            .with_context(|| format!("ledger.owner is not a valid identity: {}", self.ledger.owner))
    }

    pub fn doctor(&self) -> Result<Identity> {
        Identity::from_str(&self.ledger.doctor).with_context(|| {
            format!(
                "ledger.doctor is not a valid identity: {}",
                self.ledger.doctor
            )
        })
    }

    /// Parsed genesis balances
    pub fn genesis_accounts(&self) -> Result<Vec<(Identity, Amount)>> {
        self.genesis
            .iter()
            .map(|account| {
                let identity = Identity::from_str(&account.identity).with_context(|| {
                    format!("genesis identity is not valid: {}", account.identity)
                })?;
                Ok((identity, Amount::from_units(account.amount)))
            })
            .collect()
    }

    /// Path of the persisted ledger snapshot
    pub fn snapshot_path(&self) -> PathBuf {
        self.node.data_dir.join("testament.json")
    }

    /// Path of the append-only event journal
    pub fn journal_path(&self) -> PathBuf {
        self.node.data_dir.join("events.jsonl")
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        let owner = self.owner()?;
        let doctor = self.doctor()?;

        anyhow::ensure!(
            owner != doctor,
            "ledger.owner and ledger.doctor must be different identities"
        );

        let genesis = self.genesis_accounts()?;
        for (identity, _) in &genesis {
            anyhow::ensure!(
                !identity.is_zero(),
                "genesis accounts must not use the null identity"
            );
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
