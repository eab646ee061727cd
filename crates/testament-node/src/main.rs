//! Testament Node — single-call host for a persisted bequest ledger
//!
//! Every invocation is one atomic transaction: the snapshot in the data
//! directory is loaded, one call is applied, and the result is saved only if
//! the call succeeded. Emitted events are appended to `events.jsonl`.
//!
//! # Usage
//!
//! ```bash
//! testament-node --config testament.toml deploy
//! testament-node -c testament.toml --caller 0xOWNER bequeath 0xHEIR 5
//! testament-node -c testament.toml --caller 0xDOCTOR end-period
//! testament-node -c testament.toml --caller 0xHEIR withdraw
//! testament-node -c testament.toml show 0xHEIR
//! ```

mod config;
mod journal;
mod runner;

use anyhow::{Context, Result};
use runner::Command;
use std::path::PathBuf;
use std::str::FromStr;
use testament_core::{Amount, Identity};

fn main() {
    if let Err(e) = run() {
        log::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI args (minimal — no clap dependency needed)
    let args: Vec<String> = std::env::args().collect();

    let mut config_path = PathBuf::from("/config/testament.toml");
    let mut caller: Option<Identity> = None;
    let mut validate_only = false;
    let mut positional: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                if i < args.len() {
                    config_path = PathBuf::from(&args[i]);
                } else {
                    anyhow::bail!("--config requires a path argument");
                }
            }
            "--caller" => {
                i += 1;
                let value = args
                    .get(i)
                    .context("--caller requires an identity argument")?;
                caller = Some(parse_identity(value)?);
            }
            "--validate" => {
                validate_only = true;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--version" | "-V" => {
                println!("testament-node {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            other if other.starts_with('-') => {
                anyhow::bail!("Unknown argument: {}", other);
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    // Load config
    let mut node_config = config::NodeConfig::from_file(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // Apply env overrides
    node_config.apply_env_overrides();

    // Validate
    node_config
        .validate()
        .context("Configuration validation failed")?;

    // Init logger
    env_logger::Builder::new()
        .parse_filters(&node_config.node.log_level)
        .init();

    if validate_only {
        println!("✅ Configuration is valid.");
        println!("  Data dir:  {}", node_config.node.data_dir.display());
        println!("  Owner:     {}", node_config.ledger.owner);
        println!("  Doctor:    {}", node_config.ledger.doctor);
        println!("  Genesis:   {} accounts", node_config.genesis.len());
        return Ok(());
    }

    let Some((name, rest)) = positional.split_first() else {
        print_help();
        anyhow::bail!("No command given");
    };

    if name == "show" {
        let identity = rest.first().map(|s| parse_identity(s)).transpose()?;
        let summary = runner::show(&node_config, identity)?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let command = parse_command(name, rest)?;
    if command.needs_caller() && caller.is_none() {
        anyhow::bail!("'{}' requires --caller <identity>", name);
    }

    let events = runner::execute(&node_config, caller, &command)?;
    for event in &events {
        println!("{}", serde_json::to_string(event)?);
    }

    Ok(())
}

fn parse_command(name: &str, args: &[String]) -> Result<Command> {
    let command = match name {
        "deploy" => Command::Deploy,
        "fund" => Command::Fund {
            identity: parse_identity(required(args, 0, name, "identity")?)?,
            amount: parse_amount(required(args, 1, name, "amount")?)?,
        },
        "bequeath" => Command::Bequeath {
            beneficiary: parse_identity(required(args, 0, name, "beneficiary")?)?,
            amount: parse_amount(required(args, 1, name, "amount")?)?,
        },
        "set-doctor" => Command::SetDoctor {
            doctor: parse_identity(required(args, 0, name, "doctor")?)?,
        },
        "end-period" => Command::EndPeriod,
        "withdraw" => Command::Withdraw,
        other => anyhow::bail!("Unknown command: {}", other),
    };
    Ok(command)
}

fn required<'a>(args: &'a [String], idx: usize, name: &str, what: &str) -> Result<&'a str> {
    args.get(idx)
        .map(String::as_str)
        .with_context(|| format!("'{}' requires a {} argument", name, what))
}

fn parse_identity(s: &str) -> Result<Identity> {
    Identity::from_str(s).with_context(|| format!("Invalid identity: {}", s))
}

fn parse_amount(s: &str) -> Result<Amount> {
    let units: u64 = s
        .parse()
        .with_context(|| format!("Invalid amount: {}", s))?;
    Ok(Amount::from_units(units))
}

fn print_help() {
    println!(
        r#"Testament Node — single-call host for a persisted bequest ledger

USAGE:
    testament-node [OPTIONS] <COMMAND> [ARGS]

COMMANDS:
    deploy                           Create the ledger from the config file
    fund <identity> <amount>         Credit an external account
    bequeath <beneficiary> <amount>  Commit value (caller: owner)
    set-doctor <identity>            Appoint a new doctor (caller: owner)
    end-period                       Close the period (caller: doctor)
    withdraw                         Withdraw the caller's legacy
    show [identity]                  Print ledger state as JSON

OPTIONS:
    -c, --config <PATH>   Config file path (default: /config/testament.toml)
    --caller <IDENTITY>   Identity making the call
    --validate            Validate config file and exit
    -h, --help            Show this help message
    -V, --version         Show version

ENVIRONMENT VARIABLES (override config file):
    TESTAMENT_DATA_DIR    Data directory path
    TESTAMENT_LOG_LEVEL   Log level (error/warn/info/debug/trace)
    TESTAMENT_OWNER       Owner identity
    TESTAMENT_DOCTOR      Initial doctor identity
"#
    );
}
