//! Append-only event journal (one JSON object per line).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use testament_core::LedgerEvent;

/// A journaled event with the time it was recorded
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalEntry {
    /// RFC 3339 timestamp
    pub at: String,
    #[serde(flatten)]
    pub event: LedgerEvent,
}

/// The journal file, opened for appending
#[derive(Debug)]
pub struct Journal {
    file: File,
    path: PathBuf,
}

impl Journal {
    /// Open the journal, creating it if needed
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open journal: {}", path.display()))?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Append events as one write
    pub fn append(&mut self, events: &[LedgerEvent]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let at = chrono::Utc::now().to_rfc3339();
        let mut buf = String::new();
        for event in events {
            let entry = JournalEntry {
                at: at.clone(),
                event: event.clone(),
            };
            buf.push_str(&serde_json::to_string(&entry)?);
            buf.push('\n');
        }

        self.file
            .write_all(buf.as_bytes())
            .with_context(|| format!("Failed to write journal: {}", self.path.display()))
    }
}

/// Read every journaled event, oldest first
pub fn read(path: &Path) -> Result<Vec<JournalEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open journal: {}", path.display()))?;

    let mut entries = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: JournalEntry = serde_json::from_str(&line)
            .with_context(|| format!("Malformed journal line {}", idx + 1))?;
        entries.push(entry);
    }
    Ok(entries)
}
