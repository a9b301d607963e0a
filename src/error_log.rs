use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One failed panel load.
#[derive(Clone, Debug)]
pub struct ErrorLogEntry {
    pub timestamp: DateTime<Local>,
    pub panel: String,
    pub kind: String,
    pub message: String,
}

impl ErrorLogEntry {
    pub fn new(panel: impl Into<String>, kind: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorLogEntry {
            timestamp: Local::now(),
            panel: panel.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }

    fn timestamp_ms(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

/// Append-only JSONL file of panel failures.
#[derive(Clone, Debug)]
pub struct ErrorLogStore {
    path: PathBuf,
}

impl ErrorLogStore {
    pub fn new(path: PathBuf) -> Self {
        ErrorLogStore { path }
    }

    pub fn in_dir(dir: &Path) -> Self {
        ErrorLogStore::new(dir.join("error_logs.jsonl"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &ErrorLogEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        serde_json::to_writer(&mut file, &StoredErrorLogEntry::from(entry))?;
        file.write_all(b"\n")?;
        Ok(())
    }

    /// Stored entries oldest first; unreadable lines are skipped.
    pub fn load(&self) -> Result<Vec<StoredErrorLogEntry>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(entry) = serde_json::from_str::<StoredErrorLogEntry>(&line) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredErrorLogEntry {
    pub timestamp_ms: i64,
    pub panel: String,
    pub kind: String,
    pub message: String,
}

impl From<&ErrorLogEntry> for StoredErrorLogEntry {
    fn from(entry: &ErrorLogEntry) -> Self {
        StoredErrorLogEntry {
            timestamp_ms: entry.timestamp_ms(),
            panel: entry.panel.clone(),
            kind: entry.kind.clone(),
            message: entry.message.clone(),
        }
    }
}
