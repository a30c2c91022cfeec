//! Locally synced rate snapshots
//!
//! A snapshot repository is a directory (usually a git checkout) holding one
//! file per date under `money/`, named `YYYY-MM-DD-rates.json`:
//!
//! ```json
//! {"conversion_rates": {"USD": 1, "EUR": 0.93, "AUD": 1.47}}
//! ```

use super::base::{RateTable, DEFAULT_BASE_CURRENCY};
use crate::currency::Currency;
use crate::error::{MoneyError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Sub-directory of the repository that holds the snapshot files
pub const SNAPSHOT_DIR: &str = "money";
/// Suffix after the ISO date in each snapshot file name
pub const SNAPSHOT_SUFFIX: &str = "-rates.json";

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    conversion_rates: BTreeMap<String, serde_json::Number>,
}

/// How the repository is refreshed before a missing snapshot is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// `git -C <root> pull`
    Git,
    /// Never touch the repository
    Disabled,
}

/// Directory of per-date rate snapshots
#[derive(Debug, Clone)]
pub struct SnapshotRepo {
    root: PathBuf,
    sync: SyncMode,
    base: Currency,
}

impl SnapshotRepo {
    /// Repository refreshed with `git pull` when a date is missing
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sync: SyncMode::Git,
            base: DEFAULT_BASE_CURRENCY,
        }
    }

    /// Set how the repository is updated before reads
    pub fn with_sync(mut self, sync: SyncMode) -> Self {
        self.sync = sync;
        self
    }

    /// Get the repository root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the per-date files
    pub fn snapshot_dir(&self) -> PathBuf {
        self.root.join(SNAPSHOT_DIR)
    }

    /// Path of the snapshot file for `date`
    pub fn snapshot_path(&self, date: NaiveDate) -> PathBuf {
        self.snapshot_dir().join(format!("{}{}", date, SNAPSHOT_SUFFIX))
    }

    /// Refresh the repository. Callers treat failures as non-fatal.
    pub fn sync(&self) -> Result<()> {
        match self.sync {
            SyncMode::Disabled => Ok(()),
            SyncMode::Git => {
                log::info!("Pulling rates repository {}", self.root.display());
                let status = Command::new("git")
                    .arg("-C")
                    .arg(&self.root)
                    .arg("pull")
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()?;
                if status.success() {
                    Ok(())
                } else {
                    Err(MoneyError::IoError(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        format!("git pull exited with {}", status),
                    )))
                }
            }
        }
    }

    /// Rates for `date`, syncing once first if the file is not there yet
    pub fn read(&self, date: NaiveDate) -> Result<Option<RateTable>> {
        if !self.root.exists() {
            return Ok(None);
        }

        let path = self.snapshot_path(date);
        if !path.exists() {
            if let Err(e) = self.sync() {
                log::warn!("Could not sync rates repository: {}", e);
            }
        }
        if !path.exists() {
            return Ok(None);
        }

        let text = fs::read_to_string(&path)?;
        parse_snapshot(date, self.base, &text).map(Some)
    }

    /// Write a snapshot file for the table's date
    pub fn write(&self, table: &RateTable) -> Result<PathBuf> {
        fs::create_dir_all(self.snapshot_dir())?;

        let mut conversion_rates = BTreeMap::new();
        for (currency, rate) in table.iter() {
            let number: serde_json::Number = serde_json::from_str(&rate.normalize().to_string())?;
            conversion_rates.insert(currency.code().to_string(), number);
        }

        let path = self.snapshot_path(table.date());
        fs::write(&path, serde_json::to_string_pretty(&SnapshotFile { conversion_rates })?)?;
        Ok(path)
    }

    /// Dates with a snapshot file, ascending
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        let dir = self.snapshot_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut dates = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(stem) = name.strip_suffix(SNAPSHOT_SUFFIX) {
                match NaiveDate::parse_from_str(stem, "%Y-%m-%d") {
                    Ok(date) => dates.push(date),
                    Err(_) => log::debug!("Ignoring {} in {}", name, dir.display()),
                }
            }
        }
        dates.sort();
        Ok(dates)
    }
}

/// Parse the contents of a snapshot file
pub fn parse_snapshot(date: NaiveDate, base: Currency, text: &str) -> Result<RateTable> {
    let file: SnapshotFile = serde_json::from_str(text)?;
    Ok(RateTable::from_json_rates(date, base, &file.conversion_rates))
}
