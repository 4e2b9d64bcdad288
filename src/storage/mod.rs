//! Persistence layer for line history.
//!
//! The selection layer only needs `get`/`put` on last-seen lines, so the
//! store is a trait. `JsonLineStore` keeps the whole map in a JSON file
//! that is read once when opened and written once per run;
//! `MemoryLineStore` backs tests and runs with history disabled.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::types::{CourtsideError, LineSnapshot};

/// Default history file path.
pub const DEFAULT_HISTORY_FILE: &str = "courtside_lines.json";

/// Key-value store of the last line seen per game.
pub trait LineStore {
    fn get(&self, game_id: &str) -> Option<LineSnapshot>;
    fn put(&mut self, game_id: &str, snapshot: LineSnapshot);

    /// Make this run's writes durable. In-memory stores have nothing to do.
    fn persist(&mut self, _now: DateTime<Utc>) -> Result<()> {
        Ok(())
    }

    /// Why the previous history could not be loaded, if it was discarded.
    fn load_error(&self) -> Option<&str> {
        None
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemoryLineStore {
    entries: BTreeMap<String, LineSnapshot>,
}

impl MemoryLineStore {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LineStore for MemoryLineStore {
    fn get(&self, game_id: &str) -> Option<LineSnapshot> {
        self.entries.get(game_id).copied()
    }

    fn put(&mut self, game_id: &str, snapshot: LineSnapshot) {
        self.entries.insert(game_id.to_string(), snapshot);
    }
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

/// Line history persisted as a JSON object keyed by game id.
#[derive(Debug)]
pub struct JsonLineStore {
    path: PathBuf,
    entries: BTreeMap<String, LineSnapshot>,
    retention: Option<Duration>,
    load_error: Option<String>,
}

impl JsonLineStore {
    /// Load the history file. A missing file is an empty history.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            info!(path = %path.display(), "No line history found, starting fresh");
            return Ok(Self {
                path,
                entries: BTreeMap::new(),
                retention: None,
                load_error: None,
            });
        }

        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read line history from {}", path.display()))?;
        let entries: BTreeMap<String, LineSnapshot> = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse line history from {}", path.display()))?;

        info!(path = %path.display(), games = entries.len(), "Line history loaded");
        Ok(Self {
            path,
            entries,
            retention: None,
            load_error: None,
        })
    }

    /// Like [`JsonLineStore::open`], but an unreadable or corrupt file
    /// starts an empty history instead of failing. The next persist
    /// replaces the file.
    pub fn open_or_fresh(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::open(path) {
            Ok(store) => store,
            Err(e) => {
                let cause = CourtsideError::Storage(format!("{e:#}"));
                warn!(path = %path.display(), error = %cause, "Line history discarded, starting fresh");
                Self {
                    path: path.to_path_buf(),
                    entries: BTreeMap::new(),
                    retention: None,
                    load_error: Some(cause.to_string()),
                }
            }
        }
    }

    /// Drop entries older than `retention` whenever the store is persisted.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = Some(retention);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop entries last observed before `cutoff`. Returns how many went.
    pub fn prune_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, snap| snap.observed_at >= cutoff);
        before - self.entries.len()
    }

    /// Write the history back to disk via a temp file and rename.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)
            .context("Failed to serialise line history")?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)
            .with_context(|| format!("Failed to write line history to {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to move line history into {}", self.path.display()))?;

        debug!(path = %self.path.display(), games = self.entries.len(), "Line history saved");
        Ok(())
    }
}

impl LineStore for JsonLineStore {
    fn get(&self, game_id: &str) -> Option<LineSnapshot> {
        self.entries.get(game_id).copied()
    }

    fn put(&mut self, game_id: &str, snapshot: LineSnapshot) {
        self.entries.insert(game_id.to_string(), snapshot);
    }

    fn persist(&mut self, now: DateTime<Utc>) -> Result<()> {
        if let Some(retention) = self.retention {
            let pruned = self.prune_before(now - retention);
            if pruned > 0 {
                debug!(pruned, "Stale line history dropped");
            }
        }
        self.save()
    }

    fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
