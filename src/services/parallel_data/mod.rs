//! Storage for monthly match output from the two systems under comparison.
//!
//! Each month/system pair maps to one JSON document under a fixed
//! subdirectory per system. Keeping exactly two system identities is the
//! load-bearing invariant here, so every public operation validates the
//! system name before touching the filesystem.

use crate::types::errors::{TuningError, TuningResult};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// One of the two matcher deployments producing monthly output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSystem {
    /// The system currently serving production traffic.
    Current,
    /// The candidate system running in parallel.
    New,
}

impl MatchSystem {
    /// Parse a caller-supplied system name. Only "current" and "new" exist.
    pub fn parse(name: &str) -> TuningResult<Self> {
        match name {
            "current" => Ok(MatchSystem::Current),
            "new" => Ok(MatchSystem::New),
            other => Err(TuningError::UnknownSystem(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchSystem::Current => "current",
            MatchSystem::New => "new",
        }
    }

    /// Subdirectory the system's monthly documents live in.
    pub fn dir_name(&self) -> &'static str {
        match self {
            MatchSystem::Current => "matched",
            MatchSystem::New => "matched_new",
        }
    }
}

impl std::fmt::Display for MatchSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reads and writes per-month match documents for both systems.
#[derive(Debug, Clone)]
pub struct ParallelDataManager {
    base_dir: PathBuf,
}

impl ParallelDataManager {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Path a month/system document lives at. Month keys are opaque; only
    /// the system name is validated.
    pub fn data_path(&self, month: &str, system: &str) -> TuningResult<PathBuf> {
        let system = MatchSystem::parse(system)?;
        Ok(self
            .base_dir
            .join(system.dir_name())
            .join(format!("{month}.json")))
    }

    /// Write one month's document, creating parent directories as needed.
    pub fn save(&self, month: &str, system: &str, document: &Value) -> TuningResult<PathBuf> {
        let path = self.data_path(month, system)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                TuningError::Io(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let pretty = serde_json::to_string_pretty(document)
            .map_err(|e| TuningError::Parse(format!("failed to serialize {month}/{system}: {e}")))?;
        std::fs::write(&path, pretty)
            .map_err(|e| TuningError::Io(format!("failed to write {}: {e}", path.display())))?;

        log::info!("Saved {system} match data for {month} to {}", path.display());
        Ok(path)
    }

    /// Load one month's document back, exactly as saved.
    pub fn load(&self, month: &str, system: &str) -> TuningResult<Value> {
        let path = self.data_path(month, system)?;

        if !path.exists() {
            return Err(TuningError::NotFound(format!(
                "no {system} match data for {month} at {}",
                path.display()
            )));
        }

        let raw = read_to_string(&path)?;
        serde_json::from_str(&raw)
            .map_err(|e| TuningError::Parse(format!("failed to parse {}: {e}", path.display())))
    }

    pub fn file_exists(&self, month: &str, system: &str) -> TuningResult<bool> {
        Ok(self.data_path(month, system)?.exists())
    }

    /// Months with stored data for one system, sorted ascending.
    /// A system directory that does not exist yet is just an empty list.
    pub fn list_available_months(&self, system: &str) -> TuningResult<Vec<String>> {
        let system = MatchSystem::parse(system)?;
        let dir = self.base_dir.join(system.dir_name());

        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&dir)
            .map_err(|e| TuningError::Io(format!("failed to read {}: {e}", dir.display())))?;

        let mut months = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| TuningError::Io(format!("failed to read {}: {e}", dir.display())))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                    months.push(stem.to_string());
                }
            }
        }

        months.sort();
        Ok(months)
    }

    /// The conventional `metadata` sub-object of a month's document, if any.
    pub fn get_metadata(&self, month: &str, system: &str) -> TuningResult<Option<Value>> {
        let document = self.load(month, system)?;
        Ok(document.get("metadata").cloned())
    }
}

fn read_to_string(path: &Path) -> TuningResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| TuningError::Io(format!("failed to read {}: {e}", path.display())))
}

#[cfg(test)]
#[path = "tests/parallel_data_tests.rs"]
mod tests;
