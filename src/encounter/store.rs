//! Encounter persistence
//!
//! The whole encounter is one JSON record, overwritten in full on every
//! save. Memory stays authoritative: a failed write is retried by the next
//! save, and a missing or unreadable record restores as an empty encounter.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Combatant, Encounter};
use crate::campaign::{write_file, StoreError};

/// On-disk shape of an encounter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterRecord {
    #[serde(default)]
    pub combatants: Vec<Combatant>,
    #[serde(default)]
    pub log_lines: Vec<String>,
    /// Combatant name, `"__DM__"`, or null
    #[serde(default)]
    pub active_speaker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

/// Reads and writes one campaign's encounter record
#[derive(Debug, Clone)]
pub struct EncounterStore {
    path: PathBuf,
}

impl EncounterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the full encounter, replacing any previous record
    pub async fn persist(&self, encounter: &Encounter) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        let record = encounter.to_record();
        let bytes = serde_json::to_vec_pretty(&record)?;
        write_file(&self.path, &bytes).await?;

        debug!(
            "Saved encounter ({} combatants, {} log lines) to {}",
            record.combatants.len(),
            record.log_lines.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Read the stored record; `None` when nothing has been saved yet
    pub async fn load(&self) -> Result<Option<Encounter>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record: EncounterRecord = serde_json::from_str(&content)?;
        Ok(Some(Encounter::from_record(record)))
    }

    /// Load, degrading to an empty encounter on any failure
    pub async fn restore(&self) -> Encounter {
        match self.load().await {
            Ok(Some(encounter)) => {
                info!(
                    "Restored encounter with {} combatants from {}",
                    encounter.len(),
                    self.path.display()
                );
                encounter
            }
            Ok(None) => Encounter::new(),
            Err(e) => {
                warn!(
                    "Could not load encounter from {}: {}; starting empty",
                    self.path.display(),
                    e
                );
                Encounter::new()
            }
        }
    }
}
