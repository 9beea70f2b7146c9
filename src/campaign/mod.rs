//! Campaign folder storage
//!
//! A campaign is a directory of JSON collections (`characters.json`,
//! `npcs.json`), a Markdown notes file, and the saved encounter
//! (`combat_state.json`). The combat engine only reads entities, through
//! the [`EntityStore`] trait.

mod entity;
pub(crate) mod fields;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

pub use entity::{AbilityScores, Action, Entity, EntityKind};
pub use fields::DEFAULT_SCORE;

use crate::encounter::EncounterStore;

/// File holding the saved encounter
pub const STATE_FILE: &str = "combat_state.json";

/// File holding free-form campaign notes
pub const NOTES_FILE: &str = "notes.md";

/// Errors from campaign file operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read access to character and NPC sheets
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// All entities of one kind, in stored order
    async fn load_entities(&self, kind: EntityKind) -> Result<Vec<Entity>, StoreError>;

    /// First entity of a kind with exactly this name
    async fn find_entity(&self, kind: EntityKind, name: &str) -> Result<Option<Entity>, StoreError> {
        Ok(self
            .load_entities(kind)
            .await?
            .into_iter()
            .find(|e| e.name == name))
    }
}

/// A campaign directory on disk
#[derive(Debug, Clone)]
pub struct CampaignFolder {
    root: PathBuf,
}

impl CampaignFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, kind: EntityKind) -> PathBuf {
        self.root.join(format!("{}.json", kind.collection()))
    }

    /// Where the encounter state record lives
    pub fn state_path(&self) -> PathBuf {
        self.root.join(STATE_FILE)
    }

    pub fn notes_path(&self) -> PathBuf {
        self.root.join(NOTES_FILE)
    }

    /// Encounter persistence for this campaign
    pub fn encounter_store(&self) -> EncounterStore {
        EncounterStore::new(self.state_path())
    }

    /// Read a collection as raw JSON values (empty if the file is missing)
    async fn read_collection(&self, kind: EntityKind) -> Result<Vec<Value>, StoreError> {
        let path = self.collection_path(kind);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Append an entity to its collection, keeping existing records intact
    pub async fn save_entity(&self, kind: EntityKind, entity: &Entity) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let mut records = self.read_collection(kind).await?;
        records.push(serde_json::to_value(entity)?);

        let bytes = serde_json::to_vec_pretty(&records)?;
        write_file(&self.collection_path(kind), &bytes).await?;
        debug!("Saved {} '{}' ({} total)", kind, entity.name, records.len());
        Ok(())
    }

    /// Campaign notes as Markdown (empty if none saved yet)
    pub async fn load_notes(&self) -> Result<String, StoreError> {
        match tokio::fs::read_to_string(self.notes_path()).await {
            Ok(notes) => Ok(notes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save_notes(&self, notes: &str) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root).await?;
        write_file(&self.notes_path(), notes.as_bytes()).await?;
        Ok(())
    }
}

#[async_trait]
impl EntityStore for CampaignFolder {
    async fn load_entities(&self, kind: EntityKind) -> Result<Vec<Entity>, StoreError> {
        let records = self.read_collection(kind).await?;
        let mut entities = Vec::with_capacity(records.len());

        for (index, record) in records.into_iter().enumerate() {
            match serde_json::from_value::<Entity>(record) {
                Ok(entity) => entities.push(entity),
                Err(e) => warn!("Skipping unreadable {} #{}: {}", kind, index, e),
            }
        }

        Ok(entities)
    }
}

/// Overwrite a file in full and flush it to disk
pub(crate) async fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}
