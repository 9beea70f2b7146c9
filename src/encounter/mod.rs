//! Encounter state
//!
//! Holds the ordered combatant list, the combat log and the active
//! speaker. Everything here is in-memory and synchronous; durable storage
//! lives in [`store`].

mod combatant;
mod store;

use thiserror::Error;
use tracing::debug;

pub use combatant::{hp_after_damage, Combatant, HpChange};
pub use store::{EncounterRecord, EncounterStore};

use crate::campaign::{Entity, EntityKind, StoreError};
use crate::combat::Roller;

/// Display name of the narrator pseudo-combatant
pub const NARRATOR_NAME: &str = "Dungeon Master";

/// Stored in place of a combatant name when the narrator is speaking
pub const NARRATOR_KEY: &str = "__DM__";

/// User actions the encounter refuses, leaving state unchanged
#[derive(Debug, Error)]
pub enum EncounterError {
    #[error("no combatant at position {0}")]
    CombatantNotFound(usize),

    #[error("{name} has no action #{index}")]
    ActionNotFound { name: String, index: usize },

    #[error("no other combatants to target")]
    NoTargets,

    #[error("{0} cannot target itself")]
    SelfTarget(String),

    #[error("can only remove {name} once their HP is 0 (currently {hp})")]
    StillStanding { name: String, hp: i32 },

    #[error("choose a combatant to speak as first")]
    NoSpeaker,

    #[error("no campaign loaded")]
    NoCampaign,

    #[error("{kind} '{name}' not found in campaign data")]
    EntityNotFound { kind: EntityKind, name: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Who chat lines are attributed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Speaker {
    /// The Dungeon Master
    Narrator,
    /// A combatant, referenced by name
    Combatant(String),
}

/// One encounter: combatants in display/initiative order, plus the log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Encounter {
    combatants: Vec<Combatant>,
    log: Vec<String>,
    speaker: Option<Speaker>,
}

impl Encounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn combatants(&self) -> &[Combatant] {
        &self.combatants
    }

    pub fn combatant(&self, index: usize) -> Result<&Combatant, EncounterError> {
        self.combatants
            .get(index)
            .ok_or(EncounterError::CombatantNotFound(index))
    }

    pub fn combatant_mut(&mut self, index: usize) -> Result<&mut Combatant, EncounterError> {
        self.combatants
            .get_mut(index)
            .ok_or(EncounterError::CombatantNotFound(index))
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    /// Position of a combatant by name; exact match wins over case-insensitive
    pub fn find(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.find_exact(name).or_else(|| {
            self.combatants
                .iter()
                .position(|c| c.name.eq_ignore_ascii_case(name))
        })
    }

    fn find_exact(&self, name: &str) -> Option<usize> {
        self.combatants.iter().position(|c| c.name == name)
    }

    /// Everyone `index` could target
    pub fn targets_for(&self, index: usize) -> Vec<usize> {
        (0..self.combatants.len()).filter(|&i| i != index).collect()
    }

    /// Combat log, oldest first
    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub(crate) fn push_log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }

    /// Copy a sheet in as a new combatant at the end of the order
    pub fn add_combatant(&mut self, entity: &Entity, kind: EntityKind) -> usize {
        self.combatants.push(Combatant::from_entity(entity, kind));
        debug!("Added {} '{}' to encounter", kind, entity.name);
        self.combatants.len() - 1
    }

    /// Remove a fallen combatant; anyone still above 0 HP stays
    pub fn remove_combatant(&mut self, index: usize) -> Result<Combatant, EncounterError> {
        let combatant = self.combatant(index)?;
        if combatant.hp != 0 {
            return Err(EncounterError::StillStanding {
                name: combatant.name.clone(),
                hp: combatant.hp,
            });
        }

        let removed = self.combatants.remove(index);
        // Drop the speaker only if nobody left answers to the removed name
        let speaker_gone = matches!(&self.speaker, Some(Speaker::Combatant(name))
            if *name == removed.name && self.find_exact(name).is_none());
        if speaker_gone {
            self.speaker = None;
        }
        Ok(removed)
    }

    /// Give everyone a fresh d20 and reorder, highest first
    pub fn roll_initiative(&mut self, roller: &mut (impl Roller + ?Sized)) {
        for c in &mut self.combatants {
            c.initiative = roller.roll_die(20) as i32;
        }
        // sort_by is stable: ties keep their previous order
        self.combatants
            .sort_by(|a, b| b.initiative.cmp(&a.initiative));
    }

    /// The active speaker, if it still refers to someone present
    pub fn speaker(&self) -> Option<&Speaker> {
        match &self.speaker {
            Some(Speaker::Combatant(name)) if !self.combatants.iter().any(|c| &c.name == name) => {
                None
            }
            other => other.as_ref(),
        }
    }

    /// Display name of the active speaker
    pub fn speaker_name(&self) -> Option<&str> {
        match self.speaker()? {
            Speaker::Narrator => Some(NARRATOR_NAME),
            Speaker::Combatant(name) => Some(name.as_str()),
        }
    }

    pub fn speak_as(&mut self, index: usize) -> Result<(), EncounterError> {
        let name = self.combatant(index)?.name.clone();
        self.speaker = Some(Speaker::Combatant(name));
        Ok(())
    }

    pub fn speak_as_narrator(&mut self) {
        self.speaker = Some(Speaker::Narrator);
    }

    /// Snapshot for persistence
    pub fn to_record(&self) -> EncounterRecord {
        EncounterRecord {
            combatants: self.combatants.clone(),
            log_lines: self.log.clone(),
            active_speaker: self.speaker().map(|s| match s {
                Speaker::Narrator => NARRATOR_KEY.to_string(),
                Speaker::Combatant(name) => name.clone(),
            }),
            saved_at: Some(chrono::Utc::now()),
        }
    }

    /// Rebuild from a stored record; unknown speakers resolve to none
    pub fn from_record(record: EncounterRecord) -> Self {
        let mut combatants = record.combatants;
        for c in &mut combatants {
            c.hp = c.hp.max(0);
        }

        let speaker = match record.active_speaker.as_deref() {
            Some(NARRATOR_KEY) => Some(Speaker::Narrator),
            Some(name) if combatants.iter().any(|c| c.name == name) => {
                Some(Speaker::Combatant(name.to_string()))
            }
            _ => None,
        };

        Self {
            combatants,
            log: record.log_lines,
            speaker,
        }
    }
}
