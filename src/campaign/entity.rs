//! Character and NPC records as stored in a campaign folder

use serde::{Deserialize, Serialize};

use super::fields;
use crate::combat::TagField;

/// Which collection an entity belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    #[serde(rename = "Character")]
    Character,
    #[serde(rename = "NPC")]
    Npc,
}

impl EntityKind {
    /// File stem of the collection in the campaign folder
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Character => "characters",
            EntityKind::Npc => "npcs",
        }
    }

    pub fn all() -> &'static [EntityKind] {
        &[EntityKind::Character, EntityKind::Npc]
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Character => write!(f, "Character"),
            EntityKind::Npc => write!(f, "NPC"),
        }
    }
}

/// Ability scores; missing or unreadable scores are 10
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    #[serde(rename = "STR", default = "fields::default_score", deserialize_with = "fields::score")]
    pub strength: i32,
    #[serde(rename = "DEX", default = "fields::default_score", deserialize_with = "fields::score")]
    pub dexterity: i32,
    #[serde(rename = "CON", default = "fields::default_score", deserialize_with = "fields::score")]
    pub constitution: i32,
    #[serde(rename = "INT", default = "fields::default_score", deserialize_with = "fields::score")]
    pub intelligence: i32,
    #[serde(rename = "WIS", default = "fields::default_score", deserialize_with = "fields::score")]
    pub wisdom: i32,
    #[serde(rename = "CHA", default = "fields::default_score", deserialize_with = "fields::score")]
    pub charisma: i32,
}

impl Default for AbilityScores {
    fn default() -> Self {
        let s = fields::DEFAULT_SCORE;
        Self {
            strength: s,
            dexterity: s,
            constitution: s,
            intelligence: s,
            wisdom: s,
            charisma: s,
        }
    }
}

/// Something a character or NPC can do on its turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(default, deserialize_with = "fields::text")]
    pub name: String,
    /// melee, ranged, spell, utility... free text
    #[serde(rename = "type", default, deserialize_with = "fields::text")]
    pub kind: String,
    /// Missing or unparsable bonuses are 0
    #[serde(default, deserialize_with = "fields::int_or_zero")]
    pub attack_bonus: i32,
    /// Dice formula; may be empty
    #[serde(default, deserialize_with = "fields::text")]
    pub damage: String,
    #[serde(default, deserialize_with = "fields::tags")]
    pub damage_type: TagField,
    #[serde(default, deserialize_with = "fields::text")]
    pub description: String,
}

impl Action {
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Unknown Action"
        } else {
            &self.name
        }
    }
}

/// A character or NPC sheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "Name", default, deserialize_with = "fields::text")]
    pub name: String,
    #[serde(rename = "Class", default, deserialize_with = "fields::text")]
    pub class: String,
    #[serde(rename = "Race", default, deserialize_with = "fields::text")]
    pub race: String,
    #[serde(rename = "HP", default = "fields::default_score", deserialize_with = "fields::score")]
    pub hp: i32,
    #[serde(rename = "AC", default = "fields::default_score", deserialize_with = "fields::score")]
    pub ac: i32,
    #[serde(flatten)]
    pub abilities: AbilityScores,
    #[serde(rename = "Actions", default)]
    pub actions: Vec<Action>,
    #[serde(rename = "Resistances", default, deserialize_with = "fields::tags")]
    pub resistances: TagField,
    #[serde(rename = "Vulnerabilities", default, deserialize_with = "fields::tags")]
    pub vulnerabilities: TagField,
    #[serde(rename = "Immunities", default, deserialize_with = "fields::tags")]
    pub immunities: TagField,
    #[serde(rename = "TokenImage", default, deserialize_with = "fields::text")]
    pub token_image: String,
}

impl Entity {
    /// Sheet with defaults everywhere but the name
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            hp: fields::DEFAULT_SCORE,
            ac: fields::DEFAULT_SCORE,
            ..Default::default()
        }
    }
}
