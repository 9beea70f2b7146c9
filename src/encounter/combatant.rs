//! Combatants: mutable runtime copies of character and NPC sheets

use serde::{Deserialize, Serialize};

use crate::campaign::fields;
use crate::campaign::{AbilityScores, Action, Entity, EntityKind};
use crate::combat::{DamageProfile, TagField};

/// A participant in the encounter.
///
/// Created by copying an [`Entity`]; later edits to the sheet only reach
/// the combatant through [`Combatant::refresh_actions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    #[serde(rename = "Name", default, deserialize_with = "fields::text")]
    pub name: String,
    #[serde(rename = "Type")]
    pub kind: EntityKind,
    #[serde(rename = "Class", default, deserialize_with = "fields::text")]
    pub class: String,
    #[serde(rename = "Race", default, deserialize_with = "fields::text")]
    pub race: String,
    /// Current hit points, never below 0
    #[serde(rename = "HP", default = "fields::default_score", deserialize_with = "fields::score")]
    pub hp: i32,
    #[serde(rename = "AC", default = "fields::default_score", deserialize_with = "fields::score")]
    pub ac: i32,
    #[serde(flatten)]
    pub abilities: AbilityScores,
    /// 0 until initiative is rolled
    #[serde(rename = "Initiative", default, deserialize_with = "fields::int_or_zero")]
    pub initiative: i32,
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

/// Hit points before and after a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HpChange {
    pub before: i32,
    pub after: i32,
}

impl HpChange {
    /// Whether this change dropped the combatant to 0
    pub fn fell(&self) -> bool {
        self.before > 0 && self.after == 0
    }
}

/// Hit points left after taking `damage`, floored at 0
pub fn hp_after_damage(hp_before: i32, damage: i32) -> i32 {
    hp_before.saturating_sub(damage.max(0)).max(0)
}

impl Combatant {
    /// Copy a sheet into the encounter
    pub fn from_entity(entity: &Entity, kind: EntityKind) -> Self {
        Self {
            name: entity.name.clone(),
            kind,
            class: entity.class.clone(),
            race: entity.race.clone(),
            hp: entity.hp.max(0),
            ac: entity.ac,
            abilities: entity.abilities,
            initiative: 0,
            actions: entity.actions.clone(),
            resistances: entity.resistances.clone(),
            vulnerabilities: entity.vulnerabilities.clone(),
            immunities: entity.immunities.clone(),
            token_image: entity.token_image.clone(),
        }
    }

    /// Replace the action list with a freshly loaded sheet's
    pub fn refresh_actions(&mut self, entity: &Entity) {
        self.actions = entity.actions.clone();
    }

    /// Normalized tags, built at damage time from the stored text
    pub fn damage_profile(&self) -> DamageProfile {
        DamageProfile::from_fields(&self.resistances, &self.vulnerabilities, &self.immunities)
    }

    /// Subtract damage from HP
    pub fn apply_damage(&mut self, damage: i32) -> HpChange {
        let before = self.hp;
        self.hp = hp_after_damage(before, damage);
        HpChange {
            before,
            after: self.hp,
        }
    }

    /// At 0 HP; eligible for removal
    pub fn is_fallen(&self) -> bool {
        self.hp == 0
    }

    /// Look up an action by 1-based position or by name (case-insensitive)
    pub fn find_action(&self, query: &str) -> Option<usize> {
        let query = query.trim();
        if let Ok(n) = query.parse::<usize>() {
            return (1..=self.actions.len()).contains(&n).then(|| n - 1);
        }
        self.actions
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(query))
    }
}
