//! Damage adjustment
//!
//! Handles damage calculation with:
//! - Multi-type damage ("fire/poison")
//! - Immunity (0 damage, only when every damage tag is immune)
//! - Resistance (halved, rounded down)
//! - Vulnerability (doubled, applied after resistance)

use serde::{Deserialize, Serialize};

use super::tags::{parse_tags, TagField, TagSet};

/// Modifier for damage resistance/immunity/vulnerability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageModifier {
    /// Immune - takes 0% damage
    Immune,
    /// Resistant - takes 50% damage (rounded down)
    Resistant,
    /// Vulnerable - takes 200% damage
    Vulnerable,
}

impl DamageModifier {
    /// Apply this modifier to damage amount
    pub fn apply(&self, damage: i32) -> i32 {
        match self {
            DamageModifier::Immune => 0,
            DamageModifier::Resistant => damage.div_euclid(2),
            DamageModifier::Vulnerable => damage.saturating_mul(2),
        }
    }

    /// Word used for this modifier in log notes
    pub fn label(&self) -> &'static str {
        match self {
            DamageModifier::Immune => "immune",
            DamageModifier::Resistant => "resistance",
            DamageModifier::Vulnerable => "vulnerability",
        }
    }
}

/// Result of adjusting a damage roll against a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DamageAdjustment {
    /// Damage before modifiers
    pub base_damage: i32,
    /// Damage after modifiers
    pub final_damage: i32,
    /// Modifiers applied, in application order
    pub applied: Vec<DamageModifier>,
}

impl DamageAdjustment {
    /// "immune", "resistance", "resistance+vulnerability", or None
    pub fn note(&self) -> Option<String> {
        if self.applied.is_empty() {
            return None;
        }
        Some(
            self.applied
                .iter()
                .map(DamageModifier::label)
                .collect::<Vec<_>>()
                .join("+"),
        )
    }

    pub fn is_immune(&self) -> bool {
        self.applied.contains(&DamageModifier::Immune)
    }
}

/// Normalized resistances/vulnerabilities/immunities of one target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DamageProfile {
    pub resistances: TagSet,
    pub vulnerabilities: TagSet,
    pub immunities: TagSet,
}

impl DamageProfile {
    /// Create a new empty damage profile (all normal)
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize the three stored tag fields
    pub fn from_fields(
        resistances: &TagField,
        vulnerabilities: &TagField,
        immunities: &TagField,
    ) -> Self {
        Self {
            resistances: parse_tags(resistances),
            vulnerabilities: parse_tags(vulnerabilities),
            immunities: parse_tags(immunities),
        }
    }

    /// Calculate damage after applying modifiers.
    ///
    /// Full immunity requires every damage tag to be immune. Otherwise
    /// resistance and vulnerability are checked against all damage tags,
    /// immune ones included, halving first and doubling second.
    pub fn calculate_damage(&self, base: i32, damage_types: &TagSet) -> DamageAdjustment {
        if !damage_types.is_empty() && damage_types.is_subset(&self.immunities) {
            return DamageAdjustment {
                base_damage: base,
                final_damage: DamageModifier::Immune.apply(base),
                applied: vec![DamageModifier::Immune],
            };
        }

        let mut final_damage = base;
        let mut applied = Vec::new();
        for (modifier, tags) in [
            (DamageModifier::Resistant, &self.resistances),
            (DamageModifier::Vulnerable, &self.vulnerabilities),
        ] {
            if !damage_types.is_disjoint(tags) {
                final_damage = modifier.apply(final_damage);
                applied.push(modifier);
            }
        }

        DamageAdjustment {
            base_damage: base,
            final_damage,
            applied,
        }
    }
}

/// Adjust `base` damage of the given (possibly multi-part) type
pub fn adjust_damage(base: i32, damage_type: &TagField, target: &DamageProfile) -> DamageAdjustment {
    target.calculate_damage(base, &parse_tags(damage_type))
}
