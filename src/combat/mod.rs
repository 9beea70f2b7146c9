//! Combat system module
//!
//! Implements D&D 5e-style combat with:
//! - Dice rolling (e.g., "2d6+3"), with crit-aware damage rolls
//! - Attack resolution against armor class
//! - Damage type tags with immunity, resistance, and vulnerability
//! - The action engine that ties them to an encounter

pub mod dice;
mod attack;
mod damage;
mod engine;
mod tags;

pub use attack::AttackResult;
pub use damage::{adjust_damage, DamageAdjustment, DamageModifier, DamageProfile};
pub use dice::{
    parse_dice, roll, roll_d20, roll_damage, roll_damage_with, roll_with, DiceRoll, RngRoller,
    RollOutcome, Roller,
};
pub use engine::{ActionOutcome, ActionReport, CombatEngine, LogSink, TracingSink};
pub use tags::{parse_tag_text, parse_tags, TagField, TagSet};
