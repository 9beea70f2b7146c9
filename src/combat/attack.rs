//! Attack roll resolution

use super::dice::{is_critical, is_fumble};

/// Result of an attack roll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackResult {
    /// The d20 roll
    pub roll: u32,
    /// Bonus added to the roll
    pub attack_bonus: i32,
    /// Total attack value (roll + bonus)
    pub attack_total: i32,
    /// Target's AC
    pub target_ac: i32,
    /// Whether the attack hit
    pub hit: bool,
    /// Whether it was a critical hit
    pub critical: bool,
    /// Whether it was a fumble
    pub fumble: bool,
}

impl AttackResult {
    /// Resolve a d20 roll against a target's armor class
    pub fn new(roll: u32, attack_bonus: i32, target_ac: i32) -> Self {
        let critical = is_critical(roll);
        let fumble = is_fumble(roll);
        let attack_total = (roll as i32).saturating_add(attack_bonus);

        // Critical always hits, fumble always misses
        let hit = critical || (!fumble && attack_total >= target_ac);

        Self {
            roll,
            attack_bonus,
            attack_total,
            target_ac,
            hit,
            critical,
            fumble,
        }
    }

    /// Log line with the full arithmetic, before hit or miss is revealed
    pub fn describe(&self) -> String {
        format!(
            "Attack Roll: d20({}) + Attack Bonus({}) = {} vs AC {}",
            self.roll, self.attack_bonus, self.attack_total, self.target_ac
        )
    }
}
