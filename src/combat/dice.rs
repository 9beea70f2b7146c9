//! Dice rolling system
//!
//! Parses and rolls dice notation like "2d6+3", "1d20", "4d6-2".
//! Malformed formulas never fail: they roll to 0 with a breakdown that
//! flags the input as invalid.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

/// Largest die count a formula may ask for
pub const MAX_DICE: u32 = 1000;

/// Largest die a formula may ask for
pub const MAX_SIDES: u32 = 1000;

/// `<N>d<S>[<+|-><M>]`, matched after whitespace is stripped
static DICE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i)(\d+)d(\d+)([+-]\d+)?$").unwrap());

/// Source of individual die faces.
///
/// The engine rolls through this trait so encounters can be replayed
/// with scripted dice.
pub trait Roller {
    /// Roll one die, returning a value in `1..=sides`
    fn roll_die(&mut self, sides: u32) -> u32;
}

/// Roller backed by any `rand` generator
#[derive(Debug, Clone)]
pub struct RngRoller<R>(pub R);

impl RngRoller<StdRng> {
    /// Seed a generator from the operating system
    pub fn from_os() -> Self {
        Self(StdRng::from_os_rng())
    }

    /// Deterministic generator, for reproducible sessions
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Roller for RngRoller<R> {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.0.random_range(1..=sides)
    }
}

/// A parsed dice roll specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceRoll {
    /// Number of dice to roll
    pub count: u32,
    /// Number of sides per die
    pub sides: u32,
    /// Modifier to add/subtract
    pub modifier: i32,
}

/// Total of a roll plus a human-readable reconstruction of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollOutcome {
    pub total: i32,
    pub breakdown: String,
}

impl DiceRoll {
    /// Create a new dice roll
    pub fn new(count: u32, sides: u32, modifier: i32) -> Self {
        Self { count, sides, modifier }
    }

    /// Same dice, twice as many of them, modifier untouched
    pub fn doubled(&self) -> Self {
        Self::new(self.count * 2, self.sides, self.modifier)
    }

    /// Roll and return individual die results plus total
    pub fn roll_detailed(&self, roller: &mut (impl Roller + ?Sized)) -> (Vec<u32>, i32) {
        let results: Vec<u32> = (0..self.count).map(|_| roller.roll_die(self.sides)).collect();
        let sum: i64 = results.iter().map(|&r| i64::from(r)).sum();
        let total = (sum + i64::from(self.modifier)).clamp(i64::from(i32::MIN), i64::from(i32::MAX));
        (results, total as i32)
    }

    /// Modifier rendered with its sign, or empty when zero
    fn signed_modifier(&self) -> String {
        match self.modifier {
            0 => String::new(),
            m if m > 0 => format!("+{}", m),
            m => m.to_string(),
        }
    }
}

impl FromStr for DiceRoll {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_dice(s)
    }
}

impl std::fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d{}{}", self.count, self.sides, self.signed_modifier())
    }
}

/// Parse a dice notation string like "2d6+3"
///
/// Whitespace anywhere in the input is ignored.
pub fn parse_dice(notation: &str) -> Result<DiceRoll, String> {
    let compact: String = notation.chars().filter(|c| !c.is_whitespace()).collect();
    let caps = DICE_REGEX
        .captures(&compact)
        .ok_or_else(|| format!("Not a dice formula: '{}'", notation))?;

    let count: u32 = caps[1]
        .parse()
        .map_err(|_| format!("Invalid dice count: {}", &caps[1]))?;
    let sides: u32 = caps[2]
        .parse()
        .map_err(|_| format!("Invalid die sides: {}", &caps[2]))?;
    let modifier: i32 = match caps.get(3) {
        Some(m) => m
            .as_str()
            .parse()
            .map_err(|_| format!("Invalid modifier: {}", m.as_str()))?,
        None => 0,
    };

    if count == 0 {
        return Err("Dice count must be at least 1".to_string());
    }
    if count > MAX_DICE {
        return Err(format!("Dice count must be at most {}", MAX_DICE));
    }
    if sides == 0 {
        return Err("Die sides must be at least 1".to_string());
    }
    if sides > MAX_SIDES {
        return Err(format!("Die sides must be at most {}", MAX_SIDES));
    }

    Ok(DiceRoll { count, sides, modifier })
}

/// Roll a general-purpose formula such as an ability check
pub fn roll(formula: &str) -> RollOutcome {
    roll_with(formula, &mut RngRoller(rand::rng()))
}

/// [`roll`] with an explicit die source
pub fn roll_with(formula: &str, roller: &mut (impl Roller + ?Sized)) -> RollOutcome {
    let Ok(dice) = parse_dice(formula) else {
        return RollOutcome {
            total: 0,
            breakdown: "Invalid dice formula".to_string(),
        };
    };

    let (faces, total) = dice.roll_detailed(roller);
    let mut shown = format!("({})", join_faces(&faces));
    if dice.modifier != 0 {
        shown.push(' ');
        shown.push_str(&dice.signed_modifier());
    }

    RollOutcome {
        total,
        breakdown: format!("{}: {} = {}", formula, shown, total),
    }
}

/// Roll damage; a critical hit doubles the dice but not the modifier.
///
/// The returned total is never negative.
pub fn roll_damage(formula: &str, crit: bool) -> RollOutcome {
    roll_damage_with(formula, crit, &mut RngRoller(rand::rng()))
}

/// [`roll_damage`] with an explicit die source
pub fn roll_damage_with(
    formula: &str,
    crit: bool,
    roller: &mut (impl Roller + ?Sized),
) -> RollOutcome {
    let Ok(base) = parse_dice(formula) else {
        return RollOutcome {
            total: 0,
            breakdown: format!("Invalid damage formula '{}'", formula),
        };
    };

    let dice = if crit { base.doubled() } else { base };
    let (faces, raw) = dice.roll_detailed(roller);
    let mut parts = join_faces(&faces);
    if dice.modifier != 0 {
        parts.push(' ');
        parts.push_str(&dice.signed_modifier());
    }

    RollOutcome {
        total: raw.max(0),
        breakdown: format!("{}: ({}) = {}", dice, parts, raw),
    }
}

fn join_faces(faces: &[u32]) -> String {
    faces
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(" + ")
}

/// Roll a single d20
pub fn roll_d20(roller: &mut (impl Roller + ?Sized)) -> u32 {
    roller.roll_die(20)
}

/// Check if a d20 roll is a natural 20 (critical hit)
pub fn is_critical(roll: u32) -> bool {
    roll == 20
}

/// Check if a d20 roll is a natural 1 (critical fail)
pub fn is_fumble(roll: u32) -> bool {
    roll == 1
}
