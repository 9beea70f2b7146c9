//! Common test utilities - EncounterTest harness over a temporary campaign

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use encounter::combat::Roller;
use encounter::{CampaignFolder, CombatEngine};
use tempfile::TempDir;

/// Die faces handed out in order; shared so tests can queue more mid-run
#[derive(Clone, Default)]
pub struct Script(Arc<Mutex<VecDeque<u32>>>);

impl Script {
    pub fn push(&self, faces: &[u32]) {
        self.0.lock().unwrap().extend(faces.iter().copied());
    }

    pub fn remaining(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

impl Roller for Script {
    fn roll_die(&mut self, sides: u32) -> u32 {
        let face = self
            .0
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted roller ran out of faces");
        assert!(face >= 1 && face <= sides, "face {} is not on a d{}", face, sides);
        face
    }
}

/// A campaign folder in a temp dir, seeded with a small party and foes
pub struct EncounterTest {
    pub dir: TempDir,
    pub campaign: CampaignFolder,
    pub dice: Script,
    lines: Arc<Mutex<Vec<String>>>,
}

pub const CHARACTERS: &str = r#"[
    {
        "Name": "Aria", "Class": "Fighter", "Race": "Human",
        "HP": 24, "AC": "16", "STR": 16, "DEX": "14",
        "Actions": [
            {"name": "Warhammer", "type": "melee", "attack_bonus": "+5",
             "damage": "2d6+3", "damage_type": "bludgeoning",
             "description": "A two-handed overhead blow."},
            {"name": "Firebolt", "type": "spell", "attack_bonus": 4,
             "damage": "1d10", "damage_type": "Fire"}
        ]
    },
    {
        "Name": "Bram", "Class": "Cleric", "Race": "Dwarf",
        "HP": "18", "AC": 18,
        "Actions": [{"name": "Mace", "attack_bonus": "three", "damage": "1d6"}]
    }
]"#;

pub const NPCS: &str = r#"[
    {
        "Name": "Ogre", "Race": "Giant", "HP": 30, "AC": 15,
        "Resistances": "Bludgeoning, cold",
        "Actions": [{"name": "Greatclub", "attack_bonus": 6,
                     "damage": "2d8+4", "damage_type": "bludgeoning"}]
    },
    {
        "Name": "Fire Imp", "HP": 6, "AC": 12,
        "Immunities": ["fire", "poison"],
        "Vulnerabilities": "cold",
        "Actions": []
    }
]"#;

impl EncounterTest {
    pub fn start() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("characters.json"), CHARACTERS)?;
        std::fs::write(dir.path().join("npcs.json"), NPCS)?;

        Ok(Self {
            campaign: CampaignFolder::new(dir.path()),
            dir,
            dice: Script::default(),
            lines: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// A fresh engine over this campaign, sharing the scripted dice and log capture
    pub fn engine(&self) -> CombatEngine {
        let lines = Arc::clone(&self.lines);
        CombatEngine::new()
            .with_campaign(self.campaign.clone())
            .with_roller(self.dice.clone())
            .with_sink(move |line: &str| lines.lock().unwrap().push(line.to_string()))
    }

    /// Every line any engine from this harness has emitted
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn clear_lines(&self) {
        self.lines.lock().unwrap().clear();
    }

    pub fn state_json(&self) -> Result<serde_json::Value> {
        let raw = std::fs::read_to_string(self.campaign.state_path())?;
        Ok(serde_json::from_str(&raw)?)
    }
}
