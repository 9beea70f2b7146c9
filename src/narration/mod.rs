//! Optional flavor-text narration
//!
//! After an attack resolves, the engine may ask a [`Narrator`] to describe
//! it. Narration is cosmetic: the engine bounds it with a timeout and turns
//! any failure into a skip notice in the log.

mod client;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::{ChatMessage, ChatNarrator};

/// Narration failures; never fatal to combat
#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("narration API key not configured")]
    NotConfigured,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(reqwest::StatusCode),

    #[error("empty response")]
    EmptyResponse,

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Narration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    pub enabled: bool,
    /// Base URL of an OpenAI-compatible API
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Upper bound on one narration call
    pub timeout_secs: u64,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4.1-mini".to_string(),
            max_tokens: 120,
            temperature: 1.0,
            timeout_secs: 15,
        }
    }
}

impl NarrationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Name, class and race of one side of an exchange
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Participant {
    pub name: String,
    pub class: String,
    pub race: String,
}

/// Everything a narrator gets to know about one resolved action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NarrationContext {
    pub attacker: Participant,
    pub target: Participant,
    pub target_resistances: String,
    pub target_vulnerabilities: String,
    pub target_immunities: String,
    pub action_name: String,
    pub action_description: String,
    /// The engine's own log line for the outcome
    pub summary: String,
    pub hit: bool,
    pub critical: bool,
    pub damage: i32,
    pub damage_type: String,
    pub hp_before: i32,
    pub hp_after: i32,
    pub fallen: bool,
}

impl NarrationContext {
    /// "7 fire damage", or "no damage"
    pub fn damage_text(&self) -> String {
        if self.damage <= 0 {
            "no damage".to_string()
        } else if self.damage_type.trim().is_empty() {
            format!("{} damage", self.damage)
        } else {
            format!("{} {} damage", self.damage, self.damage_type.trim())
        }
    }

    /// Instruction text for a chat model
    pub fn prompt(&self) -> String {
        let who = |p: &Participant| format!("{} (class: {}, race: {})", p.name, p.class, p.race);
        format!(
            "You are a dramatic and concise Dungeon Master narrator in D&D 5e combat. \
             Write a vivid, cinematic description of the outcome of the action from a \
             third-person perspective. Take into account the calculation results, the action \
             description and the target's vulnerabilities, resistances and immunities. \
             Include tone, motion and consequence, not numbers. If the target falls to 0 HP, \
             make it climactic and final. Keep it short but engaging.\n\n\
             Attacker: {attacker}\n\
             Action: {action}\n\
             Description: {description}\n\
             Calculation by combat engine: {summary}\n\
             Target: {target}, Immunities: {imm}, Resistances: {res}, Vulnerabilities: {vul}\n\
             Hit: {hit}\n\
             Critical: {crit}\n\
             Damage: {damage}\n\
             Target HP before: {before}, after: {after}\n\
             Target Fallen: {fallen}\n",
            attacker = who(&self.attacker),
            action = self.action_name,
            description = self.action_description.trim(),
            summary = self.summary,
            target = who(&self.target),
            imm = self.target_immunities,
            res = self.target_resistances,
            vul = self.target_vulnerabilities,
            hit = self.hit,
            crit = self.critical,
            damage = self.damage_text(),
            before = self.hp_before,
            after = self.hp_after,
            fallen = self.fallen,
        )
    }
}

/// A text generator the engine can ask for flavor text
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, context: &NarrationContext) -> Result<String, NarrationError>;
}
