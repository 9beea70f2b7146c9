//! encounter - tabletop combat engine
//!
//! Dice, damage adjustment and encounter state for D&D 5e-style campaigns,
//! with an optional chat-model narrator.

pub mod campaign;
pub mod combat;
pub mod encounter;
pub mod narration;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use campaign::{CampaignFolder, Entity, EntityKind, EntityStore, StoreError};
pub use combat::{ActionReport, CombatEngine, LogSink, TracingSink};
pub use encounter::{Encounter, EncounterError, EncounterStore};
pub use narration::{ChatNarrator, NarrationConfig, NarrationError, Narrator};

/// Config file read from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "encounter.toml";

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Campaign folder; without one nothing is saved
    pub campaign_dir: Option<PathBuf>,
    /// Default tracing filter, overridden by `RUST_LOG`
    pub log_filter: String,
    pub narration: NarrationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            campaign_dir: None,
            log_filter: "encounter=info".to_string(),
            narration: NarrationConfig::default(),
        }
    }
}

impl Config {
    /// Defaults, then the TOML file, then `ENCOUNTER_*` variables
    /// (`__` separates nested keys, e.g. `ENCOUNTER_NARRATION__MODEL`).
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

        let mut config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("ENCOUNTER_").split("__"))
            .extract()?;

        if config.narration.api_key.is_none() {
            config.narration.api_key = std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
        Ok(config)
    }

    pub fn campaign(&self) -> Option<CampaignFolder> {
        self.campaign_dir.as_ref().map(CampaignFolder::new)
    }

    /// The configured narrator, if narration is enabled and usable
    pub fn narrator(&self) -> Option<Arc<dyn Narrator>> {
        if !self.narration.enabled {
            return None;
        }
        match ChatNarrator::new(&self.narration) {
            Ok(narrator) => Some(Arc::new(narrator)),
            Err(NarrationError::NotConfigured) => {
                debug!("Narration disabled: no API key");
                None
            }
            Err(e) => {
                warn!("Narration disabled: {}", e);
                None
            }
        }
    }

    /// An engine wired to this config's campaign and narrator
    pub fn engine(&self) -> CombatEngine {
        let mut engine = CombatEngine::new();
        if let Some(campaign) = self.campaign() {
            engine = engine.with_campaign(campaign);
        }
        if let Some(narrator) = self.narrator() {
            engine = engine.with_narrator(narrator, self.narration.timeout());
        }
        engine
    }
}
