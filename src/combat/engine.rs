//! Action execution
//!
//! [`CombatEngine`] owns the encounter and drives every user action through
//! to a committed state: validate, roll, mutate, log, auto-save. Narration
//! runs last and can only ever add a log line.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::attack::AttackResult;
use super::damage::DamageAdjustment;
use super::dice::{roll_d20, roll_damage_with, RngRoller, RollOutcome, Roller};
use crate::campaign::{CampaignFolder, Entity, EntityKind, EntityStore};
use crate::encounter::{Combatant, Encounter, EncounterError, EncounterStore, HpChange};
use crate::narration::{NarrationContext, NarrationError, Narrator, Participant};

/// Receives each combat log line as it is appended
pub trait LogSink: Send + Sync {
    fn append(&self, line: &str);
}

impl<F> LogSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn append(&self, line: &str) {
        self(line)
    }
}

/// Forwards combat log lines to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn append(&self, line: &str) {
        info!(target: "encounter::combat_log", "{}", line);
    }
}

/// How an attack ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Miss,
    Hit {
        damage: RollOutcome,
        adjustment: DamageAdjustment,
        hp: HpChange,
    },
}

/// Everything one action execution produced
#[derive(Debug, Clone)]
pub struct ActionReport {
    pub attack: AttackResult,
    pub outcome: ActionOutcome,
    /// Log lines appended by this action, narration included
    pub events: Vec<String>,
    /// Whether the final auto-save reached storage
    pub persisted: bool,
}

/// Runs user actions against one encounter
pub struct CombatEngine {
    encounter: Encounter,
    sink: Box<dyn LogSink>,
    roller: Box<dyn Roller + Send>,
    entities: Option<Arc<dyn EntityStore>>,
    store: Option<EncounterStore>,
    narrator: Option<Arc<dyn Narrator>>,
    narration_timeout: Duration,
}

impl CombatEngine {
    /// An engine with an empty encounter, OS randomness and a tracing sink
    pub fn new() -> Self {
        Self {
            encounter: Encounter::new(),
            sink: Box::new(TracingSink),
            roller: Box::new(RngRoller::from_os()),
            entities: None,
            store: None,
            narrator: None,
            narration_timeout: Duration::from_secs(15),
        }
    }

    pub fn with_sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn with_roller(mut self, roller: impl Roller + Send + 'static) -> Self {
        self.roller = Box::new(roller);
        self
    }

    pub fn with_encounter(mut self, encounter: Encounter) -> Self {
        self.encounter = encounter;
        self
    }

    /// Read sheets from and save the encounter into a campaign folder
    pub fn with_campaign(self, campaign: CampaignFolder) -> Self {
        let store = campaign.encounter_store();
        self.with_entity_store(Arc::new(campaign))
            .with_encounter_store(store)
    }

    pub fn with_entity_store(mut self, entities: Arc<dyn EntityStore>) -> Self {
        self.entities = Some(entities);
        self
    }

    pub fn with_encounter_store(mut self, store: EncounterStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_narrator(mut self, narrator: Arc<dyn Narrator>, timeout: Duration) -> Self {
        self.narrator = Some(narrator);
        self.narration_timeout = timeout;
        self
    }

    pub fn encounter(&self) -> &Encounter {
        &self.encounter
    }

    /// Append one line to the log and hand it to the sink
    fn record(&mut self, line: String) -> String {
        self.sink.append(&line);
        self.encounter.push_log(line.clone());
        line
    }

    fn emit(&mut self, events: &mut Vec<String>, line: String) {
        let line = self.record(line);
        events.push(line);
    }

    /// Best-effort save; memory stays authoritative either way
    async fn autosave(&self) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        match store.persist(&self.encounter).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Auto-save to {} failed: {}", store.path().display(), e);
                false
            }
        }
    }

    /// Save now, reporting failure
    pub async fn save_state(&self) -> Result<(), EncounterError> {
        let store = self.store.as_ref().ok_or(EncounterError::NoCampaign)?;
        store.persist(&self.encounter).await?;
        Ok(())
    }

    /// Replace the encounter with the stored one, replaying its log to the sink
    pub async fn load_state(&mut self) -> Result<(), EncounterError> {
        let store = self.store.as_ref().ok_or(EncounterError::NoCampaign)?;
        self.encounter = store.restore().await;
        for line in self.encounter.log() {
            self.sink.append(line);
        }
        Ok(())
    }

    /// Look a sheet up in the campaign and add it as a combatant
    pub async fn add_combatant(
        &mut self,
        kind: EntityKind,
        name: &str,
    ) -> Result<usize, EncounterError> {
        let entities = self.entities.clone().ok_or(EncounterError::NoCampaign)?;
        let entity = entities
            .find_entity(kind, name)
            .await?
            .ok_or_else(|| EncounterError::EntityNotFound {
                kind,
                name: name.to_string(),
            })?;
        Ok(self.add_entity(&entity, kind).await)
    }

    /// Add an already-loaded sheet as a combatant
    pub async fn add_entity(&mut self, entity: &Entity, kind: EntityKind) -> usize {
        let index = self.encounter.add_combatant(entity, kind);
        self.autosave().await;
        index
    }

    pub async fn roll_initiative(&mut self) {
        self.encounter.roll_initiative(&mut *self.roller);
        debug!("Rolled initiative for {} combatants", self.encounter.len());
        self.autosave().await;
    }

    /// Remove a fallen combatant
    pub async fn remove_combatant(&mut self, index: usize) -> Result<String, EncounterError> {
        let removed = self.encounter.remove_combatant(index)?;
        let line = self.record(format!("{} has been removed from combat.", removed.name));
        self.autosave().await;
        Ok(line)
    }

    /// Re-copy a combatant's actions from its current sheet
    pub async fn refresh_actions(&mut self, index: usize) -> Result<String, EncounterError> {
        let entities = self.entities.clone().ok_or(EncounterError::NoCampaign)?;
        let (name, kind) = {
            let c = self.encounter.combatant(index)?;
            (c.name.clone(), c.kind)
        };

        let entity = entities
            .find_entity(kind, &name)
            .await?
            .ok_or_else(|| EncounterError::EntityNotFound {
                kind,
                name: name.clone(),
            })?;

        self.encounter.combatant_mut(index)?.refresh_actions(&entity);
        let line = self.record(format!("Actions for {} refreshed from campaign data.", name));
        self.autosave().await;
        Ok(line)
    }

    pub fn speak_as(&mut self, index: usize) -> Result<(), EncounterError> {
        self.encounter.speak_as(index)
    }

    pub fn speak_as_dm(&mut self) {
        self.encounter.speak_as_narrator();
    }

    /// Append a chat line from the active speaker; blank messages are ignored
    pub async fn say(&mut self, message: &str) -> Result<Option<String>, EncounterError> {
        let message = message.trim();
        if message.is_empty() {
            return Ok(None);
        }

        let speaker = self
            .encounter
            .speaker_name()
            .ok_or(EncounterError::NoSpeaker)?
            .to_string();
        let line = self.record(format!("{} said: {}", speaker, message));
        self.autosave().await;
        Ok(Some(line))
    }

    /// Resolve one action from `attacker` against `target`.
    ///
    /// All validation happens before anything is logged or rolled, so an
    /// `Err` leaves the encounter untouched. Once the target's HP changes
    /// nothing rolls it back.
    pub async fn execute_action(
        &mut self,
        attacker: usize,
        action_index: usize,
        target: usize,
    ) -> Result<ActionReport, EncounterError> {
        let actor = self.encounter.combatant(attacker)?;
        let action = actor.actions.get(action_index).cloned().ok_or_else(|| {
            EncounterError::ActionNotFound {
                name: actor.name.clone(),
                index: action_index.saturating_add(1),
            }
        })?;
        let attacker_info = participant(actor);

        if self.encounter.targets_for(attacker).is_empty() {
            return Err(EncounterError::NoTargets);
        }
        if target == attacker {
            return Err(EncounterError::SelfTarget(attacker_info.name));
        }
        let target_ac = self.encounter.combatant(target)?.ac;

        let mut events = Vec::new();
        let action_name = action.display_name().to_string();
        self.emit(
            &mut events,
            format!("{} prepares to use {}.", attacker_info.name, action_name),
        );

        let attack = AttackResult::new(roll_d20(&mut *self.roller), action.attack_bonus, target_ac);
        self.emit(&mut events, attack.describe());

        let outcome = if attack.hit {
            let damage = roll_damage_with(&action.damage, attack.critical, &mut *self.roller);
            let defender = self.encounter.combatant_mut(target)?;
            let adjustment = defender
                .damage_profile()
                .calculate_damage(damage.total, &action.damage_type.tags());
            let hp = defender.apply_damage(adjustment.final_damage);
            ActionOutcome::Hit {
                damage,
                adjustment,
                hp,
            }
        } else {
            ActionOutcome::Miss
        };

        let defender = participant(self.encounter.combatant(target)?);
        let damage_type = action.damage_type.to_string();
        let summary = match &outcome {
            ActionOutcome::Miss => {
                format!("{}'s attack misses {}.", attacker_info.name, defender.name)
            }
            ActionOutcome::Hit {
                damage,
                adjustment,
                hp,
            } => {
                let mut line = format!(
                    "{} hits {} with {}! {}",
                    attacker_info.name, defender.name, action_name, damage.breakdown
                );
                if let Some(note) = adjustment.note() {
                    line.push_str(&format!(" ({})", note));
                }
                line.push_str(&format!(" Damage: {}", adjustment.final_damage));
                if !damage_type.trim().is_empty() {
                    line.push_str(&format!(" ({})", damage_type));
                }
                line.push_str(&format!(". HP: {} → {}.", hp.before, hp.after));
                if attack.critical {
                    line.push_str(" (Critical Hit!)");
                }
                line
            }
        };
        self.emit(&mut events, summary.clone());

        if let ActionOutcome::Hit { hp, .. } = &outcome {
            if hp.fell() {
                self.emit(&mut events, format!("{} has fallen!", defender.name));
            }
        }

        let mut persisted = self.autosave().await;

        if let Some(narrator) = self.narrator.clone() {
            let target_c = self.encounter.combatant(target)?;
            let (damage, hp) = match &outcome {
                ActionOutcome::Hit { adjustment, hp, .. } => (adjustment.final_damage, *hp),
                ActionOutcome::Miss => (
                    0,
                    HpChange {
                        before: target_c.hp,
                        after: target_c.hp,
                    },
                ),
            };
            let context = NarrationContext {
                attacker: attacker_info,
                target: defender,
                target_resistances: target_c.resistances.to_string(),
                target_vulnerabilities: target_c.vulnerabilities.to_string(),
                target_immunities: target_c.immunities.to_string(),
                action_name,
                action_description: action.description.clone(),
                summary,
                hit: attack.hit,
                critical: attack.critical,
                damage,
                damage_type,
                hp_before: hp.before,
                hp_after: hp.after,
                fallen: hp.fell(),
            };

            let line = match self.narrate(narrator.as_ref(), &context).await {
                Ok(text) => format!("DM: {}", text),
                Err(e) => {
                    warn!("Narration skipped: {}", e);
                    format!("[Narration skipped: {}]", e)
                }
            };
            self.emit(&mut events, line);
            persisted = self.autosave().await;
        }

        Ok(ActionReport {
            attack,
            outcome,
            events,
            persisted,
        })
    }

    async fn narrate(
        &self,
        narrator: &dyn Narrator,
        context: &NarrationContext,
    ) -> Result<String, NarrationError> {
        let text = tokio::time::timeout(self.narration_timeout, narrator.narrate(context))
            .await
            .map_err(|_| NarrationError::Timeout(self.narration_timeout))??;

        let text = text.trim();
        if text.is_empty() {
            return Err(NarrationError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

impl Default for CombatEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn participant(c: &Combatant) -> Participant {
    Participant {
        name: c.name.clone(),
        class: c.class.clone(),
        race: c.race.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::Action;
    use crate::combat::dice::tests::Loaded;
    use crate::encounter::Speaker;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::tempdir;

    fn action(name: &str, bonus: i32, damage: &str, damage_type: &str) -> Action {
        Action {
            name: name.into(),
            attack_bonus: bonus,
            damage: damage.into(),
            damage_type: damage_type.into(),
            ..Action::default()
        }
    }

    fn aria() -> Entity {
        let mut e = Entity::named("Aria");
        e.class = "Fighter".into();
        e.hp = 12;
        e.actions = vec![
            action("Warhammer", 5, "2d6+3", "bludgeoning"),
            action("Torch", 2, "1d4", "fire"),
        ];
        e
    }

    fn ogre(hp: i32) -> Entity {
        let mut e = Entity::named("Ogre");
        e.hp = hp;
        e.ac = 15;
        e.resistances = "bludgeoning".into();
        e
    }

    fn captured() -> (Arc<Mutex<Vec<String>>>, impl LogSink) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let lines = Arc::clone(&lines);
            move |line: &str| lines.lock().unwrap().push(line.to_string())
        };
        (lines, sink)
    }

    async fn arena(faces: &[u32], ogre_hp: i32) -> CombatEngine {
        let mut engine = CombatEngine::new().with_roller(Loaded::new(faces));
        engine.add_entity(&aria(), EntityKind::Character).await;
        engine.add_entity(&ogre(ogre_hp), EntityKind::Npc).await;
        engine
    }

    #[tokio::test]
    async fn test_hit_with_resistance() {
        let (lines, sink) = captured();
        let mut engine = arena(&[12, 4, 2], 20).await.with_sink(sink);

        let report = engine.execute_action(0, 0, 1).await.unwrap();

        assert!(report.attack.hit);
        assert_eq!(report.attack.attack_total, 17);
        let ActionOutcome::Hit { damage, adjustment, hp } = &report.outcome else {
            panic!("expected a hit");
        };
        assert_eq!(damage.total, 9);
        assert_eq!(adjustment.final_damage, 4);
        assert_eq!(*hp, HpChange { before: 20, after: 16 });
        assert_eq!(engine.encounter().combatants()[1].hp, 16);

        assert_eq!(
            report.events,
            vec![
                "Aria prepares to use Warhammer.",
                "Attack Roll: d20(12) + Attack Bonus(5) = 17 vs AC 15",
                "Aria hits Ogre with Warhammer! 2d6+3: (4 + 2 +3) = 9 (resistance) Damage: 4 (bludgeoning). HP: 20 → 16.",
            ]
        );
        assert_eq!(*lines.lock().unwrap(), report.events);
        assert_eq!(engine.encounter().log(), report.events.as_slice());
        assert!(!report.persisted);
    }

    #[tokio::test]
    async fn test_miss_leaves_hp() {
        let mut engine = arena(&[9], 20).await;
        let report = engine.execute_action(0, 0, 1).await.unwrap();

        assert_eq!(report.outcome, ActionOutcome::Miss);
        assert_eq!(report.events.last().unwrap(), "Aria's attack misses Ogre.");
        assert_eq!(engine.encounter().combatants()[1].hp, 20);
    }

    #[tokio::test]
    async fn test_natural_one_misses_and_twenty_crits() {
        let mut engine = arena(&[1], 20).await;
        let report = engine.execute_action(0, 0, 1).await.unwrap();
        assert!(report.attack.fumble);
        assert_eq!(report.outcome, ActionOutcome::Miss);

        let mut engine = arena(&[20, 1, 1, 1, 1], 20).await;
        let report = engine.execute_action(0, 0, 1).await.unwrap();
        let last = report.events.last().unwrap();
        assert!(last.starts_with("Aria hits Ogre with Warhammer! 4d6+3: (1 + 1 + 1 + 1 +3) = 7"));
        assert!(last.ends_with("HP: 20 → 17. (Critical Hit!)"));
    }

    #[tokio::test]
    async fn test_fall_is_logged_once() {
        let mut engine = arena(&[18, 6, 6], 5).await;
        let report = engine.execute_action(0, 0, 1).await.unwrap();

        assert_eq!(report.events.last().unwrap(), "Ogre has fallen!");
        assert_eq!(engine.encounter().combatants()[1].hp, 0);
        assert!(engine.encounter().combatants()[1].is_fallen());
    }

    #[tokio::test]
    async fn test_invalid_damage_formula_is_zero() {
        let mut sheet = aria();
        sheet.actions = vec![action("Glare", 10, "", "psychic")];
        let mut engine = CombatEngine::new().with_roller(Loaded::new(&[15]));
        engine.add_entity(&sheet, EntityKind::Character).await;
        engine.add_entity(&ogre(20), EntityKind::Npc).await;

        let report = engine.execute_action(0, 0, 1).await.unwrap();
        let ActionOutcome::Hit { damage, hp, .. } = &report.outcome else {
            panic!("expected a hit");
        };
        assert_eq!(damage.total, 0);
        assert_eq!(damage.breakdown, "Invalid damage formula ''");
        assert_eq!(hp.after, 20);
    }

    #[tokio::test]
    async fn test_rejections_leave_state_unchanged() {
        let mut solo = CombatEngine::new();
        solo.add_entity(&aria(), EntityKind::Character).await;
        assert!(matches!(
            solo.execute_action(0, 0, 0).await,
            Err(EncounterError::NoTargets)
        ));

        let mut engine = arena(&[12, 4, 2], 20).await;
        assert!(matches!(
            engine.execute_action(0, 0, 0).await,
            Err(EncounterError::SelfTarget(name)) if name == "Aria"
        ));
        assert!(matches!(
            engine.execute_action(0, 5, 1).await,
            Err(EncounterError::ActionNotFound { index: 6, .. })
        ));
        assert!(matches!(
            engine.execute_action(0, 0, 7).await,
            Err(EncounterError::CombatantNotFound(7))
        ));
        assert!(matches!(
            engine.execute_action(4, 0, 1).await,
            Err(EncounterError::CombatantNotFound(4))
        ));
        assert!(engine.encounter().log().is_empty());
        assert_eq!(engine.encounter().combatants()[1].hp, 20);
    }

    #[tokio::test]
    async fn test_huge_action_index_is_rejected() {
        let mut engine = arena(&[12, 4, 2], 20).await;
        assert!(matches!(
            engine.execute_action(0, usize::MAX, 1).await,
            Err(EncounterError::ActionNotFound { index: usize::MAX, .. })
        ));
        assert!(engine.encounter().log().is_empty());
    }

    #[tokio::test]
    async fn test_extreme_attack_bonus_from_sheet() {
        let mut sheet: Entity = serde_json::from_value(serde_json::json!({
            "Name": "Aria",
            "Actions": [{"name": "Smite", "attack_bonus": "2147483647",
                         "damage": "1d6", "damage_type": "radiant"}]
        }))
        .unwrap();
        assert_eq!(sheet.actions[0].attack_bonus, i32::MAX);
        sheet.hp = 12;

        let mut engine = CombatEngine::new().with_roller(Loaded::new(&[12, 3]));
        engine.add_entity(&sheet, EntityKind::Character).await;
        engine.add_entity(&ogre(20), EntityKind::Npc).await;

        let report = engine.execute_action(0, 0, 1).await.unwrap();
        assert!(report.attack.hit);
        assert_eq!(report.attack.attack_total, i32::MAX);
        assert_eq!(engine.encounter().combatants()[1].hp, 17);
    }

    struct Echo;

    #[async_trait]
    impl Narrator for Echo {
        async fn narrate(&self, context: &NarrationContext) -> Result<String, NarrationError> {
            Ok(format!(
                " {} swings at {} ({}). ",
                context.attacker.name,
                context.target.name,
                context.damage_text()
            ))
        }
    }

    struct Broken;

    #[async_trait]
    impl Narrator for Broken {
        async fn narrate(&self, _: &NarrationContext) -> Result<String, NarrationError> {
            Err(NarrationError::EmptyResponse)
        }
    }

    struct Stalled;

    #[async_trait]
    impl Narrator for Stalled {
        async fn narrate(&self, _: &NarrationContext) -> Result<String, NarrationError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("too late".into())
        }
    }

    #[tokio::test]
    async fn test_narration_appended() {
        let mut engine = arena(&[12, 4, 2], 20)
            .await
            .with_narrator(Arc::new(Echo), Duration::from_secs(5));
        let report = engine.execute_action(0, 0, 1).await.unwrap();

        assert_eq!(report.events.len(), 4);
        assert_eq!(
            report.events[3],
            "DM: Aria swings at Ogre (4 bludgeoning damage)."
        );
    }

    #[tokio::test]
    async fn test_narration_on_miss() {
        let mut engine = arena(&[2], 20)
            .await
            .with_narrator(Arc::new(Echo), Duration::from_secs(5));
        let report = engine.execute_action(0, 1, 1).await.unwrap();
        assert_eq!(report.events[3], "DM: Aria swings at Ogre (no damage).");
    }

    #[tokio::test]
    async fn test_narration_failure_is_skip_notice() {
        let mut engine = arena(&[12, 4, 2], 20)
            .await
            .with_narrator(Arc::new(Broken), Duration::from_secs(5));
        let report = engine.execute_action(0, 0, 1).await.unwrap();

        assert_eq!(report.events[3], "[Narration skipped: empty response]");
        assert_eq!(engine.encounter().combatants()[1].hp, 16);
    }

    #[tokio::test]
    async fn test_narration_timeout_keeps_hp() {
        let mut engine = arena(&[12, 4, 2], 20)
            .await
            .with_narrator(Arc::new(Stalled), Duration::from_millis(50));
        let report = engine.execute_action(0, 0, 1).await.unwrap();

        assert!(report.events[3].starts_with("[Narration skipped: timed out after"));
        assert_eq!(engine.encounter().combatants()[1].hp, 16);
    }

    #[tokio::test]
    async fn test_autosave_after_action() {
        let dir = tempdir().unwrap();
        let campaign = CampaignFolder::new(dir.path());
        let mut engine = arena(&[12, 4, 2], 20)
            .await
            .with_campaign(campaign.clone())
            .with_narrator(Arc::new(Echo), Duration::from_secs(5));

        let report = engine.execute_action(0, 0, 1).await.unwrap();
        assert!(report.persisted);

        let stored = campaign.encounter_store().load().await.unwrap().unwrap();
        assert_eq!(stored.combatants()[1].hp, 16);
        assert_eq!(stored.log().len(), 4);
    }

    #[tokio::test]
    async fn test_failed_save_does_not_roll_back() {
        let dir = tempdir().unwrap();
        // A directory where the record file should be
        let mut engine = arena(&[12, 4, 2], 20)
            .await
            .with_encounter_store(EncounterStore::new(dir.path()));

        let report = engine.execute_action(0, 0, 1).await.unwrap();
        assert!(!report.persisted);
        assert_eq!(engine.encounter().combatants()[1].hp, 16);
        assert!(engine.save_state().await.is_err());
    }

    #[tokio::test]
    async fn test_no_campaign() {
        let mut engine = CombatEngine::new();
        assert!(matches!(engine.save_state().await, Err(EncounterError::NoCampaign)));
        assert!(matches!(engine.load_state().await, Err(EncounterError::NoCampaign)));
        assert!(matches!(
            engine.add_combatant(EntityKind::Npc, "Ogre").await,
            Err(EncounterError::NoCampaign)
        ));
    }

    #[tokio::test]
    async fn test_add_and_refresh_from_campaign() {
        let dir = tempdir().unwrap();
        let campaign = CampaignFolder::new(dir.path());
        campaign.save_entity(EntityKind::Character, &aria()).await.unwrap();

        let mut engine = CombatEngine::new().with_campaign(campaign.clone());
        let index = engine.add_combatant(EntityKind::Character, "Aria").await.unwrap();
        assert_eq!(index, 0);
        assert!(matches!(
            engine.add_combatant(EntityKind::Npc, "Aria").await,
            Err(EncounterError::EntityNotFound { kind: EntityKind::Npc, .. })
        ));

        // Edit the sheet after Aria joined
        let mut edited = aria();
        edited.actions = vec![action("Maul", 7, "2d6+4", "bludgeoning")];
        std::fs::write(
            dir.path().join("characters.json"),
            serde_json::to_string(&vec![edited]).unwrap(),
        )
        .unwrap();
        assert_eq!(engine.encounter().combatants()[0].actions.len(), 2);

        let line = engine.refresh_actions(0).await.unwrap();
        assert_eq!(line, "Actions for Aria refreshed from campaign data.");
        let actions = &engine.encounter().combatants()[0].actions;
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name, "Maul");
    }

    #[tokio::test]
    async fn test_remove_logs_and_clears_speaker() {
        let mut engine = arena(&[18, 6, 6], 5).await;
        engine.speak_as(1).unwrap();
        assert!(matches!(
            engine.remove_combatant(1).await,
            Err(EncounterError::StillStanding { hp: 5, .. })
        ));

        engine.execute_action(0, 0, 1).await.unwrap();
        let line = engine.remove_combatant(1).await.unwrap();
        assert_eq!(line, "Ogre has been removed from combat.");
        assert_eq!(engine.encounter().len(), 1);
        assert_eq!(engine.encounter().speaker(), None);
    }

    #[tokio::test]
    async fn test_chat() {
        let mut engine = arena(&[], 20).await;
        assert!(matches!(
            engine.say("Hello").await,
            Err(EncounterError::NoSpeaker)
        ));

        engine.speak_as(1).unwrap();
        assert_eq!(
            engine.say("  You dare?  ").await.unwrap().as_deref(),
            Some("Ogre said: You dare?")
        );
        assert_eq!(engine.say("   ").await.unwrap(), None);

        engine.speak_as_dm();
        assert_eq!(engine.encounter().speaker(), Some(&Speaker::Narrator));
        engine.say("The cave trembles.").await.unwrap();
        assert_eq!(
            engine.encounter().log(),
            &["Ogre said: You dare?", "Dungeon Master said: The cave trembles."]
        );
    }

    #[tokio::test]
    async fn test_initiative_and_reload() {
        let dir = tempdir().unwrap();
        let campaign = CampaignFolder::new(dir.path());
        let mut engine = arena(&[3, 17], 20).await.with_campaign(campaign.clone());
        engine.roll_initiative().await;
        assert_eq!(engine.encounter().combatants()[0].name, "Ogre");

        let (lines, sink) = captured();
        let mut reloaded = CombatEngine::new()
            .with_campaign(campaign)
            .with_sink(sink);
        reloaded.load_state().await.unwrap();
        assert_eq!(reloaded.encounter(), engine.encounter());
        assert!(lines.lock().unwrap().is_empty());
    }
}
