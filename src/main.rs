//! encounter - command-line front end
//!
//! Each invocation restores the campaign's encounter, performs one user
//! action, and saves it again.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use encounter::combat::{roll, roll_damage};
use encounter::{CombatEngine, Config, EntityKind};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "encounter", version, about = "Run a tabletop combat encounter")]
struct Cli {
    /// Config file (default: ./encounter.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Campaign folder, overriding the config
    #[arg(long, global = true)]
    campaign: Option<PathBuf>,

    /// Skip narration for this command
    #[arg(long, global = true)]
    no_narration: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List combatants and recent log lines
    Show {
        /// Number of log lines to print
        #[arg(short = 'n', long, default_value_t = 20)]
        lines: usize,
    },
    /// Add a character or NPC from the campaign
    Add {
        #[arg(value_enum)]
        kind: Kind,
        name: String,
    },
    /// Roll initiative for everyone and reorder
    Initiative,
    /// Use an action (name or number) against a target
    Act {
        attacker: String,
        action: String,
        target: String,
    },
    /// Remove a combatant at 0 HP
    Remove { name: String },
    /// Reload a combatant's actions from their sheet
    Refresh { name: String },
    /// Choose who chat lines come from ("dm" for the Dungeon Master)
    SpeakAs { name: String },
    /// Say something as the active speaker
    Say {
        #[arg(required = true)]
        message: Vec<String>,
    },
    /// Write the encounter to the campaign folder
    Save,
    /// Roll a dice formula such as 2d6+3
    Roll {
        formula: String,
        /// Roll as damage (never negative)
        #[arg(long)]
        damage: bool,
        /// Double the dice, as on a critical hit
        #[arg(long)]
        crit: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Character,
    Npc,
}

impl From<Kind> for EntityKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Character => EntityKind::Character,
            Kind::Npc => EntityKind::Npc,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        if !path.exists() {
            bail!("config file not found: {}", path.display());
        }
    }
    let mut config =
        Config::load(cli.config.as_deref()).map_err(|e| anyhow!("invalid configuration: {}", e))?;
    if let Some(dir) = cli.campaign {
        config.campaign_dir = Some(dir);
    }
    if cli.no_narration {
        config.narration.enabled = false;
    }

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Command::Roll {
        formula,
        damage,
        crit,
    } = &cli.command
    {
        let outcome = if *damage || *crit {
            roll_damage(formula, *crit)
        } else {
            roll(formula)
        };
        println!("{}", outcome.breakdown);
        return Ok(());
    }

    if config.campaign_dir.is_none() {
        bail!("no campaign folder: pass --campaign or set campaign_dir in the config");
    }

    // Restore quietly, then echo new log lines as they happen
    let mut engine = config.engine().with_sink(|_: &str| {});
    engine.load_state().await?;
    let mut engine = engine.with_sink(|line: &str| println!("{}", line));

    match cli.command {
        Command::Show { lines } => show(&engine, lines),
        Command::Add { kind, name } => {
            let index = engine.add_combatant(kind.into(), &name).await?;
            println!("Added {} at position {}", name, index + 1);
        }
        Command::Initiative => {
            engine.roll_initiative().await;
            show(&engine, 0);
        }
        Command::Act {
            attacker,
            action,
            target,
        } => {
            let attacker = find(&engine, &attacker)?;
            let target = find(&engine, &target)?;
            let combatant = engine.encounter().combatant(attacker)?;
            let action_index = combatant
                .find_action(&action)
                .with_context(|| format!("{} has no action '{}'", combatant.name, action))?;
            engine.execute_action(attacker, action_index, target).await?;
        }
        Command::Remove { name } => {
            let index = find(&engine, &name)?;
            engine.remove_combatant(index).await?;
        }
        Command::Refresh { name } => {
            let index = find(&engine, &name)?;
            engine.refresh_actions(index).await?;
        }
        Command::SpeakAs { name } => {
            if name.eq_ignore_ascii_case("dm") {
                engine.speak_as_dm();
            } else {
                engine.speak_as(find(&engine, &name)?)?;
            }
            engine.save_state().await?;
        }
        Command::Say { message } => {
            engine.say(&message.join(" ")).await?;
        }
        Command::Save => {
            engine.save_state().await?;
            println!("Encounter saved");
        }
        // Answered above without a campaign
        Command::Roll { .. } => {}
    }

    Ok(())
}

fn find(engine: &CombatEngine, name: &str) -> Result<usize> {
    engine
        .encounter()
        .find(name)
        .with_context(|| format!("no combatant named '{}'", name))
}

fn show(engine: &CombatEngine, log_lines: usize) {
    let encounter = engine.encounter();
    if encounter.is_empty() {
        println!("No combatants.");
    }

    for (i, c) in encounter.combatants().iter().enumerate() {
        let status = if c.is_fallen() { "  (fallen)" } else { "" };
        println!(
            "{:>2}. {:<20} {:<9} HP {:>3}  AC {:>2}  Init {:>2}{}",
            i + 1,
            c.name,
            c.kind.to_string(),
            c.hp,
            c.ac,
            c.initiative,
            status
        );
        for (n, action) in c.actions.iter().enumerate() {
            println!(
                "      {}) {} {:+} to hit, {} {}",
                n + 1,
                action.display_name(),
                action.attack_bonus,
                action.damage,
                action.damage_type
            );
        }
    }

    if let Some(speaker) = encounter.speaker_name() {
        println!("Speaking as: {}", speaker);
    }

    let log = encounter.log();
    if log_lines > 0 && !log.is_empty() {
        println!();
        for line in &log[log.len().saturating_sub(log_lines)..] {
            println!("{}", line);
        }
    }
}
