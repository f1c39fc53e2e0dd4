//! Arena Survival headless runner
//!
//! Drives the simulation without a renderer: the autopilot plays, upgrade
//! offers are auto-picked and the player respawns while lives remain.

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;

use arena_survival::Settings;
use arena_survival::sim::{GameState, Phase, RunOutcome, TickInput, TickResult, WeaponKind, autopick_upgrade, tick};

/// Run an arena-survival simulation headless
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// RNG seed (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum ticks to simulate
    #[arg(long, default_value_t = 36_000)]
    ticks: u64,

    /// Settings JSON file
    #[arg(long)]
    settings: Option<std::path::PathBuf>,

    /// Disable the autopilot; the player stands still
    #[arg(long)]
    manual: bool,

    /// Starting primary weapon (pistol, smg, shotgun, minigun, rocket, railgun)
    #[arg(long)]
    weapon: Option<String>,
}

/// End-of-run report printed to stdout
#[derive(Debug, Serialize)]
struct Summary {
    seed: u64,
    ticks: u64,
    time_ms: f32,
    wave: u32,
    score: u64,
    points: u64,
    high_score: u64,
    boss_encountered: bool,
    lives: u8,
    outcome: &'static str,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => Settings::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Settings::default(),
    };
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut state = GameState::new(seed, settings);

    if let Some(name) = &args.weapon {
        let Some(kind) = WeaponKind::from_str(name) else {
            bail!("unknown weapon '{name}'");
        };
        let stats = state.weapon_stats(kind);
        state.player.set_weapon(&stats);
    }

    log::info!("Arena Survival (headless) starting, seed {seed}");

    let input = TickInput {
        autopilot: !args.manual,
        ..TickInput::default()
    };
    let mut frozen = 0u64;
    for _ in 0..args.ticks {
        match tick(&mut state, &input) {
            TickResult::Suspended(Phase::ChoosingUpgrade) => {
                autopick_upgrade(&mut state);
            }
            TickResult::Suspended(Phase::Dead) => {
                state.respawn();
            }
            TickResult::Suspended(Phase::GameOver) => break,
            TickResult::HitStop => frozen += 1,
            _ => {}
        }
        for event in state.drain_events() {
            log::trace!("{event:?}");
        }
    }
    log::debug!("{frozen} hit-stop frames");

    let outcome = match state.outcome() {
        RunOutcome::Ongoing => "ongoing",
        RunOutcome::PlayerDead { .. } => "player-dead",
        RunOutcome::GameOver => "game-over",
    };
    let board = &state.scoreboard;
    log::info!(
        "Run finished ({outcome}): wave {}, {} kills, {} points",
        state.waves.wave,
        board.score,
        board.points
    );

    let summary = Summary {
        seed,
        ticks: state.ticks,
        time_ms: state.time_ms,
        wave: state.waves.wave,
        score: board.score,
        points: board.points,
        high_score: board.high_score,
        boss_encountered: board.boss_encountered,
        lives: state.player.lives,
        outcome,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
