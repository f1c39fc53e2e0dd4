//! Game state and the host-facing surface around it
//!
//! Everything the tick mutates lives in `GameState`. Hosts read it through
//! `snapshot`, drain `GameEvent`s, and drive the pause/upgrade/respawn
//! transitions through the methods here.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effects::{Debris, Fragment, Particle};
use super::enemy::{Enemy, EnemyKind};
use super::events::GameEvent;
use super::ordnance::{Bullet, Grenade, Mine, Turret};
use super::pickups::Pickup;
use super::player::Player;
use super::progression::{Progression, UniversalUpgrade, UpgradeOffer};
use super::waves::WaveState;
use super::weapons::{WeaponKind, WeaponStats, WeaponUpgrade, resolve};
use crate::consts::*;
use crate::{Scoreboard, Settings};

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Active gameplay
    Running,
    /// Paused by the player
    Paused,
    /// Waiting on an upgrade pick; the tick is suspended
    ChoosingUpgrade,
    /// Death screen with lives left; waiting for `respawn`
    Dead,
    /// No lives left
    GameOver,
}

/// How the run stands, as reported to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Ongoing,
    PlayerDead { lives_remaining: u8 },
    GameOver,
}

fn seeded_rng() -> Pcg32 {
    Pcg32::seed_from_u64(0)
}

/// Complete simulation state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    #[serde(skip, default = "seeded_rng")]
    pub rng: Pcg32,
    pub settings: Settings,
    pub phase: Phase,
    /// Game clock (ms), slowed by focus
    pub time_ms: f32,
    /// Ticks advanced (excludes suspended and hit-stop ticks)
    pub ticks: u64,
    /// Ticks left to freeze after an impactful kill
    pub hit_stop: u32,
    pub screen_shake: f32,

    pub player: Player,
    pub waves: WaveState,
    pub progression: Progression,
    pub scoreboard: Scoreboard,

    /// Enemies in spawn order
    pub enemies: Vec<Enemy>,
    pub bullets: Vec<Bullet>,
    pub grenades: Vec<Grenade>,
    pub mines: Vec<Mine>,
    pub turrets: Vec<Turret>,
    pub pickups: Vec<Pickup>,
    /// Where blind enemies are headed
    pub noise: Option<Vec2>,

    /// Visual effects (not gameplay-affecting)
    #[serde(skip)]
    pub particles: Vec<Particle>,
    #[serde(skip)]
    pub debris: Vec<Debris>,
    #[serde(skip)]
    pub fragments: Vec<Fragment>,

    #[serde(skip)]
    events: Vec<GameEvent>,
    #[serde(skip)]
    hud_dirty: bool,
    /// Next entity ID
    next_id: u32,
}

/// Read-only view handed to renderers
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub phase: Phase,
    pub outcome: RunOutcome,
    pub time_ms: f32,
    pub wave: u32,
    pub arena: crate::Rect,
    pub player: &'a Player,
    pub enemies: &'a [Enemy],
    pub bullets: &'a [Bullet],
    pub grenades: &'a [Grenade],
    pub mines: &'a [Mine],
    pub turrets: &'a [Turret],
    pub pickups: &'a [Pickup],
    pub particles: &'a [Particle],
    pub debris: &'a [Debris],
    pub fragments: &'a [Fragment],
    pub scoreboard: &'a Scoreboard,
    pub offer: Option<&'a UpgradeOffer>,
    pub screen_shake: f32,
}

impl GameState {
    /// Create a new run with the given seed
    pub fn new(seed: u64, settings: Settings) -> Self {
        let waves = WaveState::new();
        let player = Player::new(waves.arena.center(), settings.difficulty.starting_lives());
        log::info!(
            "New run: seed {seed}, difficulty {}, {} lives",
            settings.difficulty.as_str(),
            player.lives
        );
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            scoreboard: Scoreboard::new(settings.high_score),
            settings,
            phase: Phase::Running,
            time_ms: 0.0,
            ticks: 0,
            hit_stop: 0,
            screen_shake: 0.0,
            player,
            waves,
            progression: Progression::new(),
            enemies: Vec::new(),
            bullets: Vec::new(),
            grenades: Vec::new(),
            mines: Vec::new(),
            turrets: Vec::new(),
            pickups: Vec::new(),
            noise: None,
            particles: Vec::new(),
            debris: Vec::new(),
            fragments: Vec::new(),
            events: Vec::new(),
            hud_dirty: true,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every event queued since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Flag a HUD-relevant change
    pub fn mark_hud(&mut self) {
        self.hud_dirty = true;
    }

    /// True once per batch of HUD-relevant changes
    pub fn take_hud_refresh(&mut self) -> bool {
        std::mem::replace(&mut self.hud_dirty, false)
    }

    pub fn shake(&mut self, amount: f32) {
        self.screen_shake = self.screen_shake.max(amount);
    }

    /// Effective stats for `kind` with its upgrades and the ammo bonus
    pub fn weapon_stats(&self, kind: WeaponKind) -> WeaponStats {
        resolve(kind, self.progression.upgrades_for(kind), self.player.ammo_bonus)
    }

    pub fn has_upgrade(&self, upgrade: WeaponUpgrade) -> bool {
        self.progression.has(upgrade)
    }

    pub fn outcome(&self) -> RunOutcome {
        match self.phase {
            Phase::GameOver => RunOutcome::GameOver,
            Phase::Dead => RunOutcome::PlayerDead {
                lives_remaining: self.player.lives,
            },
            _ => RunOutcome::Ongoing,
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            phase: self.phase,
            outcome: self.outcome(),
            time_ms: self.time_ms,
            wave: self.waves.wave,
            arena: self.waves.arena,
            player: &self.player,
            enemies: &self.enemies,
            bullets: &self.bullets,
            grenades: &self.grenades,
            mines: &self.mines,
            turrets: &self.turrets,
            pickups: &self.pickups,
            particles: &self.particles,
            debris: &self.debris,
            fragments: &self.fragments,
            scoreboard: &self.scoreboard,
            offer: self.progression.offer.as_ref(),
            screen_shake: self.screen_shake,
        }
    }

    /// Spawn one enemy of `kind` at the arena edge
    pub fn spawn_enemy(&mut self, kind: EnemyKind) {
        let id = self.next_entity_id();
        let enemy = Enemy::spawn(id, kind, &self.waves.arena, self.waves.wave, &mut self.rng);
        if kind == EnemyKind::Boss {
            self.scoreboard.boss_encountered = true;
            log::info!("Boss spawned at wave {}", self.waves.wave);
        }
        self.enemies.push(enemy);
        self.push_event(GameEvent::EnemySpawned { kind });
    }

    /// Drop a nuke pickup into play
    pub fn spawn_nuke_pickup(&mut self) {
        let id = self.next_entity_id();
        let nuke = Pickup::nuke(id, &self.waves.arena, &mut self.rng);
        log::info!("Nuke pickup inbound");
        self.pickups.push(nuke);
    }

    /// Open an upgrade offer for `weapon` if one is due
    pub fn offer_upgrade_if_due(&mut self, weapon: WeaponKind) -> bool {
        if !self.progression.try_offer(weapon, &self.player.universal, &mut self.rng) {
            return false;
        }
        self.enter_upgrade_choice(weapon);
        true
    }

    fn enter_upgrade_choice(&mut self, weapon: WeaponKind) {
        self.phase = Phase::ChoosingUpgrade;
        self.push_event(GameEvent::UpgradeOffered { weapon });
        self.mark_hud();
    }

    /// Pick a weapon upgrade from the open offer
    pub fn choose_weapon_upgrade(&mut self, upgrade: WeaponUpgrade) -> bool {
        if self.phase != Phase::ChoosingUpgrade || !self.progression.choose_weapon(upgrade) {
            return false;
        }
        log::info!("Weapon upgrade taken: {}", upgrade.name());
        self.push_event(GameEvent::WeaponUpgradeApplied { upgrade });
        self.finish_offer_if_complete();
        true
    }

    /// Pick a universal upgrade from the open offer
    pub fn choose_universal_upgrade(&mut self, upgrade: UniversalUpgrade) -> bool {
        if self.phase != Phase::ChoosingUpgrade
            || !self.progression.choose_universal(upgrade, &mut self.player)
        {
            return false;
        }
        log::info!("Universal upgrade taken: {}", upgrade.name());
        self.push_event(GameEvent::UniversalUpgradeApplied { upgrade });
        self.finish_offer_if_complete();
        true
    }

    fn finish_offer_if_complete(&mut self) {
        self.mark_hud();
        if self.progression.take_completed().is_none() {
            return;
        }
        self.phase = Phase::Running;
        // A second weapon may have crossed its threshold meanwhile
        if let Some(weapon) = self.progression.check_pending(&self.player.universal, &mut self.rng) {
            self.enter_upgrade_choice(weapon);
        }
    }

    /// Toggle pause; only between Running and Paused
    pub fn toggle_pause(&mut self) -> bool {
        match self.phase {
            Phase::Running => self.phase = Phase::Paused,
            Phase::Paused => self.phase = Phase::Running,
            _ => return false,
        }
        true
    }

    /// Bring the player back after a death with lives left
    pub fn respawn(&mut self) -> bool {
        if self.phase != Phase::Dead {
            return false;
        }
        let center = self.waves.arena.center();
        self.player.revive(center);
        self.bullets.retain(|b| !b.hostile);
        // Clear a safe zone without crediting the removals
        for e in &mut self.enemies {
            if !e.is_boss() && e.pos.distance(center) < RESPAWN_CLEAR_RADIUS {
                e.dead = true;
            }
        }
        self.enemies.retain(|e| !e.dead);
        self.phase = Phase::Running;
        self.push_event(GameEvent::Respawned);
        self.mark_hud();
        log::info!("Respawned with {} lives at wave {}", self.player.lives, self.waves.wave);
        true
    }

    /// Drop entities flagged for removal this tick
    pub fn sweep(&mut self) {
        self.enemies.retain(|e| !e.dead);
        self.bullets.retain(|b| !b.spent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Difficulty;

    #[test]
    fn test_new_state_defaults() {
        let state = GameState::new(1, Settings::default());
        assert_eq!(state.phase, Phase::Running);
        assert_eq!(state.waves.wave, 1);
        assert_eq!(state.player.lives, START_LIVES);
        assert_eq!(state.player.pos, Vec2::splat(WORLD_SIZE / 2.0));
        assert_eq!(state.outcome(), RunOutcome::Ongoing);
    }

    #[test]
    fn test_difficulty_sets_lives() {
        let settings = Settings {
            difficulty: Difficulty::Easy,
            ..Settings::default()
        };
        assert_eq!(GameState::new(1, settings).player.lives, 5);
    }

    #[test]
    fn test_hud_refresh_taken_once() {
        let mut state = GameState::new(1, Settings::default());
        assert!(state.take_hud_refresh());
        assert!(!state.take_hud_refresh());
        state.mark_hud();
        assert!(state.take_hud_refresh());
    }

    #[test]
    fn test_respawn_only_from_dead() {
        let mut state = GameState::new(1, Settings::default());
        assert!(!state.respawn());

        state.spawn_enemy(EnemyKind::Zombie);
        state.enemies[0].pos = state.waves.arena.center() + Vec2::new(50.0, 0.0);
        state.spawn_enemy(EnemyKind::Boss);
        let boss_pos = state.waves.arena.center() + Vec2::new(0.0, 100.0);
        state.enemies[1].pos = boss_pos;
        let mut hostile = Bullet::new(99, Vec2::ZERO, 0.0, 6.0, 5.0);
        hostile.hostile = true;
        state.bullets.push(hostile);

        state.player.die();
        state.phase = Phase::Dead;
        let score_before = state.scoreboard.score;
        assert!(state.respawn());
        assert_eq!(state.phase, Phase::Running);
        assert!(state.bullets.is_empty());
        assert_eq!(state.enemies.len(), 1);
        assert!(state.enemies[0].is_boss());
        assert_eq!(state.scoreboard.score, score_before);
        assert_eq!(state.player.health, state.player.max_health);
        assert!(state.drain_events().contains(&GameEvent::Respawned));
    }

    #[test]
    fn test_pause_toggle() {
        let mut state = GameState::new(1, Settings::default());
        assert!(state.toggle_pause());
        assert_eq!(state.phase, Phase::Paused);
        assert!(state.toggle_pause());
        assert_eq!(state.phase, Phase::Running);
        state.phase = Phase::GameOver;
        assert!(!state.toggle_pause());
    }

    #[test]
    fn test_upgrade_choice_resumes_run() {
        let mut state = GameState::new(3, Settings::default());
        state.progression.weapons.get_mut(&WeaponKind::Smg).unwrap().xp = 30;
        assert!(state.offer_upgrade_if_due(WeaponKind::Smg));
        assert_eq!(state.phase, Phase::ChoosingUpgrade);

        let offer = state.progression.offer.clone().unwrap();
        assert!(state.choose_weapon_upgrade(offer.weapon_choices[0]));
        assert_eq!(state.phase, Phase::ChoosingUpgrade);
        assert!(state.choose_universal_upgrade(offer.universal_choices[0]));
        assert_eq!(state.phase, Phase::Running);
        assert!(!state.choose_weapon_upgrade(offer.weapon_choices[1]));
    }
}
