//! Per-frame simulation tick
//!
//! Core game loop that advances the run deterministically. One call per
//! rendered frame; the stages run in a fixed order and any stage that
//! opens an upgrade offer or kills the player ends the tick once it is done.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::combat::{self, ExplosionSpec};
use super::effects::{self, palette};
use super::enemy::{AiContext, Enemy, EnemyAction, separate};
use super::events::GameEvent;
use super::ordnance::{Bullet, Grenade, Mine, Payload, TURRET_RANGE, Turret, TurretAction};
use super::pickups::{Collected, PickupKind, collect};
use super::player::FocusShift;
use super::progression::{dash_cooldown_ms, focus_regen_mult};
use super::state::{GameState, Phase};
use super::weapons::{SecondaryKind, WeaponKind, WeaponUpgrade, base_stats, resolve};
use crate::consts::*;
use crate::{angle_to, heading, normalize_angle, try_normalize};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Desired movement; normalized internally
    pub move_dir: Vec2,
    /// Aim angle (radians); `None` keeps the previous aim
    pub aim: Option<f32>,
    /// Primary fire held
    pub fire: bool,
    /// Secondary / grenade held
    pub secondary: bool,
    /// Dash (edge trigger)
    pub dash: bool,
    /// Activate focus (edge trigger)
    pub focus: bool,
    /// Pause toggle
    pub pause: bool,
    /// Demo mode - AI plays the game
    pub autopilot: bool,
}

/// Why a tick stopped before its last stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    UpgradeOffered,
    PlayerDied,
}

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickResult {
    /// Every stage ran
    Advanced,
    /// Nothing ran; the run is paused, choosing, dead or over
    Suspended(Phase),
    /// Frozen by hit-stop
    HitStop,
    /// Stages after the interrupting one were skipped
    StoppedEarly(StopReason),
}

/// Advance the game state by one frame
pub fn tick(state: &mut GameState, input: &TickInput) -> TickResult {
    if input.pause {
        state.toggle_pause();
    }
    if state.phase != Phase::Running {
        return TickResult::Suspended(state.phase);
    }

    if state.hit_stop > 0 {
        state.hit_stop -= 1;
        return TickResult::HitStop;
    }

    let input = if input.autopilot {
        autopilot(state, input)
    } else {
        input.clone()
    };
    let was_dead = state.player.dead;

    // Focus sets the pace for everything below
    if input.focus && state.player.activate_focus() {
        state.push_event(GameEvent::SlowMoStarted);
    }
    let regen = focus_regen_mult(&state.player);
    if state.player.update_focus(regen) == Some(FocusShift::Ended) {
        state.push_event(GameEvent::SlowMoEnded);
    }
    let dt = state.player.time_scale();
    let elapsed = FRAME_MS * dt;
    state.time_ms += elapsed;
    state.ticks += 1;
    let now = state.time_ms;

    state.screen_shake *= 0.9;
    if state.screen_shake < 0.01 {
        state.screen_shake = 0.0;
    }

    state.waves.ease_arena(dt);

    update_player(state, &input, dt, now, elapsed);
    if let Some(reason) = checkpoint(state, was_dead) {
        return TickResult::StoppedEarly(reason);
    }

    update_bullets(state, dt);
    if let Some(reason) = checkpoint(state, was_dead) {
        return TickResult::StoppedEarly(reason);
    }

    update_grenades(state, dt);
    update_mines(state, dt, elapsed);
    update_turrets(state, dt, elapsed);
    if let Some(reason) = checkpoint(state, was_dead) {
        return TickResult::StoppedEarly(reason);
    }

    update_spawns(state, elapsed);

    update_pickups(state, dt);
    if let Some(reason) = checkpoint(state, was_dead) {
        return TickResult::StoppedEarly(reason);
    }

    update_enemies(state, dt, elapsed);
    if let Some(reason) = checkpoint(state, was_dead) {
        return TickResult::StoppedEarly(reason);
    }

    separate(&mut state.enemies, dt);

    combat::resolve_projectile_hits(state);
    combat::resolve_contacts(state);
    if let Some(reason) = checkpoint(state, was_dead) {
        return TickResult::StoppedEarly(reason);
    }

    state.sweep();
    update_effects(state, dt);
    update_death_timer(state, dt);
    TickResult::Advanced
}

/// Stop after a stage that opened an offer or killed the player
fn checkpoint(state: &mut GameState, was_dead: bool) -> Option<StopReason> {
    let reason = if state.phase == Phase::ChoosingUpgrade {
        StopReason::UpgradeOffered
    } else if !was_dead && state.player.dead {
        StopReason::PlayerDied
    } else {
        return None;
    };
    state.sweep();
    Some(reason)
}

fn update_player(state: &mut GameState, input: &TickInput, dt: f32, now: f32, elapsed: f32) {
    if state.player.dead {
        return;
    }
    if let Some(aim) = input.aim.filter(|a| a.is_finite()) {
        state.player.aim = normalize_angle(aim);
    }

    let accel = if walking_tank(state) { 0.5 } else { 1.0 };
    let arena = state.waves.arena;
    state.player.integrate(input.move_dir, accel, dt, &arena);

    if input.dash {
        let cooldown = dash_cooldown_ms(&state.player);
        if state.player.try_dash(now, input.move_dir, cooldown) {
            state.push_event(GameEvent::Dash);
        }
    }

    fire_primary(state, input.fire, now, elapsed);
    if input.secondary {
        throw_secondary(state, now);
    }
}

fn walking_tank(state: &GameState) -> bool {
    state.player.firing
        && state.player.weapon == WeaponKind::Minigun
        && state.has_upgrade(WeaponUpgrade::MinigunWalkingTank)
}

fn fire_primary(state: &mut GameState, fire: bool, now: f32, elapsed: f32) {
    state.player.firing = fire;
    if !fire {
        state.player.windup_ms = 0.0;
        state.player.spin_ms = 0.0;
        return;
    }

    let stats = state.weapon_stats(state.player.weapon);
    let kind = stats.kind;
    let mut interval = stats.fire_interval_ms;

    if kind == WeaponKind::Minigun {
        let super_spin = state.has_upgrade(WeaponUpgrade::MinigunSuperSpin);
        let windup = if super_spin { 1000.0 } else { 500.0 };
        state.player.windup_ms += elapsed;
        if state.player.windup_ms < windup {
            return;
        }
        if super_spin {
            state.player.spin_ms += elapsed;
            interval /= 1.0 + 3.0 * (state.player.spin_ms / 5000.0).min(1.0);
        }
    }

    if kind == WeaponKind::Railgun && state.has_upgrade(WeaponUpgrade::RailgunHotBattery) {
        if let (Some(ammo), Some(max)) = (state.player.ammo, stats.max_carry) {
            let charge = if max > 1 {
                ammo.saturating_sub(1) as f32 / (max - 1) as f32
            } else {
                1.0
            };
            interval /= 1.01 + 1.79 * charge.clamp(0.0, 1.0);
        }
    }

    if !state.player.shot_ready(now, interval) {
        return;
    }
    if !state.player.consume_round() {
        fall_back_to_pistol(state);
        return;
    }
    state.player.last_shot_ms = Some(now);

    let aim = state.player.aim;
    let origin = state.player.muzzle();
    let spread = if kind == WeaponKind::Minigun {
        0.01 + state.player.vel.length() * 0.05
    } else {
        stats.spread
    };
    let pierce = combat::pierce_for(kind, state);

    let micro = kind == WeaponKind::Smg && state.has_upgrade(WeaponUpgrade::SmgMicroMunitions);
    if kind == WeaponKind::Smg {
        state.player.smg_shots += 1;
    }
    let micro_round = micro && state.player.smg_shots % 10 == 0;

    let rocket_payload = Payload {
        big: false,
        range_mult: stats.explosion_range_mult,
        shrapnel: state.has_upgrade(WeaponUpgrade::RocketShrapnel),
        cluster: state.has_upgrade(WeaponUpgrade::RocketClusterRockets),
    };
    let heavy = kind == WeaponKind::Smg && state.has_upgrade(WeaponUpgrade::SmgHeavyCaliber);
    let splinters = kind == WeaponKind::Minigun && state.has_upgrade(WeaponUpgrade::MinigunSplinterBullets);
    let tungsten = kind == WeaponKind::Railgun && state.has_upgrade(WeaponUpgrade::RailgunTungstenDart);
    let tesla = kind == WeaponKind::Railgun && state.has_upgrade(WeaponUpgrade::RailgunTeslaArc);

    for _ in 0..stats.pellets.max(1) {
        let angle = aim + (state.rng.random::<f32>() - 0.5) * spread;
        let speed = if kind == WeaponKind::Shotgun {
            stats.speed * (0.9 + state.rng.random::<f32>() * 0.2)
        } else {
            stats.speed
        };
        let id = state.next_entity_id();
        let mut bullet = Bullet::new(id, origin, angle, speed, stats.damage).credited(Some(kind));
        bullet.knockback_mult = stats.knockback_mult;
        bullet.pierce = pierce;
        bullet.splinters = splinters;
        bullet.tungsten = tungsten;
        bullet.tesla = tesla;
        if heavy {
            bullet.life *= 2.0;
        }
        if stats.explosive {
            bullet = bullet.explosive(rocket_payload);
        } else if micro_round {
            bullet = bullet.explosive(Payload {
                range_mult: 0.5,
                ..Payload::default()
            });
        }
        state.bullets.push(bullet);
    }

    if !walking_tank(state) {
        state.player.vel -= heading(aim) * stats.recoil;
    }
    state.shake(stats.recoil);
    state.noise = Some(state.player.pos);
    state.push_event(GameEvent::Shot { weapon: kind });
    effects::emit(&mut state.particles, &mut state.rng, origin, palette::SPARK, 4.0, 2);

    if state.player.ammo.is_some() {
        state.mark_hud();
    }
    if state.player.out_of_ammo() {
        fall_back_to_pistol(state);
    }
}

fn fall_back_to_pistol(state: &mut GameState) {
    log::debug!("{} ran dry", state.player.weapon.as_str());
    let pistol = state.weapon_stats(WeaponKind::Pistol);
    state.player.set_weapon(&pistol);
    state.mark_hud();
}

fn throw_secondary(state: &mut GameState, now: f32) {
    if !state.player.throw_ready(now) {
        return;
    }
    let (pos, aim) = (state.player.muzzle(), state.player.aim);
    let secondary = state.player.consume_secondary();
    let id = state.next_entity_id();
    match secondary {
        Some(SecondaryKind::Mine) => state.mines.push(Mine::new(id, state.player.pos)),
        Some(SecondaryKind::Turret) => state.turrets.push(Turret::new(id, pos, aim)),
        Some(SecondaryKind::Cluster) => state.grenades.push(Grenade::new(id, pos, aim, true)),
        None => {
            state.grenades.push(Grenade::new(id, pos, aim, false));
            state.player.vel -= heading(aim) * THROW_RECOIL;
        }
    }
    state.player.last_throw_ms = Some(now);
    state.push_event(GameEvent::Throw { secondary });
    state.mark_hud();
}

/// Position of the closest live enemy within `range`
fn nearest_enemy(enemies: &[Enemy], from: Vec2, range: f32) -> Option<Vec2> {
    enemies
        .iter()
        .filter(|e| e.is_active())
        .map(|e| (e.pos, e.pos.distance(from)))
        .filter(|(_, d)| *d < range)
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(pos, _)| pos)
}

fn update_bullets(state: &mut GameState, dt: f32) {
    let arena = state.waves.arena;
    for i in 0..state.bullets.len() {
        if state.bullets[i].spent {
            continue;
        }
        let target = if state.bullets[i].homing {
            nearest_enemy(&state.enemies, state.bullets[i].pos, f32::INFINITY)
        } else {
            None
        };
        let bullet = &mut state.bullets[i];
        bullet.update(dt, target);
        if bullet.life <= 0.0 || !arena.contains(bullet.pos) {
            combat::expire_bullet(state, i);
        }
    }
    combat::resolve_hostile_hits(state);
}

fn update_grenades(state: &mut GameState, dt: f32) {
    let mut live = Vec::with_capacity(state.grenades.len());
    let mut blasts = Vec::new();
    for mut grenade in std::mem::take(&mut state.grenades) {
        grenade.update(dt);
        let fused = grenade.life <= 0.0
            || state
                .enemies
                .iter()
                .any(|e| e.is_active() && grenade.touches(e.pos, e.radius));
        if fused {
            blasts.push(grenade);
        } else {
            live.push(grenade);
        }
    }
    state.grenades = live;

    for grenade in blasts {
        let spec = if grenade.cluster {
            ExplosionSpec::big()
        } else {
            ExplosionSpec::small()
        };
        combat::create_explosion(state, grenade.pos, &spec);
        if grenade.cluster {
            for k in 0..8 {
                let id = state.next_entity_id();
                let scatter = Grenade::new(id, grenade.pos, TAU / 8.0 * k as f32, false);
                state.grenades.push(scatter);
            }
        }
    }
}

fn update_mines(state: &mut GameState, dt: f32, elapsed: f32) {
    for mine in &mut state.mines {
        if mine.update(dt, elapsed) {
            log::debug!("Mine {} armed", mine.id);
        }
    }
    let enemies = &state.enemies;
    let mut triggered = Vec::new();
    state.mines.retain(|mine| {
        if enemies.iter().any(|e| e.is_active() && mine.triggered_by(e.pos)) {
            triggered.push(mine.pos);
            return false;
        }
        mine.life > 0.0
    });
    for pos in triggered {
        combat::create_explosion(state, pos, &ExplosionSpec::small());
    }
}

fn update_turrets(state: &mut GameState, dt: f32, elapsed: f32) {
    let smg = base_stats(WeaponKind::Smg);
    for i in 0..state.turrets.len() {
        let pos = state.turrets[i].pos;
        let target = nearest_enemy(&state.enemies, pos, TURRET_RANGE);
        match state.turrets[i].update(dt, elapsed, target, smg.fire_interval_ms) {
            TurretAction::Deployed => log::debug!("Turret {} deployed", state.turrets[i].id),
            TurretAction::Fire { angle } => {
                let angle = angle + (state.rng.random::<f32>() - 0.5) * smg.spread;
                let id = state.next_entity_id();
                let bullet = Bullet::new(id, pos + heading(angle) * 15.0, angle, smg.speed, smg.damage);
                state.bullets.push(bullet);
            }
            TurretAction::Idle => {}
        }
    }
    state.turrets.retain(|t| !t.expired());
}

fn update_spawns(state: &mut GameState, elapsed: f32) {
    let scale = state.settings.difficulty.spawn_scale();
    if state.waves.tick_spawn(elapsed, scale) {
        for kind in state.waves.roll_spawn(&mut state.rng) {
            state.spawn_enemy(kind);
        }
    }

    let nuke_in_play = state.pickups.iter().any(|p| p.kind == PickupKind::Nuke);
    if state.waves.nuke_due(state.time_ms, nuke_in_play, &mut state.rng) {
        state.spawn_nuke_pickup();
    }
}

fn update_pickups(state: &mut GameState, dt: f32) {
    for pickup in &mut state.pickups {
        pickup.update(dt);
    }
    state.pickups.retain(|p| !p.expired());
    if state.player.dead {
        return;
    }

    let player_pos = state.player.pos;
    let (touched, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut state.pickups)
        .into_iter()
        .partition(|p| p.touches(player_pos));
    state.pickups = rest;

    for pickup in touched {
        let bonus = state.player.ammo_bonus;
        let progression = &state.progression;
        let outcome = collect(&pickup, &mut state.player, |kind| {
            resolve(kind, progression.upgrades_for(kind), bonus)
        });
        state.push_event(GameEvent::PickupCollected { kind: pickup.kind });
        state.mark_hud();
        match outcome {
            Collected::Detonate(at) => combat::detonate_nuke(state, at),
            Collected::Applied if pickup.kind == PickupKind::Medikit => {
                effects::emit(&mut state.particles, &mut state.rng, player_pos, palette::HEAL, 3.0, 10);
            }
            Collected::Applied => {}
        }
    }
}

fn update_enemies(state: &mut GameState, dt: f32, elapsed: f32) {
    let ctx = AiContext {
        player_pos: state.player.pos,
        arena: state.waves.arena,
        noise: state.noise,
        dt,
        elapsed_ms: elapsed,
    };
    let mut actions = Vec::new();
    for i in 0..state.enemies.len() {
        if state.enemies[i].dead {
            continue;
        }
        actions.clear();
        state.enemies[i].think(&ctx, &mut state.rng, &mut actions);
        for &action in &actions {
            match action {
                EnemyAction::ChargeWindup => {
                    log::debug!("Boss {} winding up a charge", state.enemies[i].id);
                    state.push_event(GameEvent::BossCharge);
                }
                EnemyAction::ChargeSweep => combat::boss_charge_sweep(state, i, dt),
                EnemyAction::WallSlam { at } => combat::wall_slam(state, at),
                EnemyAction::DyingBlast { at } => {
                    combat::create_explosion(state, at, &ExplosionSpec::small());
                }
                EnemyAction::Finalize => {
                    if combat::finalize_boss(state, i) {
                        log::info!("Boss destroyed at wave {}", state.waves.wave);
                    }
                }
            }
        }
    }
}

fn update_effects(state: &mut GameState, dt: f32) {
    for p in &mut state.particles {
        p.update(dt);
    }
    state.particles.retain(|p| p.life > 0.0);
    for d in &mut state.debris {
        d.update(dt);
    }
    state.debris.retain(|d| d.life > 0.0);
    for f in &mut state.fragments {
        f.update(dt);
    }
}

fn update_death_timer(state: &mut GameState, dt: f32) {
    if !state.player.tick_death(dt) {
        return;
    }
    if state.player.lives > 0 {
        log::info!("Player down, {} lives left", state.player.lives);
        state.phase = Phase::Dead;
    } else {
        log::info!(
            "Game over at wave {}: {} kills, {} points",
            state.waves.wave,
            state.scoreboard.score,
            state.scoreboard.points
        );
        state.phase = Phase::GameOver;
        state.push_event(GameEvent::GameOver);
    }
    state.mark_hud();
}

/// Demo-mode input: aim at the closest threat, keep firing, back away from
/// anything too close and otherwise collect pickups
pub fn autopilot(state: &GameState, input: &TickInput) -> TickInput {
    let mut input = input.clone();
    let pos = state.player.pos;

    let threats: Vec<&Enemy> = state.enemies.iter().filter(|e| e.is_active()).collect();
    let nearest = threats.iter().min_by(|a, b| {
        a.pos
            .distance(pos)
            .partial_cmp(&b.pos.distance(pos))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut move_dir = Vec2::ZERO;
    if let Some(enemy) = nearest {
        input.aim = Some(angle_to(pos, enemy.pos));
        input.fire = true;
        let gap = enemy.pos.distance(pos) - enemy.radius;
        if gap < 200.0 {
            move_dir = pos - enemy.pos;
        }
        input.dash = gap < 40.0;
    }

    if move_dir == Vec2::ZERO {
        let pickup = state.pickups.iter().min_by(|a, b| {
            a.pos
                .distance(pos)
                .partial_cmp(&b.pos.distance(pos))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        move_dir = match pickup {
            Some(p) => p.pos - pos,
            None if pos.distance(state.waves.arena.center()) > 50.0 => state.waves.arena.center() - pos,
            None => Vec2::ZERO,
        };
    }
    input.move_dir = try_normalize(move_dir).unwrap_or(Vec2::ZERO);

    let crowd = threats.iter().filter(|e| e.pos.distance(pos) < 250.0).count();
    input.secondary = crowd >= 4;
    input.focus = crowd >= 8;
    input
}

/// Demo-mode upgrade pick: first weapon choice, then first universal choice.
/// Returns true if anything was picked.
pub fn autopick_upgrade(state: &mut GameState) -> bool {
    let Some(offer) = state.progression.offer.clone() else {
        return false;
    };
    let mut picked = false;
    if offer.weapon_pick.is_none() {
        if let Some(&upgrade) = offer.weapon_choices.first() {
            picked |= state.choose_weapon_upgrade(upgrade);
        }
    }
    if offer.universal_pick.is_none() {
        if let Some(&upgrade) = offer.universal_choices.first() {
            picked |= state.choose_universal_upgrade(upgrade);
        }
    }
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;
    use crate::sim::enemy::EnemyKind;
    use crate::sim::pickups::Pickup;
    use std::f32::consts::PI;

    fn state() -> GameState {
        GameState::new(42, Settings::default())
    }

    fn place(state: &mut GameState, kind: EnemyKind, pos: Vec2) -> usize {
        let id = state.next_entity_id();
        let enemy = Enemy::new(id, kind, pos, 1, &mut state.rng);
        state.enemies.push(enemy);
        state.enemies.len() - 1
    }

    fn count(events: &[GameEvent], pred: impl Fn(&GameEvent) -> bool) -> usize {
        events.iter().filter(|e| pred(e)).count()
    }

    #[test]
    fn test_clock_advances_one_frame() {
        let mut s = state();
        assert_eq!(tick(&mut s, &TickInput::default()), TickResult::Advanced);
        assert_eq!(s.time_ms, FRAME_MS);
        assert_eq!(s.ticks, 1);
    }

    #[test]
    fn test_pause_suspends_everything() {
        let mut s = state();
        let pause = TickInput {
            pause: true,
            ..TickInput::default()
        };
        assert_eq!(tick(&mut s, &pause), TickResult::Suspended(Phase::Paused));
        assert_eq!(tick(&mut s, &TickInput::default()), TickResult::Suspended(Phase::Paused));
        assert_eq!(s.time_ms, 0.0);
        assert_eq!(tick(&mut s, &pause), TickResult::Advanced);
    }

    #[test]
    fn test_choosing_upgrade_freezes_actors() {
        let mut s = state();
        let z = place(&mut s, EnemyKind::Zombie, Vec2::new(1200.0, 1200.0));
        s.phase = Phase::ChoosingUpgrade;
        let before = s.enemies[z].pos;
        for _ in 0..10 {
            assert_eq!(
                tick(&mut s, &TickInput::default()),
                TickResult::Suspended(Phase::ChoosingUpgrade)
            );
        }
        assert_eq!(s.enemies[z].pos, before);
    }

    #[test]
    fn test_hit_stop_counts_whole_ticks() {
        let mut s = state();
        s.hit_stop = HIT_STOP_TICKS;
        assert_eq!(tick(&mut s, &TickInput::default()), TickResult::HitStop);
        assert_eq!(tick(&mut s, &TickInput::default()), TickResult::HitStop);
        assert_eq!(s.time_ms, 0.0);
        assert_eq!(tick(&mut s, &TickInput::default()), TickResult::Advanced);
    }

    #[test]
    fn test_focus_slows_clock() {
        let mut s = state();
        let focus = TickInput {
            focus: true,
            ..TickInput::default()
        };
        tick(&mut s, &focus);
        assert!(s.player.slow_mo);
        assert!((s.time_ms - FRAME_MS * SLOW_MO_FACTOR).abs() < 1e-4);
        assert!(s.drain_events().contains(&GameEvent::SlowMoStarted));
    }

    #[test]
    fn test_pistol_fires_once_per_interval() {
        let mut s = state();
        let fire = TickInput {
            fire: true,
            aim: Some(0.0),
            ..TickInput::default()
        };
        tick(&mut s, &fire);
        tick(&mut s, &fire);
        assert_eq!(s.bullets.len(), 1);
        assert_eq!(s.bullets[0].weapon, Some(WeaponKind::Pistol));
        let shots = count(&s.drain_events(), |e| matches!(e, GameEvent::Shot { .. }));
        assert_eq!(shots, 1);
        assert!(s.noise.is_some());
    }

    #[test]
    fn test_empty_weapon_falls_back_to_pistol() {
        let mut s = state();
        let smg = s.weapon_stats(WeaponKind::Smg);
        s.player.set_weapon(&smg);
        s.player.ammo = Some(1);
        let fire = TickInput {
            fire: true,
            ..TickInput::default()
        };
        tick(&mut s, &fire);
        assert_eq!(s.player.weapon, WeaponKind::Pistol);
        assert_eq!(s.player.ammo, None);
        assert_eq!(s.bullets.len(), 1);
    }

    #[test]
    fn test_minigun_needs_windup() {
        let mut s = state();
        let minigun = s.weapon_stats(WeaponKind::Minigun);
        s.player.set_weapon(&minigun);
        let fire = TickInput {
            fire: true,
            ..TickInput::default()
        };
        for _ in 0..29 {
            tick(&mut s, &fire);
        }
        assert!(s.bullets.is_empty());
        for _ in 0..3 {
            tick(&mut s, &fire);
        }
        assert!(!s.bullets.is_empty());
    }

    #[test]
    fn test_grenade_cooldown() {
        let mut s = state();
        let throw = TickInput {
            secondary: true,
            ..TickInput::default()
        };
        tick(&mut s, &throw);
        tick(&mut s, &throw);
        assert_eq!(s.grenades.len(), 1);
        let throws = count(&s.drain_events(), |e| matches!(e, GameEvent::Throw { secondary: None }));
        assert_eq!(throws, 1);
    }

    #[test]
    fn test_secondary_consumed_before_grenade() {
        let mut s = state();
        s.player.set_secondary(SecondaryKind::Mine);
        let throw = TickInput {
            secondary: true,
            ..TickInput::default()
        };
        tick(&mut s, &throw);
        assert_eq!(s.mines.len(), 1);
        assert!(s.grenades.is_empty());
        assert_eq!(s.player.secondary_ammo, SecondaryKind::Mine.ammo() - 1);
    }

    #[test]
    fn test_armed_mine_explodes_under_enemy() {
        let mut s = state();
        let mut mine = Mine::new(500, Vec2::new(1200.0, 1200.0));
        mine.arm_ms = 0.0;
        s.mines.push(mine);
        place(&mut s, EnemyKind::Zombie, Vec2::new(1210.0, 1200.0));
        tick(&mut s, &TickInput::default());
        assert!(s.mines.is_empty());
        assert!(s.enemies.is_empty());
        assert_eq!(s.scoreboard.score, 1);
        assert!(s.drain_events().iter().any(|e| matches!(e, GameEvent::Explosion { .. })));
    }

    #[test]
    fn test_medikit_heals() {
        let mut s = state();
        s.player.health = 50.0;
        let pos = s.player.pos;
        s.pickups.push(Pickup::new(900, PickupKind::Medikit, pos));
        tick(&mut s, &TickInput::default());
        assert_eq!(s.player.health, 50.0 + MEDIKIT_HEAL);
        assert!(s.pickups.is_empty());
    }

    #[test]
    fn test_contact_death_stops_tick_then_dead_phase() {
        let mut s = state();
        s.player.health = 5.0;
        let pos = s.player.pos;
        place(&mut s, EnemyKind::Zombie, pos);
        assert_eq!(
            tick(&mut s, &TickInput::default()),
            TickResult::StoppedEarly(StopReason::PlayerDied)
        );
        assert_eq!(s.player.lives, START_LIVES - 1);
        let mut ticks = 0;
        while s.phase == Phase::Running && ticks < 500 {
            tick(&mut s, &TickInput::default());
            ticks += 1;
        }
        assert_eq!(s.phase, Phase::Dead);
        assert_eq!(tick(&mut s, &TickInput::default()), TickResult::Suspended(Phase::Dead));
        assert!(s.respawn());
        assert_eq!(s.phase, Phase::Running);
    }

    #[test]
    fn test_last_life_ends_run() {
        let mut s = state();
        s.player.lives = 1;
        s.player.health = 1.0;
        let pos = s.player.pos;
        place(&mut s, EnemyKind::Zombie, pos);
        for _ in 0..500 {
            if tick(&mut s, &TickInput::default()) == TickResult::Suspended(Phase::GameOver) {
                break;
            }
        }
        assert_eq!(s.phase, Phase::GameOver);
        assert!(s.drain_events().contains(&GameEvent::GameOver));
        assert!(!s.respawn());
    }

    #[test]
    fn test_dying_boss_finalizes_once() {
        let mut s = state();
        s.settings.god_mode = true;
        let b = place(&mut s, EnemyKind::Boss, Vec2::new(1500.0, 1150.0));
        s.enemies[b].begin_dying();

        let mut nukes = 0;
        for _ in 0..400 {
            tick(&mut s, &TickInput::default());
            nukes += count(&s.drain_events(), |e| matches!(e, GameEvent::Nuke { .. }));
        }
        assert_eq!(nukes, 1);
        assert!(s.enemies.iter().all(|e| !e.is_boss()));
        assert_eq!(s.fragments.len(), BOSS_FRAGMENT_COUNT);
        assert!(s.scoreboard.points >= 500);
    }

    #[test]
    fn test_nuke_pickup_detonates() {
        let mut s = state();
        let pos = s.player.pos;
        s.pickups.push(Pickup::new(900, PickupKind::Nuke, pos));
        place(&mut s, EnemyKind::Tank, pos + Vec2::new(300.0, 0.0));
        tick(&mut s, &TickInput::default());
        assert!(s.enemies.is_empty());
        assert_eq!(s.scoreboard.score, 1);
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = |seed: u64| {
            let mut s = GameState::new(seed, Settings::default());
            let input = TickInput {
                autopilot: true,
                ..TickInput::default()
            };
            for _ in 0..1500 {
                autopick_upgrade(&mut s);
                if s.phase == Phase::Dead {
                    s.respawn();
                }
                tick(&mut s, &input);
            }
            (s.scoreboard.score, s.time_ms, s.player.pos, s.enemies.len(), s.waves.wave)
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn test_autopilot_aims_at_nearest() {
        let mut s = state();
        let pos = s.player.pos;
        place(&mut s, EnemyKind::Zombie, pos + Vec2::new(0.0, 400.0));
        place(&mut s, EnemyKind::Zombie, pos + Vec2::new(300.0, 0.0));
        let input = autopilot(&s, &TickInput::default());
        assert!(input.fire);
        assert!(input.aim.unwrap().abs() < 1e-5);
    }

    #[test]
    fn test_huge_finite_aim_is_wrapped() {
        let mut s = state();
        let aim = 1.0e9f32;
        let pos = s.player.pos + heading(normalize_angle(aim)) * 40.0;
        let t = place(&mut s, EnemyKind::Tank, pos);
        let fire = TickInput {
            fire: true,
            aim: Some(aim),
            ..TickInput::default()
        };
        for _ in 0..3 {
            tick(&mut s, &fire);
        }
        assert!((-PI..PI).contains(&s.player.aim));
        assert!(s.bullets.iter().all(|b| b.angle.abs() < PI + 0.1));
        assert!(s.enemies[t].hp < s.enemies[t].max_hp);
    }
}
