//! Combat resolution: projectile hits, contact damage, explosions, kills
//!
//! Enemies are never removed during a pass. Killing one sets `dead`, which
//! every loop checks, and the tick sweeps them afterwards. That flag is the
//! guard that keeps a kill from being credited twice.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::Rng;

use super::effects::{self, Debris, Fragment, palette};
use super::enemy::{Behavior, EnemyKind};
use super::events::GameEvent;
use super::ordnance::{Bullet, Payload};
use super::pickups::{Pickup, roll_drop};
use super::state::GameState;
use super::weapons::{Pierce, WeaponKind, WeaponUpgrade};
use crate::consts::*;
use crate::{angle_to, heading, normalize_angle, try_normalize};

/// Tesla stun reach around the struck enemy
pub const TESLA_RADIUS: f32 = 150.0;
pub const TESLA_STUN_FRAMES: f32 = 180.0;

/// Charge sweep reach beyond the two radii
const CHARGE_SWEEP_PAD: f32 = 20.0;

/// Parameters for one explosion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplosionSpec {
    pub big: bool,
    pub range_mult: f32,
    pub shrapnel: bool,
    pub cluster: bool,
    /// Direction cluster rockets fly
    pub heading: f32,
    /// Weapon credited for kills
    pub credit: Option<WeaponKind>,
}

impl ExplosionSpec {
    pub fn small() -> Self {
        Self {
            big: false,
            range_mult: 1.0,
            shrapnel: false,
            cluster: false,
            heading: 0.0,
            credit: None,
        }
    }

    pub fn big() -> Self {
        Self {
            big: true,
            ..Self::small()
        }
    }

    /// Explosion carried by a bullet's payload
    pub fn from_payload(payload: &Payload, heading: f32, credit: Option<WeaponKind>) -> Self {
        Self {
            big: payload.big,
            range_mult: payload.range_mult,
            shrapnel: payload.shrapnel,
            cluster: payload.cluster,
            heading,
            credit,
        }
    }

    pub fn radius(&self) -> f32 {
        let base = if self.big { BIG_EXPLOSION_RADIUS } else { EXPLOSION_RADIUS };
        base * self.range_mult
    }

    pub fn max_damage(&self) -> f32 {
        if self.big { BIG_EXPLOSION_DAMAGE } else { EXPLOSION_DAMAGE }
    }
}

/// Linear falloff: 1 at the center, 0 at and beyond `radius`
pub fn explosion_falloff(distance: f32, radius: f32) -> f32 {
    if !distance.is_finite() || !radius.is_finite() || radius <= 0.0 || distance >= radius {
        return 0.0;
    }
    1.0 - distance.max(0.0) / radius
}

/// Subtract `amount` from an enemy; non-positive or non-finite amounts are ignored.
/// Any damage provokes a tank.
pub fn damage_enemy(state: &mut GameState, idx: usize, amount: f32) {
    let Some(enemy) = state.enemies.get_mut(idx) else {
        return;
    };
    if !enemy.is_active() || !amount.is_finite() || amount <= 0.0 {
        return;
    }
    enemy.hp -= amount;
    enemy.provoke();
}

/// Resolve an enemy whose hp may have dropped to zero. Bosses start dying;
/// anything else is killed. Returns true if a kill happened.
pub fn settle_enemy(state: &mut GameState, idx: usize, credit: Option<WeaponKind>) -> bool {
    let Some(enemy) = state.enemies.get_mut(idx) else {
        return false;
    };
    if !enemy.is_active() || enemy.hp > 0.0 {
        return false;
    }
    if enemy.is_boss() {
        if enemy.begin_dying() {
            let pos = enemy.pos;
            log::info!("Boss {} is dying", enemy.id);
            state.push_event(GameEvent::BossDying { pos });
        }
        return false;
    }
    kill_enemy(state, idx, credit)
}

/// Credit a kill: score, wave progress, drops, gibs and weapon XP.
/// Already-dead enemies are ignored.
pub fn kill_enemy(state: &mut GameState, idx: usize, credit: Option<WeaponKind>) -> bool {
    let Some(enemy) = state.enemies.get_mut(idx) else {
        return false;
    };
    if enemy.dead {
        return false;
    }
    enemy.dead = true;
    let (kind, pos) = (enemy.kind(), enemy.pos);

    if state.scoreboard.record_kill(kind.points()) {
        let score = state.scoreboard.score;
        state.push_event(GameEvent::HighScore { score });
    }
    state.push_event(GameEvent::EnemyKilled { kind, pos, weapon: credit });
    state.mark_hud();

    if let Some(wave) = state.waves.record_kill() {
        on_wave_advanced(state, wave);
    }

    let held = state.player.weapon;
    if let Some(drop) = roll_drop(&mut state.rng, kind, state.waves.wave, held) {
        let id = state.next_entity_id();
        state.pickups.push(Pickup::new(id, drop, pos));
    }

    for _ in 0..kind.debris_count() {
        let gib = Debris::new(&mut state.rng, pos, kind.color());
        state.debris.push(gib);
    }

    if let Some(weapon) = credit {
        if state.progression.credit_kill(weapon) && state.progression.offer.is_none() {
            state.offer_upgrade_if_due(weapon);
        }
    }
    true
}

fn on_wave_advanced(state: &mut GameState, wave: u32) {
    state.push_event(GameEvent::WaveAdvanced { wave });
    for (kind, count) in super::waves::WaveState::batch_for(wave) {
        for _ in 0..count {
            state.spawn_enemy(kind);
        }
    }
}

/// Area damage with linear falloff and outward knockback
pub fn create_explosion(state: &mut GameState, origin: Vec2, spec: &ExplosionSpec) {
    let radius = spec.radius();
    let max_damage = spec.max_damage();
    state.shake(if spec.big { 40.0 } else { 20.0 });
    let (count, speed) = if spec.big { (60, 15.0) } else { (30, 10.0) };
    effects::emit(&mut state.particles, &mut state.rng, origin, palette::FIRE, speed, count);
    state.push_event(GameEvent::Explosion { pos: origin, big: spec.big });

    for i in 0..state.enemies.len() {
        let enemy = &mut state.enemies[i];
        if !enemy.is_active() {
            continue;
        }
        let falloff = explosion_falloff(enemy.pos.distance(origin), radius);
        if falloff <= 0.0 {
            continue;
        }
        let force_mult = if enemy.is_boss() { BOSS_KNOCKBACK_FRACTION } else { 1.0 };
        let force = falloff * EXPLOSION_FORCE * force_mult * if spec.big { 1.5 } else { 1.0 };
        if let Some(dir) = try_normalize(enemy.pos - origin) {
            enemy.vel += dir * force;
        }
        damage_enemy(state, i, falloff * max_damage);
        settle_enemy(state, i, spec.credit);
    }

    if spec.shrapnel {
        for k in 0..10 {
            let angle = TAU / 10.0 * k as f32;
            let id = state.next_entity_id();
            let pellet = Bullet::new(id, origin, angle, 11.0, 2.0).credited(spec.credit);
            state.bullets.push(pellet);
        }
    }
    if spec.cluster {
        for _ in 0..3 {
            let angle = spec.heading + (state.rng.random::<f32>() - 0.5) * 0.7;
            let id = state.next_entity_id();
            let mut rocket = Bullet::new(id, origin, angle, 8.0, 6.0)
                .credited(spec.credit)
                .explosive(Payload {
                    range_mult: 0.6,
                    ..Payload::default()
                });
            rocket.homing = true;
            state.bullets.push(rocket);
        }
    }
}

/// Instant kill for everything in range except bosses, which lose a
/// fixed share of max health
pub fn detonate_nuke(state: &mut GameState, origin: Vec2) {
    log::info!("Nuke detonated at ({:.0}, {:.0})", origin.x, origin.y);
    state.shake(50.0);
    effects::emit(&mut state.particles, &mut state.rng, origin, palette::NUKE, 20.0, 50);
    state.push_event(GameEvent::Nuke { pos: origin });

    for i in 0..state.enemies.len() {
        let enemy = &state.enemies[i];
        if !enemy.is_active() || enemy.pos.distance(origin) >= NUKE_RADIUS {
            continue;
        }
        if enemy.is_boss() {
            let share = enemy.max_hp * NUKE_BOSS_FRACTION;
            damage_enemy(state, i, share);
            settle_enemy(state, i, None);
        } else {
            kill_enemy(state, i, None);
        }
    }
}

/// Remove a dying boss for good: credit, fragments and one nuke
pub fn finalize_boss(state: &mut GameState, idx: usize) -> bool {
    let Some(boss) = state.enemies.get(idx) else {
        return false;
    };
    if boss.dead || !boss.is_boss() {
        return false;
    }
    let pos = boss.pos;
    kill_enemy(state, idx, None);
    for _ in 0..BOSS_FRAGMENT_COUNT {
        let fragment = Fragment::new(&mut state.rng, pos);
        state.fragments.push(fragment);
    }
    detonate_nuke(state, pos);
    true
}

/// Damage the player unless dead or in god mode. Returns true on the hit
/// that kills.
pub fn damage_player(state: &mut GameState, amount: f32) -> bool {
    if state.settings.god_mode || state.player.dead {
        return false;
    }
    let walking_tank = state.player.firing
        && state.player.weapon == WeaponKind::Minigun
        && state.has_upgrade(WeaponUpgrade::MinigunWalkingTank);
    let amount = if walking_tank { amount * 0.2 } else { amount };

    state.noise = Some(state.player.pos);
    state.push_event(GameEvent::PlayerHurt { damage: amount });
    state.mark_hud();
    let lethal = state.player.apply_damage(amount);
    if lethal {
        let lives_remaining = state.player.lives;
        log::info!("Player died, {lives_remaining} lives left");
        state.push_event(GameEvent::PlayerDied { lives_remaining });
    }
    lethal
}

/// Base damage of a hit before it lands, with crits and weak points
fn hit_damage(state: &mut GameState, enemy_idx: usize, bullet_idx: usize) -> f32 {
    let bullet = &state.bullets[bullet_idx];
    let enemy = &state.enemies[enemy_idx];
    let (kind, enemy_pos, facing, max_hp) = (enemy.kind(), enemy.pos, enemy.facing, enemy.max_hp);
    let (impact, angle, railgun) = (bullet.pos, bullet.angle, bullet.weapon == Some(WeaponKind::Railgun));
    let super_damage = state.settings.super_damage;
    let mut damage = if super_damage { SUPER_DAMAGE } else { bullet.damage };

    match kind {
        EnemyKind::Tank if normalize_angle(angle - facing).abs() < PI / 3.0 => {
            damage *= TANK_CRIT_MULT;
            state.push_event(GameEvent::Crit { pos: enemy_pos });
            effects::emit(&mut state.particles, &mut state.rng, enemy_pos, palette::CRIT, 8.0, 5);
        }
        EnemyKind::Boss => {
            if normalize_angle(angle_to(enemy_pos, impact) - facing).abs() > BOSS_WEAK_POINT_ARC {
                damage *= BOSS_WEAK_POINT_MULT;
                state.push_event(GameEvent::WeakPoint { pos: impact });
                effects::emit(&mut state.particles, &mut state.rng, impact, palette::WEAK_POINT, 10.0, 8);
            }
            // Fixed share replaces the weak-point multiplier
            if railgun {
                damage = if super_damage { SUPER_DAMAGE } else { max_hp * RAILGUN_BOSS_FRACTION };
            }
        }
        _ => {}
    }
    damage
}

/// Apply one bullet to one enemy
fn strike(state: &mut GameState, enemy_idx: usize, bullet_idx: usize) {
    let damage = hit_damage(state, enemy_idx, bullet_idx);
    damage_enemy(state, enemy_idx, damage);

    let enemy = &mut state.enemies[enemy_idx];
    let (enemy_id, enemy_pos, is_boss) = (enemy.id, enemy.pos, enemy.is_boss());
    let bullet = &mut state.bullets[bullet_idx];
    if !is_boss {
        let kb = if matches!(enemy.behavior, Behavior::Tank(_)) { 2.0 } else { 8.0 };
        enemy.vel += heading(bullet.angle) * kb * bullet.knockback_mult;
    }

    let mut explosion = None;
    if let Some(payload) = bullet.payload {
        bullet.spent = true;
        explosion = Some((bullet.pos, ExplosionSpec::from_payload(&payload, bullet.angle, bullet.weapon)));
    } else if bullet.pierce.pierces() {
        bullet.spent = bullet.register_hit(enemy_id);
        if bullet.tungsten {
            let hits = bullet.hit_list.len() as f32;
            bullet.damage = bullet.base_damage * (1.0 - 0.1 * hits).max(0.1);
        }
    } else {
        bullet.spent = true;
        bullet.hit_list.push(enemy_id);
    }

    let (angle, credit, splinters, tesla, splinter_damage) = (
        bullet.angle,
        bullet.weapon,
        bullet.splinters,
        bullet.tesla,
        bullet.damage * 0.3,
    );

    state.noise = Some(enemy_pos);
    state.push_event(GameEvent::EnemyHit { pos: enemy_pos, damage });
    effects::emit(&mut state.particles, &mut state.rng, enemy_pos, palette::BLOOD, 5.0, 3);

    if splinters {
        for offset in [-0.4, 0.0, 0.4] {
            let id = state.next_entity_id();
            let mut shard = Bullet::new(id, enemy_pos, angle + offset, 14.0, splinter_damage).credited(credit);
            shard.hit_list.push(enemy_id);
            state.bullets.push(shard);
        }
    }

    if tesla {
        for other in state.enemies.iter_mut() {
            if other.is_active() && !other.is_boss() && other.pos.distance(enemy_pos) < TESLA_RADIUS {
                other.stun = TESLA_STUN_FRAMES;
            }
        }
        effects::emit(&mut state.particles, &mut state.rng, enemy_pos, palette::ZAP, 12.0, 8);
    }

    if let Some((pos, spec)) = explosion {
        create_explosion(state, pos, &spec);
    }

    if settle_enemy(state, enemy_idx, credit) {
        state.hit_stop = HIT_STOP_TICKS;
    }
}

/// Test every player-owned bullet against every live enemy
pub fn resolve_projectile_hits(state: &mut GameState) {
    for ei in 0..state.enemies.len() {
        for bi in 0..state.bullets.len() {
            let enemy = &state.enemies[ei];
            if !enemy.is_active() {
                break;
            }
            let bullet = &state.bullets[bi];
            if bullet.spent || bullet.hostile {
                continue;
            }
            let hitbox = if enemy.is_boss() { 80.0 } else { 40.0 };
            if (enemy.pos.x - bullet.pos.x).abs() > hitbox || (enemy.pos.y - bullet.pos.y).abs() > hitbox {
                continue;
            }
            if bullet.has_hit(enemy.id) || enemy.pos.distance(bullet.pos) >= enemy.radius + BULLET_HIT_PAD {
                continue;
            }
            strike(state, ei, bi);
        }
    }
}

/// Enemy bodies against the player
pub fn resolve_contacts(state: &mut GameState) {
    for i in 0..state.enemies.len() {
        if state.player.dead {
            break;
        }
        let enemy = &state.enemies[i];
        if !enemy.is_active() || enemy.pos.distance(state.player.pos) >= enemy.radius + state.player.radius {
            continue;
        }
        let kind = enemy.kind();
        let away = try_normalize(state.player.pos - enemy.pos).unwrap_or(Vec2::X);
        let (damage, force) = match kind {
            EnemyKind::Boss if enemy.is_charging() => (10.0, 80.0),
            EnemyKind::Boss => (5.0, 15.0),
            EnemyKind::Tank => (CONTACT_DAMAGE, 17.5),
            _ => (CONTACT_DAMAGE, 10.0),
        };
        state.shake(10.0);
        let died = damage_player(state, damage);
        if !died && !state.player.dead {
            state.player.vel += away * force;
        }
        // Small fry burst on impact, uncredited
        if matches!(kind, EnemyKind::Zombie | EnemyKind::Flanker | EnemyKind::Blind) {
            state.enemies[i].dead = true;
        }
        let pos = state.player.pos;
        effects::emit(&mut state.particles, &mut state.rng, pos, palette::BLOOD, 8.0, 10);
    }
}

/// Hostile bullets against the player
pub fn resolve_hostile_hits(state: &mut GameState) {
    for i in 0..state.bullets.len() {
        let bullet = &state.bullets[i];
        if !bullet.hostile || bullet.spent || state.player.dead {
            continue;
        }
        if bullet.pos.distance(state.player.pos) >= state.player.radius {
            continue;
        }
        let damage = bullet.damage;
        state.bullets[i].spent = true;
        state.shake(5.0);
        damage_player(state, damage);
    }
}

/// A charging boss flattens whatever it runs through
pub fn boss_charge_sweep(state: &mut GameState, boss_idx: usize, dt: f32) {
    let Some(boss) = state.enemies.get(boss_idx) else {
        return;
    };
    let (boss_pos, boss_radius) = (boss.pos, boss.radius);
    for j in 0..state.enemies.len() {
        let other = &mut state.enemies[j];
        if j == boss_idx || !other.is_active() || other.is_boss() {
            continue;
        }
        if other.pos.distance(boss_pos) >= boss_radius + other.radius + CHARGE_SWEEP_PAD {
            continue;
        }
        if matches!(other.behavior, Behavior::Tank(_)) {
            let pos = other.pos;
            kill_enemy(state, j, None);
            create_explosion(state, pos, &ExplosionSpec::small());
        } else {
            if let Some(dir) = try_normalize(other.pos - boss_pos) {
                other.vel += dir * 30.0 * dt;
            }
            damage_enemy(state, j, 5.0);
            settle_enemy(state, j, None);
        }
    }
}

/// Boss hit the arena wall: shake and shed hostile debris
pub fn wall_slam(state: &mut GameState, at: Vec2) {
    state.shake(30.0);
    state.push_event(GameEvent::BossImpact { pos: at });
    for k in 0..8 {
        let angle = TAU / 8.0 * k as f32;
        let id = state.next_entity_id();
        let mut shard = Bullet::new(id, at, angle, 6.0, 5.0);
        shard.hostile = true;
        state.bullets.push(shard);
    }
}

/// Bullet left the arena or ran out of life: explosive rounds still go off
pub fn expire_bullet(state: &mut GameState, idx: usize) {
    let bullet = &mut state.bullets[idx];
    if bullet.spent {
        return;
    }
    bullet.spent = true;
    if let Some(payload) = bullet.payload {
        let (pos, spec) = (bullet.pos, ExplosionSpec::from_payload(&payload, bullet.angle, bullet.weapon));
        create_explosion(state, pos, &spec);
    }
}

/// Pierce budget for a freshly fired bullet
pub fn pierce_for(weapon: WeaponKind, state: &GameState) -> Pierce {
    match weapon {
        WeaponKind::Railgun => Pierce::Unlimited,
        WeaponKind::Smg if state.has_upgrade(WeaponUpgrade::SmgApJacket) => Pierce::Limited(2),
        _ => Pierce::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;
    use crate::sim::enemy::{BossPhase, Enemy};
    use crate::sim::state::Phase;
    use proptest::prelude::*;

    fn state() -> GameState {
        GameState::new(9, Settings::default())
    }

    fn place(state: &mut GameState, kind: EnemyKind, pos: Vec2, hp: f32) -> usize {
        let id = state.next_entity_id();
        let mut enemy = Enemy::new(id, kind, pos, 1, &mut state.rng);
        enemy.hp = hp;
        enemy.max_hp = enemy.max_hp.max(hp);
        state.enemies.push(enemy);
        state.enemies.len() - 1
    }

    fn bullet(state: &mut GameState, pos: Vec2, damage: f32) -> usize {
        let id = state.next_entity_id();
        state.bullets.push(Bullet::new(id, pos, 0.0, 10.0, damage));
        state.bullets.len() - 1
    }

    #[test]
    fn test_limited_pierce_stops_after_two() {
        let mut s = state();
        let at = Vec2::splat(1500.0);
        for dx in [-10.0, 0.0, 10.0] {
            place(&mut s, EnemyKind::Zombie, at + Vec2::new(dx, 0.0), 100.0);
        }
        let b = bullet(&mut s, at, 5.0);
        s.bullets[b].pierce = Pierce::Limited(2);
        resolve_projectile_hits(&mut s);

        assert!(s.bullets[b].spent);
        assert_eq!(s.bullets[b].hit_list.len(), 2);
        assert_eq!(s.enemies[0].hp, 95.0);
        assert_eq!(s.enemies[1].hp, 95.0);
        assert_eq!(s.enemies[2].hp, 100.0);
    }

    #[test]
    fn test_dead_enemy_never_hit() {
        let mut s = state();
        let at = Vec2::splat(1500.0);
        let e = place(&mut s, EnemyKind::Zombie, at, 10.0);
        s.enemies[e].dead = true;
        let b = bullet(&mut s, at, 5.0);
        resolve_projectile_hits(&mut s);
        assert!(!s.bullets[b].spent);
        assert_eq!(s.enemies[e].hp, 10.0);
    }

    #[test]
    fn test_contact_damage_sequence() {
        let mut s = state();
        let mut seen = vec![s.player.health];
        for _ in 0..3 {
            let pos = s.player.pos;
            place(&mut s, EnemyKind::Zombie, pos + Vec2::new(5.0, 0.0), 5.0);
            resolve_contacts(&mut s);
            s.sweep();
            seen.push(s.player.health);
        }
        assert_eq!(seen, vec![100.0, 90.0, 80.0, 70.0]);
        assert!(!s.player.dead);
        // Consumed without credit
        assert_eq!(s.scoreboard.score, 0);
    }

    #[test]
    fn test_god_mode_blocks_damage() {
        let mut s = state();
        s.settings.god_mode = true;
        assert!(!damage_player(&mut s, 500.0));
        assert_eq!(s.player.health, 100.0);
    }

    #[test]
    fn test_player_death_once_per_tick() {
        let mut s = state();
        s.player.health = 5.0;
        let pos = s.player.pos;
        place(&mut s, EnemyKind::Zombie, pos, 5.0);
        place(&mut s, EnemyKind::Zombie, pos, 5.0);
        resolve_contacts(&mut s);
        let deaths = s
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::PlayerDied { .. }))
            .count();
        assert_eq!(deaths, 1);
        assert_eq!(s.player.lives, START_LIVES - 1);
    }

    #[test]
    fn test_kill_is_idempotent() {
        let mut s = state();
        let e = place(&mut s, EnemyKind::Tank, Vec2::splat(1500.0), 1.0);
        assert!(kill_enemy(&mut s, e, Some(WeaponKind::Smg)));
        let pickups = s.pickups.len();
        assert!(!kill_enemy(&mut s, e, Some(WeaponKind::Smg)));
        assert_eq!(s.scoreboard.score, 1);
        assert_eq!(s.scoreboard.points, 3);
        assert_eq!(s.pickups.len(), pickups);
        assert_eq!(s.progression.progress(WeaponKind::Smg).unwrap().xp, 1);
    }

    #[test]
    fn test_35_kills_reach_wave_two() {
        let mut s = state();
        let target = s.waves.target_size;
        for _ in 0..35 {
            let e = place(&mut s, EnemyKind::Zombie, Vec2::splat(1500.0), 1.0);
            kill_enemy(&mut s, e, None);
        }
        assert_eq!(s.waves.wave, 2);
        assert_eq!(s.waves.target_size, target + ARENA_GROWTH);
        assert!(s.drain_events().contains(&GameEvent::WaveAdvanced { wave: 2 }));
    }

    #[test]
    fn test_credited_kills_open_offer() {
        let mut s = state();
        for _ in 0..XP_THRESHOLDS[0] {
            let e = place(&mut s, EnemyKind::Zombie, Vec2::splat(1500.0), 1.0);
            kill_enemy(&mut s, e, Some(WeaponKind::Shotgun));
        }
        assert_eq!(s.phase, Phase::ChoosingUpgrade);
        assert_eq!(s.progression.offer.as_ref().unwrap().weapon, WeaponKind::Shotgun);
    }

    #[test]
    fn test_boss_finalizes_once() {
        let mut s = state();
        let b = place(&mut s, EnemyKind::Boss, Vec2::splat(1500.0), 1.0);
        let near = place(&mut s, EnemyKind::Zombie, Vec2::new(1700.0, 1500.0), 50.0);

        create_explosion(&mut s, Vec2::splat(1500.0), &ExplosionSpec::small());
        assert!(s.enemies[b].is_dying());
        assert!(!s.enemies[b].dead);
        assert_eq!(s.scoreboard.score, 0);

        // Dying boss ignores further blasts
        create_explosion(&mut s, Vec2::splat(1500.0), &ExplosionSpec::big());
        assert!(s.enemies[b].is_dying());

        s.drain_events();
        assert!(finalize_boss(&mut s, b));
        assert!(!finalize_boss(&mut s, b));
        assert!(s.enemies[b].dead);
        assert_eq!(s.fragments.len(), BOSS_FRAGMENT_COUNT);
        let nukes = s.drain_events().iter().filter(|e| matches!(e, GameEvent::Nuke { .. })).count();
        assert_eq!(nukes, 1);
        assert!(s.enemies[near].dead);
        assert_eq!(s.scoreboard.points, 500 + 1);
    }

    #[test]
    fn test_nuke_takes_boss_share() {
        let mut s = state();
        let b = place(&mut s, EnemyKind::Boss, Vec2::splat(1500.0), 7000.0);
        let z = place(&mut s, EnemyKind::Zombie, Vec2::new(1600.0, 1500.0), 5.0);
        detonate_nuke(&mut s, Vec2::splat(1500.0));
        assert!((s.enemies[b].hp - 6000.0).abs() < 1e-2);
        assert!(s.enemies[z].dead);
        assert_eq!(s.scoreboard.score, 1);
    }

    #[test]
    fn test_tank_frontal_crit_and_aggro() {
        let mut s = state();
        let t = place(&mut s, EnemyKind::Tank, Vec2::splat(1500.0), 100.0);
        s.enemies[t].facing = 0.0;
        let b = bullet(&mut s, Vec2::splat(1500.0), 2.0);
        s.bullets[b].angle = 0.1;
        resolve_projectile_hits(&mut s);
        assert_eq!(s.enemies[t].hp, 90.0);
        let Behavior::Tank(brain) = &s.enemies[t].behavior else { panic!("not a tank") };
        assert_eq!(brain.aggro_time, TANK_AGGRO_FRAMES);
    }

    #[test]
    fn test_railgun_boss_fraction() {
        let mut s = state();
        let b = place(&mut s, EnemyKind::Boss, Vec2::splat(1500.0), 3800.0);
        s.enemies[b].max_hp = 3800.0;
        s.enemies[b].facing = PI;
        // Strike from behind: fraction still replaces the weak point
        let shot = bullet(&mut s, Vec2::new(1550.0, 1500.0), 50.0);
        s.bullets[shot].weapon = Some(WeaponKind::Railgun);
        s.bullets[shot].pierce = Pierce::Unlimited;
        resolve_projectile_hits(&mut s);
        assert!((s.enemies[b].hp - 3700.0).abs() < 1e-2);
    }

    #[test]
    fn test_boss_knockback_skipped() {
        let mut s = state();
        let b = place(&mut s, EnemyKind::Boss, Vec2::splat(1500.0), 3800.0);
        bullet(&mut s, Vec2::splat(1500.0), 2.0);
        resolve_projectile_hits(&mut s);
        assert_eq!(s.enemies[b].vel, Vec2::ZERO);
    }

    #[test]
    fn test_bullet_kill_sets_hit_stop() {
        let mut s = state();
        place(&mut s, EnemyKind::Zombie, Vec2::splat(1500.0), 1.0);
        bullet(&mut s, Vec2::splat(1500.0), 2.0);
        resolve_projectile_hits(&mut s);
        assert_eq!(s.hit_stop, HIT_STOP_TICKS);
        assert_eq!(s.noise, Some(Vec2::splat(1500.0)));
    }

    #[test]
    fn test_charge_sweep_flattens_tanks() {
        let mut s = state();
        let boss = place(&mut s, EnemyKind::Boss, Vec2::splat(1500.0), 5000.0);
        if let Behavior::Boss(brain) = &mut s.enemies[boss].behavior {
            brain.phase = BossPhase::Charge;
        }
        let tank = place(&mut s, EnemyKind::Tank, Vec2::new(1600.0, 1500.0), 100.0);
        let zombie = place(&mut s, EnemyKind::Zombie, Vec2::new(1500.0, 1620.0), 50.0);
        boss_charge_sweep(&mut s, boss, 1.0);
        assert!(s.enemies[tank].dead);
        assert!(s.enemies[zombie].hp < 50.0);
        assert!(!s.enemies[boss].dead);
    }

    #[test]
    fn test_wall_slam_sheds_hostile_shots() {
        let mut s = state();
        wall_slam(&mut s, Vec2::splat(1500.0));
        assert_eq!(s.bullets.iter().filter(|b| b.hostile).count(), 8);
    }

    #[test]
    fn test_explosive_expiry_detonates() {
        let mut s = state();
        let z = place(&mut s, EnemyKind::Zombie, Vec2::new(1520.0, 1500.0), 100.0);
        let b = bullet(&mut s, Vec2::splat(1500.0), 20.0);
        s.bullets[b].payload = Some(Payload::default());
        expire_bullet(&mut s, b);
        assert!(s.bullets[b].spent);
        assert!(s.enemies[z].hp < 100.0);
    }

    proptest! {
        #[test]
        fn test_falloff_bounds(d in 0.0f32..2000.0, r in 1.0f32..1000.0) {
            let f = explosion_falloff(d, r);
            prop_assert!((0.0..=1.0).contains(&f));
            if d >= r {
                prop_assert_eq!(f, 0.0);
            }
        }

        #[test]
        fn test_explosion_center_is_max(big in any::<bool>()) {
            let spec = if big { ExplosionSpec::big() } else { ExplosionSpec::small() };
            prop_assert_eq!(explosion_falloff(0.0, spec.radius()) * spec.max_damage(), spec.max_damage());
            prop_assert_eq!(explosion_falloff(spec.radius(), spec.radius()), 0.0);
        }

        #[test]
        fn test_hp_never_increases(hits in proptest::collection::vec(prop_oneof![
            -50.0f32..50.0,
            Just(f32::NAN),
            Just(f32::INFINITY),
            Just(f32::NEG_INFINITY),
        ], 1..20)) {
            let mut s = state();
            let e = place(&mut s, EnemyKind::Blind, Vec2::splat(1500.0), 1000.0);
            let mut last = s.enemies[e].hp;
            for amount in hits {
                damage_enemy(&mut s, e, amount);
                let hp = s.enemies[e].hp;
                prop_assert!(hp <= last);
                last = hp;
            }
        }
    }
}
