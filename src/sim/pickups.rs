//! Pickups, the drop table and what collecting one does

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::enemy::EnemyKind;
use super::player::Player;
use super::weapons::{SecondaryKind, WeaponKind, WeaponStats};
use crate::Rect;
use crate::consts::*;

/// Pickup types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    Weapon(WeaponKind),
    Secondary(SecondaryKind),
    Medikit,
    Nuke,
}

/// Horizontal sweep of a nuke pickup across the arena
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NukeDrift {
    /// +1 left-to-right, -1 right-to-left
    pub dir: f32,
    pub base_y: f32,
    pub phase: f32,
}

/// A pickup entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub kind: PickupKind,
    pub pos: Vec2,
    /// Frames left before it vanishes
    pub ttl: f32,
    /// Cosmetic bob phase
    pub bob: f32,
    pub drift: Option<NukeDrift>,
}

impl Pickup {
    pub fn new(id: u32, kind: PickupKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            ttl: PICKUP_TTL_FRAMES,
            bob: 0.0,
            drift: None,
        }
    }

    /// A nuke entering from 500 px outside a random side of the arena
    pub fn nuke<R: Rng>(id: u32, arena: &Rect, rng: &mut R) -> Self {
        let y = arena.y + 100.0 + rng.random::<f32>() * (arena.h - 200.0).max(0.0);
        let (x, dir) = if rng.random_bool(0.5) {
            (arena.x - 500.0, 1.0)
        } else {
            (arena.x + arena.w + 500.0, -1.0)
        };
        Self {
            id,
            kind: PickupKind::Nuke,
            pos: Vec2::new(x, y),
            ttl: NUKE_TTL_FRAMES,
            bob: 0.0,
            drift: Some(NukeDrift {
                dir,
                base_y: y,
                phase: rng.random::<f32>() * 100.0,
            }),
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.ttl -= dt;
        self.bob += 0.1 * dt;
        if let Some(drift) = &self.drift {
            self.pos.x += 2.0 * drift.dir * dt;
            self.pos.y = drift.base_y + (self.pos.x * 0.005 + drift.phase).sin() * 100.0;
        }
    }

    pub fn expired(&self) -> bool {
        self.ttl <= 0.0
    }

    pub fn touches(&self, pos: Vec2) -> bool {
        self.pos.distance(pos) < PICKUP_RADIUS
    }
}

/// Weapons that can drop at `wave`
pub fn weapon_pool(wave: u32) -> &'static [WeaponKind] {
    use WeaponKind::*;
    match wave {
        0..5 => &[Smg, Shotgun],
        5..10 => &[Smg, Shotgun, Rocket],
        10..15 => &[Smg, Shotgun, Rocket, Minigun],
        _ => &[Smg, Shotgun, Minigun, Rocket, Railgun],
    }
}

/// Secondaries that can drop at `wave`
pub fn secondary_pool(wave: u32) -> &'static [SecondaryKind] {
    use SecondaryKind::*;
    match wave {
        0..10 => &[Mine],
        10..20 => &[Mine, Turret],
        _ => &[Mine, Turret, Cluster],
    }
}

/// Roll the drop for a killed enemy. Tanks always drop; the pistol-only
/// player gets twice the usual chance.
pub fn roll_drop<R: Rng>(rng: &mut R, kind: EnemyKind, wave: u32, held: WeaponKind) -> Option<PickupKind> {
    let chance = if held == WeaponKind::Pistol { 0.25 } else { 0.12 };
    let drop = kind == EnemyKind::Tank || rng.random::<f32>() < chance;
    if !drop {
        return (rng.random::<f32>() < 0.05).then_some(PickupKind::Medikit);
    }

    let r: f32 = rng.random();
    if r < 0.3 {
        return Some(PickupKind::Medikit);
    }
    if r < 0.4 {
        let pool = secondary_pool(wave);
        return Some(PickupKind::Secondary(pool[rng.random_range(0..pool.len())]));
    }

    // The held weapon is weighted up so ammo keeps coming
    let mut choices = weapon_pool(wave).to_vec();
    if choices.contains(&held) {
        choices.push(held);
        choices.push(held);
    }
    Some(PickupKind::Weapon(choices[rng.random_range(0..choices.len())]))
}

/// Outcome of touching a pickup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Collected {
    Applied,
    /// A nuke goes off at the pickup
    Detonate(Vec2),
}

/// Apply `pickup` to `player`; `stats_for` resolves a weapon with its
/// current upgrades and the player's ammo bonus.
pub fn collect(pickup: &Pickup, player: &mut Player, stats_for: impl Fn(WeaponKind) -> WeaponStats) -> Collected {
    match pickup.kind {
        PickupKind::Nuke => return Collected::Detonate(pickup.pos),
        PickupKind::Medikit => player.heal(MEDIKIT_HEAL),
        PickupKind::Secondary(kind) => player.set_secondary(kind),
        PickupKind::Weapon(kind) => {
            let stats = stats_for(kind);
            if player.weapon == kind {
                player.add_ammo(&stats);
            } else {
                player.set_weapon(&stats);
            }
        }
    }
    Collected::Applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::weapons::resolve;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_tank_always_drops() {
        let mut rng = Pcg32::seed_from_u64(11);
        for _ in 0..200 {
            assert!(roll_drop(&mut rng, EnemyKind::Tank, 1, WeaponKind::Smg).is_some());
        }
    }

    #[test]
    fn test_drops_respect_wave_pools() {
        let mut rng = Pcg32::seed_from_u64(12);
        for _ in 0..2000 {
            match roll_drop(&mut rng, EnemyKind::Tank, 1, WeaponKind::Pistol) {
                Some(PickupKind::Weapon(w)) => assert!(weapon_pool(1).contains(&w)),
                Some(PickupKind::Secondary(s)) => assert_eq!(s, SecondaryKind::Mine),
                Some(PickupKind::Medikit) => {}
                other => panic!("unexpected drop {other:?}"),
            }
        }
    }

    #[test]
    fn test_nuke_sweeps_toward_arena() {
        let mut rng = Pcg32::seed_from_u64(13);
        let arena = Rect::centered(WORLD_SIZE, 2800.0);
        let mut nuke = Pickup::nuke(1, &arena, &mut rng);
        let start = nuke.pos.x;
        let center = arena.center().x;
        nuke.update(1.0);
        assert!((nuke.pos.x - center).abs() < (start - center).abs());
        assert_eq!(nuke.ttl, NUKE_TTL_FRAMES - 1.0);
    }

    #[test]
    fn test_collect_weapon_switches_or_tops_up() {
        let mut player = Player::new(Vec2::ZERO, 3);
        let pickup = Pickup::new(1, PickupKind::Weapon(WeaponKind::Shotgun), Vec2::ZERO);
        let stats_for = |w| resolve(w, &[], 0.0);
        assert_eq!(collect(&pickup, &mut player, stats_for), Collected::Applied);
        assert_eq!(player.weapon, WeaponKind::Shotgun);
        assert_eq!(player.ammo, Some(24));
        collect(&pickup, &mut player, stats_for);
        assert_eq!(player.ammo, Some(48));
    }

    #[test]
    fn test_collect_medikit_caps_at_max() {
        let mut player = Player::new(Vec2::ZERO, 3);
        player.health = 90.0;
        let pickup = Pickup::new(1, PickupKind::Medikit, Vec2::ZERO);
        collect(&pickup, &mut player, |w| resolve(w, &[], 0.0));
        assert_eq!(player.health, 100.0);
    }

    #[test]
    fn test_collect_nuke_detonates_in_place() {
        let mut player = Player::new(Vec2::ZERO, 3);
        let pickup = Pickup {
            kind: PickupKind::Nuke,
            ..Pickup::new(1, PickupKind::Medikit, Vec2::new(4.0, 5.0))
        };
        assert_eq!(
            collect(&pickup, &mut player, |w| resolve(w, &[], 0.0)),
            Collected::Detonate(Vec2::new(4.0, 5.0))
        );
    }
}
