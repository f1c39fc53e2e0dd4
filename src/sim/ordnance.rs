//! Ordnance entities: bullets, grenades, mines and sentry turrets
//!
//! Each entity owns its motion and lifetime. None of them apply damage;
//! the combat resolver and tick decide what a contact or expiry does.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::weapons::{Pierce, WeaponKind};
use crate::{heading, normalize_angle};

/// Default bullet lifetime in frames
pub const BULLET_LIFE: f32 = 60.0;
/// Homing turn rate (radians per frame)
pub const HOMING_TURN: f32 = 0.08;

/// What an explosive bullet does when it goes off
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub big: bool,
    pub range_mult: f32,
    /// Launch omnidirectional pellets
    pub shrapnel: bool,
    /// Launch forward mini-rockets
    pub cluster: bool,
}

impl Default for Payload {
    fn default() -> Self {
        Self {
            big: false,
            range_mult: 1.0,
            shrapnel: false,
            cluster: false,
        }
    }
}

/// A projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Travel direction (radians)
    pub angle: f32,
    pub speed: f32,
    /// Remaining life in frames
    pub life: f32,
    pub damage: f32,
    /// Damage before per-hit falloff
    pub base_damage: f32,
    /// Knockback multiplier from the firing weapon
    pub knockback_mult: f32,
    /// `Some` when the bullet explodes on impact or expiry
    pub payload: Option<Payload>,
    pub pierce: Pierce,
    pub homing: bool,
    /// Fired by an enemy; only tests against the player
    pub hostile: bool,
    /// Splits on hit (minigun splinter rounds)
    pub splinters: bool,
    /// Damage falls 10% per enemy struck
    pub tungsten: bool,
    /// Stuns enemies near the impact
    pub tesla: bool,
    /// Weapon credited with kills; turrets and debris credit nothing
    pub weapon: Option<WeaponKind>,
    /// Enemies already struck (ids)
    pub hit_list: Vec<u32>,
    /// Marked for removal this tick
    #[serde(skip)]
    pub spent: bool,
}

impl Bullet {
    pub fn new(id: u32, pos: Vec2, angle: f32, speed: f32, damage: f32) -> Self {
        Self {
            id,
            pos,
            vel: heading(angle) * speed,
            angle,
            speed,
            life: BULLET_LIFE,
            damage,
            base_damage: damage,
            knockback_mult: 1.0,
            payload: None,
            pierce: Pierce::None,
            homing: false,
            hostile: false,
            splinters: false,
            tungsten: false,
            tesla: false,
            weapon: None,
            hit_list: Vec::new(),
            spent: false,
        }
    }

    pub fn credited(mut self, weapon: Option<WeaponKind>) -> Self {
        self.weapon = weapon;
        self
    }

    pub fn explosive(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn has_hit(&self, enemy_id: u32) -> bool {
        self.hit_list.contains(&enemy_id)
    }

    /// Steer toward `target` (if any), then integrate
    pub fn update(&mut self, dt: f32, target: Option<Vec2>) {
        if self.homing {
            if let Some(target) = target {
                let d = target - self.pos;
                let delta = normalize_angle(d.y.atan2(d.x) - self.angle);
                let turn = (HOMING_TURN * dt).min(delta.abs());
                self.angle = normalize_angle(self.angle + crate::sign(delta) * turn);
                self.vel = heading(self.angle) * self.speed;
            }
        }
        self.pos += self.vel * dt;
        self.life -= dt;
    }

    /// Record a struck enemy and report whether the pierce budget is spent
    pub fn register_hit(&mut self, enemy_id: u32) -> bool {
        if !self.has_hit(enemy_id) {
            self.hit_list.push(enemy_id);
        }
        match self.pierce {
            Pierce::None => true,
            Pierce::Limited(max) => self.hit_list.len() as u32 >= max,
            Pierce::Unlimited => false,
        }
    }
}

/// A thrown grenade (plain or cluster)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grenade {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
    pub radius: f32,
    pub cluster: bool,
    pub drag: f32,
}

impl Grenade {
    pub fn new(id: u32, pos: Vec2, angle: f32, cluster: bool) -> Self {
        let speed = if cluster { 15.0 } else { 10.0 };
        Self {
            id,
            pos,
            vel: heading(angle) * speed,
            life: 60.0,
            radius: if cluster { 8.0 } else { 6.0 },
            cluster,
            drag: if cluster { 0.03 } else { 0.05 },
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.pos += self.vel * dt;
        self.vel *= 1.0 - self.drag * dt;
        self.life -= dt;
    }

    /// Proximity fuse against an enemy of radius `enemy_radius` at `enemy_pos`
    pub fn touches(&self, enemy_pos: Vec2, enemy_radius: f32) -> bool {
        self.pos.distance(enemy_pos) < enemy_radius + 5.0
    }
}

/// Mine arming delay (game-clock ms)
pub const MINE_ARM_MS: f32 = 1000.0;

/// A proximity mine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mine {
    pub id: u32,
    pub pos: Vec2,
    /// Remaining frames once armed
    pub life: f32,
    pub trigger_radius: f32,
    /// Milliseconds until armed
    pub arm_ms: f32,
}

impl Mine {
    pub fn new(id: u32, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            life: 3600.0,
            trigger_radius: 40.0,
            arm_ms: MINE_ARM_MS,
        }
    }

    pub fn armed(&self) -> bool {
        self.arm_ms <= 0.0
    }

    /// Advance timers; returns true on the tick the mine becomes armed
    pub fn update(&mut self, dt: f32, elapsed_ms: f32) -> bool {
        if !self.armed() {
            self.arm_ms -= elapsed_ms;
            return self.armed();
        }
        self.life -= dt;
        false
    }

    pub fn triggered_by(&self, enemy_pos: Vec2) -> bool {
        self.armed() && self.pos.distance(enemy_pos) < self.trigger_radius
    }
}

/// Sentry targeting range
pub const TURRET_RANGE: f32 = 500.0;

/// What a turret wants to do this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TurretAction {
    Idle,
    Deployed,
    Fire { angle: f32 },
}

/// A thrown sentry turret
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turret {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
    pub deployed: bool,
    pub ammo: u32,
    /// Milliseconds until the next shot
    pub fire_timer_ms: f32,
}

impl Turret {
    pub fn new(id: u32, pos: Vec2, angle: f32) -> Self {
        Self {
            id,
            pos,
            vel: heading(angle) * 10.0,
            angle,
            deployed: false,
            ammo: 180,
            fire_timer_ms: 0.0,
        }
    }

    pub fn expired(&self) -> bool {
        self.deployed && self.ammo == 0
    }

    /// Slide to a stop, then track `target` and report when to shoot.
    /// `fire_interval_ms` is the smg rate the sentry borrows.
    pub fn update(
        &mut self,
        dt: f32,
        elapsed_ms: f32,
        target: Option<Vec2>,
        fire_interval_ms: f32,
    ) -> TurretAction {
        if !self.deployed {
            self.pos += self.vel * dt;
            self.vel *= 0.9;
            if self.vel.length() < 0.5 {
                self.deployed = true;
                return TurretAction::Deployed;
            }
            return TurretAction::Idle;
        }
        if self.ammo == 0 {
            return TurretAction::Idle;
        }
        self.fire_timer_ms -= elapsed_ms;
        let Some(target) = target else {
            self.angle = normalize_angle(self.angle + 0.05 * dt);
            return TurretAction::Idle;
        };
        let d = target - self.pos;
        let target_angle = d.y.atan2(d.x);
        let diff = normalize_angle(target_angle - self.angle);
        let turn = 0.05 * dt;
        if diff.abs() < turn {
            self.angle = target_angle;
        } else {
            self.angle = normalize_angle(self.angle + crate::sign(diff) * turn);
        }
        if diff.abs() < 0.5 && self.fire_timer_ms <= 0.0 {
            self.ammo -= 1;
            self.fire_timer_ms = fire_interval_ms;
            return TurretAction::Fire { angle: self.angle };
        }
        TurretAction::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limited_pierce_spends_after_budget() {
        let mut b = Bullet::new(1, Vec2::ZERO, 0.0, 10.0, 1.0);
        b.pierce = Pierce::Limited(2);
        assert!(!b.register_hit(10));
        assert!(b.register_hit(11));
        assert_eq!(b.hit_list, vec![10, 11]);
    }

    #[test]
    fn test_plain_bullet_spends_on_first_hit() {
        let mut b = Bullet::new(1, Vec2::ZERO, 0.0, 10.0, 1.0);
        assert!(b.register_hit(3));
    }

    #[test]
    fn test_unlimited_pierce_never_spends() {
        let mut b = Bullet::new(1, Vec2::ZERO, 0.0, 10.0, 1.0);
        b.pierce = Pierce::Unlimited;
        for id in 0..20 {
            assert!(!b.register_hit(id));
        }
    }

    #[test]
    fn test_homing_turns_toward_target() {
        let mut b = Bullet::new(1, Vec2::ZERO, 0.0, 10.0, 1.0);
        b.homing = true;
        b.update(1.0, Some(Vec2::new(0.0, 100.0)));
        assert!((b.angle - HOMING_TURN).abs() < 1e-5);
        assert!(b.pos.y > 0.0);
        assert_eq!(b.life, BULLET_LIFE - 1.0);
    }

    #[test]
    fn test_mine_arms_after_countdown() {
        let mut m = Mine::new(1, Vec2::ZERO);
        assert!(!m.triggered_by(Vec2::new(5.0, 0.0)));
        let mut armed_ticks = 0;
        for _ in 0..70 {
            if m.update(1.0, 16.6) {
                armed_ticks += 1;
            }
        }
        assert_eq!(armed_ticks, 1);
        assert!(m.triggered_by(Vec2::new(5.0, 0.0)));
        assert!(!m.triggered_by(Vec2::new(50.0, 0.0)));
    }

    #[test]
    fn test_grenade_drag_slows() {
        let mut g = Grenade::new(1, Vec2::ZERO, 0.0, false);
        g.update(1.0);
        assert!(g.vel.x < 10.0);
        assert!(g.touches(g.pos + Vec2::new(10.0, 0.0), 12.0));
    }

    #[test]
    fn test_turret_deploys_then_fires() {
        let mut t = Turret::new(1, Vec2::ZERO, 0.0);
        let mut deployed = false;
        for _ in 0..60 {
            if t.update(1.0, 16.6, None, 110.0) == TurretAction::Deployed {
                deployed = true;
                break;
            }
        }
        assert!(deployed);
        let target = t.pos + Vec2::new(100.0, 0.0);
        t.angle = 0.0;
        let action = t.update(1.0, 16.6, Some(target), 110.0);
        assert!(matches!(action, TurretAction::Fire { .. }));
        assert_eq!(t.ammo, 179);
        // Cooling down
        assert_eq!(t.update(1.0, 16.6, Some(target), 110.0), TurretAction::Idle);
    }
}
