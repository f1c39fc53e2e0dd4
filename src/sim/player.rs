//! Player avatar: movement, dash, focus, loadout and the death transition

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::progression::UniversalUpgrade;
use super::weapons::{SecondaryKind, WeaponKind, WeaponStats};
use crate::consts::*;
use crate::{Rect, heading, try_normalize};

/// Change in slow-motion state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusShift {
    Started,
    Ended,
}

/// The player avatar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    pub lives: u8,
    /// Aim direction (radians)
    pub aim: f32,

    pub weapon: WeaponKind,
    /// `None` is unlimited
    pub ammo: Option<u32>,
    pub secondary: Option<SecondaryKind>,
    pub secondary_ammo: u32,

    pub focus: f32,
    pub slow_mo: bool,

    /// Game-clock ms of the last primary shot
    pub last_shot_ms: Option<f32>,
    /// Game-clock ms of the last grenade/secondary throw
    pub last_throw_ms: Option<f32>,
    pub dash_until_ms: f32,
    pub dash_ready_ms: f32,

    /// Trigger held this tick
    pub firing: bool,
    /// Minigun spin-up accumulated while the trigger is held
    pub windup_ms: f32,
    /// Minigun time spent firing (super spin ramp)
    pub spin_ms: f32,
    /// Smg rounds fired (micro-munitions cadence)
    pub smg_shots: u32,

    pub universal: Vec<UniversalUpgrade>,
    /// Player-wide ammo bonus (percent)
    pub ammo_bonus: f32,

    pub dead: bool,
    /// Frames left before the death screen; `None` once resolved
    pub death_timer: Option<f32>,
}

impl Player {
    pub fn new(pos: Vec2, lives: u8) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            radius: PLAYER_RADIUS,
            health: PLAYER_MAX_HEALTH,
            max_health: PLAYER_MAX_HEALTH,
            lives,
            aim: 0.0,
            weapon: WeaponKind::Pistol,
            ammo: None,
            secondary: None,
            secondary_ammo: 0,
            focus: FOCUS_MAX,
            slow_mo: false,
            last_shot_ms: None,
            last_throw_ms: None,
            dash_until_ms: 0.0,
            dash_ready_ms: 0.0,
            firing: false,
            windup_ms: 0.0,
            spin_ms: 0.0,
            smg_shots: 0,
            universal: Vec::new(),
            ammo_bonus: 0.0,
            dead: false,
            death_timer: None,
        }
    }

    pub fn has_universal(&self, upgrade: UniversalUpgrade) -> bool {
        self.universal.contains(&upgrade)
    }

    /// Muzzle position for spawned projectiles
    pub fn muzzle(&self) -> Vec2 {
        self.pos + heading(self.aim) * 20.0
    }

    /// Accelerate along `move_dir`, apply friction and keep inside the arena
    pub fn integrate(&mut self, move_dir: Vec2, accel_mult: f32, dt: f32, arena: &Rect) {
        if self.dead {
            return;
        }
        let dir = try_normalize(move_dir).unwrap_or(Vec2::ZERO);
        self.vel += dir * PLAYER_ACCEL * accel_mult * dt;
        self.vel *= PLAYER_FRICTION.powf(dt);
        self.pos += self.vel * dt;

        let clamped = arena.clamp_point(self.pos, PLAYER_BOUNDS_PAD);
        if clamped.x != self.pos.x {
            self.vel.x = 0.0;
        }
        if clamped.y != self.pos.y {
            self.vel.y = 0.0;
        }
        self.pos = clamped;
    }

    pub fn is_dashing(&self, now_ms: f32) -> bool {
        now_ms < self.dash_until_ms
    }

    /// Dash along `move_dir` (or the aim when idle). Cooldown runs from
    /// the end of the dash.
    pub fn try_dash(&mut self, now_ms: f32, move_dir: Vec2, cooldown_ms: f32) -> bool {
        if self.dead || self.is_dashing(now_ms) || now_ms < self.dash_ready_ms {
            return false;
        }
        let dir = try_normalize(move_dir).unwrap_or_else(|| heading(self.aim));
        self.vel += dir * DASH_IMPULSE;
        self.dash_until_ms = now_ms + DASH_DURATION_MS;
        self.dash_ready_ms = self.dash_until_ms + cooldown_ms;
        true
    }

    /// Enter slow motion; only allowed with a full focus bar
    pub fn activate_focus(&mut self) -> bool {
        if self.dead || self.slow_mo || self.focus < FOCUS_MAX {
            return false;
        }
        self.slow_mo = true;
        true
    }

    /// Drain or regenerate focus for one tick
    pub fn update_focus(&mut self, regen_mult: f32) -> Option<FocusShift> {
        if self.slow_mo {
            self.focus -= FOCUS_DRAIN;
            if self.focus <= 0.0 {
                self.focus = 0.0;
                self.slow_mo = false;
                return Some(FocusShift::Ended);
            }
        } else if self.focus < FOCUS_MAX {
            self.focus = (self.focus + FOCUS_REGEN * regen_mult).min(FOCUS_MAX);
        }
        None
    }

    /// Time-scale for this tick
    pub fn time_scale(&self) -> f32 {
        if self.slow_mo { SLOW_MO_FACTOR } else { 1.0 }
    }

    pub fn shot_ready(&self, now_ms: f32, interval_ms: f32) -> bool {
        self.last_shot_ms.is_none_or(|last| now_ms - last > interval_ms)
    }

    pub fn throw_ready(&self, now_ms: f32) -> bool {
        self.last_throw_ms.is_none_or(|last| now_ms - last >= GRENADE_COOLDOWN_MS)
    }

    /// Equip `kind` with one pickup's worth of ammo
    pub fn set_weapon(&mut self, stats: &WeaponStats) {
        self.weapon = stats.kind;
        self.ammo = stats.ammo_per_pickup;
        self.windup_ms = 0.0;
        self.spin_ms = 0.0;
    }

    /// Top up the held weapon, capped at its carry limit
    pub fn add_ammo(&mut self, stats: &WeaponStats) {
        if let (Some(ammo), Some(per), Some(cap)) = (self.ammo, stats.ammo_per_pickup, stats.max_carry) {
            self.ammo = Some(ammo.saturating_add(per).min(cap));
        }
    }

    /// Spend one round; returns false when the magazine was already empty
    pub fn consume_round(&mut self) -> bool {
        match &mut self.ammo {
            None => true,
            Some(0) => false,
            Some(n) => {
                *n -= 1;
                true
            }
        }
    }

    pub fn out_of_ammo(&self) -> bool {
        self.ammo == Some(0)
    }

    /// Same type tops up; another type replaces
    pub fn set_secondary(&mut self, kind: SecondaryKind) {
        if self.secondary == Some(kind) {
            self.secondary_ammo = (self.secondary_ammo + kind.ammo()).min(kind.max_ammo());
        } else {
            self.secondary = Some(kind);
            self.secondary_ammo = kind.ammo();
        }
    }

    /// Spend one secondary charge, clearing the slot when empty
    pub fn consume_secondary(&mut self) -> Option<SecondaryKind> {
        let kind = self.secondary?;
        if self.secondary_ammo == 0 {
            self.secondary = None;
            return None;
        }
        self.secondary_ammo -= 1;
        if self.secondary_ammo == 0 {
            self.secondary = None;
        }
        Some(kind)
    }

    pub fn heal(&mut self, amount: f32) {
        if self.dead || !amount.is_finite() {
            return;
        }
        self.health = (self.health + amount).clamp(0.0, self.max_health);
    }

    /// Subtract health. Returns true only on the hit that kills.
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        if self.dead || !amount.is_finite() || amount <= 0.0 {
            return false;
        }
        self.health = (self.health - amount).clamp(0.0, self.max_health);
        if self.health <= 0.0 {
            return self.die();
        }
        false
    }

    /// Enter the death transition exactly once
    pub fn die(&mut self) -> bool {
        if self.dead {
            return false;
        }
        self.dead = true;
        self.health = 0.0;
        self.vel = Vec2::ZERO;
        self.slow_mo = false;
        self.firing = false;
        self.lives = self.lives.saturating_sub(1);
        self.death_timer = Some(DEATH_FRAMES);
        true
    }

    /// Count down the death screen delay; true on the tick it elapses
    pub fn tick_death(&mut self, dt: f32) -> bool {
        let Some(timer) = &mut self.death_timer else {
            return false;
        };
        *timer -= dt;
        if *timer <= 0.0 {
            self.death_timer = None;
            return true;
        }
        false
    }

    /// Restore at `pos` with full health and focus and a bare pistol
    pub fn revive(&mut self, pos: Vec2) {
        self.dead = false;
        self.death_timer = None;
        self.pos = pos;
        self.vel = Vec2::ZERO;
        self.health = self.max_health;
        self.focus = FOCUS_MAX;
        self.slow_mo = false;
        self.weapon = WeaponKind::Pistol;
        self.ammo = None;
        self.secondary = None;
        self.secondary_ammo = 0;
        self.windup_ms = 0.0;
        self.spin_ms = 0.0;
        self.firing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::weapons::resolve;

    fn player() -> Player {
        Player::new(Vec2::splat(1500.0), START_LIVES)
    }

    #[test]
    fn test_damage_sequence_and_single_death() {
        let mut p = player();
        let mut seen = vec![p.health];
        for _ in 0..3 {
            assert!(!p.apply_damage(CONTACT_DAMAGE));
            seen.push(p.health);
        }
        assert_eq!(seen, vec![100.0, 90.0, 80.0, 70.0]);
        assert!(!p.dead);

        assert!(p.apply_damage(500.0));
        assert_eq!(p.health, 0.0);
        assert_eq!(p.lives, START_LIVES - 1);
        // Already dead: no second transition
        assert!(!p.apply_damage(10.0));
        assert!(!p.die());
        assert_eq!(p.lives, START_LIVES - 1);
    }

    #[test]
    fn test_dead_player_is_frozen() {
        let mut p = player();
        p.die();
        let arena = Rect::centered(WORLD_SIZE, 800.0);
        p.integrate(Vec2::X, 1.0, 1.0, &arena);
        assert_eq!(p.pos, Vec2::splat(1500.0));
    }

    #[test]
    fn test_death_timer_fires_once() {
        let mut p = player();
        p.die();
        let mut fired = 0;
        for _ in 0..200 {
            if p.tick_death(1.0) {
                fired += 1;
            }
        }
        assert_eq!(fired, 1);
    }

    #[test]
    fn test_bounds_clamp_zeroes_velocity() {
        let arena = Rect::centered(WORLD_SIZE, 800.0);
        let mut p = Player::new(Vec2::new(arena.x + 11.0, 1500.0), 3);
        p.vel = Vec2::new(-20.0, 0.0);
        p.integrate(Vec2::ZERO, 1.0, 1.0, &arena);
        assert_eq!(p.pos.x, arena.x + PLAYER_BOUNDS_PAD);
        assert_eq!(p.vel.x, 0.0);
    }

    #[test]
    fn test_dash_cooldown_counts_from_dash_end() {
        let mut p = player();
        assert!(p.try_dash(0.0, Vec2::ZERO, DASH_COOLDOWN_MS));
        assert!((p.vel.x - DASH_IMPULSE).abs() < 1e-5);
        assert!(!p.try_dash(100.0, Vec2::Y, DASH_COOLDOWN_MS));
        assert!(!p.try_dash(DASH_COOLDOWN_MS, Vec2::Y, DASH_COOLDOWN_MS));
        assert!(p.try_dash(DASH_DURATION_MS + DASH_COOLDOWN_MS, Vec2::Y, DASH_COOLDOWN_MS));
    }

    #[test]
    fn test_focus_requires_full_bar_and_drains() {
        let mut p = player();
        assert!(p.activate_focus());
        assert!(!p.activate_focus());
        let mut ended = false;
        for _ in 0..400 {
            if p.update_focus(1.0) == Some(FocusShift::Ended) {
                ended = true;
                break;
            }
        }
        assert!(ended);
        assert_eq!(p.focus, 0.0);
        assert!(!p.activate_focus());
        p.update_focus(2.0);
        assert!((p.focus - FOCUS_REGEN * 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_ammo_capped_at_carry() {
        let mut p = player();
        let smg = resolve(WeaponKind::Smg, &[], 0.0);
        p.set_weapon(&smg);
        assert_eq!(p.ammo, Some(120));
        for _ in 0..5 {
            p.add_ammo(&smg);
        }
        assert_eq!(p.ammo, Some(360));
    }

    #[test]
    fn test_pistol_never_runs_dry() {
        let mut p = player();
        for _ in 0..1000 {
            assert!(p.consume_round());
        }
        assert!(!p.out_of_ammo());
    }

    #[test]
    fn test_secondary_top_up_and_replace() {
        let mut p = player();
        p.set_secondary(SecondaryKind::Mine);
        p.set_secondary(SecondaryKind::Mine);
        p.set_secondary(SecondaryKind::Mine);
        assert_eq!(p.secondary_ammo, 10);
        p.set_secondary(SecondaryKind::Turret);
        assert_eq!(p.secondary_ammo, 2);
        assert_eq!(p.consume_secondary(), Some(SecondaryKind::Turret));
        assert_eq!(p.consume_secondary(), Some(SecondaryKind::Turret));
        assert_eq!(p.secondary, None);
        assert_eq!(p.consume_secondary(), None);
    }

    #[test]
    fn test_revive_resets_loadout() {
        let mut p = player();
        p.set_weapon(&resolve(WeaponKind::Rocket, &[], 0.0));
        p.set_secondary(SecondaryKind::Cluster);
        p.focus = 10.0;
        p.die();
        p.revive(Vec2::ZERO);
        assert!(!p.dead);
        assert_eq!(p.health, p.max_health);
        assert_eq!(p.focus, FOCUS_MAX);
        assert_eq!(p.weapon, WeaponKind::Pistol);
        assert_eq!(p.ammo, None);
        assert_eq!(p.secondary, None);
    }
}
