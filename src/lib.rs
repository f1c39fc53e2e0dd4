//! Arena Survival - a real-time arena combat simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (actors, ordnance, combat, waves, upgrades)
//! - `settings`: Difficulty presets and debug toggles loaded from JSON
//! - `scoreboard`: Score, points and high score tracking
//!
//! Rendering, audio, HUD and input capture live outside this crate and talk
//! to it through `sim::TickInput`, `sim::GameEvent` and `sim::Snapshot`.

pub mod scoreboard;
pub mod settings;
pub mod sim;

pub use scoreboard::Scoreboard;
pub use settings::{Difficulty, Settings, SettingsError};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Game configuration constants
///
/// Durations suffixed `_MS` run on the game clock (16.6 ms per nominal
/// frame); `_TICKS`/`_FRAMES` count nominal frames scaled by slow motion.
pub mod consts {
    /// Game-clock milliseconds per nominal frame
    pub const FRAME_MS: f32 = 16.6;
    /// Hit-stop length after an impactful kill (whole ticks)
    pub const HIT_STOP_TICKS: u32 = 2;

    /// World and arena
    pub const WORLD_SIZE: f32 = 3000.0;
    pub const ARENA_START_SIZE: f32 = 800.0;
    pub const ARENA_GROWTH: f32 = 100.0;
    /// Arena target never exceeds WORLD_SIZE - ARENA_MARGIN
    pub const ARENA_MARGIN: f32 = 200.0;
    /// Arena edge growth per frame while below target
    pub const ARENA_EASE: f32 = 2.0;
    /// Wave from which the arena jumps to its ceiling
    pub const ARENA_FULL_WAVE: u32 = 10;

    /// Wave progression
    pub const KILLS_PER_WAVE: u64 = 35;
    pub const SPAWN_INTERVAL_MS: f32 = 1100.0;
    pub const SPAWN_INTERVAL_STEP_MS: f32 = 25.0;
    pub const SPAWN_INTERVAL_FLOOR_MS: f32 = 150.0;

    /// Player movement
    pub const PLAYER_RADIUS: f32 = 15.0;
    pub const PLAYER_ACCEL: f32 = 0.45;
    pub const PLAYER_FRICTION: f32 = 0.87;
    pub const PLAYER_BOUNDS_PAD: f32 = 10.0;
    pub const PLAYER_MAX_HEALTH: f32 = 100.0;
    pub const START_LIVES: u8 = 3;
    pub const DEATH_FRAMES: f32 = 120.0;
    pub const RESPAWN_CLEAR_RADIUS: f32 = 350.0;

    /// Dash
    pub const DASH_COOLDOWN_MS: f32 = 7500.0;
    pub const DASH_DURATION_MS: f32 = 150.0;
    pub const DASH_IMPULSE: f32 = 12.0;

    /// Default grenade / secondary cooldown
    pub const GRENADE_COOLDOWN_MS: f32 = 3000.0;
    pub const THROW_RECOIL: f32 = 12.0;

    /// Focus / slow motion
    pub const SLOW_MO_FACTOR: f32 = 0.2;
    pub const FOCUS_MAX: f32 = 100.0;
    pub const FOCUS_DRAIN: f32 = 0.3;
    pub const FOCUS_REGEN: f32 = 0.08;

    /// Combat
    pub const CONTACT_DAMAGE: f32 = 10.0;
    pub const BULLET_HIT_PAD: f32 = 10.0;
    pub const TANK_AGGRO_FRAMES: f32 = 900.0;
    pub const TANK_CRIT_MULT: f32 = 5.0;
    pub const BOSS_WEAK_POINT_MULT: f32 = 3.0;
    pub const BOSS_WEAK_POINT_ARC: f32 = 2.0;
    pub const RAILGUN_BOSS_FRACTION: f32 = 1.0 / 38.0;
    pub const SUPER_DAMAGE: f32 = 999_999.0;

    /// Explosions
    pub const EXPLOSION_RADIUS: f32 = 150.0;
    pub const BIG_EXPLOSION_RADIUS: f32 = 250.0;
    pub const EXPLOSION_DAMAGE: f32 = 30.0;
    pub const BIG_EXPLOSION_DAMAGE: f32 = 60.0;
    pub const EXPLOSION_FORCE: f32 = 30.0;
    pub const BOSS_KNOCKBACK_FRACTION: f32 = 0.05;

    /// Nuke
    pub const NUKE_RADIUS: f32 = 800.0;
    pub const NUKE_BOSS_FRACTION: f32 = 1.0 / 7.0;
    pub const NUKE_MIN_WAVE: u32 = 10;
    pub const NUKE_RESPAWN_MS: f32 = 45_000.0;
    pub const NUKE_SPAWN_CHANCE: f64 = 0.0001;

    /// Boss death
    pub const BOSS_DYING_MS: f32 = 2500.0;
    pub const BOSS_FRAGMENT_COUNT: usize = 6;

    /// Pickups
    pub const PICKUP_RADIUS: f32 = 25.0;
    pub const PICKUP_TTL_FRAMES: f32 = 1380.0;
    pub const NUKE_TTL_FRAMES: f32 = 3000.0;
    pub const MEDIKIT_HEAL: f32 = 25.0;

    /// Progression
    pub const XP_THRESHOLDS: [u32; 3] = [30, 100, 500];
    pub const MAX_WEAPON_LEVEL: u8 = 3;
    pub const OFFER_SIZE: usize = 3;

    /// Cosmetics
    pub const MAX_PARTICLES: usize = 200;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    // rem_euclid may round up to TAU for tiny negative inputs
    if wrapped >= PI { -PI } else { wrapped }
}

/// Sign of `x`, with zero mapping to zero
#[inline]
pub fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Unit vector pointing along `angle`
#[inline]
pub fn heading(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Angle of the ray from `from` to `to`
#[inline]
pub fn angle_to(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Normalize `v`, or `None` if it is zero-length or not finite
#[inline]
pub fn try_normalize(v: Vec2) -> Option<Vec2> {
    let len = v.length();
    if len > 0.0 && len.is_finite() {
        Some(v / len)
    } else {
        None
    }
}

/// Axis-aligned rectangle in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    /// Square of side `size` centered in a world of side `world`
    pub fn centered(world: f32, size: f32) -> Self {
        Self {
            x: (world - size) / 2.0,
            y: (world - size) / 2.0,
            w: size,
            h: size,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    /// Clamp a point inside the rectangle, shrunk by `pad` on every side
    pub fn clamp_point(&self, p: Vec2, pad: f32) -> Vec2 {
        Vec2::new(
            p.x.clamp(self.x + pad, self.x + self.w - pad),
            p.y.clamp(self.y + pad, self.y + self.h - pad),
        )
    }

    /// True if `p` lies within `pad` of any edge (or outside)
    pub fn near_edge(&self, p: Vec2, pad: f32) -> bool {
        p.x < self.x + pad
            || p.x > self.x + self.w - pad
            || p.y < self.y + pad
            || p.y > self.y + self.h - pad
    }
}
