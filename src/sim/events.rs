//! Fire-and-forget notifications for audio and UI hosts
//!
//! The simulation pushes events while it runs; the host drains them after
//! each tick. Nothing in the core reads them back.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::enemy::EnemyKind;
use super::pickups::PickupKind;
use super::progression::UniversalUpgrade;
use super::weapons::{SecondaryKind, WeaponKind, WeaponUpgrade};

/// Something the host may want to play, flash or show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Primary weapon fired
    Shot { weapon: WeaponKind },
    /// Grenade or secondary thrown
    Throw { secondary: Option<SecondaryKind> },
    /// Projectile struck an enemy
    EnemyHit { pos: Vec2, damage: f32 },
    /// Tank frontal crit
    Crit { pos: Vec2 },
    /// Boss weak point struck
    WeakPoint { pos: Vec2 },
    /// Enemy removed with credit
    EnemyKilled { kind: EnemyKind, pos: Vec2, weapon: Option<WeaponKind> },
    Explosion { pos: Vec2, big: bool },
    Nuke { pos: Vec2 },
    PickupCollected { kind: PickupKind },
    PlayerHurt { damage: f32 },
    PlayerDied { lives_remaining: u8 },
    Dash,
    SlowMoStarted,
    SlowMoEnded,
    /// Boss telegraphs a charge
    BossCharge,
    /// Boss charge hit the arena wall
    BossImpact { pos: Vec2 },
    /// Boss entered its dying phase
    BossDying { pos: Vec2 },
    EnemySpawned { kind: EnemyKind },
    WaveAdvanced { wave: u32 },
    /// A weapon crossed an XP threshold
    UpgradeOffered { weapon: WeaponKind },
    WeaponUpgradeApplied { upgrade: WeaponUpgrade },
    UniversalUpgradeApplied { upgrade: UniversalUpgrade },
    Respawned,
    GameOver,
    /// A new high score was reached this run
    HighScore { score: u64 },
}
