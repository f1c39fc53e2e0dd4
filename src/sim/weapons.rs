//! Weapon tables and the upgrade modifier resolver
//!
//! `resolve` turns (base weapon, held upgrades, global ammo bonus) into the
//! effective stat record used for firing. It is pure: no state, no RNG.
//! Behavioral upgrades (pierce count, splinters, explosion shape, tesla,
//! spin-up, hot battery) are not baked in; fire and combat code read the
//! upgrade set directly for those.

use serde::{Deserialize, Serialize};

/// Primary weapons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeaponKind {
    Pistol,
    Smg,
    Shotgun,
    Minigun,
    Rocket,
    Railgun,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 6] = [
        WeaponKind::Pistol,
        WeaponKind::Smg,
        WeaponKind::Shotgun,
        WeaponKind::Minigun,
        WeaponKind::Rocket,
        WeaponKind::Railgun,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WeaponKind::Pistol => "PISTOL",
            WeaponKind::Smg => "SMG",
            WeaponKind::Shotgun => "SHOTGUN",
            WeaponKind::Minigun => "MINIGUN",
            WeaponKind::Rocket => "ROCKET",
            WeaponKind::Railgun => "RAILGUN",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pistol" => Some(WeaponKind::Pistol),
            "smg" => Some(WeaponKind::Smg),
            "shotgun" => Some(WeaponKind::Shotgun),
            "minigun" => Some(WeaponKind::Minigun),
            "rocket" => Some(WeaponKind::Rocket),
            "railgun" => Some(WeaponKind::Railgun),
            _ => None,
        }
    }

    /// Upgrades this weapon can roll; empty for the pistol
    pub fn upgrade_pool(&self) -> &'static [WeaponUpgrade] {
        use WeaponUpgrade::*;
        match self {
            WeaponKind::Pistol => &[],
            WeaponKind::Smg => &[SmgHeavyCaliber, SmgApJacket, SmgMicroMunitions],
            WeaponKind::Shotgun => &[
                ShotgunDoubleBarrels,
                ShotgunJackhammer,
                ShotgunElephantShot,
            ],
            WeaponKind::Minigun => &[MinigunSplinterBullets, MinigunSuperSpin, MinigunWalkingTank],
            WeaponKind::Rocket => &[RocketShrapnel, RocketHighExplosives, RocketClusterRockets],
            WeaponKind::Railgun => &[RailgunTungstenDart, RailgunHotBattery, RailgunTeslaArc],
        }
    }

    pub fn has_progression(&self) -> bool {
        !self.upgrade_pool().is_empty()
    }
}

/// Per-weapon upgrade ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponUpgrade {
    SmgHeavyCaliber,
    SmgApJacket,
    SmgMicroMunitions,
    ShotgunDoubleBarrels,
    ShotgunJackhammer,
    ShotgunElephantShot,
    MinigunSplinterBullets,
    MinigunSuperSpin,
    MinigunWalkingTank,
    RocketShrapnel,
    RocketHighExplosives,
    RocketClusterRockets,
    RailgunTungstenDart,
    RailgunHotBattery,
    RailgunTeslaArc,
}

impl WeaponUpgrade {
    pub fn weapon(&self) -> WeaponKind {
        use WeaponUpgrade::*;
        match self {
            SmgHeavyCaliber | SmgApJacket | SmgMicroMunitions => WeaponKind::Smg,
            ShotgunDoubleBarrels | ShotgunJackhammer | ShotgunElephantShot => WeaponKind::Shotgun,
            MinigunSplinterBullets | MinigunSuperSpin | MinigunWalkingTank => WeaponKind::Minigun,
            RocketShrapnel | RocketHighExplosives | RocketClusterRockets => WeaponKind::Rocket,
            RailgunTungstenDart | RailgunHotBattery | RailgunTeslaArc => WeaponKind::Railgun,
        }
    }

    pub fn name(&self) -> &'static str {
        use WeaponUpgrade::*;
        match self {
            SmgHeavyCaliber => "Heavy Caliber",
            SmgApJacket => "AP Jacket",
            SmgMicroMunitions => "Micro-Munitions",
            ShotgunDoubleBarrels => "Double Barrels",
            ShotgunJackhammer => "Jackhammer",
            ShotgunElephantShot => "Elephant Shot",
            MinigunSplinterBullets => "Splinter Bullets",
            MinigunSuperSpin => "Super Spin",
            MinigunWalkingTank => "Walking Tank",
            RocketShrapnel => "Shrapnel",
            RocketHighExplosives => "High Explosives",
            RocketClusterRockets => "Cluster Rockets",
            RailgunTungstenDart => "Tungsten Dart",
            RailgunHotBattery => "Hot Battery",
            RailgunTeslaArc => "Tesla-Arc",
        }
    }

    pub fn description(&self) -> &'static str {
        use WeaponUpgrade::*;
        match self {
            SmgHeavyCaliber => "+75% Damage, +100% Range, -50% Fire Rate.",
            SmgApJacket => "Bullets pierce through 1 enemy.",
            SmgMicroMunitions => "Every 10th bullet fired is a small explosive round.",
            ShotgunDoubleBarrels => "Fires 2x the amount of pellets. Spread increased by 100%.",
            ShotgunJackhammer => "+100% fire rate, +50% ammo from box, +50% max ammo.",
            ShotgunElephantShot => "+100% damage, +100% knockback, +20% recoil.",
            MinigunSplinterBullets => "Bullets split into 3 on hit, each dealing 30% damage.",
            MinigunSuperSpin => "1s spin-up. +100% ammo. Fire rate ramps to 400% over 5s.",
            MinigunWalkingTank => "When firing: -50% movement, no recoil, -80% received damage.",
            RocketShrapnel => "Explosions launch 10 shotgun pellets in all directions.",
            RocketHighExplosives => "Double effective range. -30% fire rate.",
            RocketClusterRockets => "Explosion sends 3 minirockets forward with spread.",
            RailgunTungstenDart => "Infinite penetration. Damage drops 10% per hit (min 10%).",
            RailgunHotBattery => "+180% fire rate at full ammo, drops to +1% at 1 ammo.",
            RailgunTeslaArc => "Shots zap nearby enemies, stunning them for 3s. Boss immune.",
        }
    }
}

/// How many enemies a projectile may pass through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pierce {
    None,
    /// Consumed once this many enemies have been struck
    Limited(u32),
    Unlimited,
}

impl Pierce {
    pub fn pierces(&self) -> bool {
        !matches!(self, Pierce::None)
    }
}

/// Effective stat record for a weapon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponStats {
    pub kind: WeaponKind,
    pub tier: u8,
    pub damage: f32,
    /// Minimum game-clock milliseconds between shots
    pub fire_interval_ms: f32,
    pub speed: f32,
    /// Total spread cone (radians)
    pub spread: f32,
    pub pellets: u32,
    pub recoil: f32,
    /// Rounds granted per pickup; `None` is unlimited
    pub ammo_per_pickup: Option<u32>,
    /// Carry cap; `None` is unlimited
    pub max_carry: Option<u32>,
    pub knockback_mult: f32,
    pub explosion_range_mult: f32,
    pub explosive: bool,
    pub pierce: bool,
}

/// Base table before upgrades
pub fn base_stats(kind: WeaponKind) -> WeaponStats {
    let (tier, damage, rate, speed, spread, pellets, recoil, ammo, carry) = match kind {
        WeaponKind::Pistol => (1, 2.0, 400.0, 12.0, 0.02, 1, 0.5, None, None),
        WeaponKind::Smg => (1, 1.8, 110.0, 13.0, 0.15, 1, 0.3, Some(120), Some(360)),
        WeaponKind::Shotgun => (1, 2.0, 1500.0, 11.0, 0.35, 7, 4.0, Some(24), Some(72)),
        WeaponKind::Minigun => (2, 2.7, 55.0, 14.0, 0.15, 1, 0.8, Some(300), Some(900)),
        WeaponKind::Rocket => (2, 20.0, 1200.0, 8.0, 0.0, 1, 6.0, Some(12), Some(36)),
        WeaponKind::Railgun => (3, 50.0, 2400.0, 30.0, 0.0, 1, 0.0, Some(12), Some(36)),
    };
    WeaponStats {
        kind,
        tier,
        damage,
        fire_interval_ms: rate,
        speed,
        spread,
        pellets,
        recoil,
        ammo_per_pickup: ammo,
        max_carry: carry,
        knockback_mult: 1.0,
        explosion_range_mult: 1.0,
        explosive: kind == WeaponKind::Rocket,
        pierce: kind == WeaponKind::Railgun,
    }
}

/// Resolve effective stats for `kind` given its held upgrades and the
/// player-wide ammo bonus (percent).
pub fn resolve(kind: WeaponKind, upgrades: &[WeaponUpgrade], ammo_bonus_percent: f32) -> WeaponStats {
    let mut stats = base_stats(kind);
    let mut ammo_mult = 1.0_f32;

    for up in upgrades {
        // Upgrades for other weapons never apply
        if up.weapon() != kind {
            continue;
        }
        match up {
            WeaponUpgrade::SmgHeavyCaliber => {
                stats.damage *= 1.75;
                stats.fire_interval_ms *= 1.5;
            }
            WeaponUpgrade::SmgApJacket => stats.pierce = true,
            WeaponUpgrade::ShotgunDoubleBarrels => {
                stats.pellets *= 2;
                stats.spread *= 2.0;
            }
            WeaponUpgrade::ShotgunJackhammer => {
                stats.fire_interval_ms *= 0.5;
                ammo_mult *= 1.5;
            }
            WeaponUpgrade::ShotgunElephantShot => {
                stats.damage *= 2.0;
                stats.knockback_mult *= 2.0;
                stats.recoil *= 1.2;
            }
            WeaponUpgrade::MinigunSuperSpin => ammo_mult *= 2.0,
            WeaponUpgrade::RocketHighExplosives => {
                stats.explosion_range_mult *= 2.0;
                stats.fire_interval_ms *= 1.3;
            }
            _ => {}
        }
    }

    if ammo_bonus_percent.is_finite() && ammo_bonus_percent > 0.0 {
        ammo_mult *= 1.0 + ammo_bonus_percent / 100.0;
    }
    stats.ammo_per_pickup = stats.ammo_per_pickup.map(|a| scale_rounds(a, ammo_mult));
    stats.max_carry = stats.max_carry.map(|a| scale_rounds(a, ammo_mult));
    stats
}

fn scale_rounds(rounds: u32, mult: f32) -> u32 {
    (rounds as f32 * mult).round() as u32
}

/// Secondary devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecondaryKind {
    Mine,
    Turret,
    Cluster,
}

impl SecondaryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecondaryKind::Mine => "MINE",
            SecondaryKind::Turret => "SENTRY",
            SecondaryKind::Cluster => "CLUSTER",
        }
    }

    /// Rounds granted per pickup
    pub fn ammo(&self) -> u32 {
        match self {
            SecondaryKind::Mine => 5,
            SecondaryKind::Turret => 2,
            SecondaryKind::Cluster => 8,
        }
    }

    pub fn max_ammo(&self) -> u32 {
        match self {
            SecondaryKind::Mine => 10,
            SecondaryKind::Turret => 4,
            SecondaryKind::Cluster => 16,
        }
    }
}
