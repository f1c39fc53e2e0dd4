//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One tick per frame, scaled only by slow motion
//! - Seeded RNG only
//! - Stable iteration order (spawn order), removals deferred to a sweep
//! - No rendering, audio or platform dependencies

pub mod combat;
pub mod effects;
pub mod enemy;
pub mod events;
pub mod ordnance;
pub mod pickups;
pub mod player;
pub mod progression;
pub mod state;
pub mod tick;
pub mod waves;
pub mod weapons;

pub use combat::{ExplosionSpec, create_explosion, detonate_nuke, explosion_falloff, kill_enemy};
pub use enemy::{Behavior, Enemy, EnemyKind};
pub use events::GameEvent;
pub use ordnance::{Bullet, Grenade, Mine, Payload, Turret};
pub use pickups::{Pickup, PickupKind};
pub use player::Player;
pub use progression::{Progression, UniversalUpgrade, UpgradeOffer};
pub use state::{GameState, Phase, RunOutcome, Snapshot};
pub use tick::{StopReason, TickInput, TickResult, autopick_upgrade, autopilot, tick};
pub use waves::WaveState;
pub use weapons::{Pierce, SecondaryKind, WeaponKind, WeaponStats, WeaponUpgrade, resolve};
