//! Weapon XP, threshold upgrade offers and player-wide upgrades

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::player::Player;
use super::weapons::{WeaponKind, WeaponUpgrade};
use crate::consts::*;

/// Player-wide upgrades offered alongside weapon upgrades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UniversalUpgrade {
    /// +20 max health, heals 20
    Vitality,
    /// +25% ammo from pickups and carry caps
    AmmoBelt,
    /// Dash cooldown x0.6
    QuickStep,
    /// Focus regenerates twice as fast
    DeepFocus,
    /// +1 life; requires Vitality
    SecondWind,
}

impl UniversalUpgrade {
    pub const ALL: [UniversalUpgrade; 5] = [
        UniversalUpgrade::Vitality,
        UniversalUpgrade::AmmoBelt,
        UniversalUpgrade::QuickStep,
        UniversalUpgrade::DeepFocus,
        UniversalUpgrade::SecondWind,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            UniversalUpgrade::Vitality => "Vitality",
            UniversalUpgrade::AmmoBelt => "Ammo Belt",
            UniversalUpgrade::QuickStep => "Quick Step",
            UniversalUpgrade::DeepFocus => "Deep Focus",
            UniversalUpgrade::SecondWind => "Second Wind",
        }
    }

    pub fn stackable(&self) -> bool {
        matches!(self, UniversalUpgrade::Vitality | UniversalUpgrade::AmmoBelt)
    }

    pub fn requires(&self) -> Option<UniversalUpgrade> {
        match self {
            UniversalUpgrade::SecondWind => Some(UniversalUpgrade::Vitality),
            _ => None,
        }
    }

    /// Can this be taken given what is already held
    pub fn eligible(&self, held: &[UniversalUpgrade]) -> bool {
        if !self.stackable() && held.contains(self) {
            return false;
        }
        self.requires().is_none_or(|req| held.contains(&req))
    }
}

/// Apply a universal upgrade to the player; false if not eligible
pub fn apply_universal(player: &mut Player, upgrade: UniversalUpgrade) -> bool {
    if !upgrade.eligible(&player.universal) {
        return false;
    }
    player.universal.push(upgrade);
    match upgrade {
        UniversalUpgrade::Vitality => {
            player.max_health += 20.0;
            player.heal(20.0);
        }
        UniversalUpgrade::AmmoBelt => player.ammo_bonus += 25.0,
        UniversalUpgrade::SecondWind => player.lives = player.lives.saturating_add(1),
        UniversalUpgrade::QuickStep | UniversalUpgrade::DeepFocus => {}
    }
    true
}

pub fn dash_cooldown_ms(player: &Player) -> f32 {
    if player.has_universal(UniversalUpgrade::QuickStep) {
        DASH_COOLDOWN_MS * 0.6
    } else {
        DASH_COOLDOWN_MS
    }
}

pub fn focus_regen_mult(player: &Player) -> f32 {
    if player.has_universal(UniversalUpgrade::DeepFocus) { 2.0 } else { 1.0 }
}

/// Per-weapon XP and taken upgrades
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeaponProgress {
    pub xp: u32,
    pub level: u8,
    pub upgrades: Vec<WeaponUpgrade>,
}

impl WeaponProgress {
    /// XP needed for the next level, if any
    pub fn next_threshold(&self) -> Option<u32> {
        XP_THRESHOLDS.get(self.level as usize).copied()
    }

    /// Upgrades for `kind` not yet taken
    pub fn available(&self, kind: WeaponKind) -> Vec<WeaponUpgrade> {
        kind.upgrade_pool()
            .iter()
            .copied()
            .filter(|u| !self.upgrades.contains(u))
            .collect()
    }

    pub fn ready_to_level(&self, kind: WeaponKind) -> bool {
        self.level < MAX_WEAPON_LEVEL
            && self.next_threshold().is_some_and(|t| self.xp >= t)
            && !self.available(kind).is_empty()
    }

    /// Take `upgrade`; repeats and maxed weapons are a no-op
    pub fn apply(&mut self, upgrade: WeaponUpgrade) -> bool {
        if self.level >= MAX_WEAPON_LEVEL || self.upgrades.contains(&upgrade) {
            return false;
        }
        self.upgrades.push(upgrade);
        self.level += 1;
        true
    }
}

/// A pending pause-and-choose interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeOffer {
    pub weapon: WeaponKind,
    pub weapon_choices: Vec<WeaponUpgrade>,
    pub universal_choices: Vec<UniversalUpgrade>,
    pub weapon_pick: Option<WeaponUpgrade>,
    pub universal_pick: Option<UniversalUpgrade>,
}

impl UpgradeOffer {
    /// Both lists satisfied (an empty list needs no pick)
    pub fn is_complete(&self) -> bool {
        (self.weapon_choices.is_empty() || self.weapon_pick.is_some())
            && (self.universal_choices.is_empty() || self.universal_pick.is_some())
    }
}

/// Draw up to `n` distinct items from `pool` without replacement
fn sample<T: Copy, R: Rng>(rng: &mut R, mut pool: Vec<T>, n: usize) -> Vec<T> {
    let mut picks = Vec::with_capacity(n.min(pool.len()));
    while !pool.is_empty() && picks.len() < n {
        let idx = rng.random_range(0..pool.len());
        picks.push(pool.swap_remove(idx));
    }
    picks
}

/// All progression tables plus the pending offer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Progression {
    pub weapons: BTreeMap<WeaponKind, WeaponProgress>,
    pub offer: Option<UpgradeOffer>,
}

impl Progression {
    pub fn new() -> Self {
        let weapons = WeaponKind::ALL
            .iter()
            .filter(|w| w.has_progression())
            .map(|w| (*w, WeaponProgress::default()))
            .collect();
        Self { weapons, offer: None }
    }

    pub fn progress(&self, kind: WeaponKind) -> Option<&WeaponProgress> {
        self.weapons.get(&kind)
    }

    /// Upgrades held for `kind` (empty for weapons without progression)
    pub fn upgrades_for(&self, kind: WeaponKind) -> &[WeaponUpgrade] {
        self.weapons.get(&kind).map(|p| p.upgrades.as_slice()).unwrap_or(&[])
    }

    pub fn has(&self, upgrade: WeaponUpgrade) -> bool {
        self.upgrades_for(upgrade.weapon()).contains(&upgrade)
    }

    /// One XP for a credited kill
    pub fn credit_kill(&mut self, kind: WeaponKind) -> bool {
        match self.weapons.get_mut(&kind) {
            Some(p) => {
                p.xp = p.xp.saturating_add(1);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.offer.is_some()
    }

    /// Open an offer for `kind` if it crossed a threshold and nothing is pending
    pub fn try_offer<R: Rng>(&mut self, kind: WeaponKind, held: &[UniversalUpgrade], rng: &mut R) -> bool {
        if self.offer.is_some() {
            return false;
        }
        let Some(progress) = self.weapons.get(&kind) else {
            return false;
        };
        if !progress.ready_to_level(kind) {
            return false;
        }
        let weapon_choices = sample(rng, progress.available(kind), OFFER_SIZE);
        let universal_pool = UniversalUpgrade::ALL
            .iter()
            .copied()
            .filter(|u| u.eligible(held))
            .collect();
        let universal_choices = sample(rng, universal_pool, OFFER_SIZE);
        log::info!(
            "Upgrade offer for {}: {} weapon, {} universal choices",
            kind.as_str(),
            weapon_choices.len(),
            universal_choices.len()
        );
        self.offer = Some(UpgradeOffer {
            weapon: kind,
            weapon_choices,
            universal_choices,
            weapon_pick: None,
            universal_pick: None,
        });
        true
    }

    /// Re-check every weapon for a threshold crossed while an offer was open
    pub fn check_pending<R: Rng>(&mut self, held: &[UniversalUpgrade], rng: &mut R) -> Option<WeaponKind> {
        let ready = self
            .weapons
            .iter()
            .find(|(kind, p)| p.ready_to_level(**kind))
            .map(|(kind, _)| *kind)?;
        self.try_offer(ready, held, rng).then_some(ready)
    }

    /// Take a weapon upgrade from the open offer
    pub fn choose_weapon(&mut self, upgrade: WeaponUpgrade) -> bool {
        let Some(offer) = &mut self.offer else {
            return false;
        };
        if offer.weapon_pick.is_some() || !offer.weapon_choices.contains(&upgrade) {
            return false;
        }
        let Some(progress) = self.weapons.get_mut(&offer.weapon) else {
            return false;
        };
        if !progress.apply(upgrade) {
            return false;
        }
        offer.weapon_pick = Some(upgrade);
        true
    }

    /// Take a universal upgrade from the open offer
    pub fn choose_universal(&mut self, upgrade: UniversalUpgrade, player: &mut Player) -> bool {
        let Some(offer) = &mut self.offer else {
            return false;
        };
        if offer.universal_pick.is_some() || !offer.universal_choices.contains(&upgrade) {
            return false;
        }
        if !apply_universal(player, upgrade) {
            return false;
        }
        offer.universal_pick = Some(upgrade);
        true
    }

    /// Close the offer once both lists are satisfied
    pub fn take_completed(&mut self) -> Option<UpgradeOffer> {
        if self.offer.as_ref().is_some_and(UpgradeOffer::is_complete) {
            self.offer.take()
        } else {
            None
        }
    }
}
