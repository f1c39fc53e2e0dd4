//! Wave director: kill-driven escalation, batch spawns and arena growth

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::enemy::EnemyKind;
use crate::Rect;
use crate::consts::*;

/// Wave counter, kill tally, arena and spawn timers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveState {
    pub wave: u32,
    pub kills: u64,
    pub arena: Rect,
    /// Side length the arena eases toward
    pub target_size: f32,
    /// Game-clock ms since the last background spawn
    pub since_spawn_ms: f32,
    /// Game-clock ms of the last nuke pickup spawn
    pub last_nuke_ms: Option<f32>,
}

impl Default for WaveState {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveState {
    pub fn new() -> Self {
        Self {
            wave: 1,
            kills: 0,
            arena: Rect::centered(WORLD_SIZE, ARENA_START_SIZE),
            target_size: ARENA_START_SIZE,
            since_spawn_ms: 0.0,
            last_nuke_ms: None,
        }
    }

    /// Arena side length targeted at `wave`
    pub fn target_for_wave(wave: u32) -> f32 {
        let ceiling = WORLD_SIZE - ARENA_MARGIN;
        if wave >= ARENA_FULL_WAVE {
            return ceiling;
        }
        (ARENA_START_SIZE + wave.saturating_sub(1) as f32 * ARENA_GROWTH).min(ceiling)
    }

    /// Count a kill; returns the new wave number when it advances
    pub fn record_kill(&mut self) -> Option<u32> {
        self.kills += 1;
        if self.kills % KILLS_PER_WAVE != 0 {
            return None;
        }
        self.wave += 1;
        self.target_size = Self::target_for_wave(self.wave);
        log::info!("Wave {} reached ({} kills)", self.wave, self.kills);
        Some(self.wave)
    }

    /// Grow the arena toward its target, keeping it centered
    pub fn ease_arena(&mut self, dt: f32) {
        if self.arena.w < self.target_size {
            let size = (self.arena.w + ARENA_EASE * dt).min(self.target_size);
            self.arena = Rect::centered(WORLD_SIZE, size);
        }
    }

    /// Fixed batch spawned on reaching `wave`
    pub fn batch_for(wave: u32) -> Vec<(EnemyKind, usize)> {
        let mut batch = Vec::new();
        if wave == 10 {
            batch.push((EnemyKind::Flanker, 5));
        }
        if wave == 15 {
            batch.push((EnemyKind::Blind, 6));
        }
        if wave >= 20 && wave % 10 == 0 {
            batch.push((EnemyKind::Boss, 1));
        }
        if wave >= 25 && (wave - 5) % 10 == 0 {
            batch.push((EnemyKind::Tank, 3));
            batch.push((EnemyKind::Flanker, 5));
            batch.push((EnemyKind::Blind, 5));
        }
        batch
    }

    /// Background spawn interval, scaled by difficulty
    pub fn spawn_interval_ms(&self, scale: f32) -> f32 {
        let base = (SPAWN_INTERVAL_MS - self.wave as f32 * SPAWN_INTERVAL_STEP_MS).max(SPAWN_INTERVAL_FLOOR_MS);
        base * scale
    }

    /// Advance the spawn timer; true when a background spawn is due
    pub fn tick_spawn(&mut self, elapsed_ms: f32, scale: f32) -> bool {
        self.since_spawn_ms += elapsed_ms;
        if self.since_spawn_ms > self.spawn_interval_ms(scale) {
            self.since_spawn_ms = 0.0;
            return true;
        }
        false
    }

    /// Kinds for one background spawn
    pub fn roll_spawn<R: Rng>(&self, rng: &mut R) -> Vec<EnemyKind> {
        if self.wave == 5 && rng.random::<f32>() < 0.2 {
            return vec![EnemyKind::Flanker; 3];
        }
        vec![EnemyKind::roll(self.wave, rng)]
    }

    /// Roll for a nuke pickup this tick
    pub fn nuke_due<R: Rng>(&mut self, now_ms: f32, nuke_in_play: bool, rng: &mut R) -> bool {
        if self.wave < NUKE_MIN_WAVE || nuke_in_play {
            return false;
        }
        if self.last_nuke_ms.is_some_and(|last| now_ms - last <= NUKE_RESPAWN_MS) {
            return false;
        }
        if !rng.random_bool(NUKE_SPAWN_CHANCE) {
            return false;
        }
        self.last_nuke_ms = Some(now_ms);
        true
    }
}
