//! Enemy actors and their behavior state machines
//!
//! Each archetype owns its state inside `Behavior`; `Enemy::think` dispatches
//! to one handler per variant. Handlers only move the enemy itself. Anything
//! that touches other entities (charge sweeps, explosions, finalization) is
//! returned as an `EnemyAction` for the tick to apply.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::{Rect, angle_to, heading, normalize_angle, sign, try_normalize};

/// Enemy archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Zombie,
    Flanker,
    Blind,
    Tank,
    Boss,
}

impl EnemyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyKind::Zombie => "zombie",
            EnemyKind::Flanker => "flanker",
            EnemyKind::Blind => "blind",
            EnemyKind::Tank => "tank",
            EnemyKind::Boss => "boss",
        }
    }

    /// Pick a regular spawn for the current wave
    pub fn roll<R: Rng>(wave: u32, rng: &mut R) -> Self {
        let r: f32 = rng.random();
        match wave {
            0..5 => EnemyKind::Zombie,
            5..10 => {
                if r < 0.1 {
                    EnemyKind::Tank
                } else {
                    EnemyKind::Zombie
                }
            }
            10..15 => {
                if r < 0.2 {
                    EnemyKind::Flanker
                } else if r < 0.3 {
                    EnemyKind::Tank
                } else {
                    EnemyKind::Zombie
                }
            }
            _ => {
                if r < 0.4 {
                    EnemyKind::Zombie
                } else if r < 0.6 {
                    EnemyKind::Flanker
                } else if r < 0.8 {
                    EnemyKind::Blind
                } else {
                    EnemyKind::Tank
                }
            }
        }
    }

    /// Points awarded on kill
    pub fn points(&self) -> u64 {
        match self {
            EnemyKind::Flanker | EnemyKind::Tank => 3,
            EnemyKind::Boss => 500,
            _ => 1,
        }
    }

    /// Gibs spawned on kill
    pub fn debris_count(&self) -> usize {
        match self {
            EnemyKind::Tank => 12,
            _ => 5,
        }
    }

    /// Palette index for gibs
    pub fn color(&self) -> u32 {
        match self {
            EnemyKind::Zombie => 10,
            EnemyKind::Flanker => 11,
            EnemyKind::Blind => 12,
            EnemyKind::Tank => 13,
            EnemyKind::Boss => 14,
        }
    }
}

/// Tank moods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TankMood {
    Stroll,
    Idle,
    Aggro,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TankBrain {
    pub mood: TankMood,
    /// Frames left in stroll/idle
    pub timer: f32,
    /// Frames left in aggro
    pub aggro_time: f32,
}

impl TankBrain {
    /// Any damage forces aggro with a fresh timer
    pub fn provoke(&mut self) {
        self.mood = TankMood::Aggro;
        self.aggro_time = TANK_AGGRO_FRAMES;
    }
}

/// Boss phases; `Dying` is the delayed second death phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossPhase {
    Chase,
    ChargePrep,
    Charge,
    Dying,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossBrain {
    pub phase: BossPhase,
    /// Frames spent in the current phase
    pub timer: f32,
    pub charge_dir: Vec2,
    /// Chase frames before the next charge
    pub charge_cooldown: f32,
    /// Game-clock ms since dying began
    pub dying_ms: f32,
}

/// Charge telegraph length (frames)
pub const BOSS_PREP_FRAMES: f32 = 120.0;
/// Longest possible charge (frames)
pub const BOSS_CHARGE_FRAMES: f32 = 90.0;
pub const BOSS_CHARGE_SPEED: f32 = 11.0;

/// Per-archetype state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Behavior {
    Zombie,
    /// Circles in; `handedness` is +1 or -1
    Flanker { handedness: f32 },
    Blind,
    Tank(TankBrain),
    Boss(BossBrain),
}

/// Side effects an enemy requests from the tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnemyAction {
    /// Boss finished its telegraph and is about to charge
    ChargeWindup,
    /// Boss is mid-charge; sweep whatever it overlaps
    ChargeSweep,
    /// Boss charge left the arena and was clamped back
    WallSlam { at: Vec2 },
    /// Small explosion while the boss is dying
    DyingBlast { at: Vec2 },
    /// Dying timer elapsed
    Finalize,
}

/// Read-only inputs for one AI step
#[derive(Debug, Clone, Copy)]
pub struct AiContext {
    pub player_pos: Vec2,
    pub arena: Rect,
    /// Last place the player made noise (blind enemies hunt it)
    pub noise: Option<Vec2>,
    /// Frame-scaled delta
    pub dt: f32,
    /// Game-clock ms this tick
    pub elapsed_ms: f32,
}

/// An enemy actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    pub radius: f32,
    pub speed: f32,
    pub facing: f32,
    pub behavior: Behavior,
    /// Killed and awaiting removal; never hit-tested again
    pub dead: bool,
    /// Frames of tesla stun left
    #[serde(default)]
    pub stun: f32,
}

impl Enemy {
    /// Build an enemy of `kind` just outside a random arena edge
    pub fn spawn<R: Rng>(id: u32, kind: EnemyKind, arena: &Rect, wave: u32, rng: &mut R) -> Self {
        let spawn_dist = if kind == EnemyKind::Boss { 200.0 } else { 40.0 };
        let pos = if rng.random_bool(0.5) {
            let x = arena.x + rng.random::<f32>() * arena.w;
            let y = if rng.random_bool(0.5) {
                arena.y - spawn_dist
            } else {
                arena.y + arena.h + spawn_dist
            };
            Vec2::new(x, y)
        } else {
            let x = if rng.random_bool(0.5) {
                arena.x - spawn_dist
            } else {
                arena.x + arena.w + spawn_dist
            };
            Vec2::new(x, arena.y + rng.random::<f32>() * arena.h)
        };
        Self::new(id, kind, pos, wave, rng)
    }

    /// Build an enemy of `kind` at `pos`
    pub fn new<R: Rng>(id: u32, kind: EnemyKind, pos: Vec2, wave: u32, rng: &mut R) -> Self {
        let w = wave as f32;
        let mut facing = 0.0;
        let (hp, speed, radius, behavior) = match kind {
            EnemyKind::Zombie => {
                let wave_scale = 1.0 + (w * 0.02).min(0.6);
                let speed = (0.5 + rng.random::<f32>() * 0.5) * 0.8 * wave_scale;
                (2.0 + (wave / 5) as f32, speed, 12.0, Behavior::Zombie)
            }
            EnemyKind::Flanker => {
                let handedness = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
                ((4.0 + w) * 0.7, 2.2 * 0.8 * 0.9, 12.0, Behavior::Flanker { handedness })
            }
            EnemyKind::Blind => (8.0 + w, 3.0 * 0.8, 14.0, Behavior::Blind),
            EnemyKind::Tank => {
                // Heads roughly for the middle of the world on arrival
                let center = Vec2::splat(WORLD_SIZE / 2.0);
                let jitter = Vec2::new(rng.random::<f32>() - 0.5, rng.random::<f32>() - 0.5) * 100.0;
                facing = angle_to(pos, center + jitter);
                let brain = TankBrain {
                    mood: TankMood::Stroll,
                    timer: 60.0 + rng.random::<f32>() * 120.0,
                    aggro_time: 0.0,
                };
                (25.0 + w * 2.0, 1.1, 26.0, Behavior::Tank(brain))
            }
            EnemyKind::Boss => {
                let brain = BossBrain {
                    phase: BossPhase::Chase,
                    timer: 0.0,
                    charge_dir: Vec2::ZERO,
                    charge_cooldown: 900.0 + rng.random::<f32>() * 1500.0,
                    dying_ms: 0.0,
                };
                (5000.0 + w * 200.0, 0.8, 100.0, Behavior::Boss(brain))
            }
        };
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            hp,
            max_hp: hp,
            radius,
            speed,
            facing,
            behavior,
            dead: false,
            stun: 0.0,
        }
    }

    pub fn kind(&self) -> EnemyKind {
        match self.behavior {
            Behavior::Zombie => EnemyKind::Zombie,
            Behavior::Flanker { .. } => EnemyKind::Flanker,
            Behavior::Blind => EnemyKind::Blind,
            Behavior::Tank(_) => EnemyKind::Tank,
            Behavior::Boss(_) => EnemyKind::Boss,
        }
    }

    pub fn is_boss(&self) -> bool {
        matches!(self.behavior, Behavior::Boss(_))
    }

    pub fn is_dying(&self) -> bool {
        matches!(&self.behavior, Behavior::Boss(b) if b.phase == BossPhase::Dying)
    }

    pub fn is_charging(&self) -> bool {
        matches!(&self.behavior, Behavior::Boss(b) if b.phase == BossPhase::Charge)
    }

    /// Eligible for hits, contact and AI side effects
    pub fn is_active(&self) -> bool {
        !self.dead && !self.is_dying()
    }

    /// Enter the boss's dying phase. Returns false if not a boss or already dying.
    pub fn begin_dying(&mut self) -> bool {
        match &mut self.behavior {
            Behavior::Boss(brain) if brain.phase != BossPhase::Dying => {
                brain.phase = BossPhase::Dying;
                brain.dying_ms = 0.0;
                brain.timer = 0.0;
                true
            }
            _ => false,
        }
    }

    /// Forces a tank into aggro; no-op for other kinds
    pub fn provoke(&mut self) {
        if let Behavior::Tank(brain) = &mut self.behavior {
            brain.provoke();
        }
    }

    /// Advance AI one step, pushing requested side effects into `actions`
    pub fn think<R: Rng>(&mut self, ctx: &AiContext, rng: &mut R, actions: &mut Vec<EnemyAction>) {
        if self.dead {
            return;
        }
        if self.is_boss() {
            self.think_boss(ctx, rng, actions);
        } else {
            self.think_grunt(ctx, rng);
        }
    }

    fn think_boss<R: Rng>(&mut self, ctx: &AiContext, rng: &mut R, actions: &mut Vec<EnemyAction>) {
        let dt = ctx.dt;
        let target_angle = angle_to(self.pos, ctx.player_pos);
        let Behavior::Boss(brain) = &mut self.behavior else {
            return;
        };

        match brain.phase {
            BossPhase::Dying => {
                brain.dying_ms += ctx.elapsed_ms;
                if rng.random::<f32>() < 0.3 {
                    let offset = Vec2::new(rng.random::<f32>() - 0.5, rng.random::<f32>() - 0.5)
                        * self.radius
                        * 2.0;
                    actions.push(EnemyAction::DyingBlast { at: self.pos + offset });
                }
                if brain.dying_ms > BOSS_DYING_MS {
                    actions.push(EnemyAction::Finalize);
                }
                return;
            }
            BossPhase::Chase => {
                let delta = normalize_angle(target_angle - self.facing);
                self.facing = normalize_angle(self.facing + sign(delta) * 0.008 * dt);
                self.vel += heading(self.facing) * 0.05 * dt;
                brain.timer += dt;
                if brain.timer > brain.charge_cooldown {
                    brain.phase = BossPhase::ChargePrep;
                    brain.timer = 0.0;
                    actions.push(EnemyAction::ChargeWindup);
                }
            }
            BossPhase::ChargePrep => {
                self.vel *= 0.8;
                let delta = normalize_angle(target_angle - self.facing);
                self.facing = normalize_angle(self.facing + sign(delta) * 0.1 * dt);
                brain.timer += dt;
                if brain.timer > BOSS_PREP_FRAMES {
                    brain.phase = BossPhase::Charge;
                    brain.timer = 0.0;
                    brain.charge_dir = heading(self.facing);
                    brain.charge_cooldown = 900.0 + rng.random::<f32>() * 1500.0;
                }
            }
            BossPhase::Charge => {
                self.pos += brain.charge_dir * BOSS_CHARGE_SPEED * dt;
                actions.push(EnemyAction::ChargeSweep);
                if !ctx.arena.contains(self.pos) {
                    brain.phase = BossPhase::Chase;
                    brain.timer = 0.0;
                    self.pos = ctx.arena.clamp_point(self.pos, 0.0);
                    actions.push(EnemyAction::WallSlam { at: self.pos });
                }
                brain.timer += dt;
                if brain.phase == BossPhase::Charge && brain.timer > BOSS_CHARGE_FRAMES {
                    brain.phase = BossPhase::Chase;
                    brain.timer = 0.0;
                }
            }
        }

        if brain.phase != BossPhase::Charge {
            self.vel *= 0.95;
            self.pos += self.vel * dt;
        }
    }

    fn think_grunt<R: Rng>(&mut self, ctx: &AiContext, rng: &mut R) {
        let dt = ctx.dt;
        if self.stun > 0.0 {
            self.stun = (self.stun - dt).max(0.0);
        }
        self.vel *= 1.0 - 0.2 * dt;

        let to_player = ctx.player_pos - self.pos;
        if let Some(dir) = try_normalize(to_player) {
            let target_angle = to_player.y.atan2(to_player.x);
            let is_tank = matches!(self.behavior, Behavior::Tank(_));
            let mut mv = match &mut self.behavior {
                Behavior::Zombie => {
                    self.facing = target_angle;
                    dir
                }
                Behavior::Flanker { handedness } => {
                    let m = dir + dir.perp() * 0.8 * *handedness;
                    self.facing = m.y.atan2(m.x);
                    m
                }
                Behavior::Blind => match ctx.noise {
                    Some(noise) if noise.distance(self.pos) > 5.0 => {
                        let m = (noise - self.pos).normalize_or_zero();
                        self.facing = m.y.atan2(m.x);
                        m
                    }
                    Some(_) => Vec2::ZERO,
                    None => {
                        self.facing = normalize_angle(self.facing + (rng.random::<f32>() - 0.5) * 0.1 * dt);
                        Vec2::new(rng.random::<f32>() - 0.5, rng.random::<f32>() - 0.5) * 0.2
                    }
                },
                Behavior::Tank(brain) => {
                    Self::tank_step(brain, &mut self.facing, self.pos, target_angle, ctx, rng)
                }
                Behavior::Boss(_) => Vec2::ZERO,
            };
            if !is_tank {
                mv = try_normalize(mv).unwrap_or(Vec2::ZERO);
            }
            // Knockback overrides steering until it bleeds off
            if self.stun <= 0.0 && self.vel.x.abs() < 1.0 && self.vel.y.abs() < 1.0 {
                self.pos += mv * self.speed * dt;
            }
        }
        self.pos += self.vel * dt;
    }

    fn tank_step<R: Rng>(
        brain: &mut TankBrain,
        facing: &mut f32,
        pos: Vec2,
        target_angle: f32,
        ctx: &AiContext,
        rng: &mut R,
    ) -> Vec2 {
        let dt = ctx.dt;
        match brain.mood {
            TankMood::Aggro => {
                let delta = normalize_angle(target_angle - *facing);
                let turn = 0.005 * dt;
                if delta.abs() < turn {
                    *facing = target_angle;
                } else {
                    *facing = normalize_angle(*facing + sign(delta) * turn);
                }
                brain.aggro_time -= dt;
                if brain.aggro_time <= 0.0 {
                    brain.mood = TankMood::Idle;
                    brain.timer = 60.0 + rng.random::<f32>() * 60.0;
                }
                heading(*facing)
            }
            TankMood::Stroll => {
                let mv = heading(*facing) * 0.4;
                brain.timer -= dt;
                if ctx.arena.near_edge(pos, 100.0) {
                    *facing = normalize_angle(
                        angle_to(pos, ctx.arena.center()) + (rng.random::<f32>() - 0.5),
                    );
                }
                if brain.timer <= 0.0 {
                    brain.mood = TankMood::Idle;
                    brain.timer = 60.0 + rng.random::<f32>() * 120.0;
                }
                mv
            }
            TankMood::Idle => {
                brain.timer -= dt;
                if brain.timer <= 0.0 {
                    brain.mood = TankMood::Stroll;
                    brain.timer = 120.0 + rng.random::<f32>() * 120.0;
                    *facing = rng.random_range(0.0..std::f32::consts::TAU);
                }
                Vec2::ZERO
            }
        }
    }
}

/// Share of the overlap a non-boss closes per frame when pushed by a peer
pub const SEPARATION_RATE: f32 = 0.25;

/// Pairwise push-apart. Bosses shove each other at half strength, ignore
/// smaller enemies, and every non-boss yields fully to a boss.
pub fn separate(enemies: &mut [Enemy], dt: f32) {
    let n = enemies.len();
    for i in 0..n {
        if enemies[i].dead {
            continue;
        }
        let mut flock = Vec2::ZERO;
        let mut neighbors = 0u32;
        for j in 0..n {
            if i == j || enemies[j].dead {
                continue;
            }
            let (other_pos, other_radius, other_boss) =
                (enemies[j].pos, enemies[j].radius, enemies[j].is_boss());
            let me = &mut enemies[i];
            let offset = me.pos - other_pos;
            let dist = offset.length();
            let min_space = me.radius + other_radius;
            if dist >= min_space || dist <= 0.0 {
                continue;
            }
            let overlap = min_space - dist;
            let dir = offset / dist;
            match (me.is_boss(), other_boss) {
                (true, true) => me.pos += dir * overlap * 0.5,
                (true, false) => {}
                (false, true) => me.pos += dir * overlap,
                (false, false) if matches!(me.behavior, Behavior::Blind) => {
                    flock += dir;
                    neighbors += 1;
                }
                (false, false) => me.pos += dir * overlap * SEPARATION_RATE * dt,
            }
        }
        if neighbors > 0 {
            enemies[i].vel += flock / neighbors as f32 * 1.5 * dt;
        }
    }
}
