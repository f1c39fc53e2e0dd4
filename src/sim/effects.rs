//! Cosmetic effects: sparks, gibs and boss fragments
//!
//! Nothing here affects gameplay. Effects use the shared RNG so a seeded
//! run stays reproducible frame for frame.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_PARTICLES;
use crate::heading;

/// Short-lived spark
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Palette index for the renderer
    pub color: u32,
    /// 1.0 at birth, removed at 0
    pub life: f32,
    pub decay: f32,
    pub friction: f32,
}

/// Palette indices shared with the renderer
pub mod palette {
    pub const SPARK: u32 = 0;
    pub const FIRE: u32 = 1;
    pub const BLOOD: u32 = 2;
    pub const HEAL: u32 = 3;
    pub const CRIT: u32 = 4;
    pub const WEAK_POINT: u32 = 5;
    pub const ZAP: u32 = 6;
    pub const NUKE: u32 = 7;
}

impl Particle {
    pub fn burst<R: Rng>(rng: &mut R, pos: Vec2, color: u32, speed: f32) -> Self {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let vel = heading(angle) * rng.random_range(0.0..speed.max(f32::EPSILON));
        Self {
            pos,
            vel,
            color,
            life: 1.0,
            decay: 0.02 + rng.random::<f32>() * 0.03,
            friction: 0.9,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.pos += self.vel * dt;
        self.vel *= 1.0 - (1.0 - self.friction) * dt;
        self.life -= self.decay * dt;
    }
}

/// Enemy gib that slides to a stop and fades
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debris {
    pub pos: Vec2,
    pub vel: Vec2,
    pub rotation: f32,
    pub spin: f32,
    pub size: f32,
    pub color: u32,
    pub life: f32,
}

impl Debris {
    pub fn new<R: Rng>(rng: &mut R, pos: Vec2, color: u32) -> Self {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        Self {
            pos,
            vel: heading(angle) * (rng.random::<f32>() * 8.0 + 2.0),
            rotation: rng.random_range(0.0..std::f32::consts::TAU),
            spin: (rng.random::<f32>() - 0.5) * 0.5,
            size: 4.0 + rng.random::<f32>() * 6.0,
            color,
            life: 1.0,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.pos += self.vel * dt;
        self.vel *= 1.0 - 0.1 * dt;
        self.rotation += self.spin * dt;
        self.spin *= 1.0 - 0.05 * dt;
        if self.vel.x.abs() < 0.1 && self.vel.y.abs() < 0.1 {
            self.life -= 0.05 * dt;
        }
    }
}

/// Polygon shard left behind by a boss
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    pub pos: Vec2,
    pub vel: Vec2,
    pub rotation: f32,
    pub spin: f32,
    /// Outline relative to `pos`
    pub points: Vec<Vec2>,
}

impl Fragment {
    pub fn new<R: Rng>(rng: &mut R, pos: Vec2) -> Self {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let r = 20.0 + rng.random::<f32>() * 30.0;
        let sides = rng.random_range(3..6);
        let points = (0..sides)
            .map(|i| {
                let a = (i as f32 / sides as f32) * std::f32::consts::TAU + rng.random::<f32>() * 0.5;
                heading(a) * r
            })
            .collect();
        Self {
            pos,
            vel: heading(angle) * (rng.random::<f32>() * 8.0 + 2.0),
            rotation: rng.random_range(0.0..std::f32::consts::TAU),
            spin: (rng.random::<f32>() - 0.5) * 0.4,
            points,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.pos += self.vel * dt;
        self.vel *= 0.92;
        self.rotation += self.spin * dt;
        self.spin *= 0.92;
    }
}

/// Push sparks, dropping the oldest beyond the cap
pub fn emit<R: Rng>(
    particles: &mut Vec<Particle>,
    rng: &mut R,
    pos: Vec2,
    color: u32,
    speed: f32,
    count: usize,
) {
    for _ in 0..count {
        particles.push(Particle::burst(rng, pos, color, speed));
    }
    if particles.len() > MAX_PARTICLES {
        let excess = particles.len() - MAX_PARTICLES;
        particles.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_emit_caps_particles() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut particles = Vec::new();
        emit(&mut particles, &mut rng, Vec2::ZERO, palette::FIRE, 10.0, MAX_PARTICLES + 50);
        assert_eq!(particles.len(), MAX_PARTICLES);
    }

    #[test]
    fn test_debris_fades_once_stopped() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut d = Debris::new(&mut rng, Vec2::ZERO, palette::BLOOD);
        for _ in 0..400 {
            d.update(1.0);
        }
        assert!(d.life < 1.0);
    }

    #[test]
    fn test_fragment_has_polygon() {
        let mut rng = Pcg32::seed_from_u64(3);
        let f = Fragment::new(&mut rng, Vec2::ZERO);
        assert!((3..6).contains(&f.points.len()));
    }
}
