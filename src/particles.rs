// Sparks: short-lived dots emitted at the head that drift, shrink and fade.
// Visual outcomes:
// - While the pointer is tracked, a spark appears near the head on most frames.
// - Each spark keeps the theme color it was born with, even if the theme changes.

use kurbo::{Point, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::color::Color;
use crate::config::TrailConfig;

/// Lives below this fraction of one decay step count as spent.
const LIFE_EPSILON: f64 = 1e-9;

/// One spark. `life` starts at 1.0 and drives opacity.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Point,
    pub velocity: Vec2, // px per frame
    pub life: f64,
    pub color: Color,
    pub size: f64,
    /// Frames advanced since emission; `life` is derived from it.
    pub age: u32,
}

/// Active spark set. Order is irrelevant to drawing.
pub struct ParticleSystem {
    rng: StdRng,
    particles: Vec<Particle>,
    spawned: u64,
}

impl ParticleSystem {
    /// `seed` makes emission reproducible; `None` seeds from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, particles: Vec::new(), spawned: 0 }
    }

    /// Roll the spawn chance once; on success add exactly one spark near `head`.
    pub fn emit(&mut self, head: Point, color: Color, cfg: &TrailConfig) -> bool {
        if self.rng.gen_range(0.0..1.0) >= cfg.spawn_probability {
            return false;
        }
        let jitter = Vec2::new(
            self.rng.gen_range(-0.5..0.5) * cfg.spawn_jitter,
            self.rng.gen_range(-0.5..0.5) * cfg.spawn_jitter,
        );
        let velocity = Vec2::new(
            self.rng.gen_range(-0.5..0.5) * cfg.particle_speed,
            self.rng.gen_range(-0.5..0.5) * cfg.particle_speed,
        );
        let size = cfg.size_min + self.rng.gen_range(0.0..1.0) * (cfg.size_max - cfg.size_min);
        self.particles.push(Particle {
            position: head + jitter,
            velocity,
            life: 1.0,
            color,
            size,
            age: 0,
        });
        self.spawned += 1;
        true
    }

    /// Move, fade and shrink every spark; drop the ones whose life ran out.
    ///
    /// Life is recomputed from the age instead of subtracted in place, so a
    /// spark is gone after exactly `ceil(1 / life_decay)` advances whatever
    /// the decay's binary representation.
    pub fn advance(&mut self, cfg: &TrailConfig) {
        self.particles.retain_mut(|p| {
            p.position += p.velocity;
            p.age = p.age.saturating_add(1);
            p.life = 1.0 - f64::from(p.age) * cfg.life_decay;
            p.size *= cfg.size_decay;
            p.life > cfg.life_decay * LIFE_EPSILON
        });
    }

    /// One frame: maybe emit at `head`, then advance everything (the new spark included).
    pub fn step(&mut self, head: Point, color: Color, cfg: &TrailConfig) {
        self.emit(head, color, cfg);
        self.advance(cfg);
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Sparks created since construction.
    pub fn spawned_total(&self) -> u64 {
        self.spawned
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}
