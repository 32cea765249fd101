//! One pointer-trail engine: sampler, integrator, trail, sparks and render pass.
//!
//! The engine has two states. It is idle until the first pointer sample, which
//! activates it and places the head exactly on that sample; from then on every
//! frame advances the head, records it in the trail, steps the sparks and
//! draws. Idle frames only clear the surface.

use std::sync::Arc;

use kurbo::Point;

use crate::color::{Color, ColorSource};
use crate::config::TrailConfig;
use crate::motion::{InputSampler, MotionIntegrator};
use crate::particles::ParticleSystem;
use crate::render::{self, Scene};
use crate::surface::Surface;
use crate::trail::TrailBuffer;

/// What a frame did; handy for logs, the HUD and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub active: bool,
    /// Theme color read at the start of this frame.
    pub theme: Color,
    pub head: Option<Point>,
    pub trail_len: usize,
    pub particles: usize,
}

pub struct TrailEngine {
    config: TrailConfig,
    sampler: InputSampler,
    motion: MotionIntegrator,
    trail: TrailBuffer,
    particles: ParticleSystem,
    theme: Arc<dyn ColorSource>,
    frames: u64,
}

impl TrailEngine {
    /// `config` is expected to have passed [`TrailConfig::validate`].
    pub fn new(config: TrailConfig, theme: Arc<dyn ColorSource>, seed: Option<u64>) -> Self {
        Self {
            sampler: InputSampler::default(),
            motion: MotionIntegrator::new(config.smoothing),
            trail: TrailBuffer::new(config.trail_capacity),
            particles: ParticleSystem::new(seed),
            theme,
            frames: 0,
            config,
        }
    }

    /// Pointer moved to `p` (logical coordinates).
    pub fn on_pointer(&mut self, p: Point) {
        self.sampler.record(p);
        if self.motion.observe(p) {
            tracing::debug!(layer = %self.config.name, x = p.x, y = p.y, "trail activated");
        }
    }

    /// Advance one frame and redraw `surface`.
    pub fn frame(&mut self, surface: &mut Surface) -> FrameReport {
        self.frames += 1;
        let theme = self.theme.current();
        surface.clear();

        let head = match (self.sampler.latest(), self.motion.is_active()) {
            (Some(target), true) => self.motion.advance(target),
            _ => None,
        };
        if let Some(head) = head {
            self.trail.push(head);
            self.particles.step(head, theme, &self.config);
            let scene = Scene {
                head,
                trail: &self.trail,
                particles: self.particles.particles(),
            };
            render::draw(surface, &scene, &self.config, theme);
        }

        let report = FrameReport {
            active: head.is_some(),
            theme,
            head,
            trail_len: self.trail.len(),
            particles: self.particles.len(),
        };
        tracing::trace!(layer = %self.config.name, frame = self.frames, ?report, "frame");
        report
    }

    pub fn config(&self) -> &TrailConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.motion.is_active()
    }

    pub fn head(&self) -> Option<Point> {
        self.motion.head()
    }

    pub fn trail(&self) -> &TrailBuffer {
        &self.trail
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ThemeColor;
    use crate::surface::Viewport;

    fn surface() -> Surface {
        Surface::new(Viewport::new(200.0, 200.0, 1.0)).unwrap()
    }

    #[test]
    fn idle_engine_draws_nothing() {
        let mut engine = TrailEngine::new(TrailConfig::curves(), Arc::new(Color::WHITE), Some(1));
        let mut s = surface();
        for _ in 0..5 {
            let r = engine.frame(&mut s);
            assert!(!r.active);
            assert_eq!((r.trail_len, r.particles), (0, 0));
        }
        assert!(s.is_blank());
        assert_eq!(engine.frames(), 5);
    }

    #[test]
    fn first_pointer_event_snaps_then_smooths() {
        let mut engine = TrailEngine::new(TrailConfig::curves(), Arc::new(Color::WHITE), Some(1));
        let mut s = surface();
        engine.on_pointer(Point::new(50.0, 60.0));
        let r = engine.frame(&mut s);
        assert_eq!(r.head, Some(Point::new(50.0, 60.0)));

        engine.on_pointer(Point::new(150.0, 60.0));
        let r = engine.frame(&mut s);
        let head = r.head.unwrap();
        assert!((head.x - (50.0 + 100.0 * 0.35)).abs() < 1e-9);
        assert_eq!(r.trail_len, 2);
        assert!(!s.is_blank());
    }

    #[test]
    fn theme_change_shows_on_the_next_frame_without_reset() {
        let theme = ThemeColor::default();
        let cfg = TrailConfig::curves().with_spawn_probability(0.0);
        let mut engine = TrailEngine::new(cfg, Arc::new(theme.clone()), Some(1));
        let mut s = surface();
        engine.on_pointer(Point::new(100.0, 100.0));
        for _ in 0..4 {
            engine.frame(&mut s);
        }
        let before = (engine.head(), engine.trail().len());

        let red = Color::rgb(255, 0, 0);
        theme.set(red);
        let r = engine.frame(&mut s);
        assert_eq!(r.theme, red);
        assert_eq!(engine.head(), before.0);
        assert_eq!(r.trail_len, before.1 + 1);
        // on the head ring
        assert_eq!(s.pixel_color(107, 100), Some(red));
    }

    #[test]
    fn new_sparks_take_the_frame_theme() {
        let theme = ThemeColor::default();
        let cfg = TrailConfig::cursor().with_spawn_probability(1.0);
        let mut engine = TrailEngine::new(cfg, Arc::new(theme.clone()), Some(5));
        let mut s = surface();
        engine.on_pointer(Point::new(20.0, 20.0));
        engine.frame(&mut s);
        let green = Color::rgb(0, 255, 0);
        theme.set(green);
        engine.frame(&mut s);
        let colors: Vec<Color> = engine.particles().particles().iter().map(|p| p.color).collect();
        assert_eq!(colors.len(), 2);
        assert_ne!(colors[0], green);
        assert_eq!(colors[1], green);
    }
}
