// Render pass for one engine frame.
// Visual: gradient comet tail under fading sparks, with the head marker on top.

use kurbo::Point;

use crate::color::Color;
use crate::config::TrailConfig;
use crate::particles::Particle;
use crate::surface::{LinearGradient, Pen, Surface};
use crate::trail::TrailBuffer;

/// Everything one frame draws. Borrowed from the engine for the duration of the pass.
pub struct Scene<'a> {
    pub head: Point,
    pub trail: &'a TrailBuffer,
    pub particles: &'a [Particle],
}

/// Paint `scene` onto an already cleared `surface`, every theme-colored
/// element in `theme`.
pub fn draw(surface: &mut Surface, scene: &Scene<'_>, cfg: &TrailConfig, theme: Color) {
    draw_trail(surface, scene.trail, cfg, theme);

    for p in scene.particles.iter().filter(|p| p.life > 0.0) {
        surface.fill_circle(p.position, p.size, p.color, p.life);
    }

    let m = &cfg.marker;
    if m.glow > 0.0 {
        surface.glow_circle(scene.head, m.ring_radius, m.glow, theme);
    }
    surface.fill_circle(scene.head, m.fill_radius, m.fill.resolve(theme), 1.0);
    surface.stroke_circle(scene.head, m.ring_radius, m.ring_width, m.ring.resolve(theme));
}

fn draw_trail(surface: &mut Surface, trail: &TrailBuffer, cfg: &TrailConfig, theme: Color) {
    let (Some(path), Some(oldest), Some(newest)) =
        (trail.smooth_path(), trail.oldest(), trail.newest())
    else {
        return;
    };
    let paint = LinearGradient {
        start: oldest,
        end: newest,
        from: theme.with_alpha(0.0),
        to: theme.with_alpha(cfg.trail_end_alpha),
    };
    let pen = Pen { width: cfg.line_width, glow: cfg.trail_glow, glow_color: theme };
    surface.stroke_path(&path, pen, &paint);
}
