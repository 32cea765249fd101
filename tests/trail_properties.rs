use std::sync::Arc;

use kurbo::Point;
use pointer_trail::particles::ParticleSystem;
use pointer_trail::{Color, DEFAULT_THEME, Surface, ThemeColor, TrailConfig, TrailEngine, Viewport};

fn surface() -> Surface {
    Surface::new(Viewport::new(320.0, 240.0, 1.0)).unwrap()
}

fn point(i: usize) -> Point {
    Point::new(10.0 + i as f64 * 7.0, 20.0 + i as f64 * 3.0)
}

#[test]
fn capacity_18_keeps_the_last_18_of_20_heads() {
    // smoothing 1.0 makes each head equal to the pointer sample of that frame
    let cfg = TrailConfig::cursor().with_capacity(18);
    let mut engine = TrailEngine::new(cfg, Arc::new(DEFAULT_THEME), Some(1));
    let mut s = surface();
    for i in 1..=20 {
        engine.on_pointer(point(i));
        let report = engine.frame(&mut s);
        assert_eq!(report.trail_len, i.min(18));
    }
    let kept: Vec<Point> = engine.trail().iter().copied().collect();
    let expected: Vec<Point> = (3..=20).map(point).collect();
    assert_eq!(kept, expected);
}

#[test]
fn eased_trail_never_exceeds_capacity() {
    let mut engine = TrailEngine::new(TrailConfig::curves(), Arc::new(DEFAULT_THEME), Some(2));
    let mut s = surface();
    for i in 0..100 {
        if i % 3 == 0 {
            engine.on_pointer(Point::new((i * 13 % 300) as f64, (i * 7 % 200) as f64));
        }
        let report = engine.frame(&mut s);
        assert!(report.trail_len <= 18);
    }
    assert_eq!(engine.trail().len(), 18);
}

#[test]
fn frame_sees_only_the_latest_pointer_sample() {
    let mut engine = TrailEngine::new(TrailConfig::cursor(), Arc::new(DEFAULT_THEME), Some(3));
    let mut s = surface();
    engine.on_pointer(Point::new(5.0, 5.0));
    engine.frame(&mut s);
    for i in 0..10 {
        engine.on_pointer(Point::new(50.0 + i as f64, 60.0));
    }
    let report = engine.frame(&mut s);
    assert_eq!(report.head, Some(Point::new(59.0, 60.0)));
    assert_eq!(report.trail_len, 2);
}

#[test]
fn eased_head_lies_strictly_between_previous_head_and_target() {
    let mut engine = TrailEngine::new(TrailConfig::curves(), Arc::new(DEFAULT_THEME), Some(4));
    let mut s = surface();
    let start = Point::new(10.0, 200.0);
    engine.on_pointer(start);
    assert_eq!(engine.head(), Some(start));

    let target = Point::new(300.0, 20.0);
    engine.on_pointer(target);
    let mut prev = start;
    for _ in 0..30 {
        let head = engine.frame(&mut s).head.unwrap();
        assert!(head.x > prev.x && head.x < target.x);
        assert!(head.y < prev.y && head.y > target.y);
        prev = head;
    }
}

fn ten_certain_spawns_expire_within_ceil_frames(decay: f64) {
    let cfg = TrailConfig::curves().with_spawn_probability(1.0).with_decay(decay, 0.9);
    let mut sys = ParticleSystem::new(Some(5));
    let head = Point::new(100.0, 100.0);
    for _ in 0..10 {
        sys.step(head, DEFAULT_THEME, &cfg);
    }
    assert_eq!(sys.spawned_total(), 10);
    assert!(!sys.is_empty());

    let mut lives: Vec<f64> = sys.particles().iter().map(|p| p.life).collect();
    let frames = (1.0_f64 / decay).ceil() as usize;
    for _ in 0..frames {
        sys.advance(&cfg);
        let now: Vec<f64> = sys.particles().iter().map(|p| p.life).collect();
        // survivors are the tail of the previous set, each strictly lower
        let dropped = lives.len() - now.len();
        for (before, after) in lives[dropped..].iter().zip(&now) {
            assert!(after < before && *after > 0.0, "decay {decay}");
        }
        lives = now;
    }
    assert!(sys.is_empty(), "decay {decay} left {:?}", sys.particles());
    for _ in 0..5 {
        sys.advance(&cfg);
        assert!(sys.is_empty());
    }
    assert_eq!(sys.spawned_total(), 10);
}

#[test]
fn ten_certain_spawns_all_expire_after_ceil_one_over_decay_frames() {
    ten_certain_spawns_expire_within_ceil_frames(0.125);
}

#[test]
fn sparks_expire_on_time_for_decays_not_exact_in_binary() {
    for decay in [0.1, 0.2, 0.05, 0.3, 0.07] {
        ten_certain_spawns_expire_within_ceil_frames(decay);
    }
}

#[test]
fn preset_decays_expire_on_time() {
    for cfg in [TrailConfig::curves(), TrailConfig::cursor()] {
        ten_certain_spawns_expire_within_ceil_frames(cfg.life_decay);
    }
}

#[test]
fn theme_change_recolors_next_frame_and_keeps_state() {
    let theme = ThemeColor::default();
    let cfg = TrailConfig::curves().with_spawn_probability(0.0);
    let mut engine = TrailEngine::new(cfg, Arc::new(theme.clone()), Some(6));
    let mut s = surface();
    engine.on_pointer(Point::new(100.0, 100.0));
    for _ in 0..3 {
        assert_eq!(engine.frame(&mut s).theme, DEFAULT_THEME);
    }
    let trail_before: Vec<Point> = engine.trail().iter().copied().collect();

    let violet = Color::rgb(0xa8, 0x55, 0xf7);
    theme.set_hex("#a855f7");
    let report = engine.frame(&mut s);
    assert_eq!(report.theme, violet);
    let trail_after: Vec<Point> = engine.trail().iter().copied().collect();
    assert_eq!(&trail_after[..trail_before.len()], &trail_before[..]);
    assert_eq!(s.pixel_color(107, 100), Some(violet));
}
