// What you SEE:
// • A dark window; move the mouse in it and a glowing comet tail follows the pointer.
// • Sparks fall off the head and fade; the head itself is a dot with a ring.
// • T cycles the theme color, S writes a PNG snapshot, ESC quits.
// • With --settings, editing that JSON file's "primary_color" recolors the trail live.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use kurbo::Point;
use minifb::Key;
use tracing_subscriber::EnvFilter;

use pointer_trail::color::PALETTE;
use pointer_trail::draw::{Drawer, draw_text_5x7};
use pointer_trail::settings::SettingsWatcher;
use pointer_trail::snapshot;
use pointer_trail::{
    AppConfig, Capabilities, Color, ColorSource, EventHub, FrameBuffer, Overlay, Signal,
    ThemeColor, TrailConfig, Viewport,
};

/// Which built-in layers to mount when no config file supplies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Preset {
    /// Soft background comet that eases toward the pointer.
    Curves,
    /// Tight trail pinned to the pointer.
    Cursor,
    /// Curves below, cursor on top.
    Both,
}

impl Preset {
    fn layers(self) -> Vec<TrailConfig> {
        match self {
            Preset::Curves => vec![TrailConfig::curves()],
            Preset::Cursor => vec![TrailConfig::cursor()],
            Preset::Both => vec![TrailConfig::curves(), TrailConfig::cursor()],
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "pointer-trail", version, about = "Pointer-trail overlay demo")]
struct Cli {
    #[arg(long, value_enum, default_value_t = Preset::Curves)]
    preset: Preset,

    /// JSON file with layers, theme color and backdrop.
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON site-settings file watched for "primary_color".
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Initial theme color, #RRGGBB.
    #[arg(long)]
    color: Option<String>,

    #[arg(long, default_value_t = 960)]
    width: usize,

    #[arg(long, default_value_t = 600)]
    height: usize,

    /// Device pixels per logical pixel.
    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Behave like a touch-only device: overlays never start.
    #[arg(long)]
    touch_only: bool,

    /// Seed for spark emission; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value = "snapshots")]
    snapshot_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    /* --- Configuration ---
       Visual: decides which layers you see and in which color. */
    let app = match &cli.config {
        Some(path) => AppConfig::load(path).context("loading --config")?,
        None => AppConfig::default(),
    };
    let layers = if app.layers.is_empty() { cli.preset.layers() } else { app.layers.clone() };
    let backdrop = app.backdrop.unwrap_or(Color::BLACK).to_u32();

    let theme = ThemeColor::default();
    if let Some(raw) = cli.color.as_deref().or(app.theme_color.as_deref()) {
        theme.set_hex(raw);
    }
    let _watcher = cli
        .settings
        .clone()
        .map(|path| SettingsWatcher::spawn(path, theme.clone(), Duration::from_millis(500)))
        .transpose()
        .context("starting settings watcher")?;

    // Probed once; never re-evaluated while running.
    let caps = Capabilities { precise_pointer: !cli.touch_only };

    /* --- Window + screen buffer ---
       Visual: window opens black; overlays draw on top of it. */
    let mut drawer = Drawer::new("Pointer Trail", cli.width, cli.height).context("opening window")?;
    let (mut win_w, mut win_h) = drawer.size();
    let mut screen = FrameBuffer::new(win_w, win_h);
    let scale = cli.scale;
    let viewport_for = |w: usize, h: usize| Viewport::new(w as f64 / scale, h as f64 / scale, scale);

    /* --- Overlays, bottom to top --- */
    let hub = EventHub::new();
    let theme_source: Arc<dyn ColorSource> = Arc::new(theme.clone());
    let mut overlays: Vec<Overlay> = layers
        .into_iter()
        .enumerate()
        .map(|(i, cfg)| {
            let seed = cli.seed.map(|s| s.wrapping_add(i as u64));
            Overlay::mount(&hub, caps, cfg, Arc::clone(&theme_source), viewport_for(win_w, win_h), seed)
        })
        .collect();
    let names: Vec<&str> = overlays.iter().map(|o| o.name()).collect();
    let layer_label = names.join("+");
    let any_running = overlays.iter().any(Overlay::is_running);

    /* --- HUD / FPS --- */
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut hud_fps_text = String::from("FPS: 0.0");
    let mut palette_index = 0usize;
    let mut snapshots = 0u32;
    let mut last_mouse: Option<(f32, f32)> = None;

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        let now = Instant::now();

        /* 1) Keys */
        if drawer.pressed_once(Key::T) {
            palette_index = (palette_index + 1) % PALETTE.len();
            theme.set(PALETTE[palette_index]); // visual: trail recolors next frame
        }

        /* 2) Resize, then pointer; both reach overlays before this tick's frames. */
        let mut signals = Vec::new();
        let (w, h) = drawer.size();
        if (w, h) != (win_w, win_h) && w > 0 && h > 0 {
            (win_w, win_h) = (w, h);
            screen.resize(w, h);
            signals.push(Signal::Resize(viewport_for(w, h)));
        }
        if let Some(pos) = drawer.mouse_pos() {
            if last_mouse != Some(pos) {
                last_mouse = Some(pos);
                let p = Point::new(pos.0 as f64 / scale, pos.1 as f64 / scale);
                signals.push(Signal::PointerMove(p));
            }
        }
        for signal in signals {
            for event in hub.fan_out(signal) {
                overlays.iter_mut().for_each(|o| {
                    o.handle(&event);
                });
            }
        }

        /* 3) Frame callbacks: each overlay advances and redraws its layer. */
        for event in hub.take_due_frames() {
            overlays.iter_mut().for_each(|o| {
                o.handle(&event);
            });
        }

        /* 4) Compose: backdrop, layers in mount order, HUD on top. */
        screen.fill(backdrop);
        for overlay in &overlays {
            overlay.composite_onto(&mut screen);
        }
        let status = if any_running { layer_label.as_str() } else { "TRAIL OFF" };
        let hud = format!(
            "{status} | {} | T: COLOR  S: SNAP | {hud_fps_text}",
            theme.current()
        );
        draw_text_5x7(&mut screen, 8, 8, &hud, 0x00_FF_FF_FF);

        if drawer.pressed_once(Key::S) {
            snapshots += 1;
            match snapshot::save_png(&screen, &cli.snapshot_dir, snapshots) {
                Ok(path) => tracing::info!(path = %path.display(), "snapshot saved"),
                Err(err) => tracing::warn!(%err, "snapshot failed"),
            }
        }

        /* 5) Present */
        drawer.present(&screen)?;

        /* 6) FPS once per second (log + HUD) */
        frames_this_second += 1;
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            let fps = frames_this_second as f32 / secs;
            tracing::info!("FPS: {fps:.1}");
            hud_fps_text = format!("FPS: {fps:.1}");
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    for overlay in &mut overlays {
        overlay.teardown();
    }
    Ok(())
}
