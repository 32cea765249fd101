//! Trail engine configuration.
//!
//! One engine type covers both on-screen variants; what differs between them is
//! data. [`TrailConfig::curves`] is the soft background comet that eases toward
//! the pointer, [`TrailConfig::cursor`] the tight cursor trail that follows it
//! exactly. Both can be tuned further with the `with_*` setters or loaded from
//! JSON, where every missing field takes the `curves` value.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{Error, Result};

/// Where a marker part takes its color from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Paint {
    /// The live theme color of the current frame.
    Theme,
    /// A fixed color.
    Fixed(Color),
}

impl Paint {
    pub fn resolve(self, theme: Color) -> Color {
        match self {
            Paint::Theme => theme,
            Paint::Fixed(c) => c,
        }
    }
}

/// Head marker: a filled dot with a thin ring around it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkerStyle {
    pub fill: Paint,
    pub fill_radius: f64,
    pub ring: Paint,
    pub ring_radius: f64,
    pub ring_width: f64,
    /// Halo radius in theme color around dot and ring; 0 disables it.
    pub glow: f64,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            fill: Paint::Fixed(Color::WHITE),
            fill_radius: 4.0,
            ring: Paint::Theme,
            ring_radius: 8.0,
            ring_width: 2.0,
            glow: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrailConfig {
    /// Shown in logs and the HUD.
    pub name: String,
    /// Most recent head positions kept for the spline.
    pub trail_capacity: usize,
    /// Fraction of the remaining distance the head covers per frame, in (0, 1].
    pub smoothing: f64,
    /// Chance per frame of emitting one particle, in [0, 1].
    pub spawn_probability: f64,
    /// Full width of the square a new particle is scattered over, centered on the head.
    pub spawn_jitter: f64,
    /// Full width of the per-axis velocity range, in px per frame.
    pub particle_speed: f64,
    /// Life lost per frame; particles start at 1.0.
    pub life_decay: f64,
    /// Size multiplier applied per frame, in (0, 1).
    pub size_decay: f64,
    pub size_min: f64,
    pub size_max: f64,
    pub line_width: f64,
    /// Halo radius under the trail; 0 disables it.
    pub trail_glow: f64,
    /// Opacity of the gradient at the newest trail point.
    pub trail_end_alpha: f64,
    pub marker: MarkerStyle,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self::curves()
    }
}

impl TrailConfig {
    /// Background comet: eased head, long tail, dense sparks.
    pub fn curves() -> Self {
        Self {
            name: "curves".to_owned(),
            trail_capacity: 18,
            smoothing: 0.35,
            spawn_probability: 0.7,
            spawn_jitter: 8.0,
            particle_speed: 4.0,
            life_decay: 0.035,
            size_decay: 0.96,
            size_min: 1.5,
            size_max: 4.0,
            line_width: 6.0,
            trail_glow: 12.0,
            trail_end_alpha: 0x99 as f64 / 255.0,
            marker: MarkerStyle::default(),
        }
    }

    /// Cursor trail: head pinned to the pointer, short tail, sparse sparks.
    pub fn cursor() -> Self {
        Self {
            name: "cursor".to_owned(),
            trail_capacity: 12,
            smoothing: 1.0,
            spawn_probability: 0.5,
            spawn_jitter: 4.0,
            particle_speed: 2.0,
            life_decay: 0.05,
            size_decay: 0.92,
            size_min: 1.0,
            size_max: 3.0,
            line_width: 4.0,
            trail_glow: 4.0,
            trail_end_alpha: 1.0,
            marker: MarkerStyle {
                fill: Paint::Fixed(Color::BLACK),
                fill_radius: 4.0,
                ring: Paint::Fixed(Color::BLACK),
                ring_radius: 8.0,
                ring_width: 1.0,
                glow: 0.0,
            },
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.trail_capacity = capacity;
        self
    }

    pub fn with_smoothing(mut self, k: f64) -> Self {
        self.smoothing = k;
        self
    }

    pub fn with_spawn_probability(mut self, p: f64) -> Self {
        self.spawn_probability = p;
        self
    }

    pub fn with_decay(mut self, life_decay: f64, size_decay: f64) -> Self {
        self.life_decay = life_decay;
        self.size_decay = size_decay;
        self
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }

    pub fn with_marker(mut self, marker: MarkerStyle) -> Self {
        self.marker = marker;
        self
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let name = &self.name;
        let finite = [
            ("smoothing", self.smoothing),
            ("spawn_probability", self.spawn_probability),
            ("spawn_jitter", self.spawn_jitter),
            ("particle_speed", self.particle_speed),
            ("life_decay", self.life_decay),
            ("size_decay", self.size_decay),
            ("size_min", self.size_min),
            ("size_max", self.size_max),
            ("line_width", self.line_width),
            ("trail_glow", self.trail_glow),
            ("trail_end_alpha", self.trail_end_alpha),
            ("marker.fill_radius", self.marker.fill_radius),
            ("marker.ring_radius", self.marker.ring_radius),
            ("marker.ring_width", self.marker.ring_width),
            ("marker.glow", self.marker.glow),
        ];
        for (field, v) in finite {
            if !v.is_finite() {
                return Err(Error::config(format!("{name}: {field} must be finite")));
            }
            if v < 0.0 {
                return Err(Error::config(format!("{name}: {field} must be >= 0")));
            }
        }

        let check = |ok: bool, what: &str| {
            if ok { Ok(()) } else { Err(Error::config(format!("{name}: {what}"))) }
        };
        check(self.trail_capacity >= 1, "trail_capacity must be >= 1")?;
        check(
            self.smoothing > 0.0 && self.smoothing <= 1.0,
            "smoothing must be in (0, 1]",
        )?;
        check(self.spawn_probability <= 1.0, "spawn_probability must be in [0, 1]")?;
        check(
            self.life_decay > 0.0 && self.life_decay <= 1.0,
            "life_decay must be in (0, 1]",
        )?;
        check(
            self.size_decay > 0.0 && self.size_decay < 1.0,
            "size_decay must be in (0, 1)",
        )?;
        check(self.size_min <= self.size_max, "size_min must not exceed size_max")?;
        check(self.line_width > 0.0, "line_width must be > 0")?;
        check(self.trail_end_alpha <= 1.0, "trail_end_alpha must be in [0, 1]")?;
        Ok(())
    }
}

/// Optional JSON file handed to the demo host with `--config`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Layers bottom to top. Empty means "use the CLI preset".
    pub layers: Vec<TrailConfig>,
    pub theme_color: Option<String>,
    pub backdrop: Option<Color>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("read {}: {e}", path.display())))?;
        Self::from_json(&text)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let cfg: AppConfig =
            serde_json::from_str(text).map_err(|e| Error::config(e.to_string()))?;
        for layer in &cfg.layers {
            layer.validate()?;
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        TrailConfig::curves().validate().unwrap();
        TrailConfig::cursor().validate().unwrap();
    }

    #[test]
    fn builder_overrides_fields() {
        let cfg = TrailConfig::cursor()
            .with_capacity(18)
            .with_smoothing(0.5)
            .with_spawn_probability(1.0)
            .with_decay(0.25, 0.5);
        assert_eq!(cfg.trail_capacity, 18);
        assert_eq!(cfg.smoothing, 0.5);
        assert_eq!(cfg.spawn_probability, 1.0);
        assert_eq!((cfg.life_decay, cfg.size_decay), (0.25, 0.5));
        assert_eq!(cfg.name, "cursor");
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let bad = [
            TrailConfig::curves().with_capacity(0),
            TrailConfig::curves().with_smoothing(0.0),
            TrailConfig::curves().with_smoothing(1.5),
            TrailConfig::curves().with_spawn_probability(1.1),
            TrailConfig::curves().with_decay(0.0, 0.9),
            TrailConfig::curves().with_decay(0.1, 1.0),
            TrailConfig::curves().with_line_width(0.0),
            TrailConfig::curves().with_smoothing(f64::NAN),
        ];
        for cfg in bad {
            let err = cfg.validate().unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{err}");
        }
    }

    #[test]
    fn json_layers_fill_missing_fields_from_curves() {
        let cfg = AppConfig::from_json(
            r##"{
                "layers": [
                    { "name": "slow", "smoothing": 0.1 },
                    { "name": "pin", "trail_capacity": 12,
                      "marker": { "fill": { "fixed": "#000000" }, "ring": "theme" } }
                ],
                "theme_color": "#ff0077",
                "backdrop": "#101010"
            }"##,
        )
        .unwrap();
        assert_eq!(cfg.layers.len(), 2);
        assert_eq!(cfg.layers[0].smoothing, 0.1);
        assert_eq!(cfg.layers[0].trail_capacity, 18);
        assert_eq!(cfg.layers[1].marker.fill, Paint::Fixed(Color::BLACK));
        assert_eq!(cfg.layers[1].marker.ring, Paint::Theme);
        assert_eq!(cfg.layers[1].marker.ring_radius, 8.0);
        assert_eq!(cfg.theme_color.as_deref(), Some("#ff0077"));
        assert_eq!(cfg.backdrop, Some(Color::rgb(0x10, 0x10, 0x10)));
    }

    #[test]
    fn json_with_invalid_layer_is_rejected() {
        let err = AppConfig::from_json(r#"{ "layers": [ { "size_decay": 2.0 } ] }"#)
            .unwrap_err();
        assert!(err.to_string().contains("size_decay"));
        assert!(AppConfig::from_json(r#"{ "layerz": [] }"#).is_err());
    }
}
