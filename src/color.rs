//! Theme color: hex parsing and the live, shared color cell the render loop
//! polls once per frame.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Accent color used until settings provide one, and whenever they are unreadable.
pub const DEFAULT_THEME: Color = Color::rgb(0x22, 0xd3, 0xee);

/// Colors `T` cycles through in the demo host.
pub const PALETTE: [Color; 5] = [
    DEFAULT_THEME,
    Color::rgb(0xa8, 0x55, 0xf7),
    Color::rgb(0xf4, 0x3f, 0x5e),
    Color::rgb(0x22, 0xc5, 0x5e),
    Color::rgb(0xf5, 0x9e, 0x0b),
];

/// 8-bit sRGB color with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with alpha replaced by `alpha` in [0, 1].
    pub fn with_alpha(self, alpha: f64) -> Self {
        let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self { a, ..self }
    }

    pub fn alpha_f32(self) -> f32 {
        self.a as f32 / 255.0
    }

    /// Packed 0x00RRGGBB, the layout minifb expects.
    pub fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Component-wise interpolation in sRGB space, alpha included.
    pub fn lerp(self, other: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| Error::color(format!("{s:?} does not start with '#'")))?;
        if !hex.is_ascii() || !(hex.len() == 6 || hex.len() == 8) {
            return Err(Error::color(format!(
                "{s:?} is not #RRGGBB or #RRGGBBAA"
            )));
        }
        let byte = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| Error::color(format!("{s:?} has a non-hex digit")))
        };
        let a = if hex.len() == 8 { byte(6)? } else { 0xff };
        Ok(Color::rgba(byte(0)?, byte(2)?, byte(4)?, a))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 0xff {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Read side of the theme color. The engine holds one of these and asks it
/// for the current value at the start of every frame.
pub trait ColorSource: Send + Sync {
    fn current(&self) -> Color;
}

impl ColorSource for Color {
    fn current(&self) -> Color {
        *self
    }
}

/// Process-wide theme color cell. Cloning shares the same cell, so a writer
/// (settings watcher, key binding) and any number of engines observe one value.
#[derive(Debug, Clone)]
pub struct ThemeColor {
    cell: Arc<RwLock<Color>>,
}

impl Default for ThemeColor {
    fn default() -> Self {
        Self::new(DEFAULT_THEME)
    }
}

impl ThemeColor {
    pub fn new(initial: Color) -> Self {
        Self {
            cell: Arc::new(RwLock::new(initial)),
        }
    }

    /// Store a raw settings value. Anything that does not parse stores
    /// [`DEFAULT_THEME`] instead; the caller never sees an error.
    pub fn set_hex(&self, raw: &str) -> Color {
        let color = match raw.parse::<Color>() {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(%err, fallback = %DEFAULT_THEME, "unusable theme color");
                DEFAULT_THEME
            }
        };
        self.set(color);
        color
    }

    pub fn set(&self, color: Color) {
        match self.cell.write() {
            Ok(mut guard) => *guard = color,
            Err(poisoned) => *poisoned.into_inner() = color,
        }
    }
}

impl ColorSource for ThemeColor {
    fn current(&self) -> Color {
        self.cell.read().map(|c| *c).unwrap_or(DEFAULT_THEME)
    }
}
