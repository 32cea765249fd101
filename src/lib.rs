//! Pointer-trail overlay.
//!
//! Each overlay runs one [`TrailEngine`]: it follows the pointer with a
//! smoothed head, keeps a short window of recent head positions and draws them
//! as a gradient comet tail, and sprinkles fading sparks around the head, all
//! in a live theme color that can change at any time. Overlays draw into their
//! own [`Surface`] and are composited over the host's frame in mount order.
//!
//! The host drives everything through an [`EventHub`]: it fans out pointer and
//! resize signals to listeners and hands out due frame callbacks, which each
//! overlay answers by drawing once and requesting the next frame.

pub mod color;
pub mod config;
pub mod draw;
pub mod engine;
pub mod error;
pub mod gamma;
pub mod lifecycle;
pub mod motion;
pub mod particles;
pub mod render;
pub mod settings;
pub mod snapshot;
pub mod surface;
pub mod trail;
pub mod types;

pub use color::{Color, ColorSource, DEFAULT_THEME, ThemeColor};
pub use config::{AppConfig, MarkerStyle, Paint, TrailConfig};
pub use engine::{FrameReport, TrailEngine};
pub use error::{Error, Result};
pub use lifecycle::{Capabilities, DormantReason, Event, EventHub, ListenerKind, Overlay, Signal};
pub use surface::{Surface, Viewport};
pub use types::FrameBuffer;
