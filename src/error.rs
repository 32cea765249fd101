// Error type for the overlay and its demo host.
// Every variant states *where* things went wrong.

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Creating the window failed.
    #[error("window init error: {0}")]
    WindowInit(String),

    /// Pushing the framebuffer to the window failed.
    #[error("window update error: {0}")]
    WindowUpdate(String),

    /// The drawing surface could not be allocated for the requested viewport.
    #[error("surface error: {0}")]
    Surface(String),

    /// A trail or app configuration value is out of range or unreadable.
    #[error("config error: {0}")]
    Config(String),

    /// A color string is not `#RRGGBB` / `#RRGGBBAA`.
    #[error("color error: {0}")]
    Color(String),

    /// Reading the live settings source failed.
    #[error("settings error: {0}")]
    Settings(String),

    /// Writing a PNG snapshot failed.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl Error {
    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn color(msg: impl Into<String>) -> Self {
        Self::Color(msg.into())
    }
}
