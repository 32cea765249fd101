//! Live site settings: a JSON file polled on a background thread whose
//! `primary_color` feeds the shared [`ThemeColor`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime};

use serde::Deserialize;

use crate::color::ThemeColor;
use crate::error::{Error, Result};

/// The part of the site-settings record the overlay cares about.
/// Other fields in the file are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SiteSettings {
    pub primary_color: Option<String>,
}

impl SiteSettings {
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Settings(format!("read {}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Settings(format!("{}: {e}", path.display())))
    }

    /// Push the configured color into `theme`. A missing color leaves it untouched.
    pub fn apply(&self, theme: &ThemeColor) {
        if let Some(raw) = &self.primary_color {
            let color = theme.set_hex(raw);
            tracing::info!(%color, "theme color updated from settings");
        }
    }
}

/// Background poller. Dropping it stops and joins the thread.
pub struct SettingsWatcher {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SettingsWatcher {
    /// Apply the file once now, then re-apply whenever its modification time changes.
    /// Read errors are logged and retried on the next change; they never stop the watcher.
    pub fn spawn(path: PathBuf, theme: ThemeColor, interval: Duration) -> Result<Self> {
        let mut seen = modified(&path);
        load_into(&path, &theme);

        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = std::thread::Builder::new()
            .name("settings-watcher".into())
            .spawn(move || {
                while !flag.load(Ordering::Acquire) {
                    std::thread::park_timeout(interval);
                    if flag.load(Ordering::Acquire) {
                        break;
                    }
                    let now = modified(&path);
                    if now != seen {
                        seen = now;
                        load_into(&path, &theme);
                    }
                }
            })
            .map_err(|e| Error::Settings(format!("spawn watcher: {e}")))?;

        Ok(Self { stop, handle: Some(handle) })
    }
}

impl Drop for SettingsWatcher {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            let _ = handle.join();
        }
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn load_into(path: &Path, theme: &ThemeColor) {
    match SiteSettings::read(path) {
        Ok(settings) => settings.apply(theme),
        Err(err) => tracing::warn!(%err, "settings not applied"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Color, ColorSource, DEFAULT_THEME};

    fn temp_file(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("pointer-trail-{}-{name}.json", std::process::id()));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn reads_primary_color_and_ignores_other_fields() {
        let path = temp_file("read", r##"{ "primary_color": "#ff0077", "site_name": "x" }"##);
        let s = SiteSettings::read(&path).unwrap();
        assert_eq!(s.primary_color.as_deref(), Some("#ff0077"));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn missing_color_leaves_theme_alone() {
        let theme = ThemeColor::new(Color::WHITE);
        SiteSettings::default().apply(&theme);
        assert_eq!(theme.current(), Color::WHITE);
    }

    #[test]
    fn bad_color_falls_back_to_default() {
        let theme = ThemeColor::new(Color::WHITE);
        SiteSettings { primary_color: Some("teal".into()) }.apply(&theme);
        assert_eq!(theme.current(), DEFAULT_THEME);
    }

    #[test]
    fn watcher_applies_file_on_spawn_and_stops_on_drop() {
        let path = temp_file("spawn", r##"{ "primary_color": "#102030" }"##);
        let theme = ThemeColor::new(Color::WHITE);
        let watcher =
            SettingsWatcher::spawn(path.clone(), theme.clone(), Duration::from_millis(5)).unwrap();
        assert_eq!(theme.current(), Color::rgb(0x10, 0x20, 0x30));
        drop(watcher);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn unreadable_file_is_not_fatal() {
        let path = std::env::temp_dir().join("pointer-trail-does-not-exist.json");
        let theme = ThemeColor::new(Color::WHITE);
        let watcher = SettingsWatcher::spawn(path, theme.clone(), Duration::from_millis(5));
        assert!(watcher.is_ok());
        assert_eq!(theme.current(), Color::WHITE);
    }
}
