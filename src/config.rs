use crate::events::AppEvent;
use crate::gui::theme::{self, HexColor};
use async_channel::Sender;
use directories::ProjectDirs;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct CursorOffset {
    pub x: f64,
    pub y: f64,
}

impl Default for CursorOffset {
    fn default() -> Self {
        Self { x: 20.0, y: 20.0 }
    }
}

/// Trail tuning. Every field has a default, so an empty (or absent) config
/// file yields the stock comet-tail look.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Marker count; index 0 is the head of the trail.
    pub num_circles: usize,
    /// Gradient stops as `#rrggbb` strings, head to tail.
    pub colors: Vec<HexColor>,
    /// Delay before a stopped pointer is forced idle, in milliseconds.
    pub fading_time_ms: u64,
    /// Interpolation weight in (0, 1]; higher values make a stiffer tail.
    pub movement_factor: f64,
    /// Offset of the trail head from the true pointer position, in pixels.
    pub cursor_offset: CursorOffset,
    pub circle_width: f64,
    pub circle_height: f64,
    pub circle_border_radius: f64,
    /// Speed boundary between "moving" and "idle", in pixels per millisecond.
    pub speed_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_circles: 25,
            colors: theme::default_palette(),
            fading_time_ms: 200,
            movement_factor: 0.2,
            cursor_offset: CursorOffset::default(),
            circle_width: 24.0,
            circle_height: 24.0,
            circle_border_radius: 24.0,
            speed_threshold: 0.15,
        }
    }
}

impl Config {
    /// An explicitly empty color list is not renderable; fall back to the
    /// built-in palette as if the key were unset.
    pub fn effective_colors(&self) -> Vec<HexColor> {
        if self.colors.is_empty() {
            log::warn!("Config has an empty color list; using the built-in palette");
            theme::default_palette()
        } else {
            self.colors.clone()
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
}

pub fn get_config_path() -> Result<std::path::PathBuf, ConfigError> {
    let proj_dirs =
        ProjectDirs::from("org", "troia", "comet").ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

pub fn load_config() -> Result<Config, ConfigError> {
    let config_path = get_config_path()?;

    let s = config::Config::builder()
        .add_source(config::File::from(config_path).required(false))
        .add_source(config::Environment::with_prefix("COMET"))
        .build()?;

    Ok(s.try_deserialize()?)
}

pub fn load_or_default() -> Config {
    match load_config() {
        Ok(c) => c,
        Err(e) => {
            log::warn!("Failed to load config ({}); using defaults", e);
            Config::default()
        }
    }
}

/// Writes the commented default config on first run and returns its path.
/// An existing file is left untouched.
pub fn write_default_config() -> std::io::Result<std::path::PathBuf> {
    let path =
        get_config_path().map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e))?;
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs_err::write(&path, DEFAULT_CONFIG)?;
    }
    Ok(path)
}

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

pub async fn run_async_watcher(tx: Sender<AppEvent>) {
    let config_path = match get_config_path() {
        Ok(p) => p,
        Err(e) => {
            log::error!("Config watcher error: {}", e);
            return;
        }
    };
    let config_dir = match config_path.parent() {
        Some(p) => p.to_path_buf(),
        None => return,
    };

    if let Err(e) = fs_err::create_dir_all(&config_dir) {
        log::error!("Failed to create config directory for watching: {}", e);
        return;
    }

    let (bridge_tx, bridge_rx) = async_channel::unbounded();

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            log::error!("Failed to create watcher: {}", e);
            return;
        }
    };

    if let Err(e) = watcher.watch(&config_dir, RecursiveMode::NonRecursive) {
        log::error!("Failed to watch config directory: {}", e);
        return;
    }

    while let Ok(res) = bridge_rx.recv().await {
        match res {
            Ok(event) => {
                let meaningful_event = matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                );

                if meaningful_event
                    && event.paths.iter().any(|p| p == &config_path)
                    && tx.send(AppEvent::ConfigReload).await.is_err()
                {
                    break;
                }
            }
            Err(e) => log::error!("Watch error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.num_circles, 25);
        assert_eq!(config.colors.len(), 21);
        assert_eq!(config.fading_time_ms, 200);
        assert_eq!(config.movement_factor, 0.2);
        assert_eq!(config.cursor_offset, CursorOffset { x: 20.0, y: 20.0 });
        assert_eq!(config.circle_width, 24.0);
        assert_eq!(config.circle_height, 24.0);
        assert_eq!(config.circle_border_radius, 24.0);
        assert_eq!(config.speed_threshold, 0.15);
    }

    #[test]
    fn test_partial_override_keeps_default_palette() {
        let config: Config = serde_json::from_str(r#"{ "num_circles": 8 }"#).unwrap();
        assert_eq!(config.num_circles, 8);
        assert_eq!(config.colors, theme::default_palette());
    }

    #[test]
    fn test_color_list_deserialization() {
        let config: Config =
            serde_json::from_str(r##"{ "colors": ["#000000", "#FFB56B"] }"##).unwrap();
        assert_eq!(config.colors.len(), 2);
        assert_eq!(config.colors[1].to_string(), "#ffb56b");
    }

    #[test]
    fn test_invalid_color_is_rejected() {
        let result: Result<Config, _> = serde_json::from_str(r##"{ "colors": ["#12345"] }"##);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_color_list_falls_back_to_palette() {
        let config: Config = serde_json::from_str(r#"{ "colors": [] }"#).unwrap();
        assert!(config.colors.is_empty());
        assert_eq!(config.effective_colors(), theme::default_palette());
    }
}
