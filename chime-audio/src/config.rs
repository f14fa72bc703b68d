//! Simple configuration persistence for CHIME
//!
//! Stores sound preferences (enabled, muted, volume, ambient bed).

use crate::ambient::AmbientBed;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Sound configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Sound on/off (off means every play call is a no-op)
    pub enabled: bool,
    /// Start muted
    pub muted: bool,
    /// Master volume (0.0-1.0)
    pub master_volume: f32,
    /// Play the ambient bed during a session
    pub ambient: bool,
    pub ambient_bed: AmbientBed,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            muted: false,
            master_volume: 0.8,
            ambient: true,
            ambient_bed: AmbientBed::Calm,
        }
    }
}

impl Config {
    /// Load config from the default location
    ///
    /// Returns default config if file doesn't exist or can't be read.
    pub fn load() -> Self {
        let path = Self::config_path();
        Self::load_from(&path).unwrap_or_default()
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Save config to the default location
    pub fn save(&self) -> io::Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.serialize())
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chime")
            .join("config.txt")
    }

    /// Parse config from simple key=value format
    ///
    /// Unknown keys and malformed values keep their defaults.
    fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();

            match key.trim() {
                "enabled" => {
                    if let Some(v) = parse_bool(value) {
                        config.enabled = v;
                    }
                }
                "muted" => {
                    if let Some(v) = parse_bool(value) {
                        config.muted = v;
                    }
                }
                "master_volume" => {
                    if let Ok(v) = value.parse::<f32>() {
                        if v.is_finite() {
                            config.master_volume = v.clamp(0.0, 1.0);
                        }
                    }
                }
                "ambient" => {
                    if let Some(v) = parse_bool(value) {
                        config.ambient = v;
                    }
                }
                "ambient_bed" => {
                    if let Some(bed) = AmbientBed::from_name(value) {
                        config.ambient_bed = bed;
                    }
                }
                _ => {}
            }
        }

        config
    }

    /// Serialize config to simple key=value format
    fn serialize(&self) -> String {
        let on_off = |v: bool| if v { "on" } else { "off" };
        [
            "# CHIME Configuration".to_string(),
            format!("enabled={}", self.enabled),
            format!("muted={}", self.muted),
            format!("master_volume={:.2}", self.master_volume),
            format!("ambient={}", on_off(self.ambient)),
            format!("ambient_bed={}", self.ambient_bed.name()),
        ]
        .join("\n")
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}
