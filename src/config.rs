use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub playback: Playback,
    pub colors: Colors,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Playback {
    /// Trailing interval (ms) kept on screen for gaze and fixation fades.
    pub rolling_window_ms: f64,
    /// Sub-frame ticks rendered per decoded video frame.
    pub stretch: u32,
    pub gaze_radius: i32,
    pub fixation_radius: i32,
    pub draw_gazes: bool,
    pub draw_fixations: bool,
    pub draw_saccades: bool,
    pub highlight_enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Colors {
    pub gaze_hex: String,
    pub fixation_hex: String,
    pub saccade_hex: String,
    pub highlight_hex: String,
}

impl Default for Playback {
    fn default() -> Self {
        Self {
            rolling_window_ms: 1000.0,
            stretch: 1,
            gaze_radius: 2,
            fixation_radius: 10,
            draw_gazes: true,
            draw_fixations: true,
            draw_saccades: true,
            highlight_enabled: false,
        }
    }
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            gaze_hex: "#00FFFF".to_string(),
            fixation_hex: "#FF0000".to_string(),
            saccade_hex: "#FFFFFF".to_string(),
            highlight_hex: "#FFFF00".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            playback: Playback::default(),
            colors: Colors::default(),
        }
    }
}

impl AppConfig {
    const PATH: &'static str = "config.json";

    pub fn load() -> Result<Self> {
        let config = if Path::new(Self::PATH).exists() {
            let content = fs::read_to_string(Self::PATH)?;
            // Missing fields fall back to defaults via #[serde(default)].
            match serde_json::from_str::<AppConfig>(&content) {
                Ok(c) => {
                    println!("Loaded configuration from {}", Self::PATH);
                    c
                }
                Err(e) => {
                    println!("Error parsing config: {}. Loading defaults.", e);
                    Self::default()
                }
            }
        } else {
            println!("Configuration file not found. Creating default at {}", Self::PATH);
            Self::default()
        };

        // Always save back to ensure new fields are populated in the file
        config.save()?;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(Self::PATH, content)?;
        Ok(())
    }
}

/// Parses "#RRGGBB"; anything else falls back to red.
pub fn parse_hex(hex: &str) -> (u8, u8, u8) {
    if hex.len() == 7 && hex.starts_with('#') {
        let r = u8::from_str_radix(&hex[1..3], 16).unwrap_or(255);
        let g = u8::from_str_radix(&hex[3..5], 16).unwrap_or(0);
        let b = u8::from_str_radix(&hex[5..7], 16).unwrap_or(0);
        (r, g, b)
    } else {
        (255, 0, 0) // Default Red
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#FF0000"), (255, 0, 0));
        assert_eq!(parse_hex("#00FF00"), (0, 255, 0));
        assert_eq!(parse_hex("#0000FF"), (0, 0, 255));
        assert_eq!(parse_hex("#FFFFFF"), (255, 255, 255));
        assert_eq!(parse_hex("invalid"), (255, 0, 0)); // Fallback
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.playback.rolling_window_ms, 1000.0);
        assert_eq!(config.playback.stretch, 1);
        assert!(!config.playback.highlight_enabled);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"playback": {"stretch": 4}}"#).unwrap();
        assert_eq!(config.playback.stretch, 4);
        assert_eq!(config.playback.rolling_window_ms, 1000.0);
        assert_eq!(config.colors.saccade_hex, "#FFFFFF");
    }
}
