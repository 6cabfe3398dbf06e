use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::dsp::analyser::AnalyserSettings;
use crate::dsp::window::WindowType;
use crate::error::Result;
use crate::viz::{BarOptions, Palette};

pub const CONFIG_FILE: &str = "specviz.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub theme: Palette,
    #[serde(default)]
    pub bars: BarOptions,
    #[serde(default)]
    pub spectrogram: SpectrogramConfig,
    #[serde(default)]
    pub labels: LabelsConfig,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    /// Defaults to 16:9 of the width.
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_crf")]
    pub crf: u32,
    #[serde(default = "default_codec")]
    pub codec: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    #[serde(default = "default_smoothing")]
    pub smoothing: f32,
    #[serde(default = "default_min_db")]
    pub min_db: f32,
    #[serde(default = "default_max_db")]
    pub max_db: f32,
    /// A window name, or "none".
    #[serde(default = "default_window")]
    pub window: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SpectrogramConfig {
    /// JSON colormap; the built-in magma table when unset.
    #[serde(default)]
    pub colormap: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct LabelsConfig {
    #[serde(default = "default_labels_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub font: Option<PathBuf>,
    #[serde(default)]
    pub font_url: Option<String>,
    #[serde(default)]
    pub mark_peak: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: None,
            fps: default_fps(),
            crf: default_crf(),
            codec: default_codec(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            smoothing: default_smoothing(),
            min_db: default_min_db(),
            max_db: default_max_db(),
            window: default_window(),
        }
    }
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            enabled: default_labels_enabled(),
            font: None,
            font_url: None,
            mark_peak: false,
        }
    }
}

impl AnalysisConfig {
    pub fn settings(&self) -> AnalyserSettings {
        AnalyserSettings {
            fft_size: self.fft_size,
            smoothing: self.smoothing,
            min_db: self.min_db,
            max_db: self.max_db,
        }
    }
}

pub fn default_width() -> u32 { 720 }
pub fn default_fps() -> u32 { 60 }
pub fn default_crf() -> u32 { 18 }
pub fn default_codec() -> String { "libx264".into() }
pub fn default_fft_size() -> usize { AnalyserSettings::default().fft_size }
pub fn default_smoothing() -> f32 { AnalyserSettings::default().smoothing }
fn default_min_db() -> f32 { AnalyserSettings::default().min_db }
fn default_max_db() -> f32 { AnalyserSettings::default().max_db }
pub fn default_window() -> String { "blackman-harris".into() }
fn default_labels_enabled() -> bool { true }

/// `"none"` turns windowing off; anything else must name a window.
pub fn parse_window(name: &str) -> Result<Option<WindowType>> {
    if name.trim().eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    name.parse().map(Some)
}

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(cfg) => Some(cfg),
        Err(err) => {
            log::debug!("{}: {}", path.display(), err);
            None
        }
    }
}

/// Explicit path, then `./specviz.toml`, then `~/.config/specviz/config.toml`,
/// then the platform config directory.
pub fn discover(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| {
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("specviz").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("specviz").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::surface::Color;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.output.width, 720);
        assert_eq!(cfg.output.height, None);
        assert_eq!(cfg.output.fps, 60);
        assert_eq!(cfg.analysis.fft_size, 2048);
        assert_eq!(cfg.analysis.max_db, -10.0);
        assert_eq!(cfg.bars, BarOptions::default());
        assert_eq!(cfg.theme, Palette::default());
        assert!(cfg.labels.enabled);
        assert!(cfg.spectrogram.colormap.is_none());
    }

    #[test]
    fn sections_override_defaults() {
        let cfg: Config = toml::from_str(
            r##"
            [output]
            width = 1280
            height = 400
            codec = "libx265"

            [analysis]
            fft_size = 4096
            smoothing = 0.5
            window = "Welch"

            [theme]
            background = "#000000"
            color = "green"

            [bars]
            count = 24
            max_hz = 4000.0

            [spectrogram]
            colormap = "maps/inferno.json"

            [labels]
            enabled = false
            mark_peak = true
            "##,
        )
        .unwrap();

        assert_eq!(cfg.output.width, 1280);
        assert_eq!(cfg.output.height, Some(400));
        assert_eq!(cfg.output.codec, "libx265");
        assert_eq!(cfg.output.crf, 18);

        let settings = cfg.analysis.settings();
        assert_eq!(settings.fft_size, 4096);
        assert_eq!(settings.smoothing, 0.5);
        assert_eq!(settings.min_db, -100.0);
        assert_eq!(parse_window(&cfg.analysis.window).unwrap(), Some(WindowType::Welch));

        assert_eq!(cfg.theme.background, Color::BLACK);
        assert_eq!(cfg.theme.color, Color::rgb(0, 128, 0));
        assert_eq!(cfg.theme.foreground, Color::BLACK);

        assert_eq!(cfg.bars.count, 24);
        assert_eq!(cfg.bars.vertical_lines, 20);
        assert_eq!(cfg.spectrogram.colormap, Some(PathBuf::from("maps/inferno.json")));
        assert!(!cfg.labels.enabled);
        assert!(cfg.labels.mark_peak);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(toml::from_str::<Config>("[theme]\nbackground = \"#12\"").is_err());
        assert!(toml::from_str::<Config>("[output]\nwidth = \"wide\"").is_err());
    }

    #[test]
    fn window_names() {
        assert_eq!(parse_window("none").unwrap(), None);
        assert_eq!(parse_window("NONE").unwrap(), None);
        assert_eq!(parse_window("blackman-harris").unwrap(), Some(WindowType::BlackmanHarris));
        assert!(parse_window("kaiser").is_err());
    }

    #[test]
    fn unreadable_or_invalid_files() {
        assert!(load_config(Path::new("/no/such/specviz.toml")).is_none());

        let path = std::env::temp_dir().join(format!("specviz-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "[output\nwidth = 3").unwrap();
        assert!(load_config(&path).is_none());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn explicit_path_wins() {
        let explicit = PathBuf::from("/tmp/whatever.toml");
        assert_eq!(discover(Some(explicit.clone())), Some(explicit));
    }
}
