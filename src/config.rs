//! Configuration Management
//!
//! Everything is optional in the TOML file; missing keys fall back to the defaults below.
//!
//! ```toml
//! [camera]
//! index = 0
//! mirror = true
//!
//! [brush]
//! color = 0xff00ff
//! radius = 4
//!
//! [solver]
//! model = "gemini-1.5-flash"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::canvas::Brush;
use crate::detector::DetectorConfig;
use crate::error::Error;
use crate::gesture::GestureThresholds;
use crate::solver::SolverConfig;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub camera: CameraConfig,
    pub gesture: GestureThresholds,
    pub brush: Brush,
    pub panel: PanelConfig,
    pub solver: SolverConfig,
    pub detector: DetectorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Device index (0 = default webcam)
    pub index: u32,
    /// Requested resolution; the camera may pick something close
    pub width: u32,
    pub height: u32,
    /// Flip frames left/right so the preview acts like a mirror
    pub mirror: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: 640,
            height: 480,
            mirror: true,
        }
    }
}

/// The white answer panel to the right of the video.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Panel width in pixels
    pub width: usize,
    /// Integer upscale of the 5x7 font
    pub text_scale: i32,
    /// Baseline of the first line
    pub top: i32,
    /// Distance between lines
    pub line_height: i32,
    /// Left and right padding
    pub margin: i32,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            width: 300,
            text_scale: 2,
            top: 30,
            line_height: 20,
            margin: 10,
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), Error> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(Error::Config(format!(
                "camera resolution must be non-zero, got {}x{}",
                self.camera.width, self.camera.height
            )));
        }
        for (name, value) in [
            ("gesture.finger_extension", self.gesture.finger_extension),
            ("gesture.thumb_extension", self.gesture.thumb_extension),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!("{name} must be >= 0, got {value}")));
            }
        }
        if self.brush.radius < 0 || self.brush.radius > 64 {
            return Err(Error::Config(format!(
                "brush.radius must be in [0, 64], got {}",
                self.brush.radius
            )));
        }
        if self.brush.color > 0x00FF_FFFF {
            return Err(Error::Config(format!(
                "brush.color must be 0xRRGGBB, got {:#x}",
                self.brush.color
            )));
        }
        if self.panel.text_scale < 1 || self.panel.line_height < 1 {
            return Err(Error::Config("panel.text_scale and panel.line_height must be >= 1".into()));
        }
        if self.panel.width == 0 {
            return Err(Error::Config("panel.width must be > 0".into()));
        }
        if self.solver.model.trim().is_empty() {
            return Err(Error::Config("solver.model must not be empty".into()));
        }
        if self.solver.timeout_secs == 0 {
            return Err(Error::Config("solver.timeout_secs must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.detector.min_score) {
            return Err(Error::Config(format!(
                "detector.min_score must be in [0, 1], got {}",
                self.detector.min_score
            )));
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load `path` if given, else the default file if it exists, else built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let path = Self::default_path();
        if path.exists() {
            log::info!("Loading config from {}", path.display());
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        PathBuf::from("air-calc.toml")
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, Error> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::from_toml(
            r#"
            [camera]
            index = 2
            mirror = false

            [brush]
            color = 0x00ff00
            radius = 6
            "#,
        )
        .unwrap();
        assert_eq!(config.camera.index, 2);
        assert!(!config.camera.mirror);
        assert_eq!(config.camera.width, 640);
        assert_eq!(config.brush.color, 0x00FF00);
        assert_eq!(config.brush.radius, 6);
        assert_eq!(config.panel.width, 300);
        assert_eq!(config.solver.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            Config::from_toml("[brush]\nradius = -1"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_toml("[gesture]\nfinger_extension = -0.5"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_toml("[solver]\nmodel = \"  \""),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_toml("[camera]\nwidth = 0"),
            Err(Error::Config(_))
        ));
        assert!(matches!(Config::from_toml("not toml ="), Err(Error::Config(_))));
    }

    #[test]
    fn thin_black_brush_is_allowed() {
        let config = Config::from_toml("[brush]\nradius = 0\ncolor = 0").unwrap();
        assert_eq!(config.brush.radius, 0);
        assert_eq!(config.brush.color, 0);
        assert!(matches!(
            Config::from_toml("[brush]\nradius = 65"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_toml("[brush]\ncolor = 0x1000000"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn toml_round_trips() {
        let mut config = Config::default();
        config.brush.radius = 9;
        config.solver.model = "gemini-2.0-flash".into();
        let back = Config::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(back.brush, config.brush);
        assert_eq!(back.solver.model, "gemini-2.0-flash");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err =
            Config::load_or_default(Some(Path::new("/nonexistent/air-calc.toml"))).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
