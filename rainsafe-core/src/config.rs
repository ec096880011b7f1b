use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, time::Duration as StdDuration};

use crate::{engine::EngineSettings, predictor::PredictorKind};

/// Engine windows and limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,
    #[serde(default = "default_report_window_hours")]
    pub report_window_hours: u32,
    #[serde(default = "default_weather_freshness_hours")]
    pub weather_freshness_hours: u32,
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictorConfig {
    /// "rules" or "model".
    #[serde(default = "default_predictor_kind")]
    pub kind: String,
    /// JSON model artifact, only read when `kind = "model"`.
    #[serde(default)]
    pub model_path: Option<PathBuf>,
    #[serde(default = "default_heavy_rain_mm")]
    pub heavy_rain_mm: f64,
    #[serde(default = "default_humidity_high_pct")]
    pub humidity_high_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenWeatherConfig {
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// error, warn, info, debug or trace
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// [engine]
/// radius_km = 1.0
///
/// [predictor]
/// kind = "model"
/// model_path = "/var/lib/rainsafe/model.json"
///
/// [openweather]
/// api_key = "..."
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub predictor: PredictorConfig,
    #[serde(default)]
    pub openweather: Option<OpenWeatherConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_radius_km() -> f64 {
    1.0
}

fn default_report_window_hours() -> u32 {
    24
}

fn default_weather_freshness_hours() -> u32 {
    3
}

fn default_fetch_timeout_ms() -> u64 {
    2_000
}

fn default_predictor_kind() -> String {
    PredictorKind::Rules.as_str().to_string()
}

fn default_heavy_rain_mm() -> f64 {
    crate::predictor::rules::DEFAULT_HEAVY_RAIN_MM
}

fn default_humidity_high_pct() -> f64 {
    crate::predictor::rules::DEFAULT_HUMIDITY_HIGH_PCT
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            radius_km: default_radius_km(),
            report_window_hours: default_report_window_hours(),
            weather_freshness_hours: default_weather_freshness_hours(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
        }
    }
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            kind: default_predictor_kind(),
            model_path: None,
            heavy_rain_mm: default_heavy_rain_mm(),
            humidity_high_pct: default_humidity_high_pct(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

impl EngineConfig {
    pub fn settings(&self) -> EngineSettings {
        EngineSettings {
            radius_km: self.radius_km,
            report_window: chrono::Duration::hours(i64::from(self.report_window_hours)),
            weather_freshness: chrono::Duration::hours(i64::from(self.weather_freshness_hours)),
            fetch_timeout: StdDuration::from_millis(self.fetch_timeout_ms),
        }
    }
}

impl PredictorConfig {
    pub fn kind_id(&self) -> Result<PredictorKind> {
        PredictorKind::try_from(self.kind.as_str())
    }
}

impl Config {
    /// Load config from the platform location, or defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    /// Load config from an explicit path; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform location, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, self.to_toml_string()?)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "rainsafe", "rainsafe")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        let e = &self.engine;
        if e.radius_km.is_nan() || e.radius_km <= 0.0 || e.radius_km > 50.0 {
            return Err(anyhow!("engine.radius_km must be in (0, 50], got {}", e.radius_km));
        }
        if e.report_window_hours == 0 || e.report_window_hours > 168 {
            return Err(anyhow!("engine.report_window_hours must be in 1..=168"));
        }
        if e.weather_freshness_hours == 0 || e.weather_freshness_hours > 48 {
            return Err(anyhow!("engine.weather_freshness_hours must be in 1..=48"));
        }
        if e.fetch_timeout_ms == 0 || e.fetch_timeout_ms > 30_000 {
            return Err(anyhow!("engine.fetch_timeout_ms must be in 1..=30000"));
        }

        self.predictor.kind_id()?;
        if self.predictor.heavy_rain_mm.is_nan() || self.predictor.heavy_rain_mm <= 0.0 {
            return Err(anyhow!("predictor.heavy_rain_mm must be positive"));
        }
        if !(0.0..=100.0).contains(&self.predictor.humidity_high_pct) {
            return Err(anyhow!("predictor.humidity_high_pct must be in 0..=100"));
        }

        if let Some(ow) = &self.openweather {
            if ow.api_key.trim().is_empty() {
                return Err(anyhow!("openweather.api_key cannot be empty if provided"));
            }
        }

        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ));
        }

        Ok(())
    }

    /// Set or replace the OpenWeather API key.
    pub fn set_openweather_api_key(&mut self, api_key: String) {
        self.openweather = Some(OpenWeatherConfig { api_key });
    }

    pub fn openweather_api_key(&self) -> Option<&str> {
        self.openweather.as_ref().map(|ow| ow.api_key.as_str())
    }

    pub fn set_predictor(&mut self, kind: PredictorKind, model_path: Option<PathBuf>) {
        self.predictor.kind = kind.as_str().to_string();
        if model_path.is_some() {
            self.predictor.model_path = model_path;
        }
    }
}
