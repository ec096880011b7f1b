use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use rainsafe_core::{
    Config, GeoPoint, PredictorKind, RiskAssessment, RiskEngine, analyze_description,
    predictor_from_config,
    store::{
        ReportStore, WeatherStore,
        memory::{InMemoryReportStore, InMemoryWeatherStore},
        openweather::OpenWeatherStore,
    },
};
use std::{path::PathBuf, sync::Arc};

use crate::logging;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "rainsafe", version, about = "Hybrid flood risk assessment")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Assess flood risk at a point.
    Assess {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// JSON file with an array of reports.
        #[arg(long)]
        reports: Option<PathBuf>,

        /// JSON file with an array of weather observations.
        #[arg(long, conflicts_with = "live")]
        weather: Option<PathBuf>,

        /// Read current weather from OpenWeather.
        #[arg(long)]
        live: bool,

        /// Print the assessment as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Suggest a severity for a free-text report description.
    Analyze {
        description: String,
    },

    /// Interactively set the OpenWeather key and predictor.
    Configure,

    /// Show the config file location and effective settings.
    Config,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let (config, config_path) = match &self.config {
            Some(path) => (Config::load_from(path)?, path.clone()),
            None => (Config::load()?, Config::config_file_path()?),
        };

        logging::init(&config.logging.level, self.verbose);
        tracing::debug!("Using config from {}", config_path.display());

        match self.command {
            Command::Assess { lat, lon, reports, weather, live, json } => {
                let reports: Arc<dyn ReportStore> = match reports {
                    Some(path) => Arc::new(InMemoryReportStore::from_json_file(&path)?),
                    None => Arc::new(InMemoryReportStore::default()),
                };

                let weather: Arc<dyn WeatherStore> = if live {
                    let api_key = config.openweather_api_key().ok_or_else(|| {
                        anyhow!(
                            "No OpenWeather API key configured.\n\
                             Hint: run `rainsafe configure` and enter your API key."
                        )
                    })?;
                    Arc::new(OpenWeatherStore::new(api_key.to_owned()))
                } else {
                    match weather {
                        Some(path) => Arc::new(InMemoryWeatherStore::from_json_file(&path)?),
                        None => Arc::new(InMemoryWeatherStore::default()),
                    }
                };

                let selected = predictor_from_config(&config.predictor)?;
                let engine =
                    RiskEngine::from_selected(reports, weather, selected, config.engine.settings());

                let assessment = engine.assess(GeoPoint::new(lat, lon)).await?;

                if json {
                    let out = serde_json::to_string_pretty(&assessment)
                        .context("Failed to serialize assessment")?;
                    println!("{out}");
                } else {
                    print!("{}", render_assessment(&assessment));
                }
            }
            Command::Analyze { description } => {
                let analysis = analyze_description(&description);
                println!("Suggested severity: {:?}", analysis.severity);
                if !analysis.actionable_words.is_empty() {
                    println!("Triggered by: {}", analysis.actionable_words.join(", "));
                }
            }
            Command::Configure => {
                configure(config, config_path)?;
            }
            Command::Config => {
                println!("Config file: {}", config_path.display());
                let toml = toml_preview(&config)?;
                println!("{toml}");
            }
        }

        Ok(())
    }
}

fn configure(mut config: Config, path: PathBuf) -> anyhow::Result<()> {
    let api_key = inquire::Password::new("OpenWeather API key (leave empty to keep current):")
        .without_confirmation()
        .prompt()?;
    if !api_key.trim().is_empty() {
        config.set_openweather_api_key(api_key.trim().to_string());
    }

    let kinds: Vec<PredictorKind> = PredictorKind::all().to_vec();
    let kind = inquire::Select::new("Predictor:", kinds).prompt()?;

    let model_path = if kind == PredictorKind::Model {
        inquire::Text::new("Path to model artifact (JSON):")
            .prompt_skippable()?
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
    } else {
        None
    };

    config.set_predictor(kind, model_path);
    config.validate()?;
    config.save_to(&path)?;

    println!("Saved configuration to {}", path.display());
    Ok(())
}

fn toml_preview(config: &Config) -> anyhow::Result<String> {
    let mut shown = config.clone();
    if let Some(ow) = shown.openweather.as_mut() {
        ow.api_key = "********".to_string();
    }
    shown.to_toml_string()
}

pub fn render_assessment(a: &RiskAssessment) -> String {
    let mut out = format!("Flood risk at {}: {}\n", a.location, a.final_level);
    out.push_str(&format!(
        "  Ground reports:    {} ({} report(s) considered)\n",
        a.threshold_level, a.details.reports_considered
    ));

    let observed = a
        .details
        .weather_observed_at
        .map(|t| format!("observed {}", t.format("%Y-%m-%d %H:%M UTC")))
        .unwrap_or_else(|| "no weather data".to_string());
    out.push_str(&format!(
        "  Weather predictor: {} ({}, {})\n",
        a.predicted_level, a.details.predictor, observed
    ));

    if a.is_degraded() {
        let reasons: Vec<String> =
            a.details.degradations.iter().map(|d| format!("{d:?}")).collect();
        out.push_str(&format!("  Degraded:          {}\n", reasons.join(", ")));
    }
    out.push_str(&format!("  Evaluated at:      {}\n", a.evaluated_at.to_rfc3339()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use clap::CommandFactory;
    use rainsafe_core::{AssessmentDetails, Degradation, RiskLevel};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_negative_coordinates() {
        let cli = Cli::parse_from(["rainsafe", "assess", "--lat", "-33.86", "--lon", "151.2", "--json"]);
        match cli.command {
            Command::Assess { lat, lon, json, live, .. } => {
                assert_eq!(lat, -33.86);
                assert_eq!(lon, 151.2);
                assert!(json);
                assert!(!live);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn live_conflicts_with_weather_file() {
        let res = Cli::try_parse_from([
            "rainsafe", "assess", "--lat", "1", "--lon", "2", "--live", "--weather", "w.json",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn renders_degraded_assessment() {
        let a = RiskAssessment {
            location: GeoPoint::new(12.9716, 77.5946),
            threshold_level: RiskLevel::Moderate,
            predicted_level: RiskLevel::None,
            final_level: RiskLevel::Moderate,
            evaluated_at: Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap(),
            details: AssessmentDetails {
                reports_considered: 2,
                weather_observed_at: None,
                predictor: "rules".into(),
                degradations: vec![Degradation::NoWeatherData],
            },
        };

        let out = render_assessment(&a);
        assert!(out.starts_with("Flood risk at 12.9716, 77.5946: Moderate"));
        assert!(out.contains("2 report(s) considered"));
        assert!(out.contains("no weather data"));
        assert!(out.contains("Degraded:          NoWeatherData"));
    }
}
