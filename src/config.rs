//! Layered runtime settings.
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML
//! file, `UVDASH__SECTION__KEY` environment variables, then command-line
//! flags.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::Validate;

use crate::error::Result;
use crate::utils::constants::{
    DEFAULT_CSV_FILE, DEFAULT_FORECAST_DAYS, DEFAULT_GEOJSON_FILE, DEFAULT_HOST,
    DEFAULT_INTERVAL_WIDTH, DEFAULT_PORT, ENV_PREFIX,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DataSettings {
    pub csv: PathBuf,
    pub geojson: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ServerSettings {
    #[validate(length(min = 1))]
    pub host: String,

    #[validate(range(min = 1))]
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ForecastSettings {
    #[validate(range(max = 3650))]
    pub default_days: u32,

    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub interval_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Settings {
    #[validate(nested)]
    pub data: DataSettings,
    #[validate(nested)]
    pub server: ServerSettings,
    #[validate(nested)]
    pub forecast: ForecastSettings,
}

/// Values given on the command line; `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub csv: Option<PathBuf>,
    pub geojson: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

fn path_string(path: &Option<PathBuf>) -> Option<String> {
    path.as_ref().map(|p| p.display().to_string())
}

impl Settings {
    /// Build settings from every layer and validate the result.
    ///
    /// A missing settings file is not an error.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("data.csv", DEFAULT_CSV_FILE)?
            .set_default("data.geojson", DEFAULT_GEOJSON_FILE)?
            .set_default("server.host", DEFAULT_HOST)?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("forecast.default_days", i64::from(DEFAULT_FORECAST_DAYS))?
            .set_default("forecast.interval_width", DEFAULT_INTERVAL_WIDTH)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(false));
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("data.csv", path_string(&overrides.csv))?
            .set_override_option("data.geojson", path_string(&overrides.geojson))?
            .set_override_option("server.host", overrides.host.clone())?
            .set_override_option("server.port", overrides.port.map(i64::from))?
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        debug!(?settings, "Loaded settings");
        Ok(settings)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data: DataSettings {
                csv: PathBuf::from(DEFAULT_CSV_FILE),
                geojson: PathBuf::from(DEFAULT_GEOJSON_FILE),
            },
            server: ServerSettings {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
            },
            forecast: ForecastSettings {
                default_days: DEFAULT_FORECAST_DAYS,
                interval_width: DEFAULT_INTERVAL_WIDTH,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_defaults_without_file() {
        let missing = Path::new("/nonexistent/uv-dashboard.toml");
        let settings = Settings::load(Some(missing), &Overrides::default()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.bind_address(), "127.0.0.1:8050");
    }

    #[test]
    fn test_file_then_flags() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 9000\n\n[forecast]\ndefault_days = 60\ninterval_width = 0.95"
        )
        .unwrap();

        let settings = Settings::load(Some(file.path()), &Overrides::default()).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.forecast.default_days, 60);
        assert_eq!(settings.forecast.interval_width, 0.95);

        let overrides = Overrides {
            port: Some(9100),
            csv: Some(PathBuf::from("other.csv")),
            ..Overrides::default()
        };
        let settings = Settings::load(Some(file.path()), &overrides).unwrap();
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.data.csv, PathBuf::from("other.csv"));
    }

    #[test]
    fn test_rejects_invalid_values() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[forecast]\ninterval_width = 1.5").unwrap();
        assert!(Settings::load(Some(file.path()), &Overrides::default()).is_err());

        let zero_port = Overrides {
            port: Some(0),
            ..Overrides::default()
        };
        assert!(Settings::load(None, &zero_port).is_err());
    }
}
