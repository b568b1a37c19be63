/// Packed date format used by the `Date` column
pub const PACKED_DATE_FORMAT: &str = "%Y%m%d";

/// Default input files
pub const DEFAULT_CSV_FILE: &str = "todaysdata.csv";
pub const DEFAULT_GEOJSON_FILE: &str = "us-states.json";
pub const DEFAULT_CONFIG_FILE: &str = "uv-dashboard.toml";

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "UVDASH";

/// Server defaults
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8050;

/// Risk band upper bounds (inclusive)
pub const RISK_LOW_MAX: f64 = 2.0;
pub const RISK_MODERATE_MAX: f64 = 5.0;
pub const RISK_HIGH_MAX: f64 = 7.0;
pub const RISK_VERY_HIGH_MAX: f64 = 10.0;

/// Gauge bar colour thresholds
pub const GAUGE_RED_ABOVE: f64 = 7.0;
pub const GAUGE_YELLOW_ABOVE: f64 = 3.0;
pub const GAUGE_AXIS_MAX: f64 = 11.0;

/// Derived factor constants
pub const OZONE_DECAY: f64 = 0.02;
pub const BASE_IRRADIANCE: f64 = 1000.0;
pub const ACTION_SPECTRUM_WEIGHT: f64 = 0.7;

/// Minimal erythemal dose divisor
pub const MED_UV_DIVISOR: f64 = 25.0;

/// Regression defaults
pub const TEST_FRACTION: f64 = 0.2;
pub const SPLIT_SEED: u64 = 42;

/// Forecasting defaults
pub const DEFAULT_FORECAST_DAYS: u32 = 30;
pub const MAX_FORECAST_DAYS: u32 = 3650;
pub const DEFAULT_INTERVAL_WIDTH: f64 = 0.8;
pub const YEARLY_FOURIER_ORDER: usize = 10;
pub const WEEKLY_FOURIER_ORDER: usize = 3;
pub const YEARLY_MIN_SPAN_DAYS: i64 = 730;
pub const WEEKLY_MIN_SPAN_DAYS: i64 = 14;
pub const SEASONALITY_RIDGE: f64 = 0.01;
pub const RISK_TABLE_DAYS: usize = 10;
pub const HISTOGRAM_BINS: usize = 20;
