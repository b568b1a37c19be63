use anyhow::{bail, Context};
use chrono::Days;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::analyzers::{
    describe_time_to_erythema, time_to_erythema, DerivedFactor, DerivedFactorCalculator,
    FeatureSelector, Forecaster,
};
use crate::callbacks::forecast::parse_regressors;
use crate::charts::RiskTableRow;
use crate::cli::args::{Cli, Commands};
use crate::config::{Overrides, Settings};
use crate::models::{Measure, RiskBand, SkinType, StateBoundaries, UvDataset};
use crate::readers::{BoundaryReader, ObservationReader};
use crate::server::{self, AppState};
use crate::utils::constants::{MAX_FORECAST_DAYS, RISK_TABLE_DAYS};
use crate::utils::progress::ProgressReporter;

/// Install the global subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let default = if verbose { "uv_dashboard=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn load_dataset(settings: &Settings) -> anyhow::Result<UvDataset> {
    ObservationReader::new()
        .read_dataset(&settings.data.csv)
        .with_context(|| format!("failed to load {}", settings.data.csv.display()))
}

fn load_boundaries(settings: &Settings, dataset: &UvDataset) -> anyhow::Result<StateBoundaries> {
    let boundaries = BoundaryReader::new()
        .read_boundaries(&settings.data.geojson)
        .with_context(|| format!("failed to load {}", settings.data.geojson.display()))?;

    let unmatched = boundaries.unmatched(dataset.states());
    if !unmatched.is_empty() {
        warn!(
            count = unmatched.len(),
            names = ?unmatched,
            "States without a boundary feature will not be shaded"
        );
    }
    Ok(boundaries)
}

fn pick_state(dataset: &UvDataset, requested: Option<String>) -> anyhow::Result<String> {
    match requested.or_else(|| dataset.default_state().map(str::to_string)) {
        Some(state) => Ok(state),
        None => bail!("the dataset contains no states"),
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let mut overrides = Overrides {
        csv: cli.csv,
        geojson: cli.geojson,
        ..Overrides::default()
    };
    if let Commands::Serve { host, port } = &cli.command {
        overrides.host = host.clone();
        overrides.port = *port;
    }
    let settings = Settings::load(Some(cli.config.as_path()), &overrides)?;

    match cli.command {
        Commands::Serve { .. } => {
            let dataset = load_dataset(&settings)?;
            let boundaries = load_boundaries(&settings, &dataset)?;
            info!(
                states = dataset.states().len(),
                features = boundaries.feature_count(),
                "Starting dashboard"
            );
            server::serve(AppState::new(dataset, boundaries, settings)).await?;
        }

        Commands::Derive {
            state,
            start,
            end,
            factors,
        } => {
            let dataset = load_dataset(&settings)?;
            let state = pick_state(&dataset, state)?;
            let Some((min, max)) = dataset.date_range() else {
                bail!("the dataset is empty");
            };
            let factors = DerivedFactor::parse_list(&factors)?;

            let rows = dataset.for_state_between(&state, start.unwrap_or(min), end.unwrap_or(max));
            let series = DerivedFactorCalculator::new().calculate(&rows, &factors);
            if rows.is_empty() {
                println!("No rows for {} in the selected range", state);
                return Ok(());
            }

            println!("Derived Factor Trends for {}", state);
            let header: Vec<&str> = series.iter().map(|s| s.name).collect();
            println!("{:<12} {}", "Date", header.join(" | "));
            for (i, row) in rows.iter().enumerate() {
                let values: Vec<String> = series.iter().map(|s| format!("{:.4}", s.values[i])).collect();
                println!("{:<12} {}", row.date.to_string(), values.join(" | "));
            }
        }

        Commands::Risk { uv_index, skin } => {
            let band = RiskBand::classify(uv_index);
            println!("UV Index {:.2}: {}", uv_index, band);
            println!("Recommendation: {}", band.recommendation());
            println!("Advisory: {}", band.advisory());
            if let Some(constant) = skin {
                let skin = SkinType::from_constant(constant)?;
                println!(
                    "Skin type {}: {}",
                    skin.label(),
                    describe_time_to_erythema(time_to_erythema(skin, uv_index))
                );
            }
        }

        Commands::Forecast {
            state,
            days,
            regressors,
            start,
        } => {
            let days = days.unwrap_or(settings.forecast.default_days);
            if days > MAX_FORECAST_DAYS {
                bail!("forecast horizon {} exceeds {} days", days, MAX_FORECAST_DAYS);
            }
            let regressors = parse_regressors(regressors.as_deref())?;

            let dataset = load_dataset(&settings)?;
            let state = pick_state(&dataset, state)?;
            let rows = dataset.for_state(&state);

            let progress = ProgressReporter::new_spinner(&format!("Fitting forecast for {}...", state), false);
            let forecaster = Forecaster::new().with_interval_width(settings.forecast.interval_width);
            let cloudy = forecaster.forecast(&rows, Measure::CloudySkyUvi, &regressors, days)?;
            let clear = forecaster.forecast(&rows, Measure::ClearSkyUvi, &[], days)?;
            progress.finish_with_message(&format!("Forecast fitted on {} rows", cloudy.history.len()));

            let Some(last) = cloudy.last_history_date() else {
                bail!("no usable history for {}", state);
            };
            println!("\nForecast for {} (Cloudy Sky UVI)", state);
            println!("{:<12} {:>8} {:>8} {:>8}", "Date", "yhat", "lower", "upper");
            for point in cloudy.points.iter().filter(|p| p.date > last) {
                println!(
                    "{:<12} {:>8.2} {:>8.2} {:>8.2}",
                    point.date.to_string(),
                    point.yhat,
                    point.yhat_lower,
                    point.yhat_upper
                );
            }

            let table_start = start.or_else(|| last.checked_add_days(Days::new(1))).unwrap_or(last);
            println!("\n10-Day Skin Damage Risk Forecast from {}", table_start);
            for row in clear.window(table_start, RISK_TABLE_DAYS).iter().map(RiskTableRow::from_point) {
                println!("{}  {:>6}  {:<10} {}", row.date, row.uv_index, row.risk, row.recommendations);
            }
        }

        Commands::SelectFeatures { state, max_workers } => {
            let dataset = load_dataset(&settings)?;
            let state = pick_state(&dataset, state)?;
            let rows = dataset.for_state(&state);

            let progress = ProgressReporter::new_spinner(
                &format!("Scoring factor combinations for {}...", state),
                false,
            );
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(max_workers)
                .build()
                .context("failed to build worker pool")?;
            let report = pool.install(|| FeatureSelector::new().select(&rows))?;
            progress.finish_with_message("Feature selection complete");

            println!("\n{}", report.summary());
        }

        Commands::Info { sample } => {
            let dataset = load_dataset(&settings)?;
            println!("Observations: {}", dataset.len());
            println!("States: {}", dataset.states().len());
            if let Some((min, max)) = dataset.date_range() {
                println!("Date range: {} to {}", min, max);
            }
            let years: Vec<String> = dataset.years().iter().map(i32::to_string).collect();
            println!("Years: {}", years.join(", "));

            match load_boundaries(&settings, &dataset) {
                Ok(boundaries) => {
                    let unmatched = boundaries.unmatched(dataset.states());
                    println!("Boundary features: {}", boundaries.feature_count());
                    if !unmatched.is_empty() {
                        println!("States without boundaries: {}", unmatched.join(", "));
                    }
                }
                Err(e) => println!("Boundaries unavailable: {:#}", e),
            }

            if sample > 0 {
                println!("\nSample Records (showing {} records):", sample);
                for (i, obs) in dataset.observations().iter().take(sample).enumerate() {
                    println!(
                        "{}. {} on {}: clear={:.2}, cloudy={:.2}, ozone={:.1}",
                        i + 1,
                        obs.name,
                        obs.date,
                        obs.clear_sky_uvi,
                        obs.cloudy_sky_uvi,
                        obs.total_column_ozone
                    );
                }
            }
        }
    }

    Ok(())
}
