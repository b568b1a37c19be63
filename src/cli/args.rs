use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::utils::constants::DEFAULT_CONFIG_FILE;

#[derive(Parser)]
#[command(name = "uv-dashboard")]
#[command(about = "Interactive UV Index analytics dashboard")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE, help = "Settings file (optional)")]
    pub config: PathBuf,

    #[arg(long, global = true, help = "UV observations CSV [default: todaysdata.csv]")]
    pub csv: Option<PathBuf>,

    #[arg(long, global = true, help = "State boundaries GeoJSON [default: us-states.json]")]
    pub geojson: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the dashboard web server
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print derived factors for a state over a date range
    Derive {
        #[arg(short, long)]
        state: Option<String>,

        #[arg(long, help = "First date (YYYY-MM-DD) [default: first date in data]")]
        start: Option<NaiveDate>,

        #[arg(long, help = "Last date (YYYY-MM-DD) [default: last date in data]")]
        end: Option<NaiveDate>,

        #[arg(short, long, default_value = "direct_diffuse,uv_attenuation")]
        factors: String,
    },

    /// Classify a UV index and optionally compute time to erythema
    Risk {
        #[arg(help = "UV index value")]
        uv_index: f64,

        #[arg(long, help = "Skin type constant (200, 300, 400, 600, 800, 1000)")]
        skin: Option<u32>,
    },

    /// Forecast a state's Cloudy Sky UVI and print a 10-day risk table
    Forecast {
        #[arg(short, long)]
        state: Option<String>,

        #[arg(short, long, help = "Days beyond the last observation [default: from settings]")]
        days: Option<u32>,

        #[arg(short, long, help = "Extra regressors, comma-separated")]
        regressors: Option<String>,

        #[arg(long, help = "Risk table start date [default: day after the data ends]")]
        start: Option<NaiveDate>,
    },

    /// Find the factor combination that best predicts Cloudy Sky UVI
    SelectFeatures {
        #[arg(short, long)]
        state: Option<String>,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,
    },

    /// Display a summary of the loaded data
    Info {
        #[arg(long, default_value = "5")]
        sample: usize,
    },
}
