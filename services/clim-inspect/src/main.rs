//! Climatology data inspector.
//!
//! Loads the overlay data directory and prints query results as JSON:
//! dataset availability, point values, isoline sets, cyclone segment
//! counts, El Niño phases and wind-rose summaries.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use archive_parser::Basin;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use clim_common::{BoundingBox, Domain, Month, Viewport};
use climatology::OverlayConfig;
use renderer::IsoLineSettings;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use commands::{parse_basin, parse_bbox, parse_date, parse_domain, parse_month, TrackQuery};

#[derive(Parser, Debug)]
#[command(name = "clim-inspect")]
#[command(about = "Inspect climatology overlay data")]
struct Args {
    /// YAML configuration file (default: CLIMATOLOGY_* environment variables)
    #[arg(short, long, env = "CLIMATOLOGY_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory, overriding the configuration
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Month slot 0..=12 or "annual", overriding the configuration
    #[arg(short, long, value_parser = parse_month)]
    month: Option<Month>,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Which datasets loaded, and how many tracks per basin
    Summary,

    /// Value of a domain at a point
    Value {
        #[arg(long, value_parser = parse_domain)]
        domain: Domain,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },

    /// Isoline levels of a domain
    Isolines {
        #[arg(long, value_parser = parse_domain)]
        domain: Domain,
        /// Level spacing (default: configured)
        #[arg(long)]
        spacing: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        min: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        max: Option<f64>,
    },

    /// Cyclone segments passing a filter
    Tracks {
        /// Basins to include (default: all)
        #[arg(long, value_parser = parse_basin, value_delimiter = ',')]
        basin: Vec<Basin>,
        /// Calendar month slot; "annual" keeps every month
        #[arg(long, value_parser = parse_month)]
        track_month: Option<Month>,
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,
        #[arg(long, value_parser = parse_date)]
        end: Option<NaiveDate>,
        #[arg(long)]
        min_wind: Option<f64>,
        #[arg(long)]
        max_pressure: Option<f64>,
        /// Include wave and unknown phases
        #[arg(long)]
        all_phases: bool,
        /// Viewport as min_lon,min_lat,max_lon,max_lat
        #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true, default_value = "-180,-90,180,90")]
        bbox: BoundingBox,
        #[arg(long, default_value_t = 1440)]
        width: u32,
        #[arg(long, default_value_t = 720)]
        height: u32,
    },

    /// El Niño phase of a month
    Elnino {
        #[arg(long)]
        year: i32,
        /// Calendar month 1..=12
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,
    },

    /// Wind-rose summaries for a viewport
    Atlas {
        #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
        bbox: BoundingBox,
        #[arg(long, default_value_t = 800)]
        width: u32,
        #[arg(long, default_value_t = 600)]
        height: u32,
    },

    /// Write a domain's full-globe overlay raster as PNG
    Raster {
        #[arg(long, value_parser = parse_domain)]
        domain: Domain,
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.json_logs);

    let mut config = match &args.config {
        Some(path) => OverlayConfig::from_yaml(path)?,
        None => OverlayConfig::from_env()?,
    };
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    info!(data_dir = %config.data_dir.display(), "Starting climatology inspector");

    let mut overlay = commands::open_overlay(config)?;
    if let Some(month) = args.month {
        overlay.set_month(month);
    }

    match args.command {
        Command::Summary => print_json(&commands::summary(&overlay)),
        Command::Value { domain, lat, lon } => print_json(&commands::value(&overlay, domain, lat, lon)),
        Command::Isolines {
            domain,
            spacing,
            min,
            max,
        } => {
            let configured = *overlay.config().isolines.get(domain);
            let settings = IsoLineSettings::new(
                spacing.unwrap_or(configured.spacing),
                min.unwrap_or(configured.min),
                max.unwrap_or(configured.max),
            );
            print_json(&commands::isolines(&mut overlay, domain, &settings)?)
        }
        Command::Tracks {
            basin,
            track_month,
            start,
            end,
            min_wind,
            max_pressure,
            all_phases,
            bbox,
            width,
            height,
        } => {
            let query = TrackQuery {
                basins: basin,
                month: track_month,
                start,
                end,
                min_wind,
                max_pressure,
                all_phases,
            };
            let viewport = Viewport::new(bbox, width, height);
            print_json(&commands::tracks(&overlay, &query, &viewport))
        }
        Command::Elnino { year, month } => print_json(&commands::elnino(&overlay, year, month)),
        Command::Atlas { bbox, width, height } => {
            let viewport = Viewport::new(bbox, width, height);
            print_json(&commands::atlas(&overlay, &viewport))
        }
        Command::Raster { domain, output } => {
            let (width, height) = commands::raster(&overlay, domain, &output)?;
            print_json(&serde_json::json!({
                "domain": domain,
                "path": output.display().to_string(),
                "width": width,
                "height": height,
            }))
        }
    }
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
