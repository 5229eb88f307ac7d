#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command line front end for ride density maps.
//!
//! Loads a ride CSV, applies the configured filters and writes the hex
//! density layer as a `GeoJSON` `FeatureCollection`. Settings come from the
//! compiled-in defaults, an optional `--config` TOML file, and finally the
//! flags below. Set `RUST_LOG` to control log output.

mod config;
mod export;

use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use ride_map_hexbin::{Dataset, QueryOptions};
use ride_map_hexbin_models::PaletteName;
use ride_map_ride_models::DayOfWeek;

use crate::config::{RESOLUTIONS, RideMapConfig};

#[derive(Parser)]
#[command(name = "ride_map_cli", about = "Hex density maps for ride data")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the density layer as `GeoJSON`
    Render(RenderArgs),
    /// Print the filter values found in the data as JSON
    Facets {
        /// Ride CSV export
        #[arg(long)]
        data: PathBuf,
    },
}

#[derive(Args)]
struct RenderArgs {
    /// Ride CSV export
    #[arg(long)]
    data: PathBuf,

    /// TOML file merged over the built-in defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output path (stdout if omitted)
    #[arg(long)]
    out: Option<PathBuf>,

    /// First day to include (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// First hour to include, in half-hour steps
    #[arg(long)]
    start_hour: Option<f64>,

    /// Last hour to include, in half-hour steps
    #[arg(long)]
    end_hour: Option<f64>,

    /// Day of the week to include (repeatable)
    #[arg(long = "weekday", value_parser = parse_weekday)]
    weekdays: Vec<DayOfWeek>,

    /// Travel direction to include (repeatable)
    #[arg(long = "direction")]
    directions: Vec<String>,

    /// Ride type to include
    #[arg(long)]
    ride_type: Option<String>,

    /// Vehicle ID to include (repeatable, `ALL` for every vehicle)
    #[arg(long = "vehicle")]
    vehicles: Vec<String>,

    /// Hex resolution
    #[arg(
        long,
        value_parser = clap::value_parser!(u8)
            .range(i64::from(*RESOLUTIONS.start())..=i64::from(*RESOLUTIONS.end()))
    )]
    resolution: Option<u8>,

    /// Built-in color ramp
    #[arg(long, value_parser = parse_palette)]
    palette: Option<PaletteName>,
}

fn parse_weekday(s: &str) -> Result<DayOfWeek, String> {
    s.parse().map_err(|_| format!("unknown weekday '{s}'"))
}

fn parse_palette(s: &str) -> Result<PaletteName, String> {
    s.parse().map_err(|_| {
        let names: Vec<String> = PaletteName::all().iter().map(ToString::to_string).collect();
        format!("unknown palette '{s}', expected one of {}", names.join(", "))
    })
}

impl RenderArgs {
    /// Applies every flag that was given on top of `config`.
    fn apply(&self, config: &mut RideMapConfig) {
        let filters = &mut config.filters;

        if let Some(date) = self.start_date {
            filters.start_date = Some(date);
        }
        if let Some(date) = self.end_date {
            filters.end_date = Some(date);
        }
        if self.start_hour.is_some() {
            filters.start_hour = self.start_hour;
        }
        if self.end_hour.is_some() {
            filters.end_hour = self.end_hour;
        }
        if !self.weekdays.is_empty() {
            filters.weekdays = Some(self.weekdays.clone());
        }
        if !self.directions.is_empty() {
            filters.directions = Some(self.directions.clone());
        }
        if let Some(ride_type) = &self.ride_type {
            filters.ride_type.clone_from(ride_type);
        }
        if !self.vehicles.is_empty() {
            filters.vehicles.clone_from(&self.vehicles);
        }

        let render = &mut config.render;

        if let Some(resolution) = self.resolution {
            render.resolution = resolution;
        }
        if let Some(palette) = self.palette {
            render.palette = palette;
            render.colors = None;
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => render(&args)?,
        Commands::Facets { data } => {
            let dataset = Dataset::new(ride_map_source::load_csv(&data)?);
            println!("{}", serde_json::to_string_pretty(&dataset.facets())?);
        }
    }

    Ok(())
}

fn render(args: &RenderArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = RideMapConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    let dataset = Dataset::new(ride_map_source::load_csv(&args.data)?);
    let criteria = config.criteria(&dataset.facets())?;
    let options = QueryOptions::new(config.render.resolution)
        .with_alpha(config.render.alpha)
        .with_mapper(config.mapper()?);

    let cells = dataset.query(&criteria, &options)?;
    let populated = cells.iter().filter(|cell| cell.count > 0).count();
    log::info!(
        "Rendered {} cells ({populated} with rides) at resolution {}",
        cells.len(),
        options.resolution
    );

    let collection = export::to_feature_collection(&cells);

    match &args.out {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer(&mut writer, &collection)?;
            writer.flush()?;
            log::info!("Wrote {}", path.display());
        }
        None => println!("{}", serde_json::to_string(&collection)?),
    }

    Ok(())
}
