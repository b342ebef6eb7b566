//! Command implementations for the WISE CLI.
//!
//! Calculator subcommands run one exchange against the Builder and print
//! the parsed answer as JSON. Job subcommands load a job from a JSON file
//! and check, render or submit it.

use chrono::{NaiveDate, NaiveDateTime};
use clap::Subcommand;
use wise_client::ServerConfig;
use wise_utils::dates;

pub mod calc;
pub mod job;

#[derive(Subcommand)]
pub enum Command {
    /// Fire behaviour prediction for a single point
    Fbp {
        /// FBP fuel type, e.g. C-2
        #[arg(long)]
        fuel: String,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        #[arg(long, default_value_t = 0.0)]
        elevation: f64,

        /// Percent slope
        #[arg(long, default_value_t = 0.0)]
        slope: f64,

        #[arg(long, default_value_t = 0.0)]
        aspect: f64,

        /// Wind speed (km/h)
        #[arg(long)]
        ws: f64,

        /// Wind direction (degrees)
        #[arg(long, default_value_t = 0.0)]
        wd: f64,

        #[arg(long)]
        ffmc: f64,

        #[arg(long)]
        dmc: f64,

        #[arg(long)]
        dc: f64,

        /// Calculated from DMC and DC when omitted
        #[arg(long)]
        bui: Option<f64>,

        /// Ignition time, YYYY-MM-DDTHH:MM:SS
        #[arg(long, value_parser = date_time)]
        time: NaiveDateTime,

        /// Minutes since ignition
        #[arg(long, default_value_t = 60.0)]
        elapsed: f64,

        #[arg(long)]
        cbh: Option<f64>,

        #[arg(long)]
        percent_conifer: Option<f64>,

        #[arg(long)]
        percent_dead_fir: Option<f64>,

        #[arg(long)]
        curing: Option<f64>,

        #[arg(long)]
        fuel_load: Option<f64>,
    },

    /// Fire weather index codes from yesterday's codes and today's weather
    Fwi {
        #[arg(long, value_parser = date_time)]
        time: NaiveDateTime,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        #[arg(long)]
        ffmc: f64,

        #[arg(long)]
        dmc: f64,

        #[arg(long)]
        dc: f64,

        /// Previous hourly FFMC
        #[arg(long)]
        hffmc: f64,

        #[arg(long, allow_hyphen_values = true)]
        temp: f64,

        #[arg(long)]
        rh: f64,

        #[arg(long, default_value_t = 0.0)]
        precip: f64,

        #[arg(long)]
        ws: f64,

        /// Step the hourly FFMC with Lawson's equation instead of Van Wagner's
        #[arg(long)]
        lawson: bool,
    },

    /// Sunrise, solar noon and sunset
    Solar {
        /// YYYY-MM-DD
        #[arg(long, value_parser = date)]
        date: NaiveDate,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Hours from UTC for the reported times
        #[arg(long, allow_hyphen_values = true, default_value_t = 0.0)]
        utc_offset: f64,
    },

    /// List the fuel types the Builder knows
    Fuels,

    /// Default FBP inputs for every fuel type
    FuelDefaults,

    /// Cities with weather forecasts in a province
    Cities {
        /// Two-letter province code, e.g. AB
        #[arg(long)]
        province: String,
    },

    /// Check a job file and print every problem found
    Validate {
        /// Path to a job JSON file
        #[arg(short, long)]
        job: String,
    },

    /// Print the records a job file would send to the Builder
    Render {
        #[arg(short, long)]
        job: String,
    },

    /// Validate a job file, upload it and start it
    Submit {
        #[arg(short, long)]
        job: String,

        /// Ask the Builder to only validate the job
        #[arg(long)]
        validate_only: bool,
    },
}

fn date_time(s: &str) -> Result<NaiveDateTime, String> {
    dates::parse_date_time(s).map_err(|e| e.to_string())
}

fn date(s: &str) -> Result<NaiveDate, String> {
    dates::parse_date(s).map_err(|e| e.to_string())
}

pub async fn run(command: Command, config: ServerConfig) -> anyhow::Result<()> {
    match command {
        Command::Fbp {
            fuel,
            lat,
            lon,
            elevation,
            slope,
            aspect,
            ws,
            wd,
            ffmc,
            dmc,
            dc,
            bui,
            time,
            elapsed,
            cbh,
            percent_conifer,
            percent_dead_fir,
            curing,
            fuel_load,
        } => {
            let request = wise_core::calc::fbp::FbpCalculation {
                fuel_type: fuel,
                latitude: lat,
                longitude: lon,
                elevation,
                slope,
                aspect,
                wind_speed: ws,
                wind_direction: wd,
                ffmc,
                dmc,
                dc,
                bui,
                start_time: time,
                elapsed_time: elapsed,
                crown_base_height: cbh,
                percent_conifer,
                percent_dead_fir,
                grass_curing: curing,
                grass_fuel_load: fuel_load,
            };
            calc::run_fbp(config, &request).await
        }
        Command::Fwi {
            time,
            lat,
            lon,
            ffmc,
            dmc,
            dc,
            hffmc,
            temp,
            rh,
            precip,
            ws,
            lawson,
        } => {
            let method = if lawson {
                wise_core::calc::fwi::HourlyFfmcMethod::Lawson
            } else {
                wise_core::calc::fwi::HourlyFfmcMethod::VanWagner
            };
            let request = wise_core::calc::fwi::FwiCalculation {
                time,
                latitude: lat,
                longitude: lon,
                previous_ffmc: ffmc,
                previous_dmc: dmc,
                previous_dc: dc,
                previous_hourly_ffmc: hffmc,
                temperature: temp,
                relative_humidity: rh,
                precipitation: precip,
                wind_speed: ws,
                method,
            };
            calc::run_fwi(config, &request).await
        }
        Command::Solar {
            date,
            lat,
            lon,
            utc_offset,
        } => {
            let request = wise_core::calc::solar::SolarCalculation {
                date,
                latitude: lat,
                longitude: lon,
                utc_offset,
            };
            calc::run_solar(config, &request).await
        }
        Command::Fuels => calc::run_fuels(config).await,
        Command::FuelDefaults => calc::run_fuel_defaults(config).await,
        Command::Cities { province } => calc::run_cities(config, &province).await,
        Command::Validate { job } => job::run_validate(&job),
        Command::Render { job } => job::run_render(&job),
        Command::Submit { job, validate_only } => {
            job::run_submit(config, &job, validate_only).await
        }
    }
}
