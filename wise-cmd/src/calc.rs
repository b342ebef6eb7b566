//! Calculator subcommands.

use log::info;
use serde::Serialize;
use wise_client::{ServerConfig, WireClient};
use wise_core::calc::{fbp::FbpCalculation, fwi::FwiCalculation, solar::SolarCalculation};

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn run_fbp(config: ServerConfig, request: &FbpCalculation) -> anyhow::Result<()> {
    let result = WireClient::new(config).fbp(request).await?;
    if !result.is_calculated {
        anyhow::bail!("Builder could not calculate FBP for fuel {}", request.fuel_type);
    }
    print_json(&result)
}

pub async fn run_fwi(config: ServerConfig, request: &FwiCalculation) -> anyhow::Result<()> {
    let result = WireClient::new(config).fwi(request).await?;
    if !result.is_calculated {
        anyhow::bail!("Builder could not calculate FWI for {}", request.time);
    }
    print_json(&result)
}

pub async fn run_solar(config: ServerConfig, request: &SolarCalculation) -> anyhow::Result<()> {
    let result = WireClient::new(config).solar(request).await?;
    if !result.is_calculated {
        anyhow::bail!("Builder could not calculate sun times for {}", request.date);
    }
    print_json(&result)
}

pub async fn run_fuels(config: ServerConfig) -> anyhow::Result<()> {
    let fuels = WireClient::new(config).list_fuels().await?;
    info!("Builder knows {} fuel types", fuels.len());
    print_json(&fuels)
}

pub async fn run_fuel_defaults(config: ServerConfig) -> anyhow::Result<()> {
    let defaults = WireClient::new(config).fuel_defaults().await?;
    info!("Received defaults for {} fuel types", defaults.len());
    print_json(&defaults)
}

pub async fn run_cities(config: ServerConfig, province: &str) -> anyhow::Result<()> {
    let cities = WireClient::new(config).forecast_cities(province).await?;
    info!("{} forecast cities in {province}", cities.len());
    print_json(&cities)
}
