//! WISE CLI - build, check and submit fire modelling jobs and run the
//! Builder's calculators.

use clap::Parser;
use wise_client::{config, ServerConfig};

#[derive(Parser)]
#[command(
    name = "wise-cli",
    version,
    about = "Client toolkit for the WISE fire growth Builder"
)]
struct Cli {
    /// JSON file with the Builder and broker endpoints
    #[arg(long, global = true)]
    config: Option<String>,

    /// Builder host, overrides the config file
    #[arg(long, global = true)]
    host: Option<String>,

    /// Builder port, overrides the config file
    #[arg(long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: wise_cmd::Command,
}

impl Cli {
    fn server_config(&self) -> anyhow::Result<ServerConfig> {
        let mut server = match &self.config {
            Some(path) => ServerConfig::from_json_file(path)?,
            None => ServerConfig::default(),
        };
        if let Some(host) = &self.host {
            server.host = host.clone();
        }
        if let Some(port) = self.port {
            server.port = port;
        }
        Ok(server)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let server = cli.server_config()?;
    log::debug!("Using Builder at {}", server.address());
    config::initialize(server.clone());
    wise_cmd::run(cli.command, server).await
}
