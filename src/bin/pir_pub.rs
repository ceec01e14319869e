//! Motion publisher
//!
//! Polls the PIR sensor and publishes a "motion detected" event for every
//! active reading until SIGINT, SIGTERM or SIGQUIT.

use std::process::ExitCode;

use clap::Parser;
use pirbridge::client::MqttClient;
use pirbridge::config::{Cli, Role, load_with_cli};
use pirbridge::lifecycle::Interrupts;
use pirbridge::publisher::run_publisher;
use pirbridge::sensor::SysfsPin;
use pirbridge::utils::{Result, logging};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    if let Err(e) = run(&cli).await {
        error!("Publisher failed: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: &Cli) -> Result<()> {
    let mut interrupts = Interrupts::register()?;
    let settings = load_with_cli(Role::Publisher, cli)?;

    let client = MqttClient::new(&settings.broker);
    let pin = SysfsPin::new(settings.sensor.gpio_root.clone());

    run_publisher(client, pin, &settings, interrupts.recv()).await?;
    info!("publisher terminated");
    Ok(())
}
