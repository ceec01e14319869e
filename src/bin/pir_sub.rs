//! Motion subscriber
//!
//! Subscribes to the motion topic and logs every message until SIGINT,
//! SIGTERM or SIGQUIT.

use std::process::ExitCode;

use clap::Parser;
use pirbridge::client::MqttClient;
use pirbridge::config::{Cli, Role, load_with_cli};
use pirbridge::lifecycle::Interrupts;
use pirbridge::subscriber::{log_handler, run_subscriber};
use pirbridge::utils::{Result, logging};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    if let Err(e) = run(&cli).await {
        error!("Subscriber failed: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: &Cli) -> Result<()> {
    let mut interrupts = Interrupts::register()?;
    let settings = load_with_cli(Role::Subscriber, cli)?;

    let client = MqttClient::new(&settings.broker);
    run_subscriber(client, &settings, log_handler(), interrupts.recv()).await?;
    info!("subscriber terminated");
    Ok(())
}
