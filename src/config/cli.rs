use std::path::PathBuf;

use clap::{ArgAction, Parser};

use super::Settings;

/// Command-line flags shared by `pir-pub` and `pir-sub`.
///
/// `-h` is the broker host, so help is only reachable as `--help`.
#[derive(Debug, Parser)]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// MQTT broker host name
    #[arg(short = 'h', long)]
    pub host: Option<String>,

    /// MQTT broker port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Client id presented to the broker
    #[arg(short = 'c', long = "client-id")]
    pub client_id: Option<String>,

    /// User name for broker authentication
    #[arg(short = 'u', long)]
    pub username: Option<String>,

    /// Password for broker authentication
    #[arg(long = "pw", alias = "password")]
    pub password: Option<String>,

    /// Topic to publish to or subscribe on
    #[arg(short = 't', long)]
    pub topic: Option<String>,

    /// Delivery level (0, 1 or 2)
    #[arg(short = 'q', long, value_parser = clap::value_parser!(u8).range(0..=2))]
    pub qos: Option<u8>,

    /// Configuration file (defaults to config/default.*, if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level: error, warn, info, debug or trace
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

impl Cli {
    /// Flags take precedence over every other configuration source.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(host) = &self.host {
            settings.broker.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.broker.port = port;
        }
        if let Some(client_id) = &self.client_id {
            settings.broker.client_id = client_id.clone();
        }
        if let Some(username) = &self.username {
            settings.broker.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            settings.broker.password = Some(password.clone());
        }
        if let Some(topic) = &self.topic {
            settings.topic.name = topic.clone();
        }
        if let Some(qos) = self.qos {
            settings.topic.qos = qos;
        }
    }
}
