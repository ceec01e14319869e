mod cli;
mod settings;

use std::path::Path;

use config::{Config, Environment, File};

use crate::utils::Result;

pub use cli::Cli;
pub use settings::{
    BrokerSettings, PartialSettings, Role, SensorSettings, Settings, ShutdownSettings,
    TopicSettings,
};

/// Loads the configuration for `role` from a file and `PIR_*` environment
/// variables, then merges it over the role defaults.
///
/// Without an explicit `path` the optional `config/default.*` file is used.
/// Nested keys are separated by a double underscore, e.g.
/// `PIR_BROKER__HOST` or `PIR_SHUTDOWN__ACK_TIMEOUT_MS`.
pub fn load_config(role: Role, path: Option<&Path>) -> Result<Settings> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name("config/default").required(false),
    };

    let builder = Config::builder().add_source(file).add_source(
        Environment::with_prefix("PIR")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;

    let settings = partial.merge_onto(Settings::for_role(role));
    settings.validate()?;
    Ok(settings)
}

/// Full load used by the binaries: file, environment, then command line.
pub fn load_with_cli(role: Role, cli: &Cli) -> Result<Settings> {
    let mut settings = load_config(role, cli.config.as_deref())?;
    cli.apply(&mut settings);
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests;
