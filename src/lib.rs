//! # pirbridge
//!
//! `pirbridge` bridges a PIR motion sensor to an MQTT broker. The publisher
//! polls a GPIO line and publishes a timestamped event for every tick the line
//! reads active; the subscriber logs every message on the same topic.
//!
//! ## Core Modules
//!
//! - `client`: The broker client abstraction and its `rumqttc` implementation.
//! - `config`: Layered configuration (defaults, file, environment, command line).
//! - `lifecycle`: Acknowledged quit handshake and interrupt registration.
//! - `publisher`: Motion detector, message queue, publish worker and orchestrator.
//! - `sensor`: The pin driver abstraction and a sysfs GPIO implementation.
//! - `subscriber`: Subscription manager and the default logging handler.
//! - `utils`: Shared utilities, such as error handling and logging.

pub mod client;
pub mod config;
pub mod lifecycle;
pub mod publisher;
pub mod sensor;
pub mod subscriber;
pub mod utils;

#[cfg(test)]
mod test_support;
