//! Crate-wide error type.
//!
//! Startup failures (broker connect, pin open) are fatal to the programs;
//! per-message publish failures are logged by the publish worker and never
//! leave it. Handshake failures only appear when a worker stops answering.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid delivery level {0}; expected 0, 1 or 2")]
    InvalidQos(u8),

    #[error("invalid setting `{key}`: {reason}")]
    InvalidSetting {
        key: &'static str,
        reason: &'static str,
    },

    #[error("invalid topic filter `{0}`")]
    InvalidTopicFilter(String),

    #[error("broker connection failed: {0}")]
    Connect(String),

    #[error("broker connection lost: {0}")]
    Connection(String),

    #[error("client request failed: {0}")]
    Client(String),

    #[error("broker rejected subscription to `{0}`")]
    SubscribeRejected(String),

    #[error("client is not connected")]
    NotConnected,

    #[error("message queue is closed")]
    QueueClosed,

    #[error("gpio {}: {source}", .path.display())]
    Gpio {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("pin has not been configured as an input")]
    PinNotConfigured,

    #[error("{worker} did not acknowledge shutdown within {timeout:?}")]
    AckTimeout {
        worker: &'static str,
        timeout: Duration,
    },

    #[error("{worker} exited without acknowledging shutdown")]
    WorkerGone { worker: &'static str },

    #[error("signal registration failed: {0}")]
    Signal(#[source] std::io::Error),
}

impl From<rumqttc::ClientError> for Error {
    fn from(err: rumqttc::ClientError) -> Self {
        Error::Client(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
