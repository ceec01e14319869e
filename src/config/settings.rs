use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::utils::{Error, Result};

/// Which program the settings are being loaded for.
///
/// The two programs only differ in their default client id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Publisher,
    Subscriber,
}

impl Role {
    fn default_client_id(self) -> &'static str {
        match self {
            Role::Publisher => "mqtt-rp-pir-pub",
            Role::Subscriber => "mqtt-rp-pir-sub",
        }
    }
}

/// Top-level configuration settings for both programs.
///
/// The subscriber ignores `sensor`; everything else is shared.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub broker: BrokerSettings,
    pub topic: TopicSettings,
    pub sensor: SensorSettings,
    pub shutdown: ShutdownSettings,
}

/// Where and as whom to connect.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BrokerSettings {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive_secs: u64,
}

impl BrokerSettings {
    pub fn uri(&self) -> String {
        format!("tcp://{}:{}", self.host, self.port)
    }

    /// Credentials are only used when both halves are non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }
}

/// The topic published to (or subscribed on) and its delivery level.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TopicSettings {
    pub name: String,
    pub qos: u8,
}

/// Motion sensor wiring and polling cadence.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SensorSettings {
    pub pin: u8,
    pub poll_interval_ms: u64,
    pub gpio_root: PathBuf,
}

/// Timing of the teardown sequence.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ShutdownSettings {
    /// Grace period given to in-flight protocol operations on disconnect.
    pub quiesce_ms: u64,
    /// Upper bound on every shutdown acknowledgement wait.
    pub ack_timeout_ms: u64,
}

impl Settings {
    /// Defaults matching the original command-line flag defaults.
    pub fn for_role(role: Role) -> Self {
        Self {
            broker: BrokerSettings {
                host: "test.mosquitto.org".to_string(),
                port: 1883,
                client_id: role.default_client_id().to_string(),
                username: None,
                password: None,
                keep_alive_secs: 30,
            },
            topic: TopicSettings {
                name: "mqtt-rp-pir".to_string(),
                qos: 0,
            },
            sensor: SensorSettings {
                pin: 7,
                poll_interval_ms: 1000,
                gpio_root: PathBuf::from("/sys/class/gpio"),
            },
            shutdown: ShutdownSettings {
                quiesce_ms: 1000,
                ack_timeout_ms: 10_000,
            },
        }
    }

    /// Rejects values the workers cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.topic.qos > 2 {
            return Err(Error::InvalidQos(self.topic.qos));
        }
        if self.sensor.poll_interval_ms == 0 {
            return Err(Error::InvalidSetting {
                key: "sensor.poll_interval_ms",
                reason: "must be greater than zero",
            });
        }
        if self.shutdown.ack_timeout_ms == 0 {
            return Err(Error::InvalidSetting {
                key: "shutdown.ack_timeout_ms",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.sensor.poll_interval_ms)
    }

    pub fn quiesce(&self) -> Duration {
        Duration::from_millis(self.shutdown.quiesce_ms)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown.ack_timeout_ms)
    }
}

/// Partial configuration settings loaded from files or environment.
///
/// Any subset of settings may be given. Missing values are filled from
/// the role defaults by [`PartialSettings::merge_onto`].
#[derive(Debug, Default, Deserialize)]
pub struct PartialSettings {
    pub broker: Option<PartialBrokerSettings>,
    pub topic: Option<PartialTopicSettings>,
    pub sensor: Option<PartialSensorSettings>,
    pub shutdown: Option<PartialShutdownSettings>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialBrokerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub client_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialTopicSettings {
    pub name: Option<String>,
    pub qos: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialSensorSettings {
    pub pin: Option<u8>,
    pub poll_interval_ms: Option<u64>,
    pub gpio_root: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialShutdownSettings {
    pub quiesce_ms: Option<u64>,
    pub ack_timeout_ms: Option<u64>,
}

impl PartialSettings {
    pub fn merge_onto(self, default: Settings) -> Settings {
        let broker = self.broker.unwrap_or_default();
        let topic = self.topic.unwrap_or_default();
        let sensor = self.sensor.unwrap_or_default();
        let shutdown = self.shutdown.unwrap_or_default();

        Settings {
            broker: BrokerSettings {
                host: broker.host.unwrap_or(default.broker.host),
                port: broker.port.unwrap_or(default.broker.port),
                client_id: broker.client_id.unwrap_or(default.broker.client_id),
                username: broker.username.or(default.broker.username),
                password: broker.password.or(default.broker.password),
                keep_alive_secs: broker
                    .keep_alive_secs
                    .unwrap_or(default.broker.keep_alive_secs),
            },
            topic: TopicSettings {
                name: topic.name.unwrap_or(default.topic.name),
                qos: topic.qos.unwrap_or(default.topic.qos),
            },
            sensor: SensorSettings {
                pin: sensor.pin.unwrap_or(default.sensor.pin),
                poll_interval_ms: sensor
                    .poll_interval_ms
                    .unwrap_or(default.sensor.poll_interval_ms),
                gpio_root: sensor.gpio_root.unwrap_or(default.sensor.gpio_root),
            },
            shutdown: ShutdownSettings {
                quiesce_ms: shutdown.quiesce_ms.unwrap_or(default.shutdown.quiesce_ms),
                ack_timeout_ms: shutdown
                    .ack_timeout_ms
                    .unwrap_or(default.shutdown.ack_timeout_ms),
            },
        }
    }
}
