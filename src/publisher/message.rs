use chrono::{DateTime, Local};

use crate::client::DeliveryLevel;

/// An event waiting to be published.
///
/// Fields are fixed at construction; the publish worker takes the message
/// apart with [`EventMessage::into_parts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMessage {
    topic: String,
    content: String,
    level: DeliveryLevel,
}

impl EventMessage {
    pub fn new(topic: impl Into<String>, content: impl Into<String>, level: DeliveryLevel) -> Self {
        Self {
            topic: topic.into(),
            content: content.into(),
            level,
        }
    }

    /// Motion event stamped with the local time, down to the nanosecond.
    pub fn motion(topic: &str, level: DeliveryLevel, at: DateTime<Local>) -> Self {
        let content = format!(
            "{} motion detected",
            at.format("%Y-%m-%d %H:%M:%S%.9f %:z")
        );
        Self::new(topic, content, level)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn level(&self) -> DeliveryLevel {
        self.level
    }

    pub fn into_parts(self) -> (String, String, DeliveryLevel) {
        (self.topic, self.content, self.level)
    }
}
