//! The `client` module is the boundary to the MQTT protocol client.
//!
//! The lifecycle code only talks to [`BrokerClient`]; [`MqttClient`] is the
//! production implementation on top of `rumqttc`. Operations that the broker
//! acknowledges hand back a [`Receipt`] which the caller awaits.

pub mod mqtt;
pub mod qos;
mod tracker;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::utils::{Error, Result};

pub use mqtt::MqttClient;
pub use qos::DeliveryLevel;

/// Callback invoked with `(topic, payload)` for every message received on a
/// subscribed filter. Runs on the client's network task; keep it short.
pub type MessageHandler = Arc<dyn Fn(&str, &[u8]) + Send + Sync>;

/// The protocol operations the two programs rely on.
///
/// Connection parameters (broker URI, client id, credentials) are fixed when
/// the implementation is constructed.
#[async_trait]
pub trait BrokerClient: Send + 'static {
    /// Establishes the session; returns once the broker accepted it.
    async fn connect(&mut self) -> Result<()>;

    /// Queues a publish. The receipt resolves when the broker acknowledged it
    /// at the requested delivery level.
    async fn publish(
        &mut self,
        level: DeliveryLevel,
        topic: &str,
        payload: Vec<u8>,
    ) -> Result<Receipt>;

    /// Closes the session, giving in-flight operations up to `quiesce` to
    /// settle first. Calling it on a closed client does nothing.
    async fn disconnect(&mut self, quiesce: Duration);

    /// Registers `handler` for `filter` and returns after the broker granted
    /// the subscription.
    async fn subscribe(
        &mut self,
        filter: &str,
        level: DeliveryLevel,
        handler: MessageHandler,
    ) -> Result<()>;

    /// Requests removal of the subscription; the receipt resolves on the
    /// broker's acknowledgement.
    async fn unsubscribe(&mut self, topic: &str) -> Result<Receipt>;
}

/// Completion handle for a broker-acknowledged operation.
#[derive(Debug)]
#[must_use = "a receipt does nothing unless waited on"]
pub struct Receipt {
    rx: oneshot::Receiver<Result<()>>,
}

impl Receipt {
    /// A receipt and the sender that completes it.
    pub fn pending() -> (oneshot::Sender<Result<()>>, Receipt) {
        let (tx, rx) = oneshot::channel();
        (tx, Receipt { rx })
    }

    /// A receipt that is already complete.
    pub fn ready(result: Result<()>) -> Receipt {
        let (tx, receipt) = Self::pending();
        let _ = tx.send(result);
        receipt
    }

    /// Blocks until the operation is acknowledged.
    pub async fn wait(self) -> Result<()> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(Error::Connection("acknowledgement abandoned".to_string())),
        }
    }
}
