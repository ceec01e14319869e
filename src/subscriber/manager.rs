//! Subscription manager.
//!
//! Connect, subscribe, wait for the interrupt, then tear down in order:
//! unsubscribe and wait for the broker's acknowledgement, then disconnect.
//! Unsubscribe runs whenever the subscription was granted; disconnect runs
//! whenever the connection was made. The wait for the unsubscribe
//! acknowledgement is bounded by `shutdown.ack_timeout_ms`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::client::{BrokerClient, DeliveryLevel, MessageHandler};
use crate::config::Settings;
use crate::utils::{Error, Result};

pub const SUBSCRIPTION: &str = "subscription";

/// Handler that logs the topic and payload of each received message.
pub fn log_handler() -> MessageHandler {
    Arc::new(|topic: &str, payload: &[u8]| {
        info!(
            "message received\nTopic: {}\nMessage: {}",
            topic,
            String::from_utf8_lossy(payload)
        );
    })
}

/// Runs the subscriber until `shutdown` resolves.
pub async fn run_subscriber<C, S>(
    mut client: C,
    settings: &Settings,
    handler: MessageHandler,
    shutdown: S,
) -> Result<()>
where
    C: BrokerClient,
    S: Future<Output = ()>,
{
    settings.validate()?;
    let level = DeliveryLevel::try_from(settings.topic.qos)?;

    info!("connecting to broker {}...", settings.broker.uri());
    client.connect().await?;
    info!("connected to broker");

    let outcome = subscribed(
        &mut client,
        &settings.topic.name,
        level,
        handler,
        shutdown,
        settings.ack_timeout(),
    )
    .await;

    info!("disconnecting from broker...");
    client.disconnect(settings.quiesce()).await;
    info!("disconnected from broker");

    outcome
}

async fn subscribed<C, S>(
    client: &mut C,
    topic: &str,
    level: DeliveryLevel,
    handler: MessageHandler,
    shutdown: S,
    ack_timeout: Duration,
) -> Result<()>
where
    C: BrokerClient,
    S: Future<Output = ()>,
{
    info!(%topic, %level, "starting subscription...");
    client.subscribe(topic, level, handler).await?;
    info!("subscription started");

    shutdown.await;

    info!("ending subscription...");
    let receipt = client.unsubscribe(topic).await?;
    match tokio::time::timeout(ack_timeout, receipt.wait()).await {
        Ok(acked) => acked?,
        Err(_) => {
            warn!(%topic, "no unsubscribe acknowledgement within {:?}", ack_timeout);
            return Err(Error::AckTimeout {
                worker: SUBSCRIPTION,
                timeout: ack_timeout,
            });
        }
    }
    info!("subscription ended");
    Ok(())
}
