//! Connection manager and publish worker.
//!
//! [`connect`] owns the broker session from the moment it is established:
//! the client moves into the publish worker, and only the worker's shutdown
//! path disconnects it. Publishes are strictly sequential; each one is
//! acknowledged before the next message is dequeued.

use std::time::Duration;

use tracing::{info, warn};

use super::EventMessage;
use super::queue::{self, MessageSink, MessageSource};
use crate::client::BrokerClient;
use crate::lifecycle::{QuitHandle, QuitSignal, handshake};
use crate::utils::Result;

pub const PUBLISH_WORKER: &str = "publish worker";

/// Connects `client` and starts the publish worker.
///
/// On failure nothing has been spawned and no channel exists.
pub async fn connect<C: BrokerClient>(
    mut client: C,
    capacity: usize,
    quiesce: Duration,
) -> Result<(MessageSink, QuitHandle)> {
    info!("connecting to broker...");
    client.connect().await?;
    info!("connected to broker");

    let (sink, source) = queue::channel(capacity);
    let (handle, signal) = handshake(PUBLISH_WORKER);
    tokio::spawn(publish_worker(client, source, signal, quiesce));

    Ok((sink, handle))
}

async fn publish_worker<C: BrokerClient>(
    mut client: C,
    mut source: MessageSource,
    mut quit: QuitSignal,
    quiesce: Duration,
) {
    let ack = loop {
        tokio::select! {
            biased;
            ack = quit.recv() => break ack,
            Some(message) = source.recv() => publish_one(&mut client, message).await,
        }
    };

    let discarded = source.len();
    if discarded > 0 {
        warn!(discarded, "dropping unpublished messages");
    }
    drop(source);

    info!("disconnecting from broker...");
    client.disconnect(quiesce).await;
    info!("disconnected from broker");
    ack.send();
}

/// Failures are logged and the message is dropped; nothing is retried.
async fn publish_one<C: BrokerClient>(client: &mut C, message: EventMessage) {
    let (topic, content, level) = message.into_parts();

    info!(%topic, %level, "publishing...");
    let receipt = match client.publish(level, &topic, content.into_bytes()).await {
        Ok(receipt) => receipt,
        Err(e) => {
            warn!("publish to {} failed: {}", topic, e);
            return;
        }
    };

    match receipt.wait().await {
        Ok(()) => info!(%topic, "published"),
        Err(e) => warn!("publish to {} was not acknowledged: {}", topic, e),
    }
}
