//! Bounded FIFO between the detector and the publish worker.
//!
//! A full queue makes the producer wait; messages are never dropped on
//! enqueue.

use tokio::sync::mpsc;

use super::EventMessage;
use crate::utils::{Error, Result};

/// Room for bursts while a publish round-trip is in flight.
pub const QUEUE_CAPACITY: usize = 1024;

pub fn channel(capacity: usize) -> (MessageSink, MessageSource) {
    let (tx, rx) = mpsc::channel(capacity);
    (MessageSink { tx }, MessageSource { rx })
}

/// Write-only end handed to producers.
#[derive(Debug, Clone)]
pub struct MessageSink {
    tx: mpsc::Sender<EventMessage>,
}

impl MessageSink {
    /// Waits for capacity, then enqueues. Fails once the consumer is gone.
    pub async fn send(&self, message: EventMessage) -> Result<()> {
        self.tx.send(message).await.map_err(|_| Error::QueueClosed)
    }
}

/// Read end owned by the single consumer.
#[derive(Debug)]
pub struct MessageSource {
    rx: mpsc::Receiver<EventMessage>,
}

impl MessageSource {
    /// Next message in enqueue order; `None` once every sink is dropped and
    /// the queue is drained. Cancel safe.
    pub async fn recv(&mut self) -> Option<EventMessage> {
        self.rx.recv().await
    }

    /// Messages currently waiting.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
