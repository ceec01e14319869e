//! Acknowledged quit handshake.
//!
//! ```text
//! orchestrator                          worker
//!   QuitHandle::shutdown ──(ack tx)──►  QuitSignal::recv
//!                                       release resource
//!          ◄──────────── () ──────────  Ack::send
//! ```
//!
//! The quit request carries the acknowledgement channel, so one rendezvous
//! covers both directions. `shutdown` consumes the handle: a worker is asked
//! to stop at most once.

use std::time::Duration;

use tokio::sync::oneshot;
use tracing::debug;

use crate::utils::{Error, Result};

/// Creates the paired ends of a quit handshake for the named worker.
pub fn handshake(worker: &'static str) -> (QuitHandle, QuitSignal) {
    let (tx, rx) = oneshot::channel();
    (QuitHandle { worker, tx }, QuitSignal { worker, rx })
}

/// Orchestrator side: requests termination and waits for it.
#[derive(Debug)]
pub struct QuitHandle {
    worker: &'static str,
    tx: oneshot::Sender<oneshot::Sender<()>>,
}

impl QuitHandle {
    pub fn worker(&self) -> &'static str {
        self.worker
    }

    /// Asks the worker to stop and blocks until it acknowledges, or until
    /// `timeout` elapses.
    pub async fn shutdown(self, timeout: Duration) -> Result<()> {
        let worker = self.worker;
        let (ack_tx, ack_rx) = oneshot::channel();

        if self.tx.send(ack_tx).is_err() {
            return Err(Error::WorkerGone { worker });
        }
        debug!(worker, "quit requested");

        match tokio::time::timeout(timeout, ack_rx).await {
            Ok(Ok(())) => {
                debug!(worker, "quit acknowledged");
                Ok(())
            }
            Ok(Err(_)) => Err(Error::WorkerGone { worker }),
            Err(_) => Err(Error::AckTimeout { worker, timeout }),
        }
    }
}

/// Worker side: observed at the top of every loop iteration.
#[derive(Debug)]
pub struct QuitSignal {
    worker: &'static str,
    rx: oneshot::Receiver<oneshot::Sender<()>>,
}

impl QuitSignal {
    /// Resolves once quit is requested.
    ///
    /// Cancel safe, so it can sit in a `select!` that is re-entered every
    /// iteration. A dropped [`QuitHandle`] also counts as a request, with
    /// nobody waiting for the acknowledgement.
    pub async fn recv(&mut self) -> Ack {
        let reply = (&mut self.rx).await.ok();
        Ack {
            worker: self.worker,
            reply,
        }
    }
}

/// Proof that quit was requested; sending it completes the handshake.
#[derive(Debug)]
#[must_use = "the orchestrator blocks until the ack is sent"]
pub struct Ack {
    worker: &'static str,
    reply: Option<oneshot::Sender<()>>,
}

impl Ack {
    pub fn send(self) {
        match self.reply {
            Some(reply) => {
                // receiver gone means the orchestrator already timed out
                let _ = reply.send(());
            }
            None => debug!(worker = self.worker, "quit handle dropped; nothing to acknowledge"),
        }
    }
}
