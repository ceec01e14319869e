//! Publisher entry point: startup, interrupt wait, acknowledged teardown.
//!
//! ```text
//! Idle → Connecting → Connected → Detecting → Running → Unwinding → Terminated
//!              │                       │                    ▲
//!              └─ error: return        └─ error ────────────┘ (publish worker
//!                                                              stopped first)
//! ```

use std::fmt;
use std::future::Future;

use tracing::{debug, error, info};

use super::{Detection, QUEUE_CAPACITY, connect, detect};
use crate::client::{BrokerClient, DeliveryLevel};
use crate::config::Settings;
use crate::sensor::PinDriver;
use crate::utils::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Connecting,
    Connected,
    Detecting,
    Running,
    Unwinding,
    Terminated,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

struct Progress {
    stage: Stage,
}

impl Progress {
    fn advance(&mut self, next: Stage) {
        debug!(from = %self.stage, to = %next, "publisher stage");
        self.stage = next;
    }
}

/// Runs the publisher until `shutdown` resolves.
///
/// Returns `Ok(())` once both workers acknowledged termination. Startup
/// errors are returned after anything already started has been stopped.
pub async fn run_publisher<C, P, S>(client: C, pin: P, settings: &Settings, shutdown: S) -> Result<()>
where
    C: BrokerClient,
    P: PinDriver,
    S: Future<Output = ()>,
{
    settings.validate()?;
    let level = DeliveryLevel::try_from(settings.topic.qos)?;
    let timeout = settings.ack_timeout();
    let mut progress = Progress { stage: Stage::Idle };

    progress.advance(Stage::Connecting);
    let (sink, publisher) = connect(client, QUEUE_CAPACITY, settings.quiesce()).await?;
    progress.advance(Stage::Connected);

    progress.advance(Stage::Detecting);
    let detection = Detection {
        topic: settings.topic.name.clone(),
        level,
        pin: settings.sensor.pin,
        interval: settings.poll_interval(),
    };
    let detector = match detect(pin, sink, detection) {
        Ok(handle) => handle,
        Err(e) => {
            error!("motion detection failed to start: {}", e);
            progress.advance(Stage::Unwinding);
            if let Err(unwind) = publisher.shutdown(timeout).await {
                error!("{}", unwind);
            }
            progress.advance(Stage::Terminated);
            return Err(e);
        }
    };

    progress.advance(Stage::Running);
    shutdown.await;
    info!("interrupt received; shutting down");

    progress.advance(Stage::Unwinding);
    let (published, detected) =
        tokio::join!(publisher.shutdown(timeout), detector.shutdown(timeout));
    published?;
    detected?;

    progress.advance(Stage::Terminated);
    Ok(())
}
