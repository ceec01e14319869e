//! Motion detector worker.
//!
//! Polls the pin once per interval and enqueues one event for every tick on
//! which the line reads active. There is no edge detection: a sensor held
//! high produces an event per tick.

use std::time::Duration;

use chrono::Local;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::{EventMessage, MessageSink};
use crate::client::DeliveryLevel;
use crate::lifecycle::{QuitHandle, QuitSignal, handshake};
use crate::sensor::{PinDriver, PinState};
use crate::utils::{Error, Result};

pub const DETECTOR: &str = "detector";

/// What to watch and where to report it.
#[derive(Debug, Clone)]
pub struct Detection {
    pub topic: String,
    pub level: DeliveryLevel,
    pub pin: u8,
    pub interval: Duration,
}

/// Acquires the pin and starts polling it.
///
/// Fails without spawning anything if the interval is zero or the pin cannot
/// be acquired. Must be called from inside the tokio runtime.
pub fn detect<P: PinDriver>(
    mut pin: P,
    sink: MessageSink,
    detection: Detection,
) -> Result<QuitHandle> {
    if detection.interval.is_zero() {
        return Err(Error::InvalidSetting {
            key: "sensor.poll_interval_ms",
            reason: "must be greater than zero",
        });
    }

    pin.open()?;
    if let Err(e) = pin.configure_as_input(detection.pin) {
        pin.close();
        return Err(e);
    }
    info!(pin = detection.pin, "motion detection ready");

    let (handle, signal) = handshake(DETECTOR);
    tokio::spawn(poll_pin(pin, sink, detection, signal));
    Ok(handle)
}

async fn poll_pin<P: PinDriver>(
    mut pin: P,
    sink: MessageSink,
    detection: Detection,
    mut quit: QuitSignal,
) {
    let mut ticker = tokio::time::interval(detection.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let ack = loop {
        tokio::select! {
            biased;
            ack = quit.recv() => break ack,
            _ = ticker.tick() => {}
        }

        match pin.read_state() {
            Ok(PinState::Active) => {}
            Ok(PinState::Inactive) => continue,
            Err(e) => {
                warn!("pin read failed: {}", e);
                continue;
            }
        }

        info!("motion detected");
        let message = EventMessage::motion(&detection.topic, detection.level, Local::now());

        // a full queue must not hold up shutdown
        tokio::select! {
            biased;
            ack = quit.recv() => break ack,
            sent = sink.send(message) => {
                if let Err(e) = sent {
                    warn!("motion event not queued: {}", e);
                }
            }
        }
    };

    pin.close();
    drop(sink);
    ack.send();
}
