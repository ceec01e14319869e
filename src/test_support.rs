//! Recording fakes for the broker client and the pin driver.
//!
//! Both are cheap to clone; a test keeps one clone to script behaviour and
//! inspect the call log while the other is moved into the code under test.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::client::{BrokerClient, DeliveryLevel, MessageHandler, Receipt};
use crate::sensor::{PinDriver, PinState};
use crate::utils::{Error, Result};

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect,
    Publish {
        level: DeliveryLevel,
        topic: String,
        payload: String,
    },
    /// The broker acknowledged the publish with this payload.
    PubAck(String),
    Disconnect,
    Subscribe {
        filter: String,
        level: DeliveryLevel,
    },
    Unsubscribe(String),
    /// The broker acknowledged the unsubscription.
    UnsubAck(String),
}

#[derive(Default)]
pub(crate) struct ClientState {
    calls: Mutex<Vec<Call>>,
    handlers: Mutex<Vec<(String, MessageHandler)>>,
    publishes: AtomicUsize,
}

/// Scripted stand-in for a broker connection.
#[derive(Clone, Default)]
pub struct FakeClient {
    pub(crate) state: Arc<ClientState>,
    pub fail_connect: bool,
    pub fail_subscribe: bool,
    /// 1-based publish numbers whose receipt resolves with an error.
    pub reject_publishes: Vec<usize>,
    pub ack_delay: Duration,
    /// Time `disconnect` blocks for, beyond the quiesce period.
    pub disconnect_delay: Duration,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ack_delay(ack_delay: Duration) -> Self {
        Self {
            ack_delay,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        guard(&self.state.calls).clone()
    }

    pub fn published(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Publish { .. }))
            .collect()
    }

    pub fn count_acks(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::PubAck(_)))
            .count()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    /// Simulates the broker pushing a message to this client.
    pub fn deliver(&self, topic: &str, payload: &[u8]) {
        let handlers: Vec<MessageHandler> = guard(&self.state.handlers)
            .iter()
            .filter(|(filter, _)| filter == topic)
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(topic, payload);
        }
    }

    fn record(&self, call: Call) {
        guard(&self.state.calls).push(call);
    }

    fn acknowledge_later(&self, ack: Call, result: Result<()>) -> Receipt {
        let (done, receipt) = Receipt::pending();
        let state = self.state.clone();
        let delay = self.ack_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if result.is_ok() {
                guard(&state.calls).push(ack);
            }
            let _ = done.send(result);
        });
        receipt
    }
}

#[async_trait]
impl BrokerClient for FakeClient {
    async fn connect(&mut self) -> Result<()> {
        self.record(Call::Connect);
        if self.fail_connect {
            return Err(Error::Connect("tcp://fake:1883: connection refused".to_string()));
        }
        Ok(())
    }

    async fn publish(
        &mut self,
        level: DeliveryLevel,
        topic: &str,
        payload: Vec<u8>,
    ) -> Result<Receipt> {
        let payload = String::from_utf8_lossy(&payload).into_owned();
        self.record(Call::Publish {
            level,
            topic: topic.to_string(),
            payload: payload.clone(),
        });

        let number = self.state.publishes.fetch_add(1, Ordering::SeqCst) + 1;
        let result = if self.reject_publishes.contains(&number) {
            Err(Error::Connection("broker went away".to_string()))
        } else {
            Ok(())
        };
        Ok(self.acknowledge_later(Call::PubAck(payload), result))
    }

    async fn disconnect(&mut self, _quiesce: Duration) {
        tokio::time::sleep(self.disconnect_delay).await;
        self.record(Call::Disconnect);
    }

    async fn subscribe(
        &mut self,
        filter: &str,
        level: DeliveryLevel,
        handler: MessageHandler,
    ) -> Result<()> {
        self.record(Call::Subscribe {
            filter: filter.to_string(),
            level,
        });
        if self.fail_subscribe {
            return Err(Error::SubscribeRejected(filter.to_string()));
        }
        guard(&self.state.handlers).push((filter.to_string(), handler));
        Ok(())
    }

    async fn unsubscribe(&mut self, topic: &str) -> Result<Receipt> {
        self.record(Call::Unsubscribe(topic.to_string()));
        guard(&self.state.handlers).retain(|(filter, _)| filter != topic);
        Ok(self.acknowledge_later(Call::UnsubAck(topic.to_string()), Ok(())))
    }
}

#[derive(Default)]
pub(crate) struct PinCounters {
    /// `None` is a failed read.
    script: Mutex<VecDeque<Option<PinState>>>,
    configured: Mutex<Option<u8>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    reads: AtomicUsize,
}

/// Pin that replays a script of states, then reads inactive forever.
#[derive(Clone, Default)]
pub struct FakePin {
    pub(crate) counters: Arc<PinCounters>,
    pub fail_open: bool,
    pub fail_configure: bool,
}

impl FakePin {
    pub fn scripted(states: impl IntoIterator<Item = PinState>) -> Self {
        Self::with_reads(states.into_iter().map(Some))
    }

    /// Like [`FakePin::scripted`], with `None` entries failing the read.
    pub fn with_reads(reads: impl IntoIterator<Item = Option<PinState>>) -> Self {
        let pin = Self::default();
        guard(&pin.counters.script).extend(reads);
        pin
    }

    pub fn active_for(ticks: usize) -> Self {
        Self::scripted(std::iter::repeat_n(PinState::Active, ticks))
    }

    pub fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.counters.reads.load(Ordering::SeqCst)
    }

    pub fn configured(&self) -> Option<u8> {
        *guard(&self.counters.configured)
    }
}

impl PinDriver for FakePin {
    fn open(&mut self) -> Result<()> {
        if self.fail_open {
            return Err(Error::Gpio {
                path: "/sys/class/gpio".into(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn configure_as_input(&mut self, pin: u8) -> Result<()> {
        if self.fail_configure {
            return Err(Error::Gpio {
                path: format!("/sys/class/gpio/gpio{pin}").into(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        *guard(&self.counters.configured) = Some(pin);
        Ok(())
    }

    fn read_state(&mut self) -> Result<PinState> {
        self.counters.reads.fetch_add(1, Ordering::SeqCst);
        match guard(&self.counters.script).pop_front() {
            Some(Some(state)) => Ok(state),
            Some(None) => Err(Error::Gpio {
                path: "/sys/class/gpio/gpio7/value".into(),
                source: std::io::Error::from(std::io::ErrorKind::UnexpectedEof),
            }),
            None => Ok(PinState::Inactive),
        }
    }

    fn close(&mut self) {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Handler that records every `(topic, payload)` pair it is given.
pub fn recording_handler() -> (MessageHandler, Arc<Mutex<Vec<(String, String)>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let handler: MessageHandler = Arc::new(move |topic: &str, payload: &[u8]| {
        guard(&sink).push((
            topic.to_string(),
            String::from_utf8_lossy(payload).into_owned(),
        ));
    });
    (handler, seen)
}
