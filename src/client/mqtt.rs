//! MQTT 3.1.1 client on top of `rumqttc`.
//!
//! `connect` polls the event loop until CONNACK, then hands the loop to a
//! network task that:
//! - binds outgoing packet ids to waiting receipts and completes them on
//!   PUBACK / PUBCOMP / SUBACK / UNSUBACK
//! - dispatches incoming PUBLISH packets to matching handlers
//! - fails every outstanding receipt on connection errors; rumqttc
//!   reconnects on the following poll and replays what it still holds, but
//!   those replays never resolve a newer receipt
//!
//! The tracker and handler table are shared with the task behind a mutex
//! that is never held across an await.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, Publish};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::tracker::{AckTracker, Expect, Settled};
use super::{BrokerClient, DeliveryLevel, MessageHandler, Receipt};
use crate::config::BrokerSettings;
use crate::utils::{Error, Result};

/// Requests buffered between the client handle and the event loop.
const REQUEST_CAPACITY: usize = 64;

/// Pause before polling again after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

#[derive(Default)]
struct Shared {
    tracker: AckTracker,
    handlers: Vec<(String, MessageHandler)>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Session {
    client: AsyncClient,
    driver: JoinHandle<()>,
}

pub struct MqttClient {
    uri: String,
    options: MqttOptions,
    session: Option<Session>,
    shared: Arc<Mutex<Shared>>,
    settled: Arc<Notify>,
}

impl MqttClient {
    pub fn new(settings: &BrokerSettings) -> Self {
        let mut options =
            MqttOptions::new(settings.client_id.clone(), settings.host.clone(), settings.port);
        options.set_keep_alive(Duration::from_secs(settings.keep_alive_secs));
        if let Some((username, password)) = settings.credentials() {
            options.set_credentials(username, password);
        }

        Self {
            uri: settings.uri(),
            options,
            session: None,
            shared: Arc::new(Mutex::new(Shared::default())),
            settled: Arc::new(Notify::new()),
        }
    }

    fn client(&self) -> Result<&AsyncClient> {
        self.session
            .as_ref()
            .map(|session| &session.client)
            .ok_or(Error::NotConnected)
    }

    fn register(&self, expect: Expect) -> Receipt {
        let (done, receipt) = Receipt::pending();
        lock(&self.shared).tracker.register(expect, done);
        receipt
    }

    fn withdraw_last(&self) {
        lock(&self.shared).tracker.withdraw_last();
    }
}

async fn wait_settled(shared: &Mutex<Shared>, settled: &Notify) {
    loop {
        let notified = settled.notified();
        if lock(shared).tracker.is_idle() {
            return;
        }
        notified.await;
    }
}

impl std::fmt::Debug for MqttClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttClient")
            .field("uri", &self.uri)
            .field("connected", &self.session.is_some())
            .finish()
    }
}

#[async_trait]
impl BrokerClient for MqttClient {
    async fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }

        let (client, mut eventloop) = AsyncClient::new(self.options.clone(), REQUEST_CAPACITY);
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => break,
                Ok(_) => {}
                Err(e) => return Err(Error::Connect(format!("{}: {e}", self.uri))),
            }
        }

        let driver = tokio::spawn(drive(
            eventloop,
            self.shared.clone(),
            self.settled.clone(),
        ));
        self.session = Some(Session { client, driver });
        Ok(())
    }

    async fn publish(
        &mut self,
        level: DeliveryLevel,
        topic: &str,
        payload: Vec<u8>,
    ) -> Result<Receipt> {
        let client = self.client()?.clone();
        let receipt = self.register(Expect::Publish(level.into()));

        if let Err(e) = client.publish(topic, level.into(), false, payload).await {
            self.withdraw_last();
            return Err(e.into());
        }
        Ok(receipt)
    }

    async fn disconnect(&mut self, quiesce: Duration) {
        let Some(Session { client, mut driver }) = self.session.take() else {
            return;
        };

        let (shared, settled) = (self.shared.clone(), self.settled.clone());
        if tokio::time::timeout(quiesce, wait_settled(&shared, &settled))
            .await
            .is_err()
        {
            warn!("in-flight operations still pending after {:?}", quiesce);
        }

        if let Err(e) = client.disconnect().await {
            warn!("failed to queue disconnect: {}", e);
        }

        if tokio::time::timeout(quiesce, &mut driver).await.is_err() {
            debug!("network task did not stop in time; aborting it");
            driver.abort();
        }
        lock(&self.shared).tracker.reset("client disconnected");
    }

    async fn subscribe(
        &mut self,
        filter: &str,
        level: DeliveryLevel,
        handler: MessageHandler,
    ) -> Result<()> {
        if !rumqttc::valid_filter(filter) {
            return Err(Error::InvalidTopicFilter(filter.to_string()));
        }
        let client = self.client()?.clone();

        let (done, receipt) = Receipt::pending();
        {
            let mut shared = lock(&self.shared);
            // installed before SUBACK so retained messages are not missed
            shared.handlers.push((filter.to_string(), handler));
            shared
                .tracker
                .register(Expect::Subscribe(filter.to_string()), done);
        }

        let result = match client.subscribe(filter, level.into()).await {
            Ok(()) => receipt.wait().await,
            Err(e) => {
                self.withdraw_last();
                Err(e.into())
            }
        };

        if result.is_err() {
            lock(&self.shared).handlers.retain(|(f, _)| f != filter);
        }
        result
    }

    async fn unsubscribe(&mut self, topic: &str) -> Result<Receipt> {
        let client = self.client()?.clone();
        let receipt = self.register(Expect::Unsubscribe(topic.to_string()));

        if let Err(e) = client.unsubscribe(topic).await {
            self.withdraw_last();
            return Err(e.into());
        }
        Ok(receipt)
    }
}

async fn drive(mut eventloop: EventLoop, shared: Arc<Mutex<Shared>>, settled: Arc<Notify>) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                debug!("disconnect sent");
                break;
            }
            Ok(Event::Outgoing(outgoing)) => {
                lock(&shared).tracker.on_outgoing(&outgoing);
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => dispatch(&shared, &publish),
            Ok(Event::Incoming(packet)) => {
                let mut guard = lock(&shared);
                if let Some(Settled::Unsubscribed(topic)) = guard.tracker.on_incoming(&packet) {
                    guard.handlers.retain(|(filter, _)| *filter != topic);
                }
            }
            Err(e) => {
                warn!("mqtt connection error: {}", e);
                lock(&shared).tracker.fail_all(&e.to_string());
                settled.notify_waiters();
                tokio::time::sleep(RECONNECT_DELAY).await;
                continue;
            }
        }

        if lock(&shared).tracker.is_idle() {
            settled.notify_waiters();
        }
    }
}

fn dispatch(shared: &Mutex<Shared>, publish: &Publish) {
    let handlers: Vec<MessageHandler> = lock(shared)
        .handlers
        .iter()
        .filter(|(filter, _)| rumqttc::matches(&publish.topic, filter))
        .map(|(_, handler)| handler.clone())
        .collect();

    if handlers.is_empty() {
        debug!("no handler for topic {}", publish.topic);
    }
    for handler in handlers {
        handler(publish.topic.as_str(), &publish.payload[..]);
    }
}
