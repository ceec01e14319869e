//! Correlates requests with broker acknowledgements.
//!
//! rumqttc assigns packet ids inside the event loop, so a request is first
//! queued in submission order, then bound to its packet id when the matching
//! `Outgoing` event shows up, and finally completed by the acknowledgement.
//! QoS 0 publishes complete as soon as they are written.
//!
//! After a connection error every waiter is failed, but its entry stays
//! behind as an orphan: rumqttc still sends the requests left in its channel
//! and replays unacknowledged publishes with their old packet ids after
//! reconnecting. The orphans absorb those events, so a replay never
//! completes a newer request.

use std::collections::{HashMap, VecDeque};

use rumqttc::{Outgoing, Packet, QoS, SubscribeReasonCode};
use tokio::sync::oneshot;

use crate::utils::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Expect {
    Publish(QoS),
    Subscribe(String),
    Unsubscribe(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum AckKind {
    PubAck,
    PubComp,
    SubAck,
    UnsubAck,
}

#[derive(Debug)]
struct Waiter {
    expect: Expect,
    /// `None` once the waiter has been failed and only the slot remains.
    done: Option<oneshot::Sender<Result<()>>>,
}

impl Waiter {
    fn complete(self, result: Result<()>) {
        if let Some(done) = self.done {
            // caller may have stopped waiting
            let _ = done.send(result);
        }
    }

    fn abandon(&mut self, reason: &str) {
        if let Some(done) = self.done.take() {
            let _ = done.send(Err(Error::Connection(reason.to_string())));
        }
    }

    fn is_live(&self) -> bool {
        self.done.is_some()
    }
}

/// Outcome of an acknowledgement the caller may need to act on.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Settled {
    Unsubscribed(String),
}

#[derive(Debug, Default)]
pub(crate) struct AckTracker {
    queued: VecDeque<Waiter>,
    in_flight: HashMap<(AckKind, u16), Waiter>,
}

impl AckTracker {
    pub(crate) fn register(&mut self, expect: Expect, done: oneshot::Sender<Result<()>>) {
        self.queued.push_back(Waiter {
            expect,
            done: Some(done),
        });
    }

    /// Drops the most recent registration after its request failed to queue.
    pub(crate) fn withdraw_last(&mut self) {
        self.queued.pop_back();
    }

    /// No caller is waiting on an acknowledgement. Orphans do not count.
    pub(crate) fn is_idle(&self) -> bool {
        !self
            .queued
            .iter()
            .chain(self.in_flight.values())
            .any(Waiter::is_live)
    }

    pub(crate) fn on_outgoing(&mut self, outgoing: &Outgoing) {
        match *outgoing {
            Outgoing::Publish(pkid) => {
                if self.in_flight.contains_key(&(AckKind::PubAck, pkid))
                    || self.in_flight.contains_key(&(AckKind::PubComp, pkid))
                {
                    // retransmission
                    return;
                }
                let Some(waiter) = self.pop_front(|e| matches!(e, Expect::Publish(_))) else {
                    return;
                };
                match waiter.expect {
                    Expect::Publish(QoS::AtMostOnce) => waiter.complete(Ok(())),
                    Expect::Publish(QoS::AtLeastOnce) => {
                        self.in_flight.insert((AckKind::PubAck, pkid), waiter);
                    }
                    _ => {
                        self.in_flight.insert((AckKind::PubComp, pkid), waiter);
                    }
                }
            }
            Outgoing::Subscribe(pkid) => {
                if let Some(waiter) = self.pop_front(|e| matches!(e, Expect::Subscribe(_))) {
                    self.in_flight.insert((AckKind::SubAck, pkid), waiter);
                }
            }
            Outgoing::Unsubscribe(pkid) => {
                if let Some(waiter) = self.pop_front(|e| matches!(e, Expect::Unsubscribe(_))) {
                    self.in_flight.insert((AckKind::UnsubAck, pkid), waiter);
                }
            }
            _ => {}
        }
    }

    pub(crate) fn on_incoming(&mut self, packet: &Packet) -> Option<Settled> {
        match packet {
            Packet::PubAck(ack) => {
                self.complete(AckKind::PubAck, ack.pkid, Ok(()));
                None
            }
            Packet::PubComp(comp) => {
                self.complete(AckKind::PubComp, comp.pkid, Ok(()));
                None
            }
            Packet::SubAck(ack) => {
                let waiter = self.in_flight.remove(&(AckKind::SubAck, ack.pkid))?;
                let rejected = ack
                    .return_codes
                    .iter()
                    .any(|code| matches!(code, SubscribeReasonCode::Failure));
                let result = match (&waiter.expect, rejected) {
                    (Expect::Subscribe(filter), true) => {
                        Err(Error::SubscribeRejected(filter.clone()))
                    }
                    _ => Ok(()),
                };
                waiter.complete(result);
                None
            }
            Packet::UnsubAck(ack) => {
                let waiter = self.in_flight.remove(&(AckKind::UnsubAck, ack.pkid))?;
                let settled = match &waiter.expect {
                    Expect::Unsubscribe(topic) => Some(Settled::Unsubscribed(topic.clone())),
                    _ => None,
                };
                waiter.complete(Ok(()));
                settled
            }
            _ => None,
        }
    }

    /// Fails every outstanding request after the connection dropped. The
    /// slots are kept for the replays that follow the reconnect.
    pub(crate) fn fail_all(&mut self, reason: &str) {
        for waiter in self.queued.iter_mut().chain(self.in_flight.values_mut()) {
            waiter.abandon(reason);
        }
    }

    /// Fails every outstanding request and forgets all slots; used once the
    /// event loop that would replay them is gone.
    pub(crate) fn reset(&mut self, reason: &str) {
        self.fail_all(reason);
        self.queued.clear();
        self.in_flight.clear();
    }

    fn pop_front(&mut self, kind: impl Fn(&Expect) -> bool) -> Option<Waiter> {
        let index = self.queued.iter().position(|w| kind(&w.expect))?;
        self.queued.remove(index)
    }

    fn complete(&mut self, kind: AckKind, pkid: u16, result: Result<()>) {
        if let Some(waiter) = self.in_flight.remove(&(kind, pkid)) {
            waiter.complete(result);
        }
    }
}
