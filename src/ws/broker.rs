//! In-process message broker for established channels.
//!
//! Every channel that passed the handshake is registered here with the
//! sending half of its outbound queue. `SEND` frames addressed to a broker
//! destination (`/topic/...`, `/queue/...`) are copied as `MESSAGE` frames to
//! every subscription on exactly that destination, the sender included.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::ws::frame::{Command, Frame};

/// Destination prefixes served by the broker.
pub const BROKER_PREFIXES: [&str; 2] = ["/topic/", "/queue/"];

/// Prefix of application destinations (handled in process, never fanned out).
pub const APPLICATION_PREFIX: &str = "/app/";

/// Frames queued per channel before the broker starts dropping for it.
pub const OUTBOX_CAPACITY: usize = 256;

pub fn is_broker_destination(destination: &str) -> bool {
    BROKER_PREFIXES
        .iter()
        .any(|prefix| destination.starts_with(prefix))
}

/// An established channel as the broker sees it.
pub struct ClientConnection {
    pub id: Uuid,
    /// Subject bound by the handshake.
    pub subject: String,
    // subscription id -> destination
    subscriptions: RwLock<HashMap<String, String>>,
    tx: mpsc::Sender<Frame>,
}

impl ClientConnection {
    pub fn new(id: Uuid, subject: impl Into<String>, tx: mpsc::Sender<Frame>) -> Self {
        Self {
            id,
            subject: subject.into(),
            subscriptions: RwLock::new(HashMap::new()),
            tx,
        }
    }

    /// `false` when the subscription id is already in use on this channel.
    pub fn subscribe(&self, id: &str, destination: &str) -> bool {
        let mut subscriptions = self.subscriptions.write();
        if subscriptions.contains_key(id) {
            return false;
        }
        subscriptions.insert(id.to_string(), destination.to_string());
        true
    }

    pub fn unsubscribe(&self, id: &str) -> Option<String> {
        self.subscriptions.write().remove(id)
    }

    pub fn destination(&self, subscription_id: &str) -> Option<String> {
        self.subscriptions.read().get(subscription_id).cloned()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Subscription ids listening on `destination`.
    fn subscriptions_on(&self, destination: &str) -> Vec<String> {
        self.subscriptions
            .read()
            .iter()
            .filter(|(_, dest)| dest.as_str() == destination)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Queue a frame without waiting; `false` when it could not be queued.
    fn push(&self, frame: Frame) -> bool {
        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(conn_id = %self.id, subject = %self.subject, "outbox full, message dropped");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Registry of established channels plus the fan-out logic.
#[derive(Clone, Default)]
pub struct Broker {
    connections: Arc<DashMap<Uuid, Arc<ClientConnection>>>,
    next_message_id: Arc<AtomicU64>,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an established channel. A channel that is already registered
    /// keeps its entry (and its subscriptions).
    pub fn register(
        &self,
        id: Uuid,
        subject: &str,
        tx: mpsc::Sender<Frame>,
    ) -> Arc<ClientConnection> {
        self.connections
            .entry(id)
            .or_insert_with(|| Arc::new(ClientConnection::new(id, subject, tx)))
            .clone()
    }

    pub fn remove(&self, id: Uuid) {
        if let Some((_, conn)) = self.connections.remove(&id) {
            debug!(
                conn_id = %id,
                subscriptions = conn.subscription_count(),
                "channel unregistered"
            );
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<ClientConnection>> {
        self.connections.get(&id).map(|entry| entry.value().clone())
    }

    pub fn count(&self) -> usize {
        self.connections.len()
    }

    /// Every (connection, subscription id) pair listening on `destination`.
    pub fn find_subscribers(&self, destination: &str) -> Vec<(Arc<ClientConnection>, String)> {
        let mut result = Vec::new();
        for entry in self.connections.iter() {
            for subscription in entry.value().subscriptions_on(destination) {
                result.push((entry.value().clone(), subscription));
            }
        }
        result
    }

    /// Fan a `SEND` frame out as `MESSAGE` frames. Returns how many were queued.
    pub fn publish(&self, destination: &str, send: &Frame) -> usize {
        let mut delivered = 0;

        for (conn, subscription) in self.find_subscribers(destination) {
            let message_id = self.next_message_id.fetch_add(1, Ordering::Relaxed);
            let mut message = Frame::new(Command::Message)
                .with_header("subscription", subscription)
                .with_header("message-id", message_id.to_string())
                .with_header("destination", destination);
            if let Some(content_type) = send.header("content-type") {
                message = message.with_header("content-type", content_type);
            }

            if conn.push(message.with_body(send.body.clone())) {
                delivered += 1;
            }
        }

        delivered
    }
}
