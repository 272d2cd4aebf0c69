//! Broker engine
//!
//! This module contains the in-memory broker responsible for:
//! - managing topics (one per city) and their subscriber lists
//! - fanning published alerts out to every subscribed connection
//! - removing connections and their subscriptions on disconnect
//!
//! Concurrency and usage notes:
//! - The public API here is synchronous and designed to be held behind a
//!   lock (`Arc<Mutex<Broker>>`) by the transport layer. The lock is never
//!   held across network I/O: `publish` only pushes frames onto each
//!   connection's outbound channel, so a slow socket cannot stall fan-out
//!   to the other subscribers.
//! - Empty topics are pruned on unsubscribe; a topic exists only while at
//!   least one subscriber references it.

use std::collections::HashMap;

use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::broker::alert::WeatherAlert;
use crate::broker::topic::{SubscriberId, Topic};
use crate::client::{Client, ConnectionState};
use crate::transport::message::ServerMessage;

#[derive(Debug, Default)]
pub struct Broker {
    pub topics: HashMap<String, Topic>,
    pub clients: HashMap<SubscriberId, Client>,
}

impl Broker {
    pub fn new() -> Self {
        Self {
            topics: HashMap::new(),
            clients: HashMap::new(),
        }
    }

    pub fn register_client(&mut self, client: Client) {
        self.clients.insert(client.id.clone(), client);
    }

    pub fn remove_client(&mut self, client_id: &SubscriberId) {
        self.clients.remove(client_id);
    }

    /// Subscribe a connection to a city topic. Creates the topic entry on
    /// first subscribe; repeated calls are a no-op.
    pub fn subscribe(&mut self, city_uuid: &str, subscriber: SubscriberId) {
        let topic = self
            .topics
            .entry(city_uuid.to_string())
            .or_insert_with(|| Topic::new(city_uuid));
        topic.subscribe(subscriber);
    }

    /// Unsubscribe a connection from a city topic. No-op if absent. The
    /// topic entry is pruned once its subscriber set is empty.
    pub fn unsubscribe(&mut self, city_uuid: &str, subscriber: &SubscriberId) {
        if let Some(t) = self.topics.get_mut(city_uuid) {
            t.unsubscribe(subscriber);
            if t.is_empty() {
                self.topics.remove(city_uuid);
                debug!("pruned empty topic for city {city_uuid}");
            }
        }
    }

    /// Fan an alert out to every connection subscribed to its city.
    ///
    /// The frame is serialized once and offered to each subscriber's
    /// outbound channel. Returns the number of handles the frame was
    /// offered to. A handle whose channel has already closed is skipped
    /// with a warning; the publisher never sees that as an error.
    pub fn publish(&self, alert: &WeatherAlert) -> usize {
        let Some(topic) = self.topics.get(&alert.city_uuid) else {
            debug!("no subscribers for city {}", alert.city_uuid);
            return 0;
        };

        let frame = ServerMessage::WeatherAlert {
            alert: alert.clone(),
        };
        let text = match serde_json::to_string(&frame) {
            Ok(json) => json,
            Err(e) => {
                warn!("failed to serialize alert {}: {e}", alert.uuid);
                return 0;
            }
        };
        let ws_msg = WsMessage::text(text);

        let mut attempted = 0;
        for sub_id in &topic.subscribers {
            if let Some(client) = self.clients.get(sub_id) {
                attempted += 1;
                if let Err(e) = client.sender.send(ws_msg.clone()) {
                    warn!("dropping alert for closed connection {sub_id}: {e}");
                }
            } else {
                warn!("no client registered with id: {sub_id}");
            }
        }
        attempted
    }

    /// Remove a connection and its topic subscription. Runs on every
    /// disconnect path, clean or abrupt.
    pub fn cleanup_client(&mut self, client_id: &SubscriberId) {
        let city_uuid = match self.clients.get_mut(client_id) {
            Some(client) => {
                client.state = ConnectionState::Closing;
                client.city_uuid.clone()
            }
            None => return,
        };

        self.unsubscribe(&city_uuid, client_id);

        if let Some(mut client) = self.clients.remove(client_id) {
            client.state = ConnectionState::Closed;
        }
        info!("cleaned up connection {client_id} (city {city_uuid})");
    }
}
