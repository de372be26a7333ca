//! Listener registry
//!
//! Topic listeners are keyed by exact topic identifier. Lifecycle listeners
//! observe connects, disconnects and errors. Callbacks run synchronously on
//! the driver task, so keep them fast.

use bitstamp_types::{StreamError, TopicEvent};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::events::{ConnectInfo, DisconnectReason};

/// Handle for removing a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Callback for topic data events
pub type TopicListener = Arc<dyn Fn(&TopicEvent) + Send + Sync>;
/// Callback for successful connections
pub type ConnectListener = Arc<dyn Fn(&ConnectInfo) + Send + Sync>;
/// Callback for disconnections
pub type DisconnectListener = Arc<dyn Fn(&DisconnectReason) + Send + Sync>;
/// Callback for errors
pub type ErrorListener = Arc<dyn Fn(&StreamError) + Send + Sync>;

type Slot<T> = RwLock<Vec<(ListenerId, T)>>;

/// All listeners registered on one multiplexer
#[derive(Default)]
pub struct Listeners {
    next_id: AtomicU64,
    topics: DashMap<String, Vec<(ListenerId, TopicListener)>>,
    connected: Slot<ConnectListener>,
    disconnected: Slot<DisconnectListener>,
    errors: Slot<ErrorListener>,
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("topics", &self.topics.len())
            .field("connected", &self.connected.read().len())
            .field("disconnected", &self.disconnected.read().len())
            .field("errors", &self.errors.read().len())
            .finish()
    }
}

impl Listeners {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> ListenerId {
        ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a listener for one topic
    pub fn on_topic(&self, topic: impl Into<String>, listener: TopicListener) -> ListenerId {
        let id = self.next_id();
        self.topics.entry(topic.into()).or_default().push((id, listener));
        id
    }

    /// Register a connect listener
    pub fn on_connected(&self, listener: ConnectListener) -> ListenerId {
        let id = self.next_id();
        self.connected.write().push((id, listener));
        id
    }

    /// Register a disconnect listener
    pub fn on_disconnected(&self, listener: DisconnectListener) -> ListenerId {
        let id = self.next_id();
        self.disconnected.write().push((id, listener));
        id
    }

    /// Register an error listener
    pub fn on_error(&self, listener: ErrorListener) -> ListenerId {
        let id = self.next_id();
        self.errors.write().push((id, listener));
        id
    }

    /// Remove a listener of any kind; returns false if it was not registered
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut removed = false;
        self.topics.retain(|_, listeners| {
            let before = listeners.len();
            listeners.retain(|(lid, _)| *lid != id);
            removed |= listeners.len() != before;
            !listeners.is_empty()
        });

        removed |= remove_from(&self.connected, id);
        removed |= remove_from(&self.disconnected, id);
        removed |= remove_from(&self.errors, id);
        removed
    }

    /// Number of listeners registered for a topic
    pub fn topic_listener_count(&self, topic: &str) -> usize {
        self.topics.get(topic).map_or(0, |listeners| listeners.len())
    }

    /// Deliver a data event to the listeners of its exact topic
    ///
    /// Returns how many listeners were invoked.
    pub fn dispatch(&self, event: &TopicEvent) -> usize {
        // Clone out so callbacks may register or remove listeners
        let listeners: Vec<TopicListener> = match self.topics.get(&event.channel) {
            Some(entry) => entry.iter().map(|(_, l)| Arc::clone(l)).collect(),
            None => return 0,
        };
        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }

    /// Notify connect listeners
    pub fn emit_connected(&self, info: &ConnectInfo) {
        for listener in snapshot(&self.connected) {
            listener(info);
        }
    }

    /// Notify disconnect listeners
    pub fn emit_disconnected(&self, reason: &DisconnectReason) {
        for listener in snapshot(&self.disconnected) {
            listener(reason);
        }
    }

    /// Notify error listeners
    pub fn emit_error(&self, error: &StreamError) {
        for listener in snapshot(&self.errors) {
            listener(error);
        }
    }
}

fn remove_from<T>(slot: &Slot<T>, id: ListenerId) -> bool {
    let mut listeners = slot.write();
    let before = listeners.len();
    listeners.retain(|(lid, _)| *lid != id);
    listeners.len() != before
}

fn snapshot<T: Clone>(slot: &Slot<T>) -> Vec<T> {
    slot.read().iter().map(|(_, l)| l.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn event(channel: &str) -> TopicEvent {
        TopicEvent {
            event: "trade".to_string(),
            channel: channel.to_string(),
            data: json!({}),
        }
    }

    #[test]
    fn test_dispatch_exact_topic_only() {
        let listeners = Listeners::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        listeners.on_topic(
            "live_trades_btcusd",
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(listeners.dispatch(&event("live_trades_btcusd")), 1);
        assert_eq!(listeners.dispatch(&event("live_trades_btcusdt")), 0);
        assert_eq!(listeners.dispatch(&event("live_trades")), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_listener() {
        let listeners = Listeners::new();
        let topic = listeners.on_topic("order_book_btcusd", Arc::new(|_| {}));
        let error = listeners.on_error(Arc::new(|_| {}));
        assert_ne!(topic, error);

        assert!(listeners.remove(topic));
        assert!(!listeners.remove(topic));
        assert_eq!(listeners.topic_listener_count("order_book_btcusd"), 0);

        assert!(listeners.remove(error));
    }

    #[test]
    fn test_listener_may_register_during_dispatch() {
        let listeners = Arc::new(Listeners::new());
        let registry = Arc::clone(&listeners);
        listeners.on_topic(
            "live_orders_btcusd",
            Arc::new(move |_| {
                registry.on_topic("live_orders_btcusd", Arc::new(|_| {}));
            }),
        );

        assert_eq!(listeners.dispatch(&event("live_orders_btcusd")), 1);
        assert_eq!(listeners.topic_listener_count("live_orders_btcusd"), 2);
    }

    #[test]
    fn test_lifecycle_emit() {
        let listeners = Listeners::new();
        let seen = Arc::new(RwLock::new(Vec::new()));

        let log = Arc::clone(&seen);
        listeners.on_disconnected(Arc::new(move |reason| log.write().push(reason.clone())));
        listeners.emit_disconnected(&DisconnectReason::ReconnectRequested);

        assert_eq!(*seen.read(), vec![DisconnectReason::ReconnectRequested]);
    }
}
