//! Subscription tracking
//!
//! A topic is Pending from the moment its subscribe message is queued until
//! the server acknowledges it, then Active until the unsubscribe is
//! acknowledged or the set is cleared.

use std::collections::HashMap;

/// Lifecycle state of one topic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Subscribe sent, no acknowledgment yet
    Pending,
    /// Acknowledged by the server
    Active,
}

/// Topics the multiplexer has asked for, keyed by topic identifier
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    topics: HashMap<String, SubscriptionState>,
}

impl SubscriptionSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a subscribe request; active topics stay active
    pub fn request(&mut self, topic: &str) {
        self.topics
            .entry(topic.to_string())
            .or_insert(SubscriptionState::Pending);
    }

    /// Record a subscribe acknowledgment
    ///
    /// Returns true if the topic was not already active. Acknowledgments for
    /// topics never requested are still recorded; the server is authoritative.
    pub fn confirm(&mut self, topic: &str) -> bool {
        self.topics.insert(topic.to_string(), SubscriptionState::Active) != Some(SubscriptionState::Active)
    }

    /// Forget a topic that was requested but not yet acknowledged
    pub fn cancel_pending(&mut self, topic: &str) -> bool {
        if self.topics.get(topic) == Some(&SubscriptionState::Pending) {
            self.topics.remove(topic);
            return true;
        }
        false
    }

    /// Record an unsubscribe acknowledgment
    pub fn remove(&mut self, topic: &str) -> bool {
        self.topics.remove(topic).is_some()
    }

    /// State of a topic
    pub fn state(&self, topic: &str) -> Option<SubscriptionState> {
        self.topics.get(topic).copied()
    }

    /// Check if a topic is active
    pub fn is_active(&self, topic: &str) -> bool {
        self.state(topic) == Some(SubscriptionState::Active)
    }

    /// Active topics, sorted
    pub fn active(&self) -> Vec<String> {
        self.with_state(SubscriptionState::Active)
    }

    /// Pending topics, sorted
    pub fn pending(&self) -> Vec<String> {
        self.with_state(SubscriptionState::Pending)
    }

    /// Every tracked topic, sorted
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.topics.keys().cloned().collect();
        topics.sort();
        topics
    }

    /// Move every topic back to Pending, returning them for resubscription
    pub fn mark_all_pending(&mut self) -> Vec<String> {
        for state in self.topics.values_mut() {
            *state = SubscriptionState::Pending;
        }
        self.topics()
    }

    /// Remove every topic, returning what was tracked
    pub fn drain(&mut self) -> Vec<String> {
        let mut topics: Vec<String> = self.topics.drain().map(|(topic, _)| topic).collect();
        topics.sort();
        topics
    }

    /// Number of tracked topics
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Check if no topic is tracked
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    fn with_state(&self, wanted: SubscriptionState) -> Vec<String> {
        let mut topics: Vec<String> = self
            .topics
            .iter()
            .filter(|(_, state)| **state == wanted)
            .map(|(topic, _)| topic.clone())
            .collect();
        topics.sort();
        topics
    }
}
