//! Per-connection subscription manager.
//!
//! Tracks which case IDs a WebSocket client follows and provides
//! server-side event filtering.

use std::collections::HashSet;

/// Case ID that subscribes to everything.
pub const WILDCARD: &str = "*";

/// Manages the set of case subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed case IDs. If `subscribe_all` is true, this set is ignored.
    case_ids: HashSet<String>,
    /// Whether the client subscribes to every case (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds case IDs to the subscription set. `"*"` enables the wildcard.
    pub fn subscribe<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        for id in ids {
            if id == WILDCARD {
                self.subscribe_all = true;
            } else if !id.is_empty() {
                self.case_ids.insert(id.to_string());
            }
        }
    }

    /// Removes case IDs from the subscription set. `"*"` clears the wildcard.
    pub fn unsubscribe<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        for id in ids {
            if id == WILDCARD {
                self.subscribe_all = false;
            } else {
                self.case_ids.remove(id);
            }
        }
    }

    /// Returns `true` if an event for `case_id` passes the filter.
    ///
    /// Events without a case only reach wildcard subscribers.
    #[must_use]
    pub fn matches(&self, case_id: Option<&str>) -> bool {
        self.subscribe_all || case_id.is_some_and(|id| self.case_ids.contains(id))
    }

    /// Returns the number of explicitly subscribed case IDs.
    #[must_use]
    pub fn count(&self) -> usize {
        self.case_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_matches_nothing() {
        let mgr = SubscriptionManager::new();
        assert!(!mgr.matches(Some("case-1")));
        assert!(!mgr.matches(None));
    }

    #[test]
    fn specific_case_only() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(["case-1"]);
        assert!(mgr.matches(Some("case-1")));
        assert!(!mgr.matches(Some("case-2")));
        assert!(!mgr.matches(None));
    }

    #[test]
    fn wildcard_matches_system_events() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe([WILDCARD]);
        assert!(mgr.matches(Some("anything")));
        assert!(mgr.matches(None));
        assert_eq!(mgr.count(), 0);
    }

    #[test]
    fn unsubscribe_removes_case_and_wildcard() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(["case-1", WILDCARD]);
        mgr.unsubscribe([WILDCARD]);
        assert!(!mgr.is_subscribed_all());
        assert!(mgr.matches(Some("case-1")));
        mgr.unsubscribe(["case-1"]);
        assert!(!mgr.matches(Some("case-1")));
    }
}
