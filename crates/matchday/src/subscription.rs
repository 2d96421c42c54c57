//! Channel subscriptions.

use std::collections::HashMap;

/// Client-assigned identifier of an active subscription.
pub type SubscriptionId = u64;

/// Maps channel name to its active subscription id.
///
/// Ids come from a counter that only moves forward, so an id is never
/// handed out twice in a session, even after the channel is left and
/// joined again.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    next_id: SubscriptionId,
    active: HashMap<String, SubscriptionId>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id for `channel`.
    ///
    /// Joining a channel that is already active replaces its id; the
    /// previous id is returned so the caller can report it.
    pub fn subscribe(&mut self, channel: &str) -> (SubscriptionId, Option<SubscriptionId>) {
        let id = self.next_id;
        self.next_id += 1;
        let replaced = self.active.insert(channel.to_string(), id);
        (id, replaced)
    }

    /// Release the channel's subscription, returning its id if one was active.
    pub fn unsubscribe(&mut self, channel: &str) -> Option<SubscriptionId> {
        self.active.remove(channel)
    }

    pub fn get(&self, channel: &str) -> Option<SubscriptionId> {
        self.active.get(channel).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase_across_channels() {
        let mut registry = SubscriptionRegistry::new();
        assert_eq!(registry.subscribe("a").0, 0);
        assert_eq!(registry.subscribe("b").0, 1);
        assert_eq!(registry.get("a"), Some(0));
        assert_eq!(registry.get("b"), Some(1));
    }

    #[test]
    fn rejoin_after_leave_gets_a_new_id() {
        let mut registry = SubscriptionRegistry::new();
        let (first, _) = registry.subscribe("a");
        assert_eq!(registry.unsubscribe("a"), Some(first));
        let (second, replaced) = registry.subscribe("a");
        assert!(second > first);
        assert_eq!(replaced, None);
    }

    #[test]
    fn unsubscribe_unknown_channel_is_none() {
        let mut registry = SubscriptionRegistry::new();
        assert_eq!(registry.unsubscribe("nope"), None);
        assert_eq!(registry.get("nope"), None);
    }

    #[test]
    fn joining_twice_keeps_one_active_id() {
        let mut registry = SubscriptionRegistry::new();
        registry.subscribe("a");
        let (id, replaced) = registry.subscribe("a");
        assert_eq!(replaced, Some(0));
        assert_eq!(registry.get("a"), Some(id));
        assert_eq!(registry.unsubscribe("a"), Some(id));
        assert_eq!(registry.unsubscribe("a"), None);
    }
}
