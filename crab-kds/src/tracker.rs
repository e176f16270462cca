//! New arrival tracking

use shared::kitchen::OrderId;
use std::collections::HashSet;

/// Ids already surfaced as new by the preparation stream
///
/// Append-only for the lifetime of the display: an id is never forgotten,
/// even if the order leaves the kitchen and comes back.
#[derive(Debug, Default)]
pub struct NewArrivalTracker {
    seen: HashSet<OrderId>,
}

impl NewArrivalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_new(&self, id: &OrderId) -> bool {
        !self.seen.contains(id)
    }

    /// Idempotent; returns `true` if the id was not seen before
    pub fn mark_seen(&mut self, id: &OrderId) -> bool {
        self.seen.insert(id.clone())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_seen_is_idempotent() {
        let mut tracker = NewArrivalTracker::new();
        let id = OrderId::new("o1");

        assert!(tracker.is_new(&id));
        assert!(tracker.mark_seen(&id));
        assert!(!tracker.is_new(&id));
        assert!(!tracker.mark_seen(&id));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_is_new_does_not_mutate() {
        let tracker = NewArrivalTracker::new();
        let id = OrderId::new("o1");
        assert!(tracker.is_new(&id));
        assert!(tracker.is_new(&id));
        assert!(tracker.is_empty());
    }
}
