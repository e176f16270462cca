//! Live query subscriptions
//!
//! A [`QueryService`] turns an [`OrderQuery`] into a [`Subscription`]: two
//! channels (full snapshots, errors) plus a handle that unsubscribes.
//! Snapshots are complete result sets, never diffs.

use shared::kitchen::{KitchenOrder, OrderDocument, OrderQuery};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::SubscriptionError;

/// Complete result set of a query at one point in time
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub documents: Vec<OrderDocument>,
}

impl Snapshot {
    pub fn new(documents: Vec<OrderDocument>) -> Self {
        Self { documents }
    }

    /// Ingest every document (defaults applied)
    pub fn orders(&self) -> impl Iterator<Item = KitchenOrder> + '_ {
        self.documents.iter().map(OrderDocument::to_order)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Streaming query service
pub trait QueryService: Send + Sync {
    /// Open a live query; the initial result set arrives as the first snapshot
    fn subscribe(&self, query: OrderQuery) -> Result<Subscription, SubscriptionError>;
}

/// Unsubscribe handle
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    token: CancellationToken,
}

impl SubscriptionHandle {
    pub fn unsubscribe(&self) {
        self.token.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }
}

/// What a subscription produced next
#[derive(Debug)]
pub enum SubscriptionEvent {
    Snapshot(Snapshot),
    Error(SubscriptionError),
    /// Unsubscribed, or the service dropped its end
    Closed,
}

/// Delivery position shared by both channels of one subscription
type Seq = u64;

/// Consumer side of a live query
#[derive(Debug)]
pub struct Subscription {
    snapshots: mpsc::UnboundedReceiver<(Seq, Snapshot)>,
    errors: mpsc::UnboundedReceiver<(Seq, SubscriptionError)>,
    /// Error received while snapshots sent before it may still be queued
    pending_error: Option<(Seq, SubscriptionError)>,
    handle: SubscriptionHandle,
}

impl Subscription {
    /// Create a connected (sender, subscription) pair for service implementations
    pub fn channel() -> (SubscriptionSender, Subscription) {
        let (snapshot_tx, snapshot_rx) = mpsc::unbounded_channel();
        let (error_tx, error_rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();

        let sender = SubscriptionSender {
            snapshots: snapshot_tx,
            errors: error_tx,
            seq: Arc::new(AtomicU64::new(0)),
            token: token.clone(),
        };
        let subscription = Subscription {
            snapshots: snapshot_rx,
            errors: error_rx,
            pending_error: None,
            handle: SubscriptionHandle { token },
        };
        (sender, subscription)
    }

    pub fn handle(&self) -> SubscriptionHandle {
        self.handle.clone()
    }

    /// Wait for the next snapshot or error, in the order they were sent
    ///
    /// Snapshots sent after an error are never delivered ahead of it.
    pub async fn next(&mut self) -> SubscriptionEvent {
        loop {
            if !self.handle.is_active() {
                return SubscriptionEvent::Closed;
            }

            if let Some(error_seq) = self.pending_error.as_ref().map(|(seq, _)| *seq) {
                if let Ok((seq, snapshot)) = self.snapshots.try_recv()
                    && seq < error_seq
                {
                    return SubscriptionEvent::Snapshot(snapshot);
                }
                if let Some((_, err)) = self.pending_error.take() {
                    return SubscriptionEvent::Error(err);
                }
            }

            tokio::select! {
                biased;
                _ = self.handle.token.cancelled() => return SubscriptionEvent::Closed,
                Some(error) = self.errors.recv() => self.pending_error = Some(error),
                snapshot = self.snapshots.recv() => match snapshot {
                    Some((seq, snapshot)) => {
                        if let Ok(error) = self.errors.try_recv() {
                            let error_seq = error.0;
                            self.pending_error = Some(error);
                            if error_seq < seq {
                                continue;
                            }
                        }
                        return SubscriptionEvent::Snapshot(snapshot);
                    }
                    None => return SubscriptionEvent::Closed,
                },
            }
        }
    }
}

/// Producer side of a live query, held by the service
#[derive(Debug, Clone)]
pub struct SubscriptionSender {
    snapshots: mpsc::UnboundedSender<(Seq, Snapshot)>,
    errors: mpsc::UnboundedSender<(Seq, SubscriptionError)>,
    seq: Arc<AtomicU64>,
    token: CancellationToken,
}

impl SubscriptionSender {
    fn next_seq(&self) -> Seq {
        self.seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Returns `false` if the consumer is gone
    pub fn send_snapshot(&self, snapshot: Snapshot) -> bool {
        !self.is_closed() && self.snapshots.send((self.next_seq(), snapshot)).is_ok()
    }

    pub fn send_error(&self, error: SubscriptionError) -> bool {
        !self.is_closed() && self.errors.send((self.next_seq(), error)).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled() || self.snapshots.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(ids: &[&str]) -> Snapshot {
        Snapshot::new(
            ids.iter()
                .map(|id| OrderDocument::new(*id, json!({"orderStatus": "in-kitchen"})))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_snapshot_delivery() {
        let (tx, mut sub) = Subscription::channel();
        assert!(tx.send_snapshot(snapshot(&["a", "b"])));

        match sub.next().await {
            SubscriptionEvent::Snapshot(s) => assert_eq!(s.len(), 2),
            other => panic!("Expected snapshot, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_snapshot_sent_before_error_is_delivered() {
        let (tx, mut sub) = Subscription::channel();
        tx.send_snapshot(snapshot(&["a"]));
        tx.send_error(SubscriptionError::Stream("permission denied".into()));

        match sub.next().await {
            SubscriptionEvent::Snapshot(s) => assert_eq!(s.len(), 1),
            other => panic!("Expected snapshot, got {:?}", other),
        }
        assert!(matches!(sub.next().await, SubscriptionEvent::Error(_)));
    }

    #[tokio::test]
    async fn test_error_delivered_before_later_snapshots() {
        let (tx, mut sub) = Subscription::channel();
        tx.send_snapshot(snapshot(&["a"]));
        tx.send_error(SubscriptionError::Stream("quota exceeded".into()));
        tx.send_snapshot(snapshot(&["a", "b"]));

        assert!(matches!(sub.next().await, SubscriptionEvent::Snapshot(_)));
        assert!(matches!(sub.next().await, SubscriptionEvent::Error(_)));
    }

    #[tokio::test]
    async fn test_error_only() {
        let (tx, mut sub) = Subscription::channel();
        tx.send_error(SubscriptionError::Rejected("denied".into()));
        assert!(matches!(sub.next().await, SubscriptionEvent::Error(_)));
    }

    #[tokio::test]
    async fn test_unsubscribe_closes_both_ends() {
        let (tx, mut sub) = Subscription::channel();
        let handle = sub.handle();
        handle.unsubscribe();

        assert!(!handle.is_active());
        assert!(tx.is_closed());
        assert!(!tx.send_snapshot(snapshot(&["a"])));
        assert!(matches!(sub.next().await, SubscriptionEvent::Closed));
    }

    #[tokio::test]
    async fn test_dropped_sender_closes() {
        let (tx, mut sub) = Subscription::channel();
        drop(tx);
        assert!(matches!(sub.next().await, SubscriptionEvent::Closed));
    }
}
