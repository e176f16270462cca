//! Stream adapters
//!
//! 两个独立的实时查询（待制作 / 待取餐）各由一个适配器消费：
//! 快照写入 OrderStore，待制作流额外计算新到订单集合。

use shared::kitchen::{OrderId, OrderQuery, OrderStatus};
use std::collections::HashSet;
use std::fmt;

use crate::error::SubscriptionError;
use crate::store::OrderStore;
use crate::subscription::{QueryService, Snapshot, Subscription, SubscriptionEvent};
use crate::tracker::NewArrivalTracker;

/// Ids first observed by one delivery
pub type NewIds = HashSet<OrderId>;

/// Which filtered query an adapter watches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Orders awaiting preparation ("in-kitchen")
    Preparation,
    /// Orders ready for pickup
    Ready,
}

impl StreamKind {
    pub fn status(&self) -> OrderStatus {
        match self {
            StreamKind::Preparation => OrderStatus::InKitchen,
            StreamKind::Ready => OrderStatus::Ready,
        }
    }

    pub fn query(&self) -> OrderQuery {
        OrderQuery::status(self.status())
    }

    /// Only the preparation stream raises new-arrival alerts
    pub fn raises_alerts(&self) -> bool {
        matches!(self, StreamKind::Preparation)
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Preparation => write!(f, "in-kitchen"),
            StreamKind::Ready => write!(f, "ready"),
        }
    }
}

/// Merge one snapshot into the store and collect new arrivals
///
/// Ids missing from the snapshot are left untouched in the store.
pub fn apply_snapshot(
    kind: StreamKind,
    snapshot: &Snapshot,
    store: &mut OrderStore,
    tracker: &mut NewArrivalTracker,
) -> NewIds {
    let mut new_ids = NewIds::new();

    for order in snapshot.orders() {
        if kind.raises_alerts() && tracker.mark_seen(&order.id) {
            new_ids.insert(order.id.clone());
        }
        store.upsert(order);
    }

    new_ids
}

/// Consumes one subscription until it fails
#[derive(Debug)]
pub struct StreamAdapter {
    kind: StreamKind,
    subscription: Subscription,
    stalled: bool,
}

impl StreamAdapter {
    /// Subscribe to `kind`'s query (status filter, timestamp descending)
    pub fn subscribe(kind: StreamKind, service: &dyn QueryService) -> Result<Self, SubscriptionError> {
        let subscription = service.subscribe(kind.query())?;
        tracing::info!(stream = %kind, "Subscribed to order stream");
        Ok(Self::new(kind, subscription))
    }

    /// Subscribe, or fall back to a stalled adapter if the service refuses
    ///
    /// A rejected query only takes its own stream down.
    pub fn open(kind: StreamKind, service: &dyn QueryService) -> Self {
        match Self::subscribe(kind, service) {
            Ok(adapter) => adapter,
            Err(e) => {
                tracing::error!(stream = %kind, error = %e, "Order stream rejected, no updates");
                let (_, subscription) = Subscription::channel();
                let mut adapter = Self::new(kind, subscription);
                adapter.stall();
                adapter
            }
        }
    }

    pub fn new(kind: StreamKind, subscription: Subscription) -> Self {
        Self {
            kind,
            subscription,
            stalled: false,
        }
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Next snapshot, or `None` once the stream has failed or closed
    ///
    /// A failure is logged and the adapter stops for good; there is no
    /// reconnect.
    pub async fn next_snapshot(&mut self) -> Option<Snapshot> {
        if self.stalled {
            return None;
        }

        match self.subscription.next().await {
            SubscriptionEvent::Snapshot(snapshot) => {
                tracing::debug!(stream = %self.kind, count = snapshot.len(), "Snapshot received");
                Some(snapshot)
            }
            SubscriptionEvent::Error(e) => {
                tracing::error!(stream = %self.kind, error = %e, "Order stream failed, no further updates");
                self.stall();
                None
            }
            SubscriptionEvent::Closed => {
                tracing::warn!(stream = %self.kind, "Order stream closed");
                self.stall();
                None
            }
        }
    }

    /// Apply a snapshot received from this adapter
    pub fn apply(
        &self,
        snapshot: &Snapshot,
        store: &mut OrderStore,
        tracker: &mut NewArrivalTracker,
    ) -> NewIds {
        apply_snapshot(self.kind, snapshot, store, tracker)
    }

    pub fn unsubscribe(&mut self) {
        self.subscription.handle().unsubscribe();
    }

    fn stall(&mut self) {
        self.stalled = true;
        self.unsubscribe();
    }
}
