//! Mark-ready action
//!
//! 标记出餐：调用外部更新操作，将订单状态置为 ready。
//!
//! - 每个订单独立加锁（处理中），互不影响
//! - 成功后不修改本地 OrderStore，等待下一次快照推送
//! - 失败时释放锁并记录日志，不重试

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use shared::kitchen::{OrderId, OrderPatch, OrderStatus};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ActionError, UpdateError};
use crate::store::OrderStore;

/// External partial-update operation
#[async_trait]
pub trait OrderUpdater: Send + Sync {
    async fn update(&self, id: &OrderId, patch: OrderPatch) -> Result<(), UpdateError>;
}

/// Per-order action control state for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionControl {
    pub enabled: bool,
    pub processing: bool,
}

impl ActionControl {
    pub const IDLE: ActionControl = ActionControl {
        enabled: true,
        processing: false,
    };
    pub const PROCESSING: ActionControl = ActionControl {
        enabled: false,
        processing: true,
    };
}

/// Source of per-order control state
pub trait ControlSource {
    fn control(&self, id: &OrderId) -> ActionControl;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockState {
    /// Update call in flight
    Pending,
    /// Update accepted, waiting for a snapshot to show the transition
    AwaitingSnapshot,
}

/// Per-order processing locks
///
/// Shared between the display loop and in-flight update tasks; never a
/// global lock.
#[derive(Debug, Clone, Default)]
pub struct ProcessingLocks {
    inner: Arc<Mutex<HashMap<OrderId, LockState>>>,
}

impl ProcessingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_processing(&self, id: &OrderId) -> bool {
        self.inner.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    fn try_acquire(&self, id: &OrderId) -> bool {
        let mut locks = self.inner.lock();
        if locks.contains_key(id) {
            return false;
        }
        locks.insert(id.clone(), LockState::Pending);
        true
    }

    fn confirm(&self, id: &OrderId) {
        if let Some(state) = self.inner.lock().get_mut(id) {
            *state = LockState::AwaitingSnapshot;
        }
    }

    fn release(&self, id: &OrderId) {
        self.inner.lock().remove(id);
    }

    /// Drop confirmed locks whose order is no longer awaiting preparation
    ///
    /// Pending locks are left alone; their update task releases them.
    pub fn reconcile(&self, store: &OrderStore) -> usize {
        let mut locks = self.inner.lock();
        let before = locks.len();
        locks.retain(|id, state| {
            *state == LockState::Pending
                || store
                    .get(id)
                    .is_some_and(|o| o.status == OrderStatus::InKitchen)
        });
        before - locks.len()
    }
}

impl ControlSource for ProcessingLocks {
    fn control(&self, id: &OrderId) -> ActionControl {
        if self.is_processing(id) {
            ActionControl::PROCESSING
        } else {
            ActionControl::IDLE
        }
    }
}

/// Issues ready transitions
#[derive(Clone)]
pub struct ActionHandler {
    updater: Arc<dyn OrderUpdater>,
    locks: ProcessingLocks,
}

impl ActionHandler {
    pub fn new(updater: Arc<dyn OrderUpdater>) -> Self {
        Self {
            updater,
            locks: ProcessingLocks::new(),
        }
    }

    pub fn locks(&self) -> &ProcessingLocks {
        &self.locks
    }

    /// Take the order's processing lock and prepare the update call
    ///
    /// The lock is held from this point, so the control renders disabled
    /// before the call suspends. Drive the returned [`PendingReady`] to get
    /// the outcome.
    pub fn mark_ready(&self, id: &OrderId) -> Result<PendingReady, ActionError> {
        if !id.is_valid() {
            return Err(ActionError::InvalidIdentity);
        }
        if !self.locks.try_acquire(id) {
            return Err(ActionError::AlreadyProcessing(id.clone()));
        }

        tracing::debug!(order_id = %id, "Mark ready: lock acquired");
        Ok(PendingReady {
            id: id.clone(),
            updater: self.updater.clone(),
            locks: self.locks.clone(),
            settled: false,
        })
    }
}

impl ControlSource for ActionHandler {
    fn control(&self, id: &OrderId) -> ActionControl {
        self.locks.control(id)
    }
}

impl std::fmt::Debug for ActionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionHandler")
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}

/// In-flight ready transition
///
/// Dropping it before it settles releases the lock.
#[must_use = "the update is only issued when the pending action is settled"]
pub struct PendingReady {
    id: OrderId,
    updater: Arc<dyn OrderUpdater>,
    locks: ProcessingLocks,
    settled: bool,
}

impl PendingReady {
    pub fn order_id(&self) -> &OrderId {
        &self.id
    }

    /// Issue the update and wait for its outcome
    pub async fn settle(mut self) -> Result<(), ActionError> {
        let result = self
            .updater
            .update(&self.id, OrderPatch::status(OrderStatus::Ready))
            .await;

        self.settled = true;
        match result {
            Ok(()) => {
                self.locks.confirm(&self.id);
                tracing::info!(order_id = %self.id, "Order marked ready");
                Ok(())
            }
            Err(e) => {
                self.locks.release(&self.id);
                tracing::error!(order_id = %self.id, error = %e, "Failed to mark ready");
                Err(e.into())
            }
        }
    }
}

impl Drop for PendingReady {
    fn drop(&mut self) {
        if !self.settled {
            self.locks.release(&self.id);
        }
    }
}

impl std::fmt::Debug for PendingReady {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingReady")
            .field("id", &self.id)
            .field("settled", &self.settled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::kitchen::OrderDocument;
    use tokio::sync::Notify;

    /// Updater that blocks until released, then succeeds or fails
    struct GatedUpdater {
        gate: Notify,
        fail: bool,
    }

    #[async_trait]
    impl OrderUpdater for GatedUpdater {
        async fn update(&self, _id: &OrderId, patch: OrderPatch) -> Result<(), UpdateError> {
            assert_eq!(patch, OrderPatch::status(OrderStatus::Ready));
            self.gate.notified().await;
            if self.fail {
                Err(UpdateError::Unavailable("offline".into()))
            } else {
                Ok(())
            }
        }
    }

    fn gated(fail: bool) -> Arc<GatedUpdater> {
        Arc::new(GatedUpdater {
            gate: Notify::new(),
            fail,
        })
    }

    fn store_with(id: &str, status: &str) -> OrderStore {
        let mut store = OrderStore::new();
        store.upsert(OrderDocument::new(id, json!({"orderStatus": status})).to_order());
        store
    }

    #[tokio::test]
    async fn test_action_isolation() {
        let updater = gated(false);
        let handler = ActionHandler::new(updater.clone());
        let a = OrderId::new("A");
        let b = OrderId::new("B");

        let pending = handler.mark_ready(&a).unwrap();
        let task = tokio::spawn(pending.settle());
        tokio::task::yield_now().await;

        assert_eq!(handler.control(&a), ActionControl::PROCESSING);
        assert_eq!(handler.control(&b), ActionControl::IDLE);

        // B is still actionable while A is pending
        let pending_b = handler.mark_ready(&b).unwrap();
        assert!(handler.locks().is_processing(&b));
        drop(pending_b);
        assert!(!handler.locks().is_processing(&b));

        updater.gate.notify_one();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_transition_rejected() {
        let handler = ActionHandler::new(gated(false));
        let a = OrderId::new("A");

        let _pending = handler.mark_ready(&a).unwrap();
        assert!(matches!(
            handler.mark_ready(&a),
            Err(ActionError::AlreadyProcessing(id)) if id == a
        ));
    }

    #[tokio::test]
    async fn test_invalid_identity() {
        let handler = ActionHandler::new(gated(false));
        assert!(matches!(
            handler.mark_ready(&OrderId::new("")),
            Err(ActionError::InvalidIdentity)
        ));
        assert!(handler.locks().is_empty());
    }

    #[tokio::test]
    async fn test_failure_releases_lock() {
        let updater = gated(true);
        let handler = ActionHandler::new(updater.clone());
        let a = OrderId::new("A");

        let task = tokio::spawn(handler.mark_ready(&a).unwrap().settle());
        tokio::task::yield_now().await;
        assert!(handler.locks().is_processing(&a));

        updater.gate.notify_one();
        let result = task.await.unwrap();
        assert!(matches!(result, Err(ActionError::Update(UpdateError::Unavailable(_)))));
        assert_eq!(handler.control(&a), ActionControl::IDLE);
    }

    #[tokio::test]
    async fn test_success_holds_lock_until_snapshot() {
        let updater = gated(false);
        let handler = ActionHandler::new(updater.clone());
        let a = OrderId::new("A");

        let task = tokio::spawn(handler.mark_ready(&a).unwrap().settle());
        tokio::task::yield_now().await;
        updater.gate.notify_one();
        task.await.unwrap().unwrap();

        // Still awaiting preparation locally: keep processing
        assert_eq!(handler.locks().reconcile(&store_with("A", "in-kitchen")), 0);
        assert!(handler.locks().is_processing(&a));

        // Snapshot shows the transition
        assert_eq!(handler.locks().reconcile(&store_with("A", "ready")), 1);
        assert!(!handler.locks().is_processing(&a));
    }

    #[tokio::test]
    async fn test_reconcile_leaves_pending_locks() {
        let handler = ActionHandler::new(gated(false));
        let a = OrderId::new("A");

        let _pending = handler.mark_ready(&a).unwrap();
        assert_eq!(handler.locks().reconcile(&store_with("A", "ready")), 0);
        assert!(handler.locks().is_processing(&a));
    }
}
