//! Combined view aggregation
//!
//! 合并视图：从 OrderStore 过滤出待制作/待取餐订单，按时间倒序排列。
//! 相同时间戳保持 OrderStore 的插入顺序（稳定排序）。

use chrono::{DateTime, Local};
use shared::kitchen::KitchenOrder;
use std::cmp::Reverse;
use std::sync::Arc;

use crate::adapter::NewIds;
use crate::notifier::Notifier;
use crate::store::OrderStore;

/// Render-ready result of one recompute
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedView {
    /// Displayed orders, newest first
    pub orders: Vec<KitchenOrder>,
    /// New arrivals carried by the signal that triggered this recompute
    pub new_ids: NewIds,
    pub updated_at: DateTime<Local>,
}

impl CombinedView {
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

pub struct Aggregator {
    notifier: Arc<dyn Notifier>,
}

impl Aggregator {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Displayed orders sorted by timestamp descending
    ///
    /// `sort_by_key` is stable, so equal timestamps keep store insertion order.
    pub fn combine(store: &OrderStore) -> Vec<KitchenOrder> {
        let mut orders: Vec<KitchenOrder> = store
            .all()
            .iter()
            .filter(|o| o.status.is_displayed())
            .cloned()
            .collect();
        orders.sort_by_key(|o| Reverse(o.sort_timestamp()));
        orders
    }

    /// Recompute the combined view; notifies once if `new_ids` is non-empty
    pub fn recompute(&self, store: &OrderStore, new_ids: NewIds) -> CombinedView {
        let orders = Self::combine(store);

        if !new_ids.is_empty() {
            self.notifier.notify(&new_ids);
        }

        tracing::debug!(
            displayed = orders.len(),
            stored = store.len(),
            new = new_ids.len(),
            "Combined view recomputed"
        );

        CombinedView {
            orders,
            new_ids,
            updated_at: Local::now(),
        }
    }
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator").finish_non_exhaustive()
    }
}
