//! Order store - single source of truth for the board
//!
//! 订单存储：每个订单 ID 仅保留最新一条记录，按首次出现顺序排列。
//! 不提供删除操作，订单只会因状态变化被看板过滤掉。

use shared::kitchen::{KitchenOrder, OrderId};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct OrderStore {
    index: HashMap<OrderId, usize>,
    orders: Vec<KitchenOrder>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the record for `order.id` wholesale
    ///
    /// Returns `true` when the id was seen for the first time. Replacement keeps
    /// the original insertion position.
    pub fn upsert(&mut self, order: KitchenOrder) -> bool {
        match self.index.get(&order.id) {
            Some(&pos) => {
                self.orders[pos] = order;
                false
            }
            None => {
                self.index.insert(order.id.clone(), self.orders.len());
                self.orders.push(order);
                true
            }
        }
    }

    pub fn get(&self, id: &OrderId) -> Option<&KitchenOrder> {
        self.index.get(id).map(|&pos| &self.orders[pos])
    }

    /// All records in first-seen order
    pub fn all(&self) -> &[KitchenOrder] {
        &self.orders
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
