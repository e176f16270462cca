//! In-process order service
//!
//! 内存实现的查询服务 + 更新操作，用于测试和演示：
//! - 每次写入后重新计算每个订阅的结果集（状态过滤 + 时间倒序）
//! - 结果集有变化才推送（完整快照，而非增量）
//! - 可注入订阅错误和更新失败

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::kitchen::{KitchenOrder, OrderDocument, OrderId, OrderPatch, OrderQuery};
use std::collections::HashMap;
use std::sync::Arc;

use crate::action::OrderUpdater;
use crate::error::{SubscriptionError, UpdateError};
use crate::subscription::{QueryService, Snapshot, Subscription, SubscriptionSender};

#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderService {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    documents: Vec<OrderDocument>,
    index: HashMap<OrderId, usize>,
    subscribers: Vec<Subscriber>,
    failing_updates: usize,
}

#[derive(Debug)]
struct Subscriber {
    query: OrderQuery,
    sender: SubscriptionSender,
    last: Option<Snapshot>,
}

impl Inner {
    fn upsert(&mut self, document: OrderDocument) {
        match self.index.get(&document.id) {
            Some(&pos) => self.documents[pos] = document,
            None => {
                self.index.insert(document.id.clone(), self.documents.len());
                self.documents.push(document);
            }
        }
    }

    /// Current result set for a query
    fn evaluate(&self, query: &OrderQuery) -> Snapshot {
        let mut matched: Vec<(KitchenOrder, &OrderDocument)> = self
            .documents
            .iter()
            .map(|doc| (doc.to_order(), doc))
            .filter(|(order, _)| query.matches(order))
            .collect();

        matched.sort_by(|(a, _), (b, _)| query.compare(a, b));

        Snapshot::new(matched.into_iter().map(|(_, doc)| doc.clone()).collect())
    }

    /// Push changed result sets, dropping closed subscribers
    fn publish(&mut self) {
        let results: Vec<Snapshot> = self
            .subscribers
            .iter()
            .map(|s| self.evaluate(&s.query))
            .collect();

        for (subscriber, snapshot) in self.subscribers.iter_mut().zip(results) {
            if subscriber.last.as_ref() == Some(&snapshot) {
                continue;
            }
            if subscriber.sender.send_snapshot(snapshot.clone()) {
                subscriber.last = Some(snapshot);
            }
        }

        self.subscribers.retain(|s| !s.sender.is_closed());
    }
}

impl InMemoryOrderService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders<'a>(orders: impl IntoIterator<Item = &'a KitchenOrder>) -> Self {
        let service = Self::new();
        {
            let mut inner = service.inner.lock();
            for order in orders {
                inner.upsert(OrderDocument::from_order(order));
            }
        }
        service
    }

    /// Insert or replace a document
    pub fn put(&self, document: OrderDocument) {
        let mut inner = self.inner.lock();
        inner.upsert(document);
        inner.publish();
    }

    pub fn put_order(&self, order: &KitchenOrder) {
        self.put(OrderDocument::from_order(order));
    }

    /// Merge the patch's fields into an existing document
    pub fn patch(&self, id: &OrderId, patch: &OrderPatch) -> Result<(), UpdateError> {
        let mut inner = self.inner.lock();
        let pos = *inner
            .index
            .get(id)
            .ok_or_else(|| UpdateError::NotFound(id.clone()))?;
        patch.apply_to(&mut inner.documents[pos].data);
        inner.publish();
        Ok(())
    }

    pub fn get(&self, id: &OrderId) -> Option<KitchenOrder> {
        let inner = self.inner.lock();
        inner
            .index
            .get(id)
            .map(|&pos| inner.documents[pos].to_order())
    }

    /// Push an error to every live subscription
    pub fn fail_subscriptions(&self, message: &str) {
        let mut inner = self.inner.lock();
        for subscriber in &inner.subscribers {
            subscriber
                .sender
                .send_error(SubscriptionError::Stream(message.to_string()));
        }
        inner.subscribers.retain(|s| !s.sender.is_closed());
    }

    /// Make the next `count` updates fail
    pub fn fail_next_updates(&self, count: usize) {
        self.inner.lock().failing_updates = count;
    }

    /// Live subscriptions (closed ones are pruned on the next write)
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .subscribers
            .iter()
            .filter(|s| !s.sender.is_closed())
            .count()
    }
}

impl QueryService for InMemoryOrderService {
    fn subscribe(&self, query: OrderQuery) -> Result<Subscription, SubscriptionError> {
        let (sender, subscription) = Subscription::channel();
        let mut inner = self.inner.lock();

        let initial = inner.evaluate(&query);
        sender.send_snapshot(initial.clone());
        inner.subscribers.push(Subscriber {
            query,
            sender,
            last: Some(initial),
        });

        Ok(subscription)
    }
}

#[async_trait]
impl OrderUpdater for InMemoryOrderService {
    async fn update(&self, id: &OrderId, patch: OrderPatch) -> Result<(), UpdateError> {
        // Behave like a remote call: never complete inline
        tokio::task::yield_now().await;

        {
            let mut inner = self.inner.lock();
            if inner.failing_updates > 0 {
                inner.failing_updates -= 1;
                return Err(UpdateError::Rejected("injected failure".to_string()));
            }
        }
        self.patch(id, &patch)
    }
}
