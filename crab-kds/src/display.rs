//! Kitchen display loop
//!
//! 单一执行上下文：两个订阅流、操作指令和操作结果都在同一个 `select!` 循环里处理，
//! OrderStore / NewArrivalTracker 只被这个循环修改。

use shared::kitchen::OrderId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::action::{ActionHandler, OrderUpdater};
use crate::adapter::{NewIds, StreamAdapter, StreamKind};
use crate::aggregator::{Aggregator, CombinedView};
use crate::config::KdsConfig;
use crate::error::{ActionError, KdsError, KdsResult};
use crate::notifier::Notifier;
use crate::render::{RenderOptions, render};
use crate::sink::RenderSink;
use crate::store::OrderStore;
use crate::subscription::QueryService;
use crate::tracker::NewArrivalTracker;

/// Staff input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayCommand {
    MarkReady(OrderId),
}

/// Outcome of a spawned update, reported back to the loop
#[derive(Debug)]
struct Settlement {
    order_id: OrderId,
    result: Result<(), ActionError>,
}

/// Sends commands to a running display
#[derive(Debug, Clone)]
pub struct KitchenDisplayHandle {
    tx: mpsc::Sender<DisplayCommand>,
}

impl KitchenDisplayHandle {
    /// Request the ready transition for an order
    ///
    /// Only queues the command; the outcome shows up on the board.
    pub async fn mark_ready(&self, id: impl Into<OrderId>) -> KdsResult<()> {
        self.send(DisplayCommand::MarkReady(id.into())).await
    }

    pub async fn send(&self, command: DisplayCommand) -> KdsResult<()> {
        self.tx.send(command).await.map_err(|_| KdsError::Stopped)
    }
}

pub struct KitchenDisplay<S: RenderSink> {
    store: OrderStore,
    tracker: NewArrivalTracker,
    aggregator: Aggregator,
    actions: ActionHandler,
    options: RenderOptions,
    sink: S,
    view: CombinedView,
    commands_tx: mpsc::Sender<DisplayCommand>,
    commands_rx: mpsc::Receiver<DisplayCommand>,
    settled_tx: mpsc::UnboundedSender<Settlement>,
    settled_rx: mpsc::UnboundedReceiver<Settlement>,
}

impl<S: RenderSink> KitchenDisplay<S> {
    pub fn new(
        config: &KdsConfig,
        updater: Arc<dyn OrderUpdater>,
        notifier: Arc<dyn Notifier>,
        sink: S,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(config.command_buffer.max(1));
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        let store = OrderStore::new();
        let aggregator = Aggregator::new(notifier);
        let view = aggregator.recompute(&store, NewIds::new());

        Self {
            store,
            tracker: NewArrivalTracker::new(),
            aggregator,
            actions: ActionHandler::new(updater),
            options: config.render_options(),
            sink,
            view,
            commands_tx,
            commands_rx,
            settled_tx,
            settled_rx,
        }
    }

    pub fn handle(&self) -> KitchenDisplayHandle {
        KitchenDisplayHandle {
            tx: self.commands_tx.clone(),
        }
    }

    /// Subscribe both streams and run until `shutdown` is cancelled
    ///
    /// A rejected or failed stream stops updating; the other stream and staff
    /// actions keep working.
    pub async fn run(
        mut self,
        service: &dyn QueryService,
        shutdown: CancellationToken,
    ) -> KdsResult<()> {
        let mut preparation = StreamAdapter::open(StreamKind::Preparation, service);
        let mut ready = StreamAdapter::open(StreamKind::Ready, service);

        tracing::info!(kitchen_area = %self.options.kitchen_area, "Kitchen display started");
        self.publish();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Kitchen display shutting down");
                    break;
                }
                Some(snapshot) = preparation.next_snapshot(), if !preparation.is_stalled() => {
                    let new_ids = preparation.apply(&snapshot, &mut self.store, &mut self.tracker);
                    self.refresh(new_ids);
                }
                Some(snapshot) = ready.next_snapshot(), if !ready.is_stalled() => {
                    let new_ids = ready.apply(&snapshot, &mut self.store, &mut self.tracker);
                    self.refresh(new_ids);
                }
                Some(command) = self.commands_rx.recv() => {
                    self.handle_command(command);
                }
                Some(settlement) = self.settled_rx.recv() => {
                    self.settle(settlement);
                }
            }
        }

        preparation.unsubscribe();
        ready.unsubscribe();
        Ok(())
    }

    /// Recompute after a snapshot was applied
    fn refresh(&mut self, new_ids: NewIds) {
        self.view = self.aggregator.recompute(&self.store, new_ids);

        let released = self.actions.locks().reconcile(&self.store);
        if released > 0 {
            tracing::debug!(released, "Processing locks released by snapshot");
        }

        self.publish();
    }

    fn handle_command(&mut self, command: DisplayCommand) {
        match command {
            DisplayCommand::MarkReady(id) => match self.actions.mark_ready(&id) {
                Ok(pending) => {
                    // 先渲染“处理中”，再发起更新
                    self.publish();

                    let settled_tx = self.settled_tx.clone();
                    tokio::spawn(async move {
                        let order_id = pending.order_id().clone();
                        let result = pending.settle().await;
                        let _ = settled_tx.send(Settlement { order_id, result });
                    });
                }
                Err(e) => {
                    tracing::warn!(order_id = %id, error = %e, "Mark ready rejected");
                }
            },
        }
    }

    /// Re-render with current lock state; no recompute, no alert
    fn settle(&mut self, settlement: Settlement) {
        tracing::debug!(
            order_id = %settlement.order_id,
            ok = settlement.result.is_ok(),
            "Mark ready settled"
        );
        // 快照可能先于更新结果到达
        self.actions.locks().reconcile(&self.store);
        self.publish();
    }

    fn publish(&mut self) {
        let board = render(&self.view, &self.actions, &self.options);
        self.sink.render(&board);
    }
}

impl<S: RenderSink> std::fmt::Debug for KitchenDisplay<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KitchenDisplay")
            .field("orders", &self.store.len())
            .field("seen", &self.tracker.len())
            .field("processing", &self.actions.locks().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryOrderService;
    use crate::notifier::ChannelNotifier;
    use crate::sink::WatchSink;
    use std::time::Duration;

    #[tokio::test]
    async fn test_handle_fails_after_display_dropped() {
        let service = InMemoryOrderService::new();
        let (notifier, _alerts) = ChannelNotifier::new();
        let (sink, _boards) = WatchSink::channel();
        let display = KitchenDisplay::new(
            &KdsConfig::default(),
            Arc::new(service),
            Arc::new(notifier),
            sink,
        );

        let handle = display.handle();
        drop(display);
        assert!(matches!(handle.mark_ready("a").await, Err(KdsError::Stopped)));
    }

    #[tokio::test]
    async fn test_initial_board_and_shutdown() {
        let service = InMemoryOrderService::new();
        let (notifier, _alerts) = ChannelNotifier::new();
        let (sink, mut boards) = WatchSink::channel();
        let display = KitchenDisplay::new(
            &KdsConfig::default(),
            Arc::new(service.clone()),
            Arc::new(notifier),
            sink,
        );

        let shutdown = CancellationToken::new();
        let task = {
            let service = service.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { display.run(&service, shutdown).await })
        };

        tokio::time::timeout(Duration::from_secs(1), boards.wait_for(|b| b.is_some()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            boards.borrow().as_ref().unwrap().empty_text.as_deref(),
            Some("Waiting for orders")
        );
        assert_eq!(service.subscriber_count(), 2);

        shutdown.cancel();
        task.await.unwrap().unwrap();
        assert_eq!(service.subscriber_count(), 0);
    }
}
