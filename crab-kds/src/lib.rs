//! Crab KDS - 厨房显示系统核心
//!
//! # 架构概述
//!
//! 两个独立的实时查询（`in-kitchen` 待制作 / `ready` 待取餐）合并为一个看板：
//!
//! ```text
//! QueryService ──► StreamAdapter ×2 ──► OrderStore (+ NewArrivalTracker)
//!                                            │
//!                                            ▼
//!                 Notifier ◄── Aggregator ──► render ──► RenderSink
//!                                            ▲
//!            ActionHandler (mark ready) ─────┘ (processing locks)
//! ```
//!
//! # 模块结构
//!
//! - **订阅** (`subscription`): 查询服务接口，数据 / 错误分离的订阅通道
//! - **适配器** (`adapter`): 快照合并，新到订单计算
//! - **聚合** (`aggregator`): 过滤 + 时间倒序，触发提醒
//! - **操作** (`action`): 标记出餐，按订单加锁
//! - **渲染** (`render`, `sink`): 声明式看板 + 输出端
//! - **显示循环** (`display`): 单任务 `select!` 循环
//! - **内存服务** (`memory`): 测试 / 演示用查询服务

pub mod action;
pub mod adapter;
pub mod aggregator;
pub mod config;
pub mod demo;
pub mod display;
pub mod error;
pub mod logger;
pub mod memory;
pub mod notifier;
pub mod render;
pub mod sink;
pub mod store;
pub mod subscription;
pub mod tracker;

// Re-export 公共类型
pub use action::{ActionControl, ActionHandler, ControlSource, OrderUpdater, PendingReady, ProcessingLocks};
pub use adapter::{NewIds, StreamAdapter, StreamKind};
pub use aggregator::{Aggregator, CombinedView};
pub use config::KdsConfig;
pub use display::{DisplayCommand, KitchenDisplay, KitchenDisplayHandle};
pub use error::{ActionError, KdsError, KdsResult, SubscriptionError, UpdateError};
pub use memory::InMemoryOrderService;
pub use notifier::{ChannelNotifier, LogNotifier, Notifier, TerminalBell};
pub use render::{BoardView, OrderCard, RenderOptions, render};
pub use sink::{RenderSink, TerminalSink, WatchSink};
pub use store::OrderStore;
pub use subscription::{QueryService, Snapshot, Subscription, SubscriptionHandle};
pub use tracker::NewArrivalTracker;

// Re-export logger functions
pub use logger::{cleanup_old_logs, init_logger};
