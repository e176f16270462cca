//! Kitchen display order model
//!
//! 厨房显示 (KDS) 订单模型，查询服务实现与显示核心共用。

mod document;
mod order;
mod query;

pub use document::{
    DEFAULT_ITEM_NAME, DEFAULT_LABEL, DEFAULT_QUANTITY, DEFAULT_TABLE, OrderDocument,
    timestamp_millis,
};
pub use order::{KitchenItem, KitchenOrder, OrderId, OrderStatus, ServiceKind};
pub use query::{OrderBy, OrderPatch, OrderQuery};
