//! Kitchen order record

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable order identity (document id in the orders collection)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Blank ids cannot be addressed by the update operation
    pub fn is_valid(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for OrderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// 服务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceKind {
    /// 堂食
    DineIn,
    /// 外带
    #[default]
    Takeaway,
}

impl ServiceKind {
    /// Anything other than a case-insensitive "dine-in" is a takeaway order
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("dine-in") {
            ServiceKind::DineIn
        } else {
            ServiceKind::Takeaway
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::DineIn => "dine-in",
            ServiceKind::Takeaway => "takeaway",
        }
    }

    /// Pill text shown on the order card
    pub fn label(&self) -> &'static str {
        match self {
            ServiceKind::DineIn => "Dine-in",
            ServiceKind::Takeaway => "Takeaway",
        }
    }
}

/// Order status as stored in the `orderStatus` field
///
/// Unknown values are kept verbatim in `Other` so a later write of the same
/// document round-trips; they never appear on the board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    /// 待制作 ("in-kitchen")
    InKitchen,
    /// 待取餐 ("ready")
    Ready,
    Other(String),
}

impl OrderStatus {
    pub const IN_KITCHEN: &'static str = "in-kitchen";
    pub const READY: &'static str = "ready";

    pub fn parse(value: &str) -> Self {
        match value {
            Self::IN_KITCHEN => OrderStatus::InKitchen,
            Self::READY => OrderStatus::Ready,
            other => OrderStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::InKitchen => Self::IN_KITCHEN,
            OrderStatus::Ready => Self::READY,
            OrderStatus::Other(s) => s,
        }
    }

    /// Statuses shown on the kitchen board
    pub fn is_displayed(&self) -> bool {
        matches!(self, OrderStatus::InKitchen | OrderStatus::Ready)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Other(String::new())
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        OrderStatus::parse(&value)
    }
}

impl From<OrderStatus> for String {
    fn from(value: OrderStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KitchenItem {
    pub name: String,
    pub quantity: u32,
    /// Preparation area tag ("kitchen", "bar", ...)
    pub prep: Option<String>,
}

impl KitchenItem {
    pub fn prepared_in(&self, area: &str) -> bool {
        self.prep
            .as_deref()
            .is_some_and(|prep| prep.eq_ignore_ascii_case(area))
    }
}

/// Kitchen order record, defaults already applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KitchenOrder {
    pub id: OrderId,
    /// Human order label (e.g. "A-102")
    pub label: String,
    pub table: String,
    pub service: ServiceKind,
    pub items: Vec<KitchenItem>,
    pub notes: Option<String>,
    /// Creation/update time in epoch millis
    pub timestamp: Option<i64>,
    pub status: OrderStatus,
}

impl KitchenOrder {
    /// Items the given preparation area is responsible for
    pub fn items_for<'a>(&'a self, area: &'a str) -> impl Iterator<Item = &'a KitchenItem> + 'a {
        self.items.iter().filter(move |item| item.prepared_in(area))
    }

    /// Sort key: missing timestamps sort as epoch 0
    pub fn sort_timestamp(&self) -> i64 {
        self.timestamp.unwrap_or(0)
    }
}
