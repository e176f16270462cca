//! Live query and partial update types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

use super::order::{KitchenOrder, OrderStatus};

/// Ordering requested from the query service
///
/// The service is expected to honor it; consumers must not rely on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    #[default]
    TimestampDesc,
}

/// `where orderStatus == status order by timestamp desc`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderQuery {
    pub status: OrderStatus,
    pub order_by: OrderBy,
}

impl OrderQuery {
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status,
            order_by: OrderBy::TimestampDesc,
        }
    }

    pub fn matches(&self, order: &KitchenOrder) -> bool {
        order.status == self.status
    }

    /// Result ordering the query asks for
    pub fn compare(&self, a: &KitchenOrder, b: &KitchenOrder) -> Ordering {
        match self.order_by {
            OrderBy::TimestampDesc => b.sort_timestamp().cmp(&a.sort_timestamp()),
        }
    }
}

/// Partial update (only set fields are written)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_status: Option<OrderStatus>,
}

impl OrderPatch {
    pub fn status(status: OrderStatus) -> Self {
        Self {
            order_status: Some(status),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.order_status.is_none()
    }

    /// Merge the set fields into a document payload
    pub fn apply_to(&self, data: &mut Value) {
        if !data.is_object() {
            *data = Value::Object(Default::default());
        }
        if let (Value::Object(target), Ok(Value::Object(fields))) =
            (data, serde_json::to_value(self))
        {
            target.extend(fields);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patch_serializes_camel_case() {
        let patch = OrderPatch::status(OrderStatus::Ready);
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({"orderStatus": "ready"}));
        assert_eq!(serde_json::to_value(OrderPatch::default()).unwrap(), json!({}));
    }

    #[test]
    fn test_patch_merges_fields() {
        let mut data = json!({"orderId": "A-1", "orderStatus": "in-kitchen"});
        OrderPatch::status(OrderStatus::Ready).apply_to(&mut data);
        assert_eq!(data, json!({"orderId": "A-1", "orderStatus": "ready"}));

        let mut empty = Value::Null;
        OrderPatch::status(OrderStatus::Ready).apply_to(&mut empty);
        assert_eq!(empty, json!({"orderStatus": "ready"}));
    }
}
