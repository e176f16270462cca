//! Order documents as delivered by the query service
//!
//! Documents are loosely typed JSON objects. [`OrderDocument::to_order`] is
//! the single place where missing or malformed fields are defaulted:
//!
//! | key | field | default |
//! |-----|-------|---------|
//! | `orderId` | `label` | `"Order"` |
//! | `table` | `table` | `"-"` |
//! | `service` | `service` | `Takeaway` (case-insensitive `"dine-in"` → `DineIn`) |
//! | `items[].name` | `name` | `"Item"` |
//! | `items[].qty` | `quantity` | `1` (non-positive or non-numeric → `1`) |
//! | `items[].prep` | `prep` | `None` |
//! | `notes` | `notes` | `None` (blank → `None`) |
//! | `timestamp` | `timestamp` | `None`; number, `{seconds, nanoseconds}` or `{millis}` |
//! | `orderStatus` | `status` | `Other("")` |
//!
//! A document never fails to ingest.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::order::{KitchenItem, KitchenOrder, OrderId, OrderStatus, ServiceKind};

pub const DEFAULT_LABEL: &str = "Order";
pub const DEFAULT_TABLE: &str = "-";
pub const DEFAULT_ITEM_NAME: &str = "Item";
pub const DEFAULT_QUANTITY: u32 = 1;

/// Raw document: id plus untyped field map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDocument {
    pub id: OrderId,
    pub data: Value,
}

impl OrderDocument {
    pub fn new(id: impl Into<OrderId>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Field map, empty when the payload is not an object
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        self.data.as_object()
    }

    /// Apply the defaulting table
    pub fn to_order(&self) -> KitchenOrder {
        let field = |key: &str| self.fields().and_then(|f| f.get(key));

        KitchenOrder {
            id: self.id.clone(),
            label: field("orderId")
                .and_then(text)
                .unwrap_or_else(|| DEFAULT_LABEL.to_string()),
            table: field("table")
                .and_then(text)
                .unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            service: field("service")
                .and_then(Value::as_str)
                .map(ServiceKind::parse)
                .unwrap_or_default(),
            items: field("items")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(item).collect())
                .unwrap_or_default(),
            notes: field("notes").and_then(text),
            timestamp: field("timestamp").and_then(timestamp_millis),
            status: field("orderStatus")
                .and_then(Value::as_str)
                .map(OrderStatus::parse)
                .unwrap_or_default(),
        }
    }

    /// Inverse of [`to_order`](Self::to_order), used to seed stores
    pub fn from_order(order: &KitchenOrder) -> Self {
        let items: Vec<Value> = order
            .items
            .iter()
            .map(|i| {
                let mut obj = Map::new();
                obj.insert("name".into(), Value::from(i.name.clone()));
                obj.insert("qty".into(), Value::from(i.quantity));
                if let Some(prep) = &i.prep {
                    obj.insert("prep".into(), Value::from(prep.clone()));
                }
                Value::Object(obj)
            })
            .collect();

        let mut data = Map::new();
        data.insert("orderId".into(), Value::from(order.label.clone()));
        data.insert("table".into(), Value::from(order.table.clone()));
        data.insert("service".into(), Value::from(order.service.as_str()));
        data.insert("items".into(), Value::Array(items));
        if let Some(notes) = &order.notes {
            data.insert("notes".into(), Value::from(notes.clone()));
        }
        if let Some(ts) = order.timestamp {
            data.insert("timestamp".into(), Value::from(ts));
        }
        data.insert("orderStatus".into(), Value::from(order.status.as_str()));

        Self::new(order.id.clone(), Value::Object(data))
    }
}

/// Non-blank string, numbers rendered as text (tables are often numeric)
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn item(value: &Value) -> KitchenItem {
    let field = |key: &str| value.as_object().and_then(|f| f.get(key));

    KitchenItem {
        name: field("name")
            .and_then(text)
            .unwrap_or_else(|| DEFAULT_ITEM_NAME.to_string()),
        quantity: field("qty").and_then(quantity).unwrap_or(DEFAULT_QUANTITY),
        prep: field("prep").and_then(Value::as_str).map(str::to_string),
    }
}

fn quantity(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if n >= 1.0 && n <= u32::MAX as f64 {
        Some(n as u32)
    } else {
        None
    }
}

/// Epoch millis from a number or a convertible timestamp object
pub fn timestamp_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::Object(obj) => {
            if let Some(ms) = obj.get("millis").and_then(Value::as_i64) {
                return Some(ms);
            }
            // Firestore style, with or without the leading underscore
            let seconds = obj
                .get("seconds")
                .or_else(|| obj.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = obj
                .get("nanoseconds")
                .or_else(|| obj.get("_nanoseconds"))
                .and_then(Value::as_i64)
                .unwrap_or(0);
            // Out of range values are malformed, not an error
            seconds.checked_mul(1000)?.checked_add(nanos / 1_000_000)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_document() {
        let doc = OrderDocument::new(
            "doc-1",
            json!({
                "orderId": "R-17",
                "table": 12,
                "service": "DINE-IN",
                "items": [
                    {"name": "Paneer Tikka", "qty": 2, "prep": "kitchen"},
                    {"name": "Mango Lassi", "qty": 1, "prep": "bar"}
                ],
                "notes": "no onions",
                "timestamp": 1_700_000_000_000_i64,
                "orderStatus": "in-kitchen"
            }),
        );

        let order = doc.to_order();
        assert_eq!(order.id.as_str(), "doc-1");
        assert_eq!(order.label, "R-17");
        assert_eq!(order.table, "12");
        assert_eq!(order.service, ServiceKind::DineIn);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.notes.as_deref(), Some("no onions"));
        assert_eq!(order.timestamp, Some(1_700_000_000_000));
        assert_eq!(order.status, OrderStatus::InKitchen);
    }

    #[test]
    fn test_defaulting_table() {
        let doc = OrderDocument::new(
            "doc-2",
            json!({
                "table": "",
                "items": [{}, {"qty": 0}, {"qty": "3"}, {"qty": "lots", "name": ""}],
                "notes": "   ",
            }),
        );

        let order = doc.to_order();
        assert_eq!(order.label, DEFAULT_LABEL);
        assert_eq!(order.table, DEFAULT_TABLE);
        assert_eq!(order.service, ServiceKind::Takeaway);
        assert_eq!(order.notes, None);
        assert_eq!(order.timestamp, None);
        assert_eq!(order.status, OrderStatus::Other(String::new()));

        let qty: Vec<u32> = order.items.iter().map(|i| i.quantity).collect();
        assert_eq!(qty, vec![1, 1, 3, 1]);
        assert!(order.items.iter().all(|i| i.name == DEFAULT_ITEM_NAME));
        assert!(order.items.iter().all(|i| i.prep.is_none()));
    }

    #[test]
    fn test_non_object_payload_still_ingests() {
        let order = OrderDocument::new("doc-3", json!("garbage")).to_order();
        assert_eq!(order.label, DEFAULT_LABEL);
        assert!(order.items.is_empty());
    }

    #[test]
    fn test_timestamp_objects() {
        assert_eq!(
            timestamp_millis(&json!({"seconds": 1_700_000_000, "nanoseconds": 250_000_000})),
            Some(1_700_000_000_250)
        );
        assert_eq!(
            timestamp_millis(&json!({"_seconds": 10, "_nanoseconds": 0})),
            Some(10_000)
        );
        assert_eq!(timestamp_millis(&json!({"millis": 42})), Some(42));
        assert_eq!(timestamp_millis(&json!(1.5e3)), Some(1500));
        assert_eq!(timestamp_millis(&json!("yesterday")), None);
        assert_eq!(timestamp_millis(&json!({"nanoseconds": 5})), None);
        assert_eq!(timestamp_millis(&json!({"seconds": i64::MAX / 10})), None);
        assert_eq!(
            timestamp_millis(&json!({"seconds": i64::MAX / 1000, "nanoseconds": 999_000_000})),
            None
        );

        let order = OrderDocument::new("x", json!({"timestamp": {"seconds": i64::MAX / 10}})).to_order();
        assert_eq!(order.timestamp, None);
    }

    #[test]
    fn test_from_order_is_ingestible() {
        let order = KitchenOrder {
            id: OrderId::new("x"),
            label: "B-3".to_string(),
            table: "7".to_string(),
            service: ServiceKind::DineIn,
            items: vec![KitchenItem {
                name: "Biryani".to_string(),
                quantity: 2,
                prep: Some("kitchen".to_string()),
            }],
            notes: Some("extra raita".to_string()),
            timestamp: Some(99),
            status: OrderStatus::Ready,
        };

        assert_eq!(OrderDocument::from_order(&order).to_order(), order);
    }
}
