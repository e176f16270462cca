//! Board renderer
//!
//! Pure function from a combined view (plus per-order action state) to a
//! declarative board description. Platform sinks consume the description;
//! every render replaces the whole board.

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use shared::kitchen::{KitchenOrder, OrderId, OrderStatus, ServiceKind};

use crate::action::{ActionControl, ControlSource};
use crate::aggregator::CombinedView;

pub const ACTION_LABEL: &str = "Mark as Ready";
pub const NO_KITCHEN_ITEMS: &str = "No kitchen items.";

/// Rendering options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Preparation-area tag shown on this display
    pub kitchen_area: String,
    /// Text shown when no order is displayed
    pub empty_text: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            kitchen_area: "kitchen".to_string(),
            empty_text: "Waiting for orders".to_string(),
        }
    }
}

/// Whole board
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardView {
    pub cards: Vec<OrderCard>,
    /// Set only when `cards` is empty
    pub empty_text: Option<String>,
    /// "Updated: HH:MM:SS"
    pub updated_at: String,
}

impl BoardView {
    pub fn card(&self, id: &OrderId) -> Option<&OrderCard> {
        self.cards.iter().find(|c| &c.id == id)
    }
}

/// One order card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderCard {
    pub id: OrderId,
    pub label: String,
    /// "Table 12"
    pub table_pill: String,
    pub service: ServiceKind,
    pub service_pill: &'static str,
    /// "2 × Paneer Tikka", or the placeholder line
    pub lines: Vec<String>,
    /// "Notes: ..."
    pub notes: Option<String>,
    /// Formatted order time
    pub meta: String,
    /// Highlighted as a new arrival
    pub is_new: bool,
    /// Rendered muted (ready for pickup)
    pub is_ready: bool,
    pub action_label: &'static str,
    pub action: ActionControl,
}

/// Render the board
pub fn render(view: &CombinedView, controls: &dyn ControlSource, options: &RenderOptions) -> BoardView {
    let cards: Vec<OrderCard> = view
        .orders
        .iter()
        .map(|order| {
            render_card(
                order,
                view.new_ids.contains(&order.id),
                controls.control(&order.id),
                options,
            )
        })
        .collect();

    let empty_text = cards.is_empty().then(|| options.empty_text.clone());

    BoardView {
        cards,
        empty_text,
        updated_at: format_updated_at(&view.updated_at),
    }
}

fn render_card(
    order: &KitchenOrder,
    is_new: bool,
    action: ActionControl,
    options: &RenderOptions,
) -> OrderCard {
    let mut lines: Vec<String> = order
        .items_for(&options.kitchen_area)
        .map(|item| format!("{} × {}", item.quantity, item.name))
        .collect();
    if lines.is_empty() {
        lines.push(NO_KITCHEN_ITEMS.to_string());
    }

    OrderCard {
        id: order.id.clone(),
        label: order.label.clone(),
        table_pill: format!("Table {}", order.table),
        service: order.service,
        service_pill: order.service.label(),
        lines,
        notes: order.notes.as_ref().map(|n| format!("Notes: {}", n)),
        meta: format_timestamp(order.timestamp, &Local),
        is_new,
        is_ready: order.status == OrderStatus::Ready,
        action_label: ACTION_LABEL,
        action,
    }
}

/// "Nov 14, 22:13"; empty for a missing or zero timestamp
pub fn format_timestamp<Tz: TimeZone>(millis: Option<i64>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match millis.filter(|ms| *ms != 0) {
        Some(ms) => match tz.timestamp_millis_opt(ms).single() {
            Some(dt) => dt.format("%b %-d, %H:%M").to_string(),
            None => String::new(),
        },
        None => String::new(),
    }
}

fn format_updated_at(at: &DateTime<Local>) -> String {
    format!("Updated: {}", at.format("%H:%M:%S"))
}
