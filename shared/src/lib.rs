//! Shared types for Crab KDS
//!
//! Kitchen order model, the loosely-typed document format delivered by query
//! services, and the query / patch types both sides agree on.

pub mod kitchen;
pub mod util;

// Re-exports
pub use kitchen::{KitchenOrder, OrderDocument, OrderId, OrderStatus};
pub use serde::{Deserialize, Serialize};
