//! KDS error types

use shared::kitchen::OrderId;
use thiserror::Error;

/// Live query failures (delivered on the subscription's error channel)
#[derive(Debug, Clone, Error)]
pub enum SubscriptionError {
    /// Query refused by the service
    #[error("Subscription rejected: {0}")]
    Rejected(String),

    /// Stream broke after it was established
    #[error("Stream failed: {0}")]
    Stream(String),
}

/// External update operation failures
#[derive(Debug, Clone, Error)]
pub enum UpdateError {
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    #[error("Update rejected: {0}")]
    Rejected(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// Mark-ready action failures
#[derive(Debug, Clone, Error)]
pub enum ActionError {
    /// Order has no usable identity
    #[error("Invalid order identity")]
    InvalidIdentity,

    /// A ready transition for this order is already in flight
    #[error("Order already processing: {0}")]
    AlreadyProcessing(OrderId),

    #[error(transparent)]
    Update(#[from] UpdateError),
}

/// KDS error type
#[derive(Debug, Error)]
pub enum KdsError {
    /// Display loop has stopped and no longer accepts commands
    #[error("Display stopped")]
    Stopped,
}

/// Result type for KDS operations
pub type KdsResult<T> = Result<T, KdsError>;
