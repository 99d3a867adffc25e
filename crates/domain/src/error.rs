//! Domain error types.

use common::{OrderId, OrderStatus};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during domain operations.
///
/// Lost races are not errors. A reservation that runs out of stock returns
/// `false`, and so does a transition that finds the order already moved.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The lifecycle graph has no such edge.
    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Requested stock is above the per-variant cap.
    #[error("Stock limit exceeded: requested {requested}, limit {limit}")]
    StockLimitExceeded { requested: u32, limit: u32 },

    /// A cart line has a negative price or the total does not fit.
    #[error("Invalid price: {0}")]
    InvalidPrice(String),
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
