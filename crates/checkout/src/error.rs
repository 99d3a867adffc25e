//! Checkout error types.

use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur while creating an order from a cart.
///
/// Running out of stock is not an error; see `CheckoutOutcome`.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart has no items.
    #[error("Cart is empty")]
    EmptyCart,

    /// Domain error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The approval notification could not be delivered.
    #[error("Notification error: {0}")]
    Notification(String),
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
