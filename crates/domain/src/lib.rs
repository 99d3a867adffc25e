//! Domain layer for the reservation engine.
//!
//! This crate provides:
//! - `InventoryLedger` for reserving, releasing and resizing unit stock
//! - `OrderLifecycle` for compare-and-swap status transitions
//! - `PriceCalculator` seam with a flat-rate implementation

pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod pricing;

pub use error::{DomainError, Result};
pub use ledger::{InventoryLedger, MAX_UNITS_PER_VARIANT, ResizeOutcome};
pub use lifecycle::OrderLifecycle;
pub use pricing::{FlatRatePricing, PriceCalculator, Quote};
