//! Checkout: converting a cart into an order.
//!
//! The coordinator follows a fixed sequence:
//! 1. Write the order in `Creating` with its reservation deadline
//! 2. Reserve units for every counted line
//! 3. Move the order to its waiting status
//!
//! On a shortfall the reserved units are released and the order removed.
//! Anything a crash leaves behind is cleaned up by the reaper.

pub mod coordinator;
pub mod error;
pub mod policy;
pub mod services;

pub use coordinator::{CheckoutOutcome, ReservationCoordinator};
pub use error::CheckoutError;
pub use policy::ReservationPolicy;
pub use services::{ApprovalNotifier, InMemoryNotifier, LogNotifier};
