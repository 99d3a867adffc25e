//! Shared data model for the store reservation engine.
//!
//! Records are plain serde structs; every mutation of their `state`/`status`
//! fields goes through the compare-and-swap primitives of the `store` crate.

pub mod inventory;
pub mod money;
pub mod order;
pub mod status;
pub mod types;

pub use inventory::{InventoryUnit, UnitState};
pub use money::Money;
pub use order::{
    Cart, CartItem, CheckoutParameters, DeliveryAddress, DeliveryType, ORDER_NUMBER_PREFIX,
    Order, OrderItem, PaymentType,
};
pub use status::{OrderStatus, UnknownStatus};
pub use types::{OrderId, ProductId, UnitId, UserId, VariantId};
