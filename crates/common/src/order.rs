//! Order, cart and checkout records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Money, OrderId, OrderStatus, ProductId, UserId, VariantId};

/// Prefix of the human-readable order number.
pub const ORDER_NUMBER_PREFIX: &str = "JK";

/// How the order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryType {
    Mail,
    SelfPickup,
}

/// How the customer pays.
///
/// `Cash` is cash-on-pickup: the order waits for a manager instead of a
/// payment notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentType {
    Wallet,
    Card,
    Cash,
}

impl PaymentType {
    pub fn is_cash_on_pickup(&self) -> bool {
        matches!(self, PaymentType::Cash)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub postal_code: String,
    pub region: String,
    pub city: String,
    pub address: String,
}

/// What the customer entered on the checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutParameters {
    pub delivery_type: DeliveryType,
    pub payment_type: PaymentType,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub other_info: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<DeliveryAddress>,
}

impl CheckoutParameters {
    /// Creates parameters with only the delivery and payment choices set.
    pub fn new(delivery_type: DeliveryType, payment_type: PaymentType) -> Self {
        Self {
            delivery_type,
            payment_type,
            email: None,
            name: None,
            phone: None,
            other_info: None,
            delivery_address: None,
        }
    }
}

/// A line in a user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub count: u32,
    pub unit_price: Money,
    /// False for made-to-order variants that have no stock to reserve.
    #[serde(default = "default_tracks_inventory")]
    pub tracks_inventory: bool,
}

fn default_tracks_inventory() -> bool {
    true
}

impl CartItem {
    pub fn new(product_id: ProductId, variant_id: VariantId, count: u32, unit_price: Money) -> Self {
        Self {
            product_id,
            variant_id,
            count,
            unit_price,
            tracks_inventory: true,
        }
    }

    /// Marks the line as made-to-order.
    pub fn without_count(mut self) -> Self {
        self.tracks_inventory = false;
        self
    }

    /// Returns price times count, or `None` if it does not fit.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_multiply(self.count)
    }
}

/// The server-side cart that checkout converts into an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: UserId,
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn new(user_id: UserId, items: Vec<CartItem>) -> Self {
        Self { user_id, items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A purchased line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub count: u32,
    pub unit_price: Money,
}

impl From<&CartItem> for OrderItem {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id,
            variant_id: item.variant_id,
            count: item.count,
            unit_price: item.unit_price,
        }
    }
}

/// An order document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Display number derived from the creation time, e.g. `JK-0314-154210`.
    pub human_readable_id: String,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    /// Reservation deadline; only enforced while the status is a waiting one.
    pub reserved_until: DateTime<Utc>,
    pub total: Money,
    pub delivery_price: Option<Money>,
    pub checkout_parameters: CheckoutParameters,
}

impl Order {
    /// Returns the display number for an order created at `created_at`.
    pub fn order_number(created_at: DateTime<Utc>) -> String {
        format!(
            "{ORDER_NUMBER_PREFIX}-{}",
            created_at.format("%m%d-%H%M%S")
        )
    }

    /// Returns the total count ordered for a variant.
    pub fn ordered_count(&self, variant_id: VariantId) -> u32 {
        self.items
            .iter()
            .filter(|item| item.variant_id == variant_id)
            .map(|item| item.count)
            .sum()
    }

    /// Returns true if the reservation deadline has passed and still applies.
    pub fn is_reservation_expired(&self, now: DateTime<Utc>) -> bool {
        self.status.has_reservation_deadline() && self.reserved_until < now
    }
}
