//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Creating ──┬──► WaitingPayment ──┬──► Packing ──► Shipping ──► Shipped
///            │                     └──────────────► Shipping
///            ├──► WaitingApprove ─────────────────► Shipping
///            │         │                │
///            └─────────┴────────────────┴──► Deleted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order document exists, inventory is being reserved.
    #[default]
    Creating,

    /// Units reserved, waiting for online payment.
    WaitingPayment,

    /// Units reserved, cash-on-pickup order waiting for a manager.
    WaitingApprove,

    /// Unpaid, unapproved or abandoned order (terminal state).
    Deleted,

    /// Paid mail order being packed.
    Packing,

    /// Sent, or waiting to be picked up.
    Shipping,

    /// Delivered or handed over (terminal state).
    Shipped,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Creating,
        OrderStatus::WaitingPayment,
        OrderStatus::WaitingApprove,
        OrderStatus::Deleted,
        OrderStatus::Packing,
        OrderStatus::Shipping,
        OrderStatus::Shipped,
    ];

    /// Returns true if the lifecycle graph has an edge from `self` to `to`.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, to),
            (Creating, WaitingPayment)
                | (Creating, WaitingApprove)
                | (Creating, Deleted)
                | (WaitingPayment, Packing)
                | (WaitingPayment, Shipping)
                | (WaitingPayment, Deleted)
                | (WaitingApprove, Shipping)
                | (WaitingApprove, Deleted)
                | (Packing, Shipping)
                | (Shipping, Shipped)
        )
    }

    /// Returns true if the order waits on a reservation deadline in this status.
    pub fn has_reservation_deadline(&self) -> bool {
        matches!(self, OrderStatus::WaitingPayment | OrderStatus::WaitingApprove)
    }

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Deleted | OrderStatus::Shipped)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Creating => "Creating",
            OrderStatus::WaitingPayment => "WaitingPayment",
            OrderStatus::WaitingApprove => "WaitingApprove",
            OrderStatus::Deleted => "Deleted",
            OrderStatus::Packing => "Packing",
            OrderStatus::Shipping => "Shipping",
            OrderStatus::Shipped => "Shipped",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown status name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl std::fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unknown order status: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl std::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
