//! Inventory unit records.

use serde::{Deserialize, Serialize};

use crate::{OrderId, ProductId, UnitId, VariantId};

/// Reservation state of a single unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UnitState {
    #[default]
    Available,
    Reserved,
}

impl UnitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitState::Available => "available",
            UnitState::Reserved => "reserved",
        }
    }
}

impl std::fmt::Display for UnitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One physical, individually trackable unit of stock.
///
/// `order_id` is a back-reference to the order holding the reservation. It is
/// cleared on release, but readers must treat it as a hint and never as proof
/// of current ownership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryUnit {
    pub id: UnitId,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub order_id: Option<OrderId>,
    pub state: UnitState,
}

impl InventoryUnit {
    /// Creates a new Available unit.
    pub fn available(product_id: ProductId, variant_id: VariantId) -> Self {
        Self {
            id: UnitId::new(),
            product_id,
            variant_id,
            order_id: None,
            state: UnitState::Available,
        }
    }

    pub fn is_available(&self) -> bool {
        self.state == UnitState::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_unit_is_available_and_unbound() {
        let unit = InventoryUnit::available(ProductId::new(), VariantId::new());
        assert!(unit.is_available());
        assert!(unit.order_id.is_none());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(UnitState::Available.to_string(), "available");
        assert_eq!(UnitState::Reserved.to_string(), "reserved");
    }
}
