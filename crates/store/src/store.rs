use std::collections::HashMap;

use async_trait::async_trait;

use common::{
    InventoryUnit, Order, OrderId, OrderStatus, ProductId, UnitId, UserId, VariantId,
};

use crate::{OrderQuery, Result};

/// Storage for individually tracked inventory units.
///
/// Every mutating operation is a single conditional bulk update: the backend
/// applies the change only to rows that still match the guard and reports
/// how many rows it touched. Callers compare that count to what they asked
/// for to detect lost races.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Inserts new units.
    async fn insert_units(&self, units: Vec<InventoryUnit>) -> Result<()>;

    /// Returns up to `limit` ids of Available units of a variant.
    ///
    /// The result is a snapshot; the units may be taken by the time the
    /// caller acts on them.
    async fn find_available_ids(&self, variant_id: VariantId, limit: usize)
    -> Result<Vec<UnitId>>;

    /// Binds every listed unit that is still Available to `order_id`.
    ///
    /// Returns the number of units actually reserved.
    async fn reserve_if_available(&self, unit_ids: &[UnitId], order_id: OrderId) -> Result<u64>;

    /// Returns every unit bound to `order_id` to Available.
    ///
    /// Returns the number of units released; zero when nothing was bound.
    async fn release_by_order(&self, order_id: OrderId) -> Result<u64>;

    /// Returns the ids of every Available unit of a product variant.
    async fn find_available_unit_ids(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
    ) -> Result<Vec<UnitId>>;

    /// Deletes the listed units that are still Available.
    ///
    /// Returns the number of units deleted.
    async fn delete_available(&self, unit_ids: &[UnitId]) -> Result<u64>;

    /// Deletes every Available unit of a product. Reserved units are kept.
    async fn delete_available_for_product(&self, product_id: ProductId) -> Result<u64>;

    /// Deletes the Reserved units bound to an order.
    async fn delete_reserved_by_order(&self, order_id: OrderId) -> Result<u64>;

    /// Counts Available units for each listed variant.
    ///
    /// Variants with no Available units are absent from the map.
    async fn count_available(&self, variant_ids: &[VariantId]) -> Result<HashMap<VariantId, u64>>;

    /// Counts Available units for every variant that has any.
    async fn count_all_available(&self) -> Result<HashMap<VariantId, u64>>;

    /// Returns the units currently bound to an order.
    async fn units_for_order(&self, order_id: OrderId) -> Result<Vec<InventoryUnit>>;
}

/// Storage for order documents.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a new order.
    async fn insert_order(&self, order: Order) -> Result<()>;

    /// Retrieves an order by id.
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Sets the status to `to` only if it is currently `from`.
    ///
    /// Returns true if the update was applied.
    async fn compare_and_set_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool>;

    /// Deletes the order only if its status is `status`.
    ///
    /// Returns true if the order was deleted.
    async fn delete_if_status(&self, id: OrderId, status: OrderStatus) -> Result<bool>;

    /// Returns the ids of orders matching the query, oldest first.
    async fn find_ids(&self, query: OrderQuery) -> Result<Vec<OrderId>>;

    /// Returns every order, newest first.
    async fn all_orders(&self) -> Result<Vec<Order>>;

    /// Returns a user's orders, newest first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;
}

/// A backend providing both inventory and order storage.
pub trait Store: InventoryStore + OrderStore + Clone + 'static {}

impl<T: InventoryStore + OrderStore + Clone + 'static> Store for T {}
