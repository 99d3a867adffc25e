use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use common::{
    InventoryUnit, Order, OrderId, OrderStatus, ProductId, UnitId, UnitState, UserId, VariantId,
};

use crate::{
    OrderQuery, Result,
    store::{InventoryStore, OrderStore},
};

/// In-memory store implementation.
///
/// Each conditional bulk update runs under a single write lock, which gives
/// it the same all-rows-at-once semantics as the PostgreSQL `UPDATE`.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    units: Arc<RwLock<HashMap<UnitId, InventoryUnit>>>,
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of units stored, in any state.
    pub async fn unit_count(&self) -> usize {
        self.units.read().await.len()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

#[async_trait]
impl InventoryStore for InMemoryStore {
    async fn insert_units(&self, units: Vec<InventoryUnit>) -> Result<()> {
        let mut store = self.units.write().await;
        for unit in units {
            store.insert(unit.id, unit);
        }
        Ok(())
    }

    async fn find_available_ids(
        &self,
        variant_id: VariantId,
        limit: usize,
    ) -> Result<Vec<UnitId>> {
        let store = self.units.read().await;
        Ok(store
            .values()
            .filter(|u| u.variant_id == variant_id && u.is_available())
            .map(|u| u.id)
            .take(limit)
            .collect())
    }

    async fn reserve_if_available(&self, unit_ids: &[UnitId], order_id: OrderId) -> Result<u64> {
        let mut store = self.units.write().await;
        let mut reserved = 0;
        for id in unit_ids {
            if let Some(unit) = store.get_mut(id)
                && unit.is_available()
            {
                unit.state = UnitState::Reserved;
                unit.order_id = Some(order_id);
                reserved += 1;
            }
        }
        Ok(reserved)
    }

    async fn release_by_order(&self, order_id: OrderId) -> Result<u64> {
        let mut store = self.units.write().await;
        let mut released = 0;
        for unit in store.values_mut() {
            if unit.order_id == Some(order_id) {
                unit.state = UnitState::Available;
                unit.order_id = None;
                released += 1;
            }
        }
        Ok(released)
    }

    async fn find_available_unit_ids(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
    ) -> Result<Vec<UnitId>> {
        let store = self.units.read().await;
        Ok(store
            .values()
            .filter(|u| {
                u.product_id == product_id && u.variant_id == variant_id && u.is_available()
            })
            .map(|u| u.id)
            .collect())
    }

    async fn delete_available(&self, unit_ids: &[UnitId]) -> Result<u64> {
        let mut store = self.units.write().await;
        let mut deleted = 0;
        for id in unit_ids {
            if store.get(id).is_some_and(InventoryUnit::is_available) {
                store.remove(id);
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn delete_available_for_product(&self, product_id: ProductId) -> Result<u64> {
        let mut store = self.units.write().await;
        let before = store.len();
        store.retain(|_, u| !(u.product_id == product_id && u.is_available()));
        Ok((before - store.len()) as u64)
    }

    async fn delete_reserved_by_order(&self, order_id: OrderId) -> Result<u64> {
        let mut store = self.units.write().await;
        let before = store.len();
        store.retain(|_, u| !(u.order_id == Some(order_id) && u.state == UnitState::Reserved));
        Ok((before - store.len()) as u64)
    }

    async fn count_available(&self, variant_ids: &[VariantId]) -> Result<HashMap<VariantId, u64>> {
        let store = self.units.read().await;
        let mut counts = HashMap::new();
        for unit in store.values() {
            if unit.is_available() && variant_ids.contains(&unit.variant_id) {
                *counts.entry(unit.variant_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn count_all_available(&self) -> Result<HashMap<VariantId, u64>> {
        let store = self.units.read().await;
        let mut counts = HashMap::new();
        for unit in store.values().filter(|u| u.is_available()) {
            *counts.entry(unit.variant_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn units_for_order(&self, order_id: OrderId) -> Result<Vec<InventoryUnit>> {
        let store = self.units.read().await;
        Ok(store
            .values()
            .filter(|u| u.order_id == Some(order_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, order: Order) -> Result<()> {
        self.orders.write().await.insert(order.id, order);
        Ok(())
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn compare_and_set_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool> {
        let mut store = self.orders.write().await;
        match store.get_mut(&id) {
            Some(order) if order.status == from => {
                order.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_if_status(&self, id: OrderId, status: OrderStatus) -> Result<bool> {
        let mut store = self.orders.write().await;
        if store.get(&id).is_some_and(|o| o.status == status) {
            store.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn find_ids(&self, query: OrderQuery) -> Result<Vec<OrderId>> {
        let store = self.orders.read().await;
        let mut matching: Vec<_> = store
            .values()
            .filter(|o| query.matches(o.status, o.user_id, o.created_at, o.reserved_until))
            .collect();
        matching.sort_by_key(|o| o.created_at);

        let ids = matching.into_iter().map(|o| o.id);
        Ok(match query.limit {
            Some(limit) => ids.take(limit).collect(),
            None => ids.collect(),
        })
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        let store = self.orders.read().await;
        Ok(newest_first(store.values().cloned().collect()))
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let store = self.orders.read().await;
        Ok(newest_first(
            store
                .values()
                .filter(|o| o.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }
}
