//! Inventory ledger: reservation, release and resizing of unit stock.

use std::collections::HashMap;

use serde::Serialize;

use common::{InventoryUnit, OrderId, ProductId, VariantId};
use store::InventoryStore;

use crate::error::{DomainError, Result};

/// Maximum desired stock for a single variant.
pub const MAX_UNITS_PER_VARIANT: u32 = 1000;

/// Result of resizing a variant's stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ResizeOutcome {
    pub added: u32,
    pub removed: u32,
}

/// Owns every change to unit state and order binding.
///
/// There is no lock. Reservation is a select/compare-and-swap/verify loop:
/// the bulk update re-checks `state = Available` per unit, so two callers can
/// never bind the same unit, and the affected-row count tells the caller how
/// much of its request was lost to a competitor.
#[derive(Clone)]
pub struct InventoryLedger<S: InventoryStore> {
    store: S,
}

impl<S: InventoryStore> InventoryLedger<S> {
    /// Creates a new ledger over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Binds `count` Available units of a variant to an order.
    ///
    /// Returns `false` once a selection round finds fewer candidates than are
    /// still needed. Units reserved by earlier rounds stay bound to the order;
    /// the caller releases them.
    #[tracing::instrument(skip(self))]
    pub async fn reserve_units(
        &self,
        variant_id: VariantId,
        count: u32,
        order_id: OrderId,
    ) -> Result<bool> {
        let mut needed = count as usize;

        while needed > 0 {
            let candidates = self.store.find_available_ids(variant_id, needed).await?;
            if candidates.len() < needed {
                tracing::info!(
                    %order_id,
                    %variant_id,
                    needed,
                    available = candidates.len(),
                    "Not enough available units"
                );
                metrics::counter!("inventory_reservation_exhausted_total").increment(1);
                return Ok(false);
            }

            let reserved = self
                .store
                .reserve_if_available(&candidates, order_id)
                .await?;
            metrics::counter!("inventory_units_reserved_total").increment(reserved);
            needed = needed.saturating_sub(reserved as usize);

            if needed > 0 {
                tracing::info!(
                    %order_id,
                    %variant_id,
                    reserved,
                    needed,
                    "Lost reservation race, retrying shortfall"
                );
                metrics::counter!("inventory_reservation_retries_total").increment(1);
            }
        }

        Ok(true)
    }

    /// Returns every unit bound to the order to Available.
    ///
    /// Idempotent: a second call releases nothing and returns zero.
    #[tracing::instrument(skip(self))]
    pub async fn release_units(&self, order_id: OrderId) -> Result<u64> {
        let released = self.store.release_by_order(order_id).await?;
        if released > 0 {
            tracing::debug!(%order_id, released, "Released units");
            metrics::counter!("inventory_units_released_total").increment(released);
        }
        Ok(released)
    }

    /// Brings a variant's Available stock to `desired` units.
    ///
    /// Tops up with new units or deletes surplus Available ones. Reserved
    /// units are never touched, so a shrink can remove fewer units than asked
    /// if a reservation wins the race for them.
    #[tracing::instrument(skip(self))]
    pub async fn resize(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
        desired: u32,
    ) -> Result<ResizeOutcome> {
        if desired > MAX_UNITS_PER_VARIANT {
            return Err(DomainError::StockLimitExceeded {
                requested: desired,
                limit: MAX_UNITS_PER_VARIANT,
            });
        }

        let current = self
            .store
            .find_available_unit_ids(product_id, variant_id)
            .await?;
        let desired = desired as usize;
        let mut outcome = ResizeOutcome::default();

        if current.len() < desired {
            let units: Vec<_> = (current.len()..desired)
                .map(|_| InventoryUnit::available(product_id, variant_id))
                .collect();
            outcome.added = units.len() as u32;
            self.store.insert_units(units).await?;
        } else if current.len() > desired {
            let excess = &current[..current.len() - desired];
            outcome.removed = self.store.delete_available(excess).await? as u32;
        }

        tracing::info!(
            %product_id,
            %variant_id,
            added = outcome.added,
            removed = outcome.removed,
            "Resized variant stock"
        );
        Ok(outcome)
    }

    /// Deletes the units reserved by a delivered order.
    #[tracing::instrument(skip(self))]
    pub async fn consume_units(&self, order_id: OrderId) -> Result<u64> {
        Ok(self.store.delete_reserved_by_order(order_id).await?)
    }

    /// Deletes all Available units of an archived product.
    #[tracing::instrument(skip(self))]
    pub async fn remove_product_stock(&self, product_id: ProductId) -> Result<u64> {
        Ok(self.store.delete_available_for_product(product_id).await?)
    }

    /// Returns the Available count of one variant.
    pub async fn available_count(&self, variant_id: VariantId) -> Result<u64> {
        let counts = self.store.count_available(&[variant_id]).await?;
        Ok(counts.get(&variant_id).copied().unwrap_or(0))
    }

    /// Returns an entry for every requested variant, zero when none is Available.
    pub async fn available_counts(
        &self,
        variant_ids: &[VariantId],
    ) -> Result<HashMap<VariantId, u64>> {
        let mut counts = self.store.count_available(variant_ids).await?;
        for id in variant_ids {
            counts.entry(*id).or_insert(0);
        }
        Ok(counts)
    }

    /// Returns the Available count of every variant that has stock.
    pub async fn all_available_counts(&self) -> Result<HashMap<VariantId, u64>> {
        Ok(self.store.count_all_available().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::InMemoryStore;

    async fn ledger_with_stock(count: u32) -> (InventoryLedger<InMemoryStore>, ProductId, VariantId) {
        let ledger = InventoryLedger::new(InMemoryStore::new());
        let (product, variant) = (ProductId::new(), VariantId::new());
        ledger.resize(product, variant, count).await.unwrap();
        (ledger, product, variant)
    }

    #[tokio::test]
    async fn test_reserve_zero_units_succeeds() {
        let ledger = InventoryLedger::new(InMemoryStore::new());
        let reserved = ledger
            .reserve_units(VariantId::new(), 0, OrderId::new())
            .await
            .unwrap();
        assert!(reserved);
    }

    #[tokio::test]
    async fn test_reserve_takes_exact_count() {
        let (ledger, _, variant) = ledger_with_stock(5).await;
        let order_id = OrderId::new();

        assert!(ledger.reserve_units(variant, 3, order_id).await.unwrap());
        assert_eq!(ledger.available_count(variant).await.unwrap(), 2);
        assert_eq!(ledger.store().units_for_order(order_id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_reserve_fails_when_supply_short() {
        let (ledger, _, variant) = ledger_with_stock(2).await;
        let order_id = OrderId::new();

        assert!(!ledger.reserve_units(variant, 3, order_id).await.unwrap());
        // Nothing was taken in the failed round.
        assert_eq!(ledger.available_count(variant).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let (ledger, _, variant) = ledger_with_stock(2).await;
        let order_id = OrderId::new();
        ledger.reserve_units(variant, 2, order_id).await.unwrap();

        assert_eq!(ledger.release_units(order_id).await.unwrap(), 2);
        assert_eq!(ledger.release_units(order_id).await.unwrap(), 0);
        assert_eq!(ledger.available_count(variant).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_resize_up_and_down() {
        let (ledger, product, variant) = ledger_with_stock(4).await;

        let outcome = ledger.resize(product, variant, 6).await.unwrap();
        assert_eq!(outcome, ResizeOutcome { added: 2, removed: 0 });

        let outcome = ledger.resize(product, variant, 1).await.unwrap();
        assert_eq!(outcome, ResizeOutcome { added: 0, removed: 5 });
        assert_eq!(ledger.available_count(variant).await.unwrap(), 1);

        let outcome = ledger.resize(product, variant, 1).await.unwrap();
        assert_eq!(outcome, ResizeOutcome::default());
    }

    #[tokio::test]
    async fn test_resize_never_touches_reserved_units() {
        let (ledger, product, variant) = ledger_with_stock(3).await;
        let order_id = OrderId::new();
        ledger.reserve_units(variant, 2, order_id).await.unwrap();

        let outcome = ledger.resize(product, variant, 0).await.unwrap();
        assert_eq!(outcome.removed, 1);
        assert_eq!(ledger.store().units_for_order(order_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_resize_above_cap_is_rejected() {
        let ledger = InventoryLedger::new(InMemoryStore::new());
        let result = ledger
            .resize(ProductId::new(), VariantId::new(), MAX_UNITS_PER_VARIANT + 1)
            .await;
        assert!(matches!(
            result,
            Err(DomainError::StockLimitExceeded { requested: 1001, limit: 1000 })
        ));
    }

    #[tokio::test]
    async fn test_available_counts_fill_missing_with_zero() {
        let (ledger, _, variant) = ledger_with_stock(2).await;
        let missing = VariantId::new();

        let counts = ledger.available_counts(&[variant, missing]).await.unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[&variant], 2);
        assert_eq!(counts[&missing], 0);

        let all = ledger.all_available_counts().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_consume_and_remove_product_stock() {
        let (ledger, product, variant) = ledger_with_stock(3).await;
        let order_id = OrderId::new();
        ledger.reserve_units(variant, 1, order_id).await.unwrap();

        assert_eq!(ledger.remove_product_stock(product).await.unwrap(), 2);
        assert_eq!(ledger.consume_units(order_id).await.unwrap(), 1);
        assert!(ledger.store().units_for_order(order_id).await.unwrap().is_empty());
    }
}
