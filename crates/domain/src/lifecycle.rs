//! Order status transitions and their inventory side effects.

use common::{DeliveryType, Order, OrderId, OrderStatus, UserId};
use store::Store;

use crate::error::{DomainError, Result};
use crate::ledger::InventoryLedger;

/// Moves orders through the status graph.
///
/// Every status change is a conditional update on `status == from`. A `false`
/// result means another actor already moved the order; callers never retry.
#[derive(Clone)]
pub struct OrderLifecycle<S: Store> {
    store: S,
    ledger: InventoryLedger<S>,
}

impl<S: Store> OrderLifecycle<S> {
    /// Creates a new lifecycle over the given store.
    pub fn new(store: S) -> Self {
        Self {
            ledger: InventoryLedger::new(store.clone()),
            store,
        }
    }

    /// Returns the ledger used for side effects.
    pub fn ledger(&self) -> &InventoryLedger<S> {
        &self.ledger
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Sets the status to `to` if it is still `from`.
    ///
    /// Returns `true` iff this call changed the order.
    #[tracing::instrument(skip(self))]
    pub async fn transition(&self, order_id: OrderId, from: OrderStatus, to: OrderStatus) -> Result<bool> {
        ensure_edge(from, to)?;

        let changed = self.store.compare_and_set_status(order_id, from, to).await?;
        if changed {
            tracing::info!(%order_id, %from, %to, "Order status changed");
            metrics::counter!(
                "order_transitions_total",
                "from" => from.as_str(),
                "to" => to.as_str()
            )
            .increment(1);
        } else {
            tracing::warn!(%order_id, %from, %to, "Order status already changed by someone else");
            metrics::counter!("order_status_conflicts_total").increment(1);
        }
        Ok(changed)
    }

    /// Changes status and applies the paired inventory side effect.
    ///
    /// Moving to `Deleted` releases the order's units first, but only while the
    /// order is still in `from`. Moving to `Shipped` consumes them after the
    /// transition succeeds.
    #[tracing::instrument(skip(self))]
    pub async fn change_status(
        &self,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool> {
        ensure_edge(from, to)?;

        match to {
            OrderStatus::Deleted => {
                // A stale `from` must not free units of an order that moved on.
                let current = self.store.find_order(order_id).await?.map(|o| o.status);
                if current != Some(from) {
                    tracing::warn!(%order_id, %from, ?current, "Order not in expected status, nothing released");
                    metrics::counter!("order_status_conflicts_total").increment(1);
                    return Ok(false);
                }
                self.ledger.release_units(order_id).await?;
                self.transition(order_id, from, to).await
            }
            OrderStatus::Shipped => {
                let changed = self.transition(order_id, from, to).await?;
                if changed {
                    let consumed = self.ledger.consume_units(order_id).await?;
                    tracing::debug!(%order_id, consumed, "Consumed delivered units");
                }
                Ok(changed)
            }
            _ => self.transition(order_id, from, to).await,
        }
    }

    /// Records a successful payment for an order waiting on one.
    ///
    /// Mail orders go to packing; pickup orders are ready to hand over.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_payment(&self, order_id: OrderId) -> Result<bool> {
        let order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))?;

        let to = match order.checkout_parameters.delivery_type {
            DeliveryType::Mail => OrderStatus::Packing,
            DeliveryType::SelfPickup => OrderStatus::Shipping,
        };
        self.change_status(order_id, OrderStatus::WaitingPayment, to)
            .await
    }

    /// Approves a cash-on-pickup order.
    pub async fn approve(&self, order_id: OrderId) -> Result<bool> {
        self.change_status(order_id, OrderStatus::WaitingApprove, OrderStatus::Shipping)
            .await
    }

    /// Rejects an order and returns its units to stock.
    pub async fn reject(&self, order_id: OrderId, from: OrderStatus) -> Result<bool> {
        self.change_status(order_id, from, OrderStatus::Deleted).await
    }

    /// Loads an order by id.
    pub async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.store.find_order(order_id).await?)
    }

    /// Returns every order, newest first.
    pub async fn all_orders(&self) -> Result<Vec<Order>> {
        Ok(self.store.all_orders().await?)
    }

    /// Returns a user's orders, newest first.
    pub async fn user_orders(&self, user_id: UserId) -> Result<Vec<Order>> {
        Ok(self.store.orders_for_user(user_id).await?)
    }

    /// Returns the order only if it belongs to the user.
    pub async fn user_order(&self, user_id: UserId, order_id: OrderId) -> Result<Option<Order>> {
        let order = self.store.find_order(order_id).await?;
        Ok(order.filter(|o| o.user_id == user_id))
    }
}

fn ensure_edge(from: OrderStatus, to: OrderStatus) -> Result<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(DomainError::IllegalTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use common::{CheckoutParameters, Money, OrderItem, PaymentType, ProductId, VariantId};
    use store::{InMemoryStore, InventoryStore, OrderStore};

    async fn setup(
        status: OrderStatus,
        delivery: DeliveryType,
    ) -> (OrderLifecycle<InMemoryStore>, Order) {
        let lifecycle = OrderLifecycle::new(InMemoryStore::new());
        let (product, variant) = (ProductId::new(), VariantId::new());
        lifecycle.ledger().resize(product, variant, 3).await.unwrap();

        let now = Utc::now();
        let order = Order {
            id: OrderId::new(),
            human_readable_id: Order::order_number(now),
            user_id: UserId::new(),
            items: vec![OrderItem {
                product_id: product,
                variant_id: variant,
                count: 2,
                unit_price: Money::from_cents(700),
            }],
            status,
            created_at: now,
            reserved_until: now + Duration::hours(2),
            total: Money::from_cents(1400),
            delivery_price: None,
            checkout_parameters: CheckoutParameters::new(delivery, PaymentType::Card),
        };
        lifecycle.store().insert_order(order.clone()).await.unwrap();
        lifecycle
            .ledger()
            .reserve_units(variant, 2, order.id)
            .await
            .unwrap();
        (lifecycle, order)
    }

    async fn status_of(lifecycle: &OrderLifecycle<InMemoryStore>, id: OrderId) -> OrderStatus {
        lifecycle.find_order(id).await.unwrap().unwrap().status
    }

    #[tokio::test]
    async fn test_transition_rejects_illegal_edge() {
        let (lifecycle, order) = setup(OrderStatus::Creating, DeliveryType::Mail).await;

        let result = lifecycle
            .transition(order.id, OrderStatus::Creating, OrderStatus::Shipped)
            .await;
        assert!(matches!(
            result,
            Err(DomainError::IllegalTransition {
                from: OrderStatus::Creating,
                to: OrderStatus::Shipped
            })
        ));
        assert_eq!(status_of(&lifecycle, order.id).await, OrderStatus::Creating);
    }

    #[tokio::test]
    async fn test_transition_with_stale_from_is_a_no_op() {
        let (lifecycle, order) = setup(OrderStatus::WaitingPayment, DeliveryType::Mail).await;

        let changed = lifecycle
            .transition(order.id, OrderStatus::Creating, OrderStatus::WaitingPayment)
            .await
            .unwrap();
        assert!(!changed);
    }

    #[tokio::test]
    async fn test_delete_releases_units() {
        let (lifecycle, order) = setup(OrderStatus::WaitingPayment, DeliveryType::Mail).await;
        let variant = order.items[0].variant_id;

        assert!(lifecycle.reject(order.id, OrderStatus::WaitingPayment).await.unwrap());
        assert_eq!(status_of(&lifecycle, order.id).await, OrderStatus::Deleted);
        assert_eq!(lifecycle.ledger().available_count(variant).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_illegal_delete_does_not_release() {
        let (lifecycle, order) = setup(OrderStatus::Packing, DeliveryType::Mail).await;

        let result = lifecycle.reject(order.id, OrderStatus::Packing).await;
        assert!(matches!(result, Err(DomainError::IllegalTransition { .. })));
        let units = lifecycle.store().units_for_order(order.id).await.unwrap();
        assert_eq!(units.len(), 2);
    }

    #[tokio::test]
    async fn test_stale_reject_keeps_units_of_paid_order() {
        let (lifecycle, order) = setup(OrderStatus::WaitingPayment, DeliveryType::Mail).await;
        let variant = order.items[0].variant_id;
        assert!(lifecycle.confirm_payment(order.id).await.unwrap());

        let changed = lifecycle
            .reject(order.id, OrderStatus::WaitingPayment)
            .await
            .unwrap();

        assert!(!changed);
        assert_eq!(status_of(&lifecycle, order.id).await, OrderStatus::Packing);
        assert_eq!(lifecycle.store().units_for_order(order.id).await.unwrap().len(), 2);
        assert_eq!(lifecycle.ledger().available_count(variant).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_of_missing_order_is_a_no_op() {
        let lifecycle = OrderLifecycle::new(InMemoryStore::new());

        let changed = lifecycle
            .reject(OrderId::new(), OrderStatus::WaitingPayment)
            .await
            .unwrap();
        assert!(!changed);
    }

    #[tokio::test]
    async fn test_shipped_consumes_units() {
        let (lifecycle, order) = setup(OrderStatus::Shipping, DeliveryType::Mail).await;
        let variant = order.items[0].variant_id;

        assert!(
            lifecycle
                .change_status(order.id, OrderStatus::Shipping, OrderStatus::Shipped)
                .await
                .unwrap()
        );
        assert!(lifecycle.store().units_for_order(order.id).await.unwrap().is_empty());
        // Sold units are gone, the rest stay on sale.
        assert_eq!(lifecycle.ledger().available_count(variant).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_confirm_payment_routes_by_delivery() {
        let (lifecycle, mail) = setup(OrderStatus::WaitingPayment, DeliveryType::Mail).await;
        assert!(lifecycle.confirm_payment(mail.id).await.unwrap());
        assert_eq!(status_of(&lifecycle, mail.id).await, OrderStatus::Packing);

        let (lifecycle, pickup) = setup(OrderStatus::WaitingPayment, DeliveryType::SelfPickup).await;
        assert!(lifecycle.confirm_payment(pickup.id).await.unwrap());
        assert_eq!(status_of(&lifecycle, pickup.id).await, OrderStatus::Shipping);

        // A second notification finds the order already moved.
        assert!(!lifecycle.confirm_payment(pickup.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_confirm_payment_for_missing_order() {
        let lifecycle = OrderLifecycle::new(InMemoryStore::new());
        let id = OrderId::new();
        let result = lifecycle.confirm_payment(id).await;
        assert!(matches!(result, Err(DomainError::OrderNotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn test_approve_moves_to_shipping() {
        let (lifecycle, order) = setup(OrderStatus::WaitingApprove, DeliveryType::SelfPickup).await;
        assert!(lifecycle.approve(order.id).await.unwrap());
        assert_eq!(status_of(&lifecycle, order.id).await, OrderStatus::Shipping);
    }

    #[tokio::test]
    async fn test_user_order_checks_owner() {
        let (lifecycle, order) = setup(OrderStatus::Creating, DeliveryType::Mail).await;

        let found = lifecycle.user_order(order.user_id, order.id).await.unwrap();
        assert_eq!(found.map(|o| o.id), Some(order.id));
        assert!(
            lifecycle
                .user_order(UserId::new(), order.id)
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(lifecycle.user_orders(order.user_id).await.unwrap().len(), 1);
        assert_eq!(lifecycle.all_orders().await.unwrap().len(), 1);
    }
}
