//! Cart to order conversion with unit reservation.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use common::{Cart, CheckoutParameters, Order, OrderId, OrderItem, OrderStatus};
use domain::{InventoryLedger, OrderLifecycle, PriceCalculator};
use store::Store;

use crate::error::{CheckoutError, Result};
use crate::policy::ReservationPolicy;
use crate::services::ApprovalNotifier;

/// Result of a checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// The order was created and its units reserved.
    Created(OrderId),
    /// Some line could not be reserved; nothing is left behind.
    InsufficientInventory,
}

impl CheckoutOutcome {
    /// Returns the created order id, if any.
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            CheckoutOutcome::Created(id) => Some(*id),
            CheckoutOutcome::InsufficientInventory => None,
        }
    }
}

/// Creates orders from carts.
///
/// The order document is written first in `Creating` so that every unit the
/// coordinator reserves is bound to an order the reaper can find. If the
/// process dies mid-way the order stays in `Creating` and is swept later.
pub struct ReservationCoordinator<S, N, P>
where
    S: Store,
    N: ApprovalNotifier + 'static,
    P: PriceCalculator,
{
    store: S,
    lifecycle: OrderLifecycle<S>,
    notifier: Arc<N>,
    pricing: P,
    policy: ReservationPolicy,
}

impl<S, N, P> ReservationCoordinator<S, N, P>
where
    S: Store,
    N: ApprovalNotifier + 'static,
    P: PriceCalculator,
{
    /// Creates a new coordinator.
    pub fn new(store: S, notifier: N, pricing: P, policy: ReservationPolicy) -> Self {
        let lifecycle = OrderLifecycle::new(store.clone());
        Self {
            store,
            lifecycle,
            notifier: Arc::new(notifier),
            pricing,
            policy,
        }
    }

    /// Returns the lifecycle used for the initial transition.
    pub fn lifecycle(&self) -> &OrderLifecycle<S> {
        &self.lifecycle
    }

    fn ledger(&self) -> &InventoryLedger<S> {
        self.lifecycle.ledger()
    }

    /// Converts a cart into an order, reserving a unit for every counted item.
    ///
    /// The manager notification for cash orders runs on its own task; the
    /// order is returned without waiting for it and stays put if it fails.
    #[tracing::instrument(skip(self, cart), fields(user_id = %cart.user_id))]
    pub async fn create_order_from_cart(
        &self,
        cart: &Cart,
        params: CheckoutParameters,
    ) -> Result<CheckoutOutcome> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let started = Instant::now();

        let now = Utc::now();
        let payment_type = params.payment_type;
        let quote = self.pricing.quote(cart, &params)?;
        let order = Order {
            id: OrderId::new(),
            human_readable_id: Order::order_number(now),
            user_id: cart.user_id,
            items: cart.items.iter().map(OrderItem::from).collect(),
            status: OrderStatus::Creating,
            created_at: now,
            reserved_until: self.policy.reserved_until(payment_type, now),
            total: quote.total,
            delivery_price: quote.delivery_price,
            checkout_parameters: params,
        };
        let order_id = order.id;
        self.store.insert_order(order.clone()).await?;

        for item in cart.items.iter().filter(|item| item.tracks_inventory) {
            let reserved = self
                .ledger()
                .reserve_units(item.variant_id, item.count, order_id)
                .await?;
            if !reserved {
                self.ledger().release_units(order_id).await?;
                self.store
                    .delete_if_status(order_id, OrderStatus::Creating)
                    .await?;
                tracing::info!(%order_id, variant_id = %item.variant_id, "Checkout failed, not enough stock");
                return Ok(self.insufficient(started));
            }
        }

        let waiting = self.policy.waiting_status(payment_type);
        let moved = self
            .lifecycle
            .transition(order_id, OrderStatus::Creating, waiting)
            .await?;
        if !moved {
            // Reaped while reserving; the order is already Deleted.
            self.ledger().release_units(order_id).await?;
            tracing::warn!(%order_id, "Order was reaped during checkout");
            return Ok(self.insufficient(started));
        }

        if waiting == OrderStatus::WaitingApprove {
            let order = Order {
                status: waiting,
                ..order
            };
            let notifier = Arc::clone(&self.notifier);
            tokio::spawn(async move {
                if let Err(e) = notifier.order_awaiting_approval(&order).await {
                    tracing::warn!(%order_id, error = %e, "Failed to notify managers");
                }
            });
        }

        metrics::counter!("checkout_orders_created_total").increment(1);
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(%order_id, status = %waiting, "Order created");

        Ok(CheckoutOutcome::Created(order_id))
    }

    fn insufficient(&self, started: Instant) -> CheckoutOutcome {
        metrics::counter!("checkout_insufficient_inventory_total").increment(1);
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        CheckoutOutcome::InsufficientInventory
    }
}
