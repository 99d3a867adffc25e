//! Shared state handed to every handler.

use checkout::{LogNotifier, ReservationCoordinator, ReservationPolicy};
use domain::{FlatRatePricing, InventoryLedger, OrderLifecycle};
use store::Store;

/// Coordinator type served over HTTP.
pub type HttpCoordinator<S> = ReservationCoordinator<S, LogNotifier, FlatRatePricing>;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub coordinator: HttpCoordinator<S>,
    pub lifecycle: OrderLifecycle<S>,
    pub ledger: InventoryLedger<S>,
}

impl<S: Store> AppState<S> {
    /// Builds the services over one store.
    pub fn new(store: S, policy: ReservationPolicy) -> Self {
        Self {
            coordinator: ReservationCoordinator::new(
                store.clone(),
                LogNotifier,
                FlatRatePricing::default(),
                policy,
            ),
            lifecycle: OrderLifecycle::new(store.clone()),
            ledger: InventoryLedger::new(store),
        }
    }
}
