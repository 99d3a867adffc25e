//! Manager notification for orders waiting on approval.

use std::sync::Arc;

use async_trait::async_trait;
use common::{Order, OrderId};
use tokio::sync::RwLock;

use crate::error::CheckoutError;

/// Tells managers that a cash-on-pickup order needs approval.
#[async_trait]
pub trait ApprovalNotifier: Send + Sync {
    async fn order_awaiting_approval(&self, order: &Order) -> Result<(), CheckoutError>;
}

/// Notifier that only writes a log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl ApprovalNotifier for LogNotifier {
    async fn order_awaiting_approval(&self, order: &Order) -> Result<(), CheckoutError> {
        tracing::info!(
            order_id = %order.id,
            order_number = %order.human_readable_id,
            total = %order.total,
            "Order awaiting approval"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    notified: Vec<OrderId>,
    fail_on_notify: bool,
}

/// In-memory notifier for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<RwLock<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    /// Creates a new in-memory notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the notifier to fail on every call.
    pub async fn set_fail_on_notify(&self, fail: bool) {
        self.state.write().await.fail_on_notify = fail;
    }

    /// Returns the ids of orders notified so far.
    pub async fn notified(&self) -> Vec<OrderId> {
        self.state.read().await.notified.clone()
    }
}

#[async_trait]
impl ApprovalNotifier for InMemoryNotifier {
    async fn order_awaiting_approval(&self, order: &Order) -> Result<(), CheckoutError> {
        let mut state = self.state.write().await;

        if state.fail_on_notify {
            return Err(CheckoutError::Notification(
                "Notification channel unavailable".to_string(),
            ));
        }

        state.notified.push(order.id);
        Ok(())
    }
}
