//! Reservation deadlines per payment type.

use chrono::{DateTime, Duration, Utc};
use common::{OrderStatus, PaymentType};

/// How long reserved units are held while an order waits.
///
/// Cash-on-pickup orders wait for a manager, online payments for the
/// payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationPolicy {
    pub cash_hold: Duration,
    pub online_hold: Duration,
}

impl ReservationPolicy {
    pub fn new(cash_hold: Duration, online_hold: Duration) -> Self {
        Self {
            cash_hold,
            online_hold,
        }
    }

    /// Returns the reservation deadline for an order created at `now`.
    pub fn reserved_until(&self, payment_type: PaymentType, now: DateTime<Utc>) -> DateTime<Utc> {
        if payment_type.is_cash_on_pickup() {
            now + self.cash_hold
        } else {
            now + self.online_hold
        }
    }

    /// Returns the status an order enters once its units are reserved.
    pub fn waiting_status(&self, payment_type: PaymentType) -> OrderStatus {
        if payment_type.is_cash_on_pickup() {
            OrderStatus::WaitingApprove
        } else {
            OrderStatus::WaitingPayment
        }
    }
}

impl Default for ReservationPolicy {
    fn default() -> Self {
        Self::new(Duration::hours(24), Duration::hours(2))
    }
}
