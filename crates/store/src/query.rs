use chrono::{DateTime, Utc};

use common::{OrderStatus, UserId};

/// Builder for order id lookups.
///
/// Used by the reaper to page through orders stuck in a status. Results are
/// ordered by creation time, oldest first.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    /// Filter by current status.
    pub status: Option<OrderStatus>,

    /// Filter by owning user.
    pub user_id: Option<UserId>,

    /// Orders created strictly before this instant.
    pub created_before: Option<DateTime<Utc>>,

    /// Orders whose reservation deadline is strictly before this instant.
    pub reserved_until_before: Option<DateTime<Utc>>,

    /// Maximum number of ids to return.
    pub limit: Option<usize>,
}

impl OrderQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for orders in a specific status.
    pub fn in_status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Filters by owning user.
    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Filters by creation time (exclusive upper bound).
    pub fn created_before(mut self, at: DateTime<Utc>) -> Self {
        self.created_before = Some(at);
        self
    }

    /// Filters by reservation deadline (exclusive upper bound).
    pub fn reserved_until_before(mut self, at: DateTime<Utc>) -> Self {
        self.reserved_until_before = Some(at);
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true if the given order fields satisfy every filter.
    pub fn matches(
        &self,
        status: OrderStatus,
        user_id: UserId,
        created_at: DateTime<Utc>,
        reserved_until: DateTime<Utc>,
    ) -> bool {
        if let Some(expected) = self.status
            && status != expected
        {
            return false;
        }
        if let Some(expected) = self.user_id
            && user_id != expected
        {
            return false;
        }
        if let Some(bound) = self.created_before
            && created_at >= bound
        {
            return false;
        }
        if let Some(bound) = self.reserved_until_before
            && reserved_until >= bound
        {
            return false;
        }
        true
    }
}
