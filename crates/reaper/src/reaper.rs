//! Periodic sweeps over stale and expired orders.

use std::time::Instant;

use chrono::{DateTime, Utc};
use common::OrderStatus;
use domain::OrderLifecycle;
use store::{OrderQuery, Store};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::Result;

/// Shortest period the background loop will tick at.
pub const MIN_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);

/// Reaper settings.
#[derive(Debug, Clone, Copy)]
pub struct ReaperConfig {
    /// Time between cycle starts. Values below [`MIN_INTERVAL`] are raised to it.
    pub interval: std::time::Duration,

    /// Age after which an order still in `Creating` is considered abandoned.
    pub stale_creating_after: chrono::Duration,

    /// Number of order ids fetched per page.
    pub batch_size: usize,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval: std::time::Duration::from_secs(600),
            stale_creating_after: chrono::Duration::minutes(5),
            batch_size: 100,
        }
    }
}

/// What one cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReapReport {
    pub stale_creating: u64,
    pub expired_waiting_payment: u64,
    pub expired_waiting_approve: u64,
    /// Orders that moved on before the reaper could delete them.
    pub conflicts: u64,
}

impl ReapReport {
    /// Returns the number of orders moved to `Deleted`.
    pub fn reaped(&self) -> u64 {
        self.stale_creating + self.expired_waiting_payment + self.expired_waiting_approve
    }
}

#[derive(Default)]
struct SweepTally {
    reaped: u64,
    conflicts: u64,
}

/// Releases units held by abandoned or expired orders.
#[derive(Clone)]
pub struct Reaper<S: Store> {
    lifecycle: OrderLifecycle<S>,
    config: ReaperConfig,
}

impl<S: Store> Reaper<S> {
    /// Creates a new reaper over the given store.
    pub fn new(store: S, config: ReaperConfig) -> Self {
        Self {
            lifecycle: OrderLifecycle::new(store),
            config,
        }
    }

    /// Returns the reaper settings.
    pub fn config(&self) -> &ReaperConfig {
        &self.config
    }

    /// Runs one cycle at the current time.
    pub async fn run_cycle(&self) -> Result<ReapReport> {
        self.run_cycle_at(Utc::now()).await
    }

    /// Runs one cycle with `now` fixed for every sweep.
    #[tracing::instrument(skip(self))]
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> Result<ReapReport> {
        let started = Instant::now();
        let mut report = ReapReport::default();

        let stale = self
            .sweep(
                OrderQuery::in_status(OrderStatus::Creating)
                    .created_before(now - self.config.stale_creating_after),
                OrderStatus::Creating,
            )
            .await?;
        report.stale_creating = stale.reaped;
        report.conflicts += stale.conflicts;

        for status in [OrderStatus::WaitingPayment, OrderStatus::WaitingApprove] {
            let expired = self
                .sweep(
                    OrderQuery::in_status(status).reserved_until_before(now),
                    status,
                )
                .await?;
            match status {
                OrderStatus::WaitingPayment => report.expired_waiting_payment = expired.reaped,
                _ => report.expired_waiting_approve = expired.reaped,
            }
            report.conflicts += expired.conflicts;
        }

        metrics::counter!("reaper_cycles_total").increment(1);
        metrics::counter!("reaper_orders_reaped_total").increment(report.reaped());
        metrics::histogram!("reaper_cycle_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::info!(
            stale_creating = report.stale_creating,
            expired_waiting_payment = report.expired_waiting_payment,
            expired_waiting_approve = report.expired_waiting_approve,
            conflicts = report.conflicts,
            "Reaper cycle complete"
        );

        Ok(report)
    }

    /// Pages through orders matching `query` and deletes each one.
    ///
    /// Every handled order leaves `status`, so re-querying from the start
    /// returns the next page until nothing matches.
    async fn sweep(&self, query: OrderQuery, status: OrderStatus) -> Result<SweepTally> {
        let mut tally = SweepTally::default();

        loop {
            let ids = self
                .lifecycle
                .store()
                .find_ids(query.clone().limit(self.config.batch_size))
                .await?;
            if ids.is_empty() {
                break;
            }

            for order_id in ids {
                let deleted = self
                    .lifecycle
                    .change_status(order_id, status, OrderStatus::Deleted)
                    .await?;
                if deleted {
                    tally.reaped += 1;
                } else {
                    tracing::info!(%order_id, %status, "Order moved on before reaping, skipped");
                    tally.conflicts += 1;
                }
            }
        }

        Ok(tally)
    }

    /// Runs cycles on a fixed interval until `shutdown` changes.
    ///
    /// The first cycle starts immediately. Cycles run inline in the loop, so
    /// they never overlap; a slow cycle delays the next tick.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let period = self.config.interval.max(MIN_INTERVAL);
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(interval_secs = period.as_secs(), "Reaper started");

            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = self.run_cycle().await {
                            tracing::error!(error = %e, "Reaper cycle failed");
                        }
                    }
                }
            }

            tracing::info!("Reaper stopped");
        })
    }
}
