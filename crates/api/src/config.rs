//! Application configuration loaded from environment variables.

use checkout::ReservationPolicy;
use reaper::ReaperConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL connection string (default: none, in-memory store)
/// - `REAPER_INTERVAL_SECS`: time between reaper cycles (default: `600`)
/// - `REAPER_STALE_CREATING_SECS`: age of an abandoned checkout (default: `300`)
/// - `REAPER_BATCH_SIZE`: orders fetched per page (default: `100`)
/// - `CASH_RESERVATION_HOURS`: hold for cash-on-pickup orders (default: `24`)
/// - `ONLINE_RESERVATION_HOURS`: hold for online payments (default: `2`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub reaper_interval_secs: u64,
    pub reaper_stale_creating_secs: i64,
    pub reaper_batch_size: usize,
    pub cash_reservation_hours: i64,
    pub online_reservation_hours: i64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            reaper_interval_secs: lookup("REAPER_INTERVAL_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.reaper_interval_secs),
            reaper_stale_creating_secs: lookup("REAPER_STALE_CREATING_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.reaper_stale_creating_secs),
            reaper_batch_size: lookup("REAPER_BATCH_SIZE")
                .and_then(|v| v.parse().ok())
                .filter(|size| *size > 0)
                .unwrap_or(defaults.reaper_batch_size),
            cash_reservation_hours: lookup("CASH_RESERVATION_HOURS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cash_reservation_hours),
            online_reservation_hours: lookup("ONLINE_RESERVATION_HOURS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.online_reservation_hours),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the reaper settings.
    pub fn reaper(&self) -> ReaperConfig {
        ReaperConfig {
            interval: std::time::Duration::from_secs(self.reaper_interval_secs),
            stale_creating_after: chrono::Duration::seconds(self.reaper_stale_creating_secs),
            batch_size: self.reaper_batch_size,
        }
    }

    /// Returns the reservation deadlines.
    pub fn reservation_policy(&self) -> ReservationPolicy {
        ReservationPolicy::new(
            chrono::Duration::hours(self.cash_reservation_hours),
            chrono::Duration::hours(self.online_reservation_hours),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            reaper_interval_secs: 600,
            reaper_stale_creating_secs: 300,
            reaper_batch_size: 100,
            cash_reservation_hours: 24,
            online_reservation_hours: 2,
        }
    }
}
