//! Background reclamation of reserved inventory.
//!
//! Checkout never holds a lock, so anything it leaves behind is cleaned up
//! here:
//! - orders stuck in `Creating` after a crash or an abandoned checkout
//! - waiting orders whose reservation deadline has passed
//!
//! Both sweeps release the order's units and move it to `Deleted`.

pub mod error;
pub mod reaper;

pub use error::{ReaperError, Result};
pub use reaper::{MIN_INTERVAL, ReapReport, Reaper, ReaperConfig};
