//! Outbound collaborators of checkout.

pub mod notifier;

pub use notifier::{ApprovalNotifier, InMemoryNotifier, LogNotifier};
