//! Policy-gated reminder and limit engine.

pub mod limits;
pub mod links;
pub mod reminder;
pub mod store;

pub use limits::{LimitDecision, ResourceKind, ResourceLimitGuard};
pub use reminder::{ReminderBatchJob, ReminderWindow};
pub use store::{BookingStore, PgStore};
