//! Shared application state for the Axum API server.

use std::sync::Arc;

use slotwise_common::config::AppConfig;
use slotwise_engine::{ReminderBatchJob, ResourceLimitGuard};

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub reminders: Arc<ReminderBatchJob>,
    pub limits: Arc<ResourceLimitGuard>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        reminders: Arc<ReminderBatchJob>,
        limits: Arc<ResourceLimitGuard>,
    ) -> Self {
        Self {
            config,
            reminders,
            limits,
        }
    }
}
