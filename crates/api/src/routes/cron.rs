//! Scheduler trigger for the reminder batch.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use slotwise_common::error::AppError;
use slotwise_common::types::BatchResult;

use crate::middleware::auth::CronAuth;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/cron/reminders", post(run_reminders))
}

/// POST /api/cron/reminders — Run one reminder batch.
///
/// Per-appointment failures are reported in the body; only a failed
/// eligibility query turns into an error response.
async fn run_reminders(
    State(state): State<AppState>,
    _auth: CronAuth,
) -> Result<Json<BatchResult>, AppError> {
    let result = state.reminders.run().await?;
    Ok(Json(result))
}
