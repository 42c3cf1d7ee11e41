//! Resource limit checks.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use slotwise_common::error::AppError;
use slotwise_engine::{LimitDecision, ResourceKind};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/organizations/{id}/limits/{resource}",
        get(check_limit),
    )
}

/// GET /api/organizations/:id/limits/:resource — May the organization add one more?
async fn check_limit(
    State(state): State<AppState>,
    Path((organization_id, resource)): Path<(Uuid, String)>,
) -> Result<Json<LimitDecision>, AppError> {
    let resource: ResourceKind = resource.parse()?;
    let decision = state.limits.check(organization_id, resource).await?;
    Ok(Json(decision))
}
