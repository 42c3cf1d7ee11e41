pub mod cron;
pub mod health;
pub mod limits;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(cron::router())
        .merge(limits::router())
        .with_state(state)
}
