//! HTTP surface for the reminder job and the resource limit guard.

pub mod jobs;
pub mod middleware;
pub mod routes;
pub mod state;
