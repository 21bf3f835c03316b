//! REST endpoint handlers organized by workflow stage.

pub mod agents;
pub mod intake;
pub mod orchestrator;
pub mod reads;
pub mod review;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all workflow routes mounted under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(intake::routes())
        .merge(agents::routes())
        .merge(orchestrator::routes())
        .merge(review::routes())
        .merge(reads::routes())
}
