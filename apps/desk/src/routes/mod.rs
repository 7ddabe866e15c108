pub mod events;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Bridge-agnostic entry point
        .route("/api/v1/events", post(events::handle_event))
        .route("/telegram/webhook", post(events::handle_telegram))
        .with_state(state)
}
