use std::sync::Arc;

use crate::desk::Desk;
use crate::transport::ChatTransport;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub desk: Arc<Desk>,
    /// Where webhook replies are delivered. Telegram in production.
    pub transport: Arc<dyn ChatTransport>,
}
