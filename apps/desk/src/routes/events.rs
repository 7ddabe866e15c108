use axum::{extract::State, http::StatusCode, Json};
use tracing::{debug, error, warn};

use crate::errors::AppError;
use crate::state::AppState;
use crate::transport::telegram::Update;
use crate::transport::{ChatEvent, Reply};

/// POST /api/v1/events
/// Runs one chat event through the desk and returns the replies in order.
pub async fn handle_event(
    State(state): State<AppState>,
    Json(event): Json<ChatEvent>,
) -> Result<Json<Vec<Reply>>, AppError> {
    Ok(Json(state.desk.handle(event).await))
}

/// POST /telegram/webhook
/// Always answers 200 so Telegram does not redeliver the update; delivery
/// failures are logged.
pub async fn handle_telegram(
    State(state): State<AppState>,
    Json(update): Json<Update>,
) -> StatusCode {
    let update_id = update.update_id;
    let Some((event, receipt)) = update.into_event() else {
        debug!(update_id, "update without a chat event ignored");
        return StatusCode::OK;
    };

    if let Some(receipt) = receipt {
        if let Err(e) = state.transport.acknowledge(&receipt).await {
            warn!(update_id, "failed to acknowledge callback: {e}");
        }
    }

    let user_id = event.user_id;
    for reply in state.desk.handle(event).await {
        if let Err(e) = state.transport.send(user_id, &reply).await {
            error!(update_id, user_id, "failed to deliver reply: {e}");
            break;
        }
    }
    StatusCode::OK
}
