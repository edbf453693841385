//! REST API endpoint handlers.
//!
//! These complement the WebSocket channel for request/response use: the
//! initial state load and intents whose outcome the caller wants as a status
//! code.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use crate::intent::{self, AppState, ControlAction, Rejection};

impl Rejection {
    pub fn status_code(self) -> StatusCode {
        match self {
            Rejection::InvalidInput => StatusCode::UNPROCESSABLE_ENTITY,
            Rejection::DisclaimerPending => StatusCode::LOCKED,
            Rejection::NoSession | Rejection::Busy => StatusCode::CONFLICT,
            Rejection::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// GET /api/state — Full state snapshot.
pub async fn get_state(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(app.snapshot().to_json())
}

/// Request body for POST /api/lookup.
#[derive(Deserialize)]
pub struct LookupRequest {
    pub handle: String,
}

/// POST /api/lookup — Start a lookup.
///
/// Returns 202 once the lookup is running, 422 if the handle is invalid,
/// 423 while the disclaimer is not accepted, 503 if the driver is gone.
pub async fn post_lookup(
    State(app): State<AppState>,
    Json(body): Json<LookupRequest>,
) -> StatusCode {
    match intent::submit_lookup(&app, &body.handle) {
        Ok(()) => StatusCode::ACCEPTED,
        Err(rejection) => rejection.status_code(),
    }
}

/// Request body for POST /api/chat.
#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// POST /api/chat — Send a chat message about the revealed persona.
///
/// Returns 204 when forwarded, 409 if no chat session is active or the
/// previous reply is still pending, 422 for a blank message, 503 if the
/// driver is not consuming messages.
pub async fn post_chat(State(app): State<AppState>, Json(body): Json<ChatRequest>) -> StatusCode {
    match intent::submit_chat(&app, body.message) {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(rejection) => rejection.status_code(),
    }
}

/// Request body for POST /api/control.
#[derive(Deserialize)]
pub struct ControlRequest {
    pub action: ControlAction,
}

/// POST /api/control — Reset, accept the disclaimer, or switch language.
pub async fn post_control(
    State(app): State<AppState>,
    Json(body): Json<ControlRequest>,
) -> StatusCode {
    intent::apply_control(&app, body.action);
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use neon_trace::i18n::Language;

    #[test]
    fn control_request_deserializes() {
        let req: ControlRequest =
            serde_json::from_str(r#"{"action":"accept_disclaimer"}"#).unwrap();
        assert!(matches!(req.action, ControlAction::AcceptDisclaimer));
        let req: ControlRequest =
            serde_json::from_str(r#"{"action":{"set_language":"RU"}}"#).unwrap();
        assert!(matches!(req.action, ControlAction::SetLanguage(Language::Ru)));
    }

    #[test]
    fn rejections_map_to_status_codes() {
        assert_eq!(Rejection::InvalidInput.status_code(), 422);
        assert_eq!(Rejection::DisclaimerPending.status_code(), 423);
        assert_eq!(Rejection::NoSession.status_code(), 409);
        assert_eq!(Rejection::Busy.status_code(), 409);
        assert_eq!(Rejection::Unavailable.status_code(), 503);
    }
}
