// src/web/handlers/system_handlers.rs
use rocket::serde::json::Json;
use rocket::State;

use crate::app_log;
use crate::session::SessionState;
use crate::web::types::*;

pub async fn health_handler() -> Json<TextResponse> {
    app_log!(debug, "Health check");
    Json(TextResponse::success("CV builder is running".to_string()))
}

pub async fn state_handler(state: &State<AppState>) -> Json<DataResponse<SessionState>> {
    let snapshot = state.session.lock().await.state();
    Json(DataResponse::success("Session state".to_string(), snapshot))
}
