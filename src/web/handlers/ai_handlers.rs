// src/web/handlers/ai_handlers.rs
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;

use crate::ai_fill::{AiFillError, AI_FILL_FAILED_MESSAGE};
use crate::app_log;
use crate::session::GenerationOutcome;
use crate::types::CvDocument;
use crate::web::types::*;

pub async fn open_ai_modal_handler(state: &State<AppState>) -> Json<ActionResponse> {
    state.session.lock().await.open_ai_modal();
    Json(ActionResponse::success(
        "AI modal opened".to_string(),
        "opened".to_string(),
    ))
}

pub async fn close_ai_modal_handler(state: &State<AppState>) -> Json<ActionResponse> {
    state.session.lock().await.close_ai_modal();
    Json(ActionResponse::success(
        "AI modal closed".to_string(),
        "closed".to_string(),
    ))
}

pub async fn generate_handler(
    request: Json<GenerateRequest>,
    state: &State<AppState>,
) -> Result<Json<DataResponse<CvDocument>>, ApiError> {
    let prompt = request.into_inner().prompt;
    if prompt.trim().is_empty() {
        return Err(StandardErrorResponse::new(
            "Prompt is empty".to_string(),
            "EMPTY_PROMPT".to_string(),
            vec!["Describe the role, e.g. 'Senior React Developer with 5 years in fintech'".to_string()],
        )
        .with_status(Status::BadRequest));
    }

    let ticket = match state.session.lock().await.begin_generation() {
        Some(ticket) => ticket,
        None => {
            return Err(StandardErrorResponse::new(
                "A generation is already running".to_string(),
                "GENERATION_IN_PROGRESS".to_string(),
                vec!["Wait for the current generation to finish".to_string()],
            )
            .with_status(Status::Conflict));
        }
    };

    // lock released while the service runs
    let result = match &state.ai {
        Some(ai) => ai.generate(&prompt).await,
        None => Err(AiFillError::Service(anyhow::anyhow!(
            "No API key configured: set GEMINI_API_KEY or API_KEY"
        ))),
    };
    let error_code = result.as_ref().err().map(AiFillError::code);

    let mut session = state.session.lock().await;
    match session.finish_generation(ticket, result) {
        GenerationOutcome::Applied => Ok(Json(DataResponse::success(
            "CV generated".to_string(),
            session.document().clone(),
        ))),
        GenerationOutcome::Failed => Err(StandardErrorResponse::new(
            AI_FILL_FAILED_MESSAGE.to_string(),
            error_code.unwrap_or("AI_SERVICE_ERROR").to_string(),
            vec![
                "Try again in a few moments".to_string(),
                "Rephrase the job description".to_string(),
            ],
        )
        .with_status(Status::BadGateway)),
        GenerationOutcome::Stale => {
            app_log!(info, "Generation finished after it was cancelled");
            Err(StandardErrorResponse::new(
                "Generation was cancelled".to_string(),
                "GENERATION_CANCELLED".to_string(),
                vec![],
            )
            .with_status(Status::Conflict))
        }
    }
}
