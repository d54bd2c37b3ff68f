// src/web/handlers/export_handlers.rs
use rocket::http::Status;
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::State;

use crate::app_log;
use crate::preview::{html, PreviewLayout};
use crate::web::types::*;

pub async fn preview_page_handler(state: &State<AppState>) -> Result<RawHtml<String>, ApiError> {
    let layout = state.session.lock().await.layout();
    html::render_page(&layout).map(RawHtml).map_err(|e| {
        app_log!(error, "Failed to render preview: {:#}", e);
        StandardErrorResponse::new(
            "Failed to render preview".to_string(),
            "PREVIEW_ERROR".to_string(),
            vec!["Try again in a few moments".to_string()],
        )
        .with_status(Status::InternalServerError)
    })
}

pub async fn preview_layout_handler(state: &State<AppState>) -> Json<DataResponse<PreviewLayout>> {
    let layout = state.session.lock().await.layout();
    Json(DataResponse::success("Current preview layout".to_string(), layout))
}

pub async fn export_handler(state: &State<AppState>) -> Result<PdfResponse, ApiError> {
    let (layout, full_name) = {
        let mut session = state.session.lock().await;
        session.clear_export_error();
        (session.layout(), session.document().full_name.clone())
    };

    match state.exporter.export(&layout, &full_name).await {
        Ok(exported) => Ok(PdfResponse::with_filename(
            exported.bytes,
            exported.filename,
        )),
        Err(e) => {
            state.session.lock().await.record_export_failure(&e);
            Err(StandardErrorResponse::new(
                e.user_message().to_string(),
                e.code().to_string(),
                vec![
                    "Try again in a few moments".to_string(),
                    "Check that the typst binary is installed".to_string(),
                ],
            )
            .with_status(Status::InternalServerError))
        }
    }
}
