// src/web/handlers/document_handlers.rs
use rocket::form::Form;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tokio::io::AsyncReadExt;

use crate::app_log;
use crate::editor::{TagList, Update};
use crate::types::{CvDocument, Photo};
use crate::utils::normalize_mime;
use crate::web::types::*;

pub async fn get_document_handler(state: &State<AppState>) -> Json<DataResponse<CvDocument>> {
    let session = state.session.lock().await;
    Json(DataResponse::success(
        "Current CV document".to_string(),
        session.document().clone(),
    ))
}

pub async fn replace_document_handler(
    document: Json<CvDocument>,
    state: &State<AppState>,
) -> Json<ActionResponse> {
    let mut session = state.session.lock().await;
    session.replace_document(document.into_inner());
    app_log!(info, "Document replaced");

    Json(ActionResponse::success(
        "CV document replaced".to_string(),
        "replaced".to_string(),
    ))
}

pub async fn apply_update_handler(
    update: Json<Update>,
    state: &State<AppState>,
) -> Json<DataResponse<UpdateResult>> {
    let update = update.into_inner();
    app_log!(debug, "Applying update: {:?}", update);

    let mut session = state.session.lock().await;
    let changed = session.apply(update);

    Json(DataResponse::success(
        if changed {
            "Update applied".to_string()
        } else {
            "Nothing to change".to_string()
        },
        UpdateResult { changed },
    ))
}

pub async fn set_theme_handler(
    request: Json<ThemeRequest>,
    state: &State<AppState>,
) -> Json<ActionResponse> {
    let theme = request.theme;
    state.session.lock().await.set_theme(theme);

    Json(ActionResponse::success(
        format!("Theme set to {}", theme),
        "theme_changed".to_string(),
    ))
}

fn parse_tag_list(list: &str) -> Result<TagList, ApiError> {
    list.parse::<TagList>().map_err(|e| {
        StandardErrorResponse::new(
            e.to_string(),
            "UNKNOWN_TAG_LIST".to_string(),
            vec!["Use 'skills' or 'languages'".to_string()],
        )
        .with_status(Status::NotFound)
    })
}

pub async fn set_tag_input_handler(
    list: &str,
    request: Json<TagInputRequest>,
    state: &State<AppState>,
) -> Result<Json<ActionResponse>, ApiError> {
    let list = parse_tag_list(list)?;
    state
        .session
        .lock()
        .await
        .set_tag_input(list, request.into_inner().value);

    Ok(Json(ActionResponse::success(
        format!("{} input updated", list.as_str()),
        "input_changed".to_string(),
    )))
}

pub async fn submit_tag_handler(
    list: &str,
    state: &State<AppState>,
) -> Result<Json<DataResponse<UpdateResult>>, ApiError> {
    let list = parse_tag_list(list)?;
    let changed = state.session.lock().await.submit_tag(list);

    Ok(Json(DataResponse::success(
        format!("{} submitted", list.as_str()),
        UpdateResult { changed },
    )))
}

pub async fn tag_key_handler(
    list: &str,
    request: Json<TagKeyRequest>,
    state: &State<AppState>,
) -> Result<Json<DataResponse<UpdateResult>>, ApiError> {
    let list = parse_tag_list(list)?;
    let changed = state.session.lock().await.tag_key(list, &request.key);

    Ok(Json(DataResponse::success(
        format!("{} key handled", list.as_str()),
        UpdateResult { changed },
    )))
}

pub async fn upload_photo_handler(
    upload: Form<PhotoUploadForm<'_>>,
    state: &State<AppState>,
) -> Result<Json<ActionResponse>, ApiError> {
    let declared = upload
        .photo
        .content_type()
        .map(|ct| normalize_mime(&ct.to_string()));

    let mut bytes = Vec::new();
    let read = match upload.photo.open().await {
        Ok(reader) => {
            tokio::pin!(reader);
            reader.read_to_end(&mut bytes).await
        }
        Err(e) => Err(e),
    };
    if let Err(e) = read {
        app_log!(error, "Failed to read uploaded photo: {}", e);
        return Err(StandardErrorResponse::new(
            "Failed to process uploaded file".to_string(),
            "UPLOAD_ERROR".to_string(),
            vec!["Please try uploading again".to_string()],
        )
        .with_status(Status::InternalServerError));
    }

    let photo = Photo::from_bytes(&bytes, declared.as_deref());
    app_log!(
        info,
        "Photo uploaded: {} bytes as {}",
        bytes.len(),
        photo.mime()
    );
    state.session.lock().await.set_photo(photo);

    Ok(Json(ActionResponse::success(
        "Profile photo updated".to_string(),
        "uploaded".to_string(),
    )))
}

pub async fn clear_photo_handler(state: &State<AppState>) -> Json<ActionResponse> {
    state.session.lock().await.clear_photo();
    Json(ActionResponse::success(
        "Profile photo removed".to_string(),
        "removed".to_string(),
    ))
}
