// src/web/types.rs

use rocket::form::FromForm;
use rocket::fs::TempFile;
use rocket::http::{ContentType, Status};
use rocket::response::status::Custom;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::{Request, Response};
use tokio::sync::Mutex;

use crate::ai_fill::AiFillAdapter;
use crate::editor::Key;
use crate::export::Exporter;
use crate::session::CvSession;
use crate::types::Theme;

/// Everything the routes share. The session lock is never held across an
/// AI call or a rasterization.
pub struct AppState {
    pub session: Mutex<CvSession>,
    /// `None` when no API key is configured
    pub ai: Option<AiFillAdapter>,
    pub exporter: Exporter,
}

impl AppState {
    pub fn new(session: CvSession, ai: Option<AiFillAdapter>, exporter: Exporter) -> Self {
        Self {
            session: Mutex::new(session),
            ai,
            exporter,
        }
    }
}

pub struct PdfResponse {
    pub data: Vec<u8>,
    pub filename: Option<String>,
}

impl PdfResponse {
    pub fn with_filename(data: Vec<u8>, filename: String) -> Self {
        Self {
            data,
            filename: Some(filename),
        }
    }
}

impl<'r> Responder<'r, 'static> for PdfResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let mut binding = Response::build();
        let mut response = binding
            .header(ContentType::PDF)
            .sized_body(self.data.len(), std::io::Cursor::new(self.data));

        if let Some(filename) = self.filename {
            response = response.raw_header(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", filename),
            );
        }

        response.ok()
    }
}

// ===== Requests =====

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct ThemeRequest {
    pub theme: Theme,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct TagInputRequest {
    pub value: String,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct TagKeyRequest {
    pub key: Key,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(FromForm)]
pub struct PhotoUploadForm<'f> {
    pub photo: TempFile<'f>,
}

// ===== Responses =====

#[derive(Serialize)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum ResponseType {
    Text,
    Data,
    Action,
    Error,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct TextResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DataResponse<T> {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub data: T,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActionResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub action: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardErrorResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub suggestions: Vec<String>,
}

/// Result of a form update
#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct UpdateResult {
    pub changed: bool,
}

pub type ApiError = Custom<Json<StandardErrorResponse>>;

impl TextResponse {
    pub fn success(message: String) -> Self {
        Self {
            response_type: ResponseType::Text,
            success: true,
            message,
        }
    }
}

impl<T> DataResponse<T> {
    pub fn success(message: String, data: T) -> Self {
        Self {
            response_type: ResponseType::Data,
            success: true,
            message,
            data,
        }
    }
}

impl ActionResponse {
    pub fn success(message: String, action: String) -> Self {
        Self {
            response_type: ResponseType::Action,
            success: true,
            message,
            action,
        }
    }
}

impl StandardErrorResponse {
    pub fn new(error: String, error_code: String, suggestions: Vec<String>) -> Self {
        Self {
            response_type: ResponseType::Error,
            success: false,
            error,
            error_code,
            suggestions,
        }
    }

    /// Wrap in a JSON body with the given HTTP status
    pub fn with_status(self, status: Status) -> ApiError {
        Custom(status, Json(self))
    }
}
