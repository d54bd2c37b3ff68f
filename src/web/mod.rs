// src/web/mod.rs

pub mod handlers;
pub mod types;

pub use handlers::*;
pub use types::*;

use anyhow::Result;
use rocket::data::{Limits, ToByteUnit};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::form::Form;
use rocket::http::{Header, Status};
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::{
    catchers, delete, get, options, post, put, routes, Build, Config, Request, Response,
    Rocket, State,
};
use std::sync::Arc;

use crate::ai_fill::AiFillAdapter;
use crate::app_log;
use crate::core::{ConfigManager, GeminiClient};
use crate::editor::Update;
use crate::export::Exporter;
use crate::preview::PreviewLayout;
use crate::session::{CvSession, SessionState};
use crate::types::CvDocument;
use crate::workspace::TypstRasterizer;

const PHOTO_UPLOAD_LIMIT_MIB: u64 = 10;

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PUT, DELETE, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new(
            "Access-Control-Expose-Headers",
            "Content-Disposition",
        ));
    }
}

// Live preview

#[get("/")]
pub async fn preview_page(state: &State<AppState>) -> Result<RawHtml<String>, ApiError> {
    handlers::preview_page_handler(state).await
}

// API routes

#[get("/health")]
pub async fn health() -> Json<TextResponse> {
    handlers::health_handler().await
}

#[get("/document")]
pub async fn get_document(state: &State<AppState>) -> Json<DataResponse<CvDocument>> {
    handlers::get_document_handler(state).await
}

#[put("/document", data = "<document>")]
pub async fn replace_document(
    document: Json<CvDocument>,
    state: &State<AppState>,
) -> Json<ActionResponse> {
    handlers::replace_document_handler(document, state).await
}

#[post("/update", data = "<update>")]
pub async fn apply_update(
    update: Json<Update>,
    state: &State<AppState>,
) -> Json<DataResponse<UpdateResult>> {
    handlers::apply_update_handler(update, state).await
}

#[put("/theme", data = "<request>")]
pub async fn set_theme(request: Json<ThemeRequest>, state: &State<AppState>) -> Json<ActionResponse> {
    handlers::set_theme_handler(request, state).await
}

#[post("/tags/<list>/input", data = "<request>")]
pub async fn set_tag_input(
    list: &str,
    request: Json<TagInputRequest>,
    state: &State<AppState>,
) -> Result<Json<ActionResponse>, ApiError> {
    handlers::set_tag_input_handler(list, request, state).await
}

#[post("/tags/<list>/submit")]
pub async fn submit_tag(
    list: &str,
    state: &State<AppState>,
) -> Result<Json<DataResponse<UpdateResult>>, ApiError> {
    handlers::submit_tag_handler(list, state).await
}

#[post("/tags/<list>/key", data = "<request>")]
pub async fn tag_key(
    list: &str,
    request: Json<TagKeyRequest>,
    state: &State<AppState>,
) -> Result<Json<DataResponse<UpdateResult>>, ApiError> {
    handlers::tag_key_handler(list, request, state).await
}

#[post("/photo", data = "<upload>")]
pub async fn upload_photo(
    upload: Form<PhotoUploadForm<'_>>,
    state: &State<AppState>,
) -> Result<Json<ActionResponse>, ApiError> {
    handlers::upload_photo_handler(upload, state).await
}

#[delete("/photo")]
pub async fn clear_photo(state: &State<AppState>) -> Json<ActionResponse> {
    handlers::clear_photo_handler(state).await
}

#[get("/state")]
pub async fn session_state(state: &State<AppState>) -> Json<DataResponse<SessionState>> {
    handlers::state_handler(state).await
}

#[post("/ai/open")]
pub async fn open_ai_modal(state: &State<AppState>) -> Json<ActionResponse> {
    handlers::open_ai_modal_handler(state).await
}

#[post("/ai/close")]
pub async fn close_ai_modal(state: &State<AppState>) -> Json<ActionResponse> {
    handlers::close_ai_modal_handler(state).await
}

#[post("/ai/generate", data = "<request>")]
pub async fn generate(
    request: Json<GenerateRequest>,
    state: &State<AppState>,
) -> Result<Json<DataResponse<CvDocument>>, ApiError> {
    handlers::generate_handler(request, state).await
}

#[get("/preview")]
pub async fn preview_layout(state: &State<AppState>) -> Json<DataResponse<PreviewLayout>> {
    handlers::preview_layout_handler(state).await
}

#[post("/export")]
pub async fn export(state: &State<AppState>) -> Result<PdfResponse, ApiError> {
    handlers::export_handler(state).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
    ))
}

#[rocket::catch(404)]
pub fn not_found(request: &Request) -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        format!("No route for {} {}", request.method(), request.uri()),
        "NOT_FOUND".to_string(),
        vec!["Check the endpoint path".to_string()],
    ))
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Request body does not match the expected shape".to_string(),
        "UNPROCESSABLE_ENTITY".to_string(),
        vec![
            "Check field names and value types".to_string(),
            "Themes are light, dark, orange or multi".to_string(),
        ],
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
        vec!["Try again in a few moments".to_string()],
    ))
}

/// Assemble the server around a prepared state
pub fn build_rocket(state: AppState) -> Rocket<Build> {
    let limits = Limits::default()
        .limit("file", PHOTO_UPLOAD_LIMIT_MIB.mebibytes())
        .limit("data-form", (PHOTO_UPLOAD_LIMIT_MIB + 1).mebibytes());
    let figment = Config::figment().merge(("limits", limits));

    rocket::custom(figment)
        .attach(Cors)
        .manage(state)
        .register(
            "/",
            catchers![bad_request, not_found, unprocessable, internal_error],
        )
        .mount("/", routes![preview_page])
        .mount(
            "/api",
            routes![
                health,
                get_document,
                replace_document,
                apply_update,
                set_theme,
                set_tag_input,
                submit_tag,
                tag_key,
                upload_photo,
                clear_photo,
                session_state,
                open_ai_modal,
                close_ai_modal,
                generate,
                preview_layout,
                export,
                options,
            ],
        )
}

// Main server start function
pub async fn start_web_server(config: ConfigManager, session: CvSession) -> Result<()> {
    config.ensure_directories().await?;

    let ai = if config.ai.api_key.is_some() {
        let client = GeminiClient::new(&config.ai)?;
        app_log!(info, "AI fill enabled with model {}", config.ai.model);
        Some(AiFillAdapter::new(Arc::new(client)))
    } else {
        app_log!(warn, "No API key configured, AI fill requests will fail");
        None
    };

    let exporter = Exporter::new(Arc::new(TypstRasterizer::from_config(&config.export)));
    app_log!(
        info,
        "Export workspace: {} (typst: {})",
        config.export.workspace_dir.display(),
        config.export.typst_bin
    );

    app_log!(info, "Starting CV builder server");
    let _rocket = build_rocket(AppState::new(session, ai, exporter))
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Server failed: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai_fill::tests::{StubGenerator, SAMPLE_RESPONSE};
    use crate::ai_fill::AI_FILL_FAILED_MESSAGE;
    use crate::export::tests::{png_of_size, StubRasterizer};
    use crate::export::EXPORT_FAILED_MESSAGE;
    use rocket::http::ContentType;
    use rocket::local::asynchronous::Client;
    use serde_json::{json, Value};

    async fn client_with(generator: Option<StubGenerator>, png: Option<Vec<u8>>) -> Client {
        let ai = generator.map(|g| AiFillAdapter::new(Arc::new(g)));
        let exporter = Exporter::new(Arc::new(StubRasterizer { png }));
        let state = AppState::new(CvSession::new(), ai, exporter);
        Client::tracked(build_rocket(state)).await.unwrap()
    }

    async fn client() -> Client {
        client_with(None, None).await
    }

    async fn get_json(client: &Client, uri: &str) -> Value {
        let response = client.get(uri.to_string()).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        response.into_json::<Value>().await.unwrap()
    }

    async fn post_json(client: &Client, uri: &str, body: Value) -> (Status, Value) {
        let response = client
            .post(uri.to_string())
            .header(ContentType::JSON)
            .body(body.to_string())
            .dispatch()
            .await;
        let status = response.status();
        (status, response.into_json::<Value>().await.unwrap())
    }

    #[rocket::async_test]
    async fn test_health() {
        let client = client().await;
        let body = get_json(&client, "/api/health").await;
        assert_eq!(body["type"], "text");
        assert_eq!(body["success"], true);
    }

    #[rocket::async_test]
    async fn test_update_is_reflected_in_document_and_preview() {
        let client = client().await;

        let (status, body) = post_json(
            &client,
            "/api/update",
            json!({"op": "set_text", "field": "full_name", "value": "Grace Hopper"}),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["data"]["changed"], true);

        let (_, body) = post_json(&client, "/api/update", json!({"op": "add_entry", "list": "experiences"})).await;
        assert_eq!(body["data"]["changed"], true);

        let (_, body) = post_json(
            &client,
            "/api/update",
            json!({"op": "remove_entry", "list": "experiences", "index": 5}),
        )
        .await;
        assert_eq!(body["data"]["changed"], false);

        let doc = get_json(&client, "/api/document").await;
        assert_eq!(doc["data"]["fullName"], "Grace Hopper");
        assert_eq!(doc["data"]["experiences"].as_array().unwrap().len(), 1);

        let page = client.get("/").dispatch().await;
        assert_eq!(page.status(), Status::Ok);
        assert_eq!(page.content_type(), Some(ContentType::HTML));
        let html = page.into_string().await.unwrap();
        assert!(html.contains("Grace Hopper"));
        assert!(html.contains("Your Professional Title"));
    }

    #[rocket::async_test]
    async fn test_replace_document() {
        let client = client().await;
        let response = client
            .put("/api/document")
            .header(ContentType::JSON)
            .body(r#"{"fullName": "Alan Turing", "skills": null}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let doc = get_json(&client, "/api/document").await;
        assert_eq!(doc["data"]["fullName"], "Alan Turing");
        assert_eq!(doc["data"]["skills"], json!([]));
    }

    #[rocket::async_test]
    async fn test_tag_box_enter_adds_and_clears() {
        let client = client().await;

        let (status, _) = post_json(&client, "/api/tags/skills/input", json!({"value": "  Rust  "})).await;
        assert_eq!(status, Status::Ok);
        let state = get_json(&client, "/api/state").await;
        assert_eq!(state["data"]["skill_input"], "  Rust  ");

        let (_, body) = post_json(&client, "/api/tags/skills/key", json!({"key": "Tab"})).await;
        assert_eq!(body["data"]["changed"], false);

        let (_, body) = post_json(&client, "/api/tags/skills/key", json!({"key": "Enter"})).await;
        assert_eq!(body["data"]["changed"], true);

        let doc = get_json(&client, "/api/document").await;
        assert_eq!(doc["data"]["skills"], json!(["Rust"]));
        let state = get_json(&client, "/api/state").await;
        assert_eq!(state["data"]["skill_input"], "");

        let response = client.post("/api/tags/languages/submit").dispatch().await;
        let body = response.into_json::<Value>().await.unwrap();
        assert_eq!(body["data"]["changed"], false);
    }

    #[rocket::async_test]
    async fn test_unknown_tag_list() {
        let client = client().await;
        let (status, body) = post_json(&client, "/api/tags/hobbies/input", json!({"value": "x"})).await;
        assert_eq!(status, Status::NotFound);
        assert_eq!(body["error_code"], "UNKNOWN_TAG_LIST");
        assert_eq!(body["success"], false);
    }

    #[rocket::async_test]
    async fn test_theme_change() {
        let client = client().await;
        let response = client
            .put("/api/theme")
            .header(ContentType::JSON)
            .body(r#"{"theme": "dark"}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let state = get_json(&client, "/api/state").await;
        assert_eq!(state["data"]["theme"], "dark");
        let layout = get_json(&client, "/api/preview").await;
        assert_eq!(layout["data"]["theme"], "dark");

        let response = client
            .put("/api/theme")
            .header(ContentType::JSON)
            .body(r#"{"theme": "neon"}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);
        let body = response.into_json::<Value>().await.unwrap();
        assert_eq!(body["error_code"], "UNPROCESSABLE_ENTITY");
    }

    #[rocket::async_test]
    async fn test_photo_upload_and_clear() {
        let client = client().await;
        let png = png_of_size(4, 4);

        let boundary = "cvbuilder-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"me.png\"\r\nContent-Type: image/png\r\n\r\n",
                b = boundary
            )
            .as_bytes(),
        );
        body.extend_from_slice(&png);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

        let response = client
            .post("/api/photo")
            .header(ContentType::new("multipart", "form-data").with_params(("boundary", boundary)))
            .body(body)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let state = get_json(&client, "/api/state").await;
        assert_eq!(state["data"]["has_photo"], true);
        let html = client.get("/").dispatch().await.into_string().await.unwrap();
        assert!(html.contains("<img src=\"data:image/png;base64,"));

        let response = client.delete("/api/photo").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let state = get_json(&client, "/api/state").await;
        assert_eq!(state["data"]["has_photo"], false);
    }

    #[rocket::async_test]
    async fn test_generate_replaces_document_and_closes_modal() {
        let client = client_with(Some(StubGenerator::ok(SAMPLE_RESPONSE)), None).await;
        client.post("/api/ai/open").dispatch().await;

        let (status, body) = post_json(
            &client,
            "/api/ai/generate",
            json!({"prompt": "Victorian mathematician"}),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["data"]["fullName"], "Ada Lovelace");
        assert_eq!(body["data"]["projects"], json!([]));

        let state = get_json(&client, "/api/state").await;
        assert_eq!(state["data"]["ai_modal_open"], false);
        assert_eq!(state["data"]["ai_loading"], false);
        assert_eq!(state["data"]["ai_error"], Value::Null);
    }

    #[rocket::async_test]
    async fn test_generate_failure_keeps_document() {
        let client = client_with(Some(StubGenerator::failing("quota exceeded")), None).await;
        post_json(
            &client,
            "/api/update",
            json!({"op": "set_text", "field": "full_name", "value": "Kept"}),
        )
        .await;
        client.post("/api/ai/open").dispatch().await;

        let (status, body) = post_json(&client, "/api/ai/generate", json!({"prompt": "anything"})).await;
        assert_eq!(status, Status::BadGateway);
        assert_eq!(body["error"], AI_FILL_FAILED_MESSAGE);
        assert_eq!(body["error_code"], "AI_SERVICE_ERROR");

        let state = get_json(&client, "/api/state").await;
        assert_eq!(state["data"]["ai_modal_open"], true);
        assert_eq!(state["data"]["ai_error"], AI_FILL_FAILED_MESSAGE);
        let doc = get_json(&client, "/api/document").await;
        assert_eq!(doc["data"]["fullName"], "Kept");
    }

    #[rocket::async_test]
    async fn test_generate_rejects_blank_prompt() {
        let client = client_with(Some(StubGenerator::ok(SAMPLE_RESPONSE)), None).await;
        let (status, body) = post_json(&client, "/api/ai/generate", json!({"prompt": "   "})).await;
        assert_eq!(status, Status::BadRequest);
        assert_eq!(body["error_code"], "EMPTY_PROMPT");

        let state = get_json(&client, "/api/state").await;
        assert_eq!(state["data"]["ai_loading"], false);
    }

    #[rocket::async_test]
    async fn test_generate_without_api_key() {
        let client = client().await;
        let (status, body) = post_json(&client, "/api/ai/generate", json!({"prompt": "Engineer"})).await;
        assert_eq!(status, Status::BadGateway);
        assert_eq!(body["error"], AI_FILL_FAILED_MESSAGE);
    }

    #[rocket::async_test]
    async fn test_export_returns_named_pdf() {
        let client = client_with(None, Some(png_of_size(20, 30))).await;
        post_json(
            &client,
            "/api/update",
            json!({"op": "set_text", "field": "full_name", "value": "Jane Q. Public"}),
        )
        .await;

        let response = client.post("/api/export").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.content_type(), Some(ContentType::PDF));
        assert_eq!(
            response.headers().get_one("Content-Disposition"),
            Some("attachment; filename=\"Jane_Q._Public.pdf\"")
        );
        let bytes = response.into_bytes().await.unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[rocket::async_test]
    async fn test_export_failure_sets_error() {
        let client = client().await;
        let response = client.post("/api/export").dispatch().await;
        assert_eq!(response.status(), Status::InternalServerError);
        let body = response.into_json::<Value>().await.unwrap();
        assert_eq!(body["error"], EXPORT_FAILED_MESSAGE);
        assert_eq!(body["error_code"], "EXPORT_RASTERIZE_FAILED");

        let state = get_json(&client, "/api/state").await;
        assert_eq!(state["data"]["export_error"], EXPORT_FAILED_MESSAGE);
    }

    #[rocket::async_test]
    async fn test_cors_headers_and_unknown_route() {
        let client = client().await;
        let response = client.get("/api/nothing-here").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
        assert_eq!(
            response.headers().get_one("Access-Control-Allow-Origin"),
            Some("*")
        );
        let body = response.into_json::<Value>().await.unwrap();
        assert_eq!(body["error_code"], "NOT_FOUND");
    }
}
