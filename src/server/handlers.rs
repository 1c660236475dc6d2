use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::info;

use super::ServerError;
use super::models::{HealthResponse, LanguagesResponse, TranslateApiRequest};
use super::state::ServerState;
use super::upload;
use crate::extraction::{self, ExtractionResult};
use crate::languages;
use crate::providers::{self, Gemini, Provider};
use crate::settings::Settings;
use crate::translation::{self, TranslationRequest, TranslationResult};

pub async fn run_server(settings: Settings, addr: String) -> Result<()> {
    let key = providers::resolve_key()?;
    let provider = Gemini::new(key).with_model(settings.model.clone());
    let state = Arc::new(ServerState { settings, provider });
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| "failed to bind server address")?;
    info!("listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn router<P: Provider + 'static>(state: Arc<ServerState<P>>) -> Router {
    let max_upload = state.settings.max_upload_bytes;
    Router::new()
        .route("/", get(index))
        .route("/api/extract", post(extract::<P>))
        .route("/api/translate", post(translate::<P>))
        .route("/api/translate-file", post(translate_file::<P>))
        .route("/api/languages", get(languages_list))
        .route("/api/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload))
        .with_state(state)
        .layer(axum::middleware::from_fn(cors_middleware))
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type,authorization"),
    );
}

async fn extract<P: Provider + 'static>(
    State(state): State<Arc<ServerState<P>>>,
    multipart: Multipart,
) -> Result<Json<ExtractionResult>, ServerError> {
    let upload = upload::receive_image(multipart, &state.settings).await?;
    let result = extraction::extract_prescription(
        &state.provider,
        upload.path(),
        &upload.filename,
        &state.settings,
    )
    .await;
    // The scratch copy goes away here whether the provider call succeeded
    // or not.
    drop(upload);
    Ok(Json(result))
}

async fn translate<P: Provider + 'static>(
    State(state): State<Arc<ServerState<P>>>,
    Json(payload): Json<TranslateApiRequest>,
) -> Result<Json<TranslationResult>, ServerError> {
    let text = required_field(payload.text, "text")?;
    let target_language = required_field(payload.target_language, "target_language")?;
    let result = translation::translate_text(
        &state.provider,
        TranslationRequest {
            text,
            target_language,
            context_info: payload.context_info,
        },
    )
    .await;
    Ok(Json(result))
}

async fn translate_file<P: Provider + 'static>(
    State(state): State<Arc<ServerState<P>>>,
    multipart: Multipart,
) -> Result<Json<TranslationResult>, ServerError> {
    let document = upload::receive_text_document(multipart).await?;
    let target_language = required_field(document.target_language, "target_language")?;
    let result = translation::translate_text(
        &state.provider,
        TranslationRequest {
            text: document.text,
            target_language,
            context_info: document.context_info,
        },
    )
    .await;
    Ok(Json(result))
}

async fn languages_list() -> Json<LanguagesResponse> {
    let languages = languages::names();
    let count = languages.len();
    Json(LanguagesResponse { languages, count })
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: crate::now_timestamp(),
    })
}

fn required_field(value: Option<String>, name: &str) -> Result<String, ServerError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ServerError::bad_request(format!("{} is required", name))),
    }
}
