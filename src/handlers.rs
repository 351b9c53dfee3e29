use crate::config::Config;
use crate::extraction::ReceiptExtractor;
use crate::models::{ErrorResponse, ExtractionRecord, HealthResponse, RootResponse};

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, info_span, warn, Instrument, Level};
use uuid::Uuid;

const FILE_FIELD: &str = "file";

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Clone)]
pub struct AppState {
    pub extractor: ReceiptExtractor,
    pub project_name: Arc<str>,
}

impl AppState {
    pub fn new(extractor: ReceiptExtractor, project_name: &str) -> Self {
        Self {
            extractor,
            project_name: Arc::from(project_name),
        }
    }
}

pub fn build_router(config: &Config, state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route(&config.extract_route(), post(extract_receipt))
        .route("/health", get(health_check))
        .fallback(handle_404)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
}

fn bad_request(detail: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(detail)))
}

/// Accept one receipt image as multipart field `file` and return its fields.
///
/// Only non-image uploads are rejected; every failure after that point is
/// absorbed by the extractor and shows up as an all-null record.
pub async fn extract_receipt(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractionRecord>, ApiError> {
    let request_id = Uuid::new_v4();

    async move {
        let image = read_image_field(&mut multipart).await?;
        debug!("Received image upload: {} bytes", image.len());

        let record = state.extractor.extract(&image).await;
        Ok(Json(record))
    }
    .instrument(info_span!("extract", %request_id))
    .await
}

async fn read_image_field(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Invalid multipart body: {}", e);
        bad_request(format!("Invalid multipart body: {e}"))
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if !content_type.starts_with("image/") {
            warn!("Rejecting upload with content type {:?}", content_type);
            return Err(bad_request("File must be an image"));
        }

        let bytes = field.bytes().await.map_err(|e| {
            warn!("Failed to read uploaded file: {}", e);
            bad_request(format!("Failed to read uploaded file: {e}"))
        })?;

        if bytes.is_empty() {
            return Err(bad_request("Uploaded file is empty"));
        }

        return Ok(bytes.to_vec());
    }

    warn!("Upload is missing the '{}' field", FILE_FIELD);
    Err(bad_request(format!("Missing '{FILE_FIELD}' field")))
}

pub async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        message: format!("{} API is running", state.project_name),
    })
}

pub async fn health_check() -> Json<HealthResponse> {
    debug!("Health check requested");

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn handle_404() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("endpoint not found")),
    )
}
