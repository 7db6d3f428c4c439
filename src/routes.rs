use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::{path::Path, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeFile,
    trace::TraceLayer,
};

use crate::{
    gemini::ImageGenerator,
    generation::{generate, GenerateError},
    models::{ErrorResponse, GenerateImageRequest, GenerateImageResponse},
};

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn ImageGenerator>,
}

impl AppState {
    pub fn new(generator: Arc<dyn ImageGenerator>) -> Self {
        Self { generator }
    }
}

impl IntoResponse for GenerateError {
    fn into_response(self) -> Response {
        let status = match &self {
            GenerateError::EmptyPrompt | GenerateError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            GenerateError::NoImage | GenerateError::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

pub async fn generate_image(
    State(state): State<AppState>,
    body: Result<Json<GenerateImageRequest>, JsonRejection>,
) -> Result<Json<GenerateImageResponse>, GenerateError> {
    let Json(body) = body.map_err(|rejection| GenerateError::InvalidBody(rejection.body_text()))?;
    let image_base64 = generate(state.generator.as_ref(), &body.prompt).await?;
    Ok(Json(GenerateImageResponse { image_base64 }))
}

/// `GET /` serves `index.html` from `static_dir`; `POST /generate-image` runs a prompt.
pub fn router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .route("/generate-image", post(generate_image))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
