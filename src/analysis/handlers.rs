use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use tracing::{error, instrument};
use uuid::Uuid;

use crate::{ai, auth::services::AuthUser, plans::types::MealAnalysis, state::AppState};

use super::dto::AnalyzeBase64Request;
use super::services::{analyze_meal_images, ImageUpload};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/analysis", post(analyze_multipart)) // multipart files[]
        .route("/analysis/base64", post(analyze_base64))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

/// POST /analysis (multipart), field files[] with one or more photos.
#[instrument(skip(state, mp))]
pub async fn analyze_multipart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<Json<Vec<MealAnalysis>>, (StatusCode, String)> {
    let mut images: Vec<ImageUpload> = Vec::new();
    while let Ok(Some(field)) = mp.next_field().await {
        let name = field.name().map(|s| s.to_string());
        if name.as_deref() == Some("files") || name.as_deref() == Some("files[]") {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "image/jpeg".into());
            let data = field.bytes().await.map_err(internal)?;
            images.push(ImageUpload {
                content_type,
                bytes: data,
            });
        }
    }
    if images.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "files[] is required".into()));
    }

    run_analysis(&state, user_id, images).await
}

/// POST /analysis/base64 { images_b64: ["...", ...], content_type?: "image/jpeg" }
#[instrument(skip(state, body))]
pub async fn analyze_base64(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<AnalyzeBase64Request>,
) -> Result<Json<Vec<MealAnalysis>>, (StatusCode, String)> {
    if body.images_b64.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "images_b64 is required".into()));
    }
    let ct = body.content_type.as_deref().unwrap_or("image/jpeg");

    let mut images = Vec::with_capacity(body.images_b64.len());
    for b64 in body.images_b64 {
        let bytes = STANDARD
            .decode(&b64)
            .map_err(|_| (StatusCode::BAD_REQUEST, "invalid base64".to_string()))?;
        images.push(ImageUpload {
            content_type: ct.to_string(),
            bytes: Bytes::from(bytes),
        });
    }

    run_analysis(&state, user_id, images).await
}

async fn run_analysis(
    state: &AppState,
    user_id: Uuid,
    images: Vec<ImageUpload>,
) -> Result<Json<Vec<MealAnalysis>>, (StatusCode, String)> {
    match analyze_meal_images(state.ai.as_ref(), images).await {
        Ok(analyses) => Ok(Json(analyses)),
        Err(e) => {
            error!(error = %e, user_id = %user_id, "meal analysis failed");
            Err((
                StatusCode::BAD_GATEWAY,
                ai::user_message(&e, "analisar a imagem"),
            ))
        }
    }
}

fn internal<E: std::error::Error>(e: E) -> (StatusCode, String) {
    error!(error = %e, "reading uploaded image failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
