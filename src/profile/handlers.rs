use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{error, info, instrument};

use crate::{auth::services::AuthUser, state::AppState};

use super::dto::{ProfileResponse, UpdateProfileRequest};
use super::repo;

pub fn router() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile).put(update_profile))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    let record = repo::fetch_record(&state.db, user_id)
        .await
        .map_err(internal)?;
    Ok(Json(ProfileResponse::new(user_id, record)))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    let mut record = repo::fetch_record(&state.db, user_id)
        .await
        .map_err(internal)?;
    payload.apply(&mut record);
    repo::upsert_record(&state.db, user_id, &record)
        .await
        .map_err(internal)?;

    info!(user_id = %user_id, "profile updated");
    Ok(Json(ProfileResponse::new(user_id, record)))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "profile storage error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
