use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, info, instrument};

use crate::{auth::services::AuthUser, plans::types::WeightEntry, profile, state::AppState};

use super::dto::RecordWeightRequest;

pub fn router() -> Router<AppState> {
    Router::new().route("/progress/weight", post(record_weight).get(get_weight_history))
}

#[instrument(skip(state, payload))]
pub async fn record_weight(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<RecordWeightRequest>,
) -> Result<Json<Vec<WeightEntry>>, (StatusCode, String)> {
    if !payload.weight.is_finite() || payload.weight <= 0.0 {
        return Err((StatusCode::BAD_REQUEST, "weight must be positive".into()));
    }

    let mut record = profile::repo::fetch_record(&state.db, user_id)
        .await
        .map_err(internal)?;
    record
        .data
        .record_weight(payload.weight, OffsetDateTime::now_utc());
    profile::repo::upsert_record(&state.db, user_id, &record)
        .await
        .map_err(internal)?;

    info!(user_id = %user_id, weight = payload.weight, "weight recorded");
    Ok(Json(record.data.weight_history))
}

#[instrument(skip(state))]
pub async fn get_weight_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<WeightEntry>>, (StatusCode, String)> {
    let record = profile::repo::fetch_record(&state.db, user_id)
        .await
        .map_err(internal)?;
    Ok(Json(record.data.weight_history))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "weight history storage error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
