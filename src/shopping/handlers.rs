use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument};

use crate::{ai, auth::services::AuthUser, plans::types::ShoppingList, profile, state::AppState};

use super::dto::ToggleItemRequest;
use super::services;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shopping-list", post(generate).get(get_list))
        .route("/shopping-list/toggle", post(toggle_item))
}

#[instrument(skip(state))]
pub async fn generate(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ShoppingList>, (StatusCode, String)> {
    let mut record = profile::repo::fetch_record(&state.db, user_id)
        .await
        .map_err(internal)?;

    let week = match record.data.weekly_plan.clone() {
        Some(w) => w,
        None => {
            return Err((
                StatusCode::NOT_FOUND,
                "Nenhum plano semanal encontrado.".into(),
            ));
        }
    };

    // Clear the previous list, persisted, before calling out.
    record.data.shopping_list = None;
    profile::repo::upsert_record(&state.db, user_id, &record)
        .await
        .map_err(internal)?;

    let list = match services::generate_shopping_list(state.ai.as_ref(), &week).await {
        Ok(l) => l,
        Err(e) => {
            error!(error = %e, user_id = %user_id, "shopping list generation failed");
            return Err((
                StatusCode::BAD_GATEWAY,
                ai::user_message(&e, "gerar a lista de compras"),
            ));
        }
    };

    record.data.shopping_list = Some(list.clone());
    profile::repo::upsert_record(&state.db, user_id, &record)
        .await
        .map_err(internal)?;

    info!(user_id = %user_id, items = list.len(), "shopping list stored");
    Ok(Json(list))
}

#[instrument(skip(state))]
pub async fn get_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Option<ShoppingList>>, (StatusCode, String)> {
    let record = profile::repo::fetch_record(&state.db, user_id)
        .await
        .map_err(internal)?;
    Ok(Json(record.data.shopping_list))
}

#[instrument(skip(state, payload))]
pub async fn toggle_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ToggleItemRequest>,
) -> Result<Json<ShoppingList>, (StatusCode, String)> {
    let mut record = profile::repo::fetch_record(&state.db, user_id)
        .await
        .map_err(internal)?;

    if !record.data.toggle_shopping_item(&payload.name) {
        return Err((
            StatusCode::NOT_FOUND,
            "Item não encontrado na lista.".into(),
        ));
    }

    profile::repo::upsert_record(&state.db, user_id, &record)
        .await
        .map_err(internal)?;

    Ok(Json(record.data.shopping_list.unwrap_or_default()))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "shopping list storage error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
