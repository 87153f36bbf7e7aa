use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, info, instrument};

use crate::{ai, auth::services::AuthUser, profile, state::AppState};

use super::dto::{CurrentPlanResponse, SelectPlanRequest};
use super::services;
use super::types::{Biometrics, CompletedMeals, MealSlot, NutritionPlan, PlanHistoryItem, WeeklyPlan};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/plans/daily", post(generate_daily))
        .route("/plans/weekly", post(generate_weekly).get(get_weekly))
        .route("/plans/current", get(get_current))
        .route("/plans/history", get(get_history))
        .route("/plans/select", post(select_plan))
        .route("/plans/meals/:slot/toggle", post(toggle_meal))
}

#[instrument(skip(state, bio))]
pub async fn generate_daily(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(bio): Json<Biometrics>,
) -> Result<Json<NutritionPlan>, (StatusCode, String)> {
    let plan = match services::generate_daily_plan(state.ai.as_ref(), &bio, None).await {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, user_id = %user_id, "daily plan generation failed");
            return Err((StatusCode::BAD_GATEWAY, ai::user_message(&e, "gerar o plano")));
        }
    };

    let mut record = profile::repo::fetch_record(&state.db, user_id)
        .await
        .map_err(internal)?;
    record.data.adopt_plan(plan.clone(), OffsetDateTime::now_utc());
    profile::repo::upsert_record(&state.db, user_id, &record)
        .await
        .map_err(internal)?;

    info!(user_id = %user_id, calories = plan.total_calories, "daily plan generated");
    Ok(Json(plan))
}

#[instrument(skip(state, bio))]
pub async fn generate_weekly(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(bio): Json<Biometrics>,
) -> Result<Json<WeeklyPlan>, (StatusCode, String)> {
    // The stored week and its derived shopping list are cleared, and the
    // clear persisted, before the long generation starts.
    let mut record = profile::repo::fetch_record(&state.db, user_id)
        .await
        .map_err(internal)?;
    record.data.weekly_plan = None;
    record.data.shopping_list = None;
    profile::repo::upsert_record(&state.db, user_id, &record)
        .await
        .map_err(internal)?;

    let week = match services::generate_weekly_plan(state.ai.as_ref(), &bio).await {
        Ok(w) => w,
        Err(e) => {
            error!(error = %e, user_id = %user_id, "weekly plan generation failed");
            return Err((
                StatusCode::BAD_GATEWAY,
                ai::user_message(&e, "gerar o plano semanal"),
            ));
        }
    };

    record.data.weekly_plan = Some(week.clone());
    profile::repo::upsert_record(&state.db, user_id, &record)
        .await
        .map_err(internal)?;

    info!(user_id = %user_id, "weekly plan generated");
    Ok(Json(week))
}

#[instrument(skip(state))]
pub async fn get_current(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<CurrentPlanResponse>, (StatusCode, String)> {
    let record = profile::repo::fetch_record(&state.db, user_id)
        .await
        .map_err(internal)?;
    Ok(Json(CurrentPlanResponse {
        current_plan: record.data.current_plan,
        completed_meals: record.data.completed_meals,
    }))
}

#[instrument(skip(state))]
pub async fn get_weekly(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Option<WeeklyPlan>>, (StatusCode, String)> {
    let record = profile::repo::fetch_record(&state.db, user_id)
        .await
        .map_err(internal)?;
    Ok(Json(record.data.weekly_plan))
}

#[instrument(skip(state))]
pub async fn get_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<PlanHistoryItem>>, (StatusCode, String)> {
    let record = profile::repo::fetch_record(&state.db, user_id)
        .await
        .map_err(internal)?;
    Ok(Json(record.data.plan_history))
}

#[instrument(skip(state, payload))]
pub async fn select_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<SelectPlanRequest>,
) -> Result<Json<CurrentPlanResponse>, (StatusCode, String)> {
    let mut record = profile::repo::fetch_record(&state.db, user_id)
        .await
        .map_err(internal)?;

    if !record.data.select_plan(payload.date) {
        return Err((
            StatusCode::NOT_FOUND,
            "Plano não encontrado no histórico.".into(),
        ));
    }

    profile::repo::upsert_record(&state.db, user_id, &record)
        .await
        .map_err(internal)?;

    info!(user_id = %user_id, date = %payload.date, "historical plan selected");
    Ok(Json(CurrentPlanResponse {
        current_plan: record.data.current_plan,
        completed_meals: record.data.completed_meals,
    }))
}

#[instrument(skip(state))]
pub async fn toggle_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(slot): Path<MealSlot>,
) -> Result<Json<CompletedMeals>, (StatusCode, String)> {
    let mut record = profile::repo::fetch_record(&state.db, user_id)
        .await
        .map_err(internal)?;
    let flags = record.data.toggle_meal(slot);
    profile::repo::upsert_record(&state.db, user_id, &record)
        .await
        .map_err(internal)?;
    Ok(Json(flags))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "plan storage error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
