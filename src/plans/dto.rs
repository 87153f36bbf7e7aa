use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::plans::types::{CompletedMeals, NutritionPlan};

/// Body for reactivating a plan out of the history.
#[derive(Debug, Deserialize)]
pub struct SelectPlanRequest {
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

/// Dashboard view: the active plan plus today's checklist.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentPlanResponse {
    pub current_plan: Option<NutritionPlan>,
    pub completed_meals: CompletedMeals,
}
