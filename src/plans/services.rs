use tracing::{debug, info};

use crate::ai::{AiError, GenerateRequest, GenerativeClient};
use crate::plans::types::{Biometrics, NutritionPlan, Weekday, WeeklyPlan};

use super::{prompts, schema};

/// Generate one day's plan from the user's biometrics. The declared schema
/// makes the model answer with strict JSON, so the reply is parsed as-is.
pub async fn generate_daily_plan(
    ai: &dyn GenerativeClient,
    bio: &Biometrics,
    weekly_context: Option<&str>,
) -> Result<NutritionPlan, AiError> {
    let req = GenerateRequest::from_prompt(prompts::daily_plan(bio, weekly_context))
        .with_schema(schema::nutrition_plan());
    let raw = ai.generate(req).await?;
    serde_json::from_str(raw.trim()).map_err(|e| AiError::Parse(e.to_string()))
}

/// Generate Monday through Sunday sequentially, threading each day's meal
/// names into the next day's prompt for variety. Any failing day aborts the
/// whole week.
pub async fn generate_weekly_plan(
    ai: &dyn GenerativeClient,
    bio: &Biometrics,
) -> Result<WeeklyPlan, AiError> {
    let mut week = WeeklyPlan::new();
    let mut context = prompts::first_day_context();
    for day in Weekday::ALL {
        debug!(?day, "generating plan for weekday");
        let plan = generate_daily_plan(ai, bio, Some(&context)).await?;
        context = prompts::next_day_context(&plan);
        week.insert(day, plan);
    }
    info!(days = week.len(), "weekly plan generated");
    Ok(week)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::ScriptedClient;
    use crate::plans::types::test_support::sample_plan;

    fn plan_json(tag: &str) -> String {
        serde_json::to_string(&sample_plan(tag)).unwrap()
    }

    #[tokio::test]
    async fn daily_plan_sends_schema_and_parses_reply() {
        let ai = ScriptedClient::replying(&[&plan_json("x")]);
        let plan = generate_daily_plan(&ai, &Biometrics::default(), None)
            .await
            .unwrap();
        assert_eq!(plan, sample_plan("x"));

        let requests = ai.requests.lock().unwrap();
        assert!(requests[0].response_schema.is_some());
    }

    #[tokio::test]
    async fn garbage_reply_is_a_parse_error() {
        let ai = ScriptedClient::replying(&["this is not json"]);
        let err = generate_daily_plan(&ai, &Biometrics::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Parse(_)));
    }

    #[tokio::test]
    async fn weekly_plan_fills_all_seven_days_in_order() {
        let responses: Vec<String> = (0..7).map(|i| plan_json(&format!("d{i}"))).collect();
        let refs: Vec<&str> = responses.iter().map(String::as_str).collect();
        let ai = ScriptedClient::replying(&refs);

        let week = generate_weekly_plan(&ai, &Biometrics::default())
            .await
            .unwrap();

        assert_eq!(week.len(), 7);
        let days: Vec<Weekday> = week.keys().copied().collect();
        assert_eq!(days, Weekday::ALL.to_vec());
        assert_eq!(week[&Weekday::Monday], sample_plan("d0"));
        assert_eq!(week[&Weekday::Sunday], sample_plan("d6"));
    }

    #[tokio::test]
    async fn weekly_prompts_thread_previous_day_meals() {
        let responses: Vec<String> = (0..7).map(|i| plan_json(&format!("d{i}"))).collect();
        let refs: Vec<&str> = responses.iter().map(String::as_str).collect();
        let ai = ScriptedClient::replying(&refs);

        generate_weekly_plan(&ai, &Biometrics::default())
            .await
            .unwrap();

        let prompts = ai.prompts();
        assert_eq!(prompts.len(), 7);
        assert!(prompts[0].contains("Este é o primeiro dia do plano semanal"));
        // Tuesday's prompt names Monday's meals, Sunday's names Saturday's.
        assert!(prompts[1].contains("Aveia d0"));
        assert!(prompts[6].contains("Aveia d5"));
    }

    #[tokio::test]
    async fn failing_day_aborts_the_week() {
        let ai = ScriptedClient::new(vec![
            Ok(plan_json("d0")),
            Ok(plan_json("d1")),
            Err(AiError::RateLimited("quota exhausted".into())),
        ]);
        let err = generate_weekly_plan(&ai, &Biometrics::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::RateLimited(_)));
    }
}
