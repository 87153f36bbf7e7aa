use tracing::info;

use crate::ai::{strip_code_fences, AiError, GenerateRequest, GenerativeClient};
use crate::plans::prompts;
use crate::plans::types::{ShoppingList, WeeklyPlan};

/// Ask the model for an aggregated, categorized list covering the stored
/// week. Quantities come back as free text and are kept verbatim.
pub async fn generate_shopping_list(
    ai: &dyn GenerativeClient,
    week: &WeeklyPlan,
) -> Result<ShoppingList, AiError> {
    let req = GenerateRequest::from_prompt(prompts::shopping_list(week));
    let raw = ai.generate(req).await?;
    let list: ShoppingList = serde_json::from_str(&strip_code_fences(&raw))
        .map_err(|e| AiError::Parse(e.to_string()))?;
    info!(items = list.len(), "shopping list generated");
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::ScriptedClient;
    use crate::plans::types::test_support::sample_plan;
    use crate::plans::types::Weekday;

    fn week() -> WeeklyPlan {
        let mut week = WeeklyPlan::new();
        week.insert(Weekday::Monday, sample_plan("seg"));
        week
    }

    #[tokio::test]
    async fn parses_a_fenced_json_array() {
        let reply = "```json\n[{\"name\":\"Aveia\",\"quantity\":\"500 g\",\
\"category\":\"Padaria e Cereais\",\"completed\":false}]\n```";
        let ai = ScriptedClient::replying(&[reply]);

        let list = generate_shopping_list(&ai, &week()).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "Aveia");
        assert_eq!(list[0].quantity, "500 g");
        assert!(!list[0].completed);
    }

    #[tokio::test]
    async fn prompt_carries_the_week_summary() {
        let reply = "[]";
        let ai = ScriptedClient::replying(&[reply]);
        generate_shopping_list(&ai, &week()).await.unwrap();

        let prompts = ai.prompts();
        assert!(prompts[0].contains("lista de compras"));
        assert!(prompts[0].contains("Descrição de Aveia"));
    }

    #[tokio::test]
    async fn non_array_reply_is_a_parse_error() {
        let ai = ScriptedClient::replying(&["{\"name\":\"not a list\"}"]);
        let err = generate_shopping_list(&ai, &week()).await.unwrap_err();
        assert!(matches!(err, AiError::Parse(_)));
    }
}
