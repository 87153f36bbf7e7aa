//! Response schema declared to the generative API so daily plans come back
//! as strict JSON instead of prose.

use serde_json::{json, Value};

fn meal() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "name": { "type": "STRING" },
            "description": { "type": "STRING" },
            "calories": { "type": "NUMBER" },
            "protein": { "type": "NUMBER" },
            "carbs": { "type": "NUMBER" },
            "fat": { "type": "NUMBER" },
        },
        "required": ["name", "description", "calories", "protein", "carbs", "fat"],
    })
}

pub fn nutrition_plan() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "totalCalories": { "type": "NUMBER" },
            "macros": {
                "type": "OBJECT",
                "properties": {
                    "protein": { "type": "NUMBER" },
                    "carbs": { "type": "NUMBER" },
                    "fat": { "type": "NUMBER" },
                },
                "required": ["protein", "carbs", "fat"],
            },
            "meals": {
                "type": "OBJECT",
                "properties": {
                    "breakfast": meal(),
                    "lunch": meal(),
                    "dinner": meal(),
                    "snacks": meal(),
                },
                "required": ["breakfast", "lunch", "dinner", "snacks"],
            },
        },
        "required": ["totalCalories", "macros", "meals"],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_covers_every_plan_field() {
        let schema = nutrition_plan();
        assert_eq!(schema["properties"]["totalCalories"]["type"], "NUMBER");
        assert_eq!(
            schema["properties"]["meals"]["properties"]["snacks"]["properties"]["fat"]["type"],
            "NUMBER"
        );
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(required, vec!["totalCalories", "macros", "meals"]);
    }
}
