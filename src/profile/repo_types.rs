use serde_json::Value;
use sqlx::FromRow;

use crate::plans::types::{
    ActivityLevel, Biometrics, DietaryPreference, Goal, Sex, UserData,
};

/// Raw profiles row: enum-ish fields stored as TEXT, tracked data as JSONB.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub name: String,
    pub age: i32,
    pub sex: String,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub activity_level: String,
    pub goal: String,
    pub dietary_preference: String,
    pub current_plan: Option<Value>,
    pub plan_history: Value,
    pub weight_history: Value,
    pub completed_meals: Value,
    pub weekly_plan: Option<Value>,
    pub shopping_list: Option<Value>,
}

/// Identity and biometrics half of the stored record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub name: String,
    pub biometrics: Biometrics,
}

/// The complete per-user record. Every read hands this out and every
/// mutation writes the whole thing back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserRecord {
    pub profile: Profile,
    pub data: UserData,
}

impl From<ProfileRow> for UserRecord {
    fn from(row: ProfileRow) -> Self {
        // Unreadable labels or JSON collapse to the same defaults a fresh
        // row is created with.
        let biometrics = Biometrics {
            age: row.age.max(0) as u32,
            sex: Sex::parse(&row.sex).unwrap_or_default(),
            weight: row.weight_kg,
            height: row.height_cm,
            activity_level: ActivityLevel::parse(&row.activity_level).unwrap_or_default(),
            goal: Goal::parse(&row.goal).unwrap_or_default(),
            dietary_preference: DietaryPreference::parse(&row.dietary_preference)
                .unwrap_or_default(),
        };
        let data = UserData {
            current_plan: row.current_plan.and_then(|v| serde_json::from_value(v).ok()),
            plan_history: serde_json::from_value(row.plan_history).unwrap_or_default(),
            weight_history: serde_json::from_value(row.weight_history).unwrap_or_default(),
            completed_meals: serde_json::from_value(row.completed_meals).unwrap_or_default(),
            weekly_plan: row.weekly_plan.and_then(|v| serde_json::from_value(v).ok()),
            shopping_list: row.shopping_list.and_then(|v| serde_json::from_value(v).ok()),
        };
        Self {
            profile: Profile {
                name: row.name,
                biometrics,
            },
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> ProfileRow {
        ProfileRow {
            name: "Maria".into(),
            age: 28,
            sex: "female".into(),
            weight_kg: 62.5,
            height_cm: 168.0,
            activity_level: "active".into(),
            goal: "lose_weight".into(),
            dietary_preference: "vegan".into(),
            current_plan: None,
            plan_history: json!([]),
            weight_history: json!([]),
            completed_meals: json!({
                "breakfast": false, "lunch": false, "dinner": false, "snacks": false
            }),
            weekly_plan: None,
            shopping_list: None,
        }
    }

    #[test]
    fn row_maps_into_typed_record() {
        let mut row = row();
        row.completed_meals =
            json!({"breakfast": true, "lunch": false, "dinner": false, "snacks": false});
        let record = UserRecord::from(row);
        assert_eq!(record.profile.name, "Maria");
        assert_eq!(record.profile.biometrics.sex, Sex::Female);
        assert_eq!(record.profile.biometrics.goal, Goal::LoseWeight);
        assert!(record.data.completed_meals.breakfast);
        assert!(record.data.plan_history.is_empty());
    }

    #[test]
    fn unknown_labels_fall_back_to_defaults() {
        let mut row = row();
        row.sex = "robot".into();
        row.activity_level = "couch".into();
        row.goal = "win".into();
        row.dietary_preference = "keto".into();
        let record = UserRecord::from(row);
        let bio = record.profile.biometrics;
        assert_eq!(bio.sex, Sex::Male);
        assert_eq!(bio.activity_level, ActivityLevel::Moderate);
        assert_eq!(bio.goal, Goal::MaintainWeight);
        assert_eq!(bio.dietary_preference, DietaryPreference::None);
    }

    #[test]
    fn corrupt_json_columns_fall_back_to_defaults() {
        let mut row = row();
        row.completed_meals = json!("garbage");
        row.plan_history = json!(42);
        row.shopping_list = Some(json!({"not": "a list"}));
        let record = UserRecord::from(row);
        assert_eq!(record.data.completed_meals, Default::default());
        assert!(record.data.plan_history.is_empty());
        assert!(record.data.shopping_list.is_none());
    }
}
