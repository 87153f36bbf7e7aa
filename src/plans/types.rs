use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One generated meal with its nutritional estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub name: String,
    pub description: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Macronutrient split in grams.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroSplit {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMeals {
    pub breakfast: Meal,
    pub lunch: Meal,
    pub dinner: Meal,
    pub snacks: Meal,
}

/// One day's generated nutrition recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionPlan {
    pub total_calories: f64,
    pub macros: MacroSplit,
    pub meals: PlanMeals,
}

impl NutritionPlan {
    /// Meal names in slot order; feeds the day-to-day variety context.
    pub fn meal_names(&self) -> [&str; 4] {
        [
            &self.meals.breakfast.name,
            &self.meals.lunch.name,
            &self.meals.dinner.name,
            &self.meals.snacks.name,
        ]
    }
}

/// The four daily meal slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
}

/// Same-day checklist of which meals were eaten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedMeals {
    pub breakfast: bool,
    pub lunch: bool,
    pub dinner: bool,
    pub snacks: bool,
}

impl CompletedMeals {
    pub fn toggle(&mut self, slot: MealSlot) {
        let flag = match slot {
            MealSlot::Breakfast => &mut self.breakfast,
            MealSlot::Lunch => &mut self.lunch,
            MealSlot::Dinner => &mut self.dinner,
            MealSlot::Snacks => &mut self.snacks,
        };
        *flag = !*flag;
    }
}

/// Days of the week in generation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];
}

/// Seven daily plans keyed by weekday; `Weekday`'s ordering keeps both
/// iteration and the serialized object in Monday→Sunday order.
pub type WeeklyPlan = BTreeMap<Weekday, NutritionPlan>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanHistoryItem {
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub plan: NutritionPlan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListItem {
    pub name: String,
    pub quantity: String,
    pub category: String,
    pub completed: bool,
}

pub type ShoppingList = Vec<ShoppingListItem>;

/// Structured estimate for one analyzed meal photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealAnalysis {
    pub meal_name: String,
    pub description: String,
    pub calories: f64,
    pub macros: MacroSplit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    #[default]
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    #[default]
    Moderate,
    Active,
    VeryActive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    LoseWeight,
    #[default]
    MaintainWeight,
    GainMuscle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietaryPreference {
    #[default]
    None,
    Vegetarian,
    Vegan,
    GlutenFree,
}

impl Sex {
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Sex::Male),
            "female" => Some(Sex::Female),
            _ => None,
        }
    }
}

impl ActivityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "very_active",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sedentary" => Some(ActivityLevel::Sedentary),
            "light" => Some(ActivityLevel::Light),
            "moderate" => Some(ActivityLevel::Moderate),
            "active" => Some(ActivityLevel::Active),
            "very_active" => Some(ActivityLevel::VeryActive),
            _ => None,
        }
    }
}

impl Goal {
    pub fn as_str(self) -> &'static str {
        match self {
            Goal::LoseWeight => "lose_weight",
            Goal::MaintainWeight => "maintain_weight",
            Goal::GainMuscle => "gain_muscle",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lose_weight" => Some(Goal::LoseWeight),
            "maintain_weight" => Some(Goal::MaintainWeight),
            "gain_muscle" => Some(Goal::GainMuscle),
            _ => None,
        }
    }
}

impl DietaryPreference {
    pub fn as_str(self) -> &'static str {
        match self {
            DietaryPreference::None => "none",
            DietaryPreference::Vegetarian => "vegetarian",
            DietaryPreference::Vegan => "vegan",
            DietaryPreference::GlutenFree => "gluten_free",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(DietaryPreference::None),
            "vegetarian" => Some(DietaryPreference::Vegetarian),
            "vegan" => Some(DietaryPreference::Vegan),
            "gluten_free" => Some(DietaryPreference::GlutenFree),
            _ => None,
        }
    }
}

/// The biometric and goal fields a plan is generated from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Biometrics {
    pub age: u32,
    pub sex: Sex,
    pub weight: f64,
    pub height: f64,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
    pub dietary_preference: DietaryPreference,
}

impl Default for Biometrics {
    fn default() -> Self {
        Self {
            age: 30,
            sex: Sex::default(),
            weight: 70.0,
            height: 175.0,
            activity_level: ActivityLevel::default(),
            goal: Goal::default(),
            dietary_preference: DietaryPreference::default(),
        }
    }
}

/// Everything the app tracks for one user, bundled and written back to the
/// store wholesale on every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub current_plan: Option<NutritionPlan>,
    pub plan_history: Vec<PlanHistoryItem>,
    pub weight_history: Vec<WeightEntry>,
    pub completed_meals: CompletedMeals,
    pub weekly_plan: Option<WeeklyPlan>,
    pub shopping_list: Option<ShoppingList>,
}

impl UserData {
    /// Make a freshly generated plan current: it goes to the front of the
    /// history and the meal checklist starts over.
    pub fn adopt_plan(&mut self, plan: NutritionPlan, now: OffsetDateTime) {
        self.plan_history.insert(
            0,
            PlanHistoryItem {
                date: now,
                plan: plan.clone(),
            },
        );
        self.current_plan = Some(plan);
        self.completed_meals = CompletedMeals::default();
    }

    /// Bring a historical plan back as the current one, resetting the meal
    /// checklist. Returns false when no history entry carries that date.
    pub fn select_plan(&mut self, date: OffsetDateTime) -> bool {
        match self.plan_history.iter().find(|item| item.date == date) {
            Some(item) => {
                self.current_plan = Some(item.plan.clone());
                self.completed_meals = CompletedMeals::default();
                true
            }
            None => false,
        }
    }

    pub fn toggle_meal(&mut self, slot: MealSlot) -> CompletedMeals {
        self.completed_meals.toggle(slot);
        self.completed_meals
    }

    /// Flip the completed flag of the shopping item matching by name only.
    pub fn toggle_shopping_item(&mut self, name: &str) -> bool {
        let list = match self.shopping_list.as_mut() {
            Some(list) => list,
            None => return false,
        };
        match list.iter_mut().find(|item| item.name == name) {
            Some(item) => {
                item.completed = !item.completed;
                true
            }
            None => false,
        }
    }

    pub fn record_weight(&mut self, weight: f64, now: OffsetDateTime) {
        self.weight_history.push(WeightEntry { date: now, weight });
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A complete plan whose meal names carry `tag` so tests can tell
    /// generated days apart.
    pub fn sample_plan(tag: &str) -> NutritionPlan {
        let meal = |name: &str| Meal {
            name: format!("{name} {tag}"),
            description: format!("Descrição de {name}"),
            calories: 500.0,
            protein: 30.0,
            carbs: 50.0,
            fat: 15.0,
        };
        NutritionPlan {
            total_calories: 2000.0,
            macros: MacroSplit {
                protein: 120.0,
                carbs: 200.0,
                fat: 60.0,
            },
            meals: PlanMeals {
                breakfast: meal("Aveia"),
                lunch: meal("Frango"),
                dinner: meal("Salmão"),
                snacks: meal("Iogurte"),
            },
        }
    }
}
