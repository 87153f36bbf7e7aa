use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::plans::types::{
    ActivityLevel, Biometrics, DietaryPreference, Goal, Sex, UserData,
};

use super::repo_types::UserRecord;

/// Partial profile update; absent fields keep their stored values.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub sex: Option<Sex>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub goal: Option<Goal>,
    pub dietary_preference: Option<DietaryPreference>,
}

impl UpdateProfileRequest {
    pub fn apply(self, record: &mut UserRecord) {
        if let Some(name) = self.name {
            record.profile.name = name;
        }
        let bio = &mut record.profile.biometrics;
        if let Some(age) = self.age {
            bio.age = age;
        }
        if let Some(sex) = self.sex {
            bio.sex = sex;
        }
        if let Some(weight) = self.weight {
            bio.weight = weight;
        }
        if let Some(height) = self.height {
            bio.height = height;
        }
        if let Some(level) = self.activity_level {
            bio.activity_level = level;
        }
        if let Some(goal) = self.goal {
            bio.goal = goal;
        }
        if let Some(pref) = self.dietary_preference {
            bio.dietary_preference = pref;
        }
    }
}

/// Full record as the client sees it: identity, flattened biometrics and
/// all tracked data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub biometrics: Biometrics,
    pub data: UserData,
}

impl ProfileResponse {
    pub fn new(user_id: Uuid, record: UserRecord) -> Self {
        Self {
            id: user_id,
            name: record.profile.name,
            biometrics: record.profile.biometrics,
            data: record.data,
        }
    }
}
