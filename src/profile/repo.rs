use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{ProfileRow, UserRecord};

/// Load a user's full record, or a default-populated one when the row does
/// not exist yet.
pub async fn fetch_record(db: &PgPool, user_id: Uuid) -> anyhow::Result<UserRecord> {
    let row = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT name, age, sex, weight_kg, height_cm, activity_level, goal,
               dietary_preference, current_plan, plan_history, weight_history,
               completed_meals, weekly_plan, shopping_list
        FROM profiles
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row.map(UserRecord::from).unwrap_or_default())
}

/// Write the whole record back. Every mutation funnels through here, so the
/// last writer wins column for column.
pub async fn upsert_record(
    db: &PgPool,
    user_id: Uuid,
    record: &UserRecord,
) -> anyhow::Result<()> {
    let bio = record.profile.biometrics;
    sqlx::query(
        r#"
        INSERT INTO profiles (user_id, name, age, sex, weight_kg, height_cm,
                              activity_level, goal, dietary_preference, current_plan,
                              plan_history, weight_history, completed_meals,
                              weekly_plan, shopping_list, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, now())
        ON CONFLICT (user_id) DO UPDATE SET
            name = EXCLUDED.name,
            age = EXCLUDED.age,
            sex = EXCLUDED.sex,
            weight_kg = EXCLUDED.weight_kg,
            height_cm = EXCLUDED.height_cm,
            activity_level = EXCLUDED.activity_level,
            goal = EXCLUDED.goal,
            dietary_preference = EXCLUDED.dietary_preference,
            current_plan = EXCLUDED.current_plan,
            plan_history = EXCLUDED.plan_history,
            weight_history = EXCLUDED.weight_history,
            completed_meals = EXCLUDED.completed_meals,
            weekly_plan = EXCLUDED.weekly_plan,
            shopping_list = EXCLUDED.shopping_list,
            updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(&record.profile.name)
    .bind(bio.age as i32)
    .bind(bio.sex.as_str())
    .bind(bio.weight)
    .bind(bio.height)
    .bind(bio.activity_level.as_str())
    .bind(bio.goal.as_str())
    .bind(bio.dietary_preference.as_str())
    .bind(
        record
            .data
            .current_plan
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?,
    )
    .bind(serde_json::to_value(&record.data.plan_history)?)
    .bind(serde_json::to_value(&record.data.weight_history)?)
    .bind(serde_json::to_value(&record.data.completed_meals)?)
    .bind(
        record
            .data
            .weekly_plan
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?,
    )
    .bind(
        record
            .data
            .shopping_list
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?,
    )
    .execute(db)
    .await?;
    Ok(())
}

/// Seed the profile row at registration; table defaults fill the biometric
/// columns.
pub async fn create_default(db: &PgPool, user_id: Uuid, name: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO profiles (user_id, name)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(name)
    .execute(db)
    .await?;
    Ok(())
}
