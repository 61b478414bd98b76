use sqlx::MySqlPool;

use crate::models::skill::{Proficiency, UserSkillRow};
use crate::models::user::UserRow;

pub async fn find_by_id(pool: &MySqlPool, user_id: i64) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_email(pool: &MySqlPool, email: &str) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// All skills a user holds, with proficiency, ordered by name.
pub async fn get_user_skills(
    pool: &MySqlPool,
    user_id: i64,
) -> Result<Vec<UserSkillRow>, sqlx::Error> {
    sqlx::query_as::<_, UserSkillRow>(
        r#"
        SELECT s.id AS skill_id, s.name, s.category, us.proficiency
        FROM user_skills us
        JOIN skills s ON s.id = us.skill_id
        WHERE us.user_id = ?
        ORDER BY s.name
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn upsert_user_skill(
    pool: &MySqlPool,
    user_id: i64,
    skill_id: i64,
    proficiency: Proficiency,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO user_skills (user_id, skill_id, proficiency)
        VALUES (?, ?, ?)
        ON DUPLICATE KEY UPDATE proficiency = VALUES(proficiency)
        "#,
    )
    .bind(user_id)
    .bind(skill_id)
    .bind(proficiency.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

/// Average rating and count of reviews received by a user.
pub async fn rating_summary(pool: &MySqlPool, user_id: i64) -> Result<(Option<f64>, i64), sqlx::Error> {
    sqlx::query_as::<_, (Option<f64>, i64)>(
        "SELECT CAST(AVG(rating) AS DOUBLE), COUNT(*) FROM reviews WHERE reviewee_id = ?",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn portfolio_count(pool: &MySqlPool, user_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM portfolio_items WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
}
