use std::collections::HashSet;

use serde::Deserialize;
use sqlx::{MySqlConnection, MySqlPool};

use crate::errors::AppError;
use crate::models::skill::SkillRow;

pub const MAX_SKILL_NAME_LEN: usize = 100;

/// A skill referenced by id or by name in a request body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SkillRef {
    Id(i64),
    Name(String),
}

/// Trims a skill name and checks its length.
pub fn clean_skill_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Skill name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_SKILL_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Skill name must be at most {MAX_SKILL_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

/// Returns the id of the skill named `name`, creating it if needed.
pub async fn find_or_create_by_name(
    conn: &mut MySqlConnection,
    name: &str,
) -> Result<i64, AppError> {
    let name = clean_skill_name(name)?;
    // LAST_INSERT_ID(id) makes an existing row's id visible as the insert id.
    let result = sqlx::query(
        "INSERT INTO skills (name) VALUES (?) ON DUPLICATE KEY UPDATE id = LAST_INSERT_ID(id)",
    )
    .bind(&name)
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_id() as i64)
}

/// Resolves a list of skill references to distinct ids, preserving first-seen order.
/// Unknown ids are a validation error; unknown names are created.
pub async fn resolve_skill_ids(
    conn: &mut MySqlConnection,
    refs: &[SkillRef],
) -> Result<Vec<i64>, AppError> {
    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(refs.len());

    for skill_ref in refs {
        let id = match skill_ref {
            SkillRef::Id(id) => {
                let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM skills WHERE id = ?")
                    .bind(id)
                    .fetch_one(&mut *conn)
                    .await?;
                if exists == 0 {
                    return Err(AppError::Validation(format!("Unknown skill id {id}")));
                }
                *id
            }
            SkillRef::Name(name) => find_or_create_by_name(conn, name).await?,
        };
        if seen.insert(id) {
            ids.push(id);
        }
    }

    Ok(ids)
}

/// Skills required by a job, ordered by name.
pub async fn get_job_skills(pool: &MySqlPool, job_id: i64) -> Result<Vec<SkillRow>, sqlx::Error> {
    sqlx::query_as::<_, SkillRow>(
        r#"
        SELECT s.id, s.name, s.category
        FROM job_skills js
        JOIN skills s ON s.id = js.skill_id
        WHERE js.job_id = ?
        ORDER BY s.name
        "#,
    )
    .bind(job_id)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_ref_accepts_ids_and_names() {
        let refs: Vec<SkillRef> = serde_json::from_str(r#"[3, "Rust", 7]"#).unwrap();
        assert_eq!(
            refs,
            vec![SkillRef::Id(3), SkillRef::Name("Rust".to_string()), SkillRef::Id(7)]
        );
    }

    #[test]
    fn test_clean_skill_name() {
        assert_eq!(clean_skill_name("  Docker ").unwrap(), "Docker");
        assert!(clean_skill_name("   ").is_err());
        assert!(clean_skill_name(&"x".repeat(101)).is_err());
    }
}
