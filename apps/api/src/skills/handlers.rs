use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::skill::SkillRow;
use crate::models::user::Role;
use crate::skills::queries::clean_skill_name;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SkillQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSkillRequest {
    pub name: String,
    pub category: Option<String>,
}

/// GET /api/skills
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<SkillQuery>,
) -> Result<Json<Vec<SkillRow>>, AppError> {
    let search = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{s}%"));
    let category = params
        .category
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let rows = sqlx::query_as::<_, SkillRow>(
        r#"
        SELECT id, name, category FROM skills
        WHERE (? IS NULL OR name LIKE ?)
          AND (? IS NULL OR category = ?)
        ORDER BY name
        "#,
    )
    .bind(&search)
    .bind(&search)
    .bind(category)
    .bind(category)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

/// POST /api/skills
pub async fn handle_create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateSkillRequest>,
) -> Result<(StatusCode, Json<SkillRow>), AppError> {
    auth.require_role(&[Role::Admin, Role::Recruiter])?;
    let name = clean_skill_name(&req.name)?;
    let category = req
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let result = sqlx::query("INSERT INTO skills (name, category) VALUES (?, ?)")
        .bind(&name)
        .bind(&category)
        .execute(&state.db)
        .await
        .map_err(|e| AppError::on_duplicate(e, &format!("Skill '{name}' already exists")))?;

    let id = result.last_insert_id() as i64;
    info!("User {} created skill {id} ({name})", auth.id);
    Ok((StatusCode::CREATED, Json(SkillRow { id, name, category })))
}

/// DELETE /api/skills/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    auth.require_role(&[Role::Admin])?;
    let result = sqlx::query("DELETE FROM skills WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Skill {id} not found")));
    }
    info!("Admin {} deleted skill {id}", auth.id);
    Ok(StatusCode::NO_CONTENT)
}
