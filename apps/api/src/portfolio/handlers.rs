use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use sqlx::types::Json as SqlJson;
use sqlx::MySqlPool;
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::portfolio::PortfolioItemRow;
use crate::models::user::Role;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePortfolioRequest {
    pub title: String,
    pub description: Option<String>,
    pub project_url: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePortfolioRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project_url: Option<String>,
    pub image_url: Option<String>,
    pub technologies: Option<Vec<String>>,
}

/// Trims, drops blanks and de-duplicates (case-insensitively) technology tags.
fn clean_technologies(raw: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    raw.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .collect()
}

fn validate_url(field: &str, url: Option<&str>) -> Result<(), AppError> {
    match url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(u) if !(u.starts_with("http://") || u.starts_with("https://")) => Err(
            AppError::Validation(format!("{field} must start with http:// or https://")),
        ),
        _ => Ok(()),
    }
}

async fn get_item(pool: &MySqlPool, id: i64) -> Result<Option<PortfolioItemRow>, sqlx::Error> {
    sqlx::query_as::<_, PortfolioItemRow>("SELECT * FROM portfolio_items WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

async fn load_owned_item(state: &AppState, auth: &AuthUser, id: i64) -> Result<PortfolioItemRow, AppError> {
    let item = get_item(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Portfolio item {id} not found")))?;
    if item.user_id != auth.id {
        return Err(AppError::Forbidden(
            "You can only manage your own portfolio".to_string(),
        ));
    }
    Ok(item)
}

async fn list_for_user(pool: &MySqlPool, user_id: i64) -> Result<Vec<PortfolioItemRow>, sqlx::Error> {
    sqlx::query_as::<_, PortfolioItemRow>(
        "SELECT * FROM portfolio_items WHERE user_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// GET /api/portfolio/user/:user_id
pub async fn handle_list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<PortfolioItemRow>>, AppError> {
    Ok(Json(list_for_user(&state.db, user_id).await?))
}

/// GET /api/portfolio/mine
pub async fn handle_mine(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<PortfolioItemRow>>, AppError> {
    Ok(Json(list_for_user(&state.db, auth.id).await?))
}

/// POST /api/portfolio
pub async fn handle_create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreatePortfolioRequest>,
) -> Result<(StatusCode, Json<PortfolioItemRow>), AppError> {
    auth.require_role(&[Role::Student])?;
    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    validate_url("project_url", req.project_url.as_deref())?;
    validate_url("image_url", req.image_url.as_deref())?;

    let result = sqlx::query(
        r#"
        INSERT INTO portfolio_items (user_id, title, description, project_url, image_url, technologies)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.id)
    .bind(title)
    .bind(&req.description)
    .bind(&req.project_url)
    .bind(&req.image_url)
    .bind(SqlJson(clean_technologies(req.technologies)))
    .execute(&state.db)
    .await?;
    let id = result.last_insert_id() as i64;

    info!("User {} added portfolio item {id}", auth.id);
    let item = get_item(&state.db, id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Portfolio item {id} vanished after insert")))?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/portfolio/:id
pub async fn handle_update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePortfolioRequest>,
) -> Result<Json<PortfolioItemRow>, AppError> {
    let existing = load_owned_item(&state, &auth, id).await?;

    let title = req.title.as_deref().map(str::trim);
    if title.is_some_and(str::is_empty) {
        return Err(AppError::Validation("Title cannot be empty".to_string()));
    }
    validate_url("project_url", req.project_url.as_deref())?;
    validate_url("image_url", req.image_url.as_deref())?;

    let technologies = req
        .technologies
        .map(clean_technologies)
        .unwrap_or(existing.technologies.0);

    sqlx::query(
        r#"
        UPDATE portfolio_items SET
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            project_url = COALESCE(?, project_url),
            image_url = COALESCE(?, image_url),
            technologies = ?
        WHERE id = ?
        "#,
    )
    .bind(title)
    .bind(&req.description)
    .bind(&req.project_url)
    .bind(&req.image_url)
    .bind(SqlJson(technologies))
    .bind(id)
    .execute(&state.db)
    .await?;

    let item = get_item(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Portfolio item {id} not found")))?;
    Ok(Json(item))
}

/// DELETE /api/portfolio/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    load_owned_item(&state, &auth, id).await?;
    sqlx::query("DELETE FROM portfolio_items WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;
    info!("User {} deleted portfolio item {id}", auth.id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_technologies_dedupes_case_insensitively() {
        let cleaned = clean_technologies(vec![
            " Rust ".to_string(),
            "rust".to_string(),
            "".to_string(),
            "Axum".to_string(),
        ]);
        assert_eq!(cleaned, vec!["Rust", "Axum"]);
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("project_url", Some("https://github.com/a/b")).is_ok());
        assert!(validate_url("project_url", None).is_ok());
        assert!(validate_url("project_url", Some("  ")).is_ok());
        assert!(validate_url("project_url", Some("ftp://x")).is_err());
    }
}
