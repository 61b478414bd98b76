use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::skill::{Proficiency, UserSkillRow};
use crate::models::user::{Role, UserRow};
use crate::skills::queries::{find_or_create_by_name, SkillRef};
use crate::state::AppState;
use crate::users::queries::{
    find_by_id, get_user_skills, portfolio_count, rating_summary, upsert_user_skill,
};

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserRow,
    pub skills: Vec<UserSkillRow>,
}

#[derive(Debug, Serialize)]
pub struct PublicProfileResponse {
    #[serde(flatten)]
    pub user: UserRow,
    pub skills: Vec<UserSkillRow>,
    pub portfolio_count: i64,
    pub average_rating: Option<f64>,
    pub review_count: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub avatar_url: Option<String>,
    pub university: Option<String>,
    pub company_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddSkillRequest {
    pub skill_id: Option<i64>,
    pub skill_name: Option<String>,
    pub proficiency: Option<String>,
}

/// Picks the skill reference out of an add-skill body; `skill_id` wins.
fn skill_ref(req: &AddSkillRequest) -> Result<SkillRef, AppError> {
    match (req.skill_id, req.skill_name.as_deref()) {
        (Some(id), _) => Ok(SkillRef::Id(id)),
        (None, Some(name)) if !name.trim().is_empty() => Ok(SkillRef::Name(name.to_string())),
        _ => Err(AppError::Validation(
            "Either skill_id or skill_name is required".to_string(),
        )),
    }
}

async fn load_user(state: &AppState, user_id: i64) -> Result<UserRow, AppError> {
    find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
}

/// GET /api/users/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = load_user(&state, auth.id).await?;
    let skills = get_user_skills(&state.db, auth.id).await?;
    Ok(Json(ProfileResponse { user, skills }))
}

/// PUT /api/users/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let name = req.name.as_deref().map(str::trim);
    if name.is_some_and(str::is_empty) {
        return Err(AppError::Validation("Name cannot be empty".to_string()));
    }

    sqlx::query(
        r#"
        UPDATE users SET
            name = COALESCE(?, name),
            bio = COALESCE(?, bio),
            location = COALESCE(?, location),
            avatar_url = COALESCE(?, avatar_url),
            university = COALESCE(?, university),
            company_name = COALESCE(?, company_name)
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(&req.bio)
    .bind(&req.location)
    .bind(&req.avatar_url)
    .bind(&req.university)
    .bind(&req.company_name)
    .bind(auth.id)
    .execute(&state.db)
    .await?;

    info!("User {} updated their profile", auth.id);
    handle_get_profile(State(state), auth).await
}

/// GET /api/users/:id
pub async fn handle_get_public_profile(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<PublicProfileResponse>, AppError> {
    let user = load_user(&state, user_id).await?;
    let skills = get_user_skills(&state.db, user_id).await?;
    let portfolio_count = portfolio_count(&state.db, user_id).await?;
    let (average_rating, review_count) = rating_summary(&state.db, user_id).await?;

    Ok(Json(PublicProfileResponse {
        user,
        skills,
        portfolio_count,
        average_rating,
        review_count,
    }))
}

/// GET /api/users/skills
pub async fn handle_list_skills(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<UserSkillRow>>, AppError> {
    Ok(Json(get_user_skills(&state.db, auth.id).await?))
}

/// POST /api/users/skills
pub async fn handle_add_skill(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<AddSkillRequest>,
) -> Result<(StatusCode, Json<Vec<UserSkillRow>>), AppError> {
    auth.require_role(&[Role::Student])?;

    let proficiency = match req.proficiency.as_deref() {
        Some(raw) => raw.parse::<Proficiency>().map_err(AppError::Validation)?,
        None => Proficiency::Beginner,
    };

    let skill_id = match skill_ref(&req)? {
        SkillRef::Id(id) => {
            let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM skills WHERE id = ?")
                .bind(id)
                .fetch_one(&state.db)
                .await?;
            if exists == 0 {
                return Err(AppError::NotFound(format!("Skill {id} not found")));
            }
            id
        }
        SkillRef::Name(name) => {
            let mut conn = state.db.acquire().await?;
            find_or_create_by_name(&mut conn, &name).await?
        }
    };

    upsert_user_skill(&state.db, auth.id, skill_id, proficiency).await?;
    info!(
        "User {} set skill {skill_id} to {}",
        auth.id,
        proficiency.as_str()
    );

    let skills = get_user_skills(&state.db, auth.id).await?;
    Ok((StatusCode::CREATED, Json(skills)))
}

/// DELETE /api/users/skills/:skill_id
pub async fn handle_remove_skill(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(skill_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    auth.require_role(&[Role::Student])?;
    let result = sqlx::query("DELETE FROM user_skills WHERE user_id = ? AND skill_id = ?")
        .bind(auth.id)
        .bind(skill_id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "You do not have skill {skill_id}"
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}
