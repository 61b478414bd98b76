//! Admin-only user and job management.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::{MySql, QueryBuilder};
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::queries::{list_jobs, JobFilters};
use crate::models::job::JobDetail;
use crate::models::user::{Role, UserRow};
use crate::models::Pagination;
use crate::state::AppState;
use crate::users::queries::find_by_id;

#[derive(Debug, Default, Deserialize)]
pub struct AdminUserQuery {
    pub role: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserRow>,
    pub total: i64,
    pub page: u32,
    pub limit: i64,
}

#[derive(Debug, Serialize)]
pub struct AdminJobListResponse {
    pub jobs: Vec<JobDetail>,
    pub total: i64,
    pub page: u32,
    pub limit: i64,
}

#[derive(Debug, Deserialize)]
pub struct RoleChangeRequest {
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct PlatformStats {
    pub total_users: i64,
    pub students: i64,
    pub recruiters: i64,
    pub admins: i64,
    pub total_jobs: i64,
    pub open_jobs: i64,
    pub total_applications: i64,
    pub hires: i64,
}

/// GET /api/admin/users
pub async fn handle_list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(q): Query<AdminUserQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    auth.require_role(&[Role::Admin])?;
    let role = q
        .role
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .map(str::parse::<Role>)
        .transpose()
        .map_err(AppError::Validation)?;
    let pagination = Pagination {
        page: q.page,
        limit: q.limit,
    };
    let (limit, offset) = pagination.limit_offset(20, 100);

    let mut count_qb = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM users");
    let mut qb = QueryBuilder::<MySql>::new("SELECT * FROM users");
    if let Some(role) = role {
        count_qb.push(" WHERE role = ").push_bind(role.as_str());
        qb.push(" WHERE role = ").push_bind(role.as_str());
    }
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let total: i64 = count_qb.build_query_scalar().fetch_one(&state.db).await?;
    let users: Vec<UserRow> = qb.build_query_as().fetch_all(&state.db).await?;

    Ok(Json(UserListResponse {
        users,
        total,
        page: pagination.page.unwrap_or(1).max(1),
        limit,
    }))
}

/// PUT /api/admin/users/:id/role
pub async fn handle_change_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<i64>,
    Json(req): Json<RoleChangeRequest>,
) -> Result<Json<UserRow>, AppError> {
    auth.require_role(&[Role::Admin])?;
    let role: Role = req.role.parse().map_err(AppError::Validation)?;
    if user_id == auth.id && role != Role::Admin {
        return Err(AppError::Validation(
            "You cannot remove your own admin role".to_string(),
        ));
    }

    let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
        .bind(role.as_str())
        .bind(user_id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        // MySQL reports zero affected rows when the value is unchanged.
        if find_by_id(&state.db, user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {user_id} not found")));
        }
    }

    info!("Admin {} set role of user {user_id} to {role}", auth.id);
    let user = find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;
    Ok(Json(user))
}

/// DELETE /api/admin/users/:id
pub async fn handle_delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    auth.require_role(&[Role::Admin])?;
    if user_id == auth.id {
        return Err(AppError::Validation("You cannot delete your own account".to_string()));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("User {user_id} not found")));
    }

    warn!("Admin {} deleted user {user_id}", auth.id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/admin/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(pagination): Query<Pagination>,
) -> Result<Json<AdminJobListResponse>, AppError> {
    auth.require_role(&[Role::Admin])?;
    let (limit, offset) = pagination.limit_offset(20, 100);
    let (jobs, total) = list_jobs(&state.db, &JobFilters::default(), limit, offset).await?;
    Ok(Json(AdminJobListResponse {
        jobs,
        total,
        page: pagination.page.unwrap_or(1).max(1),
        limit,
    }))
}

/// DELETE /api/admin/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    auth.require_role(&[Role::Admin])?;
    let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
        .bind(job_id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }
    warn!("Admin {} deleted job {job_id}", auth.id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/admin/stats
pub async fn handle_stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<PlatformStats>, AppError> {
    auth.require_role(&[Role::Admin])?;

    let by_role: Vec<(String, i64)> =
        sqlx::query_as("SELECT role, COUNT(*) FROM users GROUP BY role")
            .fetch_all(&state.db)
            .await?;
    let count_role = |role: Role| {
        by_role
            .iter()
            .filter(|(r, _)| r.parse::<Role>().ok() == Some(role))
            .map(|(_, n)| n)
            .sum::<i64>()
    };

    let (total_jobs, open_jobs): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), CAST(COALESCE(SUM(status = 'open'), 0) AS SIGNED) FROM jobs",
    )
    .fetch_one(&state.db)
    .await?;
    let (total_applications, hires): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), CAST(COALESCE(SUM(status = 'hired'), 0) AS SIGNED) FROM applications",
    )
    .fetch_one(&state.db)
    .await?;

    Ok(Json(PlatformStats {
        total_users: by_role.iter().map(|(_, n)| n).sum(),
        students: count_role(Role::Student),
        recruiters: count_role(Role::Recruiter),
        admins: count_role(Role::Admin),
        total_jobs,
        open_jobs,
        total_applications,
        hires,
    }))
}
