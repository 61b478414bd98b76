//! Axum route handlers for the Jobs API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::queries::{get_job, get_job_detail, list_jobs, list_saved_jobs, JobFilters};
use crate::models::job::{normalize_job_type, JobDetail, JobRow, JobStatus, RecruiterJobRow};
use crate::models::user::Role;
use crate::models::Pagination;
use crate::notifications::fanout::{notify_matching_students, NotificationTemplate};
use crate::skills::queries::{resolve_skill_ids, SkillRef};
use crate::state::AppState;
use crate::users::queries::find_by_id;

const MAX_TITLE_LEN: usize = 200;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct JobListQuery {
    pub search: Option<String>,
    pub job_type: Option<String>,
    pub location: Option<String>,
    pub skill: Option<String>,
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobDetail>,
    pub total: i64,
    pub page: u32,
    pub limit: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub description: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub salary: Option<String>,
    pub experience_level: Option<String>,
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub skills: Vec<SkillRef>,
}

/// Partial job update. Nullable columns distinguish an absent key (keep) from
/// an explicit `null` (clear).
#[derive(Debug, Default, Deserialize)]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub company: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub location: Option<Option<String>>,
    pub job_type: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub salary: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub experience_level: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub deadline: Option<Option<NaiveDate>>,
    pub status: Option<String>,
    pub skills: Option<Vec<SkillRef>>,
}

/// Marks a key that appeared in the body, even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// `(key present, new value)` binds for `col = IF(?, ?, col)`. Blank strings
/// clear the column.
fn nullable_text(field: &Option<Option<String>>) -> (bool, Option<String>) {
    match field {
        Some(value) => (true, non_blank(value.as_deref())),
        None => (false, None),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Validation
// ────────────────────────────────────────────────────────────────────────────

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn validate_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::Validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title.to_string())
}

fn validate_job_type(raw: &str) -> Result<&'static str, AppError> {
    normalize_job_type(raw).ok_or_else(|| {
        AppError::Validation(format!(
            "Invalid job type '{raw}'. Expected full-time, part-time, internship, contract or freelance"
        ))
    })
}

fn build_filters(params: &JobListQuery) -> Result<JobFilters, AppError> {
    let job_type = match non_blank(params.job_type.as_deref()) {
        Some(raw) => Some(validate_job_type(&raw)?),
        None => None,
    };
    let status = match non_blank(params.status.as_deref()).as_deref() {
        None => Some(JobStatus::Open.as_str()),
        Some("all") => None,
        Some(raw) => Some(raw.parse::<JobStatus>().map_err(AppError::Validation)?.as_str()),
    };
    Ok(JobFilters {
        search: non_blank(params.search.as_deref()),
        job_type,
        location: non_blank(params.location.as_deref()),
        skill: non_blank(params.skill.as_deref()),
        status,
        posted_by: None,
        skill_overlap: None,
    })
}

/// Loads a job and checks that `auth` posted it.
async fn load_owned_job(state: &AppState, auth: &AuthUser, job_id: i64) -> Result<JobRow, AppError> {
    let job = get_job(&state.db, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    if job.posted_by != auth.id {
        return Err(AppError::Forbidden("You can only manage your own jobs".to_string()));
    }
    Ok(job)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/jobs
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<JobListQuery>,
) -> Result<Json<JobListResponse>, AppError> {
    let filters = build_filters(&params)?;
    let pagination = Pagination {
        page: params.page,
        limit: params.limit,
    };
    let (limit, offset) = pagination.limit_offset(20, 100);
    let (jobs, total) = list_jobs(&state.db, &filters, limit, offset).await?;

    Ok(Json(JobListResponse {
        jobs,
        total,
        page: params.page.unwrap_or(1).max(1),
        limit,
    }))
}

/// GET /api/jobs/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
) -> Result<Json<JobDetail>, AppError> {
    let job = get_job_detail(&state.db, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    Ok(Json(job))
}

/// POST /api/jobs
///
/// Inserts the job and its skill links in one transaction, then notifies
/// students who hold any of the job's skills.
pub async fn handle_create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobDetail>), AppError> {
    auth.require_role(&[Role::Recruiter])?;

    let title = validate_title(&req.title)?;
    let description = req.description.trim();
    if description.is_empty() {
        return Err(AppError::Validation("Description is required".to_string()));
    }
    let job_type = match non_blank(req.job_type.as_deref()) {
        Some(raw) => validate_job_type(&raw)?,
        None => "full-time",
    };

    let company = match non_blank(req.company.as_deref()) {
        Some(company) => Some(company),
        None => find_by_id(&state.db, auth.id)
            .await?
            .and_then(|u| u.company_name),
    };

    let mut tx = state.db.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO jobs
            (posted_by, title, description, company, location, job_type, salary, experience_level, deadline)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.id)
    .bind(&title)
    .bind(description)
    .bind(&company)
    .bind(non_blank(req.location.as_deref()))
    .bind(job_type)
    .bind(non_blank(req.salary.as_deref()))
    .bind(non_blank(req.experience_level.as_deref()))
    .bind(req.deadline)
    .execute(&mut *tx)
    .await?;
    let job_id = result.last_insert_id() as i64;

    let skill_ids = resolve_skill_ids(&mut tx, &req.skills).await?;
    for skill_id in &skill_ids {
        sqlx::query("INSERT INTO job_skills (job_id, skill_id) VALUES (?, ?)")
            .bind(job_id)
            .bind(skill_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    info!(
        "Recruiter {} posted job {job_id} with {} skills",
        auth.id,
        skill_ids.len()
    );

    notify_matching_students(
        &state.db,
        job_id,
        auth.id,
        NotificationTemplate::job_posted(job_id, &title, company.as_deref()),
    );

    let job = get_job_detail(&state.db, job_id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Job {job_id} vanished after insert")))?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// PUT /api/jobs/:id
pub async fn handle_update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<i64>,
    Json(req): Json<UpdateJobRequest>,
) -> Result<Json<JobDetail>, AppError> {
    auth.require_role(&[Role::Recruiter])?;
    load_owned_job(&state, &auth, job_id).await?;

    let title = req.title.as_deref().map(validate_title).transpose()?;
    let job_type = non_blank(req.job_type.as_deref())
        .map(|raw| validate_job_type(&raw))
        .transpose()?;
    let status = non_blank(req.status.as_deref())
        .map(|raw| raw.parse::<JobStatus>().map_err(AppError::Validation))
        .transpose()?
        .map(|s| s.as_str());
    let description = non_blank(req.description.as_deref());
    let company = nullable_text(&req.company);
    let location = nullable_text(&req.location);
    let salary = nullable_text(&req.salary);
    let experience_level = nullable_text(&req.experience_level);

    let mut tx = state.db.begin().await?;

    sqlx::query(
        r#"
        UPDATE jobs SET
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            company = IF(?, ?, company),
            location = IF(?, ?, location),
            job_type = COALESCE(?, job_type),
            salary = IF(?, ?, salary),
            experience_level = IF(?, ?, experience_level),
            deadline = IF(?, ?, deadline),
            status = COALESCE(?, status)
        WHERE id = ?
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(company.0)
    .bind(company.1)
    .bind(location.0)
    .bind(location.1)
    .bind(job_type)
    .bind(salary.0)
    .bind(salary.1)
    .bind(experience_level.0)
    .bind(experience_level.1)
    .bind(req.deadline.is_some())
    .bind(req.deadline.flatten())
    .bind(status)
    .bind(job_id)
    .execute(&mut *tx)
    .await?;

    if let Some(skills) = &req.skills {
        let skill_ids = resolve_skill_ids(&mut tx, skills).await?;
        sqlx::query("DELETE FROM job_skills WHERE job_id = ?")
            .bind(job_id)
            .execute(&mut *tx)
            .await?;
        for skill_id in &skill_ids {
            sqlx::query("INSERT INTO job_skills (job_id, skill_id) VALUES (?, ?)")
                .bind(job_id)
                .bind(skill_id)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;
    info!("Recruiter {} updated job {job_id}", auth.id);

    let job = get_job_detail(&state.db, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    Ok(Json(job))
}

/// DELETE /api/jobs/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    auth.require_role(&[Role::Recruiter, Role::Admin])?;
    if !auth.is_admin() {
        load_owned_job(&state, &auth, job_id).await?;
    }

    let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
        .bind(job_id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }

    info!("User {} deleted job {job_id}", auth.id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/jobs/mine
pub async fn handle_mine(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<RecruiterJobRow>>, AppError> {
    auth.require_role(&[Role::Recruiter])?;
    let rows = sqlx::query_as::<_, RecruiterJobRow>(
        r#"
        SELECT j.id, j.title, j.status, j.job_type, j.created_at,
               COUNT(a.id) AS application_count
        FROM jobs j
        LEFT JOIN applications a ON a.job_id = j.id
        WHERE j.posted_by = ?
        GROUP BY j.id, j.title, j.status, j.job_type, j.created_at
        ORDER BY j.created_at DESC
        "#,
    )
    .bind(auth.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

/// POST /api/jobs/:id/save
pub async fn handle_save(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    auth.require_role(&[Role::Student])?;
    if get_job(&state.db, job_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }
    sqlx::query("INSERT IGNORE INTO saved_jobs (user_id, job_id) VALUES (?, ?)")
        .bind(auth.id)
        .bind(job_id)
        .execute(&state.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/jobs/:id/save
pub async fn handle_unsave(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    auth.require_role(&[Role::Student])?;
    sqlx::query("DELETE FROM saved_jobs WHERE user_id = ? AND job_id = ?")
        .bind(auth.id)
        .bind(job_id)
        .execute(&state.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/jobs/saved
pub async fn handle_saved(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<JobDetail>>, AppError> {
    auth.require_role(&[Role::Student])?;
    let jobs = list_saved_jobs(&state.db, auth.id).await?;
    Ok(Json(jobs))
}
