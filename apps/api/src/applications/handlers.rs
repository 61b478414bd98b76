//! Axum route handlers for the Applications API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;

use crate::applications::status::{check_withdrawable, plan_status_update};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::queries::get_job;
use crate::models::application::{
    ApplicantRow, ApplicationRow, HiringDetails, StudentApplicationRow,
};
use crate::models::job::JobRow;
use crate::models::user::Role;
use crate::notifications::fanout::{display_name, notify, NotificationTemplate};
use crate::skills::queries::get_job_skills;
use crate::state::AppState;
use crate::users::queries::get_user_skills;

const DUPLICATE_APPLICATION: &str = "You have already applied to this job";
const MAX_COVER_LETTER_CHARS: usize = 5000;

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub job_id: i64,
    pub cover_letter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
    #[serde(rename = "hiringDetails", alias = "hiring_details")]
    pub hiring_details: Option<HiringDetails>,
}

pub async fn get_application(
    pool: &MySqlPool,
    application_id: i64,
) -> Result<Option<ApplicationRow>, sqlx::Error> {
    sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = ?")
        .bind(application_id)
        .fetch_optional(pool)
        .await
}

async fn load_job(pool: &MySqlPool, job_id: i64) -> Result<JobRow, AppError> {
    get_job(pool, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}

/// POST /api/applications
///
/// Duplicate submissions are caught by a pre-check and, for concurrent
/// requests that both pass it, by the (job_id, student_id) unique key.
pub async fn handle_apply(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<ApplicationRow>), AppError> {
    auth.require_role(&[Role::Student])?;

    let cover_letter = req
        .cover_letter
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    if cover_letter.is_some_and(|c| c.chars().count() > MAX_COVER_LETTER_CHARS) {
        return Err(AppError::Validation(format!(
            "Cover letter must be at most {MAX_COVER_LETTER_CHARS} characters"
        )));
    }

    let job = load_job(&state.db, req.job_id).await?;
    if !job.is_open() {
        return Err(AppError::Validation(
            "This job is no longer accepting applications".to_string(),
        ));
    }

    let already_applied = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM applications WHERE job_id = ? AND student_id = ?",
    )
    .bind(job.id)
    .bind(auth.id)
    .fetch_one(&state.db)
    .await?;
    if already_applied > 0 {
        return Err(AppError::Validation(DUPLICATE_APPLICATION.to_string()));
    }

    let required = get_job_skills(&state.db, job.id).await?;
    let held = get_user_skills(&state.db, auth.id).await?;
    let report = state.application_scorer.score(&required, &held);

    let result = sqlx::query(
        "INSERT INTO applications (job_id, student_id, cover_letter, ai_match_score) VALUES (?, ?, ?, ?)",
    )
    .bind(job.id)
    .bind(auth.id)
    .bind(cover_letter)
    .bind(report.score as i32)
    .execute(&state.db)
    .await
    .map_err(|e| AppError::on_duplicate(e, DUPLICATE_APPLICATION))?;
    let application_id = result.last_insert_id() as i64;

    info!(
        "Student {} applied to job {} (application {application_id}, match {}%)",
        auth.id, job.id, report.score
    );

    let student_name = display_name(&state.db, auth.id, "A student").await;
    notify(
        &state.db,
        job.posted_by,
        NotificationTemplate::application_received(job.id, &job.title, &student_name),
    );

    let application = get_application(&state.db, application_id)
        .await?
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "Application {application_id} vanished after insert"
            ))
        })?;
    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/applications/mine
pub async fn handle_mine(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<StudentApplicationRow>>, AppError> {
    auth.require_role(&[Role::Student])?;
    let rows = sqlx::query_as::<_, StudentApplicationRow>(
        r#"
        SELECT a.id, a.job_id, j.title AS job_title, j.company, a.status,
               a.ai_match_score, a.hired_at, a.created_at
        FROM applications a
        JOIN jobs j ON j.id = a.job_id
        WHERE a.student_id = ?
        ORDER BY a.created_at DESC
        "#,
    )
    .bind(auth.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

/// GET /api/applications/job/:job_id
pub async fn handle_for_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<i64>,
) -> Result<Json<Vec<ApplicantRow>>, AppError> {
    auth.require_role(&[Role::Recruiter, Role::Admin])?;
    let job = load_job(&state.db, job_id).await?;
    if !auth.is_admin() && job.posted_by != auth.id {
        return Err(AppError::Forbidden(
            "You can only view applications for your own jobs".to_string(),
        ));
    }

    let rows = sqlx::query_as::<_, ApplicantRow>(
        r#"
        SELECT a.id, a.student_id, u.name AS student_name, u.email AS student_email,
               a.cover_letter, a.status, a.ai_match_score, a.created_at
        FROM applications a
        JOIN users u ON u.id = a.student_id
        WHERE a.job_id = ?
        ORDER BY a.ai_match_score DESC, a.created_at ASC
        "#,
    )
    .bind(job_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

/// GET /api/applications/:id
pub async fn handle_get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(application_id): Path<i64>,
) -> Result<Json<ApplicationRow>, AppError> {
    let application = get_application(&state.db, application_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;

    if application.student_id != auth.id && !auth.is_admin() {
        let job = load_job(&state.db, application.job_id).await?;
        if job.posted_by != auth.id {
            return Err(AppError::Forbidden(
                "You do not have access to this application".to_string(),
            ));
        }
    }
    Ok(Json(application))
}

/// PUT /api/applications/:id/status
///
/// Only the targeted row changes; other applications to the same job keep
/// their status.
pub async fn handle_update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(application_id): Path<i64>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<ApplicationRow>, AppError> {
    auth.require_role(&[Role::Recruiter])?;
    let update = plan_status_update(&req.status, req.hiring_details, Utc::now())?;

    let application = get_application(&state.db, application_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;
    let job = load_job(&state.db, application.job_id).await?;
    if job.posted_by != auth.id {
        return Err(AppError::Forbidden(
            "You can only update applications for your own jobs".to_string(),
        ));
    }

    match &update.hiring {
        Some(hiring) => {
            sqlx::query(
                r#"
                UPDATE applications
                SET status = ?, start_date = ?, salary = ?, contract_type = ?,
                    offer_letter = ?, hired_at = ?
                WHERE id = ?
                "#,
            )
            .bind(update.status.as_str())
            .bind(hiring.details.start_date)
            .bind(&hiring.details.salary)
            .bind(&hiring.details.contract_type)
            .bind(&hiring.details.offer_letter)
            .bind(hiring.hired_at)
            .bind(application_id)
            .execute(&state.db)
            .await?;
        }
        None => {
            sqlx::query("UPDATE applications SET status = ? WHERE id = ?")
                .bind(update.status.as_str())
                .bind(application_id)
                .execute(&state.db)
                .await?;
        }
    }

    info!(
        "Recruiter {} set application {application_id} to {}",
        auth.id,
        update.status.as_str()
    );

    notify(
        &state.db,
        application.student_id,
        NotificationTemplate::status_changed(application_id, &job.title, update.status),
    );

    let updated = get_application(&state.db, application_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;
    Ok(Json(updated))
}

/// DELETE /api/applications/:id
///
/// Withdraws an application. Only allowed while it is still pending.
pub async fn handle_withdraw(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(application_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    auth.require_role(&[Role::Student])?;

    let stored = get_application(&state.db, application_id).await?;
    check_withdrawable(application_id, stored.as_ref(), auth.id)?;

    // The status guard covers a recruiter moving the application on between
    // the check above and this delete.
    let result = sqlx::query("DELETE FROM applications WHERE id = ? AND status = 'pending'")
        .bind(application_id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::Validation(
            "Only pending applications can be withdrawn".to_string(),
        ));
    }

    info!("Student {} withdrew application {application_id}", auth.id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_request_reads_camel_case_hiring_details() {
        let req: StatusRequest = serde_json::from_str(
            r#"{"status":"hired","hiringDetails":{"start_date":"2025-01-06","salary":"50k"}}"#,
        )
        .unwrap();
        assert_eq!(req.status, "hired");
        assert_eq!(req.hiring_details.unwrap().salary.as_deref(), Some("50k"));
    }

    #[test]
    fn test_status_request_reads_snake_case_alias() {
        let req: StatusRequest = serde_json::from_str(
            r#"{"status":"hired","hiring_details":{"contract_type":"internship"}}"#,
        )
        .unwrap();
        assert_eq!(
            req.hiring_details.unwrap().contract_type.as_deref(),
            Some("internship")
        );
    }

    #[test]
    fn test_status_request_without_details() {
        let req: StatusRequest = serde_json::from_str(r#"{"status":"reviewed"}"#).unwrap();
        assert!(req.hiring_details.is_none());
    }
}
