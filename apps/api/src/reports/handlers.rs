//! Aggregated hiring reports for recruiters and admins.

use std::collections::{BTreeMap, HashMap};

use axum::{extract::State, Json};
use serde::Serialize;
use sqlx::FromRow;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::application::ApplicationStatus;
use crate::models::user::Role;
use crate::state::AppState;

const TOP_SKILLS: i64 = 10;

#[derive(Debug, Clone, FromRow)]
struct OwnJob {
    id: i64,
    title: String,
    status: String,
}

/// One `(job, status)` bucket of applications.
#[derive(Debug, Clone, FromRow)]
struct StatusBucket {
    job_id: i64,
    status: String,
    applications: i64,
    score_sum: i64,
    scored: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job_id: i64,
    pub title: String,
    pub status: String,
    pub total_applications: i64,
    pub by_status: BTreeMap<&'static str, i64>,
    pub average_match_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SkillCount {
    pub skill_id: i64,
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct PlatformReport {
    pub applications_by_status: BTreeMap<&'static str, i64>,
    pub top_demanded_skills: Vec<SkillCount>,
    pub top_student_skills: Vec<SkillCount>,
}

/// Every status present with a zero count.
fn empty_status_counts() -> BTreeMap<&'static str, i64> {
    ApplicationStatus::ALL
        .into_iter()
        .map(|s| (s.as_str(), 0))
        .collect()
}

/// Folds status buckets into one report per job, keeping job order.
/// Buckets with an unknown status still count toward the total.
fn build_job_reports(jobs: Vec<OwnJob>, buckets: &[StatusBucket]) -> Vec<JobReport> {
    let mut by_job: HashMap<i64, Vec<&StatusBucket>> = HashMap::new();
    for bucket in buckets {
        by_job.entry(bucket.job_id).or_default().push(bucket);
    }

    jobs.into_iter()
        .map(|job| {
            let mut by_status = empty_status_counts();
            let (mut total, mut score_sum, mut scored) = (0, 0, 0);
            for bucket in by_job.get(&job.id).into_iter().flatten() {
                total += bucket.applications;
                score_sum += bucket.score_sum;
                scored += bucket.scored;
                if let Ok(status) = bucket.status.parse::<ApplicationStatus>() {
                    *by_status.entry(status.as_str()).or_insert(0) += bucket.applications;
                }
            }
            let average_match_score = (scored > 0)
                .then(|| (score_sum as f64 / scored as f64 * 10.0).round() / 10.0);
            JobReport {
                job_id: job.id,
                title: job.title,
                status: job.status,
                total_applications: total,
                by_status,
                average_match_score,
            }
        })
        .collect()
}

/// GET /api/reports/recruiter
pub async fn handle_recruiter(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<JobReport>>, AppError> {
    auth.require_role(&[Role::Recruiter])?;

    let jobs = sqlx::query_as::<_, OwnJob>(
        "SELECT id, title, status FROM jobs WHERE posted_by = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(auth.id)
    .fetch_all(&state.db)
    .await?;

    let buckets = sqlx::query_as::<_, StatusBucket>(
        r#"
        SELECT a.job_id, a.status,
               COUNT(*) AS applications,
               CAST(COALESCE(SUM(a.ai_match_score), 0) AS SIGNED) AS score_sum,
               COUNT(a.ai_match_score) AS scored
        FROM applications a
        JOIN jobs j ON j.id = a.job_id
        WHERE j.posted_by = ?
        GROUP BY a.job_id, a.status
        "#,
    )
    .bind(auth.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(build_job_reports(jobs, &buckets)))
}

/// GET /api/reports/platform
pub async fn handle_platform(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<PlatformReport>, AppError> {
    auth.require_role(&[Role::Admin])?;

    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM applications GROUP BY status")
            .fetch_all(&state.db)
            .await?;
    let mut applications_by_status = empty_status_counts();
    for (status, count) in rows {
        if let Ok(status) = status.parse::<ApplicationStatus>() {
            applications_by_status.insert(status.as_str(), count);
        }
    }

    let top_demanded_skills = sqlx::query_as::<_, SkillCount>(
        r#"
        SELECT s.id AS skill_id, s.name, COUNT(*) AS count
        FROM job_skills js JOIN skills s ON s.id = js.skill_id
        GROUP BY s.id, s.name
        ORDER BY count DESC, s.name ASC
        LIMIT ?
        "#,
    )
    .bind(TOP_SKILLS)
    .fetch_all(&state.db)
    .await?;

    let top_student_skills = sqlx::query_as::<_, SkillCount>(
        r#"
        SELECT s.id AS skill_id, s.name, COUNT(*) AS count
        FROM user_skills us
        JOIN skills s ON s.id = us.skill_id
        JOIN users u ON u.id = us.user_id
        WHERE u.role = 'student'
        GROUP BY s.id, s.name
        ORDER BY count DESC, s.name ASC
        LIMIT ?
        "#,
    )
    .bind(TOP_SKILLS)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(PlatformReport {
        applications_by_status,
        top_demanded_skills,
        top_student_skills,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: i64) -> OwnJob {
        OwnJob {
            id,
            title: format!("Job {id}"),
            status: "open".to_string(),
        }
    }

    fn bucket(job_id: i64, status: &str, applications: i64, score_sum: i64, scored: i64) -> StatusBucket {
        StatusBucket {
            job_id,
            status: status.to_string(),
            applications,
            score_sum,
            scored,
        }
    }

    #[test]
    fn test_job_without_applications_reports_zeroes() {
        let reports = build_job_reports(vec![job(1)], &[]);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].total_applications, 0);
        assert_eq!(reports[0].average_match_score, None);
        assert_eq!(reports[0].by_status.len(), ApplicationStatus::ALL.len());
        assert!(reports[0].by_status.values().all(|&n| n == 0));
    }

    #[test]
    fn test_buckets_are_folded_per_job() {
        let buckets = vec![
            bucket(1, "pending", 2, 150, 2),
            bucket(1, "hired", 1, 90, 1),
            bucket(2, "rejected", 3, 0, 0),
        ];
        let reports = build_job_reports(vec![job(1), job(2)], &buckets);

        assert_eq!(reports[0].total_applications, 3);
        assert_eq!(reports[0].by_status["pending"], 2);
        assert_eq!(reports[0].by_status["hired"], 1);
        assert_eq!(reports[0].average_match_score, Some(80.0));

        assert_eq!(reports[1].total_applications, 3);
        assert_eq!(reports[1].by_status["rejected"], 3);
        assert_eq!(reports[1].average_match_score, None);
    }

    #[test]
    fn test_average_is_rounded_to_one_decimal() {
        let buckets = vec![bucket(1, "pending", 3, 200, 3)];
        let reports = build_job_reports(vec![job(1)], &buckets);
        assert_eq!(reports[0].average_match_score, Some(66.7));
    }
}
