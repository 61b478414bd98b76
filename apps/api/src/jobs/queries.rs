use std::collections::HashMap;

use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};

use crate::errors::AppError;
use crate::models::job::{JobDetail, JobRow};
use crate::models::skill::SkillRow;
use crate::skills::queries::get_job_skills;

/// Filters accepted by the public job listing.
#[derive(Debug, Clone, Default)]
pub struct JobFilters {
    pub search: Option<String>,
    pub job_type: Option<&'static str>,
    pub location: Option<String>,
    pub skill: Option<String>,
    /// `None` lists every status.
    pub status: Option<&'static str>,
    pub posted_by: Option<i64>,
    pub skill_overlap: Option<SkillOverlap>,
}

/// Restricts a listing by whether a job requires any skill the user holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillOverlap {
    SharesSkillWith(i64),
    SharesNoSkillWith(i64),
}

#[derive(Debug, FromRow)]
struct JobWithPosterRow {
    #[sqlx(flatten)]
    job: JobRow,
    poster_name: Option<String>,
}

#[derive(Debug, FromRow)]
struct JobSkillLink {
    job_id: i64,
    id: i64,
    name: String,
    category: Option<String>,
}

pub async fn get_job(pool: &MySqlPool, job_id: i64) -> Result<Option<JobRow>, sqlx::Error> {
    sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = ?")
        .bind(job_id)
        .fetch_optional(pool)
        .await
}

/// Fails with 404 unless `job_id`, when given, names an existing job.
pub async fn ensure_job_exists(pool: &MySqlPool, job_id: Option<i64>) -> Result<(), AppError> {
    let Some(job_id) = job_id else {
        return Ok(());
    };
    match get_job(pool, job_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound(format!("Job {job_id} not found"))),
    }
}

pub async fn get_job_detail(pool: &MySqlPool, job_id: i64) -> Result<Option<JobDetail>, sqlx::Error> {
    let row = sqlx::query_as::<_, JobWithPosterRow>(
        r#"
        SELECT j.*, u.name AS poster_name
        FROM jobs j
        LEFT JOIN users u ON u.id = j.posted_by
        WHERE j.id = ?
        "#,
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let skills = get_job_skills(pool, job_id).await?;
    Ok(Some(JobDetail {
        job: row.job,
        poster_name: row.poster_name,
        skills,
    }))
}

fn push_filters(qb: &mut QueryBuilder<'_, MySql>, filters: &JobFilters) {
    qb.push(" WHERE 1 = 1");
    if let Some(status) = filters.status {
        qb.push(" AND j.status = ").push_bind(status);
    }
    if let Some(job_type) = filters.job_type {
        qb.push(" AND j.job_type = ").push_bind(job_type);
    }
    if let Some(posted_by) = filters.posted_by {
        qb.push(" AND j.posted_by = ").push_bind(posted_by);
    }
    if let Some(search) = &filters.search {
        let pattern = format!("%{search}%");
        qb.push(" AND (j.title LIKE ")
            .push_bind(pattern.clone())
            .push(" OR j.description LIKE ")
            .push_bind(pattern.clone())
            .push(" OR j.company LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(location) = &filters.location {
        qb.push(" AND j.location LIKE ").push_bind(format!("%{location}%"));
    }
    if let Some(skill) = &filters.skill {
        qb.push(
            " AND EXISTS (SELECT 1 FROM job_skills js JOIN skills s ON s.id = js.skill_id \
             WHERE js.job_id = j.id AND s.name = ",
        )
        .push_bind(skill.clone())
        .push(")");
    }
    if let Some(overlap) = filters.skill_overlap {
        let (clause, user_id) = match overlap {
            SkillOverlap::SharesSkillWith(user_id) => (" AND EXISTS", user_id),
            SkillOverlap::SharesNoSkillWith(user_id) => (" AND NOT EXISTS", user_id),
        };
        qb.push(clause)
            .push(
                " (SELECT 1 FROM job_skills js JOIN user_skills us ON us.skill_id = js.skill_id \
                 WHERE js.job_id = j.id AND us.user_id = ",
            )
            .push_bind(user_id)
            .push(")");
    }
}

fn select_jobs(filters: &JobFilters) -> QueryBuilder<'static, MySql> {
    let mut qb = QueryBuilder::<MySql>::new(
        "SELECT j.*, u.name AS poster_name FROM jobs j LEFT JOIN users u ON u.id = j.posted_by",
    );
    push_filters(&mut qb, filters);
    qb.push(" ORDER BY j.created_at DESC, j.id DESC");
    qb
}

/// Lists jobs matching `filters`, newest first, each with its skills.
/// Returns the page and the total number of matching jobs.
pub async fn list_jobs(
    pool: &MySqlPool,
    filters: &JobFilters,
    limit: i64,
    offset: i64,
) -> Result<(Vec<JobDetail>, i64), sqlx::Error> {
    let mut count_qb = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM jobs j");
    push_filters(&mut count_qb, filters);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = select_jobs(filters);
    qb.push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows: Vec<JobWithPosterRow> = qb.build_query_as().fetch_all(pool).await?;
    let jobs = attach_skills(pool, rows).await?;
    Ok((jobs, total))
}

/// Every job matching `filters`, newest first, each with its skills.
pub async fn list_all_jobs(pool: &MySqlPool, filters: &JobFilters) -> Result<Vec<JobDetail>, sqlx::Error> {
    let mut qb = select_jobs(filters);
    let rows: Vec<JobWithPosterRow> = qb.build_query_as().fetch_all(pool).await?;
    attach_skills(pool, rows).await
}

/// Jobs a user has saved, most recently saved first.
pub async fn list_saved_jobs(pool: &MySqlPool, user_id: i64) -> Result<Vec<JobDetail>, sqlx::Error> {
    let rows = sqlx::query_as::<_, JobWithPosterRow>(
        r#"
        SELECT j.*, u.name AS poster_name
        FROM saved_jobs sj
        JOIN jobs j ON j.id = sj.job_id
        LEFT JOIN users u ON u.id = j.posted_by
        WHERE sj.user_id = ?
        ORDER BY sj.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    attach_skills(pool, rows).await
}

/// Loads skills for a batch of jobs in one query.
async fn attach_skills(
    pool: &MySqlPool,
    rows: Vec<JobWithPosterRow>,
) -> Result<Vec<JobDetail>, sqlx::Error> {
    let job_ids: Vec<i64> = rows.iter().map(|r| r.job.id).collect();
    let mut skills_by_job = get_skills_for_jobs(pool, &job_ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| JobDetail {
            skills: skills_by_job.remove(&row.job.id).unwrap_or_default(),
            poster_name: row.poster_name,
            job: row.job,
        })
        .collect())
}

/// Skills for each of `job_ids`, keyed by job id.
pub async fn get_skills_for_jobs(
    pool: &MySqlPool,
    job_ids: &[i64],
) -> Result<HashMap<i64, Vec<SkillRow>>, sqlx::Error> {
    let mut by_job: HashMap<i64, Vec<SkillRow>> = HashMap::new();
    if job_ids.is_empty() {
        return Ok(by_job);
    }

    let mut qb = QueryBuilder::<MySql>::new(
        "SELECT js.job_id, s.id, s.name, s.category FROM job_skills js \
         JOIN skills s ON s.id = js.skill_id WHERE js.job_id IN (",
    );
    let mut separated = qb.separated(", ");
    for id in job_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY s.name");

    let links: Vec<JobSkillLink> = qb.build_query_as().fetch_all(pool).await?;
    for link in links {
        by_job.entry(link.job_id).or_default().push(SkillRow {
            id: link.id,
            name: link.name,
            category: link.category,
        });
    }
    Ok(by_job)
}

/// Students holding at least one of the job's skills, excluding `exclude_user`.
pub async fn students_matching_job(
    pool: &MySqlPool,
    job_id: i64,
    exclude_user: i64,
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT DISTINCT us.user_id
        FROM user_skills us
        JOIN users u ON u.id = us.user_id
        WHERE u.role = 'student'
          AND us.user_id <> ?
          AND us.skill_id IN (SELECT skill_id FROM job_skills WHERE job_id = ?)
        "#,
    )
    .bind(exclude_user)
    .bind(job_id)
    .fetch_all(pool)
    .await
}
