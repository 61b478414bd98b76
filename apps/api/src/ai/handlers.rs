//! Axum route handlers for the AI API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::ai::insights::{build_insights, CandidateInsights, InsightInput};
use crate::ai::matching::{MatchReport, MatchScorer};
use crate::ai::proposal::{build_prompt, render_template, Length, ProposalContext, Tone};
use crate::applications::handlers::get_application;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::queries::{
    get_job, get_job_detail, list_all_jobs, list_jobs, JobFilters, SkillOverlap,
};
use crate::models::job::{JobDetail, JobStatus};
use crate::models::skill::UserSkillRow;
use crate::models::user::Role;
use crate::skills::queries::get_job_skills;
use crate::state::AppState;
use crate::users::queries::{find_by_id, get_user_skills, portfolio_count, rating_summary};

const DEFAULT_RECOMMENDATIONS: u32 = 10;
const MAX_RECOMMENDATIONS: u32 = 50;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProposalRequest {
    pub job_id: i64,
    pub tone: Option<String>,
    pub length: Option<String>,
    #[serde(default)]
    pub use_llm: bool,
}

#[derive(Debug, Serialize)]
pub struct ProposalResponse {
    pub proposal: String,
    pub source: &'static str,
    pub tone: Tone,
    pub match_score: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecommendationQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub job: JobDetail,
    pub match_score: u32,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/ai/match/:job_id
///
/// Skill overlap between the calling student and a job.
pub async fn handle_match(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<i64>,
) -> Result<Json<MatchReport>, AppError> {
    auth.require_role(&[Role::Student])?;
    if get_job(&state.db, job_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }

    let required = get_job_skills(&state.db, job_id).await?;
    let held = get_user_skills(&state.db, auth.id).await?;
    Ok(Json(state.lookup_scorer.score(&required, &held)))
}

/// POST /api/ai/proposal
///
/// Template text unless `use_llm` is set and an LLM is configured. Any LLM
/// failure degrades to the template text.
pub async fn handle_proposal(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ProposalRequest>,
) -> Result<Json<ProposalResponse>, AppError> {
    auth.require_role(&[Role::Student])?;
    let tone = req
        .tone
        .as_deref()
        .map(str::parse::<Tone>)
        .transpose()
        .map_err(AppError::Validation)?;
    let length = req
        .length
        .as_deref()
        .map(str::parse::<Length>)
        .transpose()
        .map_err(AppError::Validation)?
        .unwrap_or_default();
    let tone = Tone::pick(tone);

    let job = get_job_detail(&state.db, req.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", req.job_id)))?;
    let student = find_by_id(&state.db, auth.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;
    let held = get_user_skills(&state.db, auth.id).await?;
    let report = state.lookup_scorer.score(&job.skills, &held);

    let ctx = ProposalContext {
        candidate_name: student.name,
        job_title: job.job.title.clone(),
        company: job.job.company.clone(),
        job_description: job.job.description.clone(),
        other_skills: other_skills(&held, &report),
        matched_skills: report.matched_skills,
    };

    let llm_text = match (&state.llm, req.use_llm) {
        (Some(llm), true) => {
            let (prompt, system) = build_prompt(&ctx, tone, length);
            match llm.complete(&prompt, &system).await {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!("Proposal LLM call failed for job {}, using template: {e}", req.job_id);
                    None
                }
            }
        }
        (None, true) => {
            warn!("Proposal requested LLM output but no API key is configured");
            None
        }
        _ => None,
    };

    let (proposal, source) = match llm_text {
        Some(text) => (text, "ai"),
        None => (render_template(&ctx, tone, length), "template"),
    };

    info!(
        "Generated {source} proposal for user {} and job {} ({} tone)",
        auth.id,
        req.job_id,
        tone.as_str()
    );
    Ok(Json(ProposalResponse {
        proposal,
        source,
        tone,
        match_score: report.score,
    }))
}

/// GET /api/ai/insights/:application_id
///
/// Recruiter-facing summary of one applicant, for the job's owner or an admin.
pub async fn handle_insights(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(application_id): Path<i64>,
) -> Result<Json<CandidateInsights>, AppError> {
    auth.require_role(&[Role::Recruiter, Role::Admin])?;
    let application = get_application(&state.db, application_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;
    let job = get_job(&state.db, application.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", application.job_id)))?;
    if !auth.is_admin() && job.posted_by != auth.id {
        return Err(AppError::Forbidden(
            "You can only view insights for your own jobs".to_string(),
        ));
    }

    let candidate = find_by_id(&state.db, application.student_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", application.student_id)))?;
    let required = get_job_skills(&state.db, job.id).await?;
    let held = get_user_skills(&state.db, candidate.id).await?;
    let report = state.application_scorer.score(&required, &held);
    let portfolio_count = portfolio_count(&state.db, candidate.id).await?;
    let (average_rating, review_count) = rating_summary(&state.db, candidate.id).await?;

    let insights = build_insights(InsightInput {
        candidate_name: &candidate.name,
        job_title: &job.title,
        report,
        held: &held,
        cover_letter: application.cover_letter.as_deref(),
        portfolio_count,
        average_rating,
        review_count,
    });
    Ok(Json(insights))
}

/// GET /api/ai/recommendations
///
/// Open jobs ranked by skill overlap with the calling student.
pub async fn handle_recommendations(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(q): Query<RecommendationQuery>,
) -> Result<Json<Vec<Recommendation>>, AppError> {
    auth.require_role(&[Role::Student])?;
    let limit = q
        .limit
        .unwrap_or(DEFAULT_RECOMMENDATIONS)
        .clamp(1, MAX_RECOMMENDATIONS) as usize;

    let held = get_user_skills(&state.db, auth.id).await?;
    let open_jobs = |overlap| JobFilters {
        status: Some(JobStatus::Open.as_str()),
        skill_overlap: Some(overlap),
        ..JobFilters::default()
    };

    let sharing = list_all_jobs(&state.db, &open_jobs(SkillOverlap::SharesSkillWith(auth.id))).await?;
    let others = if sharing.len() < limit {
        let wanted = (limit - sharing.len()) as i64;
        let filters = open_jobs(SkillOverlap::SharesNoSkillWith(auth.id));
        list_jobs(&state.db, &filters, wanted, 0).await?.0
    } else {
        Vec::new()
    };

    let ranked = rank_recommendations(state.lookup_scorer.as_ref(), &held, sharing, others, limit);
    Ok(Json(ranked))
}

/// Ranks open jobs for a student. Every job in `sharing` requires at least
/// one held skill and so scores above zero; `others` all score zero and only
/// fill the remaining slots. Both lists arrive newest first, and the stable
/// sort keeps that order among equal scores.
fn rank_recommendations(
    scorer: &dyn MatchScorer,
    held: &[UserSkillRow],
    sharing: Vec<JobDetail>,
    others: Vec<JobDetail>,
    limit: usize,
) -> Vec<Recommendation> {
    let score = |job: JobDetail| {
        let report = scorer.score(&job.skills, held);
        Recommendation {
            job,
            match_score: report.score,
            matched_skills: report.matched_skills,
            missing_skills: report.missing_skills,
        }
    };

    let mut ranked: Vec<Recommendation> = sharing.into_iter().map(score).collect();
    ranked.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    ranked.extend(others.into_iter().map(score));
    ranked.truncate(limit);
    ranked
}

/// Held skill names that the job does not ask for.
fn other_skills(held: &[UserSkillRow], report: &MatchReport) -> Vec<String> {
    held.iter()
        .filter(|s| {
            !report
                .matched_skills
                .iter()
                .any(|m| m.eq_ignore_ascii_case(&s.name))
        })
        .map(|s| s.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(name: &str) -> UserSkillRow {
        UserSkillRow {
            skill_id: 1,
            name: name.to_string(),
            category: None,
            proficiency: "Intermediate".to_string(),
        }
    }

    #[test]
    fn test_other_skills_excludes_matched() {
        let report = MatchReport {
            score: 50,
            matched_skills: vec!["Rust".to_string()],
            missing_skills: vec!["Go".to_string()],
            scorer: "overlap".to_string(),
        };
        let others = other_skills(&[held("rust"), held("SQL")], &report);
        assert_eq!(others, vec!["SQL".to_string()]);
    }

    fn job(id: i64, skills: &[&str]) -> JobDetail {
        let now = chrono::Utc::now();
        JobDetail {
            job: crate::models::job::JobRow {
                id,
                posted_by: 1,
                title: format!("Job {id}"),
                description: "Build things".to_string(),
                company: None,
                location: None,
                job_type: "full-time".to_string(),
                salary: None,
                experience_level: None,
                deadline: None,
                status: "open".to_string(),
                created_at: now,
                updated_at: now,
            },
            poster_name: None,
            skills: skills
                .iter()
                .enumerate()
                .map(|(i, name)| crate::models::skill::SkillRow {
                    id: i as i64 + 1,
                    name: name.to_string(),
                    category: None,
                })
                .collect(),
        }
    }

    fn ids(ranked: &[Recommendation]) -> Vec<i64> {
        ranked.iter().map(|r| r.job.job.id).collect()
    }

    #[test]
    fn test_older_full_match_outranks_newer_partial_match() {
        let scorer = crate::ai::matching::OverlapScorer;
        let held = [held("Rust"), held("SQL")];
        // Newest first: job 3 is the newest.
        let sharing = vec![job(3, &["Rust", "Go"]), job(2, &["Rust", "SQL"]), job(1, &["SQL", "Go"])];
        let ranked = rank_recommendations(&scorer, &held, sharing, Vec::new(), 10);
        assert_eq!(ids(&ranked), vec![2, 3, 1]);
        assert_eq!(ranked[0].match_score, 100);
        assert_eq!(ranked[1].match_score, 50);
    }

    #[test]
    fn test_zero_score_jobs_fill_remaining_slots() {
        let scorer = crate::ai::matching::OverlapScorer;
        let held = [held("Rust")];
        let sharing = vec![job(5, &["Rust"])];
        let others = vec![job(9, &["Go"]), job(8, &[]), job(7, &["Java"])];
        let ranked = rank_recommendations(&scorer, &held, sharing, others, 3);
        assert_eq!(ids(&ranked), vec![5, 9, 8]);
        assert!(ranked[1..].iter().all(|r| r.match_score == 0));
    }

    #[test]
    fn test_proposal_request_defaults() {
        let req: ProposalRequest = serde_json::from_str(r#"{"job_id": 7}"#).unwrap();
        assert_eq!(req.job_id, 7);
        assert!(req.tone.is_none());
        assert!(!req.use_llm);
    }
}
