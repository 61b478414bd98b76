//! Candidate insights for recruiters. Every value is derived from stored rows.

use serde::Serialize;

use crate::ai::matching::{build_recommendation, MatchReport};
use crate::models::skill::{Proficiency, UserSkillRow};

const DETAILED_COVER_LETTER_CHARS: usize = 200;
const SUBSTANTIAL_PORTFOLIO: i64 = 3;
const WELL_REVIEWED: f64 = 4.0;

pub struct InsightInput<'a> {
    pub candidate_name: &'a str,
    pub job_title: &'a str,
    pub report: MatchReport,
    pub held: &'a [UserSkillRow],
    pub cover_letter: Option<&'a str>,
    pub portfolio_count: i64,
    pub average_rating: Option<f64>,
    pub review_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateInsights {
    pub match_score: u32,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub portfolio_count: i64,
    pub average_rating: Option<f64>,
    pub recommendation: String,
    pub summary: String,
}

pub fn build_insights(input: InsightInput<'_>) -> CandidateInsights {
    let mut strengths = Vec::new();
    let mut concerns = Vec::new();

    for held in input.held {
        if !input.report.matched_skills.contains(&held.name) {
            continue;
        }
        match held.proficiency() {
            Proficiency::Advanced => strengths.push(format!("Advanced proficiency in {}", held.name)),
            Proficiency::Beginner => concerns.push(format!("Only beginner-level {}", held.name)),
            Proficiency::Intermediate => {}
        }
    }

    for missing in &input.report.missing_skills {
        concerns.push(format!("No listed experience with {missing}"));
    }

    if input.portfolio_count >= SUBSTANTIAL_PORTFOLIO {
        strengths.push(format!(
            "Substantial portfolio ({} projects)",
            input.portfolio_count
        ));
    } else if input.portfolio_count == 0 {
        concerns.push("No portfolio items".to_string());
    }

    if let Some(avg) = input.average_rating.filter(|a| *a >= WELL_REVIEWED) {
        strengths.push(format!(
            "Well reviewed ({avg:.1}/5 over {} reviews)",
            input.review_count
        ));
    }

    match input.cover_letter.map(str::trim).filter(|c| !c.is_empty()) {
        Some(letter) if letter.chars().count() >= DETAILED_COVER_LETTER_CHARS => {
            strengths.push("Detailed cover letter".to_string())
        }
        Some(_) => {}
        None => concerns.push("No cover letter provided".to_string()),
    }

    let score = input.report.score;
    let recommendation = build_recommendation(score, &input.report.missing_skills);
    let summary = format!(
        "{} covers {}% of the weighted skill requirements for {} ({} of {} required skills held). {} strength(s), {} concern(s).",
        input.candidate_name,
        score,
        input.job_title,
        input.report.matched_skills.len(),
        input.report.matched_skills.len() + input.report.missing_skills.len(),
        strengths.len(),
        concerns.len(),
    );

    CandidateInsights {
        match_score: score,
        matched_skills: input.report.matched_skills,
        missing_skills: input.report.missing_skills,
        strengths,
        concerns,
        portfolio_count: input.portfolio_count,
        average_rating: input.average_rating,
        recommendation,
        summary,
    }
}
