//! Match scoring: how well a candidate's stored skills cover a job's required skills.
//!
//! Two scorers share the `MatchScorer` trait:
//! - `ProficiencyScorer` weights each held skill by proficiency tier. Used when
//!   an application is submitted; the result is stored as `ai_match_score`.
//! - `OverlapScorer` is an unweighted name-overlap percentage. Used by the
//!   match lookup and job recommendations.
//!
//! `AppState` carries one `Arc<dyn MatchScorer>` per path.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::skill::{SkillRow, UserSkillRow};

/// Result of scoring one candidate against one job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchReport {
    /// 0 – 100, never NaN.
    pub score: u32,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub scorer: String, // "proficiency" | "overlap"
}

pub trait MatchScorer: Send + Sync {
    fn score(&self, required: &[SkillRow], held: &[UserSkillRow]) -> MatchReport;
}

/// Beginner=1, Intermediate=2, Advanced=3 points per required skill held,
/// over a maximum of 3 per required skill. No required skills scores 100.
pub struct ProficiencyScorer;

impl MatchScorer for ProficiencyScorer {
    fn score(&self, required: &[SkillRow], held: &[UserSkillRow]) -> MatchReport {
        let held_by_id: HashMap<i64, &UserSkillRow> =
            held.iter().map(|s| (s.skill_id, s)).collect();

        let mut matched_skills = Vec::new();
        let mut missing_skills = Vec::new();
        let mut obtained = 0_u32;

        for skill in required {
            match held_by_id.get(&skill.id) {
                Some(held_skill) => {
                    obtained += held_skill.proficiency().points();
                    matched_skills.push(skill.name.clone());
                }
                None => missing_skills.push(skill.name.clone()),
            }
        }

        let total = 3 * required.len() as u32;
        let score = if total == 0 {
            100
        } else {
            percentage(obtained, total)
        };

        MatchReport {
            score,
            matched_skills,
            missing_skills,
            scorer: "proficiency".to_string(),
        }
    }
}

/// Percentage of required skill names the candidate holds, case-insensitive.
/// No required skills scores 0.
pub struct OverlapScorer;

impl MatchScorer for OverlapScorer {
    fn score(&self, required: &[SkillRow], held: &[UserSkillRow]) -> MatchReport {
        let held_names: HashSet<String> = held
            .iter()
            .map(|s| s.name.trim().to_lowercase())
            .collect();

        let (matched_skills, missing_skills): (Vec<String>, Vec<String>) = required
            .iter()
            .map(|s| s.name.clone())
            .partition(|name| held_names.contains(&name.trim().to_lowercase()));

        let score = if required.is_empty() {
            0
        } else {
            percentage(matched_skills.len() as u32, required.len() as u32)
        };

        MatchReport {
            score,
            matched_skills,
            missing_skills,
            scorer: "overlap".to_string(),
        }
    }
}

fn percentage(part: u32, total: u32) -> u32 {
    ((part as f64 / total as f64) * 100.0).round().min(100.0) as u32
}

/// One-line verdict on a match score, naming up to three missing skills.
pub fn build_recommendation(score: u32, missing: &[String]) -> String {
    let top_gaps: Vec<&str> = missing.iter().take(3).map(String::as_str).collect();

    if score >= 80 {
        "Strong match. The candidate covers the key requirements.".to_string()
    } else if score >= 50 {
        format!(
            "Moderate match ({score}/100). Worth a closer look at: {}.",
            top_gaps.join(", ")
        )
    } else if top_gaps.is_empty() {
        format!("Weak match ({score}/100). Skill levels are below what the role needs.")
    } else {
        format!(
            "Weak match ({score}/100). Missing: {}.",
            top_gaps.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_skill(id: i64, name: &str) -> SkillRow {
        SkillRow {
            id,
            name: name.to_string(),
            category: None,
        }
    }

    fn held(id: i64, name: &str, proficiency: &str) -> UserSkillRow {
        UserSkillRow {
            skill_id: id,
            name: name.to_string(),
            category: None,
            proficiency: proficiency.to_string(),
        }
    }

    #[test]
    fn test_superset_at_advanced_scores_100() {
        let required = vec![job_skill(1, "Rust"), job_skill(2, "SQL")];
        let candidate = vec![
            held(1, "Rust", "Advanced"),
            held(2, "SQL", "Advanced"),
            held(3, "Go", "Beginner"),
        ];
        let report = ProficiencyScorer.score(&required, &candidate);
        assert_eq!(report.score, 100);
        assert!(report.missing_skills.is_empty());
        assert_eq!(report.matched_skills, vec!["Rust", "SQL"]);
    }

    #[test]
    fn test_proficiency_weights_tiers() {
        let required = vec![job_skill(1, "Rust"), job_skill(2, "SQL"), job_skill(3, "Docker")];
        let candidate = vec![held(1, "Rust", "Beginner"), held(2, "SQL", "Intermediate")];
        // (1 + 2) / 9 = 33.3%
        let report = ProficiencyScorer.score(&required, &candidate);
        assert_eq!(report.score, 33);
        assert_eq!(report.missing_skills, vec!["Docker"]);
    }

    #[test]
    fn test_proficiency_no_required_skills_is_vacuous_100() {
        let report = ProficiencyScorer.score(&[], &[held(1, "Rust", "Advanced")]);
        assert_eq!(report.score, 100);
        assert_eq!(report.scorer, "proficiency");
    }

    #[test]
    fn test_proficiency_empty_candidate_scores_zero() {
        let report = ProficiencyScorer.score(&[job_skill(1, "Rust")], &[]);
        assert_eq!(report.score, 0);
        assert_eq!(report.missing_skills, vec!["Rust"]);
    }

    #[test]
    fn test_overlap_ignores_proficiency_and_case() {
        let required = vec![job_skill(1, "Rust"), job_skill(2, "PostgreSQL")];
        let candidate = vec![held(10, "rust", "Beginner")];
        let report = OverlapScorer.score(&required, &candidate);
        assert_eq!(report.score, 50);
        assert_eq!(report.matched_skills, vec!["Rust"]);
        assert_eq!(report.missing_skills, vec!["PostgreSQL"]);
    }

    #[test]
    fn test_overlap_no_required_skills_is_zero() {
        let report = OverlapScorer.score(&[], &[held(1, "Rust", "Advanced")]);
        assert_eq!(report.score, 0);
        assert_eq!(report.scorer, "overlap");
    }

    #[test]
    fn test_scores_bounded_0_to_100() {
        let required = vec![job_skill(1, "Rust")];
        let candidate = vec![held(1, "Rust", "Advanced"), held(1, "Rust", "Advanced")];
        assert!(ProficiencyScorer.score(&required, &candidate).score <= 100);
        assert!(OverlapScorer.score(&required, &candidate).score <= 100);
    }

    #[test]
    fn test_recommendation_bands() {
        assert!(build_recommendation(92, &[]).contains("Strong match"));
        let gaps = vec!["Kafka".to_string()];
        let moderate = build_recommendation(60, &gaps);
        assert!(moderate.contains("60") && moderate.contains("Kafka"));
        assert!(build_recommendation(10, &gaps).contains("Missing: Kafka"));
        assert!(build_recommendation(10, &[]).contains("below"));
    }
}
