use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::skill::SkillRow;

pub const JOB_TYPES: &[&str] = &["full-time", "part-time", "internship", "contract", "freelance"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Open,
    Closed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "open",
            JobStatus::Closed => "closed",
        }
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(JobStatus::Open),
            "closed" => Ok(JobStatus::Closed),
            other => Err(format!("Unknown job status '{other}'")),
        }
    }
}

/// Normalises a job type, accepting `full_time`, `Full Time` and friends.
pub fn normalize_job_type(raw: &str) -> Option<&'static str> {
    let cleaned = raw.trim().to_ascii_lowercase().replace(['_', ' '], "-");
    JOB_TYPES.iter().copied().find(|t| *t == cleaned)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: i64,
    pub posted_by: i64,
    pub title: String,
    pub description: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub job_type: String,
    pub salary: Option<String>,
    pub experience_level: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRow {
    pub fn is_open(&self) -> bool {
        self.status == JobStatus::Open.as_str()
    }
}

/// A job with its required skills and the poster's display name.
#[derive(Debug, Clone, Serialize)]
pub struct JobDetail {
    #[serde(flatten)]
    pub job: JobRow,
    pub poster_name: Option<String>,
    pub skills: Vec<SkillRow>,
}

/// A recruiter's own job with its application count.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RecruiterJobRow {
    pub id: i64,
    pub title: String,
    pub status: String,
    pub job_type: String,
    pub created_at: DateTime<Utc>,
    pub application_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_job_type_variants() {
        assert_eq!(normalize_job_type("Full Time"), Some("full-time"));
        assert_eq!(normalize_job_type("part_time"), Some("part-time"));
        assert_eq!(normalize_job_type("Internship"), Some("internship"));
        assert_eq!(normalize_job_type("gig"), None);
    }

    #[test]
    fn test_job_status_parse() {
        assert_eq!("OPEN".parse::<JobStatus>().unwrap(), JobStatus::Open);
        assert!("archived".parse::<JobStatus>().is_err());
    }
}
