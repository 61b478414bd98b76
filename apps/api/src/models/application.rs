use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Shortlisted,
    Rejected,
    Hired,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Hired => "hired",
        }
    }

    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Reviewed,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Rejected,
        ApplicationStatus::Hired,
    ];
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ApplicationStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "Invalid status '{}'. Expected one of: pending, reviewed, shortlisted, rejected, hired",
                    s.trim()
                )
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationRow {
    pub id: i64,
    pub job_id: i64,
    pub student_id: i64,
    pub cover_letter: Option<String>,
    pub status: String,
    pub ai_match_score: i32,
    pub start_date: Option<NaiveDate>,
    pub salary: Option<String>,
    pub contract_type: Option<String>,
    pub offer_letter: Option<String>,
    pub hired_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A student's application joined with the job it targets.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StudentApplicationRow {
    pub id: i64,
    pub job_id: i64,
    pub job_title: String,
    pub company: Option<String>,
    pub status: String,
    pub ai_match_score: i32,
    pub hired_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// An applicant as seen by the recruiter who owns the job.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ApplicantRow {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub student_email: String,
    pub cover_letter: Option<String>,
    pub status: String,
    pub ai_match_score: i32,
    pub created_at: DateTime<Utc>,
}

/// Offer terms recorded when an application moves to `hired`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HiringDetails {
    #[serde(alias = "startDate")]
    pub start_date: Option<NaiveDate>,
    pub salary: Option<String>,
    #[serde(alias = "contractType")]
    pub contract_type: Option<String>,
    #[serde(alias = "offerLetter")]
    pub offer_letter: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_all_variants() {
        for st in ApplicationStatus::ALL {
            assert_eq!(st.as_str().parse::<ApplicationStatus>().unwrap(), st);
        }
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        let err = "withdrawn".parse::<ApplicationStatus>().unwrap_err();
        assert!(err.contains("withdrawn"));
    }

    #[test]
    fn test_hiring_details_accepts_camel_case() {
        let details: HiringDetails = serde_json::from_str(
            r#"{"startDate":"2025-01-06","salary":"$80k","contractType":"full-time","offerLetter":"Welcome"}"#,
        )
        .unwrap();
        assert_eq!(details.start_date, NaiveDate::from_ymd_opt(2025, 1, 6));
        assert_eq!(details.contract_type.as_deref(), Some("full-time"));
    }
}
