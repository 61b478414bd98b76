//! Status-update rules for applications.

use chrono::{DateTime, Utc};

use crate::errors::AppError;
use crate::models::application::{ApplicationRow, ApplicationStatus, HiringDetails};

/// Column values written by a status update.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub status: ApplicationStatus,
    /// Only set when moving to `hired`.
    pub hiring: Option<HiringFields>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HiringFields {
    pub details: HiringDetails,
    pub hired_at: DateTime<Utc>,
}

/// Validates a requested status and, for `hired`, stamps the hiring fields.
/// Hiring details sent with any other status are ignored.
pub fn plan_status_update(
    raw_status: &str,
    details: Option<HiringDetails>,
    now: DateTime<Utc>,
) -> Result<StatusUpdate, AppError> {
    let status = raw_status
        .parse::<ApplicationStatus>()
        .map_err(AppError::Validation)?;

    let hiring = (status == ApplicationStatus::Hired).then(|| {
        let details = details.unwrap_or_default();
        HiringFields {
            details: HiringDetails {
                start_date: details.start_date,
                salary: trimmed(details.salary),
                contract_type: trimmed(details.contract_type),
                offer_letter: trimmed(details.offer_letter),
            },
            hired_at: now,
        }
    });

    Ok(StatusUpdate { status, hiring })
}

/// Decides whether `caller_id` may withdraw `stored`. Another student's
/// application is reported as missing; only pending ones can be withdrawn.
pub fn check_withdrawable(
    application_id: i64,
    stored: Option<&ApplicationRow>,
    caller_id: i64,
) -> Result<(), AppError> {
    match stored {
        Some(app) if app.student_id == caller_id => {
            if app.status == ApplicationStatus::Pending.as_str() {
                Ok(())
            } else {
                Err(AppError::Validation(format!(
                    "Only pending applications can be withdrawn (current status: {})",
                    app.status
                )))
            }
        }
        _ => Err(AppError::NotFound(format!(
            "Application {application_id} not found"
        ))),
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_hired_with_details_populates_every_field() {
        let now = Utc::now();
        let details = HiringDetails {
            start_date: NaiveDate::from_ymd_opt(2025, 2, 3),
            salary: Some(" 60000 ".to_string()),
            contract_type: Some("full-time".to_string()),
            offer_letter: Some("Welcome aboard".to_string()),
        };
        let update = plan_status_update("hired", Some(details), now).unwrap();
        assert_eq!(update.status, ApplicationStatus::Hired);
        let hiring = update.hiring.unwrap();
        assert_eq!(hiring.hired_at, now);
        assert_eq!(hiring.details.start_date, NaiveDate::from_ymd_opt(2025, 2, 3));
        assert_eq!(hiring.details.salary.as_deref(), Some("60000"));
        assert_eq!(hiring.details.contract_type.as_deref(), Some("full-time"));
        assert_eq!(hiring.details.offer_letter.as_deref(), Some("Welcome aboard"));
    }

    #[test]
    fn test_hired_without_details_still_stamps_hired_at() {
        let update = plan_status_update("hired", None, Utc::now()).unwrap();
        let hiring = update.hiring.unwrap();
        assert!(hiring.details.salary.is_none());
    }

    #[test]
    fn test_non_hired_status_ignores_details() {
        let details = HiringDetails {
            salary: Some("1".to_string()),
            ..Default::default()
        };
        let update = plan_status_update("shortlisted", Some(details), Utc::now()).unwrap();
        assert_eq!(update.status, ApplicationStatus::Shortlisted);
        assert!(update.hiring.is_none());
    }

    fn application(student_id: i64, status: &str) -> ApplicationRow {
        ApplicationRow {
            id: 11,
            job_id: 3,
            student_id,
            cover_letter: None,
            status: status.to_string(),
            ai_match_score: 70,
            start_date: None,
            salary: None,
            contract_type: None,
            offer_letter: None,
            hired_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_own_pending_application_can_be_withdrawn() {
        assert!(check_withdrawable(11, Some(&application(4, "pending")), 4).is_ok());
    }

    #[test]
    fn test_reviewed_application_cannot_be_withdrawn() {
        let err = check_withdrawable(11, Some(&application(4, "reviewed")), 4).unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("reviewed")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_or_foreign_application_is_not_found() {
        assert!(matches!(
            check_withdrawable(11, None, 4),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            check_withdrawable(11, Some(&application(5, "pending")), 4),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_invalid_status_is_validation_error() {
        let err = plan_status_update("accepted", None, Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
