use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::queries::ensure_job_exists;
use crate::models::review::ReviewRow;
use crate::notifications::fanout::{notify, NotificationTemplate};
use crate::state::AppState;
use crate::users::queries::{find_by_id, rating_summary};

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: i32,
    pub comment: Option<String>,
    pub job_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ReviewListResponse {
    pub reviews: Vec<ReviewRow>,
    pub average_rating: Option<f64>,
    pub count: i64,
}

fn validate_review(reviewer_id: i64, reviewee_id: i64, rating: i32) -> Result<(), AppError> {
    if reviewer_id == reviewee_id {
        return Err(AppError::Validation("You cannot review yourself".to_string()));
    }
    if !(1..=5).contains(&rating) {
        return Err(AppError::Validation(
            "Rating must be between 1 and 5".to_string(),
        ));
    }
    Ok(())
}

/// POST /api/users/:id/reviews
pub async fn handle_create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(reviewee_id): Path<i64>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewRow>), AppError> {
    validate_review(auth.id, reviewee_id, req.rating)?;

    if find_by_id(&state.db, reviewee_id).await?.is_none() {
        return Err(AppError::NotFound(format!("User {reviewee_id} not found")));
    }
    let reviewer = find_by_id(&state.db, auth.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;
    ensure_job_exists(&state.db, req.job_id).await?;

    let comment = req
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let result = sqlx::query(
        "INSERT INTO reviews (reviewer_id, reviewee_id, job_id, rating, comment) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(auth.id)
    .bind(reviewee_id)
    .bind(req.job_id)
    .bind(req.rating)
    .bind(comment)
    .execute(&state.db)
    .await?;
    let review_id = result.last_insert_id() as i64;

    info!("User {} reviewed user {reviewee_id} ({} stars)", auth.id, req.rating);
    notify(
        &state.db,
        reviewee_id,
        NotificationTemplate::review_received(&reviewer.name, req.rating),
    );

    let review = sqlx::query_as::<_, ReviewRow>(
        r#"
        SELECT r.id, r.reviewer_id, u.name AS reviewer_name, r.reviewee_id, r.job_id,
               r.rating, r.comment, r.created_at
        FROM reviews r JOIN users u ON u.id = r.reviewer_id
        WHERE r.id = ?
        "#,
    )
    .bind(review_id)
    .fetch_one(&state.db)
    .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// GET /api/users/:id/reviews
pub async fn handle_list(
    State(state): State<AppState>,
    Path(reviewee_id): Path<i64>,
) -> Result<Json<ReviewListResponse>, AppError> {
    let reviews = sqlx::query_as::<_, ReviewRow>(
        r#"
        SELECT r.id, r.reviewer_id, u.name AS reviewer_name, r.reviewee_id, r.job_id,
               r.rating, r.comment, r.created_at
        FROM reviews r JOIN users u ON u.id = r.reviewer_id
        WHERE r.reviewee_id = ?
        ORDER BY r.created_at DESC
        "#,
    )
    .bind(reviewee_id)
    .fetch_all(&state.db)
    .await?;
    let (average_rating, count) = rating_summary(&state.db, reviewee_id).await?;

    Ok(Json(ReviewListResponse {
        reviews,
        average_rating,
        count,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cannot_review_self() {
        assert!(validate_review(3, 3, 5).is_err());
    }

    #[test]
    fn test_rating_range() {
        assert!(validate_review(1, 2, 0).is_err());
        assert!(validate_review(1, 2, 6).is_err());
        assert!(validate_review(1, 2, 1).is_ok());
        assert!(validate_review(1, 2, 5).is_ok());
    }
}
