pub mod health;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::state::AppState;
use crate::{
    admin, ai, applications, auth, chat, jobs, notifications, portfolio, reports, reviews, skills,
    users,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/auth/register", post(auth::handlers::handle_register))
        .route("/api/auth/login", post(auth::handlers::handle_login))
        .route("/api/auth/me", get(auth::handlers::handle_me))
        // Users
        .route(
            "/api/users/profile",
            get(users::handlers::handle_get_profile).put(users::handlers::handle_update_profile),
        )
        .route(
            "/api/users/skills",
            get(users::handlers::handle_list_skills).post(users::handlers::handle_add_skill),
        )
        .route(
            "/api/users/skills/:skill_id",
            delete(users::handlers::handle_remove_skill),
        )
        .route("/api/users/:id", get(users::handlers::handle_get_public_profile))
        .route(
            "/api/users/:id/reviews",
            get(reviews::handlers::handle_list).post(reviews::handlers::handle_create),
        )
        // Skills
        .route(
            "/api/skills",
            get(skills::handlers::handle_list).post(skills::handlers::handle_create),
        )
        .route("/api/skills/:id", delete(skills::handlers::handle_delete))
        // Jobs
        .route(
            "/api/jobs",
            get(jobs::handlers::handle_list).post(jobs::handlers::handle_create),
        )
        .route("/api/jobs/mine", get(jobs::handlers::handle_mine))
        .route("/api/jobs/saved", get(jobs::handlers::handle_saved))
        .route(
            "/api/jobs/:id",
            get(jobs::handlers::handle_get)
                .put(jobs::handlers::handle_update)
                .delete(jobs::handlers::handle_delete),
        )
        .route(
            "/api/jobs/:id/save",
            post(jobs::handlers::handle_save).delete(jobs::handlers::handle_unsave),
        )
        // Applications
        .route("/api/applications", post(applications::handlers::handle_apply))
        .route("/api/applications/mine", get(applications::handlers::handle_mine))
        .route(
            "/api/applications/job/:job_id",
            get(applications::handlers::handle_for_job),
        )
        .route(
            "/api/applications/:id",
            get(applications::handlers::handle_get).delete(applications::handlers::handle_withdraw),
        )
        .route(
            "/api/applications/:id/status",
            put(applications::handlers::handle_update_status),
        )
        // Portfolio
        .route("/api/portfolio", post(portfolio::handlers::handle_create))
        .route("/api/portfolio/mine", get(portfolio::handlers::handle_mine))
        .route(
            "/api/portfolio/user/:user_id",
            get(portfolio::handlers::handle_list_for_user),
        )
        .route(
            "/api/portfolio/:id",
            put(portfolio::handlers::handle_update).delete(portfolio::handlers::handle_delete),
        )
        // Notifications
        .route("/api/notifications", get(notifications::handlers::handle_list))
        .route(
            "/api/notifications/unread-count",
            get(notifications::handlers::handle_unread_count),
        )
        .route(
            "/api/notifications/read-all",
            put(notifications::handlers::handle_mark_all_read),
        )
        .route(
            "/api/notifications/:id",
            delete(notifications::handlers::handle_delete),
        )
        .route(
            "/api/notifications/:id/read",
            put(notifications::handlers::handle_mark_read),
        )
        // Chat
        .route(
            "/api/chat/rooms",
            get(chat::handlers::handle_list_rooms).post(chat::handlers::handle_create_room),
        )
        .route(
            "/api/chat/rooms/:id/messages",
            get(chat::handlers::handle_list_messages).post(chat::handlers::handle_send_message),
        )
        // Admin
        .route("/api/admin/users", get(admin::handlers::handle_list_users))
        .route("/api/admin/users/:id", delete(admin::handlers::handle_delete_user))
        .route("/api/admin/users/:id/role", put(admin::handlers::handle_change_role))
        .route("/api/admin/jobs", get(admin::handlers::handle_list_jobs))
        .route("/api/admin/jobs/:id", delete(admin::handlers::handle_delete_job))
        .route("/api/admin/stats", get(admin::handlers::handle_stats))
        // Reports
        .route("/api/reports/recruiter", get(reports::handlers::handle_recruiter))
        .route("/api/reports/platform", get(reports::handlers::handle_platform))
        // AI
        .route("/api/ai/match/:job_id", get(ai::handlers::handle_match))
        .route("/api/ai/proposal", post(ai::handlers::handle_proposal))
        .route(
            "/api/ai/insights/:application_id",
            get(ai::handlers::handle_insights),
        )
        .route(
            "/api/ai/recommendations",
            get(ai::handlers::handle_recommendations),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use sqlx::mysql::MySqlPoolOptions;
    use tower::ServiceExt;

    use crate::auth::tokens::issue_token;
    use crate::config::Config;
    use crate::models::user::Role;

    /// A router whose pool never connects; only requests rejected before any
    /// query runs can be exercised.
    fn test_router() -> Router {
        let config = Config::for_tests();
        let db = MySqlPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        build_router(AppState::new(db, None, config))
    }

    fn bearer(role: Role) -> String {
        let config = Config::for_tests();
        let token = issue_token(42, "someone@example.com", role, &config.jwt_secret, 1).unwrap();
        format!("Bearer {token}")
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "skillbridge-api");
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let response = test_router()
            .oneshot(Request::get("/api/notifications").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["code"], "UNAUTHORIZED");
        assert_eq!(body["error"], "No token provided");
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthorized() {
        let response = test_router()
            .oneshot(
                Request::get("/api/auth/me")
                    .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_student_cannot_read_admin_stats() {
        let response = test_router()
            .oneshot(
                Request::get("/api/admin/stats")
                    .header(header::AUTHORIZATION, bearer(Role::Student))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_recruiter_cannot_read_platform_report() {
        let response = test_router()
            .oneshot(
                Request::get("/api/reports/platform")
                    .header(header::AUTHORIZATION, bearer(Role::Recruiter))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_recruiter_cannot_request_recommendations() {
        let response = test_router()
            .oneshot(
                Request::get("/api/ai/recommendations")
                    .header(header::AUTHORIZATION, bearer(Role::Recruiter))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = test_router()
            .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
