use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::password::{hash_password, verify_password, MIN_PASSWORD_LEN};
use crate::auth::tokens::issue_token;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::user::{Role, UserRow};
use crate::state::AppState;
use crate::users::queries::{find_by_email, find_by_id};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserRow,
}

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Checks a registration body and returns the normalised `(name, email, role)`.
fn validate_registration(req: &RegisterRequest) -> Result<(String, String, Role), AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }

    let email = req.email.trim().to_ascii_lowercase();
    let valid_email = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
        .unwrap_or(false);
    if !valid_email {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }

    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let role = match req.role.as_deref() {
        None => Role::Student,
        Some(raw) => raw.parse::<Role>().map_err(AppError::Validation)?,
    };
    if role == Role::Admin {
        return Err(AppError::Validation(
            "Role must be either student or recruiter".to_string(),
        ));
    }

    Ok((name.to_string(), email, role))
}

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let (name, email, role) = validate_registration(&req)?;

    if find_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::Validation("Email is already registered".to_string()));
    }

    let password_hash = hash_password(&req.password)?;

    let result = sqlx::query("INSERT INTO users (name, email, password_hash, role) VALUES (?, ?, ?, ?)")
        .bind(&name)
        .bind(&email)
        .bind(&password_hash)
        .bind(role.as_str())
        .execute(&state.db)
        .await
        .map_err(|e| AppError::on_duplicate(e, "Email is already registered"))?;

    let user_id = result.last_insert_id() as i64;
    let user = find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("User {user_id} vanished after insert")))?;

    info!("Registered {} {} ({})", role, user_id, email);

    let token = issue_token(
        user.id,
        &user.email,
        role,
        &state.config.jwt_secret,
        state.config.jwt_expiry_hours,
    )?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = req.email.trim().to_ascii_lowercase();
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let user = find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = issue_token(
        user.id,
        &user.email,
        user.role(),
        &state.config.jwt_secret,
        state.config.jwt_expiry_hours,
    )?;

    info!("User {} logged in", user.id);
    Ok(Json(AuthResponse { token, user }))
}

/// GET /api/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserRow>, AppError> {
    let user = find_by_id(&state.db, auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, password: &str, role: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn test_registration_defaults_to_student() {
        let (name, email, role) =
            validate_registration(&request(" Ada ", "ADA@Example.com", "secret1", None)).unwrap();
        assert_eq!(name, "Ada");
        assert_eq!(email, "ada@example.com");
        assert_eq!(role, Role::Student);
    }

    #[test]
    fn test_registration_rejects_admin_role() {
        let err = validate_registration(&request("A", "a@b.io", "secret1", Some("admin")));
        assert!(matches!(err, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_registration_rejects_short_password() {
        let err = validate_registration(&request("A", "a@b.io", "12345", Some("recruiter")));
        assert!(matches!(err, Err(AppError::Validation(msg)) if msg.contains("6")));
    }

    #[test]
    fn test_registration_rejects_bad_email() {
        for email in ["", "nobody", "@b.io", "a@localhost"] {
            assert!(
                validate_registration(&request("A", email, "secret1", None)).is_err(),
                "{email} should be rejected"
            );
        }
    }
}
