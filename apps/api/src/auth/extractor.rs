use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::auth::tokens::verify_token;
use crate::errors::AppError;
use crate::models::user::Role;
use crate::state::AppState;

/// The caller behind a valid `Authorization: Bearer <jwt>` header.
///
/// Adding this extractor to a handler makes the route protected; role checks
/// happen inside the handler with [`AuthUser::require_role`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    /// Fails with 403 unless the caller holds one of `roles`.
    pub fn require_role(&self, roles: &[Role]) -> Result<(), AppError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            tracing::debug!(
                "User {} with role {} denied, requires one of {:?}",
                self.id,
                self.role,
                roles
            );
            Err(AppError::Forbidden(
                "You do not have permission to perform this action".to_string(),
            ))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("No token provided".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Malformed Authorization header".to_string()))?;

        let claims = verify_token(token, &state.config.jwt_secret)?;

        Ok(AuthUser {
            id: claims.id,
            email: claims.email,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            id: 7,
            email: "u@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_require_role_allows_listed_role() {
        assert!(user(Role::Recruiter)
            .require_role(&[Role::Recruiter, Role::Admin])
            .is_ok());
    }

    #[test]
    fn test_require_role_denies_other_roles() {
        let err = user(Role::Student).require_role(&[Role::Recruiter]).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
