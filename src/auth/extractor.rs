use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;

use crate::auth::jwt::{self, TokenError};
use crate::db;
use crate::error::AppError;
use crate::models::Admin;
use crate::state::SharedState;

pub const ACCESS_COOKIE: &str = "access_token";

/// The admin behind a verified token, re-read from the database on every request.
#[derive(Debug, Clone)]
pub struct AuthAdmin(pub Admin);

impl AuthAdmin {
    pub fn require_super_admin(&self) -> Result<(), AppError> {
        if self.0.is_super_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Super admin access required".to_string(),
            ))
        }
    }

    pub fn admin(&self) -> &Admin {
        &self.0
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<String>, AppError> {
    if let Some(auth_header) = parts.headers.get("authorization") {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;
        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(Some(token.trim().to_string()));
        }
    }

    let jar = CookieJar::from_headers(&parts.headers);
    Ok(jar.get(ACCESS_COOKIE).map(|c| c.value().to_string()))
}

impl FromRequestParts<SharedState> for AuthAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Access token required".to_string()))?;

        let claims = jwt::decode_token(&token, &state.config.jwt_secret).map_err(|e| match e {
            TokenError::Expired => AppError::Unauthorized("Token expired".to_string()),
            TokenError::Invalid(_) => AppError::Unauthorized("Invalid token".to_string()),
        })?;

        let admin = db::admins::find_by_id(&state.pool, claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

        Ok(AuthAdmin(admin))
    }
}
