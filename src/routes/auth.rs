use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::{CookieJar, WithRejection};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::activity;
use crate::auth::extractor::{AuthAdmin, ACCESS_COOKIE};
use crate::auth::jwt::{encode_token, Claims};
use crate::auth::password;
use crate::db;
use crate::db::admins::AdminChanges;
use crate::error::AppError;
use crate::models::Admin;
use crate::state::SharedState;
use crate::validation::{self, Validator};

type JsonBody<T> = WithRejection<Json<T>, AppError>;

const DUPLICATE_ADMIN: &str = "Admin with this information already exists";

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "fingerprintID")]
    pub fingerprint_id: Option<i64>,
}

/// Password changes go through `change_password`; a `password` key here is ignored.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdminRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "fingerprintID")]
    pub fingerprint_id: Option<i64>,
    pub is_super_admin: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub admin: Admin,
}

#[derive(Serialize)]
pub struct AdminResponse {
    pub message: String,
    pub admin: Admin,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn access_cookie(token: &str, ttl_hours: i64) -> Cookie<'static> {
    Cookie::build((ACCESS_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(ttl_hours))
        .build()
}

fn clear_access_cookie() -> Cookie<'static> {
    Cookie::build((ACCESS_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

fn issue_token(state: &SharedState, admin: &Admin) -> Result<String, AppError> {
    let claims = Claims::new(admin.id, state.config.token_ttl_hours);
    encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)
}

pub async fn login(
    State(state): State<SharedState>,
    jar: CookieJar,
    WithRejection(Json(req), _): JsonBody<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let mut v = Validator::new();
    v.check(!req.username.trim().is_empty(), "username", "Username is required")
        .check(!req.password.is_empty(), "password", "Password is required");
    v.finish()?;

    let username = req.username.trim();

    if state.login_limiter.check(username).is_err() {
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let admin = db::admins::find_by_username(&state.pool, username)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let valid = password::verify(&req.password, &admin.password_hash).map_err(AppError::Internal)?;
    if !valid {
        state.login_limiter.record_failure(username);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }
    state.login_limiter.reset(username);

    let token = issue_token(&state, &admin)?;
    activity::admin_login(&state.pool, &admin).await;

    let jar = jar.add(access_cookie(&token, state.config.token_ttl_hours));
    Ok((
        jar,
        Json(LoginResponse {
            message: "Login successful".to_string(),
            token,
            admin,
        }),
    ))
}

/// Tokens are stateless; logging out records the event and drops the cookie.
pub async fn logout(
    auth: AuthAdmin,
    State(state): State<SharedState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    activity::admin_logout(&state.pool, auth.admin()).await;
    (
        jar.add(clear_access_cookie()),
        Json(MessageResponse {
            message: "Logout successful".to_string(),
        }),
    )
}

pub async fn register(
    auth: AuthAdmin,
    State(state): State<SharedState>,
    WithRejection(Json(req), _): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<AdminResponse>), AppError> {
    auth.require_super_admin()?;

    let fingerprint = req.fingerprint_id.and_then(validation::fingerprint);
    let mut v = Validator::new();
    v.check(
        validation::is_valid_username(&req.username),
        "username",
        "Username must be at least 3 characters",
    )
    .check(
        validation::is_valid_password(&req.password),
        "password",
        "Password must be at least 6 characters",
    )
    .check(validation::is_valid_email(&req.email), "email", "Valid email is required")
    .check(
        fingerprint.is_some(),
        "fingerprintID",
        "Fingerprint ID must be between 1000-9999",
    );
    v.finish()?;
    let Some(fingerprint_id) = fingerprint else {
        return Err(AppError::BadRequest("Fingerprint ID must be between 1000-9999".to_string()));
    };

    let username = req.username.trim();
    let email = validation::normalize_email(&req.email);

    if db::admins::find_any_matching(&state.pool, username, &email, fingerprint_id)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest(
            "Admin with this username, email, or fingerprint ID already exists".to_string(),
        ));
    }

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;
    let admin = db::admins::create(&state.pool, username, &pw_hash, &email, fingerprint_id, false)
        .await
        .map_err(|e| AppError::unique_or_database(e, DUPLICATE_ADMIN))?;

    activity::admin_created(&state.pool, auth.admin(), &admin).await;

    Ok((
        StatusCode::CREATED,
        Json(AdminResponse {
            message: "Admin created successfully".to_string(),
            admin,
        }),
    ))
}

pub async fn list_admins(
    _auth: AuthAdmin,
    State(state): State<SharedState>,
) -> Result<Json<Value>, AppError> {
    let admins = db::admins::list_all(&state.pool).await?;
    Ok(Json(json!({ "admins": admins })))
}

pub async fn update_admin(
    auth: AuthAdmin,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    WithRejection(Json(req), _): JsonBody<UpdateAdminRequest>,
) -> Result<Json<AdminResponse>, AppError> {
    auth.require_super_admin()?;

    let fingerprint = req.fingerprint_id.map(validation::fingerprint);
    let email = req.email.as_deref().map(validation::normalize_email);

    let mut v = Validator::new();
    v.check(
        req.username.as_deref().is_none_or(validation::is_valid_username),
        "username",
        "Username must be at least 3 characters",
    )
    .check(
        email.as_deref().is_none_or(validation::is_valid_email),
        "email",
        "Valid email is required",
    )
    .check(
        fingerprint.is_none_or(|f| f.is_some()),
        "fingerprintID",
        "Fingerprint ID must be between 1000-9999",
    );
    v.finish()?;

    if id == auth.admin().id && req.is_super_admin == Some(false) {
        return Err(AppError::BadRequest(
            "Cannot remove your own super admin access".to_string(),
        ));
    }

    let changes = AdminChanges {
        username: req.username.as_deref().map(str::trim),
        email: email.as_deref(),
        fingerprint_id: fingerprint.flatten(),
        is_super_admin: req.is_super_admin,
    };

    let admin = db::admins::update(&state.pool, id, &changes)
        .await
        .map_err(|e| AppError::unique_or_database(e, DUPLICATE_ADMIN))?
        .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))?;

    activity::admin_updated(&state.pool, auth.admin(), &admin).await;

    Ok(Json(AdminResponse {
        message: "Admin updated successfully".to_string(),
        admin,
    }))
}

pub async fn delete_admin(
    auth: AuthAdmin,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    auth.require_super_admin()?;

    if id == auth.admin().id {
        return Err(AppError::BadRequest(
            "Cannot delete your own account".to_string(),
        ));
    }

    let admin = db::admins::delete(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))?;

    activity::admin_deleted(&state.pool, auth.admin(), &admin).await;

    Ok(Json(MessageResponse {
        message: "Admin deleted successfully".to_string(),
    }))
}

pub async fn me(auth: AuthAdmin) -> Json<Value> {
    Json(json!({ "admin": auth.0 }))
}

pub async fn change_password(
    auth: AuthAdmin,
    State(state): State<SharedState>,
    jar: CookieJar,
    WithRejection(Json(req), _): JsonBody<ChangePasswordRequest>,
) -> Result<(CookieJar, Json<Value>), AppError> {
    let mut v = Validator::new();
    v.check(
        validation::is_valid_password(&req.new_password),
        "newPassword",
        "Password must be at least 6 characters",
    );
    v.finish()?;

    let admin = auth.admin();
    let valid = password::verify(&req.current_password, &admin.password_hash)
        .map_err(AppError::Internal)?;
    if !valid {
        return Err(AppError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let pw_hash = password::hash(&req.new_password).map_err(AppError::Internal)?;
    db::admins::update_password(&state.pool, admin.id, &pw_hash).await?;

    activity::admin_updated(&state.pool, admin, admin).await;

    let token = issue_token(&state, admin)?;
    let jar = jar.add(access_cookie(&token, state.config.token_ttl_hours));
    Ok((
        jar,
        Json(json!({ "message": "Password changed successfully", "token": token })),
    ))
}
