use serde_json::json;
use sqlx::PgPool;

use crate::activity;
use crate::auth::password;
use crate::config::SuperAdminConfig;
use crate::db;
use crate::validation::{self, Validator};

#[derive(Debug, PartialEq)]
pub enum Outcome {
    Created,
    AlreadyExists,
    NotConfigured,
}

/// Create the super admin on first start. Never fails startup on bad input,
/// only on database errors.
pub async fn ensure_super_admin(
    pool: &PgPool,
    config: Option<&SuperAdminConfig>,
) -> Result<Outcome, sqlx::Error> {
    let mut tx = pool.begin().await?;
    // Concurrent instances starting at once must not both create one.
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext('veriloc:super-admin'))")
        .execute(&mut *tx)
        .await?;

    if let Some(existing) = db::admins::find_super_admin(&mut *tx).await? {
        tracing::info!(username = %existing.username, "Super admin already exists");
        return Ok(Outcome::AlreadyExists);
    }

    let Some(cfg) = config else {
        tracing::warn!("No super admin exists and SUPER_ADMIN_* is not set");
        return Ok(Outcome::NotConfigured);
    };

    let fingerprint = cfg
        .fingerprint_id
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(validation::fingerprint);

    let mut v = Validator::new();
    v.check(validation::is_valid_username(&cfg.username), "SUPER_ADMIN_USERNAME", "too short")
        .check(validation::is_valid_password(&cfg.password), "SUPER_ADMIN_PASSWORD", "too short")
        .check(validation::is_valid_email(&cfg.email), "SUPER_ADMIN_EMAIL", "invalid email")
        .check(
            fingerprint.is_some(),
            "SUPER_ADMIN_FINGERPRINT_ID",
            "must be a number between 1000-9999",
        );
    if let Err(e) = v.finish() {
        tracing::error!("Super admin not created: {e}");
        return Ok(Outcome::NotConfigured);
    }
    let Some(fingerprint_id) = fingerprint else {
        return Ok(Outcome::NotConfigured);
    };

    let pw_hash = match password::hash(&cfg.password) {
        Ok(h) => h,
        Err(e) => {
            tracing::error!("Super admin not created: {e}");
            return Ok(Outcome::NotConfigured);
        }
    };

    let created = db::admins::create(
        &mut *tx,
        cfg.username.trim(),
        &pw_hash,
        &validation::normalize_email(&cfg.email),
        fingerprint_id,
        true,
    )
    .await;

    let admin = match created {
        Ok(admin) => admin,
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
            tracing::warn!("Super admin with this data already exists");
            return Ok(Outcome::AlreadyExists);
        }
        Err(e) => return Err(e),
    };

    tx.commit().await?;

    tracing::info!(username = %admin.username, "Super admin created");
    activity::system(
        pool,
        &format!("Super admin {} created", admin.username),
        json!({ "username": admin.username }),
    )
    .await;

    Ok(Outcome::Created)
}
