use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Admin;

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    username: &str,
    password_hash: &str,
    email: &str,
    fingerprint_id: i32,
    is_super_admin: bool,
) -> Result<Admin, sqlx::Error> {
    sqlx::query_as::<_, Admin>(
        "INSERT INTO admins (username, password_hash, email, fingerprint_id, is_super_admin)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(username)
    .bind(password_hash)
    .bind(email)
    .bind(fingerprint_id)
    .bind(is_super_admin)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Admin>, sqlx::Error> {
    sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<Admin>, sqlx::Error> {
    sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_fingerprint(
    pool: &PgPool,
    fingerprint_id: i32,
) -> Result<Option<Admin>, sqlx::Error> {
    sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE fingerprint_id = $1")
        .bind(fingerprint_id)
        .fetch_optional(pool)
        .await
}

/// Any admin already holding one of the given unique values.
pub async fn find_any_matching(
    pool: &PgPool,
    username: &str,
    email: &str,
    fingerprint_id: i32,
) -> Result<Option<Admin>, sqlx::Error> {
    sqlx::query_as::<_, Admin>(
        "SELECT * FROM admins WHERE username = $1 OR email = $2 OR fingerprint_id = $3 LIMIT 1",
    )
    .bind(username)
    .bind(email)
    .bind(fingerprint_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_super_admin<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
) -> Result<Option<Admin>, sqlx::Error> {
    sqlx::query_as::<_, Admin>(
        "SELECT * FROM admins WHERE is_super_admin ORDER BY created_at LIMIT 1",
    )
    .fetch_optional(executor)
    .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Admin>, sqlx::Error> {
    sqlx::query_as::<_, Admin>("SELECT * FROM admins ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

pub async fn count_existing<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    ids: &[Uuid],
) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admins WHERE id = ANY($1)")
        .bind(ids)
        .fetch_one(executor)
        .await?;
    Ok(row.0)
}

/// Fields an admin edit may touch; `None` leaves the column unchanged.
#[derive(Debug, Default)]
pub struct AdminChanges<'a> {
    pub username: Option<&'a str>,
    pub email: Option<&'a str>,
    pub fingerprint_id: Option<i32>,
    pub is_super_admin: Option<bool>,
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    changes: &AdminChanges<'_>,
) -> Result<Option<Admin>, sqlx::Error> {
    sqlx::query_as::<_, Admin>(
        "UPDATE admins SET
            username = COALESCE($2, username),
            email = COALESCE($3, email),
            fingerprint_id = COALESCE($4, fingerprint_id),
            is_super_admin = COALESCE($5, is_super_admin),
            updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(changes.username)
    .bind(changes.email)
    .bind(changes.fingerprint_id)
    .bind(changes.is_super_admin)
    .fetch_optional(pool)
    .await
}

pub async fn update_password(
    pool: &PgPool,
    id: Uuid,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE admins SET password_hash = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<Admin>, sqlx::Error> {
    sqlx::query_as::<_, Admin>("DELETE FROM admins WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(pool)
        .await
}
