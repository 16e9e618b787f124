use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Activity, ActivityKind, ActivityView};

pub async fn insert(
    pool: &PgPool,
    kind: ActivityKind,
    message: &str,
    admin_id: Option<Uuid>,
    room_id: Option<Uuid>,
    metadata: &serde_json::Value,
) -> Result<Activity, sqlx::Error> {
    sqlx::query_as::<_, Activity>(
        "INSERT INTO activities (kind, message, admin_id, room_id, metadata)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(kind.as_str())
    .bind(message)
    .bind(admin_id)
    .bind(room_id)
    .bind(metadata)
    .fetch_one(pool)
    .await
}

pub async fn recent(
    pool: &PgPool,
    limit: i64,
    kind: Option<ActivityKind>,
) -> Result<Vec<ActivityView>, sqlx::Error> {
    sqlx::query_as::<_, ActivityView>(
        "SELECT act.*, a.username AS admin_username, r.room_number
         FROM activities act
         LEFT JOIN admins a ON a.id = act.admin_id
         LEFT JOIN rooms r ON r.id = act.room_id
         WHERE ($2::text IS NULL OR act.kind = $2)
         ORDER BY act.created_at DESC
         LIMIT $1",
    )
    .bind(limit)
    .bind(kind.map(ActivityKind::as_str))
    .fetch_all(pool)
    .await
}
