//! Activity log helpers. Called explicitly by handlers after a mutation;
//! a failed write is traced and never fails the request.

use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::models::{ActivityKind, Admin, Room, RoomStatus};

pub async fn log(
    pool: &PgPool,
    kind: ActivityKind,
    message: &str,
    admin_id: Option<Uuid>,
    room_id: Option<Uuid>,
    metadata: Value,
) {
    if let Err(e) = db::activities::insert(pool, kind, message, admin_id, room_id, &metadata).await {
        tracing::error!(kind = kind.as_str(), "Failed to log activity: {e}");
    }
}

pub async fn admin_login(pool: &PgPool, admin: &Admin) {
    let message = format!("{} logged in", admin.username);
    log(pool, ActivityKind::AdminLogin, &message, Some(admin.id), None, json!({})).await;
}

pub async fn admin_logout(pool: &PgPool, admin: &Admin) {
    let message = format!("{} logged out", admin.username);
    log(pool, ActivityKind::AdminLogout, &message, Some(admin.id), None, json!({})).await;
}

pub async fn room_created(pool: &PgPool, actor: &Admin, room: &Room) {
    let message = format!("{} created room {}", actor.username, room.room_number);
    log(
        pool,
        ActivityKind::RoomCreated,
        &message,
        Some(actor.id),
        Some(room.id),
        json!({ "roomNumber": room.room_number, "day": room.day, "duration": room.duration }),
    )
    .await;
}

pub async fn room_updated(pool: &PgPool, actor: &Admin, room: &Room, changes: Value) {
    let message = format!("{} updated room {}", actor.username, room.room_number);
    log(
        pool,
        ActivityKind::RoomUpdated,
        &message,
        Some(actor.id),
        Some(room.id),
        json!({ "roomNumber": room.room_number, "changes": changes }),
    )
    .await;
}

pub async fn room_deleted(pool: &PgPool, actor: &Admin, room: &Room) {
    let message = format!("{} deleted room {}", actor.username, room.room_number);
    log(
        pool,
        ActivityKind::RoomDeleted,
        &message,
        Some(actor.id),
        None,
        json!({ "roomNumber": room.room_number, "day": room.day, "duration": room.duration }),
    )
    .await;
}

pub async fn room_status_changed(
    pool: &PgPool,
    actor: &Admin,
    room: &Room,
    old_status: RoomStatus,
    new_status: RoomStatus,
) {
    let message = format!(
        "Room {} status changed from {old_status} to {new_status} by {}",
        room.room_number, actor.username
    );
    log(
        pool,
        ActivityKind::RoomStatusChanged,
        &message,
        Some(actor.id),
        Some(room.id),
        json!({ "roomNumber": room.room_number, "oldStatus": old_status, "newStatus": new_status }),
    )
    .await;
}

pub async fn admin_created(pool: &PgPool, actor: &Admin, created: &Admin) {
    let message = format!("{} created admin {}", actor.username, created.username);
    log(
        pool,
        ActivityKind::AdminCreated,
        &message,
        Some(actor.id),
        None,
        json!({ "newAdminUsername": created.username }),
    )
    .await;
}

pub async fn admin_updated(pool: &PgPool, actor: &Admin, updated: &Admin) {
    let message = format!("{} updated admin {}", actor.username, updated.username);
    log(
        pool,
        ActivityKind::AdminUpdated,
        &message,
        Some(actor.id),
        None,
        json!({ "updatedAdminUsername": updated.username }),
    )
    .await;
}

pub async fn admin_deleted(pool: &PgPool, actor: &Admin, deleted: &Admin) {
    let message = format!("{} deleted admin {}", actor.username, deleted.username);
    log(
        pool,
        ActivityKind::AdminDeleted,
        &message,
        Some(actor.id),
        None,
        json!({ "deletedAdminUsername": deleted.username }),
    )
    .await;
}

pub async fn system(pool: &PgPool, message: &str, metadata: Value) {
    log(pool, ActivityKind::System, message, None, None, metadata).await;
}
