use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Local, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::activity;
use crate::auth::extractor::AuthAdmin;
use crate::db;
use crate::db::rooms::RoomFilter;
use crate::error::{AppError, SlotConflict};
use crate::models::{Day, DayOccupancy, Room, RoomStatus};
use crate::schedule::{self, TimeRange};
use crate::state::SharedState;
use crate::validation::{self, Validator};

type JsonBody<T> = WithRejection<Json<T>, AppError>;
type QueryParams<T> = WithRejection<Query<T>, AppError>;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListRoomsQuery {
    pub day: Option<String>,
    pub duration: Option<String>,
    pub room_number: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub room_number: String,
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub duration: String,
    pub status: Option<String>,
    pub authorized_admins: Option<Vec<Uuid>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoomRequest {
    pub room_number: Option<String>,
    pub day: Option<String>,
    pub duration: Option<String>,
    pub status: Option<String>,
    pub authorized_admins: Option<Vec<Uuid>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareUpdateRequest {
    #[serde(default)]
    pub room_number: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "fingerprintID")]
    pub fingerprint_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct OccupancyQuery {
    pub day: Option<String>,
}

#[derive(Serialize)]
pub struct RoomResponse {
    pub message: String,
    pub room: Room,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub room_number: String,
    pub status: RoomStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct HardwareUpdateResponse {
    pub message: String,
    pub room: StatusSnapshot,
}

fn parse_day_field(v: &mut Validator, raw: Option<&str>) -> Option<Day> {
    let day = raw.and_then(schedule::normalize_day);
    v.check(raw.is_none() || day.is_some(), "day", "Valid day is required");
    day
}

fn parse_status_field(v: &mut Validator, raw: Option<&str>) -> Option<RoomStatus> {
    let status = raw.and_then(|s| s.trim().parse::<RoomStatus>().ok());
    v.check(
        raw.is_none() || status.is_some(),
        "status",
        "Status must be Vacant or Occupied",
    );
    status
}

fn parse_range(duration: &str) -> Result<TimeRange, AppError> {
    schedule::parse_duration(duration)
        .ok_or_else(|| AppError::BadRequest("Invalid duration format".to_string()))
}

async fn ensure_admins_exist(state: &SharedState, ids: &mut Vec<Uuid>) -> Result<(), AppError> {
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(());
    }
    let found = db::admins::count_existing(&state.pool, ids.as_slice()).await?;
    if usize::try_from(found).ok() != Some(ids.len()) {
        return Err(AppError::BadRequest(
            "One or more authorized admins not found".to_string(),
        ));
    }
    Ok(())
}

fn conflict_error(room_number: &str, day: Day, existing: &str, requested: &str) -> AppError {
    AppError::SlotConflict(SlotConflict {
        room_number: room_number.to_string(),
        day: day.to_string(),
        duration: existing.to_string(),
        requested: requested.to_string(),
    })
}

pub async fn list(
    State(state): State<SharedState>,
    WithRejection(Query(q), _): QueryParams<ListRoomsQuery>,
) -> Result<Json<Value>, AppError> {
    let mut v = Validator::new();
    let day = parse_day_field(&mut v, q.day.as_deref().filter(|s| !s.trim().is_empty()));
    let status = parse_status_field(&mut v, q.status.as_deref().filter(|s| !s.trim().is_empty()));
    v.finish()?;

    let filter = RoomFilter {
        day,
        duration: q
            .duration
            .as_deref()
            .map(schedule::normalize_duration)
            .filter(|s| !s.is_empty()),
        room_number: q
            .room_number
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        status,
    };

    let rooms = db::rooms::list(&state.pool, &filter).await?;
    Ok(Json(json!({ "rooms": rooms })))
}

pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let room = db::rooms::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;
    Ok(Json(json!({ "room": room })))
}

pub async fn create(
    auth: AuthAdmin,
    State(state): State<SharedState>,
    WithRejection(Json(req), _): JsonBody<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomResponse>), AppError> {
    let room_number = schedule::normalize_room_number(&req.room_number);
    let duration = schedule::normalize_duration(&req.duration);

    let mut v = Validator::new();
    v.check(!room_number.is_empty(), "roomNumber", "Room number is required");
    let day = parse_day_field(&mut v, Some(req.day.as_str()));
    v.check(
        validation::is_valid_duration_format(&duration),
        "duration",
        "Duration must be in format HH:MM-HH:MM",
    );
    let status = parse_status_field(&mut v, req.status.as_deref());
    v.finish()?;
    let Some(day) = day else {
        return Err(AppError::BadRequest("Valid day is required".to_string()));
    };
    let status = status.unwrap_or_default();

    let range = parse_range(&duration)?;

    let mut admin_ids = req.authorized_admins.unwrap_or_default();
    ensure_admins_exist(&state, &mut admin_ids).await?;

    let mut tx = state.pool.begin().await?;
    db::rooms::lock_slot(&mut tx, &room_number, day).await?;

    let booked = db::rooms::booked_durations(&mut tx, &room_number, day, None).await?;
    if let Some(existing) = schedule::find_conflict(&range, booked.iter().map(String::as_str)) {
        return Err(conflict_error(&room_number, day, existing, &duration));
    }

    let room = db::rooms::insert(&mut tx, &room_number, day, &duration, status).await?;
    db::rooms::set_admins(&mut tx, room.id, &admin_ids).await?;
    tx.commit().await?;

    let room = db::rooms::find_by_id(&state.pool, room.id)
        .await?
        .ok_or_else(|| AppError::Internal("Room vanished after insert".to_string()))?;

    activity::room_created(&state.pool, auth.admin(), &room).await;

    Ok((
        StatusCode::CREATED,
        Json(RoomResponse {
            message: "Room created successfully".to_string(),
            room,
        }),
    ))
}

pub async fn update(
    auth: AuthAdmin,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    WithRejection(Json(req), _): JsonBody<UpdateRoomRequest>,
) -> Result<Json<RoomResponse>, AppError> {
    let room_number = req.room_number.as_deref().map(schedule::normalize_room_number);
    let duration = req.duration.as_deref().map(schedule::normalize_duration);

    let mut v = Validator::new();
    v.check(
        room_number.as_deref().is_none_or(|n| !n.is_empty()),
        "roomNumber",
        "Room number is required",
    );
    let day = parse_day_field(&mut v, req.day.as_deref());
    v.check(
        duration.as_deref().is_none_or(validation::is_valid_duration_format),
        "duration",
        "Duration must be in format HH:MM-HH:MM",
    );
    let status = parse_status_field(&mut v, req.status.as_deref());
    v.finish()?;

    let mut admin_ids = req.authorized_admins;
    if let Some(ids) = admin_ids.as_mut() {
        ensure_admins_exist(&state, ids).await?;
    }

    let mut tx = state.pool.begin().await?;
    // Row lock first: merging must see any edit that committed meanwhile.
    let current = db::rooms::lock_row(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;

    let slot_changed = room_number.is_some() || day.is_some() || duration.is_some();
    let final_number = room_number.clone().unwrap_or(current.room_number);
    let final_day = day.unwrap_or(current.day);
    let final_duration = duration.clone().unwrap_or(current.duration);
    let final_status = status.unwrap_or(current.status);

    if slot_changed {
        let range = parse_range(&final_duration)?;
        db::rooms::lock_slot(&mut tx, &final_number, final_day).await?;
        let booked =
            db::rooms::booked_durations(&mut tx, &final_number, final_day, Some(id)).await?;
        if let Some(existing) = schedule::find_conflict(&range, booked.iter().map(String::as_str)) {
            return Err(conflict_error(&final_number, final_day, existing, &final_duration));
        }
    }

    db::rooms::update(&mut tx, id, &final_number, final_day, &final_duration, final_status)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;
    if let Some(ids) = admin_ids.as_deref() {
        db::rooms::set_admins(&mut tx, id, ids).await?;
    }
    tx.commit().await?;

    let room = db::rooms::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;

    let mut changes = Map::new();
    if let Some(n) = room_number {
        changes.insert("roomNumber".into(), json!(n));
    }
    if let Some(d) = day {
        changes.insert("day".into(), json!(d));
    }
    if let Some(d) = duration {
        changes.insert("duration".into(), json!(d));
    }
    if let Some(s) = status {
        changes.insert("status".into(), json!(s));
    }
    if let Some(ids) = admin_ids {
        changes.insert("authorizedAdmins".into(), json!(ids));
    }
    activity::room_updated(&state.pool, auth.admin(), &room, Value::Object(changes)).await;

    Ok(Json(RoomResponse {
        message: "Room updated successfully".to_string(),
        room,
    }))
}

pub async fn delete(
    auth: AuthAdmin,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let room = db::rooms::delete(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;

    activity::room_deleted(&state.pool, auth.admin(), &room).await;

    Ok(Json(json!({ "message": "Room deleted successfully" })))
}

/// Among the bookings of one room number, the one a scanner tap applies to:
/// an authorized booking in session right now, else the first authorized one.
pub fn pick_booking(rooms: &[Room], admin_id: Uuid, today: Day, minute: u32) -> Option<&Room> {
    let mut authorized = rooms.iter().filter(|r| r.is_admin_authorized(admin_id)).peekable();
    let first = *authorized.peek()?;
    let in_session = authorized.find(|r| {
        r.day == today
            && schedule::parse_duration(&r.duration).is_some_and(|range| range.contains(minute))
    });
    Some(in_session.unwrap_or(first))
}

/// Status callback from a room's fingerprint scanner. Unauthenticated: the
/// fingerprint itself is the credential.
pub async fn hardware_update(
    State(state): State<SharedState>,
    WithRejection(Json(req), _): JsonBody<HardwareUpdateRequest>,
) -> Result<Json<HardwareUpdateResponse>, AppError> {
    let room_number = schedule::normalize_room_number(&req.room_number);
    let fingerprint = req.fingerprint_id.and_then(validation::fingerprint);

    let mut v = Validator::new();
    v.check(!room_number.is_empty(), "roomNumber", "Room number is required");
    let status = parse_status_field(&mut v, Some(req.status.as_str()));
    v.check(fingerprint.is_some(), "fingerprintID", "Valid fingerprint ID is required");
    v.finish()?;
    let (Some(status), Some(fingerprint_id)) = (status, fingerprint) else {
        return Err(AppError::BadRequest("Validation failed".to_string()));
    };

    let Some(admin) = db::admins::find_by_fingerprint(&state.pool, fingerprint_id).await? else {
        tracing::warn!(fingerprint_id, "Hardware update with unknown fingerprint ID");
        return Err(AppError::Forbidden("Unauthorized fingerprint ID".to_string()));
    };

    let bookings = db::rooms::find_by_number(&state.pool, &room_number).await?;
    if bookings.is_empty() {
        tracing::warn!(room_number = %room_number, "Hardware update for non-existent room");
        return Err(AppError::NotFound("Room not found".to_string()));
    }

    let now = Local::now();
    let minute = now.hour() * 60 + now.minute();
    let Some(room) = pick_booking(&bookings, admin.id, Day::today(), minute) else {
        tracing::warn!(
            room_number = %room_number,
            admin = %admin.username,
            fingerprint_id,
            "Hardware update from admin not authorized for room"
        );
        return Err(AppError::Forbidden(
            "Admin not authorized for this room".to_string(),
        ));
    };

    let old_status = room.status;
    let updated = db::rooms::update_status(&state.pool, room.id, status)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;

    activity::room_status_changed(&state.pool, &admin, &updated, old_status, status).await;
    tracing::info!(
        room_number = %updated.room_number,
        status = %status,
        admin = %admin.username,
        "Room status updated from hardware"
    );

    Ok(Json(HardwareUpdateResponse {
        message: "Room status updated successfully".to_string(),
        room: StatusSnapshot {
            room_number: updated.room_number,
            status: updated.status,
            timestamp: updated.timestamp,
        },
    }))
}

pub async fn occupancy(
    State(state): State<SharedState>,
    WithRejection(Query(q), _): QueryParams<OccupancyQuery>,
) -> Result<Json<Value>, AppError> {
    let mut v = Validator::new();
    let day = parse_day_field(&mut v, q.day.as_deref().filter(|s| !s.trim().is_empty()));
    v.finish()?;

    let stats = db::rooms::occupancy_by_day(&state.pool, day).await?;
    Ok(Json(json!({ "occupancyStats": stats })))
}

pub async fn analytics(State(state): State<SharedState>) -> Result<Json<Value>, AppError> {
    let stats = db::rooms::occupancy_by_day(&state.pool, None).await?;
    Ok(Json(json!({ "analyticsData": DayOccupancy::full_week(&stats) })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AdminSummary;

    fn booking(day: Day, duration: &str, admins: &[Uuid]) -> Room {
        Room {
            id: Uuid::now_v7(),
            room_number: "A101".to_string(),
            day,
            duration: duration.to_string(),
            status: RoomStatus::Vacant,
            authorized_admins: admins
                .iter()
                .map(|&id| AdminSummary {
                    id,
                    username: "john_doe".to_string(),
                    fingerprint_id: 1001,
                })
                .collect(),
            timestamp: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn pick_prefers_booking_in_session() {
        let admin = Uuid::now_v7();
        let rooms = vec![
            booking(Day::Monday, "9:00-10:00", &[admin]),
            booking(Day::Tuesday, "9:00-10:00", &[admin]),
            booking(Day::Tuesday, "13:00-14:00", &[admin]),
        ];
        let picked = pick_booking(&rooms, admin, Day::Tuesday, 13 * 60 + 30).unwrap();
        assert_eq!(picked.id, rooms[2].id);
    }

    #[test]
    fn pick_falls_back_to_first_authorized() {
        let admin = Uuid::now_v7();
        let other = Uuid::now_v7();
        let rooms = vec![
            booking(Day::Monday, "9:00-10:00", &[other]),
            booking(Day::Friday, "9:00-10:00", &[admin]),
        ];
        let picked = pick_booking(&rooms, admin, Day::Sunday, 0).unwrap();
        assert_eq!(picked.id, rooms[1].id);
    }

    #[test]
    fn pick_ignores_in_session_bookings_of_others() {
        let admin = Uuid::now_v7();
        let other = Uuid::now_v7();
        let rooms = vec![
            booking(Day::Monday, "9:00-10:00", &[admin]),
            booking(Day::Tuesday, "9:00-10:00", &[other]),
        ];
        let picked = pick_booking(&rooms, admin, Day::Tuesday, 9 * 60 + 15).unwrap();
        assert_eq!(picked.id, rooms[0].id);
    }

    #[test]
    fn pick_none_when_unauthorized() {
        let rooms = vec![booking(Day::Monday, "9:00-10:00", &[Uuid::now_v7()])];
        assert!(pick_booking(&rooms, Uuid::now_v7(), Day::Monday, 9 * 60).is_none());
    }
}
