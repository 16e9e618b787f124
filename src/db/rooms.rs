use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{AdminSummary, Day, DayOccupancy, Room, RoomStatus};

const DAY_ORDER: &str = "array_position(ARRAY['Monday','Tuesday','Wednesday','Thursday','Friday','Saturday','Sunday']::text[], day)";

#[derive(Debug, Default, Clone)]
pub struct RoomFilter {
    pub day: Option<Day>,
    pub duration: Option<String>,
    /// Case-insensitive substring of the room number.
    pub room_number: Option<String>,
    pub status: Option<RoomStatus>,
}

#[derive(sqlx::FromRow)]
struct RoomAdminRow {
    room_id: Uuid,
    #[sqlx(flatten)]
    admin: AdminSummary,
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

async fn attach_admins<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    rooms: &mut [Room],
) -> Result<(), sqlx::Error> {
    if rooms.is_empty() {
        return Ok(());
    }
    let ids: Vec<Uuid> = rooms.iter().map(|r| r.id).collect();
    let rows = sqlx::query_as::<_, RoomAdminRow>(
        "SELECT ra.room_id, a.id, a.username, a.fingerprint_id
         FROM room_admins ra JOIN admins a ON a.id = ra.admin_id
         WHERE ra.room_id = ANY($1)
         ORDER BY a.username",
    )
    .bind(&ids)
    .fetch_all(executor)
    .await?;

    let mut by_room: HashMap<Uuid, Vec<AdminSummary>> = HashMap::new();
    for row in rows {
        by_room.entry(row.room_id).or_default().push(row.admin);
    }
    for room in rooms.iter_mut() {
        room.authorized_admins = by_room.remove(&room.id).unwrap_or_default();
    }
    Ok(())
}

pub async fn list(pool: &PgPool, filter: &RoomFilter) -> Result<Vec<Room>, sqlx::Error> {
    let sql = format!(
        "SELECT * FROM rooms
         WHERE ($1::text IS NULL OR day = $1)
           AND ($2::text IS NULL OR duration = $2)
           AND ($3::text IS NULL OR room_number ILIKE '%' || $3 || '%')
           AND ($4::text IS NULL OR status = $4)
         ORDER BY room_number, {DAY_ORDER}, duration"
    );
    let mut rooms = sqlx::query_as::<_, Room>(&sql)
        .bind(filter.day.map(Day::as_str))
        .bind(filter.duration.as_deref())
        .bind(filter.room_number.as_deref().map(escape_like))
        .bind(filter.status.map(RoomStatus::as_str))
        .fetch_all(pool)
        .await?;
    attach_admins(pool, &mut rooms).await?;
    Ok(rooms)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Room>, sqlx::Error> {
    let room = sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let Some(room) = room else {
        return Ok(None);
    };
    let mut rooms = [room];
    attach_admins(pool, &mut rooms).await?;
    let [room] = rooms;
    Ok(Some(room))
}

/// Every booking of a room number, across days and slots.
pub async fn find_by_number(pool: &PgPool, room_number: &str) -> Result<Vec<Room>, sqlx::Error> {
    let sql = format!("SELECT * FROM rooms WHERE room_number = $1 ORDER BY {DAY_ORDER}, duration");
    let mut rooms = sqlx::query_as::<_, Room>(&sql)
        .bind(room_number)
        .fetch_all(pool)
        .await?;
    attach_admins(pool, &mut rooms).await?;
    Ok(rooms)
}

/// Current values of a booking, row-locked until the transaction ends.
/// Authorized admins are not loaded.
pub async fn lock_row(conn: &mut PgConnection, id: Uuid) -> Result<Option<Room>, sqlx::Error> {
    sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Serialise writers of one (room number, day) pair until the transaction ends.
pub async fn lock_slot(
    conn: &mut PgConnection,
    room_number: &str,
    day: Day,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1 || '|' || $2))")
        .bind(room_number)
        .bind(day.as_str())
        .execute(conn)
        .await?;
    Ok(())
}

/// Durations already booked for a room on a day, optionally ignoring one booking.
pub async fn booked_durations(
    conn: &mut PgConnection,
    room_number: &str,
    day: Day,
    exclude: Option<Uuid>,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT duration FROM rooms
         WHERE room_number = $1 AND day = $2 AND ($3::uuid IS NULL OR id <> $3)",
    )
    .bind(room_number)
    .bind(day.as_str())
    .bind(exclude)
    .fetch_all(conn)
    .await
}

pub async fn insert(
    conn: &mut PgConnection,
    room_number: &str,
    day: Day,
    duration: &str,
    status: RoomStatus,
) -> Result<Room, sqlx::Error> {
    sqlx::query_as::<_, Room>(
        "INSERT INTO rooms (room_number, day, duration, status)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(room_number)
    .bind(day.as_str())
    .bind(duration)
    .bind(status.as_str())
    .fetch_one(conn)
    .await
}

pub async fn update(
    conn: &mut PgConnection,
    id: Uuid,
    room_number: &str,
    day: Day,
    duration: &str,
    status: RoomStatus,
) -> Result<Option<Room>, sqlx::Error> {
    sqlx::query_as::<_, Room>(
        "UPDATE rooms SET room_number = $2, day = $3, duration = $4, status = $5, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(room_number)
    .bind(day.as_str())
    .bind(duration)
    .bind(status.as_str())
    .fetch_optional(conn)
    .await
}

/// Replace the authorized admin set of a room.
pub async fn set_admins(
    conn: &mut PgConnection,
    room_id: Uuid,
    admin_ids: &[Uuid],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM room_admins WHERE room_id = $1")
        .bind(room_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        "INSERT INTO room_admins (room_id, admin_id)
         SELECT $1, unnest($2::uuid[]) ON CONFLICT DO NOTHING",
    )
    .bind(room_id)
    .bind(admin_ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// `None` when the booking is gone.
pub async fn update_status(
    pool: &PgPool,
    id: Uuid,
    status: RoomStatus,
) -> Result<Option<Room>, sqlx::Error> {
    sqlx::query_as::<_, Room>(
        "UPDATE rooms SET status = $2, timestamp = now(), updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<Room>, sqlx::Error> {
    sqlx::query_as::<_, Room>("DELETE FROM rooms WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn occupancy_by_day(
    pool: &PgPool,
    day: Option<Day>,
) -> Result<Vec<DayOccupancy>, sqlx::Error> {
    let sql = format!(
        "SELECT day,
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'Vacant') AS vacant,
                COUNT(*) FILTER (WHERE status = 'Occupied') AS occupied
         FROM rooms
         WHERE ($1::text IS NULL OR day = $1)
         GROUP BY day
         ORDER BY {DAY_ORDER}"
    );
    sqlx::query_as::<_, DayOccupancy>(&sql)
        .bind(day.map(Day::as_str))
        .fetch_all(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_neutralises_wildcards() {
        assert_eq!(escape_like("A1"), "A1");
        assert_eq!(escape_like("10%_\\"), "10\\%\\_\\\\");
    }
}
