use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    AdminLogin,
    AdminLogout,
    RoomCreated,
    RoomUpdated,
    RoomDeleted,
    RoomStatusChanged,
    AdminCreated,
    AdminUpdated,
    AdminDeleted,
    System,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 10] = [
        ActivityKind::AdminLogin,
        ActivityKind::AdminLogout,
        ActivityKind::RoomCreated,
        ActivityKind::RoomUpdated,
        ActivityKind::RoomDeleted,
        ActivityKind::RoomStatusChanged,
        ActivityKind::AdminCreated,
        ActivityKind::AdminUpdated,
        ActivityKind::AdminDeleted,
        ActivityKind::System,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::AdminLogin => "admin_login",
            ActivityKind::AdminLogout => "admin_logout",
            ActivityKind::RoomCreated => "room_created",
            ActivityKind::RoomUpdated => "room_updated",
            ActivityKind::RoomDeleted => "room_deleted",
            ActivityKind::RoomStatusChanged => "room_status_changed",
            ActivityKind::AdminCreated => "admin_created",
            ActivityKind::AdminUpdated => "admin_updated",
            ActivityKind::AdminDeleted => "admin_deleted",
            ActivityKind::System => "system",
        }
    }
}

impl FromStr for ActivityKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl TryFrom<String> for ActivityKind {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Uuid,
    #[serde(rename = "type")]
    #[sqlx(try_from = "String")]
    pub kind: ActivityKind,
    pub message: String,
    pub admin_id: Option<Uuid>,
    pub room_id: Option<Uuid>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// An activity joined with whatever its admin and room references still resolve to.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityView {
    #[sqlx(flatten)]
    pub activity: Activity,
    pub admin_username: Option<String>,
    pub room_number: Option<String>,
}

impl Serialize for ActivityView {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let a = &self.activity;
        let admin = match (a.admin_id, &self.admin_username) {
            (Some(id), Some(username)) => serde_json::json!({ "id": id, "username": username }),
            _ => serde_json::Value::Null,
        };
        let room = match (a.room_id, &self.room_number) {
            (Some(id), Some(number)) => serde_json::json!({ "id": id, "roomNumber": number }),
            _ => serde_json::Value::Null,
        };
        serde_json::json!({
            "id": a.id,
            "type": a.kind,
            "message": a.message,
            "admin": admin,
            "room": room,
            "metadata": a.metadata,
            "createdAt": a.created_at,
        })
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_text_matches_serde_name() {
        for kind in ActivityKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.as_str());
            assert_eq!(kind.as_str().parse::<ActivityKind>().unwrap(), kind);
        }
    }

    #[test]
    fn view_omits_dangling_references() {
        let view = ActivityView {
            activity: Activity {
                id: Uuid::now_v7(),
                kind: ActivityKind::RoomDeleted,
                message: "root deleted room A101".to_string(),
                admin_id: None,
                room_id: None,
                metadata: serde_json::json!({ "roomNumber": "A101" }),
                created_at: Utc::now(),
            },
            admin_username: None,
            room_number: None,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["type"], "room_deleted");
        assert!(json["admin"].is_null());
        assert!(json["room"].is_null());
        assert_eq!(json["metadata"]["roomNumber"], "A101");
    }
}
