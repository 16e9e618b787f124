mod activity;
mod admin;
mod room;

pub use activity::{Activity, ActivityKind, ActivityView};
pub use admin::{Admin, AdminSummary};
pub use room::{Day, DayOccupancy, Room, RoomStatus};

/// Returned when a stored or submitted string is not a known enum variant.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownVariant(pub String);

impl std::fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown variant '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariant {}
