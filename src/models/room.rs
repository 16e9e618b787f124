use std::str::FromStr;

use chrono::{DateTime, Datelike, Local, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AdminSummary, UnknownVariant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    /// Weekday order, Monday first.
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
            Day::Sunday => "Sunday",
        }
    }

    pub fn today() -> Self {
        Self::from(Local::now().weekday())
    }
}

impl From<Weekday> for Day {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => Day::Monday,
            Weekday::Tue => Day::Tuesday,
            Weekday::Wed => Day::Wednesday,
            Weekday::Thu => Day::Thursday,
            Weekday::Fri => Day::Friday,
            Weekday::Sat => Day::Saturday,
            Weekday::Sun => Day::Sunday,
        }
    }
}

impl FromStr for Day {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Day::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl TryFrom<String> for Day {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for Day {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoomStatus {
    #[default]
    Vacant,
    Occupied,
}

impl RoomStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RoomStatus::Vacant => "Vacant",
            RoomStatus::Occupied => "Occupied",
        }
    }
}

impl FromStr for RoomStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Vacant" => Ok(RoomStatus::Vacant),
            "Occupied" => Ok(RoomStatus::Occupied),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl TryFrom<String> for RoomStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One booking: a room number occupied for a time slot on a day of the week.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: Uuid,
    pub room_number: String,
    #[sqlx(try_from = "String")]
    pub day: Day,
    pub duration: String,
    #[sqlx(try_from = "String")]
    pub status: RoomStatus,
    #[sqlx(skip)]
    pub authorized_admins: Vec<AdminSummary>,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    pub fn is_admin_authorized(&self, admin_id: Uuid) -> bool {
        self.authorized_admins.iter().any(|a| a.id == admin_id)
    }
}

/// Booking counts for one day of the week.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct DayOccupancy {
    #[serde(rename = "_id")]
    #[sqlx(try_from = "String")]
    pub day: Day,
    pub total: i64,
    pub vacant: i64,
    pub occupied: i64,
}

impl DayOccupancy {
    pub fn empty(day: Day) -> Self {
        Self {
            day,
            total: 0,
            vacant: 0,
            occupied: 0,
        }
    }

    /// One entry per weekday, Monday first, zero where `stats` has nothing.
    pub fn full_week(stats: &[DayOccupancy]) -> Vec<DayOccupancy> {
        Day::ALL
            .into_iter()
            .map(|day| {
                stats
                    .iter()
                    .find(|s| s.day == day)
                    .cloned()
                    .unwrap_or_else(|| DayOccupancy::empty(day))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_parses_exact_names_only() {
        assert_eq!("Friday".parse::<Day>().unwrap(), Day::Friday);
        assert!("friday".parse::<Day>().is_err());
        assert!("Funday".parse::<Day>().is_err());
    }

    #[test]
    fn day_serializes_as_name() {
        assert_eq!(serde_json::to_string(&Day::Sunday).unwrap(), "\"Sunday\"");
        assert_eq!(Day::ALL[0], Day::Monday);
        assert_eq!(Day::from(Weekday::Wed), Day::Wednesday);
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [RoomStatus::Vacant, RoomStatus::Occupied] {
            assert_eq!(status.as_str().parse::<RoomStatus>().unwrap(), status);
        }
        assert!("Busy".parse::<RoomStatus>().is_err());
        assert_eq!(RoomStatus::default(), RoomStatus::Vacant);
    }

    #[test]
    fn full_week_zero_fills_missing_days() {
        let stats = vec![DayOccupancy {
            day: Day::Wednesday,
            total: 3,
            vacant: 1,
            occupied: 2,
        }];
        let week = DayOccupancy::full_week(&stats);
        assert_eq!(week.len(), 7);
        assert_eq!(week[0], DayOccupancy::empty(Day::Monday));
        assert_eq!(week[2].total, 3);
        assert_eq!(week[6].day, Day::Sunday);
        let json = serde_json::to_value(&week[2]).unwrap();
        assert_eq!(json["_id"], "Wednesday");
        assert_eq!(json["occupied"], 2);
    }
}
