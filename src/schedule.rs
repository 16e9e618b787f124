//! Booking time slots.
//!
//! A slot is written `H:MM-H:MM` on a 12/24-hour clock. When the end reads
//! earlier than (or equal to) the start, the end is taken to be in the
//! afternoon: `12:30-1:30` spans 12:30 to 13:30.

use crate::models::Day;

const HALF_DAY: u32 = 12 * 60;

/// Minutes since midnight, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: u32,
    pub end: u32,
}

impl TimeRange {
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, minute: u32) -> bool {
        self.start <= minute && minute < self.end
    }
}

/// Parse `"9:00-10:00"` into a minute range, applying the afternoon rollover.
///
/// Returns `None` for malformed input, out-of-range clock values, or a range
/// that still ends before it starts after the rollover (e.g. `23:00-1:00`).
pub fn parse_duration(duration: &str) -> Option<TimeRange> {
    let (start, end) = duration.split_once('-')?;
    if end.contains('-') {
        return None;
    }
    let start = parse_clock(start)?;
    let end = parse_clock(end)?;

    let end = if end <= start { end + HALF_DAY } else { end };
    if end <= start {
        return None;
    }
    Some(TimeRange { start, end })
}

fn parse_clock(part: &str) -> Option<u32> {
    let (h, m) = part.trim().split_once(':')?;
    let (h, m) = (h.trim(), m.trim());
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(h) || !digits(m) {
        return None;
    }
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    if h > 23 || m > 59 {
        return None;
    }
    Some(h * 60 + m)
}

/// First existing slot that collides with `candidate`. Unparsable slots never collide.
pub fn find_conflict<'a, I>(candidate: &TimeRange, existing: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    existing.into_iter().find(|duration| {
        parse_duration(duration).is_some_and(|range| range.overlaps(candidate))
    })
}

pub fn normalize_room_number(raw: &str) -> String {
    raw.trim().to_uppercase()
}

pub fn normalize_duration(raw: &str) -> String {
    raw.trim().to_string()
}

/// Accepts any casing and surrounding whitespace: `" monday "` is `Day::Monday`.
pub fn normalize_day(raw: &str) -> Option<Day> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    let first = chars.next()?;
    let titled: String = first
        .to_uppercase()
        .chain(chars.as_str().to_lowercase().chars())
        .collect();
    titled.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: u32, end: u32) -> TimeRange {
        TimeRange { start, end }
    }

    #[test]
    fn parses_plain_morning_slot() {
        assert_eq!(parse_duration("9:00-10:00"), Some(range(540, 600)));
        assert_eq!(parse_duration("09:15-10:45"), Some(range(555, 645)));
    }

    #[test]
    fn end_before_start_rolls_into_afternoon() {
        assert_eq!(parse_duration("12:30-1:30"), Some(range(750, 810)));
        assert_eq!(parse_duration("11:00-1:00"), Some(range(660, 780)));
    }

    #[test]
    fn equal_endpoints_roll_over_too() {
        assert_eq!(parse_duration("9:00-9:00"), Some(range(540, 1260)));
    }

    #[test]
    fn rejects_ranges_that_still_end_first() {
        assert_eq!(parse_duration("23:00-1:00"), None);
        assert_eq!(parse_duration("13:00-1:00"), None);
    }

    #[test]
    fn tolerates_whitespace_around_parts() {
        assert_eq!(parse_duration(" 9:00 - 10:00 "), Some(range(540, 600)));
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "9-10", "9:00", "9:00-10:00-11:00", "a:00-10:00", "9:60-10:00", "24:00-1:00", "9:-10:00"] {
            assert_eq!(parse_duration(bad), None, "{bad}");
        }
    }

    #[test]
    fn overlap_is_strict_at_boundaries() {
        let morning = range(540, 600);
        assert!(morning.overlaps(&range(570, 630)));
        assert!(morning.overlaps(&range(500, 700)));
        assert!(!morning.overlaps(&range(600, 660)));
        assert!(!range(480, 540).overlaps(&morning));
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = range(750, 810);
        let b = range(780, 840);
        assert_eq!(a.overlaps(&b), b.overlaps(&a));
    }

    #[test]
    fn contains_excludes_end() {
        let r = range(540, 600);
        assert!(r.contains(540));
        assert!(r.contains(599));
        assert!(!r.contains(600));
    }

    #[test]
    fn find_conflict_returns_first_clash() {
        let candidate = parse_duration("12:30-1:30").unwrap();
        let existing = ["9:00-10:00", "garbage", "12:00-1:00", "13:00-14:00"];
        assert_eq!(find_conflict(&candidate, existing), Some("12:00-1:00"));
        assert_eq!(find_conflict(&candidate, ["9:00-10:00", "garbage"]), None);
    }

    #[test]
    fn normalizes_payload_fields() {
        assert_eq!(normalize_room_number("  a101 "), "A101");
        assert_eq!(normalize_duration(" 9:00-10:00\t"), "9:00-10:00");
        assert_eq!(normalize_day(" monday "), Some(Day::Monday));
        assert_eq!(normalize_day("FRIDAY"), Some(Day::Friday));
        assert_eq!(normalize_day("someday"), None);
        assert_eq!(normalize_day("   "), None);
    }
}
