//! Calendar day keys and history records.

use core::fmt;
use time::Date;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::destination::Destination;

const DAY_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Calendar date (UTC) partitioning the history log files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(Date);

impl DayKey {
    pub fn today_utc() -> Self {
        Self(OffsetDateTime::now_utc().date())
    }

    pub fn from_date(date: Date) -> Self {
        Self(date)
    }

    /// Parses an ISO `YYYY-MM-DD` day key, as used in log file names.
    pub fn parse(value: &str) -> Option<Self> {
        Date::parse(value, DAY_FORMAT).ok().map(Self)
    }

    /// The UTC calendar date a unix timestamp falls on.
    pub fn from_unix_seconds(timestamp: i64) -> Option<Self> {
        OffsetDateTime::from_unix_timestamp(timestamp)
            .ok()
            .map(|moment| Self(moment.date()))
    }

    pub fn as_date(&self) -> Date {
        self.0
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self.0.format(DAY_FORMAT).map_err(|_| fmt::Error)?;
        f.write_str(&formatted)
    }
}

/// One committed navigation: destination plus unix seconds. Never mutated
/// after creation; owned by the day's log it was appended to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub destination: Destination,
    pub timestamp: i64,
}

impl HistoryEntry {
    pub fn new(destination: Destination, timestamp: i64) -> Self {
        Self {
            destination,
            timestamp,
        }
    }
}

/// Current wall-clock time in unix seconds.
pub fn now_unix_seconds() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

#[cfg(test)]
mod tests {
    use super::DayKey;
    use time::macros::date;

    #[test]
    fn day_key_formats_as_iso_date() {
        let key = DayKey::from_date(date!(2024 - 05 - 01));
        assert_eq!(key.to_string(), "2024-05-01");
    }

    #[test]
    fn day_key_parse_round_trips_display() {
        let key = DayKey::parse("2024-05-01");
        assert_eq!(key, Some(DayKey::from_date(date!(2024 - 05 - 01))));
    }

    #[test]
    fn day_key_parse_rejects_non_dates() {
        assert!(DayKey::parse("not-a-date").is_none());
        assert!(DayKey::parse("2024-13-40").is_none());
        assert!(DayKey::parse("").is_none());
    }

    #[test]
    fn unix_seconds_map_to_their_utc_date() {
        // 2024-05-01T12:00:00Z
        let key = DayKey::from_unix_seconds(1_714_564_800);
        assert_eq!(key, Some(DayKey::from_date(date!(2024 - 05 - 01))));
    }

    #[test]
    fn day_keys_order_chronologically() {
        let earlier = DayKey::from_date(date!(2024 - 04 - 30));
        let later = DayKey::from_date(date!(2024 - 05 - 01));
        assert!(earlier < later);
    }
}
