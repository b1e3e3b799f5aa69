use chrono::{DateTime, NaiveDate, TimeZone};
use itertools::Itertools;
use std::fmt::Display;
use time_humanize::{Accuracy, HumanTime, Tense};

use crate::session::SessionRecord;

/// `HH:MM:SS` for the live timer; hours keep growing past 99
pub fn format_hms(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// `Xh Ym` for recorded durations
pub fn format_hours_minutes(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    format!("{hours}h {minutes}m")
}

/// `Sat, Jun 15`
pub fn format_day<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    at.format("%a, %b %-d").to_string()
}

/// `9:05 AM`
pub fn format_clock_time<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    at.format("%-I:%M %p").to_string()
}

/// Rough "x ago" label for how long before `now` something happened
pub fn format_ago<Tz: TimeZone>(then: &DateTime<Tz>, now: &DateTime<Tz>) -> String {
    let secs = (now.clone() - then.clone()).num_seconds().max(0);
    HumanTime::from_seconds(secs).to_text_en(Accuracy::Rough, Tense::Past)
}

/// Records sharing a calendar day in the display timezone
#[derive(Debug, PartialEq)]
pub struct DayGroup<'a> {
    pub day: NaiveDate,
    pub total_seconds: u64,
    pub records: Vec<&'a SessionRecord>,
}

/// Group consecutive records by the local day they started on.
///
/// History is newest-first, so groups come out newest day first.
pub fn group_by_day<'a, Tz: TimeZone>(records: &'a [SessionRecord], tz: &Tz) -> Vec<DayGroup<'a>> {
    records
        .iter()
        .chunk_by(|record| record.started_at.with_timezone(tz).date_naive())
        .into_iter()
        .map(|(day, group)| {
            let records: Vec<&SessionRecord> = group.collect();
            DayGroup {
                day,
                total_seconds: records.iter().map(|r| r.duration_seconds).sum(),
                records,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, Utc};

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(59), "00:00:59");
        assert_eq!(format_hms(3661), "01:01:01");
        assert_eq!(format_hms(1200), "00:20:00");
    }

    #[test]
    fn test_format_hms_past_a_day() {
        assert_eq!(format_hms(100 * 3600 + 5), "100:00:05");
    }

    #[test]
    fn test_format_hours_minutes() {
        assert_eq!(format_hours_minutes(0), "0h 0m");
        assert_eq!(format_hours_minutes(12_600), "3h 30m");
        assert_eq!(format_hours_minutes(27_900 + 59), "7h 45m");
    }

    #[test]
    fn test_format_day_and_clock_time() {
        let at = Utc.with_ymd_and_hms(2023, 6, 15, 14, 5, 0).unwrap();
        assert_eq!(format_day(&at), "Thu, Jun 15");
        assert_eq!(format_clock_time(&at), "2:05 PM");

        let morning = Utc.with_ymd_and_hms(2023, 6, 15, 9, 0, 0).unwrap();
        assert_eq!(format_clock_time(&morning), "9:00 AM");
    }

    #[test]
    fn test_format_ago() {
        let now = Utc.with_ymd_and_hms(2023, 6, 15, 14, 0, 0).unwrap();
        let label = format_ago(&(now - Duration::hours(2)), &now);
        assert!(label.contains("hour"), "unexpected label {label}");
        assert!(label.ends_with("ago"), "unexpected label {label}");
    }

    fn record(id: &str, start: DateTime<Utc>, duration: u64) -> SessionRecord {
        SessionRecord {
            id: id.into(),
            task_name: id.into(),
            started_at: start,
            ended_at: start + Duration::seconds(duration as i64),
            duration_seconds: duration,
        }
    }

    #[test]
    fn test_group_by_day() {
        let day2 = Utc.with_ymd_and_hms(2023, 6, 15, 0, 0, 0).unwrap();
        let day1 = Utc.with_ymd_and_hms(2023, 6, 14, 0, 0, 0).unwrap();
        let records = vec![
            record("c", day2 + Duration::hours(14), 600),
            record("b", day2 + Duration::hours(9), 1200),
            record("a", day1 + Duration::hours(8), 300),
        ];

        let groups = group_by_day(&records, &Utc);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].day, day2.date_naive());
        assert_eq!(groups[0].total_seconds, 1800);
        assert_eq!(groups[0].records.len(), 2);
        assert_eq!(groups[1].records[0].id, "a");
    }

    #[test]
    fn test_group_by_day_respects_timezone() {
        // 23:30 UTC is already the next day at UTC+2
        let late = Utc.with_ymd_and_hms(2023, 6, 14, 23, 30, 0).unwrap();
        let records = vec![record("late", late, 60)];
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();

        let groups = group_by_day(&records, &plus_two);
        assert_eq!(
            groups[0].day,
            NaiveDate::from_ymd_opt(2023, 6, 15).unwrap()
        );
    }

    #[test]
    fn test_group_by_day_empty() {
        assert!(group_by_day(&[], &Utc).is_empty());
    }
}
