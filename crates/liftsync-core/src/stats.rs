//! Workout history statistics.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, TimeZone, Weekday};
use serde::Serialize;

use crate::models::ExecutionRecord;

const WEEK: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekdayCount {
    pub weekday: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// Totals and frequencies over an owner's executions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub total: usize,
    pub total_duration_seconds: u64,
    /// Sunday through Saturday, always seven entries
    pub by_weekday: Vec<WeekdayCount>,
    /// Calendar days with at least one execution, oldest first
    pub by_day: Vec<DailyCount>,
}

impl ProgressSummary {
    /// Summarize `records`, bucketing days in the time zone `tz`.
    pub fn from_records<Tz: TimeZone>(records: &[ExecutionRecord], tz: &Tz) -> Self {
        let mut weekday_counts = [0_usize; 7];
        let mut daily: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        let mut total_duration_seconds = 0_u64;

        for record in records {
            total_duration_seconds += u64::from(record.duration_seconds);

            let Some(performed) = tz.timestamp_millis_opt(record.performed_at).single() else {
                continue;
            };
            let date = performed.date_naive();
            weekday_counts[date.weekday().num_days_from_sunday() as usize] += 1;
            *daily.entry(date).or_default() += 1;
        }

        Self {
            total: records.len(),
            total_duration_seconds,
            by_weekday: WEEK
                .iter()
                .zip(weekday_counts)
                .map(|(weekday, count)| WeekdayCount {
                    weekday: weekday.to_string(),
                    count,
                })
                .collect(),
            by_day: daily
                .into_iter()
                .map(|(date, count)| DailyCount { date, count })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewExecution;
    use chrono::{FixedOffset, Utc};
    use pretty_assertions::assert_eq;

    fn performed(at: i64, duration: u32) -> ExecutionRecord {
        ExecutionRecord::new(NewExecution {
            workout_id: "w".to_string(),
            workout_name: "W".to_string(),
            owner_id: "u1".to_string(),
            duration_seconds: duration,
            performed_at: Some(at),
            ..NewExecution::default()
        })
        .unwrap()
    }

    // 2024-03-03 is a Sunday
    const SUNDAY_NOON_UTC: i64 = 1_709_467_200_000;
    const HOUR: i64 = 3_600_000;

    #[test]
    fn empty_history_has_seven_zero_weekdays() {
        let summary = ProgressSummary::from_records(&[], &Utc);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.by_weekday.len(), 7);
        assert_eq!(summary.by_weekday[0].weekday, "Sun");
        assert!(summary.by_weekday.iter().all(|day| day.count == 0));
        assert!(summary.by_day.is_empty());
    }

    #[test]
    fn counts_by_weekday_and_day() {
        let records = vec![
            performed(SUNDAY_NOON_UTC, 600),
            performed(SUNDAY_NOON_UTC + HOUR, 300),
            performed(SUNDAY_NOON_UTC + 24 * HOUR, 900),
        ];

        let summary = ProgressSummary::from_records(&records, &Utc);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.total_duration_seconds, 1_800);
        assert_eq!(summary.by_weekday[0].count, 2);
        assert_eq!(summary.by_weekday[1].count, 1);
        assert_eq!(
            summary.by_day,
            vec![
                DailyCount {
                    date: NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
                    count: 2
                },
                DailyCount {
                    date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn days_follow_the_given_time_zone() {
        let records = vec![performed(SUNDAY_NOON_UTC + 11 * HOUR, 60)];
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();

        let summary = ProgressSummary::from_records(&records, &tokyo);
        assert_eq!(summary.by_weekday[1].count, 1);
        assert_eq!(
            summary.by_day[0].date,
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
        );
    }
}
