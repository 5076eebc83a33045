//! Calendar resolution
//!
//! Anchors extracted date/time candidates to the per-turn reference clock.

use booking_agent_core::{DateCandidate, TimeCandidate};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};

/// Result of anchoring a date candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateResolution {
    Resolved(NaiveDate),
    /// Several possible days, next occurrences first
    Ambiguous(Vec<NaiveDate>),
    /// Impossible date ("31/02"); treated as no candidate
    Invalid,
}

/// Resolve a date candidate relative to `today`
///
/// - day/month without year: next occurrence that is not in the past
/// - weekday: next occurrence strictly after today
/// - relative offset: today plus the offset (may be in the past)
/// - ambiguous: next occurrence on or after today of each possible weekday
pub fn resolve_date(candidate: &DateCandidate, today: NaiveDate) -> DateResolution {
    match candidate {
        DateCandidate::Absolute { date } => DateResolution::Resolved(*date),
        DateCandidate::DayMonth { day, month } => resolve_day_month(*day, *month, today),
        DateCandidate::Weekday { weekday } => {
            let ahead = days_until(today.weekday(), *weekday);
            let ahead = if ahead == 0 { 7 } else { ahead };
            add_days(today, ahead)
        },
        DateCandidate::RelativeDays { days } => add_days(today, *days),
        DateCandidate::Ambiguous { weekdays, .. } => {
            let mut dates: Vec<NaiveDate> = weekdays
                .iter()
                .filter_map(|w| today.checked_add_signed(Duration::days(days_until(today.weekday(), *w))))
                .collect();
            dates.sort();
            dates.dedup();
            DateResolution::Ambiguous(dates)
        },
    }
}

/// Structurally valid time, or None for "25:00" and friends
pub fn resolve_time(candidate: &TimeCandidate) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(candidate.hour, candidate.minute, 0)
}

fn resolve_day_month(day: u32, month: u32, today: NaiveDate) -> DateResolution {
    let this_year = NaiveDate::from_ymd_opt(today.year(), month, day);
    let next_year = NaiveDate::from_ymd_opt(today.year() + 1, month, day);

    match (this_year, next_year) {
        (Some(date), _) if date >= today => DateResolution::Resolved(date),
        (_, Some(date)) => DateResolution::Resolved(date),
        (Some(date), None) => DateResolution::Resolved(date),
        (None, None) => DateResolution::Invalid,
    }
}

fn days_until(from: Weekday, to: Weekday) -> i64 {
    let from = from.num_days_from_monday() as i64;
    let to = to.num_days_from_monday() as i64;
    (to - from).rem_euclid(7)
}

fn add_days(today: NaiveDate, days: i64) -> DateResolution {
    Duration::try_days(days)
        .and_then(|delta| today.checked_add_signed(delta))
        .map(DateResolution::Resolved)
        .unwrap_or(DateResolution::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // Wednesday
    fn today() -> NaiveDate {
        date(2026, 10, 14)
    }

    #[test]
    fn test_weekday_is_strictly_future() {
        let saturday = DateCandidate::Weekday {
            weekday: Weekday::Sat,
        };
        assert_eq!(resolve_date(&saturday, today()), DateResolution::Resolved(date(2026, 10, 17)));

        let wednesday = DateCandidate::Weekday {
            weekday: Weekday::Wed,
        };
        assert_eq!(resolve_date(&wednesday, today()), DateResolution::Resolved(date(2026, 10, 21)));
    }

    #[test]
    fn test_relative_days() {
        let tomorrow = DateCandidate::RelativeDays { days: 1 };
        assert_eq!(resolve_date(&tomorrow, today()), DateResolution::Resolved(date(2026, 10, 15)));

        let yesterday = DateCandidate::RelativeDays { days: -1 };
        assert_eq!(resolve_date(&yesterday, today()), DateResolution::Resolved(date(2026, 10, 13)));
    }

    #[test]
    fn test_day_month_rolls_to_next_year() {
        let christmas = DateCandidate::DayMonth { day: 25, month: 12 };
        assert_eq!(resolve_date(&christmas, today()), DateResolution::Resolved(date(2026, 12, 25)));

        let march = DateCandidate::DayMonth { day: 3, month: 3 };
        assert_eq!(resolve_date(&march, today()), DateResolution::Resolved(date(2027, 3, 3)));

        let same_day = DateCandidate::DayMonth { day: 14, month: 10 };
        assert_eq!(resolve_date(&same_day, today()), DateResolution::Resolved(today()));
    }

    #[test]
    fn test_impossible_day_month() {
        let feb_31 = DateCandidate::DayMonth { day: 31, month: 2 };
        assert_eq!(resolve_date(&feb_31, today()), DateResolution::Invalid);

        let month_13 = DateCandidate::DayMonth { day: 1, month: 13 };
        assert_eq!(resolve_date(&month_13, today()), DateResolution::Invalid);
    }

    #[test]
    fn test_ambiguous_weekend() {
        let weekend = DateCandidate::Ambiguous {
            expression: "este fin de semana".to_string(),
            weekdays: vec![Weekday::Sun, Weekday::Sat],
        };
        assert_eq!(
            resolve_date(&weekend, today()),
            DateResolution::Ambiguous(vec![date(2026, 10, 17), date(2026, 10, 18)])
        );
    }

    #[test]
    fn test_resolve_time() {
        assert_eq!(
            resolve_time(&TimeCandidate::new(14, 30)),
            NaiveTime::from_hms_opt(14, 30, 0)
        );
        assert_eq!(resolve_time(&TimeCandidate::new(25, 0)), None);
        assert_eq!(resolve_time(&TimeCandidate::new(13, 75)), None);
    }

    #[test]
    fn test_out_of_range_offset_is_invalid() {
        for days in [i64::MAX, i64::MIN, 1_000_000_000_000_000] {
            let candidate = DateCandidate::RelativeDays { days };
            assert_eq!(resolve_date(&candidate, today()), DateResolution::Invalid);
        }
    }
}
