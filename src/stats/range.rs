use std::fmt::Display;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use clap::ValueEnum;
use now::DateTimeNow;
use serde::{Deserialize, Serialize};

use crate::utils::time::{end_of_day, start_of_day};

/// Calendar unit a statistics period covers.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
    Year,
}

impl Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Granularity::Day => write!(f, "day"),
            Granularity::Week => write!(f, "week"),
            Granularity::Month => write!(f, "month"),
            Granularity::Year => write!(f, "year"),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    Sunday,
    #[default]
    Monday,
}

impl WeekStart {
    /// Days between the start of the week and `date`.
    pub fn offset(&self, date: NaiveDate) -> i64 {
        let day_of_week = date.weekday().num_days_from_sunday() as i64;
        match self {
            WeekStart::Sunday => day_of_week,
            WeekStart::Monday if day_of_week == 0 => 6,
            WeekStart::Monday => day_of_week - 1,
        }
    }
}

impl Display for WeekStart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeekStart::Sunday => write!(f, "sunday"),
            WeekStart::Monday => write!(f, "monday"),
        }
    }
}

/// Inclusive boundaries of a period. For calendar units `start` is 00:00:00.000 of the first day
/// and `end` is 23:59:59.999 of the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        if end < start {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    /// Period of equal length immediately preceding this one. This is a fixed-duration
    /// translation rather than a calendar decrement, so the previous "month" of a 31 day month is
    /// simply 31 days earlier and can start mid-month.
    pub fn previous(&self) -> DateRange {
        let shift = self.length();
        DateRange {
            start: self.start - shift,
            end: self.end - shift,
        }
    }

    pub fn contains(&self, moment: DateTime<Utc>) -> bool {
        self.start <= moment && moment <= self.end
    }

    /// Whether an interval lies entirely within the range. Partially overlapping intervals are
    /// not contained.
    pub fn contains_interval(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start >= self.start && end <= self.end
    }
}

/// Computes the period of `granularity` that contains `date`, using the local calendar of the
/// date's timezone.
pub fn resolve<Tz: TimeZone>(
    date: &DateTime<Tz>,
    granularity: Granularity,
    week_start: WeekStart,
) -> DateRange {
    let tz = date.timezone();
    let day = date.date_naive();

    let (first, last) = match granularity {
        Granularity::Day => (day, day),
        Granularity::Week => {
            let first = day - Duration::days(week_start.offset(day));
            (first, first + Duration::days(6))
        }
        Granularity::Month => {
            let first = date.beginning_of_month().date_naive();
            (first, last_day_of_month(first))
        }
        Granularity::Year => {
            let first = date.beginning_of_year().date_naive();
            let last = NaiveDate::from_ymd_opt(first.year(), 12, 31).unwrap_or(first);
            (first, last)
        }
    };

    DateRange {
        start: start_of_day(&tz, first).to_utc(),
        end: end_of_day(&tz, last).to_utc(),
    }
}

/// Day 0 of the next month.
fn last_day_of_month(first: NaiveDate) -> NaiveDate {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|v| v.pred_opt())
        .unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Timelike, Utc, Weekday};

    use super::{DateRange, Granularity, WeekStart, resolve};

    fn at(y: i32, m: u32, d: u32, h: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn day_range() {
        let range = resolve(&at(2024, 4, 5, 15), Granularity::Day, WeekStart::Monday);
        assert_eq!(range.start, at(2024, 4, 5, 0));
        assert_eq!(range.end, at(2024, 4, 6, 0) - Duration::milliseconds(1));
    }

    #[test]
    fn monday_week_contains_date() {
        // 2024-04-07 is a Sunday
        for day in 1..=14 {
            let date = at(2024, 4, day, 12);
            let range = resolve(&date, Granularity::Week, WeekStart::Monday);
            assert_eq!(range.start.weekday(), Weekday::Mon, "{date}");
            assert!(range.contains(date), "{date}");
            assert_eq!(range.length(), Duration::days(7) - Duration::milliseconds(1));
        }
        let sunday = resolve(&at(2024, 4, 7, 12), Granularity::Week, WeekStart::Monday);
        assert_eq!(sunday.start, at(2024, 4, 1, 0));
    }

    #[test]
    fn sunday_week() {
        let range = resolve(&at(2024, 4, 7, 12), Granularity::Week, WeekStart::Sunday);
        assert_eq!(range.start, at(2024, 4, 7, 0));
        let range = resolve(&at(2024, 4, 6, 12), Granularity::Week, WeekStart::Sunday);
        assert_eq!(range.start, at(2024, 3, 31, 0));
        assert_eq!(range.start.weekday(), Weekday::Sun);
    }

    #[test]
    fn month_range_handles_leap_years() {
        let range = resolve(&at(2024, 2, 14, 12), Granularity::Month, WeekStart::Monday);
        assert_eq!(range.start, at(2024, 2, 1, 0));
        assert_eq!(range.end.day(), 29);
        assert_eq!(range.end.timestamp_subsec_millis(), 999);

        let december = resolve(&at(2023, 12, 31, 23), Granularity::Month, WeekStart::Monday);
        assert_eq!(december.end, at(2024, 1, 1, 0) - Duration::milliseconds(1));
    }

    #[test]
    fn year_range() {
        let range = resolve(&at(2024, 7, 4, 1), Granularity::Year, WeekStart::Sunday);
        assert_eq!(range.start, at(2024, 1, 1, 0));
        assert_eq!(range.end, at(2025, 1, 1, 0) - Duration::milliseconds(1));
    }

    #[test]
    fn respects_local_calendar() {
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        // 23:30 UTC on the 4th is already the 5th in UTC+3
        let date = Utc
            .with_ymd_and_hms(2024, 4, 4, 23, 30, 0)
            .unwrap()
            .with_timezone(&tz);
        let range = resolve(&date, Granularity::Day, WeekStart::Monday);
        assert_eq!(range.start, at(2024, 4, 4, 21));
        assert_eq!(range.start.with_timezone(&tz).hour(), 0);
        assert_eq!(
            range.start.with_timezone(&tz).date_naive(),
            NaiveDate::from_ymd_opt(2024, 4, 5).unwrap()
        );
    }

    #[test]
    fn previous_is_fixed_shift() {
        let range = resolve(&at(2024, 3, 15, 12), Granularity::Month, WeekStart::Monday);
        let previous = range.previous();
        assert_eq!(previous.length(), range.length());
        assert_eq!(previous.end, range.start);
        // 31 days back from March 1st lands in January
        assert_eq!(previous.start, at(2024, 1, 30, 0) + Duration::milliseconds(1));
        assert_eq!(previous.start.month(), 1);
        assert_eq!(previous.start.day(), 30);
    }

    #[test]
    fn reversed_bounds_are_swapped() {
        let range = DateRange::new(at(2024, 4, 5, 12), at(2024, 4, 5, 10));
        assert!(range.start <= range.end);
    }
}
