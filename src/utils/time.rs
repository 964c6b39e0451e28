use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone};

const MAX_GAP_MINUTES: i64 = 24 * 60;

/// This is the standard way of converting a date to a record file name.
pub fn date_to_record_name(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Localizes a wall-clock time. Ambiguous times resolve to the earlier instant, times skipped by
/// a transition resolve to the first minute after the gap.
pub fn localize<Tz: TimeZone>(tz: &Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Tz> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(v) => v,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => (1..=MAX_GAP_MINUTES)
            .find_map(|m| {
                tz.from_local_datetime(&(naive + Duration::minutes(m)))
                    .earliest()
            })
            .unwrap_or_else(|| tz.from_utc_datetime(&naive)),
    }
}

/// 00:00:00.000 of `date` in `tz`.
pub fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    localize(tz, date, NaiveTime::MIN)
}

/// 23:59:59.999 of `date` in `tz`.
pub fn end_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let last_milli = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    localize(tz, date, last_milli)
}

/// Returns start of the next day.
pub fn next_day_start<Tz: TimeZone>(date: DateTime<Tz>) -> DateTime<Tz> {
    let tz = date.timezone();
    let next = date.date_naive().succ_opt().unwrap_or(NaiveDate::MAX);
    start_of_day(&tz, next)
}

/// Fractional seconds of a duration. Microsecond precision is enough for statistics.
pub fn seconds_f64(duration: Duration) -> f64 {
    match duration.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.,
        None => duration.num_milliseconds() as f64 / 1_000.,
    }
}

/// Hours and minutes of a duration, used for compact display.
pub fn duration_hm(duration: Duration) -> (i64, i64) {
    let duration = duration.max(Duration::zero());
    (duration.num_hours(), duration.num_minutes() % 60)
}

pub fn format_duration(duration: Duration) -> String {
    match duration_hm(duration) {
        (0, m) => format!("{m}m"),
        (h, m) => format!("{h}h{m}m"),
    }
}

/// Serializes durations as fractional seconds, which is what renderers consume.
pub mod seconds_ser {
    use chrono::Duration;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(super::seconds_f64(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = f64::deserialize(deserializer)?;
        Ok(Duration::microseconds((s * 1_000_000.).round() as i64))
    }
}
