use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
use serde::Serialize;
use tracing::{instrument, trace};

use crate::{
    snapshot::entities::TimeLog,
    utils::{
        percentage::{Percentage, css_ser},
        time::{seconds_f64, start_of_day},
    },
};

/// Horizontal placement of a log inside its day column. Only meaningful for the day it was
/// computed for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutAssignment {
    #[serde(serialize_with = "css_ser::serialize")]
    pub left: Percentage,
    #[serde(serialize_with = "css_ser::serialize")]
    pub width: Percentage,
}

/// Places overlapping logs side by side.
///
/// Logs are walked in start order and collected into clusters: a log joins the current cluster
/// if it starts before the latest end seen in it, otherwise it opens a new one. Inside a cluster
/// of `n` logs the i-th one (in arrival order) takes the slot `[i/n, (i+1)/n)`.
///
/// This is a single greedy pass. It doesn't search for the minimum amount of columns, so a
/// cluster chained together by one long log gives every member its own column.
pub fn layout(day_logs: &[TimeLog]) -> HashMap<Arc<str>, LayoutAssignment> {
    let mut sorted = day_logs.iter().collect::<Vec<_>>();
    // stable, so logs starting together keep their input order
    sorted.sort_by_key(|v| v.start_time);

    let mut clusters: Vec<Vec<&TimeLog>> = vec![];
    let mut cluster_end: Option<DateTime<Utc>> = None;
    for log in sorted {
        match (clusters.last_mut(), cluster_end) {
            (Some(cluster), Some(end)) if log.start_time < end => {
                cluster.push(log);
                cluster_end = Some(end.max(log.end_time));
            }
            _ => {
                clusters.push(vec![log]);
                cluster_end = Some(log.end_time);
            }
        }
    }

    let mut assignments = HashMap::with_capacity(day_logs.len());
    for cluster in clusters {
        let count = cluster.len();
        trace!("Cluster of {count} starting at {}", cluster[0].start_time);
        for (index, log) in cluster.into_iter().enumerate() {
            assignments.insert(
                log.id.clone(),
                LayoutAssignment {
                    left: Percentage::slot(index, count),
                    width: Percentage::slot(1, count),
                },
            );
        }
    }
    assignments
}

/// Logs that started on `date` in `tz`, with anything running past midnight cut at the start of
/// the next day. Continuation into the following day is left to the caller.
pub fn day_logs<Tz: TimeZone>(logs: &[TimeLog], tz: &Tz, date: NaiveDate) -> Vec<TimeLog> {
    let day_start = start_of_day(tz, date).to_utc();
    let day_end = date
        .succ_opt()
        .map(|next| start_of_day(tz, next).to_utc())
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    logs.iter()
        .filter(|v| v.start_time >= day_start && v.start_time < day_end)
        .map(|v| {
            if v.end_time > day_end {
                v.clone().with_end(day_end)
            } else {
                v.clone()
            }
        })
        .collect()
}

/// [layout] of everything that started on `date`.
#[instrument(skip(logs, tz))]
pub fn layout_day<Tz: TimeZone>(
    logs: &[TimeLog],
    tz: &Tz,
    date: NaiveDate,
) -> (Vec<TimeLog>, HashMap<Arc<str>, LayoutAssignment>) {
    let logs = day_logs(logs, tz, date);
    let assignments = layout(&logs);
    (logs, assignments)
}

/// Vertical geometry of a 24 hour schedule column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScheduleMetrics {
    pub hour_height: f64,
}

impl ScheduleMetrics {
    pub const MIN_EVENT_HEIGHT: f64 = 10.;
    pub const EVENT_PADDING: f64 = 2.;

    pub fn new(hour_height: f64) -> Self {
        Self { hour_height }
    }

    pub fn total_height(&self) -> f64 {
        24. * self.hour_height
    }

    /// Offset from the top of the column, minute precision.
    pub fn top<Tz: TimeZone>(&self, start: &DateTime<Tz>) -> f64 {
        (start.hour() * 60 + start.minute()) as f64 * (self.hour_height / 60.)
    }

    pub fn height(&self, duration: Duration) -> f64 {
        let minutes = seconds_f64(duration.max(Duration::zero())) / 60.;
        (minutes * (self.hour_height / 60.) - Self::EVENT_PADDING).max(Self::MIN_EVENT_HEIGHT)
    }
}

impl Default for ScheduleMetrics {
    fn default() -> Self {
        Self::new(50.)
    }
}
