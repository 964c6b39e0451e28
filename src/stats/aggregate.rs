use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Arc,
};

use chrono::{Duration, NaiveDate, TimeZone};
use serde::Serialize;
use tracing::{instrument, trace};

use crate::{
    snapshot::entities::TimeLog,
    utils::{
        percentage::{Percentage, duration_percentage},
        time::seconds_ser,
    },
};

use super::{
    range::DateRange,
    taxonomy::{Membership, NodeRef, Taxonomy},
};

/// Activity category ids whose logs are left out of every statistic.
pub type Exclusions = BTreeSet<Arc<str>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildStat {
    pub id: Arc<str>,
    pub name: Arc<str>,
    #[serde(with = "seconds_ser")]
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStat {
    pub id: Arc<str>,
    pub name: Arc<str>,
    pub color: Option<Arc<str>>,
    #[serde(with = "seconds_ser")]
    pub duration: Duration,
    pub percentage: Percentage,
    pub children: Vec<ChildStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    #[serde(with = "seconds_ser")]
    pub total_duration: Duration,
    /// Sorted by duration, descending. Nodes without time are left out.
    pub nodes: Vec<NodeStat>,
}

impl AggregationResult {
    pub fn empty() -> Self {
        Self {
            total_duration: Duration::zero(),
            nodes: vec![],
        }
    }

    pub fn node(&self, id: &str) -> Option<&NodeStat> {
        self.nodes.iter().find(|v| &*v.id == id)
    }
}

/// Logs fully contained in `range` that don't belong to an excluded category. Intervals that
/// only partially overlap the range are dropped, not clipped.
pub fn filter_logs<'a>(
    logs: &'a [TimeLog],
    range: &'a DateRange,
    exclusions: &'a Exclusions,
) -> impl Iterator<Item = &'a TimeLog> + 'a {
    logs.iter().filter(move |log| {
        range.contains_interval(log.start_time, log.end_time)
            && !exclusions.contains(&log.category_id)
    })
}

#[derive(Debug, Default)]
pub(crate) struct ParentAccumulator {
    pub duration: Duration,
    /// Kept in arrival order so that equal durations sort deterministically.
    pub children: Vec<(Arc<str>, Duration)>,
}

impl ParentAccumulator {
    fn add(&mut self, child: Arc<str>, duration: Duration) {
        self.duration += duration;
        match self.children.iter_mut().find(|(id, _)| *id == child) {
            Some((_, total)) => *total += duration,
            None => self.children.push((child, duration)),
        }
    }
}

/// Raw per node sums, shared by the current period breakdown and the previous period index.
#[derive(Debug)]
pub(crate) struct Accumulation {
    pub total: Duration,
    pub parents: HashMap<Arc<str>, ParentAccumulator>,
}

impl Accumulation {
    fn new() -> Self {
        Self {
            total: Duration::zero(),
            parents: HashMap::new(),
        }
    }

    fn add(&mut self, NodeRef { parent, child }: NodeRef, duration: Duration) {
        self.parents.entry(parent).or_default().add(child, duration);
    }
}

/// Sums logs into their taxonomy nodes. Totals always use the full duration of each log, while
/// a log with several memberships gives every node an equal share.
pub(crate) fn accumulate<'a, T: Taxonomy + ?Sized>(
    logs: impl IntoIterator<Item = &'a TimeLog>,
    taxonomy: &T,
) -> Accumulation {
    let mut accumulation = Accumulation::new();

    for log in logs {
        let duration = log.duration();
        match taxonomy.membership(log) {
            Membership::Outside => continue,
            Membership::Untracked => {
                trace!("Log {} has no known node in {}", log.id, taxonomy.kind());
            }
            Membership::Whole(node) => accumulation.add(node, duration),
            Membership::Split(nodes) if nodes.is_empty() => {}
            Membership::Split(nodes) => {
                let share = duration / nodes.len() as i32;
                for node in nodes {
                    accumulation.add(node, share);
                }
            }
        }
        accumulation.total += duration;
    }

    accumulation
}

/// Breaks down the time logged within `range` over a taxonomy.
#[instrument(skip(logs, taxonomy, exclusions), fields(kind = %taxonomy.kind(), log_count = logs.len()))]
pub fn aggregate<T: Taxonomy + ?Sized>(
    logs: &[TimeLog],
    taxonomy: &T,
    range: &DateRange,
    exclusions: &Exclusions,
) -> AggregationResult {
    let Accumulation {
        total,
        mut parents,
    } = accumulate(filter_logs(logs, range, exclusions), taxonomy);

    let mut nodes = taxonomy
        .parents()
        .into_iter()
        .filter_map(|info| {
            let accumulated = parents.remove(&info.id)?;
            if accumulated.duration <= Duration::zero() {
                return None;
            }

            let mut children = accumulated
                .children
                .into_iter()
                .filter(|(_, duration)| *duration > Duration::zero())
                .filter_map(|(id, duration)| {
                    let name = taxonomy.child_name(&info.id, &id)?;
                    Some(ChildStat { id, name, duration })
                })
                .collect::<Vec<_>>();
            children.sort_by(|a, b| b.duration.cmp(&a.duration));

            Some(NodeStat {
                percentage: duration_percentage(accumulated.duration, total),
                duration: accumulated.duration,
                id: info.id,
                name: info.name,
                color: info.color,
                children,
            })
        })
        .collect::<Vec<_>>();
    nodes.sort_by(|a, b| b.duration.cmp(&a.duration));

    AggregationResult {
        total_duration: total,
        nodes,
    }
}

/// Time logged on every local day of `range`, including days without logs. Logs are attributed
/// to the day they started on.
pub fn daily_totals<Tz: TimeZone>(
    logs: &[TimeLog],
    range: &DateRange,
    exclusions: &Exclusions,
    tz: &Tz,
) -> BTreeMap<NaiveDate, Duration> {
    let first = range.start.with_timezone(tz).date_naive();
    let last = range.end.with_timezone(tz).date_naive();
    let mut totals = first
        .iter_days()
        .take_while(|v| *v <= last)
        .map(|v| (v, Duration::zero()))
        .collect::<BTreeMap<_, _>>();

    for log in filter_logs(logs, range, exclusions) {
        let day = log.start_time.with_timezone(tz).date_naive();
        *totals.entry(day).or_insert_with(Duration::zero) += log.duration();
    }
    totals
}
