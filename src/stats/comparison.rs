use std::{collections::HashMap, sync::Arc};

use chrono::Duration;
use serde::Serialize;
use tracing::instrument;

use crate::{snapshot::entities::TimeLog, utils::time::seconds_f64};

use super::{
    aggregate::{Accumulation, Exclusions, accumulate, filter_logs},
    range::DateRange,
    taxonomy::Taxonomy,
};

/// Below this many seconds a period is treated as having no activity at all.
pub const MIN_SIGNAL_SECONDS: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Parent(Arc<str>),
    Child(Arc<str>, Arc<str>),
}

/// Flat lookup of durations in the previous period. There are no percentages or ordering, the
/// only consumer is delta computation.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviousPeriodIndex {
    pub range: DateRange,
    pub total_duration: Duration,
    pub by_node: HashMap<NodeKey, Duration>,
}

impl PreviousPeriodIndex {
    /// Nodes without logs in the previous period are reported as zero.
    pub fn parent(&self, id: &str) -> Duration {
        self.by_node
            .get(&NodeKey::Parent(id.into()))
            .copied()
            .unwrap_or_else(Duration::zero)
    }

    pub fn child(&self, parent: &str, child: &str) -> Duration {
        self.by_node
            .get(&NodeKey::Child(parent.into(), child.into()))
            .copied()
            .unwrap_or_else(Duration::zero)
    }
}

/// Runs the same filtering and splitting as [aggregate](super::aggregate::aggregate) over the
/// period preceding `range`.
#[instrument(skip(logs, taxonomy, exclusions), fields(kind = %taxonomy.kind()))]
pub fn previous_index<T: Taxonomy + ?Sized>(
    logs: &[TimeLog],
    taxonomy: &T,
    range: &DateRange,
    exclusions: &Exclusions,
) -> PreviousPeriodIndex {
    let previous = range.previous();
    let Accumulation { total, parents } =
        accumulate(filter_logs(logs, &previous, exclusions), taxonomy);

    let mut by_node = HashMap::new();
    for (parent, accumulated) in parents {
        for (child, duration) in accumulated.children {
            by_node.insert(NodeKey::Child(parent.clone(), child), duration);
        }
        by_node.insert(NodeKey::Parent(parent), accumulated.duration);
    }

    PreviousPeriodIndex {
        range: previous,
        total_duration: total,
        by_node,
    }
}

/// Growth or decline of a node between two periods, rounded to whole percents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Delta {
    pub percent: i64,
}

impl Delta {
    pub fn is_growth(&self) -> bool {
        self.percent > 0
    }
}

/// Change from `previous` to `current`. There is no meaningful change when either side is close
/// to zero, nor when it rounds to 0%.
pub fn delta(current: Duration, previous: Duration) -> Option<Delta> {
    let current = seconds_f64(current);
    let previous = seconds_f64(previous);
    if current < MIN_SIGNAL_SECONDS || previous < MIN_SIGNAL_SECONDS {
        return None;
    }

    let percent = ((current - previous) / previous * 100.).round() as i64;
    (percent != 0).then_some(Delta { percent })
}
