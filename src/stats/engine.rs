use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, NaiveDate, TimeZone};
use tracing::{debug, instrument};

use crate::{
    config::StatsConfig,
    snapshot::entities::{Snapshot, TimeLog},
};

use super::{
    aggregate::{AggregationResult, ChildStat, Exclusions, NodeStat, aggregate},
    comparison::{Delta, PreviousPeriodIndex, delta, previous_index},
    layout::{LayoutAssignment, layout_day},
    memo::Memo,
    range::{DateRange, Granularity, WeekStart, resolve},
    taxonomy::{AnyTaxonomy, TaxonomyKind, UnscopedPolicy},
};

/// Everything a breakdown view of one taxonomy needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodReport {
    pub kind: TaxonomyKind,
    pub range: DateRange,
    pub current: AggregationResult,
    pub previous: PreviousPeriodIndex,
}

impl PeriodReport {
    pub fn previous_range(&self) -> DateRange {
        self.previous.range
    }

    pub fn total_delta(&self) -> Option<Delta> {
        delta(self.current.total_duration, self.previous.total_duration)
    }

    pub fn node_delta(&self, node: &NodeStat) -> Option<Delta> {
        delta(node.duration, self.previous.parent(&node.id))
    }

    pub fn child_delta(&self, node: &NodeStat, child: &ChildStat) -> Option<Delta> {
        delta(child.duration, self.previous.child(&node.id, &child.id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ReportKey {
    fingerprint: u64,
    kind: TaxonomyKind,
    range: DateRange,
    exclusions: Exclusions,
    unscoped: UnscopedPolicy,
}

/// Entry point of statistics. Holds a snapshot and memoizes reports computed over it, so
/// switching back and forth between views doesn't recompute anything.
pub struct StatsEngine {
    snapshot: Snapshot,
    week_start: WeekStart,
    unscoped: UnscopedPolicy,
    reports: Memo<ReportKey, Arc<PeriodReport>>,
}

impl StatsEngine {
    pub fn new(snapshot: Snapshot, config: &StatsConfig) -> Self {
        Self {
            snapshot,
            week_start: config.week_start,
            unscoped: config.unscoped,
            reports: Memo::new(config.cache_capacity),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Replaces the data. Cached reports of the old snapshot can't be hit anymore and age out.
    pub fn set_snapshot(&mut self, snapshot: Snapshot) {
        if snapshot.fingerprint() != self.snapshot.fingerprint() {
            debug!("Snapshot changed");
        }
        self.snapshot = snapshot;
    }

    pub fn resolve<Tz: TimeZone>(
        &self,
        reference: &DateTime<Tz>,
        granularity: Granularity,
    ) -> DateRange {
        resolve(reference, granularity, self.week_start)
    }

    /// Report of the `granularity` period around `reference`, `reference` being the explicit
    /// "now" of the caller.
    pub fn report<Tz: TimeZone>(
        &mut self,
        kind: TaxonomyKind,
        reference: &DateTime<Tz>,
        granularity: Granularity,
        exclusions: &Exclusions,
    ) -> Arc<PeriodReport> {
        let range = self.resolve(reference, granularity);
        self.report_for_range(kind, range, exclusions)
    }

    #[instrument(skip(self, exclusions))]
    pub fn report_for_range(
        &mut self,
        kind: TaxonomyKind,
        range: DateRange,
        exclusions: &Exclusions,
    ) -> Arc<PeriodReport> {
        let key = ReportKey {
            fingerprint: self.snapshot.fingerprint(),
            kind,
            range,
            exclusions: exclusions.clone(),
            unscoped: self.unscoped,
        };
        let snapshot = &self.snapshot;
        let unscoped = self.unscoped;
        self.reports.get_or_compute(key, || {
            debug!("Computing report");
            let taxonomy = AnyTaxonomy::from_definitions(kind, &snapshot.taxonomies, unscoped);
            Arc::new(PeriodReport {
                kind,
                range,
                current: aggregate(&snapshot.logs, &taxonomy, &range, exclusions),
                previous: previous_index(&snapshot.logs, &taxonomy, &range, exclusions),
            })
        })
    }

    /// Logs that started on `date` together with their side by side placement.
    pub fn schedule<Tz: TimeZone>(
        &self,
        tz: &Tz,
        date: NaiveDate,
    ) -> (Vec<TimeLog>, HashMap<Arc<str>, LayoutAssignment>) {
        layout_day(&self.snapshot.logs, tz, date)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::StatsEngine;
    use crate::{
        config::StatsConfig,
        snapshot::entities::{Activity, Category, Snapshot, Taxonomies, TimeLog},
        stats::{
            aggregate::Exclusions,
            comparison::Delta,
            range::Granularity,
            taxonomy::TaxonomyKind,
        },
    };

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, d, h, 0, 0).unwrap()
    }

    fn snapshot() -> Snapshot {
        let taxonomies = Taxonomies {
            categories: vec![Category {
                id: "work".into(),
                name: "Work".into(),
                theme_color: Some("text-blue-600".into()),
                activities: vec![Activity {
                    id: "code".into(),
                    name: "Code".into(),
                    color: None,
                }],
            }],
            ..Default::default()
        };
        Snapshot::new(
            vec![
                TimeLog::new("today", "work", "code", at(5, 9), at(5, 12)),
                TimeLog::new("yesterday", "work", "code", at(4, 9), at(4, 11)),
            ],
            taxonomies,
        )
    }

    #[test]
    fn report_with_delta() {
        let mut engine = StatsEngine::new(snapshot(), &StatsConfig::default());
        let report = engine.report(
            TaxonomyKind::Activity,
            &at(5, 20),
            Granularity::Day,
            &Exclusions::new(),
        );
        assert_eq!(report.current.total_duration, Duration::hours(3));
        assert_eq!(report.previous.total_duration, Duration::hours(2));
        assert_eq!(report.total_delta(), Some(Delta { percent: 50 }));

        let work = report.current.node("work").unwrap();
        assert_eq!(report.node_delta(work), Some(Delta { percent: 50 }));
        assert_eq!(
            report.child_delta(work, &work.children[0]),
            Some(Delta { percent: 50 })
        );
        assert_eq!(report.previous_range().end, report.range.start);
    }

    #[test]
    fn reports_are_memoized() {
        let mut engine = StatsEngine::new(snapshot(), &StatsConfig::default());
        let exclusions = Exclusions::new();
        let first = engine.report(TaxonomyKind::Activity, &at(5, 8), Granularity::Week, &exclusions);
        let second =
            engine.report(TaxonomyKind::Activity, &at(6, 8), Granularity::Week, &exclusions);
        assert!(Arc::ptr_eq(&first, &second));

        let excluded = engine.report(
            TaxonomyKind::Activity,
            &at(5, 8),
            Granularity::Week,
            &Exclusions::from(["work".into()]),
        );
        assert!(!Arc::ptr_eq(&first, &excluded));
        assert!(excluded.current.nodes.is_empty());
    }

    #[test]
    fn new_snapshot_is_recomputed() {
        let mut engine = StatsEngine::new(snapshot(), &StatsConfig::default());
        let exclusions = Exclusions::new();
        let before = engine.report(TaxonomyKind::Activity, &at(5, 8), Granularity::Day, &exclusions);

        engine.set_snapshot(Snapshot::new(vec![], Default::default()));
        let after = engine.report(TaxonomyKind::Activity, &at(5, 8), Granularity::Day, &exclusions);
        assert_eq!(before.current.total_duration, Duration::hours(3));
        assert_eq!(after.current.total_duration, Duration::zero());
    }

    #[test]
    fn schedule_of_day() {
        let engine = StatsEngine::new(snapshot(), &StatsConfig::default());
        let (logs, layout) = engine.schedule(&Utc, at(5, 0).date_naive());
        assert_eq!(logs.len(), 1);
        assert!(layout.contains_key("today"));
    }
}
