//! Printing of statistics for terminals and other programs.

pub mod markdown;
pub mod svg;

use std::{collections::HashMap, fmt::Display, sync::Arc};

use ansi_term::Colour;
use chrono::{DateTime, Duration, TimeZone};
use serde::Serialize;

use crate::{
    snapshot::entities::{Taxonomies, TimeLog},
    stats::{
        aggregate::{AggregationResult, ChildStat, NodeStat},
        comparison::Delta,
        engine::PeriodReport,
        layout::{LayoutAssignment, ScheduleMetrics},
        range::DateRange,
        taxonomy::{TaxonomyKind, UNKNOWN_ACTIVITY},
    },
    utils::{
        percentage::Percentage,
        time::{format_duration, seconds_ser},
    },
};

/// `+12%`, `-40%` or nothing at all when there's no meaningful change.
pub fn format_delta(delta: Option<Delta>, colored: bool) -> String {
    let Some(delta) = delta else {
        return String::new();
    };
    let text = format!("{:+}%", delta.percent);
    match (colored, delta.is_growth()) {
        (false, _) => text,
        (true, true) => Colour::Green.paint(text).to_string(),
        (true, false) => Colour::Red.paint(text).to_string(),
    }
}

pub fn format_range<Tz: TimeZone>(range: &DateRange, tz: &Tz) -> String {
    let start = range.start.with_timezone(tz).date_naive();
    let end = range.end.with_timezone(tz).date_naive();
    if start == end {
        start.format("%Y-%m-%d").to_string()
    } else {
        format!("{}..{}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"))
    }
}

/// Tab separated breakdown, one line per node with children indented under their parent. Nodes
/// with a smaller share than `min_percentage` are left out.
pub fn summary_lines(
    report: &PeriodReport,
    min_percentage: Percentage,
    with_children: bool,
    colored: bool,
) -> Vec<String> {
    let mut lines = vec![format!(
        "Total\t{}\t{}",
        format_duration(report.current.total_duration),
        format_delta(report.total_delta(), colored)
    )];
    for node in report
        .current
        .nodes
        .iter()
        .filter(|v| v.percentage >= min_percentage)
    {
        lines.push(format!(
            "{}%\t{}\t{}\t{}",
            node.percentage.round() as i64,
            format_duration(node.duration),
            node.name,
            format_delta(report.node_delta(node), colored)
        ));
        if !with_children {
            continue;
        }
        for child in &node.children {
            lines.push(format!(
                "\t{}\t  {}\t{}",
                format_duration(child.duration),
                child.name,
                format_delta(report.child_delta(node, child), colored)
            ));
        }
    }
    lines
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildOutput<'a> {
    #[serde(flatten)]
    pub stat: &'a ChildStat,
    #[serde(with = "seconds_ser")]
    pub previous_duration: Duration,
    pub delta: Option<Delta>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeOutput<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub color: Option<&'a str>,
    #[serde(with = "seconds_ser")]
    pub duration: Duration,
    pub percentage: f64,
    #[serde(with = "seconds_ser")]
    pub previous_duration: Duration,
    pub delta: Option<Delta>,
    pub children: Vec<ChildOutput<'a>>,
}

/// Machine readable version of a [PeriodReport].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOutput<'a> {
    pub kind: TaxonomyKind,
    pub range: DateRange,
    pub previous_range: DateRange,
    #[serde(with = "seconds_ser")]
    pub total_duration: Duration,
    #[serde(with = "seconds_ser")]
    pub previous_total_duration: Duration,
    pub delta: Option<Delta>,
    pub nodes: Vec<NodeOutput<'a>>,
}

impl<'a> ReportOutput<'a> {
    pub fn new(report: &'a PeriodReport) -> Self {
        Self {
            kind: report.kind,
            range: report.range,
            previous_range: report.previous_range(),
            total_duration: report.current.total_duration,
            previous_total_duration: report.previous.total_duration,
            delta: report.total_delta(),
            nodes: report
                .current
                .nodes
                .iter()
                .map(|node| node_output(report, node))
                .collect(),
        }
    }
}

fn node_output<'a>(report: &'a PeriodReport, node: &'a NodeStat) -> NodeOutput<'a> {
    NodeOutput {
        id: &node.id,
        name: &node.name,
        color: node.color.as_deref(),
        duration: node.duration,
        percentage: *node.percentage,
        previous_duration: report.previous.parent(&node.id),
        delta: report.node_delta(node),
        children: node
            .children
            .iter()
            .map(|child| ChildOutput {
                stat: child,
                previous_duration: report.previous.child(&node.id, &child.id),
                delta: report.child_delta(node, child),
            })
            .collect(),
    }
}

/// One log of a day column, positioned for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: Arc<str>,
    pub title: Option<String>,
    pub category: Arc<str>,
    pub activity: Arc<str>,
    pub start_time: DateTime<chrono::Utc>,
    pub end_time: DateTime<chrono::Utc>,
    #[serde(flatten)]
    pub layout: LayoutAssignment,
    pub top: f64,
    pub height: f64,
}

/// Joins day logs with their layout and names, ordered by start.
pub fn schedule_entries<Tz: TimeZone>(
    logs: &[TimeLog],
    layout: &HashMap<Arc<str>, LayoutAssignment>,
    taxonomies: &Taxonomies,
    metrics: &ScheduleMetrics,
    tz: &Tz,
) -> Vec<ScheduleEntry> {
    let mut entries = logs
        .iter()
        .filter_map(|log| {
            let assignment = layout.get(&log.id)?;
            let category = taxonomies
                .categories
                .iter()
                .find(|v| v.id == log.category_id);
            let activity = category
                .and_then(|v| v.activity(&log.activity_id))
                .map(|v| v.name.clone())
                .unwrap_or_else(|| UNKNOWN_ACTIVITY.into());
            Some(ScheduleEntry {
                id: log.id.clone(),
                title: log.title.clone(),
                category: category
                    .map(|v| v.name.clone())
                    .unwrap_or_else(|| log.category_id.clone()),
                activity,
                start_time: log.start_time,
                end_time: log.end_time,
                layout: *assignment,
                top: metrics.top(&log.start_time.with_timezone(tz)),
                height: metrics.height(log.duration()),
            })
        })
        .collect::<Vec<_>>();
    entries.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then(a.layout.left.total_cmp(&b.layout.left))
    });
    entries
}

pub fn schedule_line<Tz: TimeZone>(entry: &ScheduleEntry, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    format!(
        "{}-{}\t{}\t{}\t{}/{}{}",
        entry.start_time.with_timezone(tz).format("%H:%M"),
        entry.end_time.with_timezone(tz).format("%H:%M"),
        entry.layout.left,
        entry.layout.width,
        entry.category,
        entry.activity,
        entry
            .title
            .as_ref()
            .map(|v| format!("\t{v}"))
            .unwrap_or_default()
    )
}

/// Empty results get a short note instead of a blank output.
pub fn is_empty(result: &AggregationResult) -> bool {
    result.nodes.is_empty() && result.total_duration.is_zero()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::{
        ReportOutput, format_delta, format_range, schedule_entries, schedule_line, summary_lines,
    };
    use crate::{
        config::StatsConfig,
        snapshot::entities::{Activity, Category, Snapshot, Taxonomies, TimeLog},
        stats::{
            aggregate::Exclusions,
            comparison::Delta,
            engine::StatsEngine,
            layout::ScheduleMetrics,
            range::Granularity,
            taxonomy::TaxonomyKind,
        },
        utils::percentage::Percentage,
    };

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, d, h, 0, 0).unwrap()
    }

    fn taxonomies() -> Taxonomies {
        Taxonomies {
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
        }
    }

    fn engine() -> StatsEngine {
        let logs = vec![
            TimeLog::new("today", "work", "code", at(5, 9), at(5, 12)),
            TimeLog::new("yesterday", "work", "code", at(4, 9), at(4, 11)),
        ];
        StatsEngine::new(Snapshot::new(logs, taxonomies()), &StatsConfig::default())
    }

    #[test]
    fn deltas() {
        assert_eq!(format_delta(Some(Delta { percent: 12 }), false), "+12%");
        assert_eq!(format_delta(Some(Delta { percent: -40 }), false), "-40%");
        assert_eq!(format_delta(None, true), "");
        let colored = format_delta(Some(Delta { percent: 5 }), true);
        assert!(colored.contains("+5%"));
        assert_ne!(colored, "+5%");
    }

    #[test]
    fn ranges() {
        let day = engine().resolve(&at(5, 9), Granularity::Day);
        assert_eq!(format_range(&day, &Utc), "2024-04-05");
        let week = engine().resolve(&at(5, 9), Granularity::Week);
        assert_eq!(format_range(&week, &Utc), "2024-04-01..2024-04-07");
    }

    #[test]
    fn summary() {
        let mut engine = engine();
        let report = engine.report(
            TaxonomyKind::Activity,
            &at(5, 20),
            Granularity::Day,
            &Exclusions::new(),
        );
        assert_eq!(
            summary_lines(&report, Percentage::ZERO, true, false),
            vec![
                "Total\t3h0m\t+50%".to_owned(),
                "100%\t3h0m\tWork\t+50%".to_owned(),
                "\t3h0m\t  Code\t+50%".to_owned(),
            ]
        );
        assert_eq!(summary_lines(&report, Percentage::ZERO, false, false).len(), 2);
        assert_eq!(summary_lines(&report, Percentage::FULL, false, false).len(), 2);
        let above = Percentage::new_opt(100.5).unwrap();
        assert_eq!(summary_lines(&report, above, true, false).len(), 1);
    }

    #[test]
    fn json() {
        let mut engine = engine();
        let report = engine.report(
            TaxonomyKind::Activity,
            &at(5, 20),
            Granularity::Day,
            &Exclusions::new(),
        );
        let value = serde_json::to_value(ReportOutput::new(&report)).unwrap();
        assert_eq!(value["kind"], "activity");
        assert_eq!(value["totalDuration"], 10800.);
        assert_eq!(value["previousTotalDuration"], 7200.);
        assert_eq!(value["delta"]["percent"], 50);
        assert_eq!(value["nodes"][0]["color"], "text-blue-600");
        assert_eq!(value["nodes"][0]["children"][0]["name"], "Code");
        assert_eq!(value["nodes"][0]["children"][0]["previousDuration"], 7200.);
    }

    #[test]
    fn schedule() {
        let engine = engine();
        let (logs, layout) = engine.schedule(&Utc, at(5, 0).date_naive());
        let metrics = ScheduleMetrics::default();
        let entries = schedule_entries(&logs, &layout, &taxonomies(), &metrics, &Utc);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].top, 450.);
        assert_eq!(entries[0].height, 148.);
        assert_eq!(schedule_line(&entries[0], &Utc), "09:00-12:00\t0%\t100%\tWork/Code");

        let value = serde_json::to_value(&entries[0]).unwrap();
        assert_eq!(value["left"], "0%");
        assert_eq!(value["width"], "100%");
        assert_eq!(value["activity"], "Code");
        assert_eq!(logs[0].duration(), Duration::hours(3));
    }
}
