use std::fmt::Display;

use anyhow::Result;
use chrono::{Local, TimeZone};
use clap::ValueEnum;

use crate::{
    stats::engine::PeriodReport,
    utils::{clock::DefaultClock, percentage::Percentage},
};

use super::{
    CliContext,
    output::{ReportOutput, format_range, is_empty, markdown::markdown, summary_lines},
    period::PeriodArgs,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SummaryFormat {
    Table,
    Json,
    Markdown,
}

impl Display for SummaryFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryFormat::Table => write!(f, "table"),
            SummaryFormat::Json => write!(f, "json"),
            SummaryFormat::Markdown => write!(f, "markdown"),
        }
    }
}

#[derive(Debug, clap::Parser)]
pub struct SummaryCommand {
    #[command(flatten)]
    period: PeriodArgs,
    #[arg(short, long, default_value_t = SummaryFormat::Table)]
    format: SummaryFormat,
    #[arg(
        short = 'p',
        long = "percentage",
        help = "Hide nodes with a smaller share of the total in the table",
        default_value_t = Percentage::ZERO
    )]
    min_percentage: Percentage,
    #[arg(long, help = "Only print top level nodes")]
    flat: bool,
    #[arg(long, help = "Don't color growth and decline")]
    no_color: bool,
}

/// Command to process `summary`. Prints the breakdown of a period together with changes since the
/// previous one.
pub async fn process_summary_command(
    context: &CliContext,
    SummaryCommand {
        period,
        format,
        min_percentage,
        flat,
        no_color,
    }: SummaryCommand,
) -> Result<()> {
    let resolved = period.resolve(context, &DefaultClock)?;
    let load_range = resolved.load_range();
    let mut engine = context.load_engine(load_range.start, load_range.end).await?;
    let report = engine.report_for_range(period.by, resolved.range, &resolved.exclusions);

    let options = RenderOptions {
        min_percentage,
        with_children: !flat,
        colored: !no_color,
    };
    print!("{}", render_summary(&report, format, &options, &Local)?);
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub min_percentage: Percentage,
    pub with_children: bool,
    pub colored: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            min_percentage: Percentage::ZERO,
            with_children: true,
            colored: false,
        }
    }
}

pub fn render_summary<Tz: TimeZone>(
    report: &PeriodReport,
    format: SummaryFormat,
    options: &RenderOptions,
    tz: &Tz,
) -> Result<String> {
    let title = format!("{} {}", report.kind, format_range(&report.range, tz));
    Ok(match format {
        SummaryFormat::Json => serde_json::to_string_pretty(&ReportOutput::new(report))? + "\n",
        SummaryFormat::Markdown => markdown(&title, &report.current, options.with_children),
        SummaryFormat::Table if is_empty(&report.current) => format!("{title}\nNo time logged\n"),
        SummaryFormat::Table => {
            let mut text = title + "\n";
            let lines = summary_lines(
                report,
                options.min_percentage,
                options.with_children,
                options.colored,
            );
            for line in lines {
                text += &line;
                text.push('\n');
            }
            text
        }
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{RenderOptions, SummaryFormat, render_summary};
    use crate::{
        config::StatsConfig,
        snapshot::entities::{Snapshot, TimeLog},
        stats::{
            aggregate::Exclusions, engine::StatsEngine, range::Granularity, taxonomy::TaxonomyKind,
        },
    };

    fn engine() -> StatsEngine {
        let start = Utc.with_ymd_and_hms(2024, 4, 5, 9, 0, 0).unwrap();
        let logs = vec![TimeLog::new("a", "work", "code", start, start + Duration::hours(1))];
        StatsEngine::new(Snapshot::new(logs, Default::default()), &StatsConfig::default())
    }

    #[test]
    fn empty_table() {
        let mut engine = engine();
        let reference = Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap();
        let report = engine.report(
            TaxonomyKind::Scope,
            &reference,
            Granularity::Year,
            &Exclusions::new(),
        );
        let options = RenderOptions::default();
        let text = render_summary(&report, SummaryFormat::Table, &options, &Utc).unwrap();
        assert!(text.starts_with("scope 2020-01-01..2020-12-31"));
        assert!(text.ends_with("No time logged\n"));
    }

    #[test]
    fn formats() {
        let mut engine = engine();
        let reference = Utc.with_ymd_and_hms(2024, 4, 5, 12, 0, 0).unwrap();
        let report = engine.report(
            TaxonomyKind::Activity,
            &reference,
            Granularity::Year,
            &Exclusions::new(),
        );
        let options = RenderOptions::default();

        let json = render_summary(&report, SummaryFormat::Json, &options, &Utc).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["totalDuration"], 3600.);

        let markdown = render_summary(&report, SummaryFormat::Markdown, &options, &Utc).unwrap();
        assert!(markdown.starts_with("## activity "));
        assert!(markdown.contains("**Total**: 1h0m"));

        let table = render_summary(&report, SummaryFormat::Table, &options, &Utc).unwrap();
        assert!(table.contains("Total\t1h0m\t\n"));
    }
}
