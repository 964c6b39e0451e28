use anyhow::Result;
use chrono::{DateTime, Local};

use crate::{
    stats::{
        aggregate::Exclusions,
        range::{DateRange, Granularity, resolve},
        taxonomy::TaxonomyKind,
    },
    utils::clock::Clock,
};

use super::{
    CliContext,
    dates::{DateStyle, parse_reference},
};

/// Selection of a breakdown, shared between commands that print one.
#[derive(Debug, Clone, clap::Args)]
pub struct PeriodArgs {
    #[arg(short, long, default_value_t = TaxonomyKind::Activity, help = "Taxonomy to break the time down by")]
    pub by: TaxonomyKind,
    #[arg(short, long, default_value_t = Granularity::Week)]
    pub granularity: Granularity,
    #[arg(
        short,
        long,
        help = "Any date inside of the period. Examples are \"yesterday\", \"last monday\", \"15/03/2025\""
    )]
    pub date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    pub date_style: DateStyle,
    #[arg(
        short = 'x',
        long = "exclude",
        help = "Id of an activity category to leave out. Can be repeated"
    )]
    pub exclude: Vec<String>,
}

/// What a period command has to load and compute.
#[derive(Debug, Clone)]
pub struct ResolvedPeriod {
    pub reference: DateTime<Local>,
    pub range: DateRange,
    pub exclusions: Exclusions,
}

impl ResolvedPeriod {
    /// Loading from the start of the previous period covers both sides of the comparison.
    pub fn load_range(&self) -> DateRange {
        DateRange::new(self.range.previous().start, self.range.end)
    }
}

impl PeriodArgs {
    pub fn resolve(&self, context: &CliContext, clock: &dyn Clock) -> Result<ResolvedPeriod> {
        let reference = parse_reference(self.date.as_deref(), self.date_style, clock)?;
        Ok(ResolvedPeriod {
            range: resolve(&reference, self.granularity, context.config.week_start),
            reference,
            exclusions: self.exclude.iter().map(|v| v.as_str().into()).collect(),
        })
    }
}
