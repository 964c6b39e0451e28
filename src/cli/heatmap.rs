use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{Duration, Local, NaiveDate};

use crate::{
    stats::{
        aggregate::daily_totals,
        palette::heat_opacity,
        range::{Granularity, resolve},
    },
    utils::{clock::DefaultClock, time::format_duration},
};

use super::{
    CliContext,
    dates::{DateStyle, parse_reference},
};

#[derive(Debug, clap::Parser)]
pub struct HeatmapCommand {
    #[arg(short, long, default_value_t = Granularity::Month)]
    granularity: Granularity,
    #[arg(short, long, help = "Any date inside of the period. Defaults to today")]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(short = 'x', long = "exclude", help = "Id of an activity category to leave out")]
    exclude: Vec<String>,
}

/// Command to process `heatmap`. Prints one line per day with its intensity.
pub async fn process_heatmap_command(
    context: &CliContext,
    HeatmapCommand {
        granularity,
        date,
        date_style,
        exclude,
    }: HeatmapCommand,
) -> Result<()> {
    let reference = parse_reference(date.as_deref(), date_style, &DefaultClock)?;
    let range = resolve(&reference, granularity, context.config.week_start);
    let engine = context.load_engine(range.start, range.end).await?;
    let exclusions = exclude.iter().map(|v| v.as_str().into()).collect();

    let totals = daily_totals(&engine.snapshot().logs, &range, &exclusions, &Local);
    for line in heatmap_lines(&totals) {
        println!("{line}");
    }
    Ok(())
}

/// Shade of a cell, denser for more time.
pub fn heat_cell(duration: Duration) -> char {
    if duration <= Duration::zero() {
        return '·';
    }
    match heat_opacity(duration) {
        v if v < 0.3 => '░',
        v if v < 0.7 => '▒',
        v if v < 1. => '▓',
        _ => '█',
    }
}

pub fn heatmap_lines(totals: &BTreeMap<NaiveDate, Duration>) -> Vec<String> {
    totals
        .iter()
        .map(|(day, duration)| {
            format!(
                "{}\t{}\t{}",
                day.format("%a %Y-%m-%d"),
                heat_cell(*duration),
                format_duration(*duration)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{Duration, NaiveDate};

    use super::{heat_cell, heatmap_lines};

    #[test]
    fn cells() {
        assert_eq!(heat_cell(Duration::zero()), '·');
        assert_eq!(heat_cell(Duration::minutes(10)), '░');
        assert_eq!(heat_cell(Duration::minutes(45)), '▒');
        assert_eq!(heat_cell(Duration::minutes(90)), '▒');
        assert_eq!(heat_cell(Duration::hours(3)), '▓');
        assert_eq!(heat_cell(Duration::hours(5)), '█');
    }

    #[test]
    fn lines() {
        let day = NaiveDate::from_ymd_opt(2024, 4, 5).unwrap();
        let totals = BTreeMap::from([(day, Duration::minutes(150))]);
        assert_eq!(heatmap_lines(&totals), vec!["Fri 2024-04-05\t▓\t2h30m".to_owned()]);
    }
}
