use anyhow::Result;
use chrono::{Duration, Local};

use crate::{
    stats::layout::ScheduleMetrics,
    utils::{
        clock::DefaultClock,
        time::{next_day_start, start_of_day},
    },
};

use super::{
    CliContext,
    dates::{DateStyle, parse_reference},
    output::{schedule_entries, schedule_line},
};

#[derive(Debug, clap::Parser)]
pub struct ScheduleCommand {
    #[arg(
        short,
        long,
        help = "Day to lay out. Examples are \"yesterday\", \"15/03/2025\". Defaults to today"
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(long, help = "Print entries as json, including pixel positions")]
    json: bool,
}

/// Command to process `schedule`. Logs overlapping each other are placed side by side, the
/// output contains horizontal positions in percents of the column width.
pub async fn process_schedule_command(
    context: &CliContext,
    ScheduleCommand {
        date,
        date_style,
        json,
    }: ScheduleCommand,
) -> Result<()> {
    let day = parse_reference(date.as_deref(), date_style, &DefaultClock)?.date_naive();
    let start = start_of_day(&Local, day);
    let end = next_day_start(start) - Duration::milliseconds(1);

    let engine = context.load_engine(start.to_utc(), end.to_utc()).await?;
    let (logs, layout) = engine.schedule(&Local, day);
    let metrics = ScheduleMetrics::new(context.config.hour_height);
    let entries = schedule_entries(
        &logs,
        &layout,
        &engine.snapshot().taxonomies,
        &metrics,
        &Local,
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{}", day.format("%A %Y-%m-%d"));
    if entries.is_empty() {
        println!("No time logged");
    }
    for entry in &entries {
        println!("{}", schedule_line(entry, &Local));
    }
    Ok(())
}
