use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::utils::clock::DefaultClock;

use super::{
    CliContext,
    output::svg::{node_arcs, ring_svg},
    period::PeriodArgs,
};

#[derive(Debug, clap::Parser)]
pub struct RingCommand {
    #[command(flatten)]
    period: PeriodArgs,
    #[arg(long, help = "Print arcs as json instead of an svg document")]
    json: bool,
    #[arg(short, long, help = "Write the output into a file instead of stdout")]
    output: Option<PathBuf>,
}

/// Command to process `ring`. Renders the breakdown of a period as a ring chart.
pub async fn process_ring_command(
    context: &CliContext,
    RingCommand {
        period,
        json,
        output,
    }: RingCommand,
) -> Result<()> {
    let resolved = period.resolve(context, &DefaultClock)?;
    let mut engine = context
        .load_engine(resolved.range.start, resolved.range.end)
        .await?;
    let report = engine.report_for_range(period.by, resolved.range, &resolved.exclusions);
    let opts = &context.config.ring;

    let text = if json {
        serde_json::to_string_pretty(&node_arcs(&report.current, opts))? + "\n"
    } else {
        ring_svg(&report.current, opts)
    };

    match output {
        Some(path) => {
            tokio::fs::write(&path, text)
                .await
                .with_context(|| format!("Failed to write {path:?}"))?;
            info!("Saved ring into {path:?}");
        }
        None => print!("{text}"),
    }
    Ok(())
}
