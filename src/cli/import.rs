use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::snapshot::{
    entities::{Taxonomies, TimeLog},
    snapshot_storage::{SnapshotStorage, import_logs},
};

use super::CliContext;

#[derive(Debug, clap::Parser)]
pub struct ImportCommand {
    #[arg(
        long,
        help = "Json file with an array of logs, or json lines with one log per line"
    )]
    logs: Option<PathBuf>,
    #[arg(long, help = "Json file with categories, todos and scopes. Replaces current ones")]
    taxonomy: Option<PathBuf>,
}

/// Command to process `import`. Logs are appended to the records, taxonomies are replaced.
pub async fn process_import_command(
    context: &CliContext,
    ImportCommand { logs, taxonomy }: ImportCommand,
) -> Result<()> {
    if logs.is_none() && taxonomy.is_none() {
        bail!("Nothing to import, pass --logs or --taxonomy");
    }
    let storage = context.storage()?;

    if let Some(path) = taxonomy {
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {path:?}"))?;
        let taxonomies: Taxonomies = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse taxonomies in {path:?}"))?;
        storage.set_taxonomies(taxonomies).await?;
        println!("Imported taxonomies from {}", path.display());
    }

    if let Some(path) = logs {
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {path:?}"))?;
        let logs = parse_logs(&content).with_context(|| format!("Invalid logs in {path:?}"))?;
        let count = import_logs(&storage, logs).await?;
        info!("Imported {count} logs from {path:?}");
        println!("Imported {count} logs");
    }
    Ok(())
}

/// Accepts either a json array or json lines. Lines that aren't logs are skipped.
pub fn parse_logs(content: &str) -> Result<Vec<TimeLog>> {
    if content.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(content)?);
    }
    Ok(content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(index, line)| match serde_json::from_str(line) {
            Ok(log) => Some(log),
            Err(e) => {
                warn!("Skipping line {} {e}", index + 1);
                None
            }
        })
        .collect())
}
