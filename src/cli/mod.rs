pub mod dates;
pub mod heatmap;
pub mod import;
pub mod output;
pub mod period;
pub mod ring;
pub mod schedule;
pub mod summary;

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use heatmap::{HeatmapCommand, process_heatmap_command};
use import::{ImportCommand, process_import_command};
use ring::{RingCommand, process_ring_command};
use schedule::{ScheduleCommand, process_schedule_command};
use summary::{SummaryCommand, process_summary_command};
use tracing::{debug, level_filters::LevelFilter};

use crate::{
    config::StatsConfig,
    snapshot::{load_snapshot, snapshot_storage::SnapshotStorageImpl},
    stats::{engine::StatsEngine, range::WeekStart, taxonomy::UnscopedPolicy},
    utils::{
        dir::create_application_default_path,
        logging::{CLI_PREFIX, enable_logging},
    },
};

pub const LOGS_DIR: &str = "logs";

#[derive(Parser, Debug)]
#[command(name = "timepal-stats", version, long_about = None)]
#[command(about = "Statistics over tracked time", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Print logs into the console as well")]
    log: bool,
    #[arg(
        long,
        help = "Level of logs, e.g. \"debug\". Defaults to RUST_LOG or info. With --log defaults to trace"
    )]
    log_filter: Option<LevelFilter>,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to use $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Overrides week start from config")]
    week_start: Option<WeekStart>,
    #[arg(
        long,
        global = true,
        help = "Overrides what the scope breakdown does with logs without scopes"
    )]
    unscoped: Option<UnscopedPolicy>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Breakdown of a period by activity, todo or scope")]
    Summary {
        #[command(flatten)]
        command: SummaryCommand,
    },
    #[command(about = "Logs of a single day laid out as a calendar column")]
    Schedule {
        #[command(flatten)]
        command: ScheduleCommand,
    },
    #[command(about = "Ring chart of a period breakdown")]
    Ring {
        #[command(flatten)]
        command: RingCommand,
    },
    #[command(about = "Amount of time logged on each day of a period")]
    Heatmap {
        #[command(flatten)]
        command: HeatmapCommand,
    },
    #[command(about = "Import logs and taxonomies from json files")]
    Import {
        #[command(flatten)]
        command: ImportCommand,
    },
}

/// Resolved application settings shared by every command.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub dir: PathBuf,
    pub config: StatsConfig,
}

impl CliContext {
    pub fn storage(&self) -> Result<Arc<SnapshotStorageImpl>> {
        Ok(Arc::new(SnapshotStorageImpl::new(self.dir.clone())?))
    }

    /// Engine over every log that started within `[start, end]`.
    pub async fn load_engine(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<StatsEngine> {
        let snapshot = load_snapshot(self.storage()?, start, end).await?;
        debug!("Loaded {} logs", snapshot.logs.len());
        Ok(StatsEngine::new(snapshot, &self.config))
    }
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let dir = match args.dir {
        Some(dir) => dir,
        None => create_application_default_path()?,
    };

    let logging_level = match (args.log_filter, args.log) {
        (Some(level), _) => Some(level),
        (None, true) => Some(LevelFilter::TRACE),
        (None, false) => None,
    };
    enable_logging(CLI_PREFIX, &dir.join(LOGS_DIR), logging_level, args.log)?;

    let mut config = StatsConfig::load(&dir).await?;
    if let Some(week_start) = args.week_start {
        config.week_start = week_start;
    }
    if let Some(unscoped) = args.unscoped {
        config.unscoped = unscoped;
    }
    let context = CliContext { dir, config };

    match args.commands {
        Commands::Summary { command } => process_summary_command(&context, command).await,
        Commands::Schedule { command } => process_schedule_command(&context, command).await,
        Commands::Ring { command } => process_ring_command(&context, command).await,
        Commands::Heatmap { command } => process_heatmap_command(&context, command).await,
        Commands::Import { command } => process_import_command(&context, command).await,
    }
}
