use std::{
    collections::BTreeMap,
    future::Future,
    io::ErrorKind,
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, instrument, warn};

use crate::utils::time::date_to_record_name;

use super::entities::{Taxonomies, TimeLog};

pub const RECORDS_DIR: &str = "records";
pub const TAXONOMY_FILE: &str = "taxonomy.json";

/// Interface for abstracting the persistence layer. Statistics only need to read logs day by day
/// and the taxonomy definitions.
pub trait SnapshotStorage {
    /// Retrieves logs that started on a certain UTC day.
    fn get_logs_for(&self, date: NaiveDate) -> impl Future<Output = Result<Vec<TimeLog>>> + Send;

    /// Retrieves category, todo and scope definitions.
    fn get_taxonomies(&self) -> impl Future<Output = Result<Taxonomies>> + Send;

    /// Appends logs into the record file of a UTC day.
    fn append_logs(
        &self,
        date: NaiveDate,
        logs: Vec<TimeLog>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Replaces taxonomy definitions.
    fn set_taxonomies(&self, taxonomies: Taxonomies) -> impl Future<Output = Result<()>> + Send;
}

impl<T: Deref + Sync> SnapshotStorage for T
where
    T::Target: SnapshotStorage + Sync,
{
    fn get_logs_for(&self, date: NaiveDate) -> impl Future<Output = Result<Vec<TimeLog>>> + Send {
        self.deref().get_logs_for(date)
    }

    fn get_taxonomies(&self) -> impl Future<Output = Result<Taxonomies>> + Send {
        self.deref().get_taxonomies()
    }

    fn append_logs(
        &self,
        date: NaiveDate,
        logs: Vec<TimeLog>,
    ) -> impl Future<Output = Result<()>> + Send {
        self.deref().append_logs(date, logs)
    }

    fn set_taxonomies(&self, taxonomies: Taxonomies) -> impl Future<Output = Result<()>> + Send {
        self.deref().set_taxonomies(taxonomies)
    }
}

/// The main realization of [SnapshotStorage]. Layout of the directory:
///  - `records/YYYY-MM-DD` json lines, one log per line, grouped by UTC start day.
///  - `taxonomy.json` definitions of categories, todos and scopes.
pub struct SnapshotStorageImpl {
    root: PathBuf,
}

impl SnapshotStorageImpl {
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(root.join(RECORDS_DIR))?;

        Ok(Self { root })
    }

    fn record_path(&self, date: NaiveDate) -> PathBuf {
        self.root.join(RECORDS_DIR).join(date_to_record_name(date))
    }

    async fn get_all_inner(&self, path: &Path) -> Result<Vec<TimeLog>> {
        async fn extract(path: &Path) -> std::result::Result<Vec<TimeLog>, std::io::Error> {
            debug!("Extracting {path:?}");
            let file = File::open(path).await?;
            file.lock_shared()?;
            let mut buffer = BufReader::new(file);
            let mut line = Vec::new();
            let mut logs = vec![];
            loop {
                line.clear();
                if buffer.read_until(b'\n', &mut line).await? == 0 {
                    break;
                }
                // ignore illegal values. A half written line is not a reason to fail the whole report
                let text = match std::str::from_utf8(&line) {
                    Ok(v) => v,
                    Err(e) => {
                        warn!("During parsing in path {path:?} found a line that isn't utf-8: {e}");
                        continue;
                    }
                };
                if text.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<TimeLog>(text) {
                    Ok(v) => logs.push(v),
                    Err(e) => {
                        warn!("During parsing in path {path:?} found illegal json string {text}:  {e}")
                    }
                }
            }

            buffer.into_inner().unlock_async().await?;

            Ok(logs)
        }

        match extract(path).await {
            Ok(s) => Ok(s),
            Err(e) => {
                if e.kind() == ErrorKind::NotFound {
                    Ok(vec![])
                } else {
                    Err(e)?
                }
            }
        }
    }
}

impl SnapshotStorage for SnapshotStorageImpl {
    async fn get_logs_for(&self, date: NaiveDate) -> Result<Vec<TimeLog>> {
        let path = self.record_path(date);
        let data = self.get_all_inner(&path).await?;
        Ok(data)
    }

    async fn get_taxonomies(&self) -> Result<Taxonomies> {
        let path = self.root.join(TAXONOMY_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse taxonomies in {path:?}")),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No taxonomy file in {path:?}, using empty definitions");
                Ok(Taxonomies::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn append_logs(&self, date: NaiveDate, logs: Vec<TimeLog>) -> Result<()> {
        let path = self.record_path(date);

        let mut file = File::options()
            .append(true)
            .create(true)
            .open(path)
            .await?;

        let mut buffer = Vec::<u8>::new();
        for log in logs {
            serde_json::to_writer(&mut buffer, &log)?;
            buffer.push(b'\n');
        }

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = async {
            file.write_all(&buffer).await?;
            file.flush().await
        }
        .await;
        file.unlock_async().await?;
        result?;
        Ok(())
    }

    async fn set_taxonomies(&self, taxonomies: Taxonomies) -> Result<()> {
        let path = self.root.join(TAXONOMY_FILE);
        let content = serde_json::to_vec_pretty(&taxonomies)?;
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write taxonomies into {path:?}"))
    }
}

/// Groups logs by the UTC day they started on and appends them into the matching record files.
/// Returns amount of imported logs.
#[instrument(skip(storage, logs))]
pub async fn import_logs(storage: &impl SnapshotStorage, logs: Vec<TimeLog>) -> Result<usize> {
    let count = logs.len();
    let mut by_day = BTreeMap::<NaiveDate, Vec<TimeLog>>::new();
    for log in logs {
        by_day
            .entry(log.start_time.date_naive())
            .or_default()
            .push(log);
    }

    for (day, logs) in by_day {
        debug!("Importing {} logs into {day}", logs.len());
        storage.append_logs(day, logs).await?;
    }
    Ok(count)
}
