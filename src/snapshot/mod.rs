//!  Read side of the persistence layer, organized through
//!  [snapshot_storage::SnapshotStorageImpl].
//!  The basic idea is:
//!   - There is a directory with all the records.
//!   - Logs are stored in record files, one per UTC day the log started on.
//!   - Taxonomy definitions are stored next to the records.
//!  Statistics only ever receive an immutable [entities::Snapshot].

pub mod entities;
pub mod snapshot_storage;

use std::{future, sync::Arc};

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use entities::{Snapshot, TimeLog};
use futures::{Stream, StreamExt, TryStreamExt, stream};
use snapshot_storage::SnapshotStorage;
use tracing::{error, instrument};

pub struct ExtractConfig {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ExtractConfig {
    fn filter(&self, log: TimeLog) -> Option<TimeLog> {
        (log.start_time >= self.start && log.start_time <= self.end).then_some(log)
    }
}

/// Extracts logs that started between 2 instants. Record files are read with bounded
/// concurrency and streamed, so only the days that matter are ever touched.
pub fn extract_between<S: SnapshotStorage + Send + Sync + 'static>(
    storage: Arc<S>,
    config: ExtractConfig,
) -> impl Stream<Item = Result<TimeLog>> {
    let date_iteration = date_range(config.start.date_naive(), config.end.date_naive());

    let files = date_iteration
        .map(move |day| {
            let storage = storage.clone();
            async move { (day, storage.get_logs_for(day).await) }
        })
        .buffered(4);

    files
        .flat_map(|(day, data)| match data {
            Ok(data) => stream::iter(data).map(Ok).boxed(),
            Err(e) => {
                error!("Failed to process file {day} {e}");
                stream::once(future::ready(Err(e))).boxed()
            }
        })
        .filter_map(move |v| future::ready(v.map(|v| config.filter(v)).transpose()))
}

/// Loads every log that started in `[start, end]` together with taxonomy definitions.
#[instrument(skip(storage))]
pub async fn load_snapshot<S: SnapshotStorage + Send + Sync + 'static>(
    storage: Arc<S>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Snapshot> {
    let taxonomies = storage.get_taxonomies().await?;
    let logs = extract_between(storage, ExtractConfig { start, end })
        .try_collect::<Vec<_>>()
        .await?;
    Ok(Snapshot::new(logs, taxonomies))
}

/// Returns a stream of dates between start (inclusive) and end (inclusive).
fn date_range(start: NaiveDate, end: NaiveDate) -> impl Stream<Item = NaiveDate> {
    stream::unfold((Some(start), end), |(current, end)| {
        future::ready(match current {
            Some(current) if current <= end => Some((current, (current.succ_opt(), end))),
            _ => None,
        })
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use futures::StreamExt;
    use tempfile::tempdir;

    use super::{date_range, load_snapshot, snapshot_storage::{SnapshotStorageImpl, import_logs}};
    use crate::{snapshot::entities::TimeLog, utils::logging::TEST_LOGGING};

    #[tokio::test]
    async fn date_range_is_inclusive() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let days = date_range(start, end).collect::<Vec<_>>().await;
        assert_eq!(days.len(), 3);
        assert_eq!(days[1], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[tokio::test]
    async fn snapshot_only_contains_requested_window() -> Result<()> {
        *TEST_LOGGING;

        let dir = tempdir()?;
        let storage = Arc::new(SnapshotStorageImpl::new(dir.path().to_owned())?);
        let base = Utc.with_ymd_and_hms(2024, 4, 5, 10, 0, 0).unwrap();
        let logs = (0..5)
            .map(|i| {
                let start = base + Duration::days(i);
                TimeLog::new(format!("log-{i}"), "work", "code", start, start + Duration::hours(1))
            })
            .collect::<Vec<_>>();
        import_logs(storage.as_ref(), logs).await?;

        let snapshot = load_snapshot(
            storage,
            Utc.with_ymd_and_hms(2024, 4, 6, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 4, 7, 23, 59, 59).unwrap(),
        )
        .await?;
        let ids = snapshot.logs.iter().map(|v| v.id.to_string()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["log-1", "log-2"]);
        Ok(())
    }
}
