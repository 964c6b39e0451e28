use std::{
    hash::{DefaultHasher, Hash, Hasher},
    sync::Arc,
};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One tracked activity occurrence. Logs are owned by whoever writes the records; statistics only
/// ever read them.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Hash)]
#[serde(rename_all = "camelCase")]
pub struct TimeLog {
    pub id: Arc<str>,
    pub category_id: Arc<str>,
    pub activity_id: Arc<str>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub scope_ids: Vec<Arc<str>>,
    #[serde(default)]
    pub linked_todo_id: Option<Arc<str>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TimeLog {
    pub fn new(
        id: impl Into<Arc<str>>,
        category_id: impl Into<Arc<str>>,
        activity_id: impl Into<Arc<str>>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            category_id: category_id.into(),
            activity_id: activity_id.into(),
            start_time,
            end_time,
            scope_ids: vec![],
            linked_todo_id: None,
            title: None,
            note: None,
        }
    }

    /// Duration is always derived from the bounds. Corrupted records with `end < start` count as
    /// zero.
    pub fn duration(&self) -> Duration {
        (self.end_time - self.start_time).max(Duration::zero())
    }

    pub fn with_scopes<S: Into<Arc<str>>>(self, scopes: impl IntoIterator<Item = S>) -> Self {
        Self {
            scope_ids: scopes.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    pub fn with_todo(self, todo_id: impl Into<Arc<str>>) -> Self {
        Self {
            linked_todo_id: Some(todo_id.into()),
            ..self
        }
    }

    pub fn with_end(self, end_time: DateTime<Utc>) -> Self {
        Self { end_time, ..self }
    }
}

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Arc<str>,
    pub name: Arc<str>,
    #[serde(default)]
    pub color: Option<Arc<str>>,
}

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Arc<str>,
    pub name: Arc<str>,
    #[serde(default)]
    pub theme_color: Option<Arc<str>>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

impl Category {
    pub fn activity(&self, id: &str) -> Option<&Activity> {
        self.activities.iter().find(|v| &*v.id == id)
    }
}

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Hash)]
#[serde(rename_all = "camelCase")]
pub struct TodoCategory {
    pub id: Arc<str>,
    pub name: Arc<str>,
}

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Hash)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: Arc<str>,
    pub category_id: Arc<str>,
    pub title: Arc<str>,
}

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    pub id: Arc<str>,
    pub name: Arc<str>,
    #[serde(default)]
    pub theme_color: Option<Arc<str>>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub order: i64,
}

/// All classification schemes a log can be aggregated over.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Default, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Taxonomies {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub todo_categories: Vec<TodoCategory>,
    #[serde(default)]
    pub todos: Vec<TodoItem>,
    #[serde(default)]
    pub scopes: Vec<Scope>,
}

/// Immutable view of logs and taxonomies that statistics are computed over.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub logs: Arc<[TimeLog]>,
    pub taxonomies: Arc<Taxonomies>,
    fingerprint: u64,
}

impl Snapshot {
    pub fn new(logs: Vec<TimeLog>, taxonomies: Taxonomies) -> Self {
        let mut hasher = DefaultHasher::new();
        logs.hash(&mut hasher);
        taxonomies.hash(&mut hasher);
        Self {
            logs: logs.into(),
            taxonomies: Arc::new(taxonomies),
            fingerprint: hasher.finish(),
        }
    }

    /// Content hash. Two snapshots with the same fingerprint produce the same statistics.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{Snapshot, Taxonomies, TimeLog};

    #[test]
    fn negative_duration_is_clamped() {
        let start = Utc.with_ymd_and_hms(2024, 4, 5, 12, 0, 0).unwrap();
        let log = TimeLog::new("a", "c", "x", start, start - Duration::minutes(5));
        assert_eq!(log.duration(), Duration::zero());
    }

    #[test]
    fn deserializes_millisecond_timestamps() {
        let log: TimeLog = serde_json::from_str(
            r#"{"id":"1","categoryId":"work","activityId":"code","startTime":1712318400000,"endTime":1712322000000,"scopeIds":["s1","s2"],"duration":3600}"#,
        )
        .unwrap();
        assert_eq!(log.duration(), Duration::hours(1));
        assert_eq!(log.scope_ids.len(), 2);
        assert!(log.linked_todo_id.is_none());
    }

    #[test]
    fn fingerprint_follows_content() {
        let start = Utc.with_ymd_and_hms(2024, 4, 5, 12, 0, 0).unwrap();
        let log = TimeLog::new("a", "c", "x", start, start + Duration::hours(1));
        let a = Snapshot::new(vec![log.clone()], Taxonomies::default());
        let b = Snapshot::new(vec![log.clone()], Taxonomies::default());
        let c = Snapshot::new(vec![log.with_end(start)], Taxonomies::default());
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
