//! Append-only log of completed focus sessions.
//!
//! Records are kept most-recent-first and persisted as one JSON array
//! under [`SessionLog::KEY`]. In-memory state only changes after the
//! durable write has succeeded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::kv::KvStore;
use crate::error::Result;

/// Task the user is working on, supplied by whatever picks templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskContext {
    pub task_name: Option<String>,
    pub category: Option<String>,
}

impl TaskContext {
    pub fn new(task_name: impl Into<String>, category: Option<String>) -> Self {
        Self {
            task_name: Some(task_name.into()),
            category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Strictly increasing in creation order.
    pub id: i64,
    pub completed_at: DateTime<Utc>,
    /// Focus duration in effect when the interval completed.
    pub duration_minutes: u32,
    #[serde(default)]
    pub task_name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionLog {
    records: Vec<SessionRecord>,
}

impl SessionLog {
    /// Store key holding the serialized log.
    pub const KEY: &'static str = "session_log";

    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate the log from the store.
    ///
    /// A missing, unreadable, or unparseable blob yields an empty log; the
    /// problem is logged rather than returned so startup is never blocked.
    pub fn load_all(store: &impl KvStore) -> Self {
        let raw = match store.get(Self::KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::default(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read session log, starting empty");
                return Self::default();
            }
        };
        match serde_json::from_str::<Vec<SessionRecord>>(&raw) {
            Ok(records) => Self { records },
            Err(e) => {
                tracing::warn!(error = %e, "session log is corrupt, starting empty");
                Self::default()
            }
        }
    }

    /// Build the record that would be appended next for `context`.
    ///
    /// Ids are completion epoch milliseconds, bumped past the newest id so
    /// two completions in the same millisecond still sort.
    pub fn next_record(
        &self,
        completed_at: DateTime<Utc>,
        duration_minutes: u32,
        context: &TaskContext,
    ) -> SessionRecord {
        let mut id = completed_at.timestamp_millis();
        if let Some(latest) = self.latest() {
            id = id.max(latest.id + 1);
        }
        SessionRecord {
            id,
            completed_at,
            duration_minutes,
            task_name: context.task_name.clone(),
            category: context.category.clone(),
        }
    }

    /// Insert `record` at the head and persist the whole log.
    ///
    /// # Errors
    /// Returns the store error; the log is unchanged in that case.
    pub fn append(&mut self, store: &impl KvStore, record: SessionRecord) -> Result<()> {
        let (next, json) = self.staged(record)?;
        store.set(Self::KEY, &json)?;
        *self = next;
        Ok(())
    }

    /// The log with `record` prepended, and its serialized form, without
    /// touching `self`. Used when the write has to be batched with other
    /// keys.
    pub(crate) fn staged(&self, record: SessionRecord) -> Result<(Self, String)> {
        let mut records = Vec::with_capacity(self.records.len() + 1);
        records.push(record);
        records.extend(self.records.iter().cloned());
        let json = serde_json::to_string(&records)?;
        Ok((Self { records }, json))
    }

    /// Most recent first.
    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    pub fn latest(&self) -> Option<&SessionRecord> {
        self.records.first()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_focus_minutes(&self) -> u64 {
        self.records
            .iter()
            .map(|r| u64::from(r.duration_minutes))
            .sum()
    }

    /// Mean minutes per record, 0.0 for an empty log.
    pub fn average_session_length(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        self.total_focus_minutes() as f64 / self.records.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    fn context() -> TaskContext {
        TaskContext::new("Write report", Some("work".into()))
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn aggregates() {
        let store = MemoryStore::new();
        let mut log = SessionLog::new();
        for (i, minutes) in [25, 30, 15].into_iter().enumerate() {
            let record = log.next_record(at(i as i64 * 60), minutes, &context());
            log.append(&store, record).unwrap();
        }
        assert_eq!(log.total_focus_minutes(), 70);
        assert!((log.average_session_length() - 70.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_log_average_is_zero() {
        let log = SessionLog::new();
        assert_eq!(log.total_focus_minutes(), 0);
        assert_eq!(log.average_session_length(), 0.0);
    }

    #[test]
    fn append_is_most_recent_first_and_persisted() {
        let store = MemoryStore::new();
        let mut log = SessionLog::new();
        let first = log.next_record(at(0), 25, &context());
        log.append(&store, first.clone()).unwrap();
        let second = log.next_record(at(60), 30, &context());
        log.append(&store, second.clone()).unwrap();

        assert_eq!(log.records(), &[second.clone(), first.clone()]);
        let reloaded = SessionLog::load_all(&store);
        assert_eq!(reloaded, log);
    }

    #[test]
    fn ids_increase_within_the_same_millisecond() {
        let mut log = SessionLog::new();
        let store = MemoryStore::new();
        let a = log.next_record(at(0), 25, &context());
        log.append(&store, a.clone()).unwrap();
        let b = log.next_record(at(0), 25, &context());
        assert!(b.id > a.id);
    }

    #[test]
    fn corrupt_blob_loads_empty() {
        let store = MemoryStore::new();
        store.set(SessionLog::KEY, "{not json").unwrap();
        assert!(SessionLog::load_all(&store).is_empty());
    }

    #[test]
    fn missing_blob_loads_empty() {
        assert!(SessionLog::load_all(&MemoryStore::new()).is_empty());
    }
}
