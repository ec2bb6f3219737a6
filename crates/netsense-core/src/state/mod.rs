//! Screen state holders.
//!
//! Each holder owns one `watch` channel of `Arc` snapshots. Updates are
//! copy-on-write: a published snapshot is never mutated, readers always
//! see a consistent value. Holders spawn their acquisition tasks on
//! [`start`](DashboardHolder::start) and cancel them on `stop()` or drop;
//! a new holder is built each time its screen becomes active.

pub mod dashboard;
pub mod network;
pub mod sensors;
pub mod settings;

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::stream::StateStream;

pub use dashboard::{DashboardHolder, DashboardState, QuickStat, SensorStatus};
pub use network::{NetworkHolder, NetworkState};
pub use sensors::{SensorsHolder, SensorsState};
pub use settings::{SettingsSection, SettingsState};

/// Most recent activity entries kept by the dashboard.
pub const ACTIVITY_LOG_CAPACITY: usize = 10;

// ── State cell ───────────────────────────────────────────────────────

/// Publishes copy-on-write snapshots of `S`.
pub(crate) struct StateCell<S> {
    tx: watch::Sender<Arc<S>>,
}

impl<S: Clone + Send + Sync + 'static> StateCell<S> {
    pub(crate) fn new(initial: S) -> Self {
        let (tx, _) = watch::channel(Arc::new(initial));
        Self { tx }
    }

    /// Apply `f` to a fresh copy and publish it.
    pub(crate) fn update(&self, f: impl FnOnce(&mut S)) {
        self.tx.send_modify(|snapshot| f(Arc::make_mut(snapshot)));
    }

    /// Apply `f` only when `guard` holds for the current snapshot.
    /// Returns whether an update was published.
    pub(crate) fn update_if(&self, guard: impl FnOnce(&S) -> bool, f: impl FnOnce(&mut S)) -> bool {
        self.tx.send_if_modified(|snapshot| {
            if !guard(snapshot) {
                return false;
            }
            f(Arc::make_mut(snapshot));
            true
        })
    }

    pub(crate) fn snapshot(&self) -> Arc<S> {
        self.tx.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> StateStream<S> {
        StateStream::new(self.tx.subscribe())
    }
}

/// Run `task` on the runtime until it finishes or `cancel` fires.
pub(crate) fn spawn_scoped<F>(cancel: &CancellationToken, task: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    let cancel = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = cancel.cancelled() => {}
            () = task => {}
        }
    });
}

// ── Activity log ─────────────────────────────────────────────────────

/// What produced an activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActivityKind {
    Network,
    Temperature,
    Location,
    SpeedTest,
    Failure,
}

/// One line in the dashboard's recent-activity list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    pub kind: ActivityKind,
    pub title: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn new(kind: ActivityKind, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            description: description.into(),
            timestamp: Utc::now(),
        }
    }

    /// Local wall-clock time as `HH:MM`.
    pub fn time_label(&self) -> String {
        self.timestamp.with_timezone(&Local).format("%H:%M").to_string()
    }
}

/// Bounded activity list, newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActivityLog {
    entries: VecDeque<ActivityEntry>,
}

impl ActivityLog {
    /// Prepend `entry`, evicting the oldest past capacity.
    pub fn push(&mut self, entry: ActivityEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(ACTIVITY_LOG_CAPACITY);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&ActivityEntry> {
        self.entries.front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_log_keeps_ten_newest_first() {
        let mut log = ActivityLog::default();
        for i in 0..15 {
            log.push(ActivityEntry::new(ActivityKind::Network, format!("entry {i}"), ""));
        }
        assert_eq!(log.len(), ACTIVITY_LOG_CAPACITY);
        assert_eq!(log.latest().map(|e| e.title.as_str()), Some("entry 14"));
        assert_eq!(log.iter().last().map(|e| e.title.as_str()), Some("entry 5"));
    }

    #[test]
    fn time_label_is_hours_and_minutes() {
        let entry = ActivityEntry::new(ActivityKind::Location, "Location Update", "");
        let label = entry.time_label();
        assert_eq!(label.len(), 5);
        assert_eq!(label.chars().nth(2), Some(':'));
    }

    #[tokio::test]
    async fn state_cell_publishes_fresh_snapshots() {
        let cell = StateCell::new(vec![1_u8]);
        let before = cell.snapshot();
        let mut sub = cell.subscribe();

        cell.update(|v| v.push(2));

        assert_eq!(*before, vec![1]);
        let after = sub.changed().await.unwrap();
        assert_eq!(*after, vec![1, 2]);
    }

    #[test]
    fn update_if_skips_when_guard_fails() {
        let cell = StateCell::new(0_u32);
        assert!(cell.update_if(|n| *n == 0, |n| *n = 5));
        assert!(!cell.update_if(|n| *n == 0, |n| *n = 9));
        assert_eq!(*cell.snapshot(), 5);
    }
}
