//! Per-table change counters that wake store subscriptions after a commit.

use futures::future::select_all;
use tokio::sync::watch;

/// Tables a write can touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    MediaItem,
    ListMembership,
    MediaSource,
    MediaStream,
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::MediaItem,
        Table::ListMembership,
        Table::MediaSource,
        Table::MediaStream,
    ];

    fn slot(self) -> usize {
        match self {
            Table::MediaItem => 0,
            Table::ListMembership => 1,
            Table::MediaSource => 2,
            Table::MediaStream => 3,
        }
    }
}

#[derive(Debug)]
pub struct ChangeTracker {
    versions: [watch::Sender<u64>; 4],
}

impl Default for ChangeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self {
            versions: std::array::from_fn(|_| watch::Sender::new(0)),
        }
    }

    /// Bumps every table in `tables`. Call only after the write committed.
    pub fn notify(&self, tables: &[Table]) {
        for table in tables {
            self.versions[table.slot()]
                .send_modify(|version| *version = version.wrapping_add(1));
        }
    }

    pub fn listen(&self, tables: &[Table]) -> ChangeListener {
        ChangeListener {
            receivers: tables
                .iter()
                .map(|table| self.versions[table.slot()].subscribe())
                .collect(),
        }
    }
}

/// Waits for writes to a fixed set of tables
#[derive(Debug)]
pub struct ChangeListener {
    receivers: Vec<watch::Receiver<u64>>,
}

impl ChangeListener {
    /// Marks all current versions as seen. Call right before reading so a
    /// write landing during the read still wakes the next [`changed`].
    ///
    /// [`changed`]: ChangeListener::changed
    pub fn mark_seen(&mut self) {
        for rx in &mut self.receivers {
            rx.borrow_and_update();
        }
    }

    /// Resolves once any watched table changes; `false` when the store is
    /// gone.
    pub async fn changed(&mut self) -> bool {
        if self.receivers.is_empty() {
            return std::future::pending().await;
        }
        let pending =
            self.receivers.iter_mut().map(|rx| Box::pin(rx.changed()));
        let (result, _, _) = select_all(pending).await;
        result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn listeners_wake_only_for_watched_tables() {
        let tracker = ChangeTracker::new();
        let mut items = tracker.listen(&[Table::MediaItem]);
        items.mark_seen();

        tracker.notify(&[Table::MediaStream]);
        let woke =
            tokio::time::timeout(Duration::from_millis(50), items.changed())
                .await;
        assert!(woke.is_err());

        tracker.notify(&[Table::MediaItem]);
        let woke =
            tokio::time::timeout(Duration::from_millis(50), items.changed())
                .await;
        assert_eq!(woke, Ok(true));
    }

    #[tokio::test]
    async fn writes_during_a_read_are_not_lost() {
        let tracker = ChangeTracker::new();
        let mut listener =
            tracker.listen(&[Table::ListMembership, Table::MediaItem]);

        listener.mark_seen();
        // A commit lands between mark_seen and the wait
        tracker.notify(&[Table::ListMembership]);

        let woke =
            tokio::time::timeout(Duration::from_millis(50), listener.changed())
                .await;
        assert_eq!(woke, Ok(true));
    }

    #[tokio::test]
    async fn dropping_the_tracker_ends_listeners() {
        let tracker = ChangeTracker::new();
        let mut listener = tracker.listen(&Table::ALL);
        listener.mark_seen();
        drop(tracker);
        assert!(!listener.changed().await);
    }
}
