//! Directory change notification, reduced in scope to an in-memory event
//! log: mutations append a [`ChangeEvent`] as they happen under the
//! filesystem lock; there is no polling loop or OS-level watch registration
//! (§10.6 Non-goals — watch/poll loop out of scope).

use std::sync::Arc;

use parking_lot::Mutex;

use crate::file::File;

/// The kind of mutation that produced a [`ChangeEvent`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ChangeKind {
    /// An entry was added to a directory.
    Created,
    /// An entry was removed from a directory.
    Deleted,
}

/// One observed mutation of a directory's entries.
#[derive(Clone, Debug)]
pub struct ChangeEvent {
    /// The identifier of the directory that changed.
    pub directory_id: u64,
    /// The kind of mutation.
    pub kind: ChangeKind,
    /// The display name of the entry that was created or deleted.
    pub name: String,
}

/// An in-memory log of directory mutations, bounded to the most recent
/// entries so it cannot grow without limit over a long-lived filesystem.
pub struct WatchRegistry {
    events: Mutex<Vec<ChangeEvent>>,
    capacity: usize,
}

impl std::fmt::Debug for WatchRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchRegistry")
            .field("events", &self.events.lock().len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

const DEFAULT_CAPACITY: usize = 4096;

impl WatchRegistry {
    /// Construct an empty registry with the default event-log capacity.
    pub fn new() -> Self {
        WatchRegistry {
            events: Mutex::new(Vec::new()),
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Append a mutation of `directory`'s entries to the log, discarding the
    /// oldest entry first if the log is at capacity.
    pub fn record(&self, directory: &Arc<File>, kind: ChangeKind, name: &str) {
        let mut events = self.events.lock();
        if events.len() >= self.capacity {
            events.remove(0);
        }
        events.push(ChangeEvent {
            directory_id: directory.id().into(),
            kind,
            name: name.to_string(),
        });
    }

    /// A snapshot of every event currently in the log, oldest first.
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().clone()
    }

    /// A snapshot of events for one directory only, oldest first.
    pub fn events_for(&self, directory_id: u64) -> Vec<ChangeEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.directory_id == directory_id)
            .cloned()
            .collect()
    }
}

impl Default for WatchRegistry {
    fn default() -> Self {
        WatchRegistry::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::{Directory, FileContent, FileId};
    use std::time::SystemTime;

    fn new_dir() -> Arc<File> {
        let f = File::new(FileId::test_id(1), FileContent::Directory(Directory::new()), SystemTime::now());
        f.as_directory().unwrap().bind_self(&f);
        f
    }

    #[test]
    fn records_events_in_order() {
        let registry = WatchRegistry::new();
        let dir = new_dir();
        registry.record(&dir, ChangeKind::Created, "a");
        registry.record(&dir, ChangeKind::Deleted, "a");
        let events = registry.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, ChangeKind::Created);
        assert_eq!(events[1].kind, ChangeKind::Deleted);
    }

    #[test]
    fn filters_by_directory() {
        let registry = WatchRegistry::new();
        let dir_a = new_dir();
        let dir_b = new_dir();
        registry.record(&dir_a, ChangeKind::Created, "a");
        registry.record(&dir_b, ChangeKind::Created, "b");
        let events = registry.events_for(dir_a.id().into());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "a");
    }

    #[test]
    fn log_is_bounded() {
        let registry = WatchRegistry {
            events: Mutex::new(Vec::new()),
            capacity: 2,
        };
        let dir = new_dir();
        registry.record(&dir, ChangeKind::Created, "a");
        registry.record(&dir, ChangeKind::Created, "b");
        registry.record(&dir, ChangeKind::Created, "c");
        let events = registry.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "b");
        assert_eq!(events[1].name, "c");
    }
}
