//! Directories: an ordered name-to-child map with parent/self links (§4.3).

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use super::File;
use crate::error::{FsErrorKind, FsResult};
use crate::name::Name;

/// One directory's mutable state: its entries plus a (possibly weak,
/// possibly self-referential for roots) link to its parent.
struct DirectoryState {
    /// Name-to-child map, in insertion order (iteration order is not the
    /// observable order; `snapshot()` always re-sorts by display name).
    entries: indexmap::IndexMap<Name, Arc<File>>,
}

/// A directory's content.
///
/// The parent link is a non-owning [`Weak`] reference: directories are owned
/// either by their parent's `entries` map or, for roots, by the super-root;
/// a `Weak` parent link is what breaks the otherwise-cyclic
/// directory/parent/children ownership graph (§9).
pub struct Directory {
    state: RwLock<DirectoryState>,
    /// The parent directory. For a root, this points to the directory
    /// itself. Protected by its own lock since it changes independently of
    /// `entries` (e.g. during `link`/`unlink` of this directory itself under
    /// a *different* directory's entries lock).
    parent: Mutex<Weak<File>>,
    /// Back-reference to the `File` that owns this `Directory`, so `self()`
    /// can hand back an `Arc<File>` without the caller threading it through.
    myself: Mutex<Weak<File>>,
}

impl std::fmt::Debug for Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Directory")
            .field("entries", &self.state.read().entries.len())
            .finish()
    }
}

impl Directory {
    /// Construct a new, empty directory. `set_self`/`set_parent` must be
    /// called once the containing `Arc<File>` is known (directories are
    /// always constructed before they can reference themselves).
    pub fn new() -> Self {
        Directory {
            state: RwLock::new(DirectoryState {
                entries: indexmap::IndexMap::new(),
            }),
            parent: Mutex::new(Weak::new()),
            myself: Mutex::new(Weak::new()),
        }
    }

    /// Bind the back-reference to the `File` that owns this directory.
    /// Called exactly once, immediately after `Arc::new`.
    pub fn bind_self(&self, myself: &Arc<File>) {
        *self.myself.lock() = Arc::downgrade(myself);
    }

    /// Make this directory its own parent (used only for root directories).
    pub fn bind_as_root(&self) {
        *self.parent.lock() = self.myself.lock().clone();
    }

    /// The `File` wrapping this directory.
    pub fn self_file(&self) -> Arc<File> {
        self.myself
            .lock()
            .upgrade()
            .expect("directory must be bound before use")
    }

    /// The parent directory's `File` (for a root, this is itself).
    pub fn parent(&self) -> Arc<File> {
        self.parent
            .lock()
            .upgrade()
            .expect("directory's parent was dropped while directory is reachable")
    }

    /// Whether this directory is currently a root (`parent() == self()`).
    pub fn is_root(&self) -> bool {
        Arc::ptr_eq(&self.parent(), &self.self_file())
    }

    fn set_parent(&self, parent: &Arc<File>) {
        *self.parent.lock() = Arc::downgrade(parent);
    }

    fn clear_parent(&self) {
        *self.parent.lock() = Weak::new();
    }

    /// Look up a child by canonical name. `SELF`/`PARENT` are not stored in
    /// `entries`; callers resolve those sentinels themselves via
    /// `self_file()`/`parent()` before reaching this method.
    pub fn get(&self, name: &Name) -> Option<Arc<File>> {
        self.state.read().entries.get(name.canonical()).cloned()
    }

    /// Add an entry. Fails with [`FsErrorKind::AlreadyExists`] if `name` is
    /// already present, or is the `.`/`..` sentinel.
    ///
    /// If `child` is itself a directory, it must currently be parentless
    /// (detached); its parent link is set to this directory and its link
    /// count is incremented by 2 (the new entry, plus its own `..`).
    /// Otherwise (regular file / symlink) the link count is incremented by 1.
    pub fn link(&self, this: &Arc<File>, name: Name, child: Arc<File>) -> FsResult<()> {
        if name.is_self() || name.is_parent() {
            return Err(FsErrorKind::AlreadyExists.into());
        }
        let mut state = self.state.write();
        if state.entries.contains_key(name.canonical()) {
            return Err(FsErrorKind::AlreadyExists.into());
        }

        if let Some(child_dir) = child.as_directory() {
            child_dir.set_parent(this);
            child.state_mut().link_count += 2;
        } else {
            child.state_mut().link_count += 1;
        }
        state.entries.insert(name, child);
        Ok(())
    }

    /// Remove and return the entry for `name`. Fails with
    /// [`FsErrorKind::NotFound`] if absent, or if `name` is `.`/`..`.
    ///
    /// If the removed child is a directory it becomes parentless (detached)
    /// and its link count drops by 2; otherwise it drops by 1.
    pub fn unlink(&self, name: &Name) -> FsResult<Arc<File>> {
        if name.is_self() || name.is_parent() {
            return Err(FsErrorKind::NotFound.into());
        }
        let mut state = self.state.write();
        let child = state
            .entries
            .shift_remove(name.canonical())
            .ok_or(FsErrorKind::NotFound)?;

        let decrement = if let Some(child_dir) = child.as_directory() {
            child_dir.clear_parent();
            2
        } else {
            1
        };
        {
            let mut state = child.state_mut();
            state.link_count = state.link_count.saturating_sub(decrement);
        }
        Ok(child)
    }

    /// A point-in-time snapshot of this directory's child names, sorted by
    /// **display** string (not canonical). `.`/`..` are excluded. This
    /// ordering is observable (directory iteration order) and must be
    /// preserved exactly.
    pub fn snapshot(&self) -> Vec<Name> {
        let state = self.state.read();
        let mut names: Vec<Name> = state.entries.keys().cloned().collect();
        names.sort_by(|a, b| a.display().cmp(b.display()));
        names
    }

    /// A point-in-time snapshot of (name, child) pairs, sorted by display name.
    pub fn snapshot_entries(&self) -> Vec<(Name, Arc<File>)> {
        let state = self.state.read();
        let mut entries: Vec<(Name, Arc<File>)> =
            state.entries.iter().map(|(n, f)| (n.clone(), Arc::clone(f))).collect();
        entries.sort_by(|a, b| a.0.display().cmp(b.0.display()));
        entries
    }

    /// Number of entries, excluding the implicit `.`/`..`.
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    /// Whether this directory has no entries besides the implicit `.`/`..`.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Directory {
    fn default() -> Self {
        Directory::new()
    }
}

/// A shareable name-to-file map type alias, used by the super-root (§3).
pub type RootMap = HashMap<String, Arc<File>>;
