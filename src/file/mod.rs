//! Polymorphic file content and the metadata shared by every file kind.
//!
//! A [`File`] is a tagged sum of {directory, regular-file, symlink} plus the
//! metadata every kind shares (link count, timestamps, the open/deleted
//! bookkeeping used to decide when to destroy it). Dispatch is by matching on
//! [`FileContent`], not by inheritance, per the design notes.

mod directory;
mod regular;
mod symlink;

pub use directory::Directory;
pub use regular::RegularFile;
pub use symlink::Symlink;

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

/// An opaque, `Copy` file identifier, analogous in spirit to the teacher's
/// `INodeNo`/`Generation` newtypes (`src/ll/request.rs`): a strongly-typed
/// handle instead of a bare integer passed around the core.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serializable", derive(serde::Serialize, serde::Deserialize))]
pub struct FileId(u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<FileId> for u64 {
    fn from(id: FileId) -> u64 {
        id.0
    }
}

#[cfg(test)]
impl FileId {
    /// Construct an arbitrary id directly, for tests that build `File`s
    /// without going through a `FileIdAllocator`.
    pub(crate) fn test_id(n: u64) -> Self {
        FileId(n)
    }
}

/// Hands out monotonically increasing [`FileId`]s for one filesystem.
#[derive(Debug, Default)]
pub struct FileIdAllocator(AtomicU64);

impl FileIdAllocator {
    /// Construct a fresh allocator starting at id 0.
    pub fn new() -> Self {
        FileIdAllocator(AtomicU64::new(0))
    }

    /// Allocate the next id.
    pub fn next(&self) -> FileId {
        FileId(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

/// A typed attribute value, as stored in a file's generic attribute map and
/// accepted/produced by attribute providers (§4.5).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeValue {
    /// A boolean flag (e.g. a DOS `hidden` bit).
    Bool(bool),
    /// An unsigned integer (e.g. a POSIX uid/gid, a permission bitmask).
    UInt(u64),
    /// A signed integer.
    Int(i64),
    /// A point in time (e.g. `lastModifiedTime`).
    Time(SystemTime),
    /// Free-form text (e.g. a user-defined attribute value decoded as UTF-8).
    Text(String),
    /// Free-form binary data (e.g. a user-defined attribute stored as raw bytes).
    Bytes(Vec<u8>),
    /// An ordered set of strings (e.g. POSIX permission symbols, ACL entries).
    StringSet(Vec<String>),
}

impl AttributeValue {
    /// A stable, human-readable name for this value's runtime type, used in
    /// `IllegalType` error messages and accepted-type matching.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::Bool(_) => "bool",
            AttributeValue::UInt(_) => "uint",
            AttributeValue::Int(_) => "int",
            AttributeValue::Time(_) => "time",
            AttributeValue::Text(_) => "text",
            AttributeValue::Bytes(_) => "bytes",
            AttributeValue::StringSet(_) => "string-set",
        }
    }
}

/// The synthetic directory that holds every root directory of a filesystem,
/// keyed by root string (e.g. `"/"`, `"C:\\"`).
///
/// The super-root is never itself returned by lookup; it exists purely so a
/// root directory has somewhere to live that isn't its own `entries` map
/// (which would make it its own parent *and* its own container, which the
/// `Weak` parent-link model can't express for the owning reference).
#[derive(Debug, Default)]
pub struct SuperRoot {
    roots: RwLock<HashMap<String, Arc<File>>>,
}

impl SuperRoot {
    /// Construct an empty super-root.
    pub fn new() -> Self {
        SuperRoot {
            roots: RwLock::new(HashMap::new()),
        }
    }

    /// Register `root` (a directory `File`) under the given root string.
    /// `root`'s directory content must already be bound to itself
    /// (`Directory::bind_as_root`).
    pub fn insert(&self, root_name: String, root: Arc<File>) {
        self.roots.write().insert(root_name, root);
    }

    /// Look up the root directory registered under `root_name`.
    pub fn get(&self, root_name: &str) -> Option<Arc<File>> {
        self.roots.read().get(root_name).cloned()
    }

    /// All registered root names.
    pub fn root_names(&self) -> Vec<String> {
        self.roots.read().keys().cloned().collect()
    }
}

/// Metadata shared by every file kind (§3 "File metadata").
#[derive(Debug)]
pub struct FileState {
    /// Number of directory entries referencing this file (directories count
    /// their own "." entry too; see §4.3 invariant 2).
    pub link_count: u64,
    /// Number of open channels/handles currently referencing this file.
    pub open_count: u64,
    /// Set once the file has been unlinked from every directory it was
    /// reachable from while still having open handles.
    pub deleted: bool,
    /// Creation time.
    pub creation_time: SystemTime,
    /// Last-access time.
    pub last_access_time: SystemTime,
    /// Last-modified time.
    pub last_modified_time: SystemTime,
    /// Generic attribute store keyed by `"view:attr"`, backing the
    /// owner/posix/unix/dos/acl/user attribute providers (§4.5). The `basic`
    /// view is computed directly from this struct and `FileContent` instead
    /// of being stored here.
    pub attributes: HashMap<String, AttributeValue>,
}

impl FileState {
    fn new(now: SystemTime) -> Self {
        FileState {
            link_count: 0,
            open_count: 0,
            deleted: false,
            creation_time: now,
            last_access_time: now,
            last_modified_time: now,
            attributes: HashMap::new(),
        }
    }
}

/// The tagged sum of file content kinds. Dispatch on file kind is always a
/// `match` on this enum, never a trait-object vtable call.
pub enum FileContent {
    /// An ordered map from name to child file, with parent/self links.
    Directory(Directory),
    /// A seekable byte sequence backed by disk blocks.
    RegularFile(RegularFile),
    /// An immutable target path value.
    Symlink(Symlink),
}

impl fmt::Debug for FileContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileContent::Directory(_) => f.write_str("Directory"),
            FileContent::RegularFile(_) => f.write_str("RegularFile"),
            FileContent::Symlink(s) => write!(f, "Symlink({:?})", s.target()),
        }
    }
}

/// A single file object: its content plus the metadata every kind shares.
///
/// Always held behind `Arc<File>`: directory entries, open channels, and
/// lookup results all share ownership of the same file rather than copying
/// it, matching the "blocks are owned by at most one file, files are shared
/// by reference" model in §9.
#[derive(Debug)]
pub struct File {
    id: FileId,
    content: FileContent,
    state: RwLock<FileState>,
}

impl File {
    /// Construct a new file wrapping the given content, with fresh metadata
    /// timestamped `now` and a zero link/open count.
    pub fn new(id: FileId, content: FileContent, now: SystemTime) -> Arc<File> {
        Arc::new(File {
            id,
            content,
            state: RwLock::new(FileState::new(now)),
        })
    }

    /// This file's identifier.
    pub fn id(&self) -> FileId {
        self.id
    }

    /// The file's content, for dispatch on kind.
    pub fn content(&self) -> &FileContent {
        &self.content
    }

    /// Shared access to this file's metadata.
    pub fn state(&self) -> parking_lot::RwLockReadGuard<'_, FileState> {
        self.state.read()
    }

    /// Exclusive access to this file's metadata.
    pub fn state_mut(&self) -> parking_lot::RwLockWriteGuard<'_, FileState> {
        self.state.write()
    }

    /// Whether this file is a directory.
    pub fn is_directory(&self) -> bool {
        matches!(self.content, FileContent::Directory(_))
    }

    /// Whether this file is a regular file.
    pub fn is_regular_file(&self) -> bool {
        matches!(self.content, FileContent::RegularFile(_))
    }

    /// Whether this file is a symbolic link.
    pub fn is_symbolic_link(&self) -> bool {
        matches!(self.content, FileContent::Symlink(_))
    }

    /// Borrow this file as a directory, if it is one.
    pub fn as_directory(&self) -> Option<&Directory> {
        match &self.content {
            FileContent::Directory(dir) => Some(dir),
            _ => None,
        }
    }

    /// Borrow this file as a regular file, if it is one.
    pub fn as_regular_file(&self) -> Option<&RegularFile> {
        match &self.content {
            FileContent::RegularFile(file) => Some(file),
            _ => None,
        }
    }

    /// Borrow this file as a symlink, if it is one.
    pub fn as_symlink(&self) -> Option<&Symlink> {
        match &self.content {
            FileContent::Symlink(link) => Some(link),
            _ => None,
        }
    }

    /// Increment the open-handle count. Called by every channel/stream on acquisition.
    pub fn opened(&self) {
        self.state.write().open_count += 1;
    }

    /// Decrement the open-handle count, returning `true` if the file should
    /// now be destroyed (`open_count == 0 && deleted`).
    pub fn closed(&self) -> bool {
        let mut state = self.state.write();
        debug_assert!(state.open_count > 0);
        state.open_count -= 1;
        state.open_count == 0 && state.deleted
    }

    /// Record that one directory entry referencing this file was unlinked
    /// (the caller has already decremented `link_count` for that entry).
    /// If other hard links still reference the file, it is not yet deleted
    /// at all. Returns `true` if the file should now be destroyed
    /// (`link_count == 0 && open_count == 0`, i.e. no name and no handle
    /// keeps it alive).
    pub fn deleted(&self) -> bool {
        let mut state = self.state.write();
        if state.link_count > 0 {
            return false;
        }
        state.deleted = true;
        state.open_count == 0
    }

    /// Touch `lastModifiedTime` (and, transitively, `lastAccessTime`) to `now`.
    pub fn touch_modified(&self, now: SystemTime) {
        let mut state = self.state.write();
        state.last_modified_time = now;
        state.last_access_time = now;
    }

    /// Touch `lastAccessTime` to `now`.
    pub fn touch_accessed(&self, now: SystemTime) {
        self.state.write().last_access_time = now;
    }
}
