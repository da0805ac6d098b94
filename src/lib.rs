//! An in-memory, thread-safe implementation of a hierarchical filesystem.
//!
//! A [`FileSystem`] behaves like a real filesystem — directories, regular
//! files, symbolic links, byte-range I/O, pluggable per-platform attribute
//! views — entirely in process memory, with no backing store and no kernel
//! involvement. It exists for tests and tools that want filesystem
//! semantics without touching disk: construct one with [`Configuration`],
//! operate on it through paths, drop it when done.
//!
//! ```
//! use memfs::{Configuration, OpenOptions};
//!
//! let fs = memfs::new_filesystem(Configuration::unix()).unwrap();
//! fs.create_directory("/tmp").unwrap();
//! let channel = fs.open("/tmp/greeting", OpenOptions::READ | OpenOptions::WRITE | OpenOptions::CREATE).unwrap();
//! channel.write(b"hello").unwrap();
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

mod attr;
mod channel;
mod config;
mod disk;
mod error;
mod file;
mod fs;
mod lookup;
mod name;
mod path;
mod registry;
mod watch;

pub use crate::attr::{
    AclAttributeView, AttributeProvider, AttributeService, AttributeSpec, BasicAttributeView, DosAttributeView,
    OwnerAttributeView, PosixAttributeView, UnixAttributeView, UserAttributeView,
};
pub use crate::channel::ByteChannel;
pub use crate::config::{AttributeView, Configuration, FileSystemBuilder, SupportedFeatures, DEFAULT_BLOCK_SIZE};
pub use crate::error::{FsError, FsErrorKind, FsResult};
pub use crate::file::{AttributeValue, Directory, File, FileId, RegularFile, Symlink};
pub use crate::fs::{FileSystem, MoveMode, OpenOptions};
pub use crate::lookup::MAX_SYMLINK_HOPS;
pub use crate::name::{Name, Normalization, NormalizationSet};
pub use crate::path::{ParsedPath, PathType, UnixPathType, WindowsPathType};
pub use crate::watch::{ChangeEvent, ChangeKind, WatchRegistry};

/// Construct and register a new filesystem from a builder, resolving its
/// provider set and handing back a process-registered, ready-to-use handle
/// (§10.5).
pub fn new_filesystem(builder: FileSystemBuilder) -> FsResult<std::sync::Arc<FileSystem>> {
    let (config, providers) = builder.into_providers()?;
    registry::create(config, providers)
}

/// Look up a still-live filesystem previously created by [`new_filesystem`],
/// by its [`FileSystem::id`].
pub fn lookup_filesystem(id: u64) -> Option<std::sync::Arc<FileSystem>> {
    registry::lookup(id)
}

/// Remove registry entries for filesystems that have already been dropped.
/// Not required for correctness; useful bookkeeping for long-running
/// processes that create and discard many filesystems over their lifetime.
pub fn prune_filesystem_registry() -> usize {
    registry::prune()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_filesystem_is_immediately_usable() {
        let fs = new_filesystem(Configuration::unix()).unwrap();
        fs.create_file("/a").unwrap();
        assert_eq!(fs.list_directory("/").unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn new_filesystem_is_registered_and_found_by_id() {
        let fs = new_filesystem(Configuration::unix()).unwrap();
        let id = fs.id();
        assert!(lookup_filesystem(id).is_some());
        drop(fs);
        assert!(lookup_filesystem(id).is_none());
    }
}
