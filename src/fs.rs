//! The filesystem view (L4, §4.6): the coordination layer tying path lookup,
//! directories, regular files, and the attribute service together behind a
//! standard filesystem-call surface (create, open, link, delete, copy, move,
//! symlink, `isSameFile`).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::SystemTime;

use bitflags::bitflags;
use log::{debug, trace, warn};
use parking_lot::RwLock;

use crate::attr::AttributeService;
use crate::channel::ByteChannel;
use crate::config::Configuration;
use crate::disk::Disk;
use crate::error::{FsErrorKind, FsResult};
use crate::file::{Directory, File, FileContent, FileIdAllocator, RegularFile, SuperRoot, Symlink};
use crate::lookup::{self, DirectoryEntry, NameCodec};
use crate::name::Name;
use crate::watch::{ChangeKind, WatchRegistry};

bitflags! {
    /// Flags controlling [`FileSystem::open`] (§4.6).
    #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
    pub struct OpenOptions: u32 {
        /// Open for reading.
        const READ = 0b0000_0001;
        /// Open for writing.
        const WRITE = 0b0000_0010;
        /// Create the file if it does not exist.
        const CREATE = 0b0000_0100;
        /// Create the file, failing with `AlreadyExists` if it does.
        const CREATE_NEW = 0b0000_1000;
        /// Truncate an existing file to zero length on open-for-write.
        const TRUNCATE_EXISTING = 0b0001_0000;
        /// Writes always target the current end of the file.
        const APPEND = 0b0010_0000;
    }
}

/// Whether a move must fail rather than silently fall back to copy+delete
/// when it cannot be done atomically (§4.6).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MoveMode {
    /// Fall back to copy+delete if an atomic rename is not applicable.
    Default,
    /// Fail with `AtomicMoveNotSupported` instead of falling back.
    AtomicRequired,
}

/// An in-memory hierarchical filesystem (§1).
///
/// Every mutating operation takes the filesystem-wide lock in exclusive
/// mode; every read-only tree operation takes it in shared mode. Regular
/// file I/O additionally takes that file's own lock, always acquired after
/// the filesystem lock, never before (§5).
pub struct FileSystem {
    id: u64,
    config: Configuration,
    disk: Arc<Disk>,
    id_allocator: FileIdAllocator,
    super_root: SuperRoot,
    attr_service: AttributeService,
    fs_lock: RwLock<()>,
    working_directory: RwLock<Arc<File>>,
    pub(crate) watches: WatchRegistry,
    open_channels: parking_lot::Mutex<Vec<Weak<ByteChannel>>>,
    next_channel_slot: AtomicU64,
    closed: std::sync::atomic::AtomicBool,
}

impl std::fmt::Debug for FileSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSystem")
            .field("id", &self.id)
            .field("config", &self.config)
            .finish()
    }
}

impl FileSystem {
    /// Construct a new filesystem from a validated configuration, creating
    /// its roots and setting the working directory.
    pub(crate) fn new(id: u64, config: Configuration, providers: Vec<Box<dyn crate::attr::AttributeProvider>>) -> FsResult<Arc<Self>> {
        let disk = Arc::new(Disk::new(config.block_size(), config.max_size(), (config.max_cache_size() / config.block_size() as u64) as usize));
        let id_allocator = FileIdAllocator::new();
        let attr_service = AttributeService::new(providers)?;
        let super_root = SuperRoot::new();

        let now = SystemTime::now();
        let mut first_root: Option<Arc<File>> = None;
        for root_name in config.path_type().roots() {
            let root = File::new(id_allocator.next(), FileContent::Directory(Directory::new()), now);
            root.as_directory().unwrap().bind_self(&root);
            root.as_directory().unwrap().bind_as_root();
            attr_service.apply_initial(&root, now);
            super_root.insert(root_name.clone(), Arc::clone(&root));
            first_root.get_or_insert(root);
        }
        let first_root = first_root.ok_or(FsErrorKind::NotFound)?;

        let fs = FileSystem {
            id,
            disk,
            id_allocator,
            super_root,
            attr_service,
            fs_lock: RwLock::new(()),
            working_directory: RwLock::new(first_root),
            watches: WatchRegistry::new(),
            open_channels: parking_lot::Mutex::new(Vec::new()),
            next_channel_slot: AtomicU64::new(0),
            closed: std::sync::atomic::AtomicBool::new(false),
            config,
        };
        let fs = Arc::new(fs);
        let working_directory = fs.lookup_internal(fs.config.working_directory(), true)?;
        let working_dir_file = working_directory
            .child
            .ok_or(FsErrorKind::NotFound)?;
        *fs.working_directory.write() = working_dir_file;
        Ok(fs)
    }

    /// This filesystem's process-wide registry identifier (§10.5).
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The configuration this filesystem was built from.
    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    fn codec(&self) -> NameCodec<'_> {
        NameCodec {
            display: self.config.display_normalization(),
            canonical: self.config.canonical_normalization(),
        }
    }

    fn lookup_internal(&self, path: &str, follow_links: bool) -> FsResult<DirectoryEntry> {
        let working_dir = self.working_directory.read().clone();
        lookup::lookup(
            &self.super_root,
            &working_dir,
            self.config.path_type().as_ref(),
            &self.codec(),
            path,
            follow_links,
        )
    }

    fn require_entry(entry: &DirectoryEntry, path: &str) -> FsResult<Arc<File>> {
        entry
            .child
            .as_ref()
            .cloned()
            .ok_or_else(|| crate::error::FsError::with_path(FsErrorKind::NotFound, path))
    }

    /// Create a new, empty regular file at `path`. Fails with
    /// `AlreadyExists` if an entry is already there, `NotFound` if the
    /// parent does not exist.
    pub fn create_file(&self, path: &str) -> FsResult<Arc<File>> {
        trace!("create_file {path}");
        let _guard = self.fs_lock.write();
        let entry = self.lookup_internal(path, false)?;
        if entry.child.is_some() {
            return Err(crate::error::FsError::with_path(FsErrorKind::AlreadyExists, path));
        }
        let now = SystemTime::now();
        let file = File::new(self.id_allocator.next(), FileContent::RegularFile(RegularFile::new(Arc::clone(&self.disk))), now);
        entry
            .parent
            .as_directory()
            .ok_or(FsErrorKind::NotADirectory)?
            .link(&entry.parent, entry.name.clone(), Arc::clone(&file))?;
        self.attr_service.apply_initial(&file, now);
        self.watches.record(&entry.parent, ChangeKind::Created, entry.name.display());
        Ok(file)
    }

    /// Create a new directory at `path`.
    pub fn create_directory(&self, path: &str) -> FsResult<Arc<File>> {
        trace!("create_directory {path}");
        let _guard = self.fs_lock.write();
        let entry = self.lookup_internal(path, false)?;
        if entry.child.is_some() {
            return Err(crate::error::FsError::with_path(FsErrorKind::AlreadyExists, path));
        }
        let now = SystemTime::now();
        let dir = File::new(self.id_allocator.next(), FileContent::Directory(Directory::new()), now);
        dir.as_directory().unwrap().bind_self(&dir);
        entry
            .parent
            .as_directory()
            .ok_or(FsErrorKind::NotADirectory)?
            .link(&entry.parent, entry.name.clone(), Arc::clone(&dir))?;
        self.attr_service.apply_initial(&dir, now);
        self.watches.record(&entry.parent, ChangeKind::Created, entry.name.display());
        Ok(dir)
    }

    /// Create a symbolic link at `path` pointing at `target`.
    pub fn create_symlink(&self, path: &str, target: &str) -> FsResult<Arc<File>> {
        trace!("create_symlink {path} -> {target}");
        let _guard = self.fs_lock.write();
        let entry = self.lookup_internal(path, false)?;
        if entry.child.is_some() {
            return Err(crate::error::FsError::with_path(FsErrorKind::AlreadyExists, path));
        }
        let parsed_target = self.config.path_type().parse(target)?;
        let now = SystemTime::now();
        let link = File::new(self.id_allocator.next(), FileContent::Symlink(Symlink::new(parsed_target)), now);
        entry
            .parent
            .as_directory()
            .ok_or(FsErrorKind::NotADirectory)?
            .link(&entry.parent, entry.name.clone(), Arc::clone(&link))?;
        self.attr_service.apply_initial(&link, now);
        self.watches.record(&entry.parent, ChangeKind::Created, entry.name.display());
        Ok(link)
    }

    /// Read a symlink's target, rendered back as a path string.
    pub fn read_symlink(&self, path: &str) -> FsResult<String> {
        let _guard = self.fs_lock.read();
        let entry = self.lookup_internal(path, false)?;
        let file = Self::require_entry(&entry, path)?;
        let link = file.as_symlink().ok_or_else(|| crate::error::FsError::with_path(FsErrorKind::InvalidPath, path))?;
        let target = link.target();
        let components: Vec<&str> = target.components.iter().map(String::as_str).collect();
        Ok(self.config.path_type().render(target.root.as_deref(), &components))
    }

    /// Open `path` as a byte channel under `options` (§4.6).
    pub fn open(self: &Arc<Self>, path: &str, options: OpenOptions) -> FsResult<Arc<ByteChannel>> {
        trace!("open {path} {options:?}");
        let _guard = self.fs_lock.write();
        let entry = self.lookup_internal(path, true)?;

        let file = match entry.child {
            Some(file) => {
                if options.contains(OpenOptions::CREATE_NEW) {
                    return Err(crate::error::FsError::with_path(FsErrorKind::AlreadyExists, path));
                }
                file
            }
            None => {
                if !options.contains(OpenOptions::CREATE) && !options.contains(OpenOptions::CREATE_NEW) {
                    return Err(crate::error::FsError::with_path(FsErrorKind::NotFound, path));
                }
                let now = SystemTime::now();
                let file = File::new(self.id_allocator.next(), FileContent::RegularFile(RegularFile::new(Arc::clone(&self.disk))), now);
                entry
                    .parent
                    .as_directory()
                    .ok_or(FsErrorKind::NotADirectory)?
                    .link(&entry.parent, entry.name.clone(), Arc::clone(&file))?;
                self.attr_service.apply_initial(&file, now);
                self.watches.record(&entry.parent, ChangeKind::Created, entry.name.display());
                file
            }
        };

        if file.is_directory() {
            return Err(crate::error::FsError::with_path(FsErrorKind::IsADirectory, path));
        }
        let regular = file.as_regular_file().ok_or_else(|| crate::error::FsError::with_path(FsErrorKind::NotADirectory, path))?;
        if options.contains(OpenOptions::TRUNCATE_EXISTING) && options.contains(OpenOptions::WRITE) {
            regular.truncate(0);
        }

        let channel = Arc::new(ByteChannel::new(Arc::clone(&file), options));
        self.open_channels.lock().push(Arc::downgrade(&channel));
        Ok(channel)
    }

    /// Add a hard link: a second directory entry referencing the same file
    /// as `existing_path`. Fails if the source is a directory (§4.6).
    pub fn link(&self, existing_path: &str, new_path: &str) -> FsResult<()> {
        trace!("link {existing_path} -> {new_path}");
        let _guard = self.fs_lock.write();
        let source_entry = self.lookup_internal(existing_path, true)?;
        let source = Self::require_entry(&source_entry, existing_path)?;
        if source.is_directory() {
            return Err(crate::error::FsError::with_path(FsErrorKind::IsADirectory, existing_path));
        }
        let target_entry = self.lookup_internal(new_path, false)?;
        if target_entry.child.is_some() {
            return Err(crate::error::FsError::with_path(FsErrorKind::AlreadyExists, new_path));
        }
        target_entry
            .parent
            .as_directory()
            .ok_or(FsErrorKind::NotADirectory)?
            .link(&target_entry.parent, target_entry.name.clone(), Arc::clone(&source))?;
        self.watches
            .record(&target_entry.parent, ChangeKind::Created, target_entry.name.display());
        Ok(())
    }

    /// Delete the entry at `path`. A directory must be empty (§4.6).
    pub fn delete(&self, path: &str) -> FsResult<()> {
        trace!("delete {path}");
        let _guard = self.fs_lock.write();
        let entry = self.lookup_internal(path, false)?;
        let file = Self::require_entry(&entry, path)?;
        if let Some(dir) = file.as_directory() {
            if dir.is_root() {
                return Err(crate::error::FsError::with_path(FsErrorKind::AccessDenied, path));
            }
            if !dir.is_empty() {
                return Err(crate::error::FsError::with_path(FsErrorKind::DirectoryNotEmpty, path));
            }
        }
        let parent_dir = entry.parent.as_directory().ok_or(FsErrorKind::NotADirectory)?;
        parent_dir.unlink(&entry.name)?;
        let should_destroy = file.deleted();
        if should_destroy {
            if let Some(regular) = file.as_regular_file() {
                regular.truncate(0);
            }
        }
        self.watches.record(&entry.parent, ChangeKind::Deleted, entry.name.display());
        debug!("deleted {path} (destroyed immediately: {should_destroy})");
        Ok(())
    }

    /// Copy the file at `source_path` to `target_path`. Regular files are
    /// deep-copied via [`RegularFile::copy`]; directories are not
    /// recursively copied at this layer (§4.6) — callers iterate and copy
    /// each entry themselves.
    pub fn copy(&self, source_path: &str, target_path: &str) -> FsResult<Arc<File>> {
        trace!("copy {source_path} -> {target_path}");
        let _guard = self.fs_lock.write();
        let source_entry = self.lookup_internal(source_path, true)?;
        let source = Self::require_entry(&source_entry, source_path)?;
        if source.is_directory() {
            return Err(crate::error::FsError::with_path(FsErrorKind::IsADirectory, source_path));
        }
        let target_entry = self.lookup_internal(target_path, false)?;
        if target_entry.child.is_some() {
            return Err(crate::error::FsError::with_path(FsErrorKind::AlreadyExists, target_path));
        }

        let now = SystemTime::now();
        let copy = match source.content() {
            FileContent::RegularFile(regular) => File::new(self.id_allocator.next(), FileContent::RegularFile(regular.copy()), now),
            FileContent::Symlink(link) => File::new(self.id_allocator.next(), FileContent::Symlink(link.clone()), now),
            FileContent::Directory(_) => unreachable!("directories rejected above"),
        };
        target_entry
            .parent
            .as_directory()
            .ok_or(FsErrorKind::NotADirectory)?
            .link(&target_entry.parent, target_entry.name.clone(), Arc::clone(&copy))?;
        self.attr_service.apply_initial(&copy, now);
        self.watches
            .record(&target_entry.parent, ChangeKind::Created, target_entry.name.display());
        Ok(copy)
    }

    /// Move (rename) the entry at `source_path` to `target_path`.
    pub fn r#move(&self, source_path: &str, target_path: &str, mode: MoveMode) -> FsResult<()> {
        trace!("move {source_path} -> {target_path}");
        let _guard = self.fs_lock.write();
        let source_entry = self.lookup_internal(source_path, false)?;
        let source = Self::require_entry(&source_entry, source_path)?;
        let target_entry = self.lookup_internal(target_path, false)?;
        if target_entry.child.is_some() {
            return Err(crate::error::FsError::with_path(FsErrorKind::AlreadyExists, target_path));
        }

        if let Some(source_dir) = source.as_directory() {
            if Arc::ptr_eq(&target_entry.parent, &source) || is_descendant(&target_entry.parent, source_dir) {
                // A move is always performed atomically in-memory; the only
                // way it can fail is this degenerate case, so both modes
                // reject it the same way.
                let _ = mode;
                return Err(FsErrorKind::AtomicMoveNotSupported.into());
            }
        }

        source_entry
            .parent
            .as_directory()
            .ok_or(FsErrorKind::NotADirectory)?
            .unlink(&source_entry.name)?;
        target_entry
            .parent
            .as_directory()
            .ok_or(FsErrorKind::NotADirectory)?
            .link(&target_entry.parent, target_entry.name.clone(), Arc::clone(&source))?;
        self.watches
            .record(&source_entry.parent, ChangeKind::Deleted, source_entry.name.display());
        self.watches
            .record(&target_entry.parent, ChangeKind::Created, target_entry.name.display());
        Ok(())
    }

    /// List the display names of `path`'s directory entries, sorted by
    /// display string (§4.3).
    pub fn list_directory(&self, path: &str) -> FsResult<Vec<String>> {
        let _guard = self.fs_lock.read();
        let entry = self.lookup_internal(path, true)?;
        let file = Self::require_entry(&entry, path)?;
        let dir = file.as_directory().ok_or_else(|| crate::error::FsError::with_path(FsErrorKind::NotADirectory, path))?;
        Ok(dir.snapshot().iter().map(|n| n.display().to_string()).collect())
    }

    /// Whether `path_a` and `path_b` resolve to the same file identity.
    pub fn is_same_file(&self, path_a: &str, path_b: &str) -> FsResult<bool> {
        let _guard = self.fs_lock.read();
        let a = Self::require_entry(&self.lookup_internal(path_a, true)?, path_a)?;
        let b = Self::require_entry(&self.lookup_internal(path_b, true)?, path_b)?;
        Ok(a.id() == b.id())
    }

    /// `getAttribute(path, "view:attr")` (§4.5).
    pub fn get_attribute(&self, path: &str, spec: &str, follow_links: bool) -> FsResult<crate::file::AttributeValue> {
        let _guard = self.fs_lock.read();
        let file = Self::require_entry(&self.lookup_internal(path, follow_links)?, path)?;
        self.attr_service.get_attribute(&file, spec)
    }

    /// `setAttribute(path, "view:attr", value)` (§4.5).
    pub fn set_attribute(&self, path: &str, spec: &str, value: crate::file::AttributeValue, follow_links: bool) -> FsResult<()> {
        let _guard = self.fs_lock.write();
        let file = Self::require_entry(&self.lookup_internal(path, follow_links)?, path)?;
        self.attr_service.set_attribute(&file, spec, value, false)
    }

    /// `readAttributes(path, "view:a,b,c" | "view:*")` (§4.5).
    pub fn read_attributes(&self, path: &str, spec: &str, follow_links: bool) -> FsResult<Vec<(String, crate::file::AttributeValue)>> {
        let _guard = self.fs_lock.read();
        let file = Self::require_entry(&self.lookup_internal(path, follow_links)?, path)?;
        self.attr_service.read_attributes(&file, spec)
    }

    /// The set of attribute views this filesystem supports.
    pub fn supported_file_attribute_views(&self) -> Vec<&'static str> {
        self.attr_service.supported_file_attribute_views()
    }

    /// Close this filesystem: force-close every still-open channel,
    /// aggregating errors (first kept as primary, remainder logged and
    /// suppressed), matching the teacher's multi-threaded session shutdown
    /// aggregation (`src/session_mt.rs`).
    pub fn close(&self) -> FsResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let channels = std::mem::take(&mut *self.open_channels.lock());
        let mut primary: Option<crate::error::FsError> = None;
        for weak in channels {
            if let Some(channel) = weak.upgrade() {
                if let Err(err) = channel.close() {
                    if primary.is_none() {
                        primary = Some(err);
                    } else {
                        warn!("suppressed error closing channel: {err}");
                    }
                }
            }
        }
        match primary {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn is_descendant(candidate: &Arc<File>, ancestor: &Directory) -> bool {
    let ancestor_self = ancestor.self_file();
    let mut current = Arc::clone(candidate);
    loop {
        if Arc::ptr_eq(&current, &ancestor_self) {
            return true;
        }
        let Some(dir) = current.as_directory() else { return false };
        if dir.is_root() {
            return false;
        }
        current = dir.parent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;

    fn new_fs() -> Arc<FileSystem> {
        let (config, providers) = Configuration::unix().into_providers().unwrap();
        FileSystem::new(1, config, providers).unwrap()
    }

    #[test]
    fn create_and_open_round_trips_bytes() {
        let fs = new_fs();
        fs.create_file("/a.txt").unwrap();
        let channel = fs.open("/a.txt", OpenOptions::READ | OpenOptions::WRITE).unwrap();
        channel.write(b"hello").unwrap();
        channel.seek(0);
        let mut buf = [0u8; 5];
        let n = channel.read(&mut buf).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn create_file_twice_fails() {
        let fs = new_fs();
        fs.create_file("/a.txt").unwrap();
        let err = fs.create_file("/a.txt").unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::AlreadyExists);
    }

    #[test]
    fn open_missing_without_create_fails() {
        let fs = new_fs();
        let err = fs.open("/missing.txt", OpenOptions::READ).unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::NotFound);
    }

    #[test]
    fn open_create_makes_new_file() {
        let fs = new_fs();
        let channel = fs.open("/new.txt", OpenOptions::READ | OpenOptions::WRITE | OpenOptions::CREATE).unwrap();
        channel.write(b"x").unwrap();
        assert_eq!(fs.list_directory("/").unwrap(), vec!["new.txt".to_string()]);
    }

    /// Scenario S5: delete-while-open preserves readability.
    #[test]
    fn s5_delete_while_open_preserves_readability() {
        let fs = new_fs();
        fs.create_file("/a").unwrap();
        let channel = fs.open("/a", OpenOptions::READ | OpenOptions::WRITE).unwrap();
        channel.write(b"data").unwrap();
        channel.seek(0);

        fs.delete("/a").unwrap();

        let mut buf = [0u8; 4];
        let n = channel.read(&mut buf).unwrap();
        assert_eq!(n, 4);
        assert_eq!(&buf, b"data");

        let err = fs.open("/a", OpenOptions::READ).unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::NotFound);

        channel.close().unwrap();
    }

    #[test]
    fn delete_nonempty_directory_fails() {
        let fs = new_fs();
        fs.create_directory("/d").unwrap();
        fs.create_file("/d/f").unwrap();
        let err = fs.delete("/d").unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::DirectoryNotEmpty);
    }

    #[test]
    fn link_creates_second_name_for_same_file() {
        let fs = new_fs();
        fs.create_file("/a").unwrap();
        fs.link("/a", "/b").unwrap();
        assert!(fs.is_same_file("/a", "/b").unwrap());
    }

    #[test]
    fn link_rejects_directories() {
        let fs = new_fs();
        fs.create_directory("/d").unwrap();
        let err = fs.link("/d", "/d2").unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::IsADirectory);
    }

    #[test]
    fn delete_one_hard_link_preserves_data_reachable_through_another() {
        let fs = new_fs();
        fs.create_file("/a").unwrap();
        fs.link("/a", "/b").unwrap();
        let channel = fs.open("/a", OpenOptions::READ | OpenOptions::WRITE).unwrap();
        channel.write(b"hard-linked").unwrap();
        channel.close().unwrap();

        fs.delete("/a").unwrap();

        assert!(fs.open("/a", OpenOptions::READ).is_err());
        let b_channel = fs.open("/b", OpenOptions::READ).unwrap();
        let mut buf = [0u8; 11];
        assert_eq!(b_channel.read(&mut buf).unwrap(), 11);
        assert_eq!(&buf, b"hard-linked");
    }

    #[test]
    fn copy_is_independent_of_source() {
        let fs = new_fs();
        fs.create_file("/a").unwrap();
        let channel = fs.open("/a", OpenOptions::WRITE).unwrap();
        channel.write(b"original").unwrap();
        channel.close().unwrap();

        fs.copy("/a", "/b").unwrap();
        let b_channel = fs.open("/b", OpenOptions::READ | OpenOptions::WRITE).unwrap();
        b_channel.write(b"mutated!").unwrap();

        let a_channel = fs.open("/a", OpenOptions::READ).unwrap();
        let mut buf = [0u8; 8];
        a_channel.read(&mut buf).unwrap();
        assert_eq!(&buf, b"original");
    }

    #[test]
    fn move_renames_entry() {
        let fs = new_fs();
        fs.create_file("/a").unwrap();
        fs.r#move("/a", "/b", MoveMode::Default).unwrap();
        assert!(fs.list_directory("/").unwrap().contains(&"b".to_string()));
        assert!(fs.open("/a", OpenOptions::READ).is_err());
    }

    #[test]
    fn symlink_read_back() {
        let fs = new_fs();
        fs.create_directory("/foo").unwrap();
        fs.create_symlink("/link", "/foo").unwrap();
        assert_eq!(fs.read_symlink("/link").unwrap(), "/foo");
        let entry = fs.lookup_internal("/link", true).unwrap();
        assert!(entry.child.unwrap().is_directory());
    }

    #[test]
    fn get_and_set_attribute_round_trip() {
        let fs = new_fs();
        fs.create_file("/a").unwrap();
        fs.set_attribute("/a", "owner:owner", crate::file::AttributeValue::Text("me".to_string()), true)
            .unwrap();
        let value = fs.get_attribute("/a", "owner:owner", true).unwrap();
        assert_eq!(value, crate::file::AttributeValue::Text("me".to_string()));
    }

    #[test]
    fn close_is_idempotent() {
        let fs = new_fs();
        fs.create_file("/a").unwrap();
        let _channel = fs.open("/a", OpenOptions::READ).unwrap();
        fs.close().unwrap();
        fs.close().unwrap();
    }
}
