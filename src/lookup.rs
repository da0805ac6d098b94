//! Path lookup: resolving a path from a working directory into a directory
//! entry, with symbolic-link resolution and cycle detection (§4.4).

use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::{FsErrorKind, FsResult};
use crate::file::{File, SuperRoot};
use crate::name::{Name, NormalizationSet};
use crate::path::{ParsedPath, PathType};

/// The maximum number of symlink hops a single lookup will follow before
/// failing with [`FsErrorKind::TooManySymlinks`] (§4.4).
pub const MAX_SYMLINK_HOPS: usize = 40;

/// The result of a path lookup: a directory entry `(parent, name, child?)`.
///
/// `child` is `None` exactly when the final path component does not exist
/// but its parent directory does — the shape a caller needing
/// create-on-absent semantics (e.g. `open(CREATE)`) wants.
#[derive(Debug)]
pub struct DirectoryEntry {
    /// The directory that would contain (or does contain) `name`.
    pub parent: Arc<File>,
    /// The final path component's name.
    pub name: Name,
    /// The resolved file, or `None` if only the parent exists.
    pub child: Option<Arc<File>>,
}

/// Bundles the name-normalization configuration used to turn raw path
/// components into comparable [`Name`] values.
pub struct NameCodec<'a> {
    /// Normalization applied to produce a name's display form.
    pub display: &'a NormalizationSet,
    /// Normalization applied to produce a name's canonical form.
    pub canonical: &'a NormalizationSet,
}

impl NameCodec<'_> {
    fn build(&self, raw: &str) -> Name {
        match raw {
            "." => Name::self_name(),
            ".." => Name::parent_name(),
            _ => Name::new(raw, self.display, self.canonical),
        }
    }
}

/// Resolve `raw_path` starting from `working_dir`, following symlinks in
/// every intermediate position, and in the final position only if
/// `follow_links` is true.
///
/// This never mutates the tree; the returned [`DirectoryEntry`] is a
/// snapshot whose validity beyond the caller's hold on the filesystem lock
/// is not guaranteed (§4.4).
pub fn lookup(
    super_root: &SuperRoot,
    working_dir: &Arc<File>,
    path_type: &dyn PathType,
    codec: &NameCodec<'_>,
    raw_path: &str,
    follow_links: bool,
) -> FsResult<DirectoryEntry> {
    let parsed = path_type
        .parse(raw_path)
        .map_err(|e| e.with_path_context(raw_path))?;

    let mut current = start_directory(super_root, working_dir, &parsed, raw_path)?;
    let mut pending: VecDeque<String> = parsed.components.into();
    let mut link_hops = 0usize;

    loop {
        let Some(raw) = pending.pop_front() else {
            return finish_at_current(&current, raw_path);
        };
        let is_last = pending.is_empty();
        let name = codec.build(&raw);

        if name.is_self() {
            continue;
        }
        if name.is_parent() {
            current = current
                .as_directory()
                .ok_or_else(|| FsErrorKind::NotADirectory.with_path(raw_path))?
                .parent();
            continue;
        }

        let dir = current
            .as_directory()
            .ok_or_else(|| FsErrorKind::NotADirectory.with_path(raw_path))?;
        let found = dir.get(&name);

        match found {
            None => {
                if is_last {
                    return Ok(DirectoryEntry {
                        parent: Arc::clone(&current),
                        name,
                        child: None,
                    });
                }
                return Err(FsErrorKind::NotFound.with_path(raw_path));
            }
            Some(child) => {
                if is_last {
                    if child.is_symbolic_link() && follow_links {
                        link_hops += 1;
                        if link_hops > MAX_SYMLINK_HOPS {
                            return Err(FsErrorKind::TooManySymlinks.with_path(raw_path));
                        }
                        let target = child.as_symlink().unwrap().target().clone();
                        splice_target(&mut pending, &target);
                        if let Some(root) = &target.root {
                            current = super_root
                                .get(root)
                                .ok_or_else(|| FsErrorKind::NotFound.with_path(raw_path))?;
                        }
                        continue;
                    }
                    return Ok(DirectoryEntry {
                        parent: Arc::clone(&current),
                        name,
                        child: Some(child),
                    });
                }
                if child.is_directory() {
                    current = child;
                    continue;
                }
                if child.is_symbolic_link() {
                    link_hops += 1;
                    if link_hops > MAX_SYMLINK_HOPS {
                        return Err(FsErrorKind::TooManySymlinks.with_path(raw_path));
                    }
                    let target = child.as_symlink().unwrap().target().clone();
                    splice_target(&mut pending, &target);
                    if let Some(root) = &target.root {
                        current = super_root
                            .get(root)
                            .ok_or_else(|| FsErrorKind::NotFound.with_path(raw_path))?;
                    }
                    continue;
                }
                // A regular file in a non-final position can't be descended into.
                return Err(FsErrorKind::NotFound.with_path(raw_path));
            }
        }
    }
}

fn finish_at_current(current: &Arc<File>, raw_path: &str) -> FsResult<DirectoryEntry> {
    let dir = current
        .as_directory()
        .ok_or_else(|| FsErrorKind::NotADirectory.with_path(raw_path))?;
    Ok(DirectoryEntry {
        parent: dir.parent(),
        name: Name::self_name(),
        child: Some(Arc::clone(current)),
    })
}

fn start_directory(
    super_root: &SuperRoot,
    working_dir: &Arc<File>,
    parsed: &ParsedPath,
    raw_path: &str,
) -> FsResult<Arc<File>> {
    match &parsed.root {
        Some(root) => super_root
            .get(root)
            .ok_or_else(|| FsErrorKind::NotFound.with_path(raw_path)),
        None => Ok(Arc::clone(working_dir)),
    }
}

/// Splice a symlink's target components onto the front of the still-pending
/// queue (the "prepend the target to the remaining components" step of
/// §4.4's algorithm).
fn splice_target(pending: &mut VecDeque<String>, target: &ParsedPath) {
    for component in target.components.iter().rev() {
        pending.push_front(component.clone());
    }
}

trait FsErrorKindExt {
    fn with_path(self, path: &str) -> crate::error::FsError;
}

impl FsErrorKindExt for FsErrorKind {
    fn with_path(self, path: &str) -> crate::error::FsError {
        crate::error::FsError::with_path(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::{Directory, FileContent, FileId, Symlink};
    use crate::name::Normalization;
    use crate::path::UnixPathType;
    use std::time::SystemTime;

    fn mkdir() -> Arc<File> {
        let f = File::new(FileId::test_id(0), FileContent::Directory(Directory::new()), SystemTime::now());
        f.as_directory().unwrap().bind_self(&f);
        f
    }

    fn link_dir(parent: &Arc<File>, name: &str) -> Arc<File> {
        let child = mkdir();
        let codec = NameCodec {
            display: &NormalizationSet::none(),
            canonical: &NormalizationSet::none(),
        };
        parent
            .as_directory()
            .unwrap()
            .link(parent, codec.build(name), Arc::clone(&child))
            .unwrap();
        child
    }

    fn link_symlink(parent: &Arc<File>, name: &str, target: &str, path_type: &dyn PathType) -> Arc<File> {
        let parsed = path_type.parse(target).unwrap();
        let link = File::new(FileId::test_id(99), FileContent::Symlink(Symlink::new(parsed)), SystemTime::now());
        let codec = NameCodec {
            display: &NormalizationSet::none(),
            canonical: &NormalizationSet::none(),
        };
        parent.as_directory().unwrap().link(parent, codec.build(name), Arc::clone(&link)).unwrap();
        link
    }

    fn setup() -> (SuperRoot, Arc<File>, UnixPathType) {
        let super_root = SuperRoot::new();
        let root = mkdir();
        root.as_directory().unwrap().bind_as_root();
        super_root.insert("/".to_string(), Arc::clone(&root));
        (super_root, root, UnixPathType::new())
    }

    #[test]
    fn s3_symlink_resolution() {
        let (super_root, root, pt) = setup();
        let work = link_dir(&root, "work");
        let four = link_dir(&work, "four");
        let foo = link_dir(&root, "foo");
        let _bar = link_dir(&foo, "bar");
        link_symlink(&four, "five", "/foo", &pt);

        let codec = NameCodec {
            display: &NormalizationSet::none(),
            canonical: &NormalizationSet::none(),
        };

        let entry = lookup(&super_root, &root, &pt, &codec, "/work/four/five/bar", true).unwrap();
        assert!(Arc::ptr_eq(&entry.parent, &foo));
        assert_eq!(entry.name.display(), "bar");
        assert!(entry.child.is_some());

        let entry2 = lookup(&super_root, &root, &pt, &codec, "/work/four/five", false).unwrap();
        assert!(Arc::ptr_eq(&entry2.parent, &four));
        assert_eq!(entry2.name.display(), "five");
        assert!(entry2.child.unwrap().is_symbolic_link());
    }

    #[test]
    fn s4_loop_detection() {
        let (super_root, root, pt) = setup();
        let work = link_dir(&root, "work");
        let four = link_dir(&work, "four");
        link_symlink(&four, "loop", "../four/loop", &pt);

        let codec = NameCodec {
            display: &NormalizationSet::none(),
            canonical: &NormalizationSet::none(),
        };
        let err = lookup(&super_root, &root, &pt, &codec, "/work/four/loop", true).unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::TooManySymlinks);
    }

    #[test]
    fn lookup_missing_last_component_returns_parent_only() {
        let (super_root, root, pt) = setup();
        let codec = NameCodec {
            display: &NormalizationSet::none(),
            canonical: &NormalizationSet::none(),
        };
        let entry = lookup(&super_root, &root, &pt, &codec, "/missing", true).unwrap();
        assert!(Arc::ptr_eq(&entry.parent, &root));
        assert!(entry.child.is_none());
    }

    #[test]
    fn lookup_missing_intermediate_fails_not_found() {
        let (super_root, root, pt) = setup();
        let codec = NameCodec {
            display: &NormalizationSet::none(),
            canonical: &NormalizationSet::none(),
        };
        let err = lookup(&super_root, &root, &pt, &codec, "/missing/also-missing", true).unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::NotFound);
    }

    #[test]
    fn s6_case_insensitive_lookup_with_display_preservation() {
        let super_root = SuperRoot::new();
        let root = mkdir();
        root.as_directory().unwrap().bind_as_root();
        super_root.insert("/".to_string(), Arc::clone(&root));
        let pt = UnixPathType::new();

        let display_norm = NormalizationSet::none();
        let canonical_norm = NormalizationSet::new([Normalization::CaseFoldAscii]);
        let codec = NameCodec {
            display: &display_norm,
            canonical: &canonical_norm,
        };

        let foo = mkdir();
        root.as_directory().unwrap().link(&root, codec.build("FOO"), Arc::clone(&foo)).unwrap();
        let bar = mkdir();
        root.as_directory().unwrap().link(&root, codec.build("bar"), bar).unwrap();

        let entry = lookup(&super_root, &root, &pt, &codec, "/foo", true).unwrap();
        assert!(Arc::ptr_eq(&entry.child.unwrap(), &foo));

        let names: Vec<String> = root
            .as_directory()
            .unwrap()
            .snapshot()
            .iter()
            .map(|n| n.display().to_string())
            .collect();
        assert_eq!(names, vec!["FOO".to_string(), "bar".to_string()]);
    }

    #[test]
    fn lookup_idempotence_matches_directory_get() {
        let (super_root, root, pt) = setup();
        let _work = link_dir(&root, "work");
        let codec = NameCodec {
            display: &NormalizationSet::none(),
            canonical: &NormalizationSet::none(),
        };
        let entry = lookup(&super_root, &root, &pt, &codec, "/work", false).unwrap();
        let looked_up_again = entry.parent.as_directory().unwrap().get(&entry.name);
        assert!(looked_up_again.is_some());
        assert!(Arc::ptr_eq(&looked_up_again.unwrap(), &entry.child.unwrap()));
    }
}
