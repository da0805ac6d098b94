//! Process-wide registry of live filesystems, keyed by id (§9 "Global
//! mutable state", §10.5), analogous in spirit to the teacher's
//! session-bookkeeping around `BackgroundSession`: a table of weak handles
//! so a filesystem can be looked up by id without keeping it alive past its
//! last strong reference.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::config::Configuration;
use crate::error::FsResult;
use crate::fs::FileSystem;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn registry() -> &'static Mutex<HashMap<u64, Weak<FileSystem>>> {
    static REGISTRY: std::sync::OnceLock<Mutex<HashMap<u64, Weak<FileSystem>>>> = std::sync::OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Construct a new filesystem from `config` and `providers`, registering it
/// under a freshly allocated process-wide id.
pub(crate) fn create(config: Configuration, providers: Vec<Box<dyn crate::attr::AttributeProvider>>) -> FsResult<Arc<FileSystem>> {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let fs = FileSystem::new(id, config, providers)?;
    registry().lock().insert(id, Arc::downgrade(&fs));
    Ok(fs)
}

/// Look up a still-live filesystem by its registry id.
pub fn lookup(id: u64) -> Option<Arc<FileSystem>> {
    registry().lock().get(&id).and_then(Weak::upgrade)
}

/// Remove dead entries (filesystems with no remaining strong references)
/// from the registry, returning how many were dropped. Not required for
/// correctness — dead `Weak`s are harmless — but useful for long-running
/// processes that create and drop many filesystems.
pub fn prune() -> usize {
    let mut map = registry().lock();
    let before = map.len();
    map.retain(|_, weak| weak.strong_count() > 0);
    before - map.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;

    #[test]
    fn create_registers_and_lookup_finds_it() {
        let (config, providers) = Configuration::unix().into_providers().unwrap();
        let fs = create(config, providers).unwrap();
        let id = fs.id();
        assert!(lookup(id).is_some());
        drop(fs);
        assert!(lookup(id).is_none());
    }

    #[test]
    fn prune_removes_dead_entries() {
        let (config, providers) = Configuration::unix().into_providers().unwrap();
        let fs = create(config, providers).unwrap();
        let id = fs.id();
        drop(fs);
        let pruned = prune();
        assert!(pruned >= 1);
        assert!(lookup(id).is_none());
    }
}
