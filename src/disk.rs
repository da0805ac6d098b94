//! The block-allocation disk backing every regular file (§4.1).
//!
//! A `Disk` hands out fixed-size, zero-initialized blocks up to a hard byte
//! cap and recycles freed blocks through a LIFO cache (recently freed blocks
//! are handed back out first, for locality). The disk never tracks which
//! file owns a block past the point of `allocate`/`free`: ownership lives
//! entirely in the regular file's block list (§4.2).

use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::{FsErrorKind, FsResult};

/// A fixed-size, heap-allocated block of bytes lent out by a [`Disk`].
///
/// Blocks are reference-counted (`Arc`) only so that [`RegularFile::copy`]
/// (§4.2) can hand out fresh, independent block lists cheaply when the bytes
/// are unchanged; any in-place mutation always happens through
/// [`Block::make_mut`], which clones-on-write if the block is shared.
pub type Block = Arc<Vec<u8>>;

fn new_zeroed_block(block_size: usize) -> Block {
    Arc::new(vec![0u8; block_size])
}

/// Clone-on-write access to a block's bytes for in-place mutation.
///
/// Any lent-out block starts with a single strong reference (the owning
/// file's block list), so this is a no-op clone in the common case; it only
/// actually duplicates when `copy()` (§4.2) has produced a second reference
/// to the same bytes.
pub fn make_mut(block: &mut Block) -> &mut Vec<u8> {
    Arc::make_mut(block)
}

struct DiskState {
    /// Free blocks available for immediate reuse, most-recently-freed last.
    cache: Vec<Block>,
    /// Bytes currently lent out to files (not counting the cache).
    allocated_bytes: u64,
}

/// The block pool backing every regular file in a filesystem.
///
/// Holds `(block_size, max_total_bytes, max_cached_blocks)` and enforces the
/// invariant `allocated_bytes + |cache| * block_size <= max_total_bytes` at
/// every observable instant (§8, property 2).
#[derive(Debug)]
pub struct Disk {
    block_size: usize,
    max_total_bytes: u64,
    max_cached_blocks: usize,
    state: Mutex<DiskState>,
}

impl std::fmt::Debug for DiskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskState")
            .field("cached_blocks", &self.cache.len())
            .field("allocated_bytes", &self.allocated_bytes)
            .finish()
    }
}

impl Disk {
    /// Construct a disk with the given block size (bytes), total byte cap,
    /// and maximum number of blocks kept in the free-block cache.
    pub fn new(block_size: usize, max_total_bytes: u64, max_cached_blocks: usize) -> Self {
        assert!(block_size > 0, "block size must be positive");
        Disk {
            block_size,
            max_total_bytes,
            max_cached_blocks,
            state: Mutex::new(DiskState {
                cache: Vec::new(),
                allocated_bytes: 0,
            }),
        }
    }

    /// The configured block size, in bytes.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// The hard cap on total bytes the disk will ever lend out at once
    /// (cache included), irrespective of host memory.
    pub fn total_space(&self) -> u64 {
        self.max_total_bytes
    }

    /// Bytes still available for allocation under the hard cap. Cached free
    /// blocks count as available, not in-use: they are reusable without a
    /// fresh allocation (§8, scenario S1).
    pub fn unallocated_space(&self) -> u64 {
        let state = self.state.lock();
        self.max_total_bytes.saturating_sub(state.allocated_bytes)
    }

    /// Bytes currently lent out to files (excludes the free cache).
    pub fn allocated_bytes(&self) -> u64 {
        self.state.lock().allocated_bytes
    }

    /// Number of blocks currently sitting in the free cache.
    pub fn cached_block_count(&self) -> usize {
        self.state.lock().cache.len()
    }

    /// Append `count` freshly owned, zero-initialized blocks to `target`.
    ///
    /// Fails with [`FsErrorKind::OutOfSpace`] if the cap would be exceeded;
    /// on failure `target` is left completely unmodified (no partial
    /// allocation).
    pub fn allocate(&self, target: &mut Vec<Block>, count: usize) -> FsResult<()> {
        if count == 0 {
            return Ok(());
        }
        let requested_bytes = count as u64 * self.block_size as u64;
        let mut state = self.state.lock();
        let in_use = state.allocated_bytes + (state.cache.len() as u64) * self.block_size as u64;
        if in_use + requested_bytes > self.max_total_bytes {
            return Err(FsErrorKind::OutOfSpace.into());
        }

        let mut new_blocks = Vec::with_capacity(count);
        let mut taken_from_cache = 0u64;
        for _ in 0..count {
            if let Some(block) = state.cache.pop() {
                taken_from_cache += 1;
                new_blocks.push(block);
            } else {
                new_blocks.push(new_zeroed_block(self.block_size));
            }
        }
        // Cache-sourced blocks carry stale bytes past the logical size the
        // caller will track; regular-file writes are responsible for
        // zero-filling any gap they introduce (§4.2). Freshly allocated
        // blocks, however, must start zeroed.
        for block in new_blocks.iter_mut().skip(taken_from_cache as usize) {
            debug_assert!(block.iter().all(|&b| b == 0));
        }

        state.allocated_bytes += requested_bytes;
        target.extend(new_blocks);
        Ok(())
    }

    /// Return the last `count` blocks of `block_list` to the disk.
    ///
    /// Pushed into the free cache (LIFO) while the cache has room; blocks
    /// beyond the cache cap are dropped, releasing their memory immediately.
    pub fn free(&self, block_list: &mut Vec<Block>, count: usize) {
        let count = count.min(block_list.len());
        if count == 0 {
            return;
        }
        let freed_len = block_list.len() - count;
        let freed: Vec<Block> = block_list.split_off(freed_len);

        let mut state = self.state.lock();
        state.allocated_bytes = state
            .allocated_bytes
            .saturating_sub(count as u64 * self.block_size as u64);
        for block in freed {
            if state.cache.len() < self.max_cached_blocks {
                state.cache.push(block);
            }
            // else: dropped here, releasing the allocation.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scenario S1: block allocation accounting.
    #[test]
    fn s1_block_allocation_accounting() {
        let disk = Disk::new(4, 40, 16 / 4);
        let mut blocks = Vec::new();

        disk.allocate(&mut blocks, 6).unwrap();
        assert_eq!(disk.allocated_bytes(), 24);
        assert_eq!(disk.unallocated_space(), 16);

        disk.free(&mut blocks, 2);
        assert_eq!(disk.allocated_bytes(), 16);
        assert_eq!(disk.unallocated_space(), 24);
        assert_eq!(disk.cached_block_count(), 2);

        disk.free(&mut blocks, blocks.len());
        assert_eq!(disk.allocated_bytes(), 0);
        // Cache cap is 16 bytes / 4-byte blocks = 4 blocks, not the 4 freed now
        // plus the 2 already cached (6 total) because the cap is enforced.
        assert_eq!(disk.cached_block_count(), 4);
    }

    #[test]
    fn allocate_fails_without_partial_effect() {
        let disk = Disk::new(4, 8, 10);
        let mut blocks = Vec::new();
        disk.allocate(&mut blocks, 2).unwrap();
        assert!(disk.allocate(&mut blocks, 1).is_err());
        // No partial allocation: still exactly 2 blocks.
        assert_eq!(blocks.len(), 2);
        assert_eq!(disk.allocated_bytes(), 8);
    }

    #[test]
    fn freed_blocks_reused_before_fresh_ones() {
        let disk = Disk::new(4, 1000, 10);
        let mut a = Vec::new();
        disk.allocate(&mut a, 1).unwrap();
        let reused_ptr = Arc::as_ptr(&a[0]);
        disk.free(&mut a, 1);

        let mut b = Vec::new();
        disk.allocate(&mut b, 1).unwrap();
        assert_eq!(Arc::as_ptr(&b[0]), reused_ptr);
    }

    #[test]
    fn fresh_blocks_are_zeroed() {
        let disk = Disk::new(8, 1000, 10);
        let mut blocks = Vec::new();
        disk.allocate(&mut blocks, 1).unwrap();
        assert!(blocks[0].iter().all(|&b| b == 0));
    }
}
