// crates/core/src/memory.rs
//! Memory ballast pool.
//!
//! The pool holds `mem_mib` distinct 1 MiB buffers. Blocks are pushed one at
//! a time so a concurrent status read sees the allocation progressing
//! (`mem_blocks_mib` lags `mem_mib` while the fill is running). A generation
//! counter fences stale fills: a stop or restart bumps the generation and any
//! in-flight fill for the old generation abandons instead of repopulating a
//! cleared pool.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use thiserror::Error;

/// Block size. The pool allocates and counts in these units.
pub const BLOCK_BYTES: usize = 1024 * 1024;

/// One byte of every Nth block is touched to force physical commitment.
const TOUCH_STRIDE: usize = 64;

/// Allocation failure. Non-fatal by design: the caller records it as a note
/// on the job and the job keeps running with whatever was committed.
#[derive(Debug, Error)]
pub enum AllocError {
    #[error("out of memory after {allocated} of {requested} MiB")]
    OutOfMemory { allocated: usize, requested: usize },
}

/// Pool of retained 1 MiB buffers.
pub struct MemoryPool {
    blocks: RwLock<Vec<Vec<u8>>>,
    generation: AtomicU64,
}

impl MemoryPool {
    pub fn new() -> Self {
        Self {
            blocks: RwLock::new(Vec::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Drop the current contents and open a new fill generation.
    /// Returns the token a subsequent [`fill`](Self::fill) must present.
    pub fn reset(&self) -> u64 {
        let gen = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.write_blocks().clear();
        gen
    }

    /// Drop the current contents and invalidate any in-flight fill.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.write_blocks().clear();
    }

    /// Fill the pool with `mem_mib` blocks for generation `gen`.
    ///
    /// Runs on a blocking thread off the control path. Allocation is fallible
    /// (`try_reserve_exact`) so an out-of-memory condition surfaces as an
    /// error instead of aborting the process; blocks committed before the
    /// failure stay in the pool. Returns `Ok` without effect once `gen` is
    /// stale.
    pub fn fill(&self, gen: u64, mem_mib: u64) -> Result<(), AllocError> {
        let requested = mem_mib as usize;
        for i in 0..requested {
            let mut block: Vec<u8> = Vec::new();
            if block.try_reserve_exact(BLOCK_BYTES).is_err() {
                return Err(AllocError::OutOfMemory {
                    allocated: i,
                    requested,
                });
            }
            block.resize(BLOCK_BYTES, 0);

            // Generation check and push under the same lock, so a concurrent
            // clear can never be followed by a stale block landing.
            let mut guard = self.write_blocks();
            if self.generation.load(Ordering::SeqCst) != gen {
                tracing::debug!(allocated = i, requested, "abandoning stale memory fill");
                return Ok(());
            }
            guard.push(block);
        }
        self.touch(gen);
        Ok(())
    }

    /// Sampled page touch: write the first byte of every 64th block.
    /// The volatile store keeps the buffers observably used so nothing can
    /// reclaim or elide them.
    fn touch(&self, gen: u64) {
        let mut blocks = self.write_blocks();
        if self.generation.load(Ordering::SeqCst) != gen {
            return;
        }
        for block in blocks.iter_mut().step_by(TOUCH_STRIDE) {
            // Safety: every block is at least BLOCK_BYTES long.
            unsafe { std::ptr::write_volatile(block.as_mut_ptr(), 1) };
        }
    }

    /// Current retained size in MiB (block count).
    pub fn len_mib(&self) -> u64 {
        match self.blocks.read() {
            Ok(guard) => guard.len() as u64,
            Err(e) => {
                tracing::error!("memory pool lock poisoned on read: {e}");
                0
            }
        }
    }

    /// Current retained size in bytes.
    pub fn total_bytes(&self) -> usize {
        match self.blocks.read() {
            Ok(guard) => guard.iter().map(Vec::len).sum(),
            Err(e) => {
                tracing::error!("memory pool lock poisoned on read: {e}");
                0
            }
        }
    }

    fn write_blocks(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Vec<u8>>> {
        match self.blocks.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("memory pool lock poisoned on write, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl Default for MemoryPool {
    fn default() -> Self {
        Self::new()
    }
}
