use std::sync::{Arc, Mutex, RwLock};

use crate::cache::Cache;
use crate::config::RANDOMX_SCRATCHPAD_L3;
use crate::dataset::Dataset;
use crate::error::RandomXError;
use crate::vm::{self, VmMemory};

/// Scratchpads kept around for reuse between hash calls.
const MAX_POOLED_SCRATCHPADS: usize = 8;

/// The memory trade-off for a [`RandomXVm`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RandomXMode {
    /// 256 MiB cache; dataset items are derived on every access.
    Light,
    /// The full ~2 GiB dataset is precomputed at build time.
    Fast,
}

/// One key's worth of immutable hashing state.
struct Generation {
    key: Box<[u8]>,
    memory: VmMemory,
}

impl Generation {
    fn build(key: &[u8], mode: RandomXMode) -> Result<Self, RandomXError> {
        let cache = Cache::new(key)?;
        let memory = match mode {
            RandomXMode::Light => VmMemory::Light(Arc::new(cache)),
            // The cache is only needed to expand the dataset; fast mode
            // frees its 256 MiB once the build finishes.
            RandomXMode::Fast => VmMemory::Fast(Arc::new(Dataset::new(&cache)?)),
        };
        Ok(Generation {
            key: key.into(),
            memory,
        })
    }
}

/// A keyed RandomX hasher.
///
/// Hashing is thread-safe: the cache and dataset are immutable once
/// built, and every in-flight call borrows its own pooled scratchpad.
pub struct RandomXVm {
    mode: RandomXMode,
    generation: RwLock<Option<Arc<Generation>>>,
    scratchpads: ScratchpadPool,
}

impl RandomXVm {
    /// Builds the hashing state for `key`. Fails on an empty key or when
    /// the cache/dataset allocations are refused.
    pub fn new(key: &[u8], mode: RandomXMode) -> Result<Self, RandomXError> {
        let generation = Generation::build(key, mode)?;
        Ok(RandomXVm {
            mode,
            generation: RwLock::new(Some(Arc::new(generation))),
            scratchpads: ScratchpadPool::default(),
        })
    }

    /// Computes the 32-byte RandomX digest of `input`.
    pub fn hash(&self, input: &[u8]) -> Result<[u8; 32], RandomXError> {
        let generation = self
            .generation
            .read()
            .unwrap()
            .clone()
            .ok_or(RandomXError::Closed)?;

        let mut scratchpad = self.scratchpads.acquire()?;
        let digest = vm::hash(&generation.memory, &mut scratchpad, input);
        self.scratchpads.release(scratchpad);

        Ok(digest)
    }

    /// Atomically replaces the key.
    ///
    /// The new cache (and dataset) is built before the old generation is
    /// released; concurrent `hash` calls keep using the old state until
    /// the swap. A failed build leaves the previous key fully usable, and
    /// rekeying to the current key is a no-op.
    pub fn rekey(&self, new_key: &[u8]) -> Result<(), RandomXError> {
        {
            let guard = self.generation.read().unwrap();
            let current = guard.as_ref().ok_or(RandomXError::Closed)?;
            if *current.key == *new_key {
                return Ok(());
            }
        }

        tracing::info!(mode = ?self.mode, "rekeying");
        let fresh = Generation::build(new_key, self.mode)?;

        let mut guard = self.generation.write().unwrap();
        if guard.is_none() {
            return Err(RandomXError::Closed);
        }
        *guard = Some(Arc::new(fresh));
        Ok(())
    }

    /// Releases the cache, dataset and pooled scratchpads. Subsequent
    /// calls fail with [`RandomXError::Closed`].
    pub fn close(&self) {
        *self.generation.write().unwrap() = None;
        self.scratchpads.clear();
    }
}

/// A bounded pool of zeroed 2 MiB scratchpads.
///
/// Buffers are wiped before they are returned so one call's working state
/// can never leak into another's.
#[derive(Default)]
struct ScratchpadPool {
    buffers: Mutex<Vec<Box<[u8]>>>,
}

impl ScratchpadPool {
    fn acquire(&self) -> Result<Box<[u8]>, RandomXError> {
        if let Some(buffer) = self.buffers.lock().unwrap().pop() {
            return Ok(buffer);
        }

        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(RANDOMX_SCRATCHPAD_L3)
            .map_err(RandomXError::alloc("scratchpad"))?;
        buffer.resize(RANDOMX_SCRATCHPAD_L3, 0);
        Ok(buffer.into_boxed_slice())
    }

    fn release(&self, mut scratchpad: Box<[u8]>) {
        scratchpad.fill(0);
        let mut buffers = self.buffers.lock().unwrap();
        if buffers.len() < MAX_POOLED_SCRATCHPADS {
            buffers.push(scratchpad);
        }
    }

    fn clear(&self) {
        self.buffers.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pooled_scratchpads_come_back_zeroed() {
        let pool = ScratchpadPool::default();
        let mut scratchpad = pool.acquire().unwrap();
        scratchpad[12345] = 0xAB;
        scratchpad[RANDOMX_SCRATCHPAD_L3 - 1] = 0xCD;
        pool.release(scratchpad);

        let scratchpad = pool.acquire().unwrap();
        assert!(scratchpad.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn pool_is_bounded() {
        let pool = ScratchpadPool::default();
        let buffers: Vec<_> = (0..MAX_POOLED_SCRATCHPADS + 3)
            .map(|_| pool.acquire().unwrap())
            .collect();
        for buffer in buffers {
            pool.release(buffer);
        }
        assert_eq!(pool.buffers.lock().unwrap().len(), MAX_POOLED_SCRATCHPADS);
    }
}
