use std::time::Instant;

use argon2::{Algorithm, Argon2, Block, Params, Version};

use crate::blake2_generator::Blake2Generator;
use crate::error::RandomXError;
use crate::{
    config::{
        CACHE_ITEM_COUNT, RANDOMX_ARGON_ITERATIONS, RANDOMX_ARGON_LANES, RANDOMX_ARGON_MEMORY,
        RANDOMX_ARGON_SALT, RANDOMX_CACHE_ACCESSES,
    },
    superscalar::SSProgram,
};

/// Lines of 64 bytes per 1024-byte Argon2 block.
const LINES_PER_BLOCK: u64 = 1024 / 64;

fn argon2_blocks(key: &[u8]) -> Result<Box<[Block]>, RandomXError> {
    let params = Params::new(
        RANDOMX_ARGON_MEMORY,
        RANDOMX_ARGON_ITERATIONS,
        RANDOMX_ARGON_LANES,
        None,
    )
    .unwrap();

    let numb_blocks: usize = (RANDOMX_ARGON_LANES * RANDOMX_ARGON_MEMORY)
        .try_into()
        .unwrap();

    let mut blocks = Vec::new();
    blocks
        .try_reserve_exact(numb_blocks)
        .map_err(RandomXError::alloc("Argon2d cache memory"))?;
    blocks.resize(numb_blocks, Block::new());

    let argon = Argon2::new(Algorithm::Argon2d, Version::V0x13, params);

    argon
        .fill_memory(key, RANDOMX_ARGON_SALT, &mut blocks[..])
        .unwrap();
    Ok(blocks.into_boxed_slice())
}

/// The 256 MiB keyed cache: Argon2d memory plus the eight SuperscalarHash
/// programs and their reciprocal table. Immutable once built.
pub struct Cache {
    memory_blocks: Box<[Block]>,
    programs: Vec<SSProgram>,
    reciprocals: Vec<u64>,
}

impl Cache {
    pub fn new(key: &[u8]) -> Result<Self, RandomXError> {
        if key.is_empty() {
            return Err(RandomXError::EmptyKey);
        }

        let start = Instant::now();
        let memory_blocks = argon2_blocks(key)?;

        let mut blake_gen = Blake2Generator::new(key, 0);

        let mut reciprocals = Vec::new();
        let mut programs = Vec::with_capacity(RANDOMX_CACHE_ACCESSES);
        for _ in 0..RANDOMX_CACHE_ACCESSES {
            let mut program = SSProgram::generate(&mut blake_gen);
            program.allocate_reciprocals(&mut reciprocals);
            programs.push(program);
        }

        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "initialised cache"
        );

        Ok(Cache {
            memory_blocks,
            programs,
            reciprocals,
        })
    }

    pub(crate) fn programs(&self) -> &[SSProgram] {
        &self.programs
    }

    pub(crate) fn reciprocals(&self) -> &[u64] {
        &self.reciprocals
    }

    /// Reads the 64-byte cache line selected by a register value, treating
    /// the block array as flat memory.
    pub(crate) fn mix_block(&self, register_value: u64) -> [u64; 8] {
        let line = register_value & (CACHE_ITEM_COUNT - 1);
        let block = self.memory_blocks[(line / LINES_PER_BLOCK) as usize].as_ref();
        let word = ((line % LINES_PER_BLOCK) * 8) as usize;

        let mut out = [0; 8];
        out.copy_from_slice(&block[word..word + 8]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_refused() {
        assert!(matches!(Cache::new(&[]), Err(RandomXError::EmptyKey)));
    }

    #[test]
    fn cache_memory_spot_check() {
        let cache = Cache::new(b"test key 000").unwrap();
        assert_eq!(cache.memory_blocks[0].as_ref()[0], 0x191e0e1d23c02186);
        assert_eq!(cache.programs.len(), RANDOMX_CACHE_ACCESSES);
    }
}
