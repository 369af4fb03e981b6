use std::time::Instant;

use rayon::prelude::*;

use crate::cache::Cache;
use crate::config::{
    DATASET_ITEM_COUNT, SUPERSCALAR_ADD_1, SUPERSCALAR_ADD_2, SUPERSCALAR_ADD_3, SUPERSCALAR_ADD_4,
    SUPERSCALAR_ADD_5, SUPERSCALAR_ADD_6, SUPERSCALAR_ADD_7, SUPERSCALAR_MUL_0,
};
use crate::error::RandomXError;
use crate::registers::{RGroupRegisterID, RGroupRegisters};

/// Derives one 64-byte dataset item from the cache.
///
/// Items depend only on the cache key and the item number, never on the
/// hashed input.
pub(crate) fn init_dataset_item(cache: &Cache, item_number: u64) -> [u64; 8] {
    let mut registers = RGroupRegisters::default();

    let r0 = item_number.wrapping_add(1).wrapping_mul(SUPERSCALAR_MUL_0);
    registers.set(&RGroupRegisterID::R0, r0);
    registers.set(&RGroupRegisterID::R1, r0 ^ SUPERSCALAR_ADD_1);
    registers.set(&RGroupRegisterID::R2, r0 ^ SUPERSCALAR_ADD_2);
    registers.set(&RGroupRegisterID::R3, r0 ^ SUPERSCALAR_ADD_3);
    registers.set(&RGroupRegisterID::R4, r0 ^ SUPERSCALAR_ADD_4);
    registers.set(&RGroupRegisterID::R5, r0 ^ SUPERSCALAR_ADD_5);
    registers.set(&RGroupRegisterID::R6, r0 ^ SUPERSCALAR_ADD_6);
    registers.set(&RGroupRegisterID::R7, r0 ^ SUPERSCALAR_ADD_7);

    let mut register_value = item_number;

    for program in cache.programs() {
        program.execute(&mut registers, cache.reciprocals());

        let mix_block = cache.mix_block(register_value);
        for (reg, mix) in registers.inner_mut().iter_mut().zip(mix_block) {
            *reg ^= mix;
        }

        register_value = registers.get(&program.address_register());
    }

    registers.into()
}

/// The fully expanded ~2 GiB dataset used in fast mode. Immutable once
/// built; shared read-only between hashing threads.
pub struct Dataset {
    items: Box<[u64]>,
}

impl Dataset {
    /// Precomputes every dataset item, fanning out over all cores.
    pub fn new(cache: &Cache) -> Result<Self, RandomXError> {
        let words = DATASET_ITEM_COUNT as usize * 8;

        let mut items = Vec::new();
        items
            .try_reserve_exact(words)
            .map_err(RandomXError::alloc("dataset memory"))?;
        items.resize(words, 0);

        let start = Instant::now();
        items
            .par_chunks_exact_mut(8)
            .enumerate()
            .for_each(|(item_number, out)| {
                out.copy_from_slice(&init_dataset_item(cache, item_number as u64));
            });
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            items = DATASET_ITEM_COUNT,
            "initialised dataset"
        );

        Ok(Dataset {
            items: items.into_boxed_slice(),
        })
    }

    pub(crate) fn read(&self, item_number: u64) -> [u64; 8] {
        let idx = item_number as usize * 8;
        self.items[idx..idx + 8].try_into().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_are_pure_and_distinct() {
        let cache = Cache::new(b"test key 000").unwrap();
        for item_number in [0, 1, 12345, DATASET_ITEM_COUNT - 1] {
            assert_eq!(
                init_dataset_item(&cache, item_number),
                init_dataset_item(&cache, item_number)
            );
        }
        assert_ne!(init_dataset_item(&cache, 0), init_dataset_item(&cache, 1));
    }
}
