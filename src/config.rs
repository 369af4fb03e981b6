/// Target latency for SuperscalarHash (in cycles of the reference CPU).
pub(crate) const RANDOMX_SUPERSCALAR_LATENCY: usize = 170;

pub(crate) const SUPERSCALAR_MAX_SIZE: usize = 3 * RANDOMX_SUPERSCALAR_LATENCY + 2;

/// Dataset base size in bytes. Must be a power of 2.
pub(crate) const RANDOMX_DATASET_BASE_SIZE: u64 = 2147483648;

pub(crate) const RANDOMX_DATASET_EXTRA_SIZE: u64 = 33554368;

pub(crate) const RANDOMX_DATASET_SIZE: u64 =
    RANDOMX_DATASET_BASE_SIZE + RANDOMX_DATASET_EXTRA_SIZE;

pub(crate) const RANDOMX_ARGON_LANES: u32 = 1;

pub(crate) const RANDOMX_ARGON_ITERATIONS: u32 = 3;

pub(crate) const RANDOMX_ARGON_MEMORY: u32 = 262144;

pub(crate) const RANDOMX_ARGON_SALT: &[u8] = b"RandomX\x03";

pub(crate) const RANDOMX_CACHE_ACCESSES: usize = 8;

pub(crate) const CACHE_LINE_SIZE: u64 = 64;

/// Aligns a register value to a dataset cache line within the base size.
pub(crate) const CACHE_LINE_ALIGN_MASK: u64 =
    (RANDOMX_DATASET_BASE_SIZE - 1) & !(CACHE_LINE_SIZE - 1);

pub(crate) const DATASET_ITEM_COUNT: u64 = RANDOMX_DATASET_SIZE / CACHE_LINE_SIZE;

pub(crate) const DATASET_EXTRA_ITEMS: u64 = RANDOMX_DATASET_EXTRA_SIZE / CACHE_LINE_SIZE;

/// 64-byte cache lines in the 256 MiB cache.
pub(crate) const CACHE_ITEM_COUNT: u64 = (RANDOMX_ARGON_MEMORY as u64 * 1024) / CACHE_LINE_SIZE;

pub(crate) const RANDOMX_PROGRAM_SIZE: usize = 256;

pub(crate) const RANDOMX_PROGRAM_ITERATIONS: usize = 2048;

pub(crate) const RANDOMX_PROGRAM_COUNT: usize = 8;

pub(crate) const RANDOMX_SCRATCHPAD_L3: usize = 2097152;

pub(crate) const RANDOMX_SCRATCHPAD_L2: usize = 262144;

pub(crate) const RANDOMX_SCRATCHPAD_L1: usize = 16384;

/// 8-byte aligned address masks for the three scratchpad levels.
pub(crate) const SCRATCHPAD_L1_MASK: u32 = (RANDOMX_SCRATCHPAD_L1 as u32 / 8 - 1) * 8;
pub(crate) const SCRATCHPAD_L2_MASK: u32 = (RANDOMX_SCRATCHPAD_L2 as u32 / 8 - 1) * 8;
pub(crate) const SCRATCHPAD_L3_MASK: u32 = (RANDOMX_SCRATCHPAD_L3 as u32 / 8 - 1) * 8;

/// 64-byte aligned L3 mask used for the per-iteration block addresses.
pub(crate) const SCRATCHPAD_L3_MASK64: u32 = (RANDOMX_SCRATCHPAD_L3 as u32 / 64 - 1) * 64;

/// CBRANCH condition bits sit above an 8-bit displacement.
pub(crate) const CONDITION_OFFSET: u32 = 8;

pub(crate) const CONDITION_MASK: u64 = (1 << CONDITION_OFFSET) - 1;

/// mod.cond values at or above this make ISTORE address the whole scratchpad.
pub(crate) const STORE_L3_CONDITION: u8 = 14;

/// Register r5 receives the IADD_RS displacement immediate.
pub(crate) const REGISTER_NEEDS_DISPLACEMENT: usize = 5;

// Dataset item initialisation constants.
pub(crate) const SUPERSCALAR_MUL_0: u64 = 6364136223846793005;
pub(crate) const SUPERSCALAR_ADD_1: u64 = 9298411001130361340;
pub(crate) const SUPERSCALAR_ADD_2: u64 = 12065312585734608966;
pub(crate) const SUPERSCALAR_ADD_3: u64 = 9306329213124626780;
pub(crate) const SUPERSCALAR_ADD_4: u64 = 5281919268842080866;
pub(crate) const SUPERSCALAR_ADD_5: u64 = 10536153434571861004;
pub(crate) const SUPERSCALAR_ADD_6: u64 = 3398623926847679864;
pub(crate) const SUPERSCALAR_ADD_7: u64 = 9549104520008361294;
