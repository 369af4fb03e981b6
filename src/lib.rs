//! A pure Rust implementation of the RandomX proof-of-work hash function.
//!
//! RandomX hashes are produced by a virtual machine whose programs are
//! derived from the input, executed against a 2 MiB scratchpad and a
//! dataset derived from a 256 MiB Argon2d cache. The cache (and in fast
//! mode the ~2 GiB dataset) is keyed; hashes are a pure function of
//! `(key, input)`.
//!
//! ```no_run
//! use randomx::{RandomXVm, RandomXMode};
//!
//! let vm = RandomXVm::new(b"test key 000", RandomXMode::Light).unwrap();
//! let hash = vm.hash(b"This is a test").unwrap();
//! ```

mod aes_hash;
mod blake2_generator;
mod cache;
mod config;
mod dataset;
mod error;
mod hasher;
mod intrinsics;
mod registers;
mod superscalar;
mod vm;

pub use cache::Cache;
pub use dataset::Dataset;
pub use error::RandomXError;
pub use hasher::{RandomXMode, RandomXVm};

fn is_0_or_power_of_2(x: u64) -> bool {
    (x & (x.wrapping_sub(1))) == 0
}

/// Sign-extends the 32-bit immediate of an instruction to 64 bits.
pub(crate) fn sign_extend_2s_compl(imm: u32) -> u64 {
    imm as i32 as i64 as u64
}
