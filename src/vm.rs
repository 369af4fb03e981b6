mod bytecode;

use std::sync::Arc;

use blake2::digest::consts::U32;
use blake2::{Blake2b, Blake2b512, Digest};

use crate::aes_hash::{fill_aes_1r, fill_aes_4r, hash_aes_1r};
use crate::cache::Cache;
use crate::config::{
    CACHE_LINE_ALIGN_MASK, CACHE_LINE_SIZE, DATASET_EXTRA_ITEMS, RANDOMX_PROGRAM_COUNT,
    RANDOMX_PROGRAM_ITERATIONS, RANDOMX_PROGRAM_SIZE, SCRATCHPAD_L3_MASK64,
};
use crate::dataset::{init_dataset_item, Dataset};
use crate::intrinsics::{self, RoundingMode};
use crate::registers::FloatRegister;
use bytecode::{Program, VmInstruction};

type Blake2b256 = Blake2b<U32>;

/// 16 entropy words followed by 256 encoded instructions.
pub(crate) const PROGRAM_BUFFER_SIZE: usize = 128 + RANDOMX_PROGRAM_SIZE * 8;

const MANTISSA_SIZE: u32 = 52;
const MANTISSA_MASK: u64 = (1 << MANTISSA_SIZE) - 1;
const EXPONENT_MASK: u64 = 0x7FF;
const EXPONENT_BIAS: u64 = 1023;
const DYNAMIC_EXPONENT_BITS: u32 = 4;
const STATIC_EXPONENT_BITS: u32 = 4;
const CONST_EXPONENT_BITS: u64 = 0x300;

/// Mantissa plus dynamic exponent bits kept when masking e-group loads.
const DYNAMIC_MANTISSA_MASK: u64 = (1 << (MANTISSA_SIZE + DYNAMIC_EXPONENT_BITS)) - 1;

/// FSCAL_R flips the sign and the top exponent bits.
const SCALE_MASK: u64 = 0x80F0_0000_0000_0000;

/// The backing memory a VM reads dataset items from.
pub(crate) enum VmMemory {
    /// Items are derived from the cache on every access.
    Light(Arc<Cache>),
    /// Items were precomputed at build time.
    Fast(Arc<Dataset>),
}

impl VmMemory {
    fn dataset_read(&self, item_number: u64) -> [u64; 8] {
        match self {
            VmMemory::Light(cache) => init_dataset_item(cache, item_number),
            VmMemory::Fast(dataset) => dataset.read(item_number),
        }
    }
}

/// Computes the RandomX digest of `input`.
///
/// `scratchpad` must be the zeroed (or about to be fully overwritten)
/// 2 MiB work area; its final contents are an output of the VM and are
/// consumed by the finaliser.
pub(crate) fn hash(memory: &VmMemory, scratchpad: &mut [u8], input: &[u8]) -> [u8; 32] {
    let mut seed: [u8; 64] = Blake2b512::digest(input).into();

    fill_aes_1r(&mut seed, scratchpad);

    let mut vm = Vm {
        memory,
        scratchpad,
        reg_r: [0; 8],
        reg_f: [FloatRegister::default(); 4],
        reg_e: [FloatRegister::default(); 4],
        reg_a: [FloatRegister::default(); 4],
        e_masks: [0; 2],
        read_regs: [0; 4],
        dataset_offset: 0,
        ma: 0,
        mx: 0,
        rounding: RoundingMode::RoundToNearest,
    };

    let mut buffer = [0; PROGRAM_BUFFER_SIZE];
    for chain in 0..RANDOMX_PROGRAM_COUNT {
        fill_aes_4r(&seed, &mut buffer);
        let program = Program::parse(&buffer);
        vm.run(&program);

        if chain != RANDOMX_PROGRAM_COUNT - 1 {
            seed = Blake2b512::digest(vm.register_file()).into();
        }
    }

    vm.reg_a = fingerprint_to_a_group(hash_aes_1r(vm.scratchpad));
    Blake2b256::digest(vm.register_file()).into()
}

fn fingerprint_to_a_group(fingerprint: [u8; 64]) -> [FloatRegister; 4] {
    let mut a_group = [FloatRegister::default(); 4];
    for (reg, chunk) in a_group.iter_mut().zip(fingerprint.chunks_exact(16)) {
        *reg = FloatRegister::from_bits(
            u64::from_le_bytes(chunk[..8].try_into().unwrap()),
            u64::from_le_bytes(chunk[8..].try_into().unwrap()),
        );
    }
    a_group
}

/// A positive double with a uniformly random mantissa and a small exponent.
fn small_positive_float_bits(entropy: u64) -> u64 {
    let exponent = ((entropy >> 59) + EXPONENT_BIAS) & EXPONENT_MASK;
    (exponent << MANTISSA_SIZE) | (entropy & MANTISSA_MASK)
}

fn static_exponent(entropy: u64) -> u64 {
    let exponent =
        CONST_EXPONENT_BITS | ((entropy >> (64 - STATIC_EXPONENT_BITS)) << DYNAMIC_EXPONENT_BITS);
    exponent << MANTISSA_SIZE
}

/// The per-program e-group lane mask: 22 random low bits plus a fixed
/// positive exponent range.
fn float_mask(entropy: u64) -> u64 {
    const MASK_22_BIT: u64 = (1 << 22) - 1;
    (entropy & MASK_22_BIT) | static_exponent(entropy)
}

struct Vm<'a> {
    memory: &'a VmMemory,
    scratchpad: &'a mut [u8],
    reg_r: [u64; 8],
    reg_f: [FloatRegister; 4],
    reg_e: [FloatRegister; 4],
    reg_a: [FloatRegister; 4],
    e_masks: [u64; 2],
    read_regs: [usize; 4],
    dataset_offset: u64,
    ma: u32,
    mx: u32,
    rounding: RoundingMode,
}

impl Vm<'_> {
    /// Configures the VM from the program's entropy words and runs its
    /// 2048 iterations.
    fn run(&mut self, program: &Program) {
        let entropy = &program.entropy;

        for i in 0..4 {
            self.reg_a[i] = FloatRegister::from_bits(
                small_positive_float_bits(entropy[2 * i]),
                small_positive_float_bits(entropy[2 * i + 1]),
            );
        }

        self.ma = (entropy[8] & CACHE_LINE_ALIGN_MASK) as u32;
        self.mx = entropy[10] as u32;

        let mut address_registers = entropy[12];
        for (i, reg) in self.read_regs.iter_mut().enumerate() {
            *reg = 2 * i + (address_registers & 1) as usize;
            address_registers >>= 1;
        }

        self.dataset_offset = (entropy[13] % (DATASET_EXTRA_ITEMS + 1)) * CACHE_LINE_SIZE;

        self.e_masks = [float_mask(entropy[14]), float_mask(entropy[15])];

        self.reg_r = [0; 8];

        let mut sp_addr0 = self.mx;
        let mut sp_addr1 = self.ma;

        for _ in 0..RANDOMX_PROGRAM_ITERATIONS {
            let sp_mix = self.reg_r[self.read_regs[0]] ^ self.reg_r[self.read_regs[1]];
            sp_addr0 ^= sp_mix as u32;
            sp_addr0 &= SCRATCHPAD_L3_MASK64;
            sp_addr1 ^= (sp_mix >> 32) as u32;
            sp_addr1 &= SCRATCHPAD_L3_MASK64;

            for i in 0..8 {
                self.reg_r[i] ^= read_u64(self.scratchpad, sp_addr0 as usize + 8 * i);
            }

            for i in 0..4 {
                self.reg_f[i] =
                    FloatRegister::from_packed_i32(read_8(self.scratchpad, sp_addr1 as usize + 8 * i));
            }

            for i in 0..4 {
                let loaded = FloatRegister::from_packed_i32(read_8(
                    self.scratchpad,
                    sp_addr1 as usize + 8 * (4 + i),
                ));
                self.reg_e[i] = self.mask_e_register(loaded);
            }

            self.execute(program);

            self.mx ^= (self.reg_r[self.read_regs[2]] ^ self.reg_r[self.read_regs[3]]) as u32;
            self.mx &= CACHE_LINE_ALIGN_MASK as u32;

            let item_number = (self.dataset_offset + self.ma as u64) / CACHE_LINE_SIZE;
            let item = self.memory.dataset_read(item_number);
            for (reg, item_word) in self.reg_r.iter_mut().zip(item) {
                *reg ^= item_word;
            }

            std::mem::swap(&mut self.mx, &mut self.ma);

            for i in 0..8 {
                write_u64(self.scratchpad, sp_addr1 as usize + 8 * i, self.reg_r[i]);
            }

            for i in 0..4 {
                self.reg_f[i] = self.reg_f[i].xor(self.reg_e[i]);
                self.scratchpad[sp_addr0 as usize + 16 * i..sp_addr0 as usize + 16 * i + 16]
                    .copy_from_slice(&self.reg_f[i].to_le_bytes());
            }

            sp_addr0 = 0;
            sp_addr1 = 0;
        }
    }

    fn mask_e_register(&self, reg: FloatRegister) -> FloatRegister {
        let [lo, hi] = reg.to_bits();
        FloatRegister::from_bits(
            (lo & DYNAMIC_MANTISSA_MASK) | self.e_masks[0],
            (hi & DYNAMIC_MANTISSA_MASK) | self.e_masks[1],
        )
    }

    /// The 256-byte register file image: r, f, e then a, all little-endian.
    fn register_file(&self) -> [u8; 256] {
        let mut out = [0; 256];
        for (i, reg) in self.reg_r.iter().enumerate() {
            out[8 * i..8 * i + 8].copy_from_slice(&reg.to_le_bytes());
        }
        for (i, reg) in self.reg_f.iter().enumerate() {
            out[64 + 16 * i..80 + 16 * i].copy_from_slice(&reg.to_le_bytes());
        }
        for (i, reg) in self.reg_e.iter().enumerate() {
            out[128 + 16 * i..144 + 16 * i].copy_from_slice(&reg.to_le_bytes());
        }
        for (i, reg) in self.reg_a.iter().enumerate() {
            out[192 + 16 * i..208 + 16 * i].copy_from_slice(&reg.to_le_bytes());
        }
        out
    }

    fn execute(&mut self, program: &Program) {
        let mut pc = 0_i32;
        while (pc as usize) < program.bytecode.len() {
            match &program.bytecode[pc as usize] {
                VmInstruction::IADD_RS {
                    dst,
                    src,
                    shift,
                    imm,
                } => {
                    let operand = (self.reg_r[*src as usize] << shift).wrapping_add(*imm);
                    self.reg_r[*dst as usize] = self.reg_r[*dst as usize].wrapping_add(operand);
                }
                VmInstruction::IADD_M { dst, mem } => {
                    let operand = read_u64(self.scratchpad, mem.address(&self.reg_r));
                    self.reg_r[*dst as usize] = self.reg_r[*dst as usize].wrapping_add(operand);
                }
                VmInstruction::ISUB_R { dst, src } => {
                    let operand = src.value(&self.reg_r);
                    self.reg_r[*dst as usize] = self.reg_r[*dst as usize].wrapping_sub(operand);
                }
                VmInstruction::ISUB_M { dst, mem } => {
                    let operand = read_u64(self.scratchpad, mem.address(&self.reg_r));
                    self.reg_r[*dst as usize] = self.reg_r[*dst as usize].wrapping_sub(operand);
                }
                VmInstruction::IMUL_R { dst, src } => {
                    let operand = src.value(&self.reg_r);
                    self.reg_r[*dst as usize] = self.reg_r[*dst as usize].wrapping_mul(operand);
                }
                VmInstruction::IMUL_M { dst, mem } => {
                    let operand = read_u64(self.scratchpad, mem.address(&self.reg_r));
                    self.reg_r[*dst as usize] = self.reg_r[*dst as usize].wrapping_mul(operand);
                }
                VmInstruction::IMULH_R { dst, src } => {
                    self.reg_r[*dst as usize] =
                        crate::superscalar::high_mul(self.reg_r[*dst as usize], self.reg_r[*src as usize]);
                }
                VmInstruction::IMULH_M { dst, mem } => {
                    let operand = read_u64(self.scratchpad, mem.address(&self.reg_r));
                    self.reg_r[*dst as usize] =
                        crate::superscalar::high_mul(self.reg_r[*dst as usize], operand);
                }
                VmInstruction::ISMULH_R { dst, src } => {
                    self.reg_r[*dst as usize] = crate::superscalar::signed_high_mul(
                        self.reg_r[*dst as usize] as i64,
                        self.reg_r[*src as usize] as i64,
                    ) as u64;
                }
                VmInstruction::ISMULH_M { dst, mem } => {
                    let operand = read_u64(self.scratchpad, mem.address(&self.reg_r));
                    self.reg_r[*dst as usize] = crate::superscalar::signed_high_mul(
                        self.reg_r[*dst as usize] as i64,
                        operand as i64,
                    ) as u64;
                }
                VmInstruction::IMUL_RCP { dst, reciprocal } => {
                    self.reg_r[*dst as usize] =
                        self.reg_r[*dst as usize].wrapping_mul(*reciprocal);
                }
                VmInstruction::INEG_R { dst } => {
                    self.reg_r[*dst as usize] = self.reg_r[*dst as usize].wrapping_neg();
                }
                VmInstruction::IXOR_R { dst, src } => {
                    self.reg_r[*dst as usize] ^= src.value(&self.reg_r);
                }
                VmInstruction::IXOR_M { dst, mem } => {
                    self.reg_r[*dst as usize] ^= read_u64(self.scratchpad, mem.address(&self.reg_r));
                }
                VmInstruction::IROR_R { dst, src } => {
                    let count = src.value(&self.reg_r) as u32;
                    self.reg_r[*dst as usize] = self.reg_r[*dst as usize].rotate_right(count & 63);
                }
                VmInstruction::IROL_R { dst, src } => {
                    let count = src.value(&self.reg_r) as u32;
                    self.reg_r[*dst as usize] = self.reg_r[*dst as usize].rotate_left(count & 63);
                }
                VmInstruction::ISWAP_R { dst, src } => {
                    self.reg_r.swap(*dst as usize, *src as usize);
                }
                VmInstruction::FSWAP_R { dst } => {
                    let dst = *dst as usize;
                    if dst < 4 {
                        self.reg_f[dst] = self.reg_f[dst].swap_lanes();
                    } else {
                        self.reg_e[dst - 4] = self.reg_e[dst - 4].swap_lanes();
                    }
                }
                VmInstruction::FADD_R { dst, src } => {
                    let rounding = self.rounding;
                    self.reg_f[*dst as usize] = self.reg_f[*dst as usize]
                        .map2(self.reg_a[*src as usize], |x, y| {
                            intrinsics::add(x, y, rounding)
                        });
                }
                VmInstruction::FADD_M { dst, mem } => {
                    let operand = FloatRegister::from_packed_i32(read_8(
                        self.scratchpad,
                        mem.address(&self.reg_r),
                    ));
                    let rounding = self.rounding;
                    self.reg_f[*dst as usize] = self.reg_f[*dst as usize]
                        .map2(operand, |x, y| intrinsics::add(x, y, rounding));
                }
                VmInstruction::FSUB_R { dst, src } => {
                    let rounding = self.rounding;
                    self.reg_f[*dst as usize] = self.reg_f[*dst as usize]
                        .map2(self.reg_a[*src as usize], |x, y| {
                            intrinsics::sub(x, y, rounding)
                        });
                }
                VmInstruction::FSUB_M { dst, mem } => {
                    let operand = FloatRegister::from_packed_i32(read_8(
                        self.scratchpad,
                        mem.address(&self.reg_r),
                    ));
                    let rounding = self.rounding;
                    self.reg_f[*dst as usize] = self.reg_f[*dst as usize]
                        .map2(operand, |x, y| intrinsics::sub(x, y, rounding));
                }
                VmInstruction::FSCAL_R { dst } => {
                    self.reg_f[*dst as usize] = self.reg_f[*dst as usize].xor_bits(SCALE_MASK);
                }
                VmInstruction::FMUL_R { dst, src } => {
                    let rounding = self.rounding;
                    self.reg_e[*dst as usize] = self.reg_e[*dst as usize]
                        .map2(self.reg_a[*src as usize], |x, y| {
                            intrinsics::mul(x, y, rounding)
                        });
                }
                VmInstruction::FDIV_M { dst, mem } => {
                    let loaded = FloatRegister::from_packed_i32(read_8(
                        self.scratchpad,
                        mem.address(&self.reg_r),
                    ));
                    let divisor = self.mask_e_register(loaded);
                    let rounding = self.rounding;
                    self.reg_e[*dst as usize] = self.reg_e[*dst as usize]
                        .map2(divisor, |x, y| intrinsics::div(x, y, rounding));
                }
                VmInstruction::FSQRT_R { dst } => {
                    let rounding = self.rounding;
                    self.reg_e[*dst as usize] =
                        self.reg_e[*dst as usize].map(|x| intrinsics::sqrt(x, rounding));
                }
                VmInstruction::CBRANCH {
                    dst,
                    imm,
                    mask,
                    target,
                } => {
                    self.reg_r[*dst as usize] = self.reg_r[*dst as usize].wrapping_add(*imm);
                    if self.reg_r[*dst as usize] & mask == 0 {
                        pc = *target;
                    }
                }
                VmInstruction::CFROUND { src, imm } => {
                    self.rounding = RoundingMode::from_bits(
                        self.reg_r[*src as usize].rotate_right(*imm as u32) & 3,
                    );
                }
                VmInstruction::ISTORE {
                    dst,
                    src,
                    offset,
                    mask,
                } => {
                    let address = (self.reg_r[*dst as usize].wrapping_add(*offset) as u32 & mask)
                        as usize;
                    write_u64(self.scratchpad, address, self.reg_r[*src as usize]);
                }
                VmInstruction::NOP => {}
            }
            pc += 1;
        }
    }
}

fn read_u64(scratchpad: &[u8], address: usize) -> u64 {
    u64::from_le_bytes(scratchpad[address..address + 8].try_into().unwrap())
}

fn read_8(scratchpad: &[u8], address: usize) -> [u8; 8] {
    scratchpad[address..address + 8].try_into().unwrap()
}

fn write_u64(scratchpad: &mut [u8], address: usize, value: u64) {
    scratchpad[address..address + 8].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_positive_floats_are_normal_and_positive() {
        for entropy in [0, 1, u64::MAX, 0x0123_4567_89AB_CDEF] {
            let value = f64::from_bits(small_positive_float_bits(entropy));
            assert!(value.is_finite() && value >= 1.0, "{value}");
        }
    }

    #[test]
    fn e_mask_keeps_loads_finite() {
        let masks = [float_mask(u64::MAX), float_mask(0)];
        for lane_bits in [0_u64, u64::MAX, 1 << 63] {
            let masked = (lane_bits & DYNAMIC_MANTISSA_MASK) | masks[0];
            let value = f64::from_bits(masked);
            assert!(value.is_finite() && value > 0.0);
        }
    }
}
