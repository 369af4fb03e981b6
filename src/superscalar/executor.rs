use crate::registers::RGroupRegisters;
use crate::sign_extend_2s_compl;
use crate::superscalar::instructions::ScalarInstruction;

const P2EXP63: u64 = 1 << 63;

/// Runs a SuperscalarHash program against the eight integer registers.
///
/// `IMUL_RCP` immediates must already have been rewritten into indexes
/// into `reciprocals` (see `SSProgram::allocate_reciprocals`).
pub fn execute(
    program: &[ScalarInstruction],
    registers: &mut RGroupRegisters,
    reciprocals: &[u64],
) {
    for instruction in program {
        match instruction {
            ScalarInstruction::ISUB_R { dst, src } => {
                let op = |dst_val: u64, src_val| dst_val.wrapping_sub(src_val);
                registers.apply_to_dst_with_src(dst, src, op);
            }
            ScalarInstruction::IXOR_R { dst, src } => {
                let op = |dst_val: u64, src_val| dst_val ^ src_val;
                registers.apply_to_dst_with_src(dst, src, op);
            }
            ScalarInstruction::IADD_RS {
                dst,
                src,
                mod_shift,
            } => {
                let op = |dst_val: u64, src_val| {
                    dst_val.wrapping_add(src_val << clamp_mod_shift(*mod_shift))
                };
                registers.apply_to_dst_with_src(dst, src, op);
            }
            ScalarInstruction::IMUL_R { dst, src } => {
                let op = |dst_val: u64, src_val| dst_val.wrapping_mul(src_val);
                registers.apply_to_dst_with_src(dst, src, op);
            }
            ScalarInstruction::IROR_C { dst, imm32 } => {
                let op = |dst_val: u64| dst_val.rotate_right(*imm32);
                registers.apply_to_dst(dst, op);
            }
            ScalarInstruction::IADD_C { dst, imm32 } => {
                let op = |dst_val: u64| dst_val.wrapping_add(sign_extend_2s_compl(*imm32));
                registers.apply_to_dst(dst, op);
            }
            ScalarInstruction::IXOR_C { dst, imm32 } => {
                let op = |dst_val: u64| dst_val ^ sign_extend_2s_compl(*imm32);
                registers.apply_to_dst(dst, op);
            }
            ScalarInstruction::IMULH_R { dst, src } => {
                registers.apply_to_dst_with_src(dst, src, high_mul);
            }
            ScalarInstruction::ISMULH_R { dst, src } => {
                let op = |dst_val: u64, src_val: u64| {
                    signed_high_mul(dst_val as i64, src_val as i64) as u64
                };
                registers.apply_to_dst_with_src(dst, src, op);
            }
            ScalarInstruction::IMUL_RCP { dst, imm32 } => {
                let op = |dst_val: u64| dst_val.wrapping_mul(reciprocals[*imm32 as usize]);
                registers.apply_to_dst(dst, op);
            }
        }
    }
}

pub fn randomx_reciprocal(divisor: u64) -> u64 {
    assert!(!divisor.is_power_of_two());
    assert_ne!(divisor, 0);

    let mut quotient = P2EXP63 / divisor;
    let mut remainder = P2EXP63 % divisor;
    let mut bsr = 0;

    let mut bit = divisor;

    while bit > 0 {
        bsr += 1;
        bit >>= 1;
    }

    for _ in 0..bsr {
        if remainder >= divisor.wrapping_sub(remainder) {
            quotient = quotient.wrapping_mul(2).wrapping_add(1);
            remainder = remainder.wrapping_mul(2).wrapping_sub(divisor);
        } else {
            quotient = quotient.wrapping_mul(2);
            remainder = remainder.wrapping_mul(2);
        }
    }
    quotient
}

pub fn high_mul(a: u64, b: u64) -> u64 {
    ((a as u128 * b as u128) >> 64) as u64
}

pub fn signed_high_mul(a: i64, b: i64) -> i64 {
    ((a as i128 * b as i128) >> 64) as i64
}

fn clamp_mod_shift(x: u8) -> u64 {
    (x as u64 >> 2) % 4
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::RGroupRegisterID;

    #[test]
    fn reciprocal_matches_reference_values() {
        // Values from the reference randomx_reciprocal.
        assert_eq!(randomx_reciprocal(3), 12297829382473034410);
        assert_eq!(randomx_reciprocal(13), 11351842506898185609);
        assert_eq!(randomx_reciprocal(33), 17887751829051686415);
        assert_eq!(randomx_reciprocal(65537), 18446462603027742720);
        assert_eq!(randomx_reciprocal(16777217), 18446742974197989375);
    }

    #[test]
    fn high_multiplies() {
        let mut regs = RGroupRegisters::default();
        regs.set(&RGroupRegisterID::R0, u64::MAX);
        regs.set(&RGroupRegisterID::R1, u64::MAX);
        execute(
            &[ScalarInstruction::IMULH_R {
                dst: RGroupRegisterID::R0,
                src: RGroupRegisterID::R1,
            }],
            &mut regs,
            &[],
        );
        assert_eq!(regs.get(&RGroupRegisterID::R0), u64::MAX - 1);

        let mut regs = RGroupRegisters::default();
        regs.set(&RGroupRegisterID::R2, (-2_i64) as u64);
        regs.set(&RGroupRegisterID::R3, 3);
        execute(
            &[ScalarInstruction::ISMULH_R {
                dst: RGroupRegisterID::R2,
                src: RGroupRegisterID::R3,
            }],
            &mut regs,
            &[],
        );
        assert_eq!(regs.get(&RGroupRegisterID::R2), u64::MAX);
    }
}
