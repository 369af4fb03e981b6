mod cpu;
mod executor;
mod generator;
mod instructions;

use crate::blake2_generator::Blake2Generator;

use crate::registers::{RGroupRegisterID, RGroupRegisters};
use generator::generate;
use instructions::ScalarInstruction;

pub(crate) use executor::{high_mul, randomx_reciprocal, signed_high_mul};

/// A generated SuperscalarHash program and the register whose value
/// chains into the next cache access.
pub(crate) struct SSProgram {
    program: Vec<ScalarInstruction>,
    reg_with_max_latency: RGroupRegisterID,
}

impl SSProgram {
    pub fn generate(gen: &mut Blake2Generator) -> Self {
        generate(gen)
    }

    /// Rewrites every `IMUL_RCP` immediate from a divisor into an index
    /// into `reciprocals`, appending the reciprocal of the divisor.
    pub fn allocate_reciprocals(&mut self, reciprocals: &mut Vec<u64>) {
        for instruction in &mut self.program {
            if let ScalarInstruction::IMUL_RCP { imm32, .. } = instruction {
                let reciprocal = randomx_reciprocal((*imm32).into());
                *imm32 = reciprocals.len() as u32;
                reciprocals.push(reciprocal);
            }
        }
    }

    pub fn execute(&self, registers: &mut RGroupRegisters, reciprocals: &[u64]) {
        executor::execute(&self.program, registers, reciprocals);
    }

    pub fn address_register(&self) -> RGroupRegisterID {
        self.reg_with_max_latency
    }

    #[cfg(test)]
    pub fn instructions(&self) -> &[ScalarInstruction] {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RANDOMX_CACHE_ACCESSES, SUPERSCALAR_MAX_SIZE};

    #[test]
    fn program_generation_is_deterministic_and_bounded() {
        let mut gen_a = Blake2Generator::new(b"test key 000", 0);
        let mut gen_b = Blake2Generator::new(b"test key 000", 0);

        for _ in 0..RANDOMX_CACHE_ACCESSES {
            let a = SSProgram::generate(&mut gen_a);
            let b = SSProgram::generate(&mut gen_b);

            assert!(a.instructions().len() >= 3);
            assert!(a.instructions().len() <= SUPERSCALAR_MAX_SIZE);
            assert_eq!(a.instructions(), b.instructions());
            assert_eq!(a.address_register(), b.address_register());
        }
    }

    #[test]
    fn execution_is_deterministic() {
        let mut gen = Blake2Generator::new(b"superscalar exec", 0);
        let mut program = SSProgram::generate(&mut gen);

        let mut reciprocals = Vec::new();
        program.allocate_reciprocals(&mut reciprocals);

        let mut regs_a: RGroupRegisters = [7; 8].into();
        let mut regs_b = regs_a.clone();
        program.execute(&mut regs_a, &reciprocals);
        program.execute(&mut regs_b, &reciprocals);
        assert_eq!(regs_a.inner(), regs_b.inner());
        assert_ne!(regs_a.inner(), &[7; 8]);
    }
}
