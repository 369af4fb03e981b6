use blake2::digest::FixedOutputReset;
use blake2::{Blake2b512, Digest};

/// Seed bytes beyond this are ignored; the nonce lives in the last 4 bytes.
const MAX_SEED_LEN: usize = 60;

/// A deterministic byte stream derived from Blake2b, used to drive
/// SuperscalarHash program generation.
///
/// When the 64-byte buffer is exhausted it is refilled by re-hashing it.
pub struct Blake2Generator {
    data: [u8; 64],
    index: usize,
    hasher: Blake2b512,
}

impl Blake2Generator {
    pub fn new(seed: &[u8], nonce: u32) -> Self {
        let seed = &seed[..seed.len().min(MAX_SEED_LEN)];

        let mut data = [0; 64];
        data[..seed.len()].copy_from_slice(seed);

        data[MAX_SEED_LEN..].copy_from_slice(&nonce.to_le_bytes());

        Blake2Generator {
            data,
            index: 64,
            hasher: Blake2b512::default(),
        }
    }

    pub fn next_u8(&mut self) -> u8 {
        self.check_extend(1);
        self.index += 1;
        self.data[self.index - 1]
    }

    pub fn next_u32(&mut self) -> u32 {
        self.check_extend(4);
        self.index += 4;
        u32::from_le_bytes(self.data[self.index - 4..self.index].try_into().unwrap())
    }

    fn check_extend(&mut self, bytes_needed: usize) {
        if self.index + bytes_needed > self.data.len() {
            self.hasher.update(self.data);
            self.data = self.hasher.finalize_fixed_reset().into();
            self.index = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_stream() {
        let mut a = Blake2Generator::new(b"test key 000", 0);
        let mut b = Blake2Generator::new(b"test key 000", 0);
        for _ in 0..1000 {
            assert_eq!(a.next_u8(), b.next_u8());
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn nonce_changes_stream() {
        let mut a = Blake2Generator::new(b"key", 0);
        let mut b = Blake2Generator::new(b"key", 1);
        assert!((0..64).any(|_| a.next_u8() != b.next_u8()));
    }

    #[test]
    fn long_seeds_are_truncated() {
        let mut a = Blake2Generator::new(&[7; 80], 0);
        let mut b = Blake2Generator::new(&[7; 60], 0);
        for _ in 0..64 {
            assert_eq!(a.next_u8(), b.next_u8());
        }
    }
}
