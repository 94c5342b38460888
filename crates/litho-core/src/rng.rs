//! Deterministic PRNG driving every stochastic decision in the engine.
//!
//! A 32-bit "Cong" linear congruential generator: `state ← state·69069 +
//! 12345 (mod 2³²)`. Consumption order is part of the engine contract: the
//! same seed, dimensions and parameters must visit the generator in the
//! same order so a build reproduces its own output exactly.

use rand::{RngCore, SeedableRng};

const MUL: u32 = 69069;
const INC: u32 = 12345;

/// Seedable 32-bit LCG. Cheap to copy; every plate owns one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    /// Seed the generator; all 2³² states are valid.
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Advance the state and return it.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(MUL).wrapping_add(INC);
        self.state
    }

    #[inline]
    pub fn next_signed(&mut self) -> i32 {
        self.next_u32() as i32
    }

    /// Uniform value in [0, 1].
    #[inline]
    pub fn next_double(&mut self) -> f64 {
        f64::from(self.next_u32()) / f64::from(Self::max_value())
    }

    /// Uniform value in [-0.5, 0.5].
    #[inline]
    pub fn next_float_signed(&mut self) -> f32 {
        (self.next_double() - 0.5) as f32
    }

    /// Uniform coin flip as a sign, +1.0 or -1.0.
    #[inline]
    pub fn next_sign(&mut self) -> f32 {
        if self.next_u32() % 2 == 1 {
            1.0
        } else {
            -1.0
        }
    }

    /// Largest value `next_u32` can return.
    pub fn max_value() -> u32 {
        u32::MAX
    }
}

// The engine consumes the contract methods above; the rand traits exist so
// tools and tests can drive the same stream through ecosystem APIs.
impl RngCore for Lcg {
    fn next_u32(&mut self) -> u32 {
        Lcg::next_u32(self)
    }

    fn next_u64(&mut self) -> u64 {
        let lo = u64::from(Lcg::next_u32(self));
        let hi = u64::from(Lcg::next_u32(self));
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut chunks = dest.chunks_exact_mut(4);
        for chunk in &mut chunks {
            chunk.copy_from_slice(&Lcg::next_u32(self).to_le_bytes());
        }
        let rem = chunks.into_remainder();
        if !rem.is_empty() {
            let bytes = Lcg::next_u32(self).to_le_bytes();
            rem.copy_from_slice(&bytes[..rem.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Lcg {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn known_sequence_from_seed_one() {
        let mut rng = Lcg::new(1);
        let seq: Vec<u32> = (0..6).map(|_| rng.next_u32()).collect();
        assert_eq!(
            seq,
            [81414, 1328228615, 3215746516, 2752347901, 2369698258, 75278179]
        );
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = Lcg::new(12345);
        let mut b = Lcg::new(12345);
        for _ in 0..1000 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn doubles_stay_in_unit_interval() {
        let mut rng = Lcg::new(3);
        for _ in 0..10_000 {
            let v = rng.next_double();
            assert!((0.0..=1.0).contains(&v), "out of range: {v}");
        }
    }

    #[test]
    fn signed_floats_stay_in_half_interval() {
        let mut rng = Lcg::new(99);
        for _ in 0..10_000 {
            let v = rng.next_float_signed();
            assert!((-0.5..=0.5).contains(&v), "out of range: {v}");
        }
    }

    #[test]
    fn rand_core_interop_matches_contract_stream() {
        let mut a = Lcg::new(7);
        let mut b = Lcg::new(7);
        // gen::<u32>() goes through RngCore::next_u32, so both advance alike.
        let via_trait: u32 = b.gen();
        assert_eq!(a.next_u32(), via_trait);
    }
}
