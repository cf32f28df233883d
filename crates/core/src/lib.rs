#![warn(missing_docs)]
//! Core primitives shared across the workspace.

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Fixed tick type for the streaming pipeline (one `World::update` per tick).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimTick(pub u64);

impl SimTick {
    /// First tick in any deterministic timeline.
    pub const ZERO: Self = Self(0);

    /// Advance by `delta` ticks.
    pub fn advance(self, delta: u64) -> Self {
        Self(self.0 + delta)
    }
}

const HASH_X: i32 = 374_761_393;
const HASH_Z: i32 = 668_265_263;
const HASH_MIX: i32 = 1_274_126_177;

/// Linear position hash used to seed per-origin generators.
///
/// Pure function of absolute world coordinates, so every chunk that asks about the
/// same origin gets the same answer.
pub fn origin_seed(world_x: i32, world_z: i32, seed: i32) -> u64 {
    let h = world_x
        .wrapping_mul(HASH_X)
        .wrapping_add(world_z.wrapping_mul(HASH_Z))
        .wrapping_add(seed);
    // Widen so negative hashes stay distinct from their positive twins.
    h as u32 as u64
}

/// Avalanche position hash over a column, masked to 31 bits.
pub fn position_hash(world_x: i32, world_z: i32, seed: i32) -> u32 {
    mix(world_x, world_z, HASH_X, HASH_Z, seed)
}

/// Second, independent position hash (multipliers swapped, salted seed).
pub fn position_hash_alt(world_x: i32, world_z: i32, seed: i32) -> u32 {
    mix(world_x, world_z, HASH_Z, HASH_X, seed.wrapping_add(12_345))
}

/// [`position_hash`] mapped to `[0, 1]`.
pub fn unit_hash(world_x: i32, world_z: i32, seed: i32) -> f32 {
    position_hash(world_x, world_z, seed) as f32 / 0x7FFF_FFFF as f32
}

/// [`position_hash_alt`] mapped to `[0, 1]`.
pub fn unit_hash_alt(world_x: i32, world_z: i32, seed: i32) -> f32 {
    position_hash_alt(world_x, world_z, seed) as f32 / 0x7FFF_FFFF as f32
}

fn mix(x: i32, z: i32, mul_x: i32, mul_z: i32, seed: i32) -> u32 {
    let mut h = x
        .wrapping_mul(mul_x)
        .wrapping_add(z.wrapping_mul(mul_z))
        .wrapping_add(seed)
        ^ x.wrapping_mul(z);
    h = (h ^ (h >> 13)).wrapping_mul(HASH_MIX);
    h ^= h >> 16;
    (h & 0x7FFF_FFFF) as u32
}

/// Helper to derive a reproducible RNG seeded by world + domain hash.
pub fn scoped_rng(world_seed: u64, domain_hash: u64, tick: SimTick) -> StdRng {
    let seed = world_seed ^ domain_hash.rotate_left(17) ^ tick.0;
    StdRng::seed_from_u64(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::Rng;

    #[test]
    fn sim_tick_advances() {
        assert_eq!(SimTick::ZERO.advance(3), SimTick(3));
    }

    #[test]
    fn scoped_rng_is_reproducible() {
        let a: u32 = scoped_rng(7, 99, SimTick::ZERO).gen();
        let b: u32 = scoped_rng(7, 99, SimTick::ZERO).gen();
        assert_eq!(a, b);
    }

    #[test]
    fn hashes_differ_between_variants() {
        let hits = (0..64)
            .filter(|&x| position_hash(x, 3, 1) == position_hash_alt(x, 3, 1))
            .count();
        assert!(hits < 4);
    }

    #[test]
    fn origin_seed_handles_negative_coordinates() {
        assert_ne!(origin_seed(-16, 0, 0), origin_seed(16, 0, 0));
    }

    proptest! {
        #[test]
        fn unit_hash_stays_in_range(
            x in -100_000i32..100_000,
            z in -100_000i32..100_000,
            seed in any::<i32>(),
        ) {
            let a = unit_hash(x, z, seed);
            let b = unit_hash_alt(x, z, seed);
            prop_assert!((0.0..=1.0).contains(&a));
            prop_assert!((0.0..=1.0).contains(&b));
        }
    }
}
