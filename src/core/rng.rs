use std::f64::consts::PI;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of randomness for the simulator. Implementors only supply uniform
/// draws; the normal variate is derived from two of them.
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`.
    fn next_uniform(&mut self) -> f64;

    /// Standard-normal variate via the Box-Muller transform.
    fn standard_normal(&mut self) -> f64 {
        let u1 = self.next_uniform().max(1e-12);
        let u2 = self.next_uniform();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}

pub struct SeededSource {
    rng: ChaCha8Rng,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededSource {
    fn next_uniform(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }
}

/// Independent per-stream seed, so trials can run in any order.
pub fn derive_seed(base_seed: u64, stream: u64, index: u32) -> u64 {
    let mixed = base_seed ^ (stream << 32) ^ index as u64;
    splitmix64(mixed)
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
