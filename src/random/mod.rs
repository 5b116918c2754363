//! Reproducible randomness. A `RandomSource` owns a base seed and a set of independent random
//! number generators ("streams"), each identified by a zero-sized type declared with
//! `define_rng!`. A stream is created lazily on first use, seeded with the base seed plus a
//! hash of the stream's name, so that draws made from one stream never shift the sequence seen
//! by another. Two sources built with the same base seed produce identical draws.
//!
//! ```rust
//! use epinet::define_rng;
//! use epinet::random::RandomSource;
//!
//! define_rng!(CoinRng);
//!
//! let mut source = RandomSource::new(42);
//! let heads = source.sample_bool(CoinRng, 0.5);
//! # let _ = heads;
//! ```
mod macros;
mod sampling_algorithms;

use std::any::{Any, TypeId};

use log::trace;
pub use sampling_algorithms::{sample_multiple_from_known_length, sample_single_from_known_length};

use crate::hashing::{hash_str, HashMap};
use crate::rand::distr::uniform::{SampleRange, SampleUniform};
use crate::rand::{Rng, SeedableRng};

pub trait RngId: Copy + Clone + 'static {
    type RngType: SeedableRng + Rng + 'static;
    fn get_name() -> &'static str;
}

/// A seeded collection of independent random number generators.
pub struct RandomSource {
    base_seed: u64,
    rngs: HashMap<TypeId, Box<dyn Any>>,
}

impl RandomSource {
    #[must_use]
    pub fn new(base_seed: u64) -> Self {
        RandomSource {
            base_seed,
            rngs: HashMap::default(),
        }
    }

    #[must_use]
    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// Sets a new base seed. Existing streams are dropped so that they are re-seeded on their
    /// next use.
    pub fn reseed(&mut self, base_seed: u64) {
        trace!("reseeding random source with {base_seed}");
        self.base_seed = base_seed;
        self.rngs.clear();
    }

    fn get_rng<R: RngId>(&mut self) -> &mut R::RngType {
        let base_seed = self.base_seed;
        self.rngs
            .entry(TypeId::of::<R>())
            .or_insert_with(|| {
                trace!("creating new RNG {} (seed={base_seed})", R::get_name());
                let seed_offset = hash_str(R::get_name());
                Box::new(R::RngType::seed_from_u64(base_seed.wrapping_add(seed_offset)))
            })
            .downcast_mut::<R::RngType>()
            // The map is keyed by the `TypeId` of `R`, so the stored type is `R::RngType`.
            .expect("random stream has mismatched type")
    }

    /// Applies `sampler` to the stream identified by `R`.
    pub fn sample<R: RngId, T>(
        &mut self,
        _rng_id: R,
        sampler: impl FnOnce(&mut R::RngType) -> T,
    ) -> T {
        sampler(self.get_rng::<R>())
    }

    /// Gets a random sample within `range`.
    pub fn sample_range<R: RngId, S, T>(&mut self, rng_id: R, range: S) -> T
    where
        S: SampleRange<T>,
        T: SampleUniform,
    {
        self.sample(rng_id, |rng| rng.random_range(range))
    }

    /// Draws uniformly from `[0, 1)`.
    pub fn sample_uniform<R: RngId>(&mut self, rng_id: R) -> f64 {
        self.sample(rng_id, |rng| rng.random::<f64>())
    }

    /// Returns true when a uniform `[0, 1)` draw is strictly less than `p`. Values of `p` at or
    /// above 1 always succeed; values at or below 0 never do. Exactly one draw is consumed
    /// either way.
    pub fn sample_bool<R: RngId>(&mut self, rng_id: R, p: f64) -> bool {
        self.sample_uniform(rng_id) < p
    }

    /// Chooses `requested` items uniformly without replacement, preserving their relative
    /// order. Returns every item when fewer than `requested` are available.
    pub fn sample_without_replacement<R: RngId, T: Clone>(
        &mut self,
        rng_id: R,
        items: &[T],
        requested: usize,
    ) -> Vec<T> {
        let requested = requested.min(items.len());
        self.sample(rng_id, |rng| {
            sample_multiple_from_known_length(rng, items.iter().cloned(), requested)
        })
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        RandomSource::new(0)
    }
}
