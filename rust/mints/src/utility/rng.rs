use rand::{rngs::StdRng, Rng, SeedableRng};

/// Deterministically seeded RNG.
///
/// Each worker thread owns its own generator seeded from the solver seed plus
/// the worker index, so parallel regions stay reproducible for a fixed thread
/// count.
#[derive(Debug, Clone)]
pub struct SolverRng {
    rng: StdRng,
}

impl SolverRng {
    pub fn seed_from(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generator for worker `index` derived from the solver seed.
    pub fn for_worker(seed: u64, index: usize) -> Self {
        Self::seed_from(seed.wrapping_add(0x9e37_79b9_7f4a_7c15u64.wrapping_mul(index as u64 + 1)))
    }

    /// Uniform integer in `[low, high]` (inclusive).
    pub fn integer(&mut self, low: i64, high: i64) -> i64 {
        debug_assert!(low <= high);
        self.rng.random_range(low..=high)
    }

    /// Uniform index in `[0, n)`.
    pub fn index(&mut self, n: usize) -> usize {
        debug_assert!(n > 0);
        self.rng.random_range(0..n)
    }

    /// Uniform float in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.rng.random_range(0.0..1.0)
    }

    /// Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.rng.random_range(0..=i);
            slice.swap(i, j);
        }
    }
}
