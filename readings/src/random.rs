use rand::rngs::{StdRng, ThreadRng};
use rand::{thread_rng, Rng, SeedableRng};

pub trait RandomSource {
    /// Draws uniformly from `low..=high`. Callers guarantee `low <= high`.
    fn uniform_int(&mut self, low: u32, high: u32) -> u32;
}

/// Adapts any [`rand::Rng`] into a [`RandomSource`].
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    #[must_use]
    pub fn new(rng: R) -> Self {
        RngSource { rng }
    }
}

impl RngSource<ThreadRng> {
    /// Unseeded, thread-local generator
    #[must_use]
    pub fn thread() -> Self {
        RngSource::new(thread_rng())
    }
}

impl RngSource<StdRng> {
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        RngSource::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn uniform_int(&mut self, low: u32, high: u32) -> u32 {
        self.rng.gen_range(low..=high)
    }
}

impl<S: RandomSource + ?Sized> RandomSource for Box<S> {
    fn uniform_int(&mut self, low: u32, high: u32) -> u32 {
        (**self).uniform_int(low, high)
    }
}
