use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

const DEFAULT_SEED: u64 = 0x9e3779b97f4a7c15;

#[derive(Debug, Clone)]
pub struct LootRng {
    inner: ChaCha8Rng,
}

impl LootRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self::from_seed(rand::random())
    }

    pub fn unit(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    pub fn roll_percent(&mut self, chance: u32) -> bool {
        if chance >= 100 {
            return true;
        }
        if chance == 0 {
            return false;
        }
        self.inner.gen_range(0..100) < chance
    }

    pub fn roll_chance(&mut self, probability: f64) -> bool {
        if probability >= 1.0 {
            return true;
        }
        if probability <= 0.0 || probability.is_nan() {
            return false;
        }
        self.unit() < probability
    }

    pub fn roll_range(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        self.inner.gen_range(min..=max)
    }

    pub fn normal(&mut self, mean: f64, std: f64) -> f64 {
        if std.is_nan() || std <= 0.0 {
            return mean;
        }
        match Normal::new(mean, std) {
            Ok(distribution) => distribution.sample(&mut self.inner),
            Err(_) => mean,
        }
    }

    pub fn pick<'a, T>(&mut self, values: &'a [T]) -> Option<&'a T> {
        if values.is_empty() {
            return None;
        }
        let index = self.inner.gen_range(0..values.len());
        values.get(index)
    }
}

impl Default for LootRng {
    fn default() -> Self {
        Self::from_seed(DEFAULT_SEED)
    }
}
