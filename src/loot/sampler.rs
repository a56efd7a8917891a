use crate::loot::rng::LootRng;

/// Weighted population drawn through a cumulative table. Locked keys
/// stay in the table after being drawn.
#[derive(Debug, Clone)]
pub struct WeightedPool<K> {
    entries: Vec<(K, f64)>,
    cumulative: Vec<f64>,
}

impl<K> Default for WeightedPool<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            cumulative: Vec::new(),
        }
    }
}

impl<K: Clone + PartialEq> WeightedPool<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (K, f64)>) -> Self {
        let mut pool = Self::new();
        for (key, weight) in pairs {
            pool.push(key, weight);
        }
        pool
    }

    pub fn push(&mut self, key: K, weight: f64) {
        let weight = if weight.is_nan() { 0.0 } else { weight.max(0.0) };
        let total = self.total_weight();
        self.entries.push((key, weight));
        self.cumulative.push(total + weight);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn weight_of(&self, key: &K) -> Option<f64> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, weight)| *weight)
    }

    pub fn draw(&self, rng: &mut LootRng, count: usize, replacement: bool, locked: &[K]) -> Vec<K> {
        let mut drawn = Vec::with_capacity(count.min(self.entries.len().max(1)));
        if replacement {
            for _ in 0..count {
                let Some(index) = self.sample_index(rng) else {
                    break;
                };
                drawn.push(self.entries[index].0.clone());
            }
            return drawn;
        }

        let mut working = self.clone();
        for _ in 0..count {
            match working.take(rng, locked) {
                Some(key) => drawn.push(key),
                None => break,
            }
        }
        drawn
    }

    pub fn take(&mut self, rng: &mut LootRng, locked: &[K]) -> Option<K> {
        let index = self.sample_index(rng)?;
        let key = self.entries[index].0.clone();
        if !locked.contains(&key) {
            self.remove(index);
        }
        Some(key)
    }

    fn sample_index(&self, rng: &mut LootRng) -> Option<usize> {
        let total = self.total_weight();
        if total.is_nan() || total <= 0.0 {
            return None;
        }
        let target = rng.unit() * total;
        let index = self.cumulative.partition_point(|sum| *sum <= target);
        if index < self.entries.len() {
            return Some(index);
        }
        // rounding pushed the target onto the total
        self.entries.iter().rposition(|(_, weight)| *weight > 0.0)
    }

    fn remove(&mut self, index: usize) {
        self.entries.swap_remove(index);
        self.cumulative.clear();
        let mut total = 0.0;
        for (_, weight) in &self.entries {
            total += weight;
            self.cumulative.push(total);
        }
    }
}
