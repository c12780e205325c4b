use std::collections::HashMap;
use std::hash::Hash;

/// Occurrence counter that remembers first-seen order.
///
/// `most_common` breaks count ties by the order keys were first counted.
#[derive(Debug, Clone)]
pub struct FrequencyCounter<K> {
    entries: Vec<(K, usize)>,
    positions: HashMap<K, usize>,
}

impl<K: Eq + Hash + Clone> FrequencyCounter<K> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub fn increment(&mut self, key: &K) {
        match self.positions.get(key) {
            Some(&pos) => self.entries[pos].1 += 1,
            None => {
                self.positions.insert(key.clone(), self.entries.len());
                self.entries.push((key.clone(), 1));
            }
        }
    }

    /// Decrement a count, dropping the key once it reaches zero.
    /// Returns false if the key was not counted.
    pub fn decrement(&mut self, key: &K) -> bool {
        let Some(&pos) = self.positions.get(key) else {
            return false;
        };
        self.entries[pos].1 -= 1;
        if self.entries[pos].1 == 0 {
            self.entries.remove(pos);
            self.positions.remove(key);
            for (k, _) in &self.entries[pos..] {
                if let Some(p) = self.positions.get_mut(k) {
                    *p -= 1;
                }
            }
        }
        true
    }

    pub fn get(&self, key: &K) -> usize {
        self.positions
            .get(key)
            .map(|&pos| self.entries[pos].1)
            .unwrap_or(0)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Up to `limit` keys with the highest counts, highest first.
    pub fn most_common(&self, limit: usize) -> Vec<(K, usize)> {
        let mut ranked: Vec<&(K, usize)> = self.entries.iter().collect();
        // stable: equal counts keep first-seen order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
            .into_iter()
            .take(limit)
            .map(|(k, count)| (k.clone(), *count))
            .collect()
    }
}

impl<K: Eq + Hash + Clone> Default for FrequencyCounter<K> {
    fn default() -> Self {
        Self::new()
    }
}
