use std::collections::HashMap;
use std::hash::Hash;

/// Key/value rows that remember insertion order.
///
/// Listing walks rows in the order they were first inserted; replacing a row
/// keeps its first position.
#[derive(Debug, Clone)]
pub struct Table<K, V> {
    rows: HashMap<K, V>,
    order: Vec<K>,
}

impl<K, V> Default for Table<K, V> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<K, V> Table<K, V>
where
    K: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.rows.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.rows.contains_key(key)
    }

    pub fn upsert(&mut self, key: K, value: V) {
        if self.rows.insert(key.clone(), value).is_none() {
            self.order.push(key);
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let removed = self.rows.remove(key)?;
        self.order.retain(|k| k != key);
        Some(removed)
    }

    /// Rows in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.order.iter().filter_map(|k| self.rows.get(k))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_insertion_position_on_replace() {
        let mut t = Table::new();
        t.upsert("a", 1);
        t.upsert("b", 2);
        t.upsert("a", 3);

        assert_eq!(t.values().copied().collect::<Vec<_>>(), vec![3, 2]);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn remove_drops_row_and_position() {
        let mut t = Table::new();
        t.upsert("a", 1);
        t.upsert("b", 2);

        assert_eq!(t.remove(&"a"), Some(1));
        assert_eq!(t.remove(&"a"), None);
        assert!(!t.contains(&"a"));
        assert_eq!(t.values().copied().collect::<Vec<_>>(), vec![2]);
    }
}
