//! Append-ordered id → distance maps.
//!
//! [`DistanceMap`] keeps entries in the order they were first inserted, so the
//! most recently appended entry is always reachable via [`DistanceMap::last`].
//! The builder reads that entry as the frontier of an ancestor chain. After
//! construction the builder sorts every map by distance, which lets the
//! query engine treat "first matching entry" as "closest".

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::key::Key;

/// Number of parent hops between two ids.
pub type Distance = u32;

/// An association list of ids to distances with O(1) lookup.
#[derive(Clone, Debug)]
pub struct DistanceMap<K: Key> {
    entries: Vec<(K, Distance)>,
    positions: HashMap<K, usize>,
}

impl<K: Key> DistanceMap<K> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or update `key`.
    ///
    /// A new key is appended. An existing key keeps its position and only
    /// its distance changes.
    pub fn insert(&mut self, key: K, distance: Distance) {
        match self.positions.get(&key) {
            Some(&pos) => self.entries[pos].1 = distance,
            None => {
                self.positions.insert(key.clone(), self.entries.len());
                self.entries.push((key, distance));
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<Distance> {
        self.positions.get(key).map(|&pos| self.entries[pos].1)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    /// The most recently appended entry.
    pub fn last(&self) -> Option<(&K, Distance)> {
        self.entries.last().map(|(k, d)| (k, *d))
    }

    /// Entries in their current order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, Distance)> {
        self.entries.iter().map(|(k, d)| (k, *d))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Stable sort with a comparator over `(key, distance)` pairs.
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut((&K, Distance), (&K, Distance)) -> Ordering,
    {
        self.entries
            .sort_by(|(ka, da), (kb, db)| compare((ka, *da), (kb, *db)));
        self.reindex();
    }

    /// Stable ascending sort by distance. Ties keep insertion order.
    pub fn sort_by_distance(&mut self) {
        self.sort_by(|(_, a), (_, b)| a.cmp(&b));
    }

    fn reindex(&mut self) {
        for (pos, (key, _)) in self.entries.iter().enumerate() {
            if let Some(slot) = self.positions.get_mut(key) {
                *slot = pos;
            }
        }
    }
}

impl<K: Key> Default for DistanceMap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key> PartialEq for DistanceMap<K> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Key> Eq for DistanceMap<K> {}

impl<K: Key> FromIterator<(K, Distance)> for DistanceMap<K> {
    fn from_iter<I: IntoIterator<Item = (K, Distance)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, distance) in iter {
            map.insert(key, distance);
        }
        map
    }
}

impl<K: Key + Serialize> Serialize for DistanceMap<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter())
    }
}

impl<'de, K: Key + Deserialize<'de>> Deserialize<'de> for DistanceMap<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<(K, Distance)>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}
