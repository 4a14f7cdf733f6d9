//! The id → node table backing [`AncestryIndex::get`](crate::AncestryIndex::get).

use std::collections::HashMap;

use tracing::warn;

use crate::key::Key;

/// Input records keyed by id.
///
/// Duplicate ids overwrite earlier records (last write wins) but keep the
/// position where the id first appeared.
#[derive(Clone, Debug)]
pub struct NodeTable<K: Key, N> {
    order: Vec<K>,
    nodes: HashMap<K, N>,
}

impl<K: Key, N> NodeTable<K, N> {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            nodes: HashMap::new(),
        }
    }

    /// Insert a node, replacing any node already stored under `id`.
    pub fn insert(&mut self, id: K, node: N) {
        if self.nodes.insert(id.clone(), node).is_some() {
            warn!(id = %id, "duplicate node id, keeping the later record");
        } else {
            self.order.push(id);
        }
    }

    pub fn get(&self, id: &K) -> Option<&N> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &K) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ids in order of first appearance.
    pub fn ids(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    /// `(id, node)` pairs in order of first appearance.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &N)> {
        self.order
            .iter()
            .filter_map(|id| self.nodes.get(id).map(|node| (id, node)))
    }
}

impl<K: Key, N> Default for NodeTable<K, N> {
    fn default() -> Self {
        Self::new()
    }
}
