//! The query engine.
//!
//! [`AncestryIndex`] owns the node table and the completed ancestry. It is
//! built once and only read afterwards; every query validates its id
//! arguments eagerly and fails with [`IndexError::NotFound`] for ids the
//! ancestry has never seen.
//!
//! Queries that return "the closest" match rely on the ancestor and
//! descendant maps being sorted by distance with ties in insertion order, so
//! among equidistant matches the one recorded first wins.

use std::collections::HashSet;
use std::ops::ControlFlow;

use serde::{Serialize, Serializer};
use tracing::trace;

use crate::ancestry::{self, Ancestry, AncestryInfo};
use crate::distance::Distance;
use crate::error::{IndexError, IndexResult};
use crate::key::Key;
use crate::node_table::NodeTable;

/// A record that knows its own id and its parent's id.
pub trait Parented {
    type Key: Key;

    fn key(&self) -> Self::Key;

    /// `None` for roots.
    fn parent_key(&self) -> Option<Self::Key>;
}

/// How far a common ancestor is from each of the two queried ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CommonAncestor {
    /// Distance from the first id.
    pub distance1: Distance,
    /// Distance from the second id.
    pub distance2: Distance,
    /// `distance1 + distance2`.
    pub total_distance: Distance,
}

/// A candidate handed to sibling predicates.
///
/// `descendant` is a descendant of `ancestor`, which in turn is an ancestor
/// of the queried id.
#[derive(Debug)]
pub struct SiblingCandidate<'a, K> {
    pub descendant: &'a K,
    /// Hops from `ancestor` down to `descendant`.
    pub descendant_distance: Distance,
    pub ancestor: &'a K,
    /// Hops from the queried id up to `ancestor`.
    pub ancestor_distance: Distance,
}

/// Read-only view of the index internals, for diagnostics.
pub struct Summary<'a, K: Key, N> {
    pub nodes: &'a NodeTable<K, N>,
    pub ancestry: &'a Ancestry<K>,
}

#[derive(Serialize)]
struct NodeRow<'a, K, N> {
    id: &'a K,
    node: &'a N,
}

impl<K: Key + Serialize, N: Serialize> Serialize for Summary<'_, K, N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let nodes: Vec<NodeRow<'_, K, N>> = self
            .nodes
            .iter()
            .map(|(id, node)| NodeRow { id, node })
            .collect();
        let mut state = serializer.serialize_struct("Summary", 2)?;
        state.serialize_field("nodes", &nodes)?;
        state.serialize_field("ancestry", self.ancestry)?;
        state.end()
    }
}

/// An immutable ancestry index over a forest of parent-referencing records.
#[derive(Clone, Debug)]
pub struct AncestryIndex<K: Key, N> {
    nodes: NodeTable<K, N>,
    ancestry: Ancestry<K>,
}

impl<K: Key, N> AncestryIndex<K, N> {
    /// Build an index, reading each record's id and parent id with the given
    /// accessors.
    ///
    /// Fails with [`IndexError::MalformedInput`] if the parent references
    /// contain a cycle.
    pub fn build<I, P>(
        nodes: impl IntoIterator<Item = N>,
        id_of: I,
        parent_of: P,
    ) -> IndexResult<Self>
    where
        I: Fn(&N) -> K,
        P: Fn(&N) -> Option<K>,
    {
        Self::try_build(nodes, |n| Ok(id_of(n)), |n| Ok(parent_of(n)))
    }

    /// Like [`build`](Self::build), with accessors that may fail.
    pub fn try_build<I, P>(
        nodes: impl IntoIterator<Item = N>,
        id_of: I,
        parent_of: P,
    ) -> IndexResult<Self>
    where
        I: Fn(&N) -> IndexResult<K>,
        P: Fn(&N) -> IndexResult<Option<K>>,
    {
        let (nodes, ancestry) = ancestry::build(nodes, id_of, parent_of)?;
        Ok(Self { nodes, ancestry })
    }

    /// Build from records that carry their own keys.
    pub fn from_records(nodes: impl IntoIterator<Item = N>) -> IndexResult<Self>
    where
        N: Parented<Key = K>,
    {
        Self::build(nodes, N::key, N::parent_key)
    }

    // ---------------------------------------------------------------
    // Node table
    // ---------------------------------------------------------------

    /// Returns `true` if `id` was one of the input records.
    ///
    /// Placeholder ancestors are not records, so this can be `false` for ids
    /// that queries accept.
    pub fn has(&self, id: &K) -> bool {
        self.nodes.contains(id)
    }

    /// The input record stored under `id`.
    pub fn get(&self, id: &K) -> Option<&N> {
        self.nodes.get(id)
    }

    /// Number of input records.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The ancestry entry for `id`, including placeholders.
    pub fn ancestry_of(&self, id: &K) -> Option<&AncestryInfo<K>> {
        self.ancestry.get(id)
    }

    pub fn summary(&self) -> Summary<'_, K, N> {
        Summary {
            nodes: &self.nodes,
            ancestry: &self.ancestry,
        }
    }

    fn ensure(&self, id: &K) -> IndexResult<&AncestryInfo<K>> {
        trace!(id = %id, "ancestry lookup");
        self.ancestry
            .get(id)
            .ok_or_else(|| IndexError::NotFound(id.to_string()))
    }

    // ---------------------------------------------------------------
    // Common ancestors
    // ---------------------------------------------------------------

    /// All ancestors shared by `id1` and `id2`, in `id1`'s closest-first
    /// ancestor order.
    pub fn common_ancestors(&self, id1: &K, id2: &K) -> IndexResult<Vec<(K, CommonAncestor)>> {
        let a = self.ensure(id1)?;
        let b = self.ensure(id2)?;
        Ok(common(a, b)
            .map(|(id, common)| (id.clone(), common))
            .collect())
    }

    /// The common ancestor with the smallest total distance.
    ///
    /// With a predicate, only accepted ids are eligible. Exact ties go to the
    /// ancestor closest to `id1`. Returns `None` if nothing qualifies.
    pub fn closest_common_ancestor(
        &self,
        id1: &K,
        id2: &K,
        predicate: Option<&dyn Fn(&K) -> bool>,
    ) -> IndexResult<Option<K>> {
        let a = self.ensure(id1)?;
        let b = self.ensure(id2)?;

        let mut closest: Option<(&K, Distance)> = None;
        for (id, common) in common(a, b) {
            let better = closest.map_or(true, |(_, best)| common.total_distance < best);
            if better && predicate.map_or(true, |accept| accept(id)) {
                closest = Some((id, common.total_distance));
            }
        }
        Ok(closest.map(|(id, _)| id.clone()))
    }

    /// The common ancestor with the largest total distance.
    ///
    /// Mirrors [`closest_common_ancestor`](Self::closest_common_ancestor).
    pub fn furthest_common_ancestor(
        &self,
        id1: &K,
        id2: &K,
        predicate: Option<&dyn Fn(&K) -> bool>,
    ) -> IndexResult<Option<K>> {
        let a = self.ensure(id1)?;
        let b = self.ensure(id2)?;

        let mut furthest: Option<&K> = None;
        let mut threshold: Distance = 0;
        for (id, common) in common(a, b) {
            if common.total_distance > threshold && predicate.map_or(true, |accept| accept(id)) {
                furthest = Some(id);
                threshold = common.total_distance;
            }
        }
        Ok(furthest.cloned())
    }

    // ---------------------------------------------------------------
    // Ancestor / Descendant queries
    // ---------------------------------------------------------------

    /// The nearest ancestor of `id` accepted by `predicate`.
    pub fn closest_ancestor<F>(&self, id: &K, predicate: F) -> IndexResult<Option<K>>
    where
        F: Fn(&K) -> bool,
    {
        let info = self.ensure(id)?;
        Ok(info.ancestors.keys().find(|k| predicate(k)).cloned())
    }

    /// Every ancestor of `id` accepted by `predicate`, closest first.
    pub fn all_ancestors<F>(&self, id: &K, predicate: F) -> IndexResult<Vec<K>>
    where
        F: Fn(&K) -> bool,
    {
        let info = self.ensure(id)?;
        Ok(info.ancestors.keys().filter(|k| predicate(k)).cloned().collect())
    }

    /// The nearest descendant of `id` accepted by `predicate`.
    ///
    /// Among equidistant matches the one recorded first wins, which follows
    /// input order.
    pub fn closest_descendant<F>(&self, id: &K, predicate: F) -> IndexResult<Option<K>>
    where
        F: Fn(&K) -> bool,
    {
        let info = self.ensure(id)?;
        Ok(info.descendants.keys().find(|k| predicate(k)).cloned())
    }

    /// Every descendant of `id` accepted by `predicate`, closest first.
    pub fn all_descendants<F>(&self, id: &K, predicate: F) -> IndexResult<Vec<K>>
    where
        F: Fn(&K) -> bool,
    {
        let info = self.ensure(id)?;
        Ok(info.descendants.keys().filter(|k| predicate(k)).cloned().collect())
    }

    // ---------------------------------------------------------------
    // Sibling queries
    // ---------------------------------------------------------------

    /// The closest "sibling" of `id` accepted by `predicate`.
    ///
    /// A sibling here is any descendant of any ancestor of `id`, other than
    /// `id` itself. Ancestors are walked closest first and, for each, its
    /// descendants closest first; the first accepted candidate wins. So a
    /// sibling hanging off a nearer common ancestor beats one that is closer
    /// to a further ancestor.
    ///
    /// ```text
    ///            -- Open -- Read1 -- Read2 -- Read3 -- Close
    ///          /                \          \
    /// Parent                     \           -- Write2
    ///          \                   -- Write1
    ///            -- WriteOpen
    /// ```
    ///
    /// Looking for a write next to `Close`, `Write2` wins over `Write1`
    /// because `Read2` is nearer to `Close` than `Read1`.
    pub fn closest_sibling<F>(&self, id: &K, mut predicate: F) -> IndexResult<Option<K>>
    where
        F: FnMut(&SiblingCandidate<'_, K>) -> bool,
    {
        let mut found = None;
        self.walk_siblings(id, |candidate| {
            if predicate(&candidate) {
                found = Some(candidate.descendant.clone());
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;
        Ok(found)
    }

    /// Every sibling of `id` accepted by `predicate`, in discovery order.
    pub fn all_siblings<F>(&self, id: &K, mut predicate: F) -> IndexResult<Vec<K>>
    where
        F: FnMut(&SiblingCandidate<'_, K>) -> bool,
    {
        let mut seen = HashSet::new();
        let mut siblings = Vec::new();
        self.walk_siblings(id, |candidate| {
            if predicate(&candidate) && seen.insert(candidate.descendant) {
                siblings.push(candidate.descendant.clone());
            }
            ControlFlow::Continue(())
        })?;
        Ok(siblings)
    }

    /// Visit every sibling candidate of `id` in closest-first nested order.
    fn walk_siblings<'a, V>(&'a self, id: &K, mut visit: V) -> IndexResult<()>
    where
        V: FnMut(SiblingCandidate<'a, K>) -> ControlFlow<()>,
    {
        let info = self.ensure(id)?;
        for (ancestor, ancestor_distance) in info.ancestors.iter() {
            let Some(up) = self.ancestry.get(ancestor) else {
                continue;
            };
            for (descendant, descendant_distance) in up.descendants.iter() {
                if descendant == id {
                    continue;
                }
                let candidate = SiblingCandidate {
                    descendant,
                    descendant_distance,
                    ancestor,
                    ancestor_distance,
                };
                if visit(candidate).is_break() {
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}

fn common<'a, K: Key>(
    a: &'a AncestryInfo<K>,
    b: &'a AncestryInfo<K>,
) -> impl Iterator<Item = (&'a K, CommonAncestor)> + 'a {
    a.ancestors.iter().filter_map(move |(id, distance1)| {
        b.ancestors.get(id).map(|distance2| {
            (
                id,
                CommonAncestor {
                    distance1,
                    distance2,
                    total_distance: distance1 + distance2,
                },
            )
        })
    })
}
