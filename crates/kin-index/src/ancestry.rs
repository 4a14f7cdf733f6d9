//! The ancestry builder.
//!
//! Turns a flat list of parent-referencing records into an [`Ancestry`]: for
//! every id, its direct parent plus the full ancestor and descendant chains
//! with hop distances.
//!
//! Construction runs in three phases:
//!
//! 1. **Seed**: each record gets an entry whose only ancestor is its parent
//!    at distance 1. Parents that are not records themselves get a
//!    [`Origin::Placeholder`] entry so upward walks have somewhere to stop
//!    and downward walks can start from them.
//! 2. **Closure**: a FIFO worklist of `(owner, ancestor, distance)` items.
//!    Each item records `owner` as a descendant of `ancestor`, then appends
//!    the ancestor's parent to the owner's chain one hop further out. FIFO
//!    order means all distance-1 links are recorded before any distance-2
//!    link, so descendant maps fill up closest first.
//! 3. **Finalize**: every map is stably sorted by distance.
//!
//! # Invariants
//!
//! - If `y` is an ancestor of `x` at distance `d`, then `x` is a descendant
//!   of `y` at distance `d`.
//! - No id is its own ancestor. Input that would violate this is rejected
//!   with [`IndexError::MalformedInput`].

use std::collections::{HashMap, VecDeque};

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::distance::{Distance, DistanceMap};
use crate::error::{IndexError, IndexResult};
use crate::key::Key;
use crate::node_table::NodeTable;

/// Whether an ancestry entry is backed by an input record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// The id was one of the input records.
    Real,
    /// The id was only ever referenced as a parent.
    Placeholder,
}

/// Everything known about one id's place in the forest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AncestryInfo<K: Key> {
    /// The direct parent, if known.
    pub parent: Option<K>,
    /// Real record or synthesized placeholder.
    pub origin: Origin,
    /// Ancestors sorted by ascending distance (1 = parent).
    pub ancestors: DistanceMap<K>,
    /// Descendants sorted by ascending distance (1 = child).
    pub descendants: DistanceMap<K>,
}

impl<K: Key> AncestryInfo<K> {
    fn real(parent: Option<K>) -> Self {
        let mut ancestors = DistanceMap::new();
        if let Some(p) = &parent {
            ancestors.insert(p.clone(), 1);
        }
        Self {
            parent,
            origin: Origin::Real,
            ancestors,
            descendants: DistanceMap::new(),
        }
    }

    fn placeholder() -> Self {
        Self {
            parent: None,
            origin: Origin::Placeholder,
            ancestors: DistanceMap::new(),
            descendants: DistanceMap::new(),
        }
    }

    /// Returns `true` if this id was an input record.
    pub fn is_real_node(&self) -> bool {
        self.origin == Origin::Real
    }
}

/// The id → [`AncestryInfo`] mapping.
///
/// Iterates real records in input order, then placeholders in the order
/// they were first referenced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ancestry<K: Key> {
    order: Vec<K>,
    entries: HashMap<K, AncestryInfo<K>>,
}

impl<K: Key> Ancestry<K> {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }

    fn insert(&mut self, id: K, info: AncestryInfo<K>) {
        if self.entries.insert(id.clone(), info).is_none() {
            self.order.push(id);
        }
    }

    pub fn get(&self, id: &K) -> Option<&AncestryInfo<K>> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &K) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &AncestryInfo<K>)> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).map(|info| (id, info)))
    }

    /// Number of synthesized placeholder entries.
    pub fn placeholder_count(&self) -> usize {
        self.entries.values().filter(|info| !info.is_real_node()).count()
    }
}

#[derive(Serialize)]
struct AncestryRow<'a, K: Key + Serialize> {
    id: &'a K,
    #[serde(flatten)]
    info: &'a AncestryInfo<K>,
}

impl<K: Key + Serialize> Serialize for Ancestry<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter().map(|(id, info)| AncestryRow { id, info }))
    }
}

/// Build the node table and the completed ancestry for `nodes`.
///
/// `id_of` and `parent_of` may fail (e.g. a malformed JSON field); the first
/// failure aborts the build.
pub(crate) fn build<K, N, I, P>(
    nodes: impl IntoIterator<Item = N>,
    id_of: I,
    parent_of: P,
) -> IndexResult<(NodeTable<K, N>, Ancestry<K>)>
where
    K: Key,
    I: Fn(&N) -> IndexResult<K>,
    P: Fn(&N) -> IndexResult<Option<K>>,
{
    let mut table = NodeTable::new();
    for node in nodes {
        let id = id_of(&node)?;
        table.insert(id, node);
    }

    let mut ancestry = seed(&table, &parent_of)?;
    let expansions = close(&mut ancestry)?;

    for info in ancestry.entries.values_mut() {
        info.ancestors.sort_by_distance();
        info.descendants.sort_by_distance();
    }

    debug!(
        nodes = table.len(),
        placeholders = ancestry.placeholder_count(),
        expansions,
        "built ancestry"
    );
    Ok((table, ancestry))
}

fn seed<K, N, P>(table: &NodeTable<K, N>, parent_of: &P) -> IndexResult<Ancestry<K>>
where
    K: Key,
    P: Fn(&N) -> IndexResult<Option<K>>,
{
    let mut ancestry = Ancestry::new();
    for (id, node) in table.iter() {
        let parent = parent_of(node)?;
        if parent.as_ref() == Some(id) {
            return Err(IndexError::MalformedInput {
                node: id.to_string(),
            });
        }
        ancestry.insert(id.clone(), AncestryInfo::real(parent));
    }

    // Every record is seeded before any placeholder is added, so a parent
    // that appears later in the input is never shadowed by a placeholder.
    let referenced: Vec<K> = ancestry
        .iter()
        .filter_map(|(_, info)| info.parent.clone())
        .collect();
    for parent in referenced {
        if !ancestry.contains(&parent) {
            ancestry.insert(parent, AncestryInfo::placeholder());
        }
    }

    Ok(ancestry)
}

/// Expand every ancestor chain to its root. Returns the number of worklist
/// items processed.
///
/// The queue holds owners whose chain has an unexpanded frontier: the last
/// entry appended to their ancestor map. Owners start in entry order and are
/// requeued behind everyone else, so all distance-`d` links land before any
/// distance-`d + 1` link.
fn close<K: Key>(ancestry: &mut Ancestry<K>) -> IndexResult<usize> {
    let mut queue: VecDeque<K> = ancestry
        .iter()
        .filter(|(_, info)| info.parent.is_some())
        .map(|(id, _)| id.clone())
        .collect();
    let mut processed = 0;

    while let Some(owner) = queue.pop_front() {
        processed += 1;

        let frontier = ancestry
            .entries
            .get(&owner)
            .and_then(|info| info.ancestors.last())
            .map(|(k, d)| (k.clone(), d));
        let Some((ancestor, distance)) = frontier else {
            continue;
        };

        // Unknown ancestor: this branch is exhausted.
        let Some(info) = ancestry.entries.get_mut(&ancestor) else {
            continue;
        };
        info.descendants.insert(owner.clone(), distance);
        let Some(grand_parent) = info.parent.clone() else {
            continue;
        };

        let Some(owner_info) = ancestry.entries.get_mut(&owner) else {
            continue;
        };
        if grand_parent == owner || owner_info.ancestors.contains(&grand_parent) {
            return Err(IndexError::MalformedInput {
                node: owner.to_string(),
            });
        }
        owner_info.ancestors.insert(grand_parent, distance + 1);
        queue.push_back(owner);
    }

    Ok(processed)
}
