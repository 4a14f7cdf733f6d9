//! Property tests for ancestry construction and queries over random forests.

use std::collections::HashMap;

use kin_index::AncestryIndex;
use proptest::prelude::*;
use proptest::sample::Index;

type Edge = (u32, u32);

/// Node `i + 1` gets a parent drawn from `0..=i`, so the forest is acyclic.
/// Id 0 never appears as a record and becomes a placeholder root. Input order
/// is shuffled so construction cannot lean on parents coming first.
fn forest() -> impl Strategy<Value = Vec<Edge>> {
    prop::collection::vec(any::<Index>(), 1..40)
        .prop_map(|picks| {
            picks
                .iter()
                .enumerate()
                .map(|(i, pick)| (i as u32 + 1, pick.index(i + 1) as u32))
                .collect::<Vec<_>>()
        })
        .prop_shuffle()
}

fn build(edges: &[Edge]) -> AncestryIndex<u32, Edge> {
    AncestryIndex::build(edges.iter().copied(), |e| e.0, |e| Some(e.1)).unwrap()
}

/// Walk parent pointers from `id`, returning `(ancestor, distance)` pairs.
fn parent_walk(parents: &HashMap<u32, u32>, id: u32) -> Vec<(u32, u32)> {
    let mut chain = Vec::new();
    let mut current = id;
    let mut distance = 0;
    while let Some(&parent) = parents.get(&current) {
        distance += 1;
        chain.push((parent, distance));
        current = parent;
    }
    chain
}

/// Reference construction: repeat full passes over every entry until a pass
/// changes nothing, extending each owner's chain by one parent per pass.
/// Returns each id's descendants in the order they were recorded.
fn full_pass_descendants(edges: &[Edge]) -> HashMap<u32, Vec<u32>> {
    let parents: HashMap<u32, u32> = edges.iter().copied().collect();
    let mut order: Vec<u32> = edges.iter().map(|e| e.0).collect();
    for &(_, parent) in edges {
        if !parents.contains_key(&parent) && !order.contains(&parent) {
            order.push(parent);
        }
    }

    let mut ancestors: HashMap<u32, Vec<(u32, u32)>> =
        edges.iter().map(|&(id, parent)| (id, vec![(parent, 1)])).collect();
    let mut descendants: HashMap<u32, Vec<u32>> =
        order.iter().map(|&id| (id, Vec::new())).collect();

    let mut changed = true;
    while changed {
        changed = false;
        for owner in &order {
            let Some(&(ancestor, distance)) = ancestors.get(owner).and_then(|a| a.last()) else {
                continue;
            };
            let Some(below) = descendants.get_mut(&ancestor) else {
                continue;
            };
            if !below.contains(owner) {
                below.push(*owner);
            }
            if let Some(&grand_parent) = parents.get(&ancestor) {
                ancestors.get_mut(owner).unwrap().push((grand_parent, distance + 1));
                changed = true;
            }
        }
    }
    descendants
}

proptest! {
    #[test]
    fn descendant_order_matches_full_pass_construction(edges in forest()) {
        let index = build(&edges);
        let expected = full_pass_descendants(&edges);
        let summary = index.summary();

        prop_assert_eq!(summary.ancestry.len(), expected.len());
        for (id, info) in summary.ancestry.iter() {
            let found: Vec<u32> = info.descendants.keys().copied().collect();
            prop_assert_eq!(&found, &expected[id]);
        }
    }

    #[test]
    fn ancestors_match_parent_walk(edges in forest()) {
        let index = build(&edges);
        let parents: HashMap<u32, u32> = edges.iter().copied().collect();

        for &(id, _) in &edges {
            let info = index.ancestry_of(&id).unwrap();
            let chain: Vec<(u32, u32)> = info.ancestors.iter().map(|(k, d)| (*k, d)).collect();
            prop_assert_eq!(chain, parent_walk(&parents, id));
        }
    }

    #[test]
    fn ancestor_and_descendant_links_are_symmetric(edges in forest()) {
        let index = build(&edges);
        let summary = index.summary();

        for (id, info) in summary.ancestry.iter() {
            for (ancestor, distance) in info.ancestors.iter() {
                let up = summary.ancestry.get(ancestor).unwrap();
                prop_assert_eq!(up.descendants.get(id), Some(distance));
            }
            for (descendant, distance) in info.descendants.iter() {
                let down = summary.ancestry.get(descendant).unwrap();
                prop_assert_eq!(down.ancestors.get(id), Some(distance));
            }
        }
    }

    #[test]
    fn maps_are_sorted_by_distance(edges in forest()) {
        let index = build(&edges);
        for (_, info) in index.summary().ancestry.iter() {
            let distances: Vec<u32> = info.descendants.iter().map(|(_, d)| d).collect();
            prop_assert!(distances.windows(2).all(|w| w[0] <= w[1]));
            let distances: Vec<u32> = info.ancestors.iter().map(|(_, d)| d).collect();
            prop_assert!(distances.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn only_records_are_real(edges in forest()) {
        let index = build(&edges);
        for (id, info) in index.summary().ancestry.iter() {
            prop_assert_eq!(info.is_real_node(), index.has(id));
        }
        prop_assert!(!index.has(&0));
        prop_assert!(index.ancestry_of(&0).is_some());
    }

    #[test]
    fn common_ancestor_contains_x_iff_x_is_ancestor_of_y(
        edges in forest(),
        a in any::<Index>(),
        b in any::<Index>(),
    ) {
        let index = build(&edges);
        let x = edges[a.index(edges.len())].0;
        let y = edges[b.index(edges.len())].0;
        prop_assume!(x != y);

        let common: Vec<u32> = index
            .common_ancestors(&x, &y)
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        let x_above_y = index.ancestry_of(&y).unwrap().ancestors.contains(&x);
        prop_assert!(!common.contains(&x));
        prop_assert!(!common.contains(&y));

        // Every ancestor of x is common when x sits above y.
        if x_above_y {
            let above_x: Vec<u32> =
                index.ancestry_of(&x).unwrap().ancestors.keys().copied().collect();
            prop_assert_eq!(common, above_x);
        }
    }

    #[test]
    fn closest_and_furthest_bound_every_common_ancestor(
        edges in forest(),
        a in any::<Index>(),
        b in any::<Index>(),
    ) {
        let index = build(&edges);
        let x = edges[a.index(edges.len())].0;
        let y = edges[b.index(edges.len())].0;

        let common = index.common_ancestors(&x, &y).unwrap();
        let closest = index.closest_common_ancestor(&x, &y, None).unwrap();
        let furthest = index.furthest_common_ancestor(&x, &y, None).unwrap();

        // Everything hangs off placeholder 0, so there is always a common ancestor.
        prop_assert!(!common.is_empty());
        let total = |id: u32| common.iter().find(|(k, _)| *k == id).map(|(_, c)| c.total_distance);
        let min = common.iter().map(|(_, c)| c.total_distance).min();
        let max = common.iter().map(|(_, c)| c.total_distance).max();
        prop_assert_eq!(closest.and_then(total), min);
        prop_assert_eq!(furthest.and_then(total), max);
        prop_assert_eq!(furthest, Some(0));
    }

    #[test]
    fn predicate_results_satisfy_predicate(edges in forest(), pick in any::<Index>()) {
        let index = build(&edges);
        let id = edges[pick.index(edges.len())].0;
        let even = |k: &u32| k % 2 == 0;

        for k in index.all_ancestors(&id, even).unwrap() {
            prop_assert!(even(&k));
        }
        for k in index.all_descendants(&id, even).unwrap() {
            prop_assert!(even(&k));
        }
        if let Some(k) = index.closest_ancestor(&id, even).unwrap() {
            prop_assert!(even(&k));
        }
        let siblings = index.all_siblings(&id, |c| even(c.descendant)).unwrap();
        prop_assert!(siblings.iter().all(even));
        prop_assert!(!siblings.contains(&id));

        prop_assert!(index.all_ancestors(&id, |_| false).unwrap().is_empty());
        prop_assert_eq!(index.closest_descendant(&id, |_| false).unwrap(), None);
    }
}
