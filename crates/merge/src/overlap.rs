// Stract is an open source web search engine.
// Copyright (C) 2023 Stract ApS
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::collections::{HashMap, HashSet};

use config::MergeConfig;
use itertools::Itertools;
use knowledge_store::Node;
use rand::seq::SliceRandom;

/// A bucket triple reduced to what the overlap finder needs: its id and,
/// per NN slot (in pattern order), the candidate nodes disambiguation found
/// for that slot.
pub type SlottedTriple = (u64, Vec<Vec<Node>>);

/// Finds every group of triple-ids that simultaneously share at least one
/// candidate node at *every* NN slot of a pattern bucket. Brute force by
/// design (§4.2): combination sizes are capped at `config.max_comb`, and
/// above `config.max_sets` distinct node-sets the exhaustive scan is
/// replaced with `config.passes` random samples of `config.max_sets` each,
/// unioned together.
pub fn find_overlaps(triples: &[SlottedTriple], config: &MergeConfig) -> Vec<Vec<u64>> {
    let num_slots = match triples.first() {
        Some((_, slots)) => slots.len(),
        None => return Vec::new(),
    };
    if num_slots == 0 {
        return Vec::new();
    }

    let mut per_slot: Vec<HashSet<Vec<u64>>> = (0..num_slots)
        .map(|slot| slot_overlap_tuples(triples, slot, config))
        .collect();

    let mut result = per_slot.remove(0);
    for slot_set in per_slot {
        result = result.intersection(&slot_set).cloned().collect();
    }

    let mut result: Vec<Vec<u64>> = result.into_iter().collect();
    result.sort();
    result
}

fn slot_overlap_tuples(triples: &[SlottedTriple], slot: usize, config: &MergeConfig) -> HashSet<Vec<u64>> {
    let triple_nodes: Vec<(u64, HashSet<Node>)> = triples
        .iter()
        .map(|(id, slots)| (*id, slots[slot].iter().cloned().collect::<HashSet<_>>()))
        .filter(|(_, nodes)| !nodes.is_empty())
        .collect();

    let mut node_to_triples: HashMap<Node, HashSet<u64>> = HashMap::new();
    for (id, nodes) in &triple_nodes {
        for node in nodes {
            node_to_triples.entry(node.clone()).or_default().insert(*id);
        }
    }

    // The size gate is keyed on the bucket's full triple count at this slot,
    // including triples with no candidate nodes here — the reference builds
    // its per-slot index for every triple unconditionally, so a bucket full
    // of empty-node-set triples still pushes the gate toward the randomized
    // branch rather than silently taking the exhaustive one. Combinations
    // themselves are only ever drawn from `triple_nodes` (the nonempty
    // subset), since an empty node set can never contribute to an overlap.
    let n = triples.len();
    let m = triple_nodes.len();
    let max_comb = config.max_comb.min(m);

    let mut overlaps: HashSet<Vec<Node>> = HashSet::new();
    let mut record_overlap = |indices: &[usize]| {
        let intersection = indices
            .iter()
            .map(|&i| &triple_nodes[i].1)
            .fold(None::<HashSet<Node>>, |acc, set| {
                Some(match acc {
                    None => set.clone(),
                    Some(acc) => acc.intersection(set).cloned().collect(),
                })
            })
            .unwrap_or_default();

        if !intersection.is_empty() {
            let mut sorted: Vec<Node> = intersection.into_iter().collect();
            sorted.sort();
            overlaps.insert(sorted);
        }
    };

    if n > config.max_sets {
        let mut rng = rand::thread_rng();
        let mut pool: Vec<usize> = (0..m).collect();
        for _ in 0..config.passes {
            pool.shuffle(&mut rng);
            let sample = &pool[..config.max_sets.min(m)];
            for size in (2..=max_comb).rev() {
                for combo in sample.iter().copied().combinations(size) {
                    record_overlap(&combo);
                }
            }
        }
    } else {
        for size in (2..=max_comb).rev() {
            for combo in (0..m).combinations(size) {
                record_overlap(&combo);
            }
        }
    }

    overlaps
        .into_iter()
        .filter_map(|overlap_nodes| {
            let ids = overlap_nodes
                .iter()
                .map(|node| node_to_triples.get(node).cloned().unwrap_or_default())
                .fold(None::<HashSet<u64>>, |acc, ids| {
                    Some(match acc {
                        None => ids,
                        Some(acc) => acc.intersection(&ids).cloned().collect(),
                    })
                })
                .unwrap_or_default();

            if ids.len() >= 2 {
                let mut sorted: Vec<u64> = ids.into_iter().collect();
                sorted.sort();
                Some(sorted)
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(s: &str) -> Node {
        Node::new(s)
    }

    #[test]
    fn single_slot_pairwise_overlap() {
        // S6: T1={A,B}, T2={A,C} at the single NN slot -> overlap {A} -> group (1,2)
        let triples: Vec<SlottedTriple> =
            vec![(1, vec![vec![n("A"), n("B")]]), (2, vec![vec![n("A"), n("C")]])];

        let result = find_overlaps(&triples, &MergeConfig::default());
        assert_eq!(result, vec![vec![1, 2]]);
    }

    #[test]
    fn no_shared_nodes_yields_no_overlaps() {
        let triples: Vec<SlottedTriple> = vec![(1, vec![vec![n("A")]]), (2, vec![vec![n("B")]])];
        assert!(find_overlaps(&triples, &MergeConfig::default()).is_empty());
    }

    #[test]
    fn requires_overlap_at_every_slot() {
        // two NN slots; triples 1&2 share a node at slot 0 but not slot 1.
        let triples: Vec<SlottedTriple> = vec![
            (1, vec![vec![n("A")], vec![n("X")]]),
            (2, vec![vec![n("A")], vec![n("Y")]]),
        ];
        assert!(find_overlaps(&triples, &MergeConfig::default()).is_empty());
    }

    #[test]
    fn overlap_group_can_include_more_than_two_triples() {
        let triples: Vec<SlottedTriple> = vec![
            (1, vec![vec![n("A")]]),
            (2, vec![vec![n("A")]]),
            (3, vec![vec![n("A")]]),
        ];
        assert_eq!(find_overlaps(&triples, &MergeConfig::default()), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn is_idempotent_on_a_small_bucket() {
        let triples: Vec<SlottedTriple> =
            vec![(1, vec![vec![n("A"), n("B")]]), (2, vec![vec![n("A"), n("C")]])];
        let config = MergeConfig::default();
        assert_eq!(find_overlaps(&triples, &config), find_overlaps(&triples, &config));
    }

    #[test]
    fn size_gate_counts_triples_with_empty_node_sets_too() {
        // 2 triples genuinely overlap at this slot, but the bucket also
        // carries enough triples with an empty node set at this slot to push
        // the *unfiltered* count above max_sets. The gate must still see
        // those empty-set triples (matching the reference's unconditional
        // per-slot index) so this exercises the sampling branch rather than
        // silently falling back to the exhaustive one.
        let mut triples: Vec<SlottedTriple> =
            vec![(1, vec![vec![n("A"), n("B")]]), (2, vec![vec![n("A"), n("C")]])];
        for id in 3..10 {
            triples.push((id, vec![Vec::new()]));
        }

        let mut config = MergeConfig::default();
        config.max_sets = 3;
        config.passes = 20;

        assert_eq!(find_overlaps(&triples, &config), vec![vec![1, 2]]);
    }

    #[test]
    fn empty_bucket_yields_no_overlaps() {
        let triples: Vec<SlottedTriple> = Vec::new();
        assert!(find_overlaps(&triples, &MergeConfig::default()).is_empty());
    }
}
