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

use std::collections::HashSet;

use triples::{Arg, Triple};

/// Combines the triples named by one overlap group into a single triple:
/// NN-slot terms union (by `||`-split surface forms), NN-slot nodes
/// intersect (ignoring score — every surviving node is reassigned a literal
/// score of 1.0), non-NN arguments are carried from the first triple
/// unchanged (they are identical across a bucket by construction), and
/// frequency is summed. Returns `None` if the combined triple ends up with
/// no NN argument at all, matching the reference implementation's rule
/// that a merge yielding no noun slot produces no output.
pub fn merge_triples(triples: &[Triple]) -> Option<Triple> {
    let (first, rest) = triples.split_first()?;
    let mut acc = first.clone();

    for triple in rest {
        for (acc_arg, other_arg) in acc.args.iter_mut().zip(triple.args.iter()) {
            if let (Arg::Annotated { term: at, nodes: an, .. }, Arg::Annotated { term: bt, nodes: bn, .. }) =
                (&*acc_arg, other_arg)
            {
                let terms: HashSet<&str> = at.split("||").chain(bt.split("||")).collect();
                let mut terms: Vec<&str> = terms.into_iter().collect();
                terms.sort_unstable();
                let merged_term = terms.join("||");

                let a_nodes: HashSet<_> = an.iter().map(|(n, _)| n.clone()).collect();
                let b_nodes: HashSet<_> = bn.iter().map(|(n, _)| n.clone()).collect();
                let mut merged_nodes: Vec<_> = a_nodes.intersection(&b_nodes).cloned().collect();
                merged_nodes.sort();
                let nodes = merged_nodes.into_iter().map(|n| (n, 1.0)).collect();

                if let Arg::Annotated { term, nodes: acc_nodes, .. } = acc_arg {
                    *term = merged_term;
                    *acc_nodes = nodes;
                }
            }
        }
        acc.frequency += triple.frequency;
    }

    if acc.nn_indices().is_empty() {
        None
    } else {
        Some(acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledge_store::Node;
    use triples::Vocabularies;

    fn triple(dog_nodes: Vec<&str>, freq: u64) -> Triple {
        Triple::new(
            "subj_verb".to_string(),
            vec![
                Arg::Annotated {
                    term: "dog".to_string(),
                    pos: "NN".to_string(),
                    nodes: dog_nodes.into_iter().map(|n| (Node::new(n), 1.0)).collect(),
                },
                Arg::Term {
                    term: "bark".to_string(),
                    pos: "VB".to_string(),
                },
            ],
            freq,
            &Vocabularies::default(),
        )
        .unwrap()
    }

    #[test]
    fn merges_nodes_by_intersection_and_sums_frequency() {
        // S6: T1 dog-NN={A,B} freq 3, T2 dog-NN={A,C} freq 5 -> merged dog-NN={A} freq 8
        let t1 = triple(vec!["A", "B"], 3);
        let t2 = triple(vec!["A", "C"], 5);

        let merged = merge_triples(&[t1, t2]).unwrap();
        assert_eq!(merged.frequency, 8);
        match &merged.args[0] {
            Arg::Annotated { nodes, .. } => {
                assert_eq!(nodes.len(), 1);
                assert_eq!(nodes[0].0, Node::new("A"));
                assert_eq!(nodes[0].1, 1.0);
            }
            other => panic!("expected annotated arg, got {other:?}"),
        }
    }

    #[test]
    fn empty_node_intersection_is_preserved_not_dropped() {
        let t1 = triple(vec!["A"], 1);
        let t2 = triple(vec!["B"], 1);

        let merged = merge_triples(&[t1, t2]).unwrap();
        match &merged.args[0] {
            Arg::Annotated { nodes, .. } => assert!(nodes.is_empty()),
            other => panic!("expected annotated arg, got {other:?}"),
        }
    }

    #[test]
    fn is_commutative_on_the_overlap_group_modulo_frequency_ordering() {
        let t1 = triple(vec!["A", "B"], 3);
        let t2 = triple(vec!["A", "C"], 5);

        let forward = merge_triples(&[t1.clone(), t2.clone()]).unwrap();
        let backward = merge_triples(&[t2, t1]).unwrap();

        assert_eq!(forward.frequency, backward.frequency);
        assert_eq!(forward.args[0], backward.args[0]);
    }

    #[test]
    fn empty_input_yields_no_triple() {
        assert!(merge_triples(&[]).is_none());
    }
}
