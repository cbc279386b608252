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

//! `merge with original` (§6): the final CLI stage, which deduplicates a
//! merged stream against the run's original input by a key built from the
//! triple's shape, keeping whichever copy carries the higher frequency.

use std::collections::HashMap;

use triples::{Arg, Triple};

/// The key two triples are considered duplicates under: the relation type
/// plus, per argument, its surface term (or — with `wordnet` set — its
/// sorted candidate node list, for debugging which nodes a merge kept)
/// joined with its POS tag. Frequency never enters the key, since frequency
/// is exactly the field this stage collapses across duplicates.
pub fn triple_key(triple: &Triple, wordnet: bool) -> String {
    let mut key = triple.rel_type.clone();
    for arg in &triple.args {
        key.push('\u{1}');
        match arg {
            Arg::Absent => key.push_str("<NONE>"),
            Arg::Term { term, pos } => {
                key.push_str(term);
                key.push('/');
                key.push_str(pos);
            }
            Arg::Annotated { term, pos, nodes } => {
                if wordnet {
                    let mut node_strs: Vec<&str> = nodes.iter().map(|(n, _)| n.as_str()).collect();
                    node_strs.sort_unstable();
                    key.push_str(&node_strs.join(","));
                } else {
                    key.push_str(term);
                }
                key.push('/');
                key.push_str(pos);
            }
        }
    }
    key
}

/// Deduplicates `triples` by [`triple_key`], keeping the entry with the
/// higher frequency under each key and preserving first-occurrence order so
/// output stays deterministic for a fixed input order.
pub fn dedup_keep_max_frequency(triples: impl IntoIterator<Item = Triple>, wordnet: bool) -> Vec<Triple> {
    let mut order: Vec<String> = Vec::new();
    let mut by_key: HashMap<String, Triple> = HashMap::new();

    for triple in triples {
        let key = triple_key(&triple, wordnet);
        match by_key.get_mut(&key) {
            None => {
                order.push(key.clone());
                by_key.insert(key, triple);
            }
            Some(existing) => {
                if triple.frequency > existing.frequency {
                    existing.frequency = triple.frequency;
                }
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| by_key.remove(&key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledge_store::Node;
    use triples::Vocabularies;

    fn triple(term: &str, freq: u64) -> Triple {
        Triple::new(
            "subj_verb".to_string(),
            vec![
                Arg::Term {
                    term: term.to_string(),
                    pos: "NN".to_string(),
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
    fn keeps_max_frequency_across_duplicates() {
        let triples = vec![triple("dog", 3), triple("dog", 9), triple("dog", 1)];
        let deduped = dedup_keep_max_frequency(triples, false);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].frequency, 9);
    }

    #[test]
    fn distinct_keys_are_both_kept_in_first_seen_order() {
        let triples = vec![triple("dog", 3), triple("cat", 5)];
        let deduped = dedup_keep_max_frequency(triples, false);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].args[0].term(), Some("dog"));
        assert_eq!(deduped[1].args[0].term(), Some("cat"));
    }

    #[test]
    fn wordnet_flag_keys_annotated_args_by_node_list() {
        let annotated = |nodes: Vec<&str>, freq: u64| {
            Triple::new(
                "subj_verb".to_string(),
                vec![Arg::Annotated {
                    term: "dog".to_string(),
                    pos: "NN".to_string(),
                    nodes: nodes.into_iter().map(|n| (Node::new(n), 1.0)).collect(),
                }],
                freq,
                &Vocabularies::default(),
            )
            .unwrap()
        };

        let a = annotated(vec!["A"], 1);
        let b = annotated(vec!["B"], 2);
        assert_ne!(triple_key(&a, true), triple_key(&b, true));
        assert_eq!(triple_key(&a, false), triple_key(&b, false));
    }
}
