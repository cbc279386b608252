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

//! Per-mention disambiguation: given a bag of lemmas tagged as a single
//! noun phrase, finds the knowledge-graph class(es) that best describe it.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use knowledge_store::{KnowledgeStore, Node, NodeSet};

/// Score bonus applied to a class found by direct lookup (as opposed to one
/// reached only by generalizing an instance).
const CLASS_SCORE_AWARD: f64 = 0.1;

/// WordNet's generic "person" class, returned when a mention is a bare
/// personal name with no direct knowledge-graph entry.
pub const PERSON_NODE: &str = "<wordnet_person_100007846>";

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredNode {
    pub node: Node,
    pub score: f64,
}

pub struct MinClassDisambiguator<'a> {
    store: &'a KnowledgeStore,
    names: HashSet<String>,
}

impl<'a> MinClassDisambiguator<'a> {
    pub fn new(store: &'a KnowledgeStore, names: HashSet<String>) -> Self {
        Self { store, names }
    }

    /// Generalizes a typeless `node_set` up to `depth` class-levels and
    /// selects the nodes in the taxonomy's "second fifth from the top" by
    /// leaf count — the empirically chosen "just abstract enough" slice.
    fn apply_lca(&self, node_set: NodeSet, depth: u32) -> NodeSet {
        if node_set.class_count() > 0 {
            return node_set;
        }

        let all_classes: Vec<Node> = node_set
            .generalize(self.store.types.as_ref(), self.store.taxonomy.as_ref(), depth)
            .nodes;

        if all_classes.len() <= 1 {
            return NodeSet::empty();
        }

        // total[n] = number of distinct starting classes below n. A shared
        // ancestor reached from more than one starting class has its
        // contribution from that child *replaced* (not added to) each time
        // the child's own total grows, so reconvergent paths are counted
        // once rather than once per visit.
        let mut total: HashMap<Node, usize> = HashMap::new();
        let mut children: HashMap<Node, HashMap<Node, usize>> = HashMap::new();
        for cl in &all_classes {
            total.insert(cl.clone(), 1);
        }

        for cl in &all_classes {
            let mut chain = Vec::new();
            let mut cur = cl.clone();
            while let Some(parent) = self.store.taxonomy.parent(&cur) {
                chain.push(parent.clone());
                cur = parent;
            }

            let mut child = cl.clone();
            for p in chain {
                let child_total = *total.get(&child).unwrap();

                if !total.contains_key(&p) {
                    let mut m = HashMap::new();
                    m.insert(child.clone(), child_total);
                    children.insert(p.clone(), m);
                    total.insert(p.clone(), child_total);
                } else {
                    let mut p_total = *total.get(&p).unwrap();
                    let kids = children.entry(p.clone()).or_default();
                    if let Some(prev) = kids.insert(child.clone(), child_total) {
                        p_total = p_total - prev + child_total;
                    } else {
                        p_total += child_total;
                    }
                    total.insert(p.clone(), p_total);
                }

                child = p;
            }
        }

        if total.len() <= 1 {
            return NodeSet::empty();
        }

        let mut sorted: Vec<(Node, usize)> = total.into_iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let total = sorted.len();
        let mut bottom_thr = total / 5;
        if bottom_thr == 0 {
            bottom_thr = 1;
        }
        let top_thr = (total / 5) * 2 + 1;

        let selected: Vec<Node> = sorted[bottom_thr.min(total)..top_thr.min(total)]
            .iter()
            .map(|(n, _)| n.clone())
            .collect();

        NodeSet::new(node_set.lemmas, selected)
    }

    fn bin_sets(&self, node_sets: &[NodeSet]) -> Vec<(usize, Vec<String>, HashSet<Node>, HashSet<Node>)> {
        node_sets
            .iter()
            .enumerate()
            .map(|(i, ns)| {
                let classes: HashSet<Node> = ns.classes().cloned().collect();
                let inst_classes: HashSet<Node> = ns
                    .generalize(self.store.types.as_ref(), self.store.taxonomy.as_ref(), 1)
                    .classes()
                    .cloned()
                    .collect();
                (i, ns.lemmas.clone(), classes, inst_classes)
            })
            .collect()
    }

    fn sort_sets(
        &self,
        binned: &[(usize, Vec<String>, HashSet<Node>, HashSet<Node>)],
    ) -> HashMap<Node, f64> {
        let mut sorted_nodes: HashMap<Node, f64> = HashMap::new();

        for (bin_index, _lemmas, classes, inst_classes) in binned {
            let mut bin_weighted_nodes: HashMap<Node, f64> = HashMap::new();

            for cl in classes.union(inst_classes) {
                if !bin_weighted_nodes.contains_key(cl) {
                    if classes.contains(cl) {
                        bin_weighted_nodes.insert(cl.clone(), 1.0 / classes.len() as f64 + CLASS_SCORE_AWARD);
                    }
                    if inst_classes.contains(cl) {
                        bin_weighted_nodes.insert(cl.clone(), 1.0 / inst_classes.len() as f64);
                    }
                }

                for (other_index, _, _, other_inst_classes) in binned {
                    if other_index != bin_index && other_inst_classes.contains(cl) {
                        *bin_weighted_nodes.get_mut(cl).unwrap() += 1.0;
                    }
                }
            }

            for (cl, weight) in bin_weighted_nodes {
                *sorted_nodes.entry(cl).or_insert(0.0) += weight;
            }
        }

        sorted_nodes
    }

    /// Disambiguates a noun-phrase mention into a set of knowledge-graph
    /// classes with normalized scores summing to 1, or an empty vector if
    /// nothing could be resolved. Ties for the maximum score are all
    /// returned.
    pub fn disambiguate(&self, lemmas: &[String], depth: u32, try_lca: bool) -> Vec<ScoredNode> {
        if lemmas.is_empty() {
            return Vec::new();
        }

        let mut active_lemmas: HashSet<String> = lemmas.iter().cloned().collect();
        let mut found_node_sets: Vec<NodeSet> = Vec::new();

        for comb_size in (1..=lemmas.len()).rev() {
            let mut pool: Vec<String> = active_lemmas.iter().cloned().collect();
            pool.sort();

            if comb_size > pool.len() {
                continue;
            }

            for combination in pool.iter().cloned().combinations(comb_size) {
                let node_set = self.resolve_combination(&combination, try_lca, depth);

                if !node_set.isempty(self.store.types.as_ref()) {
                    found_node_sets.push(node_set);
                    for lemma in &combination {
                        active_lemmas.remove(lemma);
                    }
                }
            }
        }

        if found_node_sets.len() == 1
            && found_node_sets[0].lemmas.len() == 1
            && self.names.contains(&found_node_sets[0].lemmas[0])
        {
            return vec![ScoredNode {
                node: Node::new(PERSON_NODE),
                score: 1.0,
            }];
        }

        if found_node_sets.is_empty() {
            for lemma in lemmas {
                if self.names.contains(lemma) {
                    return vec![ScoredNode {
                        node: Node::new(PERSON_NODE),
                        score: 1.0,
                    }];
                }
            }
        }

        let binned = self.bin_sets(&found_node_sets);
        let mut sorted_nodes = self.sort_sets(&binned);

        let total_score: f64 = sorted_nodes.values().sum();
        if total_score == 0.0 || sorted_nodes.is_empty() {
            return Vec::new();
        }

        for v in sorted_nodes.values_mut() {
            *v /= total_score;
        }

        let max_score = sorted_nodes
            .values()
            .cloned()
            .fold(f64::MIN, f64::max);

        let mut selected: Vec<ScoredNode> = sorted_nodes
            .into_iter()
            .filter(|(_, score)| *score == max_score)
            .map(|(node, score)| ScoredNode { node, score })
            .collect();
        selected.sort_by(|a, b| a.node.cmp(&b.node));
        selected
    }

    fn resolve_combination(&self, combination: &[String], try_lca: bool, depth: u32) -> NodeSet {
        if combination.len() > 1 {
            let mut node_set = NodeSet::empty();
            for permutation in combination.iter().cloned().permutations(combination.len()) {
                let perm_str = permutation.join(" ");
                node_set = self
                    .store
                    .class_dict
                    .get(&perm_str)
                    .unwrap_or_else(NodeSet::empty);
                if !node_set.isempty(self.store.types.as_ref()) {
                    break;
                }
            }

            if node_set.isempty(self.store.types.as_ref()) {
                node_set = self
                    .store
                    .class_search
                    .search(combination)
                    .unwrap_or_else(NodeSet::empty);
            }

            node_set
        } else {
            let term = &combination[0];
            let mut node_set = self.store.class_dict.get(term).unwrap_or_else(NodeSet::empty);

            if node_set.isempty(self.store.types.as_ref()) && try_lca {
                node_set = self
                    .store
                    .class_search
                    .search(combination)
                    .unwrap_or_else(NodeSet::empty);
                node_set = self.apply_lca(node_set, depth);
            }

            node_set
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledge_store::MemoryStoreBuilder;

    fn lemmas(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_lemma_single_class() {
        let store = MemoryStoreBuilder::new()
            .with_label("dog", vec![Node::new("<wordnet_dog_102084071>")])
            .build();
        let solver = MinClassDisambiguator::new(&store, HashSet::new());

        let result = solver.disambiguate(&lemmas(&["dog"]), 2, false);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].node, Node::new("<wordnet_dog_102084071>"));
        assert!((result[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn name_fallback_for_unknown_name() {
        let store = MemoryStoreBuilder::new().build();
        let mut names = HashSet::new();
        names.insert("smith".to_string());
        let solver = MinClassDisambiguator::new(&store, names);

        let result = solver.disambiguate(&lemmas(&["smith"]), 2, false);
        assert_eq!(result, vec![ScoredNode {
            node: Node::new(PERSON_NODE),
            score: 1.0,
        }]);
    }

    #[test]
    fn multi_lemma_permutation_match() {
        let store = MemoryStoreBuilder::new()
            .with_label("new york", vec![Node::new("<yago_New_York>")])
            .build();
        let solver = MinClassDisambiguator::new(&store, HashSet::new());

        let result = solver.disambiguate(&lemmas(&["york", "new"]), 2, false);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].node, Node::new("<yago_New_York>"));
    }

    #[test]
    fn no_candidates_returns_empty() {
        let store = MemoryStoreBuilder::new().build();
        let solver = MinClassDisambiguator::new(&store, HashSet::new());
        assert!(solver.disambiguate(&lemmas(&["zzqx"]), 2, false).is_empty());
    }

    #[test]
    fn lca_selects_second_quintile() {
        // Ten generalized classes in a straight chain c0 -> c1 -> ... -> c9,
        // each wclass-prefixed so generalize() keeps them all.
        let mut builder = MemoryStoreBuilder::new();
        let mut classes = Vec::new();
        for i in 0..10 {
            classes.push(Node::new(format!("<yago_C{i}>")));
        }
        for i in 0..9 {
            builder = builder.with_parent(classes[i].clone(), classes[i + 1].clone());
        }
        builder = builder.with_word("thing", vec![Node::new("instance_of_thing")]);
        builder = builder.with_types(Node::new("instance_of_thing"), vec![classes[0].clone()]);
        let store = builder.build();

        let solver = MinClassDisambiguator::new(&store, HashSet::new());
        let ns = NodeSet::new(vec!["thing".to_string()], vec![Node::new("instance_of_thing")]);
        let result = solver.apply_lca(ns, 20);
        // total leaf-counted nodes = 10 (c0..c9), bottom_thr=2, top_thr=5 -> 3 nodes
        assert_eq!(result.nodes.len(), 3);
    }
}
