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

use crate::node::Node;
use crate::store::{Taxonomy, Types};

/// A set of candidate nodes produced by looking up one or more lemmas,
/// together with the lemmas that produced it.
///
/// `owl:Thing` is always dropped on construction: it sits at the root of
/// every class hierarchy and carries no disambiguating information.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSet {
    pub lemmas: Vec<String>,
    pub nodes: Vec<Node>,
}

impl NodeSet {
    pub fn new(lemmas: Vec<String>, nodes: Vec<Node>) -> Self {
        let mut seen = HashSet::new();
        let nodes = nodes
            .into_iter()
            .filter(|n| !n.is_owl_thing())
            .filter(|n| seen.insert(n.clone()))
            .collect();
        Self { lemmas, nodes }
    }

    pub fn empty() -> Self {
        Self {
            lemmas: Vec::new(),
            nodes: Vec::new(),
        }
    }

    pub fn classes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_class())
    }

    pub fn instances(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_instance())
    }

    pub fn class_count(&self) -> usize {
        self.classes().count()
    }

    pub fn instance_count(&self) -> usize {
        self.instances().count()
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// A node set is "empty for scoring" if it has no nodes at all, or it
    /// has only instances and every one of them maps to an empty type list.
    /// A single instance with a non-empty type list is enough to make the
    /// whole set non-empty, even if other instances in it have none.
    pub fn isempty(&self, types: &dyn Types) -> bool {
        if self.nodes.is_empty() {
            return true;
        }
        if self.class_count() == 0 && self.instance_count() > 0 {
            for instance in self.instances() {
                if !types.types_of(instance).is_empty() {
                    return false;
                }
            }
            return true;
        }
        false
    }

    /// Generalizes instances in this set to their ancestor classes, climbing
    /// `levels` class-levels up the taxonomy. `levels == 1` is bumped to 2
    /// unless the instances' immediate types already contain a class (this
    /// mirrors the source behavior rather than a cleaner rule).
    pub fn generalize(&self, types: &dyn Types, taxonomy: &dyn Taxonomy, levels: u32) -> NodeSet {
        let mut instance_nodes: HashSet<Node> = HashSet::new();
        for node in &self.nodes {
            if node.is_instance() {
                instance_nodes.extend(types.types_of(node));
            }
        }

        let has_class = instance_nodes.iter().any(Node::is_class);
        let mut levels = levels;
        if levels > 1 || !has_class {
            if levels == 1 {
                levels += 1;
            }

            let mut prev_classes: Vec<Node> = instance_nodes.iter().cloned().collect();

            while levels > 1 && !prev_classes.is_empty() {
                let mut new_classes = Vec::new();
                for node in &prev_classes {
                    if let Some(parent) = taxonomy.parent(node) {
                        new_classes.push(parent);
                    }
                }

                instance_nodes.extend(new_classes.iter().cloned());
                prev_classes = new_classes;

                for cl in &prev_classes {
                    if cl.is_class() {
                        levels -= 1;
                        break;
                    }
                }
            }
        }

        let nodes: Vec<Node> = instance_nodes.into_iter().filter(Node::is_class).collect();
        NodeSet::new(self.lemmas.clone(), nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeTaxonomy(HashMap<Node, Node>);
    impl Taxonomy for FakeTaxonomy {
        fn parent(&self, node: &Node) -> Option<Node> {
            self.0.get(node).cloned()
        }
    }

    struct FakeTypes(HashMap<Node, Vec<Node>>);
    impl Types for FakeTypes {
        fn types_of(&self, node: &Node) -> Vec<Node> {
            self.0.get(node).cloned().unwrap_or_default()
        }
    }

    #[test]
    fn drops_owl_thing_and_dedupes() {
        let ns = NodeSet::new(
            vec!["dog".to_string()],
            vec![
                Node::new("owl:Thing"),
                Node::new("<wordnet_dog_102084071>"),
                Node::new("<wordnet_dog_102084071>"),
            ],
        );
        assert_eq!(ns.size(), 1);
    }

    #[test]
    fn isempty_true_for_typeless_instances() {
        let ns = NodeSet::new(vec!["x".to_string()], vec![Node::new("paris")]);
        let types = FakeTypes(HashMap::new());
        assert!(ns.isempty(&types));
    }

    #[test]
    fn isempty_false_when_any_instance_has_types() {
        let ns = NodeSet::new(
            vec!["x".to_string()],
            vec![Node::new("paris"), Node::new("nowhere")],
        );
        let mut map = HashMap::new();
        map.insert(Node::new("paris"), vec![Node::new("<wordnet_city_100000001>")]);
        let types = FakeTypes(map);
        assert!(!ns.isempty(&types));
    }

    #[test]
    fn generalize_climbs_to_classes() {
        let mut types_map = HashMap::new();
        types_map.insert(Node::new("paris"), vec![Node::new("<yago_City>")]);
        let types = FakeTypes(types_map);

        let mut tax_map = HashMap::new();
        tax_map.insert(Node::new("<yago_City>"), Node::new("<yago_Place>"));
        let taxonomy = FakeTaxonomy(tax_map);

        let ns = NodeSet::new(vec!["paris".to_string()], vec![Node::new("paris")]);
        let generalized = ns.generalize(&types, &taxonomy, 1);
        assert!(generalized.nodes.contains(&Node::new("<yago_City>")));
    }
}
