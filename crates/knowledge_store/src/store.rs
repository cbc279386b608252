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

use std::collections::HashMap;
use std::path::Path;

use kv::{Kv, RocksDbStore};

use crate::error::{Error, Result};
use crate::node::Node;
use crate::node_set::NodeSet;

/// `<yago_label>` (lower-cased) -> `[<yago_node>]`
pub trait ClassDict: Send + Sync {
    fn get(&self, label: &str) -> Option<NodeSet>;
}

/// `<word>` -> `[<yago_node>]`, intersected across every lemma queried.
pub trait ClassSearch: Send + Sync {
    fn search(&self, lemmas: &[String]) -> Option<NodeSet>;
}

/// `<child_node>` -> first listed `<parent_node>`.
///
/// The source data associates a node with potentially many parents, but the
/// original implementation only ever reads the first one back out. This is
/// reproduced as-is: generalization therefore walks a single deterministic
/// path up an arbitrary spanning tree of the real multi-parent DAG, not the
/// full DAG.
pub trait Taxonomy: Send + Sync {
    fn parent(&self, node: &Node) -> Option<Node>;
}

/// `<instance_node>` -> `[<type_node>, ...]`
pub trait Types: Send + Sync {
    fn types_of(&self, node: &Node) -> Vec<Node>;
}

const INDEX_YAGO_CLASS_DICT_DIRNAME: &str = "yago_class_dict";
const INDEX_YAGO_CLASS_SEARCH_DIRNAME: &str = "yago_class_search";
const INDEX_YAGO_TAXONOMY_DIRNAME: &str = "yago_taxonomy";
const INDEX_YAGO_TYPES_DIRNAME: &str = "yago_types";

/// Read-only facade over the four persistent indexes a deployment builds
/// out-of-band from a taxonomy dump. Opening is eager and fails loudly
/// (panics), matching the way every other store in this codebase treats a
/// corrupt or missing on-disk index as unrecoverable.
pub struct KnowledgeStore {
    pub class_dict: Box<dyn ClassDict>,
    pub class_search: Box<dyn ClassSearch>,
    pub taxonomy: Box<dyn Taxonomy>,
    pub types: Box<dyn Types>,
}

impl KnowledgeStore {
    /// Opens the four rocksdb-backed indexes below `root`, read-only. Fails
    /// with [`Error::NotAStore`] rather than silently standing up an empty
    /// index directory, since the four sub-stores are built out-of-band by
    /// an ingest process and a missing one means the run was pointed at the
    /// wrong path, not that the index happens to be empty (§7 treats this as
    /// a fatal store I/O failure, not a normal empty lookup).
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        for dirname in [
            INDEX_YAGO_CLASS_DICT_DIRNAME,
            INDEX_YAGO_CLASS_SEARCH_DIRNAME,
            INDEX_YAGO_TAXONOMY_DIRNAME,
            INDEX_YAGO_TYPES_DIRNAME,
        ] {
            if !root.join(dirname).is_dir() {
                return Err(Error::NotAStore(root.display().to_string()));
            }
        }

        Ok(Self {
            class_dict: Box::new(RocksDbClassDict::open_read_only(
                root.join(INDEX_YAGO_CLASS_DICT_DIRNAME),
            )),
            class_search: Box::new(RocksDbClassSearch::open_read_only(
                root.join(INDEX_YAGO_CLASS_SEARCH_DIRNAME),
            )),
            taxonomy: Box::new(RocksDbTaxonomy::open_read_only(
                root.join(INDEX_YAGO_TAXONOMY_DIRNAME),
            )),
            types: Box::new(RocksDbTypes::open_read_only(
                root.join(INDEX_YAGO_TYPES_DIRNAME),
            )),
        })
    }
}

fn split_nodes(raw: &str) -> Vec<Node> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split('\u{1}').map(Node::new).collect()
}

fn join_nodes(nodes: &[Node]) -> String {
    nodes
        .iter()
        .map(Node::as_str)
        .collect::<Vec<_>>()
        .join("\u{1}")
}

pub struct RocksDbClassDict {
    store: RocksDbStore<String, String>,
}

impl RocksDbClassDict {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            store: RocksDbStore::open(path),
        }
    }

    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Self {
        Self {
            store: RocksDbStore::open_read_only(path),
        }
    }

    pub fn insert(&self, label: &str, nodes: &[Node]) {
        self.store
            .insert(label.to_lowercase(), join_nodes(nodes));
    }
}

impl ClassDict for RocksDbClassDict {
    fn get(&self, label: &str) -> Option<NodeSet> {
        let raw = self.store.get(&label.to_lowercase())?;
        Some(NodeSet::new(vec![label.to_string()], split_nodes(&raw)))
    }
}

pub struct RocksDbClassSearch {
    store: RocksDbStore<String, String>,
}

impl RocksDbClassSearch {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            store: RocksDbStore::open(path),
        }
    }

    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Self {
        Self {
            store: RocksDbStore::open_read_only(path),
        }
    }

    pub fn insert(&self, lemma: &str, nodes: &[Node]) {
        self.store.insert(lemma.to_string(), join_nodes(nodes));
    }
}

impl ClassSearch for RocksDbClassSearch {
    fn search(&self, lemmas: &[String]) -> Option<NodeSet> {
        if lemmas.is_empty() {
            return None;
        }

        let mut conjunction: Option<std::collections::HashSet<Node>> = None;
        for lemma in lemmas {
            let raw = self.store.get(lemma)?;
            let lemma_nodes: std::collections::HashSet<Node> =
                split_nodes(&raw).into_iter().collect();
            conjunction = Some(match conjunction {
                None => lemma_nodes,
                Some(acc) => acc.intersection(&lemma_nodes).cloned().collect(),
            });
        }

        let conjunction = conjunction?;
        if conjunction.is_empty() {
            return None;
        }
        Some(NodeSet::new(
            lemmas.to_vec(),
            conjunction.into_iter().collect(),
        ))
    }
}

pub struct RocksDbTaxonomy {
    store: RocksDbStore<String, String>,
}

impl RocksDbTaxonomy {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            store: RocksDbStore::open(path),
        }
    }

    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Self {
        Self {
            store: RocksDbStore::open_read_only(path),
        }
    }

    /// Stores the full (sorted, deduped) parent list even though only the
    /// first is ever read back, so the on-disk data still documents the
    /// true multi-parent relationship for anyone inspecting the index.
    pub fn insert(&self, child: &Node, parents: &[Node]) {
        let mut sorted = parents.to_vec();
        sorted.sort();
        sorted.dedup();
        self.store
            .insert(child.as_str().to_string(), join_nodes(&sorted));
    }
}

impl Taxonomy for RocksDbTaxonomy {
    fn parent(&self, node: &Node) -> Option<Node> {
        let raw = self.store.get(&node.0)?;
        split_nodes(&raw).into_iter().next()
    }
}

pub struct RocksDbTypes {
    store: RocksDbStore<String, String>,
}

impl RocksDbTypes {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            store: RocksDbStore::open(path),
        }
    }

    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Self {
        Self {
            store: RocksDbStore::open_read_only(path),
        }
    }

    pub fn insert(&self, instance: &Node, types: &[Node]) {
        self.store
            .insert(instance.as_str().to_string(), join_nodes(types));
    }
}

impl Types for RocksDbTypes {
    fn types_of(&self, node: &Node) -> Vec<Node> {
        self.store
            .get(&node.0)
            .map(|raw| split_nodes(&raw))
            .unwrap_or_default()
    }
}

/// An in-memory knowledge store, for tests and examples that need a small,
/// fully-specified graph without paying for a real rocksdb directory.
#[derive(Default)]
pub struct MemoryStoreBuilder {
    class_dict: HashMap<String, Vec<Node>>,
    class_search: HashMap<String, Vec<Node>>,
    taxonomy: HashMap<Node, Node>,
    types: HashMap<Node, Vec<Node>>,
}

impl MemoryStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, label: &str, nodes: Vec<Node>) -> Self {
        self.class_dict.insert(label.to_lowercase(), nodes.clone());
        for node in &nodes {
            self.class_search
                .entry(label.to_lowercase())
                .or_default()
                .push(node.clone());
        }
        self
    }

    pub fn with_word(mut self, word: &str, nodes: Vec<Node>) -> Self {
        self.class_search.insert(word.to_lowercase(), nodes);
        self
    }

    pub fn with_parent(mut self, child: Node, parent: Node) -> Self {
        self.taxonomy.insert(child, parent);
        self
    }

    pub fn with_types(mut self, instance: Node, types: Vec<Node>) -> Self {
        self.types.insert(instance, types);
        self
    }

    pub fn build(self) -> KnowledgeStore {
        KnowledgeStore {
            class_dict: Box::new(MemoryClassDict(self.class_dict)),
            class_search: Box::new(MemoryClassSearch(self.class_search)),
            taxonomy: Box::new(MemoryTaxonomy(self.taxonomy)),
            types: Box::new(MemoryTypes(self.types)),
        }
    }
}

struct MemoryClassDict(HashMap<String, Vec<Node>>);
impl ClassDict for MemoryClassDict {
    fn get(&self, label: &str) -> Option<NodeSet> {
        self.0
            .get(&label.to_lowercase())
            .map(|nodes| NodeSet::new(vec![label.to_string()], nodes.clone()))
    }
}

struct MemoryClassSearch(HashMap<String, Vec<Node>>);
impl ClassSearch for MemoryClassSearch {
    fn search(&self, lemmas: &[String]) -> Option<NodeSet> {
        if lemmas.is_empty() {
            return None;
        }
        let mut conjunction: Option<std::collections::HashSet<Node>> = None;
        for lemma in lemmas {
            let lemma_nodes: std::collections::HashSet<Node> =
                self.0.get(&lemma.to_lowercase())?.iter().cloned().collect();
            conjunction = Some(match conjunction {
                None => lemma_nodes,
                Some(acc) => acc.intersection(&lemma_nodes).cloned().collect(),
            });
        }
        let conjunction = conjunction?;
        if conjunction.is_empty() {
            return None;
        }
        Some(NodeSet::new(
            lemmas.to_vec(),
            conjunction.into_iter().collect(),
        ))
    }
}

struct MemoryTaxonomy(HashMap<Node, Node>);
impl Taxonomy for MemoryTaxonomy {
    fn parent(&self, node: &Node) -> Option<Node> {
        self.0.get(node).cloned()
    }
}

struct MemoryTypes(HashMap<Node, Vec<Node>>);
impl Types for MemoryTypes {
    fn types_of(&self, node: &Node) -> Vec<Node> {
        self.0.get(node).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_search_intersects_across_lemmas() {
        let store = MemoryStoreBuilder::new()
            .with_word("new", vec![Node::new("<yago_New_York>"), Node::new("<yago_New_Jersey>")])
            .with_word("york", vec![Node::new("<yago_New_York>")])
            .build();

        let result = store
            .class_search
            .search(&["new".to_string(), "york".to_string()])
            .unwrap();
        assert_eq!(result.nodes, vec![Node::new("<yago_New_York>")]);
    }

    #[test]
    fn taxonomy_returns_only_first_parent() {
        let store = MemoryStoreBuilder::new()
            .with_parent(Node::new("<yago_Dog>"), Node::new("<yago_Mammal>"))
            .build();
        assert_eq!(
            store.taxonomy.parent(&Node::new("<yago_Dog>")),
            Some(Node::new("<yago_Mammal>"))
        );
        assert_eq!(store.taxonomy.parent(&Node::new("<yago_Cat>")), None);
    }

    #[test]
    fn open_fails_fast_on_a_directory_missing_the_four_indexes() {
        let root = stdx::gen_temp_path();
        std::fs::create_dir_all(&root).unwrap();
        let err = KnowledgeStore::open(&root).unwrap_err();
        assert!(matches!(err, Error::NotAStore(_)));
    }
}
