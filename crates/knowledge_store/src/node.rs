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

use serde::{Deserialize, Serialize};

/// An opaque knowledge-graph node identifier. The node's kind is never
/// stored explicitly; it is derived from the identifier's prefix every time
/// it is needed, matching the source data's own convention.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Node(pub String);

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A node is an instance unless it carries one of the known class
    /// prefixes (WordNet synset, OWL, YAGO class, Wikipedia category).
    pub fn is_instance(&self) -> bool {
        !(self.0.starts_with("<wordnet_")
            || self.0.starts_with("owl:")
            || self.0.starts_with("<yago")
            || self.0.starts_with("<wikicategory"))
    }

    pub fn is_class(&self) -> bool {
        !self.is_instance()
    }

    pub fn is_owl_thing(&self) -> bool {
        self.0 == "owl:Thing"
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node(s)
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_prefix() {
        assert!(Node::new("<wordnet_dog_102084071>").is_class());
        assert!(Node::new("owl:Thing").is_class());
        assert!(Node::new("<yago_SomeClass>").is_class());
        assert!(Node::new("<wikicategory_Dogs>").is_class());
        assert!(Node::new("<wikicategory_Paris,_France>").is_class());
        assert!(Node::new("Paris").is_instance());
        assert!(Node::new("<some_instance_node>").is_instance());
    }
}
