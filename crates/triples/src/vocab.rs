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

/// The closed, validated sets of relation names and part-of-speech tags a
/// [`crate::Triple`] is allowed to carry. Kept as runtime data rather than a
/// Rust enum so a deployment backed by a different dependency parser's
/// tagset needs only a different config, not a code change.
#[derive(Debug, Clone)]
pub struct Vocabularies {
    rel_types: HashSet<String>,
    pos_tags: HashSet<String>,
}

/// Every noun tag used for disambiguation begins with `NN` (`NN`, `NNS`,
/// `NNP`, `NNPS`); every other tag is passed through unexamined. This is
/// independent of which tags are actually registered in a [`Vocabularies`],
/// since it only classifies, never validates.
pub fn is_noun_tag(pos: &str) -> bool {
    pos.starts_with("NN")
}

impl Vocabularies {
    pub fn new(rel_types: HashSet<String>, pos_tags: HashSet<String>) -> Self {
        Self {
            rel_types,
            pos_tags,
        }
    }

    pub fn has_relation(&self, rel: &str) -> bool {
        self.rel_types.contains(rel)
    }

    pub fn has_pos(&self, pos: &str) -> bool {
        self.pos_tags.contains(pos)
    }
}

impl Default for Vocabularies {
    /// The closed set a typical dependency parser emits: the handful of
    /// two-argument relation shapes this system disambiguates over, and the
    /// Penn Treebank tagset's noun and non-noun tags.
    fn default() -> Self {
        let rel_types = [
            "subj_verb",
            "verb_obj",
            "verb_prep_noun",
            "adj_noun",
            "noun_prep_noun",
            "noun_noun",
            "poss_noun",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let pos_tags = [
            "NN", "NNS", "NNP", "NNPS", "VB", "VBD", "VBG", "VBN", "VBP", "VBZ", "JJ", "JJR",
            "JJS", "IN", "RB", "RBR", "RBS", "DT", "PRP", "PRP$", "CC", "CD", "TO", "MD",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        Self::new(rel_types, pos_tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_vocab_accepts_known_values() {
        let vocab = Vocabularies::default();
        assert!(vocab.has_relation("subj_verb"));
        assert!(!vocab.has_relation("made_up_relation"));
        assert!(vocab.has_pos("NNP"));
        assert!(!vocab.has_pos("XYZ"));
    }

    #[test]
    fn noun_tag_classification_is_prefix_based() {
        assert!(is_noun_tag("NN"));
        assert!(is_noun_tag("NNPS"));
        assert!(!is_noun_tag("VB"));
    }
}
