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

use knowledge_store::Node;

/// A single triple argument: absent, a plain term/pos pair, or (after
/// disambiguation) a term/pos pair annotated with scored candidate nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Absent,
    Term {
        term: String,
        pos: String,
    },
    Annotated {
        term: String,
        pos: String,
        nodes: Vec<(Node, f64)>,
    },
}

impl Arg {
    pub fn pos(&self) -> Option<&str> {
        match self {
            Arg::Absent => None,
            Arg::Term { pos, .. } | Arg::Annotated { pos, .. } => Some(pos),
        }
    }

    pub fn term(&self) -> Option<&str> {
        match self {
            Arg::Absent => None,
            Arg::Term { term, .. } | Arg::Annotated { term, .. } => Some(term),
        }
    }

    pub fn is_nn(&self) -> bool {
        self.pos().map(crate::vocab::is_noun_tag).unwrap_or(false)
    }

    pub fn nodes(&self) -> &[(Node, f64)] {
        match self {
            Arg::Annotated { nodes, .. } => nodes,
            _ => &[],
        }
    }

    /// The lemmas making up this argument's mention, as upstream tagging
    /// leaves them: a single space-joined term split back into its words.
    pub fn lemmas(&self) -> Vec<String> {
        self.term()
            .map(|t| t.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }
}
