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

use crate::arg::Arg;
use crate::error::{Error, Result};
use crate::vocab::Vocabularies;

/// A syntactic relation tuple: a relation type, a variable-length list of
/// arguments, and the frequency this shape was observed with. `rel_type`
/// and every argument's `pos` are validated against a [`Vocabularies`] at
/// construction; nothing downstream needs to re-check them.
#[derive(Debug, Clone, PartialEq)]
pub struct Triple {
    pub rel_type: String,
    pub args: Vec<Arg>,
    pub frequency: u64,
}

impl Triple {
    pub fn new(
        rel_type: String,
        args: Vec<Arg>,
        frequency: u64,
        vocab: &Vocabularies,
    ) -> Result<Self> {
        if !vocab.has_relation(&rel_type) {
            return Err(Error::UnknownRelation(rel_type));
        }
        for arg in &args {
            if let Some(pos) = arg.pos() {
                if !vocab.has_pos(pos) {
                    return Err(Error::UnknownPos(pos.to_string()));
                }
            }
        }
        Ok(Self {
            rel_type,
            args,
            frequency,
        })
    }

    /// Indices of arguments tagged NN, in argument order.
    pub fn nn_indices(&self) -> Vec<usize> {
        self.args
            .iter()
            .enumerate()
            .filter(|(_, arg)| arg.is_nn())
            .map(|(i, _)| i)
            .collect()
    }

    /// The bucket key this triple merges under: `rel_type` followed by, per
    /// argument, `_NN`, `_*` (absent), or the literal non-NN term. A triple
    /// with no NN argument has no pattern and is excluded from merging.
    pub fn pattern(&self) -> Option<String> {
        if self.nn_indices().is_empty() {
            return None;
        }

        let mut key = self.rel_type.clone();
        for arg in &self.args {
            key.push('_');
            match arg {
                Arg::Absent => key.push('*'),
                _ if arg.is_nn() => key.push_str("NN"),
                _ => key.push_str(arg.term().unwrap_or_default()),
            }
        }
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vocabularies {
        Vocabularies::default()
    }

    #[test]
    fn rejects_unknown_relation() {
        let err = Triple::new("not_a_relation".to_string(), vec![], 1, &vocab()).unwrap_err();
        assert!(matches!(err, Error::UnknownRelation(_)));
    }

    #[test]
    fn rejects_unknown_pos() {
        let err = Triple::new(
            "subj_verb".to_string(),
            vec![Arg::Term {
                term: "dog".to_string(),
                pos: "ZZ".to_string(),
            }],
            1,
            &vocab(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownPos(_)));
    }

    #[test]
    fn pattern_reflects_arg_shape() {
        let triple = Triple::new(
            "subj_verb".to_string(),
            vec![
                Arg::Term {
                    term: "dog".to_string(),
                    pos: "NN".to_string(),
                },
                Arg::Term {
                    term: "bark".to_string(),
                    pos: "VB".to_string(),
                },
                Arg::Absent,
            ],
            3,
            &vocab(),
        )
        .unwrap();

        assert_eq!(triple.pattern().as_deref(), Some("subj_verb_NN_bark_*"));
    }

    #[test]
    fn no_nn_argument_has_no_pattern() {
        let triple = Triple::new(
            "subj_verb".to_string(),
            vec![Arg::Term {
                term: "bark".to_string(),
                pos: "VB".to_string(),
            }],
            1,
            &vocab(),
        )
        .unwrap();
        assert!(triple.pattern().is_none());
    }
}
