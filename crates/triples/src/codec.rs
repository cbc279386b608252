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

//! Byte-oriented wire codec for the triple CSV format (§6). The format's
//! delimiters are single bytes outside the ASCII range, so a line is parsed
//! byte-by-byte rather than as UTF-8 text; only the individual term/pos/node
//! tokens between delimiters are assumed to be valid UTF-8.
//!
//! A general-purpose `csv` reader doesn't fit here: it assumes single-byte
//! ASCII delimiters and quoting rules that don't match this format's
//! multi-level, non-comma delimiter scheme, so (matching the way this
//! codebase hand-writes its own DMOZ/WARC/wiki-dump readers rather than
//! bending a general CSV reader to a bespoke format) the codec is
//! hand-written against the exact byte layout.

use config::DelimiterConfig;
use knowledge_store::Node;

use crate::arg::Arg;
use crate::error::{Error, Result};
use crate::triple::Triple;
use crate::vocab::Vocabularies;

const NONE_TOKEN: &[u8] = b"<NONE>";
const NONE_POS_TOKEN: &[u8] = b"None-<NONE-POS>";
const PADDING_TOKEN: &[u8] = b"<->";

fn find(data: &[u8], byte: u8) -> Option<usize> {
    data.iter().position(|&b| b == byte)
}

fn split(data: &[u8], byte: u8) -> Vec<&[u8]> {
    data.split(|&b| b == byte).collect()
}

fn to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Decodes one argument field, or `None` if the field is the `<->` padding
/// token, which drops the slot from the argument list entirely rather than
/// recording it as absent (§6: "ignored / padding" is a distinct category
/// from "absent argument").
fn decode_arg(bytes: &[u8], delims: &DelimiterConfig) -> Result<Option<Arg>> {
    if bytes == PADDING_TOKEN {
        return Ok(None);
    }
    if bytes == NONE_TOKEN || bytes == NONE_POS_TOKEN {
        return Ok(Some(Arg::Absent));
    }

    let pos_at = find(bytes, delims.pos).ok_or_else(|| {
        Error::Malformed(format!(
            "argument '{}' has no POS delimiter",
            to_string(bytes)
        ))
    })?;
    let term = to_string(&bytes[..pos_at]);
    let rest = &bytes[pos_at + 1..];

    match find(rest, delims.term_nodes) {
        None => Ok(Some(Arg::Term {
            term,
            pos: to_string(rest),
        })),
        Some(tn_at) => {
            let pos = to_string(&rest[..tn_at]);
            let nodes_bytes = &rest[tn_at + 1..];
            let mut nodes = Vec::new();
            for pair in split(nodes_bytes, delims.node_node) {
                let ns_at = find(pair, delims.node_score).ok_or_else(|| {
                    Error::Malformed(format!(
                        "node/score pair '{}' has no score delimiter",
                        to_string(pair)
                    ))
                })?;
                let node = Node::new(to_string(&pair[..ns_at]));
                let score: f64 = to_string(&pair[ns_at + 1..])
                    .parse()
                    .map_err(|_| Error::Malformed("non-numeric score".to_string()))?;
                nodes.push((node, score));
            }
            Ok(Some(Arg::Annotated { term, pos, nodes }))
        }
    }
}

fn encode_arg(arg: &Arg, delims: &DelimiterConfig) -> Vec<u8> {
    match arg {
        Arg::Absent => NONE_TOKEN.to_vec(),
        Arg::Term { term, pos } => {
            let mut out = term.as_bytes().to_vec();
            out.push(delims.pos);
            out.extend_from_slice(pos.as_bytes());
            out
        }
        Arg::Annotated { term, pos, nodes } => {
            let mut out = term.as_bytes().to_vec();
            out.push(delims.pos);
            out.extend_from_slice(pos.as_bytes());
            out.push(delims.term_nodes);
            for (i, (node, score)) in nodes.iter().enumerate() {
                if i > 0 {
                    out.push(delims.node_node);
                }
                out.extend_from_slice(node.as_str().as_bytes());
                out.push(delims.node_score);
                out.extend_from_slice(format!("{score}").as_bytes());
            }
            out
        }
    }
}

/// Parses one line of the wire format into a [`Triple`], validating
/// `rel_type` and every argument's POS against `vocab`.
pub fn decode_triple(line: &[u8], delims: &DelimiterConfig, vocab: &Vocabularies) -> Result<Triple> {
    let fields = split(line, delims.arg);
    if fields.len() < 2 {
        return Err(Error::Malformed("line has no frequency field".to_string()));
    }

    let rel_type = to_string(fields[0]);
    let frequency: u64 = to_string(fields[fields.len() - 1])
        .trim()
        .parse()
        .map_err(|_| Error::Malformed("non-numeric frequency".to_string()))?;

    let args = fields[1..fields.len() - 1]
        .iter()
        .map(|field| decode_arg(field, delims))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect();

    Triple::new(rel_type, args, frequency, vocab)
}

/// Serializes a [`Triple`] back into one line of the wire format.
pub fn encode_triple(triple: &Triple, delims: &DelimiterConfig) -> Vec<u8> {
    let mut out = triple.rel_type.as_bytes().to_vec();
    for arg in &triple.args {
        out.push(delims.arg);
        out.extend_from_slice(&encode_arg(arg, delims));
    }
    out.push(delims.arg);
    out.extend_from_slice(triple.frequency.to_string().as_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vocabularies {
        Vocabularies::default()
    }

    #[test]
    fn roundtrips_plain_triple() {
        let delims = DelimiterConfig::default();
        let triple = Triple::new(
            "subj_verb".to_string(),
            vec![
                Arg::Term {
                    term: "dog".to_string(),
                    pos: "NN".to_string(),
                },
                Arg::Absent,
            ],
            7,
            &vocab(),
        )
        .unwrap();

        let line = encode_triple(&triple, &delims);
        let parsed = decode_triple(&line, &delims, &vocab()).unwrap();
        assert_eq!(parsed, triple);
    }

    #[test]
    fn roundtrips_annotated_triple_with_multiple_nodes() {
        let delims = DelimiterConfig::default();
        let triple = Triple::new(
            "subj_verb".to_string(),
            vec![
                Arg::Annotated {
                    term: "dog".to_string(),
                    pos: "NN".to_string(),
                    nodes: vec![
                        (Node::new("<wordnet_dog_102084071>"), 0.6),
                        (Node::new("<wordnet_dog_102085374>"), 0.4),
                    ],
                },
                Arg::Term {
                    term: "bark".to_string(),
                    pos: "VB".to_string(),
                },
            ],
            2,
            &vocab(),
        )
        .unwrap();

        let line = encode_triple(&triple, &delims);
        let parsed = decode_triple(&line, &delims, &vocab()).unwrap();
        assert_eq!(parsed, triple);
    }

    #[test]
    fn none_tokens_decode_to_absent_but_padding_is_dropped() {
        let delims = DelimiterConfig::default();
        assert_eq!(decode_arg(NONE_TOKEN, &delims).unwrap(), Some(Arg::Absent));
        assert_eq!(decode_arg(NONE_POS_TOKEN, &delims).unwrap(), Some(Arg::Absent));
        assert_eq!(decode_arg(PADDING_TOKEN, &delims).unwrap(), None);
    }

    #[test]
    fn padding_token_compacts_the_argument_list() {
        let delims = DelimiterConfig::default();
        // rel, <->, dog-NN, freq: the padding slot must not become Arg::Absent
        // at index 0, it must vanish so `dog` lands at index 0.
        let mut line = Vec::new();
        line.extend_from_slice(b"subj_verb");
        line.push(delims.arg);
        line.extend_from_slice(PADDING_TOKEN);
        line.push(delims.arg);
        line.extend_from_slice(b"dog");
        line.push(delims.pos);
        line.extend_from_slice(b"NN");
        line.push(delims.arg);
        line.extend_from_slice(b"3");

        let parsed = decode_triple(&line, &delims, &vocab()).unwrap();
        assert_eq!(parsed.args.len(), 1);
        assert_eq!(parsed.args[0].term(), Some("dog"));
    }

    #[test]
    fn malformed_line_without_frequency_is_rejected() {
        let delims = DelimiterConfig::default();
        let line = b"subj_verb";
        assert!(decode_triple(line, &delims, &vocab()).is_err());
    }
}
