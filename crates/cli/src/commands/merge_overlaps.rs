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
use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use merge::{merge_triples, PatternIndex};
use triples::{decode_triple, encode_triple, Vocabularies};

use crate::io::{load_config, open_input, open_output};

/// `merge overlaps` (§6): reads the pattern bucket store plus the overlap
/// records written by `find overlaps`, and for each overlap group combines
/// its triples (§4.2 Merger) into one, writing the merged stream.
#[derive(Args)]
pub struct MergeOverlapsArgs {
    /// Directory of the pattern bucket store.
    #[clap(long)]
    bucket_store: PathBuf,

    /// Overlap records written by `find-overlaps`; stdin if omitted.
    #[clap(long)]
    overlaps: Option<PathBuf>,

    /// Output merged triple stream; stdout if omitted.
    #[clap(long)]
    output: Option<PathBuf>,

    /// `toml` config overriding delimiters/merge defaults.
    #[clap(long)]
    config: Option<PathBuf>,
}

pub fn run(args: MergeOverlapsArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let vocab = Vocabularies::default();
    let index = PatternIndex::open(&args.bucket_store, config.delimiters, &config.merge);

    let reader = open_input(&args.overlaps)?;
    let mut writer = open_output(&args.output)?;

    let mut bucket_cache: HashMap<String, HashMap<u64, String>> = HashMap::new();
    let mut groups_merged: u64 = 0;
    let mut groups_skipped: u64 = 0;

    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }

        let Some((pattern, ids_raw)) = line.split_once('\t') else {
            tracing::warn!(record = %line, "skipping malformed overlap record");
            groups_skipped += 1;
            continue;
        };

        let bucket = match bucket_cache.entry(pattern.to_string()) {
            std::collections::hash_map::Entry::Occupied(entry) => Some(entry.into_mut()),
            std::collections::hash_map::Entry::Vacant(entry) => {
                match index.get_bucket(pattern) {
                    Some(bucket) => Some(entry.insert(bucket)),
                    None => {
                        tracing::warn!(%pattern, "pattern bucket missing, skipping overlap group");
                        None
                    }
                }
            }
        };
        let Some(bucket) = bucket else {
            groups_skipped += 1;
            continue;
        };

        let mut triples = Vec::new();
        let mut ok = true;
        for id_str in ids_raw.split(',') {
            let Ok(id) = id_str.parse::<u64>() else {
                tracing::warn!(record = %line, "skipping overlap record with non-numeric id");
                ok = false;
                break;
            };
            let Some(raw_line) = bucket.get(&id) else {
                tracing::warn!(%pattern, triple_id = id, "triple id missing from bucket, skipping group");
                ok = false;
                break;
            };
            match decode_triple(raw_line.as_bytes(), &config.delimiters, &vocab) {
                Ok(triple) => triples.push(triple),
                Err(err) => {
                    tracing::warn!(%err, %pattern, triple_id = id, "skipping unparsable bucket line");
                    ok = false;
                    break;
                }
            }
        }

        if !ok {
            groups_skipped += 1;
            continue;
        }

        match merge_triples(&triples) {
            Some(merged) => {
                let encoded = encode_triple(&merged, &config.delimiters);
                writer.write_all(&encoded)?;
                writer.write_all(b"\n")?;
                groups_merged += 1;
            }
            None => groups_skipped += 1,
        }
    }

    writer.flush()?;
    tracing::info!(groups_merged, groups_skipped, "done");
    Ok(())
}
