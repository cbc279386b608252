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

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use merge::{find_overlaps, PatternIndex, SlottedTriple};
use triples::{decode_triple, Triple, Vocabularies};

use crate::io::{load_config, open_input, open_output};

/// `find overlaps` (§6): for each pattern in the bin manifest, reads its
/// bucket from the [`PatternIndex`] and runs the overlap finder (§4.2) over
/// it, writing one overlap record per non-empty overlap group.
///
/// An overlap record is a line `pattern\tid1,id2,...`. A pattern named in
/// the manifest with no corresponding bucket is logged and skipped, per
/// §7's "pattern bucket missing when merging" policy.
#[derive(Args)]
pub struct FindOverlapsArgs {
    /// Directory of the pattern bucket store written by `prepare-merge-data`.
    #[clap(long)]
    bucket_store: PathBuf,

    /// Bin manifest (one pattern per line); stdin if omitted.
    #[clap(long)]
    manifest: Option<PathBuf>,

    /// Output overlap records; stdout if omitted.
    #[clap(long)]
    output: Option<PathBuf>,

    /// `toml` config overriding delimiters/merge defaults.
    #[clap(long)]
    config: Option<PathBuf>,
}

pub fn run(args: FindOverlapsArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let vocab = Vocabularies::default();
    let index = PatternIndex::open(&args.bucket_store, config.delimiters, &config.merge);

    let reader = open_input(&args.manifest)?;
    let mut writer = open_output(&args.output)?;

    let mut patterns_seen: u64 = 0;
    let mut groups_written: u64 = 0;

    for line in reader.lines() {
        let pattern = line?;
        if pattern.is_empty() {
            continue;
        }
        patterns_seen += 1;

        let bucket = match index.get_bucket(&pattern) {
            Some(bucket) => bucket,
            None => {
                tracing::warn!(%pattern, "pattern bucket missing, skipping");
                continue;
            }
        };

        let mut slotted: Vec<SlottedTriple> = Vec::new();
        for (id, line) in &bucket {
            match decode_triple(line.as_bytes(), &config.delimiters, &vocab) {
                Ok(triple) => slotted.push(to_slotted(*id, &triple)),
                Err(err) => {
                    tracing::warn!(%err, %pattern, triple_id = *id, "skipping unparsable bucket line");
                }
            }
        }
        slotted.sort_by_key(|(id, _)| *id);

        let groups = find_overlaps(&slotted, &config.merge);
        for group in &groups {
            let ids: Vec<String> = group.iter().map(u64::to_string).collect();
            writer.write_all(pattern.as_bytes())?;
            writer.write_all(b"\t")?;
            writer.write_all(ids.join(",").as_bytes())?;
            writer.write_all(b"\n")?;
            groups_written += 1;
        }
    }

    writer.flush()?;
    tracing::info!(patterns_seen, groups_written, "done");
    Ok(())
}

fn to_slotted(id: u64, triple: &Triple) -> SlottedTriple {
    let slots = triple
        .nn_indices()
        .into_iter()
        .map(|i| triple.args[i].nodes().iter().map(|(n, _)| n.clone()).collect())
        .collect();
    (id, slots)
}
