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
use merge::dedup_keep_max_frequency;
use triples::{decode_triple, encode_triple, Vocabularies};

use crate::io::{load_config, open_input, open_output};

/// `merge with original` (§6): deduplicates the merged stream against the
/// run's original input stream by triple key, keeping whichever copy of a
/// duplicate carries the higher frequency.
#[derive(Args)]
pub struct MergeWithOriginalArgs {
    /// Merged triple stream, as written by `merge-overlaps`.
    #[clap(long)]
    merged: PathBuf,

    /// The run's original (pre-disambiguation or disambiguated) input
    /// stream to deduplicate against.
    #[clap(long)]
    original: PathBuf,

    /// Output deduplicated stream; stdout if omitted.
    #[clap(long)]
    output: Option<PathBuf>,

    /// Key annotated NN arguments by their sorted candidate node list
    /// instead of their surface term, for debugging which nodes a merge
    /// kept. Default keys by surface term.
    #[clap(long)]
    wordnet: bool,

    /// `toml` config overriding delimiters.
    #[clap(long)]
    config: Option<PathBuf>,
}

pub fn run(args: MergeWithOriginalArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let vocab = Vocabularies::default();

    let mut triples = Vec::new();
    let mut malformed = 0u64;

    for path in [&args.merged, &args.original] {
        let reader = open_input(&Some(path.clone()))?;
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            match decode_triple(line.as_bytes(), &config.delimiters, &vocab) {
                Ok(triple) => triples.push(triple),
                Err(err) => {
                    tracing::warn!(%err, "skipping malformed line");
                    malformed += 1;
                }
            }
        }
    }

    let before = triples.len();
    let deduped = dedup_keep_max_frequency(triples, args.wordnet);

    let mut writer = open_output(&args.output)?;
    for triple in &deduped {
        let encoded = encode_triple(triple, &config.delimiters);
        writer.write_all(&encoded)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    tracing::info!(before, after = deduped.len(), malformed, "done");
    Ok(())
}
