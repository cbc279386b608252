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

use std::collections::BTreeSet;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use merge::PatternIndex;
use triples::{decode_triple, Vocabularies};

use crate::io::{load_config, open_input, open_output};

/// `prepare merging data` (§6): bins a disambiguated triple stream by
/// pattern into the on-disk [`PatternIndex`], assigning each triple a
/// sequential id, and emits the set of distinct patterns seen (the "bin
/// manifest") for the `find overlaps` stage to iterate over.
#[derive(Args)]
pub struct PrepareArgs {
    /// Directory for the pattern bucket store; created if missing.
    #[clap(long)]
    bucket_store: PathBuf,

    /// Input disambiguated triple stream; stdin if omitted.
    #[clap(long)]
    input: Option<PathBuf>,

    /// Output bin manifest (one pattern per line); stdout if omitted.
    #[clap(long)]
    manifest: Option<PathBuf>,

    /// `toml` config overriding delimiters/merge defaults.
    #[clap(long)]
    config: Option<PathBuf>,
}

pub fn run(args: PrepareArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let vocab = Vocabularies::default();
    let index = PatternIndex::open(&args.bucket_store, config.delimiters, &config.merge);

    let reader = open_input(&args.input)?;
    let mut patterns: BTreeSet<String> = BTreeSet::new();

    let mut triple_id: u64 = 0;
    let mut processed: u64 = 0;
    let mut skipped: u64 = 0;

    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }

        let triple = match decode_triple(line.as_bytes(), &config.delimiters, &vocab) {
            Ok(triple) => triple,
            Err(err) => {
                tracing::warn!(%err, "skipping malformed input line");
                skipped += 1;
                continue;
            }
        };

        if let Some(pattern) = triple.pattern() {
            index.insert(pattern.clone(), triple_id, line);
            patterns.insert(pattern);
        }

        triple_id += 1;
        processed += 1;
        if processed % config.merge.progress_every == 0 {
            tracing::info!(processed, skipped, patterns = patterns.len(), "preparing merge data");
        }
    }

    index.flush();

    let mut writer = open_output(&args.manifest)?;
    for pattern in &patterns {
        writer.write_all(pattern.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    tracing::info!(processed, skipped, patterns = patterns.len(), "done");
    Ok(())
}
