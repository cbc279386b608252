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
use config::PipelineConfig;
use disambiguate::MinClassDisambiguator;
use knowledge_store::KnowledgeStore;
use rayon::prelude::*;
use triples::{decode_triple, encode_triple, Arg, Triple, Vocabularies};

use crate::io::{load_config, load_names, open_input, open_output};

/// `disambiguate stream -> annotated stream` (§6): resolves every NN
/// argument of every triple on the input stream against the knowledge
/// store, emitting the same stream with NN arguments annotated with scored
/// candidate nodes.
#[derive(Args)]
pub struct DisambiguateArgs {
    /// Directory holding the four knowledge-store indexes.
    #[clap(long)]
    store: PathBuf,

    /// Input triple stream; stdin if omitted.
    #[clap(long)]
    input: Option<PathBuf>,

    /// Output annotated stream; stdout if omitted.
    #[clap(long)]
    output: Option<PathBuf>,

    /// `toml` config overriding delimiters/solver defaults.
    #[clap(long)]
    config: Option<PathBuf>,
}

pub fn run(args: DisambiguateArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let names = load_names(&config.solver.names_path)?;
    let store = KnowledgeStore::open(&args.store)?;
    let solver = MinClassDisambiguator::new(&store, names);
    let vocab = Vocabularies::default();

    let reader = open_input(&args.input)?;
    let mut writer = open_output(&args.output)?;

    let lines = reader
        .lines()
        .collect::<std::io::Result<Vec<String>>>()?;

    let (processed, skipped) = if config.solver.parallel {
        run_parallel(&lines, &solver, &vocab, &config, &mut writer)?
    } else {
        run_sequential(&lines, &solver, &vocab, &config, &mut writer)?
    };

    writer.flush()?;
    tracing::info!(processed, skipped, "done");
    Ok(())
}

/// Sequential path: output order tracks input order exactly, as §5
/// requires for a single stream.
fn run_sequential(
    lines: &[String],
    solver: &MinClassDisambiguator<'_>,
    vocab: &Vocabularies,
    config: &PipelineConfig,
    writer: &mut dyn Write,
) -> Result<(u64, u64)> {
    let mut processed = 0u64;
    let mut skipped = 0u64;

    for line in lines {
        match process_line(line, solver, vocab, config) {
            Some(encoded) => {
                writer.write_all(&encoded)?;
                writer.write_all(b"\n")?;
                processed += 1;
                if processed % 10_000 == 0 {
                    tracing::info!(processed, skipped, "disambiguating");
                }
            }
            None => skipped += 1,
        }
    }

    Ok((processed, skipped))
}

/// Parallel path (§5): shards the input across a `rayon` thread pool, since
/// every store lookup is read-only after startup and each triple is
/// disambiguated independently. `rayon`'s indexed `collect` keeps results in
/// input order regardless, so this only trades CPU for throughput, not
/// ordering.
fn run_parallel(
    lines: &[String],
    solver: &MinClassDisambiguator<'_>,
    vocab: &Vocabularies,
    config: &PipelineConfig,
    writer: &mut dyn Write,
) -> Result<(u64, u64)> {
    let results: Vec<Option<Vec<u8>>> = lines
        .par_iter()
        .map(|line| process_line(line, solver, vocab, config))
        .collect();

    let mut processed = 0u64;
    let mut skipped = 0u64;
    for result in results {
        match result {
            Some(encoded) => {
                writer.write_all(&encoded)?;
                writer.write_all(b"\n")?;
                processed += 1;
            }
            None => skipped += 1,
        }
    }

    Ok((processed, skipped))
}

/// Decodes, disambiguates, and re-encodes a single line. Returns `None` for
/// a blank or malformed line, which is logged and dropped rather than
/// aborting the stream (§7).
fn process_line(
    line: &str,
    solver: &MinClassDisambiguator<'_>,
    vocab: &Vocabularies,
    config: &PipelineConfig,
) -> Option<Vec<u8>> {
    if line.is_empty() {
        return None;
    }

    let triple = match decode_triple(line.as_bytes(), &config.delimiters, vocab) {
        Ok(triple) => triple,
        Err(err) => {
            tracing::warn!(%err, "skipping malformed input line");
            return None;
        }
    };

    let annotated = annotate(solver, triple, config.solver.depth, config.solver.try_lca);
    Some(encode_triple(&annotated, &config.delimiters))
}

/// Resolves every NN argument of `triple`, leaving every other argument
/// untouched.
fn annotate(solver: &MinClassDisambiguator<'_>, triple: Triple, depth: u32, try_lca: bool) -> Triple {
    let rel_type = triple.rel_type;
    let frequency = triple.frequency;

    let args = triple
        .args
        .into_iter()
        .map(|arg| {
            if !arg.is_nn() {
                return arg;
            }
            match arg {
                Arg::Term { term, pos } => {
                    let lemmas = term.split_whitespace().map(str::to_string).collect::<Vec<_>>();
                    let scored = solver.disambiguate(&lemmas, depth, try_lca);
                    let nodes = scored.into_iter().map(|s| (s.node, s.score)).collect();
                    Arg::Annotated { term, pos, nodes }
                }
                other => other,
            }
        })
        .collect();

    Triple { rel_type, args, frequency }
}
