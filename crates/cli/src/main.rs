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

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::prelude::*;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod io;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Args {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every NN argument on a triple stream against the knowledge
    /// store, emitting the same stream annotated with scored candidate
    /// nodes.
    Disambiguate(commands::disambiguate::DisambiguateArgs),

    /// Bin a disambiguated triple stream into the pattern bucket store and
    /// emit the bin manifest of distinct patterns seen.
    PrepareMergeData(commands::prepare::PrepareArgs),

    /// Find overlapping candidate node sets within each bucket named in a
    /// bin manifest, writing one overlap record per group found.
    FindOverlaps(commands::find_overlaps::FindOverlapsArgs),

    /// Combine each overlap group's triples into one, writing the merged
    /// stream.
    MergeOverlaps(commands::merge_overlaps::MergeOverlapsArgs),

    /// Deduplicate a merged stream against the run's original input by
    /// triple key, keeping the higher frequency of any duplicate.
    MergeWithOriginal(commands::merge_with_original::MergeWithOriginalArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .finish()
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Disambiguate(args) => commands::disambiguate::run(args),
        Commands::PrepareMergeData(args) => commands::prepare::run(args),
        Commands::FindOverlaps(args) => commands::find_overlaps::run(args),
        Commands::MergeOverlaps(args) => commands::merge_overlaps::run(args),
        Commands::MergeWithOriginal(args) => commands::merge_with_original::run(args),
    }
}
