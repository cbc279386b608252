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
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::PipelineConfig;

/// Opens `path` for buffered reading, or stdin when `path` is `None` — every
/// stream-consuming subcommand accepts either so it composes in a shell
/// pipeline the same way this codebase's other bulk entry points do.
pub fn open_input(path: &Option<PathBuf>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open input '{}'", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

/// Opens `path` for buffered writing, or stdout when `path` is `None`.
pub fn open_output(path: &Option<PathBuf>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create output '{}'", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}

/// Loads a [`PipelineConfig`] from `path`, or the all-defaults config when no
/// path is given — matching the way every other entry point in this
/// codebase wraps `toml` parse failures in `anyhow::Context`.
pub fn load_config(path: &Option<PathBuf>) -> Result<PipelineConfig> {
    match path {
        None => Ok(PipelineConfig::default()),
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config '{}'", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("failed to parse config '{}'", path.display()))
        }
    }
}

/// Loads the names set (§4.1.5) from a newline-delimited file, lower-cased
/// to match the way every other lemma lookup in this codebase normalizes
/// case. An absent path yields an empty set, disabling the fallback.
pub fn load_names(path: &Option<String>) -> Result<HashSet<String>> {
    match path {
        None => Ok(HashSet::new()),
        Some(path) => load_names_from(Path::new(path)),
    }
}

fn load_names_from(path: &Path) -> Result<HashSet<String>> {
    let file =
        File::open(path).with_context(|| format!("failed to open names file '{}'", path.display()))?;
    BufReader::new(file)
        .lines()
        .map(|line| Ok(line?.trim().to_lowercase()))
        .filter(|line: &Result<String>| !matches!(line, Ok(s) if s.is_empty()))
        .collect()
}
