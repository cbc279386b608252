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

//! Typed, `toml`-deserialized configuration for every entry point: the wire
//! format's configurable delimiters, the disambiguation solver's knobs, and
//! the merging pipeline's cache/sampling parameters.

pub mod defaults;

/// The eight single-byte delimiters of the triple wire format and the
/// bucket store, gathered into one struct so a deployment can adapt to a
/// different upstream parser without touching code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DelimiterConfig {
    /// Separates a triple's top-level fields: relation, arguments, frequency.
    #[serde(default = "defaults::Delimiters::arg")]
    pub arg: u8,

    /// Separates an argument's term from its part-of-speech tag.
    #[serde(default = "defaults::Delimiters::pos")]
    pub pos: u8,

    /// Separates the term/pos pair from the first node-score pair.
    #[serde(default = "defaults::Delimiters::term_nodes")]
    pub term_nodes: u8,

    /// Separates successive node-score pairs.
    #[serde(default = "defaults::Delimiters::node_node")]
    pub node_node: u8,

    /// Separates a node from its score within a single pair.
    #[serde(default = "defaults::Delimiters::node_score")]
    pub node_score: u8,

    /// Separates elements of a node list stored as a single value in one of
    /// the four knowledge-store indexes.
    #[serde(default = "defaults::Delimiters::array")]
    pub array: u8,

    /// Separates a bucket record's triple-id from its original line.
    #[serde(default = "defaults::Delimiters::bucket_id")]
    pub bucket_id: u8,

    /// Separates successive bucket records.
    #[serde(default = "defaults::Delimiters::bucket_line")]
    pub bucket_line: u8,
}

impl Default for DelimiterConfig {
    fn default() -> Self {
        Self {
            arg: defaults::Delimiters::arg(),
            pos: defaults::Delimiters::pos(),
            term_nodes: defaults::Delimiters::term_nodes(),
            node_node: defaults::Delimiters::node_node(),
            node_score: defaults::Delimiters::node_score(),
            array: defaults::Delimiters::array(),
            bucket_id: defaults::Delimiters::bucket_id(),
            bucket_line: defaults::Delimiters::bucket_line(),
        }
    }
}

/// Knobs for [`disambiguate::MinClassDisambiguator`](../disambiguate/struct.MinClassDisambiguator.html).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SolverConfig {
    /// Taxonomy climbs bound, used by LCA generalization.
    #[serde(default = "defaults::Solver::depth")]
    pub depth: u32,

    /// Whether a bare single lemma with no direct label match falls back to
    /// LCA generalization instead of returning empty.
    #[serde(default = "defaults::Solver::try_lca")]
    pub try_lca: bool,

    /// Path to a newline-delimited file of surface forms treated as person
    /// names for the fallback rule. `None` disables the fallback.
    #[serde(default)]
    pub names_path: Option<String>,

    /// Shard the input triple stream across a `rayon` thread pool. Safe
    /// because every store lookup is read-only and each triple is
    /// independent; only the ordering guarantee is relaxed (output order no
    /// longer tracks input order when enabled).
    #[serde(default = "defaults::Solver::parallel")]
    pub parallel: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            depth: defaults::Solver::depth(),
            try_lca: defaults::Solver::try_lca(),
            names_path: None,
            parallel: defaults::Solver::parallel(),
        }
    }
}

/// Knobs for the pattern index and overlap finder.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MergeConfig {
    /// Number of buffered `(pattern, triple-id, line)` records before the
    /// pattern index flushes its write cache.
    #[serde(default = "defaults::Merge::cache_capacity")]
    pub cache_capacity: usize,

    /// Above this many distinct node-sets at a slot, the overlap finder
    /// switches from exhaustive pairwise intersection to randomized
    /// sampling.
    #[serde(default = "defaults::Merge::max_sets")]
    pub max_sets: usize,

    /// Number of independent random samples taken once `max_sets` is
    /// exceeded; their results are unioned.
    #[serde(default = "defaults::Merge::passes")]
    pub passes: usize,

    /// Largest combination size considered when enumerating node-set
    /// overlaps. The reference implementation hard-codes this at 2 despite
    /// comments suggesting otherwise; kept configurable but defaulted the
    /// same way.
    #[serde(default = "defaults::Merge::max_comb")]
    pub max_comb: usize,

    /// Log a progress line every this many triples processed.
    #[serde(default = "defaults::Merge::progress_every")]
    pub progress_every: u64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            cache_capacity: defaults::Merge::cache_capacity(),
            max_sets: defaults::Merge::max_sets(),
            passes: defaults::Merge::passes(),
            max_comb: defaults::Merge::max_comb(),
            progress_every: defaults::Merge::progress_every(),
        }
    }
}

/// The combined configuration a CLI entry point loads from a single `toml`
/// file: wire delimiters plus whichever of the solver/merge knobs that
/// entry point needs. Every field is independently defaultable, so a config
/// file only has to mention what it wants to override.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub delimiters: DelimiterConfig,

    #[serde(default)]
    pub solver: SolverConfig,

    #[serde(default)]
    pub merge: MergeConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            delimiters: DelimiterConfig::default(),
            solver: SolverConfig::default(),
            merge: MergeConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_config_defaults_match_wire_format() {
        let delims = DelimiterConfig::default();
        assert_eq!(delims.arg, 0xF5);
        assert_eq!(delims.pos, 0xFE);
        assert_eq!(delims.term_nodes, 0xFD);
        assert_eq!(delims.node_node, 0xFC);
        assert_eq!(delims.node_score, 0xFB);
        assert_eq!(delims.array, 0xF4);
        assert_eq!(delims.bucket_id, 0xF3);
        assert_eq!(delims.bucket_line, 0xF2);
    }

    #[test]
    fn solver_config_parses_from_toml_with_defaults() {
        let parsed: SolverConfig = toml::from_str(r#"names_path = "names.txt""#).unwrap();
        assert_eq!(parsed.depth, 2);
        assert!(!parsed.try_lca);
        assert_eq!(parsed.names_path.as_deref(), Some("names.txt"));
    }

    #[test]
    fn merge_config_overrides_are_respected() {
        let parsed: MergeConfig = toml::from_str("max_sets = 100\npasses = 2").unwrap();
        assert_eq!(parsed.max_sets, 100);
        assert_eq!(parsed.passes, 2);
        assert_eq!(parsed.cache_capacity, defaults::Merge::cache_capacity());
    }

    #[test]
    fn pipeline_config_is_fully_defaultable_from_an_empty_file() {
        let parsed: PipelineConfig = toml::from_str("").unwrap();
        assert_eq!(parsed.delimiters, DelimiterConfig::default());
        assert_eq!(parsed.solver.depth, defaults::Solver::depth());
        assert_eq!(parsed.merge.max_sets, defaults::Merge::max_sets());
    }

    #[test]
    fn pipeline_config_overrides_only_the_named_section() {
        let parsed: PipelineConfig = toml::from_str(
            r#"
            [solver]
            try_lca = true
            names_path = "names.txt"
            "#,
        )
        .unwrap();
        assert!(parsed.solver.try_lca);
        assert_eq!(parsed.delimiters, DelimiterConfig::default());
    }
}
