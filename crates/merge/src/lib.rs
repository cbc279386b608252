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

//! The merging engine (§4.2): buckets disambiguated triples by syntactic
//! pattern, finds node-set overlaps across a bucket, combines the
//! overlapping triples into one, and (at the CLI boundary) deduplicates a
//! merged stream against the original input by triple key.

pub mod dedup;
pub mod error;
pub mod merger;
pub mod overlap;
pub mod pattern_index;

pub use dedup::{dedup_keep_max_frequency, triple_key};
pub use error::{Error, Result};
pub use merger::merge_triples;
pub use overlap::{find_overlaps, SlottedTriple};
pub use pattern_index::PatternIndex;
