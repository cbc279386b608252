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

//! Default values for fields that `#[serde(default = "...")]` points at,
//! following the same per-struct namespacing this codebase uses for its own
//! entry-point configs.

pub struct Delimiters;
impl Delimiters {
    pub fn arg() -> u8 {
        0xF5
    }
    pub fn pos() -> u8 {
        0xFE
    }
    pub fn term_nodes() -> u8 {
        0xFD
    }
    pub fn node_node() -> u8 {
        0xFC
    }
    pub fn node_score() -> u8 {
        0xFB
    }
    pub fn array() -> u8 {
        0xF4
    }
    pub fn bucket_id() -> u8 {
        0xF3
    }
    pub fn bucket_line() -> u8 {
        0xF2
    }
}

pub struct Solver;
impl Solver {
    pub fn depth() -> u32 {
        2
    }
    pub fn try_lca() -> bool {
        false
    }
    pub fn parallel() -> bool {
        false
    }
}

pub struct Merge;
impl Merge {
    /// `4096 * 256` entries, matching the reference implementation's
    /// pattern-index cache budget.
    pub fn cache_capacity() -> usize {
        4096 * 256
    }
    pub fn max_sets() -> usize {
        3000
    }
    pub fn passes() -> usize {
        5
    }
    pub fn max_comb() -> usize {
        2
    }
    pub fn progress_every() -> u64 {
        10_000
    }
}
