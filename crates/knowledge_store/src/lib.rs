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

//! Read-only facade over the four knowledge-graph indexes (label
//! dictionary, word search index, taxonomy, instance types) plus the
//! [`Node`]/[`NodeSet`] value types built on top of them.

pub mod error;
pub mod node;
pub mod node_set;
pub mod store;

pub use error::{Error, Result};
pub use node::Node;
pub use node_set::NodeSet;
pub use store::{
    ClassDict, ClassSearch, KnowledgeStore, MemoryStoreBuilder, RocksDbClassDict,
    RocksDbClassSearch, RocksDbTaxonomy, RocksDbTypes, Taxonomy, Types,
};
