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

//! The [`Triple`] value type, its bucket [`Triple::pattern`], and the
//! delimited-text wire codec that reads and writes it (§6). No NLP tagging
//! or lemmatization happens here: triples arrive already tagged.

pub mod arg;
pub mod codec;
pub mod error;
pub mod triple;
pub mod vocab;

pub use arg::Arg;
pub use codec::{decode_triple, encode_triple};
pub use error::{Error, Result};
pub use triple::Triple;
pub use vocab::Vocabularies;
