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

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use config::{DelimiterConfig, MergeConfig};
use kv::{Kv, RocksDbStore};

use crate::error::{Error, Result};

/// In-memory write buffer for the pattern index, explicit rather than
/// hidden behind a global so its size and flush point are visible at the
/// call site.
struct Cache {
    entries: HashMap<String, Vec<(u64, String)>>,
    len: usize,
    capacity: usize,
}

impl Cache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            len: 0,
            capacity,
        }
    }

    fn insert(&mut self, pattern: String, triple_id: u64, line: String) {
        self.entries.entry(pattern).or_default().push((triple_id, line));
        self.len += 1;
    }

    fn is_full(&self) -> bool {
        self.len >= self.capacity
    }

    fn drain(&mut self) -> HashMap<String, Vec<(u64, String)>> {
        self.len = 0;
        std::mem::take(&mut self.entries)
    }
}

fn encode_bucket(records: &[(u64, String)], delims: &DelimiterConfig) -> Vec<u8> {
    let mut joined = Vec::new();
    for (i, (id, line)) in records.iter().enumerate() {
        if i > 0 {
            joined.push(delims.bucket_line);
        }
        joined.extend_from_slice(id.to_string().as_bytes());
        joined.push(delims.bucket_id);
        joined.extend_from_slice(line.as_bytes());
    }
    lz4_flex::compress_prepend_size(&joined)
}

fn decode_bucket(compressed: &[u8], delims: &DelimiterConfig) -> Result<Vec<(u64, String)>> {
    let raw = lz4_flex::decompress_size_prepended(compressed)
        .map_err(|e| Error::CorruptBucket(e.to_string()))?;
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    raw.split(|&b| b == delims.bucket_line)
        .map(|record| {
            let at = record
                .iter()
                .position(|&b| b == delims.bucket_id)
                .ok_or_else(|| Error::CorruptBucket("record has no id delimiter".to_string()))?;
            let id: u64 = String::from_utf8_lossy(&record[..at])
                .parse()
                .map_err(|_| Error::CorruptBucket("non-numeric triple id".to_string()))?;
            let line = String::from_utf8_lossy(&record[at + 1..]).into_owned();
            Ok((id, line))
        })
        .collect()
}

/// Persistent key-value store mapping a triple pattern (§3) to the
/// compressed list of `(triple_id, original_line)` records sharing it.
/// Writes are buffered in a [`Cache`] and flushed in one batch per pattern
/// once the cache fills, matching the reference implementation's
/// read-append-recompress-write cycle.
pub struct PatternIndex {
    store: RocksDbStore<String, Vec<u8>>,
    cache: Mutex<Cache>,
    delims: DelimiterConfig,
}

impl PatternIndex {
    pub fn open<P: AsRef<Path>>(path: P, delims: DelimiterConfig, config: &MergeConfig) -> Self {
        Self {
            store: RocksDbStore::open(path),
            cache: Mutex::new(Cache::new(config.cache_capacity)),
            delims,
        }
    }

    /// Buffers `line` under `pattern`, flushing the whole cache once it
    /// reaches its configured capacity.
    pub fn insert(&self, pattern: String, triple_id: u64, line: String) {
        let should_flush = {
            let mut cache = self.cache.lock().unwrap();
            cache.insert(pattern, triple_id, line);
            cache.is_full()
        };
        if should_flush {
            self.flush();
        }
    }

    /// Flushes every buffered pattern's records to disk: read the existing
    /// compressed bucket (if any), append, recompress, write back.
    pub fn flush(&self) {
        let drained = self.cache.lock().unwrap().drain();
        for (pattern, mut new_records) in drained {
            let mut existing = self.read_raw(&pattern).unwrap_or_default();
            existing.append(&mut new_records);
            let encoded = encode_bucket(&existing, &self.delims);
            self.store.insert(pattern, encoded);
        }
        self.store.flush();
    }

    fn read_raw(&self, pattern: &str) -> Option<Vec<(u64, String)>> {
        let bytes = self.store.get(&pattern.to_string())?;
        decode_bucket(&bytes, &self.delims).ok()
    }

    /// Returns the bucket for `pattern` as a `triple_id -> original line`
    /// map, or `None` if no such bucket exists. A missing bucket is a
    /// normal outcome for the caller to handle, not an error.
    pub fn get_bucket(&self, pattern: &str) -> Option<HashMap<u64, String>> {
        self.read_raw(pattern).map(|records| records.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_flush_then_read_back() {
        let mut config = MergeConfig::default();
        config.cache_capacity = 1000;
        let index = PatternIndex::open(stdx::gen_temp_path(), DelimiterConfig::default(), &config);

        index.insert("subj_verb_NN_bark_*".to_string(), 1, "line-one".to_string());
        index.insert("subj_verb_NN_bark_*".to_string(), 2, "line-two".to_string());
        assert!(index.get_bucket("subj_verb_NN_bark_*").is_none());

        index.flush();

        let bucket = index.get_bucket("subj_verb_NN_bark_*").unwrap();
        assert_eq!(bucket.get(&1).map(String::as_str), Some("line-one"));
        assert_eq!(bucket.get(&2).map(String::as_str), Some("line-two"));
        assert!(index.get_bucket("no_such_pattern").is_none());
    }

    #[test]
    fn flush_appends_to_an_existing_bucket_rather_than_overwriting() {
        let config = MergeConfig::default();
        let index = PatternIndex::open(stdx::gen_temp_path(), DelimiterConfig::default(), &config);

        index.insert("p".to_string(), 1, "a".to_string());
        index.flush();
        index.insert("p".to_string(), 2, "b".to_string());
        index.flush();

        let bucket = index.get_bucket("p").unwrap();
        assert_eq!(bucket.len(), 2);
    }

    #[test]
    fn cache_auto_flushes_once_capacity_is_reached() {
        let mut config = MergeConfig::default();
        config.cache_capacity = 2;
        let index = PatternIndex::open(stdx::gen_temp_path(), DelimiterConfig::default(), &config);

        index.insert("p".to_string(), 1, "a".to_string());
        assert!(index.get_bucket("p").is_none());
        index.insert("p".to_string(), 2, "b".to_string());

        assert_eq!(index.get_bucket("p").unwrap().len(), 2);
    }
}
