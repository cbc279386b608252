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

//! Generic read/write key-value store used by both the knowledge store and
//! the pattern index. A single production backend (rocksdb) is provided;
//! anything implementing [`Kv`] works in its place.

pub mod rocksdb_store;

pub use rocksdb_store::RocksDbStore;

use serde::{de::DeserializeOwned, Serialize};

pub trait Kv<K, V>
where
    K: Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
    Self: Send + Sync,
{
    fn approx_len(&self) -> usize;
    fn get_raw(&self, key: &[u8]) -> Option<Vec<u8>>;
    fn insert_raw(&self, key: Vec<u8>, value: Vec<u8>);
    fn flush(&self);
    fn iter<'a>(&'a self) -> Box<dyn Iterator<Item = (K, V)> + 'a>;

    fn get(&self, key: &K) -> Option<V> {
        let key_bytes = bincode::serialize(key).expect("failed to serialize key");

        self.get_raw(&key_bytes).map(|bytes| {
            bincode::deserialize(&bytes).expect("failed to deserialize stored value")
        })
    }

    fn insert(&self, key: K, value: V) {
        let key_bytes = bincode::serialize(&key).expect("failed to serialize key");
        let val_bytes = bincode::serialize(&value).expect("failed to serialize value");

        self.insert_raw(key_bytes, val_bytes);
    }
}

/// An in-memory [`Kv`] backed by a `BTreeMap`, used in tests where standing
/// up a real rocksdb directory would be wasteful.
pub struct MemStore<K, V> {
    inner: std::sync::RwLock<std::collections::BTreeMap<Vec<u8>, Vec<u8>>>,
    _phantom: std::marker::PhantomData<(K, V)>,
}

impl<K, V> Default for MemStore<K, V> {
    fn default() -> Self {
        Self {
            inner: Default::default(),
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<K, V> Kv<K, V> for MemStore<K, V>
where
    K: Serialize + DeserializeOwned + Send + Sync,
    V: Serialize + DeserializeOwned + Send + Sync,
{
    fn approx_len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    fn get_raw(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.read().unwrap().get(key).cloned()
    }

    fn insert_raw(&self, key: Vec<u8>, value: Vec<u8>) {
        self.inner.write().unwrap().insert(key, value);
    }

    fn flush(&self) {}

    fn iter<'a>(&'a self) -> Box<dyn Iterator<Item = (K, V)> + 'a> {
        let snapshot: Vec<(Vec<u8>, Vec<u8>)> = self
            .inner
            .read()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Box::new(snapshot.into_iter().map(|(k, v)| {
            (
                bincode::deserialize(&k).expect("failed to deserialize key"),
                bincode::deserialize(&v).expect("failed to deserialize value"),
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mem_store_roundtrip() {
        let store: MemStore<String, u64> = MemStore::default();
        store.insert("alpha".to_string(), 42);
        assert_eq!(store.get(&"alpha".to_string()), Some(42));
        assert_eq!(store.get(&"beta".to_string()), None);
        assert_eq!(store.approx_len(), 1);
    }
}
