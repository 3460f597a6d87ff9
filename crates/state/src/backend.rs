// Copyright 2015-2020 Parity Technologies (UK) Ltd.
// This file is part of OpenEthereum.

// OpenEthereum is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// OpenEthereum is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with OpenEthereum.  If not, see <http://www.gnu.org/licenses/>.

//! The Trie external collaborator (§4.6): an opaque key-value store with
//! its own checkpoint/commit/revert stack and a Merkle-root-shaped `root`
//! field. Block-level validation, the real Merkle-Patricia-trie encoding,
//! and the on-disk journal database are all out of scope (§1); this module
//! defines the contract and a deterministic in-memory stand-in so that
//! `StateManager` has something concrete to drive in tests.

use ethereum_types::H256;
use std::collections::{BTreeMap, HashMap};

/// Opaque key-value trie, checkpointed in lockstep with the AccountCache
/// (§4.3 invariant: "depth of the AccountCache's checkpoint stack equals
/// the depth of the trie's checkpoint stack").
pub trait Trie {
    /// Current Merkle root.
    fn root(&self) -> H256;
    /// Fetch a value by key.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;
    /// Insert or overwrite a value.
    fn put(&mut self, key: &[u8], value: Vec<u8>);
    /// Remove a key.
    fn del(&mut self, key: &[u8]);
    /// Push a snapshot.
    fn checkpoint(&mut self);
    /// Discard the top snapshot, keeping changes.
    fn commit(&mut self);
    /// Pop the top snapshot, undoing changes made since the matching checkpoint.
    fn revert(&mut self);
}

/// A `BTreeMap`-backed `Trie`. Not a real Merkle-Patricia trie: `root()` is
/// a deterministic keccak256 over the sorted key/value pairs, which is
/// sufficient to satisfy the external-collaborator contract (§4.6: "Keys
/// and values are byte strings") without pulling in a production trie
/// implementation, which `spec.md` §1 places out of scope.
#[derive(Default, Clone)]
pub struct MemoryTrie {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    journal: Vec<HashMap<Vec<u8>, Option<Vec<u8>>>>,
}

impl MemoryTrie {
    /// An empty trie.
    pub fn new() -> Self {
        MemoryTrie {
            data: BTreeMap::new(),
            journal: Vec::new(),
        }
    }

    fn record(&mut self, key: &[u8]) {
        let existing = self.data.get(key).cloned();
        if let Some(top) = self.journal.last_mut() {
            top.entry(key.to_vec()).or_insert_with(|| existing);
        }
    }
}

impl Trie for MemoryTrie {
    fn root(&self) -> H256 {
        let mut stream = rlp::RlpStream::new_list(self.data.len());
        for (k, v) in &self.data {
            stream.begin_list(2);
            stream.append(k);
            stream.append(v);
        }
        keccak_hash::keccak(stream.out())
    }

    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.get(key).cloned()
    }

    fn put(&mut self, key: &[u8], value: Vec<u8>) {
        self.record(key);
        self.data.insert(key.to_vec(), value);
    }

    fn del(&mut self, key: &[u8]) {
        self.record(key);
        self.data.remove(key);
    }

    fn checkpoint(&mut self) {
        self.journal.push(HashMap::new());
    }

    fn commit(&mut self) {
        if let Some(top) = self.journal.pop() {
            // Merge into the parent checkpoint (if any) so an outer revert
            // still undoes writes made by a committed child checkpoint.
            if let Some(parent) = self.journal.last_mut() {
                for (k, v) in top {
                    parent.entry(k).or_insert(v);
                }
            }
        }
    }

    fn revert(&mut self) {
        if let Some(top) = self.journal.pop() {
            for (k, prev) in top {
                match prev {
                    Some(v) => {
                        self.data.insert(k, v);
                    }
                    None => {
                        self.data.remove(&k);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_revert_is_state_identity() {
        let mut t = MemoryTrie::new();
        t.put(b"a", b"1".to_vec());
        let root_before = t.root();
        t.checkpoint();
        t.put(b"a", b"2".to_vec());
        t.put(b"b", b"3".to_vec());
        t.revert();
        assert_eq!(t.root(), root_before);
        assert_eq!(t.get(b"a"), Some(b"1".to_vec()));
        assert_eq!(t.get(b"b"), None);
    }

    #[test]
    fn nested_checkpoints_compose() {
        let mut t = MemoryTrie::new();
        t.checkpoint(); // c
        t.checkpoint(); // c
        t.put(b"a", b"1".to_vec()); // w
        t.revert(); // r
        t.checkpoint(); // c
        assert_eq!(t.get(b"a"), None);
    }
}
