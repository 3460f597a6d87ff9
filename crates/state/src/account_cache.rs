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

//! Write-back cache of account records (§4.4), adapted from the block-level
//! `StateDB` cache in `state_db.rs` to a per-transaction checkpoint stack
//! (the teacher's `AccountCache` there is keyed by block hash for
//! fork-awareness; this one is keyed purely by nesting depth, per
//! `spec.md` §4.3's "Checkpoint stack in the StateManager matches the
//! call-frame nesting").

use crate::account::Account;
use ethereum_types::Address;
use std::collections::HashMap;

/// A single cached account record plus its write-back bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached value, or `None` if the account is queued for deletion.
    pub value: Option<Account>,
    /// Whether this entry has been written since being loaded.
    pub modified: bool,
}

/// One journal entry: the key touched and its value immediately before the
/// touching write, so `revert` can restore it in O(1) per entry (§9 Design
/// Notes: "a journal of (key, previousEntry) entries ... replayed in
/// reverse on revert").
struct JournalEntry {
    address: Address,
    previous: Option<CacheEntry>,
}

/// Map `Address -> CacheEntry` with a stack of checkpoints (§4.4).
#[derive(Default)]
pub struct AccountCache {
    cache: HashMap<Address, CacheEntry>,
    checkpoints: Vec<Vec<JournalEntry>>,
}

impl AccountCache {
    /// An empty cache with no open checkpoints.
    pub fn new() -> Self {
        AccountCache {
            cache: HashMap::new(),
            checkpoints: Vec::new(),
        }
    }

    /// Depth of the checkpoint stack; must track the call-frame nesting depth.
    pub fn checkpoint_depth(&self) -> usize {
        self.checkpoints.len()
    }

    /// The cached entry for `address`, if present.
    pub fn get(&self, address: &Address) -> Option<&CacheEntry> {
        self.cache.get(address)
    }

    /// Insert a freshly loaded (not-yet-modified) entry. Used by
    /// `get_or_load` once the trie fallback has produced a value.
    pub fn insert_clean(&mut self, address: Address, account: Option<Account>) {
        // A clean load is not itself a journaled write: if the transaction
        // reverts past this point there is nothing to undo, since nothing
        // was yet mutated relative to backing storage.
        self.cache.entry(address).or_insert(CacheEntry {
            value: account,
            modified: false,
        });
    }

    /// Write `account` into the cache, marking it modified and journaling
    /// the previous value for revert.
    pub fn set(&mut self, address: Address, account: Account) {
        self.journal(address);
        self.cache.insert(
            address,
            CacheEntry {
                value: Some(account),
                modified: true,
            },
        );
    }

    /// Queue `address` for deletion on flush.
    pub fn remove(&mut self, address: Address) {
        self.journal(address);
        self.cache.insert(
            address,
            CacheEntry {
                value: None,
                modified: true,
            },
        );
    }

    fn journal(&mut self, address: Address) {
        if let Some(top) = self.checkpoints.last_mut() {
            top.push(JournalEntry {
                address,
                previous: self.cache.get(&address).cloned(),
            });
        }
    }

    /// Push a new checkpoint (§4.3 `checkpoint`).
    pub fn checkpoint(&mut self) {
        self.checkpoints.push(Vec::new());
    }

    /// Discard the top checkpoint, keeping all writes made under it (§4.3 `commit`).
    pub fn commit(&mut self) {
        self.checkpoints.pop();
    }

    /// Pop the top checkpoint, restoring every entry it journaled to its
    /// pre-checkpoint value (§4.3 `revert`).
    pub fn revert(&mut self) {
        if let Some(entries) = self.checkpoints.pop() {
            for entry in entries.into_iter().rev() {
                match entry.previous {
                    Some(prev) => {
                        self.cache.insert(entry.address, prev);
                    }
                    None => {
                        self.cache.remove(&entry.address);
                    }
                }
            }
        }
    }

    /// All addresses with a live, non-deleted record — the write-back set
    /// on `flush`.
    pub fn modified_addresses(&self) -> Vec<Address> {
        self.cache
            .iter()
            .filter(|(_, e)| e.modified)
            .map(|(a, _)| *a)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::U256;

    fn addr(n: u8) -> Address {
        Address::from_low_u64_be(n as u64)
    }

    #[test]
    fn checkpoint_then_revert_is_identity() {
        let mut cache = AccountCache::new();
        cache.insert_clean(addr(1), Some(Account::new_basic(U256::from(5), 0)));
        cache.checkpoint();
        cache.set(addr(1), Account::new_basic(U256::from(99), 1));
        cache.set(addr(2), Account::new_basic(U256::from(1), 0));
        cache.revert();
        assert_eq!(cache.get(&addr(1)).unwrap().value.as_ref().unwrap().balance, U256::from(5));
        assert!(cache.get(&addr(2)).is_none());
    }

    #[test]
    fn checkpoint_then_commit_keeps_writes() {
        let mut cache = AccountCache::new();
        cache.checkpoint();
        cache.set(addr(1), Account::new_basic(U256::from(5), 0));
        cache.commit();
        assert_eq!(cache.get(&addr(1)).unwrap().value.as_ref().unwrap().balance, U256::from(5));
    }

    #[test]
    fn nested_checkpoints_compose() {
        let mut cache = AccountCache::new();
        cache.checkpoint(); // c
        cache.checkpoint(); // c
        cache.set(addr(1), Account::new_basic(U256::from(7), 0)); // w
        cache.revert(); // r
        cache.checkpoint(); // c
        assert!(cache.get(&addr(1)).is_none());
    }
}
