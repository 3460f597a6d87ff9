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

//! Journaled façade over accounts, code and per-account storage (§4.3),
//! generalized from the block-level `StateDB` in `state_db.rs` to the
//! per-transaction checkpoint stack this spec requires.

use crate::account::Account;
use crate::account_cache::AccountCache;
use crate::backend::{MemoryTrie, Trie};
use ethereum_types::{Address, BigEndianHash, H256, U256};
use std::collections::HashMap;
use std::sync::Arc;

/// Errors surfaced by the StateManager; host-level failures (§7 band 3)
/// that the CallDispatcher propagates to its caller as `Internal`.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The backing trie reported corruption or an I/O failure.
    Backend(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Backend(msg) => write!(f, "state backend error: {msg}"),
        }
    }
}
impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

fn account_key(address: &Address) -> Vec<u8> {
    keccak_hash::keccak(address.as_bytes()).as_bytes().to_vec()
}

fn storage_key(key: &H256) -> Vec<u8> {
    keccak_hash::keccak(key.as_bytes()).as_bytes().to_vec()
}

/// Journaled world state: the top-level trie maps `keccak256(address) ->
/// rlp(Account)`; each account with non-default `storage_root` owns a
/// `MemoryTrie` mapping `keccak256(key) -> rlp(value)`; code is stored
/// separately, content-addressed by `codeHash` (§6 "Persisted state layout").
pub struct StateManager {
    accounts_trie: MemoryTrie,
    cache: AccountCache,
    storage_tries: HashMap<Address, MemoryTrie>,
    code: HashMap<H256, Arc<Vec<u8>>>,
    checkpoint_depth: usize,
}

impl StateManager {
    /// An empty world state.
    pub fn new() -> Self {
        StateManager {
            accounts_trie: MemoryTrie::new(),
            cache: AccountCache::new(),
            storage_tries: HashMap::new(),
            code: HashMap::new(),
            checkpoint_depth: 0,
        }
    }

    fn load_from_trie(&self, address: &Address) -> Account {
        match self.accounts_trie.get(&account_key(address)) {
            Some(bytes) => {
                let rlp = rlp::Rlp::new(&bytes);
                Account::decode(&rlp).unwrap_or_else(|_| Account::non_existent())
            }
            None => Account::non_existent(),
        }
    }

    /// Cache-first, trie-fallback read; an address never touched becomes an
    /// empty non-existing `Account` (§4.3 `get_account`).
    pub fn get_account(&mut self, address: &Address) -> Account {
        if let Some(entry) = self.cache.get(address) {
            return entry.value.clone().unwrap_or_else(Account::non_existent);
        }
        let loaded = self.load_from_trie(address);
        self.cache.insert_clean(*address, Some(loaded.clone()));
        loaded
    }

    /// Marks `account` dirty in the cache; does not write through (§4.3 `put_account`).
    pub fn put_account(&mut self, address: Address, account: Account) {
        self.cache.set(address, account);
    }

    pub fn get_balance(&mut self, address: &Address) -> U256 {
        self.get_account(address).balance
    }

    pub fn put_balance(&mut self, address: &Address, balance: U256) {
        let mut account = self.get_account(address);
        account.balance = balance;
        account.exists = true;
        self.put_account(*address, account);
    }

    pub fn add_balance(&mut self, address: &Address, amount: U256) {
        let balance = self.get_balance(address);
        self.put_balance(address, balance + amount);
    }

    pub fn sub_balance(&mut self, address: &Address, amount: U256) {
        let balance = self.get_balance(address);
        self.put_balance(address, balance - amount);
    }

    pub fn get_nonce(&mut self, address: &Address) -> u64 {
        self.get_account(address).nonce
    }

    pub fn put_nonce(&mut self, address: &Address, nonce: u64) {
        let mut account = self.get_account(address);
        account.nonce = nonce;
        account.exists = true;
        self.put_account(*address, account);
    }

    pub fn inc_nonce(&mut self, address: &Address) {
        let nonce = self.get_nonce(address);
        self.put_nonce(address, nonce + 1);
    }

    /// Code is content-addressed; an account whose `code_hash` is the empty
    /// hash has no code (§4.3 `get_code`).
    pub fn get_code(&mut self, address: &Address) -> Arc<Vec<u8>> {
        let hash = self.get_account(address).code_hash;
        self.code.get(&hash).cloned().unwrap_or_else(|| Arc::new(Vec::new()))
    }

    pub fn code_hash(&mut self, address: &Address) -> H256 {
        self.get_account(address).code_hash
    }

    pub fn code_size(&mut self, address: &Address) -> usize {
        self.get_code(address).len()
    }

    /// Stores `code` content-addressed and updates the account's `codeHash`
    /// (§4.3 `put_code`).
    pub fn put_code(&mut self, address: &Address, code: Vec<u8>) {
        let hash = keccak_hash::keccak(&code);
        self.code.insert(hash, Arc::new(code));
        let mut account = self.get_account(address);
        account.code_hash = hash;
        account.exists = true;
        self.put_account(*address, account);
    }

    /// Reads from the per-account storage trie; a key never written reads
    /// as zero (§4.3 `get_storage`).
    pub fn get_storage(&mut self, address: &Address, key: &H256) -> H256 {
        let trie = self.storage_tries.entry(*address).or_insert_with(MemoryTrie::new);
        match trie.get(&storage_key(key)) {
            Some(bytes) => {
                let rlp = rlp::Rlp::new(&bytes);
                rlp.as_val::<U256>().map(|v| H256::from_uint(&v)).unwrap_or_else(|_| H256::zero())
            }
            None => H256::zero(),
        }
    }

    /// A zero `value` deletes the key (§3 Storage, §4.3 `put_storage`).
    pub fn put_storage(&mut self, address: &Address, key: H256, value: H256) {
        let trie = self.storage_tries.entry(*address).or_insert_with(MemoryTrie::new);
        if value.is_zero() {
            trie.del(&storage_key(&key));
        } else {
            trie.put(&storage_key(&key), rlp::encode(&value.into_uint()).to_vec());
        }
        let root = trie.root();
        let mut account = self.get_account(address);
        account.storage_root = root;
        account.exists = true;
        self.put_account(*address, account);
    }

    /// Pushes a snapshot of the AccountCache, the accounts trie and every
    /// live storage trie, keeping their depths equal to the number of live
    /// frames (§4.3 invariant).
    pub fn checkpoint(&mut self) {
        self.cache.checkpoint();
        self.accounts_trie.checkpoint();
        for trie in self.storage_tries.values_mut() {
            trie.checkpoint();
        }
        self.checkpoint_depth += 1;
    }

    /// Discards the top snapshot, keeping its writes (§4.3 `commit`).
    pub fn commit(&mut self) {
        self.cache.commit();
        self.accounts_trie.commit();
        for trie in self.storage_tries.values_mut() {
            trie.commit();
        }
        self.checkpoint_depth = self.checkpoint_depth.saturating_sub(1);
    }

    /// Pops the top snapshot, undoing cache and trie writes since the
    /// matching checkpoint (§4.3 `revert`).
    pub fn revert(&mut self) {
        self.cache.revert();
        self.accounts_trie.revert();
        for trie in self.storage_tries.values_mut() {
            trie.revert();
        }
        self.checkpoint_depth = self.checkpoint_depth.saturating_sub(1);
    }

    /// Current checkpoint nesting depth.
    pub fn checkpoint_depth(&self) -> usize {
        self.checkpoint_depth
    }

    /// Serializes every dirty cache entry into the accounts trie. An
    /// account that is `exists = false` and empty (never became non-empty)
    /// is discarded rather than written (§4.3 invariant on newborn empties).
    pub fn flush(&mut self) -> H256 {
        for address in self.cache.modified_addresses() {
            match self.cache.get(&address).and_then(|e| e.value.clone()) {
                Some(account) if !(!account.exists && account.is_empty()) => {
                    self.accounts_trie
                        .put(&account_key(&address), account.rlp_bytes());
                }
                _ => {
                    self.accounts_trie.del(&account_key(&address));
                }
            }
        }
        self.accounts_trie.root()
    }

    /// Root of the top-level accounts trie as of the last `flush`.
    pub fn root(&self) -> H256 {
        self.accounts_trie.root()
    }

    pub fn exists(&mut self, address: &Address) -> bool {
        self.get_account(address).exists
    }

    pub fn is_empty(&mut self, address: &Address) -> bool {
        self.get_account(address).is_empty()
    }
}

impl Default for StateManager {
    fn default() -> Self {
        StateManager::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_revert_is_state_identity() {
        let mut s = StateManager::new();
        s.put_balance(&Address::from_low_u64_be(1), U256::from(100));
        s.checkpoint();
        s.put_balance(&Address::from_low_u64_be(1), U256::from(999));
        s.put_balance(&Address::from_low_u64_be(2), U256::from(1));
        s.revert();
        assert_eq!(s.get_balance(&Address::from_low_u64_be(1)), U256::from(100));
        assert!(!s.exists(&Address::from_low_u64_be(2)));
    }

    #[test]
    fn checkpoint_commit_keeps_writes() {
        let mut s = StateManager::new();
        s.checkpoint();
        s.put_balance(&Address::from_low_u64_be(1), U256::from(50));
        s.commit();
        assert_eq!(s.get_balance(&Address::from_low_u64_be(1)), U256::from(50));
    }

    #[test]
    fn storage_round_trip_nonzero_then_zero_clears() {
        let mut s = StateManager::new();
        let addr = Address::from_low_u64_be(9);
        let key = H256::from_low_u64_be(1);
        s.put_storage(&addr, key, H256::from_low_u64_be(42));
        assert_eq!(s.get_storage(&addr, &key), H256::from_low_u64_be(42));
        s.put_storage(&addr, key, H256::zero());
        assert_eq!(s.get_storage(&addr, &key), H256::zero());
    }

    #[test]
    fn nested_checkpoints_compose() {
        let mut s = StateManager::new();
        let addr = Address::from_low_u64_be(1);
        s.checkpoint(); // c
        s.checkpoint(); // c
        s.put_balance(&addr, U256::from(7)); // w
        s.revert(); // r
        s.checkpoint(); // c
        assert!(!s.exists(&addr));
    }
}
