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

//! Journaled world state: accounts, per-account storage, code and the logs
//! bloom filter, generalized from `ethcore`'s `pod_account.rs`/`state_db.rs`
//! to the checkpoint-stack model spec §4.3 requires.

pub mod account;
pub mod account_cache;
pub mod backend;
pub mod bloom;
pub mod state_manager;
pub mod substate;

pub use account::{empty_storage_root, Account};
pub use account_cache::{AccountCache, CacheEntry};
pub use backend::{MemoryTrie, Trie};
pub use bloom::Bloom;
pub use state_manager::{Error, Result, StateManager};
pub use substate::{LogEntry, Substate};
