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

//! Caches the set of valid `JUMPDEST` positions per contract code, keyed by
//! code hash, so repeated calls into the same contract don't re-scan it
//! (§4.1 JumpAnalysis).

use bit_set::BitSet;
use ethereum_types::H256;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::instructions::Instruction;

const DEFAULT_CACHE_SIZE: usize = 4 * 1024;

/// Process-wide cache of JUMPDEST analysis results, shared across all
/// `Interpreter` instances via `Arc`.
pub struct SharedCache {
    jump_destinations: Mutex<lru_cache::LruCache<H256, Arc<BitSet>>>,
}

impl Default for SharedCache {
    fn default() -> Self {
        SharedCache::new(DEFAULT_CACHE_SIZE)
    }
}

impl SharedCache {
    pub fn new(cache_items: usize) -> Self {
        SharedCache {
            jump_destinations: Mutex::new(lru_cache::LruCache::new(cache_items)),
        }
    }

    /// Valid `JUMPDEST` positions for `code`, computed once per `code_hash`
    /// and cached thereafter. A `None` hash (code supplied inline, with no
    /// stable identity) bypasses the cache entirely.
    pub fn jump_destinations(&self, code_hash: &Option<H256>, code: &[u8]) -> Arc<BitSet> {
        match code_hash {
            Some(hash) if hash != &vm::empty_code_hash() => {
                let mut cache = self.jump_destinations.lock();
                if let Some(hit) = cache.get_mut(hash) {
                    return hit.clone();
                }
                let analysis = Arc::new(Self::analyze(code));
                cache.insert(*hash, analysis.clone());
                analysis
            }
            _ => Arc::new(Self::analyze(code)),
        }
    }

    fn analyze(code: &[u8]) -> BitSet {
        let mut jump_dests = BitSet::with_capacity(code.len());
        let mut position = 0;
        while position < code.len() {
            let opcode = code[position];
            if let Some(instruction) = Instruction::from_u8(opcode) {
                if instruction == Instruction::JUMPDEST {
                    jump_dests.insert(position);
                }
                position += 1 + instruction.push_bytes();
            } else {
                position += 1;
            }
        }
        jump_dests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_jumpdest_not_inside_push_data() {
        // PUSH1 0x5b, JUMPDEST: only position 2 is a real JUMPDEST.
        let code = [0x60, 0x5b, 0x5b];
        let cache = SharedCache::default();
        let dests = cache.jump_destinations(&None, &code);
        assert!(!dests.contains(1));
        assert!(dests.contains(2));
    }

    #[test]
    fn repeated_lookup_by_hash_is_cached() {
        let code = [0x5b, 0x00];
        let cache = SharedCache::default();
        let hash = keccak_hash::keccak(&code[..]);
        let first = cache.jump_destinations(&Some(hash), &code);
        let second = cache.jump_destinations(&Some(hash), &code);
        assert!(Arc::ptr_eq(&first, &second));
    }
}
