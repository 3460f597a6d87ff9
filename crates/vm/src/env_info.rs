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

//! Block context available to a running frame (`BLOCKHASH`, `COINBASE`, ...).

use ethereum_types::{Address, H256, U256};

/// How far back `BLOCKHASH` may look.
pub const LAST_BLOCK_HASHES: u64 = 256;

/// Block context, supplied once per transaction/block by the external
/// collaborator that owns block-level validation (out of scope here).
#[derive(Debug, Clone)]
pub struct EnvInfo {
    /// Current block number.
    pub number: u64,
    /// Beneficiary of gas fees and block rewards.
    pub author: Address,
    /// Block timestamp, seconds since epoch.
    pub timestamp: u64,
    /// Block difficulty.
    pub difficulty: U256,
    /// Block gas limit.
    pub gas_limit: U256,
    /// Hashes of the last 256 blocks, most recent last.
    pub last_hashes: Vec<H256>,
    /// Cumulative gas used by all transactions applied so far in this block.
    pub gas_used: U256,
}

impl EnvInfo {
    /// Block hash for `number`, valid only for `[current - 256, current - 1]`;
    /// zero otherwise (§4.3 `get_block_hash`).
    pub fn block_hash(&self, number: u64) -> H256 {
        if number >= self.number {
            return H256::zero();
        }
        let distance = self.number - number;
        if distance == 0 || distance > LAST_BLOCK_HASHES {
            return H256::zero();
        }
        let idx = self.last_hashes.len().checked_sub(distance as usize);
        match idx {
            Some(i) => self.last_hashes.get(i).copied().unwrap_or_else(H256::zero),
            None => H256::zero(),
        }
    }
}

impl Default for EnvInfo {
    fn default() -> Self {
        EnvInfo {
            number: 0,
            author: Address::zero(),
            timestamp: 0,
            difficulty: U256::zero(),
            gas_limit: U256::zero(),
            last_hashes: Vec::new(),
            gas_used: U256::zero(),
        }
    }
}
