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

//! Block-level application: run every transaction in order, then pay the
//! miner's block reward and uncle ("ommer") rewards. Block header
//! validation (PoW, difficulty, timestamp) and the P2P/database layers are
//! out of scope (§1): this is only the state-transition slice needed to
//! close the interpreter's contract.

use crate::transact::{run_tx, SignedTransaction, TransactOutcome};
use crate::{Error, Informant};
use account_state::{Bloom, StateManager};
use ethereum_types::{Address, H256, U256};
use vm::{EnvInfo, Schedule};

/// Frontier/Homestead block reward: 5 ether, in wei.
pub const BLOCK_REWARD: u64 = 5_000_000_000_000_000_000;

/// A block header reduced to the fields needed to run its body: its own
/// beneficiary/number (folded into `EnvInfo` for the transactions) plus the
/// uncle headers that earn a reward for being included.
pub struct Block {
    pub env_info: EnvInfo,
    pub transactions: Vec<SignedTransaction>,
    pub ommers: Vec<OmmerHeader>,
}

/// The fields of an included uncle header relevant to reward calculation.
pub struct OmmerHeader {
    pub number: u64,
    pub author: Address,
}

/// Outcome of applying one block.
pub struct BlockOutcome {
    pub receipts: Vec<TransactOutcome>,
    pub gas_used: U256,
    pub logs_bloom: Bloom,
    pub state_root: Option<H256>,
}

/// Ommer (uncle) reward for an uncle `height_diff` blocks below the
/// including block: `(8 - height_diff) * BLOCK_REWARD / 8`.
fn ommer_reward(height_diff: u64) -> U256 {
    U256::from(8u64.saturating_sub(height_diff)) * U256::from(BLOCK_REWARD) / U256::from(8)
}

/// Nibling reward: what the block's own miner earns per included uncle,
/// `BLOCK_REWARD / 32`.
fn nibling_reward() -> U256 {
    U256::from(BLOCK_REWARD) / U256::from(32)
}

/// Apply every transaction in `block` in order, then settle miner and
/// ommer rewards. When `generate` is true, flush the `StateManager` to
/// compute the resulting state root; callers replaying an existing block
/// to verify it can skip that by passing `generate: false`.
pub fn run_block(
    state: &mut StateManager,
    schedule: &Schedule,
    block: &Block,
    generate: bool,
    informant: &mut dyn Informant,
) -> Result<BlockOutcome, Error> {
    informant.before_block(block.env_info.number);

    let mut receipts = Vec::with_capacity(block.transactions.len());
    let mut gas_used = U256::zero();
    let mut logs_bloom = Bloom::new();
    for tx in &block.transactions {
        informant.before_tx(&tx.sender);
        let outcome = run_tx(state, &block.env_info, schedule, tx)?;
        gas_used += outcome.gas_used;
        logs_bloom.or(&outcome.logs_bloom);
        informant.after_tx(&outcome);
        receipts.push(outcome);
    }

    let mut miner_reward = U256::from(BLOCK_REWARD);
    miner_reward += nibling_reward() * U256::from(block.ommers.len());
    state.add_balance(&block.env_info.author, miner_reward);

    for ommer in &block.ommers {
        let height_diff = block.env_info.number.saturating_sub(ommer.number);
        state.add_balance(&ommer.author, ommer_reward(height_diff));
    }

    let state_root = if generate { Some(state.flush()) } else { None };

    informant.after_block(block.env_info.number, gas_used);

    Ok(BlockOutcome {
        receipts,
        gas_used,
        logs_bloom,
        state_root,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoopInformant;

    #[test]
    fn miner_reward_pays_beneficiary_with_no_transactions() {
        let mut state = StateManager::new();
        let schedule = Schedule::new_homestead();
        let author = Address::from_low_u64_be(42);
        let mut env_info = EnvInfo::default();
        env_info.author = author;
        let block = Block {
            env_info,
            transactions: Vec::new(),
            ommers: Vec::new(),
        };
        let mut informant = NoopInformant;
        let outcome = run_block(&mut state, &schedule, &block, false, &mut informant).unwrap();
        assert_eq!(outcome.gas_used, U256::zero());
        assert_eq!(state.get_balance(&author), U256::from(BLOCK_REWARD));
    }

    #[test]
    fn ommer_reward_scales_with_height_difference() {
        assert_eq!(ommer_reward(1), U256::from(BLOCK_REWARD) * U256::from(7) / U256::from(8));
        assert_eq!(ommer_reward(0), U256::from(BLOCK_REWARD));
    }
}
