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

//! Homestead-era EVM interpreter and journaled state store.
//!
//! `EvmCore` ties the five sub-crates together behind the four entry
//! points named in §6: `run_code` (bare bytecode, no call semantics),
//! `run_call`/`run_create` (one message call or creation), `run_tx`
//! (a whole signed transaction) and `run_block` (a sequence of
//! transactions plus miner/ommer rewards).

pub use account_state::{Bloom, LogEntry, StateManager, Substate};
pub use ethcore_executive::{
    run_block, run_tx, Block, BlockOutcome, Error, Executive, Informant, LoggingInformant,
    NoopInformant, OmmerHeader, SignedTransaction, TransactOutcome,
};
pub use vm::{
    ActionParams, ActionValue, CallType, ContractCreateResult, CreateContractAddress, EnvInfo,
    Exec, GasLeft, MessageCallResult, ParamsType, ReturnData, Schedule,
};

use std::sync::Arc;

/// Ambient configuration wrapping a `Schedule`, mirroring the teacher's
/// `VmFactory`/`Factories` bundle (trimmed to the single EVM backend: this
/// crate has no WASM dispatch to factor out).
#[derive(Clone)]
pub struct EvmConfig {
    pub schedule: Schedule,
    cache: Arc<evm::SharedCache>,
}

impl Default for EvmConfig {
    fn default() -> Self {
        EvmConfig {
            schedule: Schedule::new_homestead(),
            cache: Arc::new(evm::SharedCache::default()),
        }
    }
}

impl EvmConfig {
    pub fn new(schedule: Schedule) -> Self {
        EvmConfig {
            schedule,
            cache: Arc::new(evm::SharedCache::default()),
        }
    }
}

/// Run bare bytecode as its own top-level frame, with no caller/value
/// semantics beyond what `params` already encodes. Exposed mainly for
/// testing the interpreter directly, the way `run_call` is layered on top
/// of it in the teacher's `Executive`.
pub fn run_code(
    config: &EvmConfig,
    state: &mut StateManager,
    env_info: &EnvInfo,
    params: ActionParams,
) -> vm::Result<MessageCallResult> {
    let mut executive = Executive::new(state, env_info, &config.schedule, config.cache.clone());
    let mut substate = Substate::new();
    executive.call(params, &mut substate)
}

/// Run one top-level message call.
pub fn run_call(
    config: &EvmConfig,
    state: &mut StateManager,
    env_info: &EnvInfo,
    params: ActionParams,
) -> vm::Result<MessageCallResult> {
    run_code(config, state, env_info, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_code_executes_a_trivial_program() {
        let mut state = StateManager::new();
        let env_info = EnvInfo::default();
        let config = EvmConfig::default();

        // PUSH1 42 PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN
        let code: Vec<u8> = vec![
            0x60, 0x2a, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xf3,
        ];
        let mut params = ActionParams::new();
        params.gas = ethereum_types::U256::from(1_000_000);
        params.code = Some(Arc::new(code));

        let result = run_code(&config, &mut state, &env_info, params).unwrap();
        match result {
            MessageCallResult::Success(_, data) => {
                assert_eq!(ethereum_types::U256::from_big_endian(&data), ethereum_types::U256::from(42));
            }
            other => panic!("expected Success, got {other:?}"),
        }
    }
}
