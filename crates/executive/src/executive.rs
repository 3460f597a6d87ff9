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

//! The call dispatcher: drives an `Interpreter` to completion, resolving
//! every CALL/CREATE trap by recursing into a child frame and feeding the
//! result back via `ResumeCall`/`ResumeCreate`.
//!
//! Every frame owns a `StateManager` checkpoint: a frame that fails or
//! reverts unwinds its own checkpoint and nothing more, which is what
//! gives each CALL/CREATE atomic-or-nothing semantics (§4.3's "journaled
//! façade" invariant, exercised across frames here rather than within the
//! state store itself).

use crate::externalities::{contract_address, Externalities, OriginInfo};
use account_state::{StateManager, Substate};
use ethereum_types::{Address, U256};
use std::sync::Arc;
use vm::{
    ActionParams, ActionValue, ContractCreateResult, Exec, GasLeft, MessageCallResult, ReturnData,
    Schedule, TrapError,
};

/// Drives frames against a single `StateManager`. One `Executive` outlives
/// the whole call tree of a transaction; `depth`/`static_flag` are threaded
/// through individual `run`/`run_create` calls rather than stored here, since
/// they change per-frame while the state and schedule do not.
pub struct Executive<'a> {
    state: &'a mut StateManager,
    env_info: &'a vm::EnvInfo,
    schedule: &'a Schedule,
    cache: Arc<evm::SharedCache>,
}

impl<'a> Executive<'a> {
    pub fn new(
        state: &'a mut StateManager,
        env_info: &'a vm::EnvInfo,
        schedule: &'a Schedule,
        cache: Arc<evm::SharedCache>,
    ) -> Self {
        Executive {
            state,
            env_info,
            schedule,
            cache,
        }
    }

    /// Entry point for a top-level message call (`run_call` / `run_tx`).
    pub fn call(
        &mut self,
        params: ActionParams,
        substate: &mut Substate,
    ) -> vm::Result<MessageCallResult> {
        self.run(params, substate, 0, false)
    }

    /// Entry point for a top-level contract creation.
    pub fn create(
        &mut self,
        params: ActionParams,
        substate: &mut Substate,
    ) -> vm::Result<ContractCreateResult> {
        let address = params.address;
        self.run_create(params, address, substate, 0, false)
    }

    /// Run one message-call frame to completion, recursing through
    /// `run`/`run_create` for every nested CALL/CREATE it traps on.
    fn run(
        &mut self,
        params: ActionParams,
        substate: &mut Substate,
        depth: usize,
        static_flag: bool,
    ) -> vm::Result<MessageCallResult> {
        if depth > self.schedule.max_depth {
            return Ok(MessageCallResult::Reverted(params.gas, ReturnData::empty()));
        }

        self.state.checkpoint();
        let outcome = self.execute_frame(params, substate, depth, static_flag);
        match &outcome {
            Ok(MessageCallResult::Success(_, _)) => self.state.commit(),
            _ => self.state.revert(),
        }
        outcome
    }

    /// Run a contract creation: the init-code runs as an ordinary frame, then
    /// its returned bytes are deposited as the new account's code, subject to
    /// the size limit and per-byte deposit cost (§4.2). The init-code's
    /// checkpoint is kept open across that check, since an oversize or
    /// under-funded deposit must still unwind the code that ran to produce it.
    fn run_create(
        &mut self,
        params: ActionParams,
        address: Address,
        substate: &mut Substate,
        depth: usize,
        static_flag: bool,
    ) -> vm::Result<ContractCreateResult> {
        if depth > self.schedule.max_depth {
            return Ok(ContractCreateResult::Reverted(params.gas, ReturnData::empty()));
        }

        self.state.checkpoint();
        let outcome = self.execute_frame(params, substate, depth, static_flag);
        match outcome {
            Ok(MessageCallResult::Success(gas_left, data)) => {
                let deposit_cost = U256::from(self.schedule.create_data_gas) * U256::from(data.len());
                let oversize = data.len() > self.schedule.create_data_limit;
                if oversize || deposit_cost > gas_left {
                    return if self.schedule.exceptional_failed_code_deposit {
                        self.state.revert();
                        Ok(ContractCreateResult::Failed)
                    } else {
                        self.state.commit();
                        Ok(ContractCreateResult::Created(address, gas_left))
                    };
                }
                self.state.put_code(&address, data.to_vec());
                self.state.commit();
                Ok(ContractCreateResult::Created(address, gas_left - deposit_cost))
            }
            Ok(MessageCallResult::Reverted(gas_left, data)) => {
                self.state.revert();
                Ok(ContractCreateResult::Reverted(gas_left, data))
            }
            Ok(MessageCallResult::Failed) => {
                self.state.revert();
                Ok(ContractCreateResult::Failed)
            }
            Err(e) => {
                self.state.revert();
                Err(e)
            }
        }
    }

    /// Run one frame's body (value transfer, builtin dispatch or interpreter
    /// loop) without touching the checkpoint stack; `run`/`run_create` own
    /// opening and closing the checkpoint around this call.
    fn execute_frame(
        &mut self,
        params: ActionParams,
        substate: &mut Substate,
        depth: usize,
        static_flag: bool,
    ) -> vm::Result<MessageCallResult> {
        if let Some(value) = transfer_value(&params.value) {
            if !value.is_zero() {
                if self.state.get_balance(&params.sender) < value {
                    return Ok(MessageCallResult::Reverted(params.gas, ReturnData::empty()));
                }
                self.state.sub_balance(&params.sender, value);
                self.state.add_balance(&params.address, value);
            }
        }
        substate.touched.insert(params.address);
        substate.touched.insert(params.sender);

        if let Some(builtin) = ethcore_builtin::builtin_for(&params.code_address) {
            return Ok(self.run_builtin(builtin.as_ref(), &params));
        }

        let code_empty = params.code.as_ref().map_or(true, |c| c.is_empty());
        if code_empty {
            return Ok(MessageCallResult::Success(params.gas, ReturnData::empty()));
        }

        let origin_info = OriginInfo::from(&params);
        let mut exec: Box<dyn Exec> = evm::interpreter(params, self.cache.clone(), self.schedule, depth);

        loop {
            let outcome = {
                let mut ext = Externalities::new(
                    self.state,
                    self.env_info,
                    self.schedule,
                    depth,
                    &origin_info,
                    substate,
                    static_flag,
                );
                exec.exec(&mut ext)
            };

            match outcome {
                Ok(Ok(GasLeft::Known(gas_left))) => {
                    return Ok(MessageCallResult::Success(gas_left, ReturnData::empty()));
                }
                Ok(Ok(GasLeft::NeedsReturn {
                    gas_left,
                    data,
                    apply_state: true,
                })) => {
                    return Ok(MessageCallResult::Success(gas_left, data));
                }
                Ok(Ok(GasLeft::NeedsReturn {
                    gas_left,
                    data,
                    apply_state: false,
                })) => {
                    return Ok(MessageCallResult::Reverted(gas_left, data));
                }
                Ok(Err(vm::Error::Internal(msg))) => {
                    return Err(vm::Error::Internal(msg));
                }
                Ok(Err(_local_failure)) => {
                    return Ok(MessageCallResult::Failed);
                }
                Err(TrapError::Call(child_params, resume)) => {
                    let mut child_substate = Substate::new();
                    let child_result = self.run(child_params, &mut child_substate, depth + 1, static_flag)?;
                    if let MessageCallResult::Success(_, _) = child_result {
                        substate.accrue(child_substate);
                    }
                    let mut ext = Externalities::new(
                        self.state,
                        self.env_info,
                        self.schedule,
                        depth,
                        &origin_info,
                        substate,
                        static_flag,
                    );
                    exec = resume.resume_call(child_result, &mut ext);
                }
                Err(TrapError::Create(child_params, address, resume)) => {
                    let mut child_substate = Substate::new();
                    let child_result =
                        self.run_create(child_params, address, &mut child_substate, depth + 1, static_flag)?;
                    if let ContractCreateResult::Created(_, _) = child_result {
                        substate.accrue(child_substate);
                    }
                    let mut ext = Externalities::new(
                        self.state,
                        self.env_info,
                        self.schedule,
                        depth,
                        &origin_info,
                        substate,
                        static_flag,
                    );
                    exec = resume.resume_create(child_result, &mut ext);
                }
            }
        }
    }

    fn run_builtin(&mut self, builtin: &dyn ethcore_builtin::Builtin, params: &ActionParams) -> MessageCallResult {
        let input = params.data.clone().unwrap_or_default();
        let cost = builtin.cost(&input);
        if cost > params.gas {
            return MessageCallResult::Failed;
        }
        let mut output = Vec::new();
        match builtin.execute(&input, &mut parity_bytes::BytesRef::Flexible(&mut output)) {
            Ok(()) => {
                let gas_left = params.gas - cost;
                let len = output.len();
                MessageCallResult::Success(gas_left, ReturnData::new(output, 0, len))
            }
            Err(_) => MessageCallResult::Failed,
        }
    }
}

fn transfer_value(value: &ActionValue) -> Option<U256> {
    match value {
        ActionValue::Transfer(v) => Some(*v),
        ActionValue::Apparent(_) => None,
    }
}

/// Derive the address a CREATE issued directly by a transaction (rather
/// than by the CREATE opcode, which goes through `Externalities::create`)
/// would receive.
pub fn tx_contract_address(sender: &Address, nonce: u64) -> Address {
    contract_address(sender, nonce)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hex::FromHex;
    use vm::{ActionValue, CallType, CreateContractAddress, ParamsType};

    fn base_params() -> ActionParams {
        ActionParams {
            address: Address::from_low_u64_be(2),
            code_address: Address::from_low_u64_be(2),
            sender: Address::from_low_u64_be(1),
            origin: Address::from_low_u64_be(1),
            gas: U256::from(1_000_000),
            gas_price: U256::zero(),
            value: ActionValue::Transfer(U256::zero()),
            code: None,
            code_hash: None,
            data: None,
            call_type: CallType::Call,
            address_scheme: CreateContractAddress::FromSenderAndNonce,
            params_type: ParamsType::Separate,
        }
    }

    #[test]
    fn plain_value_transfer_succeeds_with_no_code() {
        let mut state = StateManager::new();
        state.put_balance(&Address::from_low_u64_be(1), U256::from(100));
        let env_info = vm::EnvInfo::default();
        let schedule = Schedule::new_homestead();
        let cache = Arc::new(evm::SharedCache::default());
        let mut substate = Substate::new();

        let mut params = base_params();
        params.value = ActionValue::Transfer(U256::from(10));

        let result = {
            let mut ex = Executive::new(&mut state, &env_info, &schedule, cache);
            ex.call(params, &mut substate).unwrap()
        };
        assert!(matches!(result, MessageCallResult::Success(_, _)));
        assert_eq!(state.get_balance(&Address::from_low_u64_be(1)), U256::from(90));
        assert_eq!(state.get_balance(&Address::from_low_u64_be(2)), U256::from(10));
    }

    #[test]
    fn insufficient_balance_reverts_with_gas_returned() {
        let mut state = StateManager::new();
        let env_info = vm::EnvInfo::default();
        let schedule = Schedule::new_homestead();
        let cache = Arc::new(evm::SharedCache::default());
        let mut substate = Substate::new();

        let mut params = base_params();
        params.value = ActionValue::Transfer(U256::from(10));
        let gas = params.gas;

        let result = {
            let mut ex = Executive::new(&mut state, &env_info, &schedule, cache);
            ex.call(params, &mut substate).unwrap()
        };
        match result {
            MessageCallResult::Reverted(gas_left, _) => assert_eq!(gas_left, gas),
            other => panic!("expected Reverted, got {other:?}"),
        }
        assert_eq!(state.get_balance(&Address::from_low_u64_be(2)), U256::zero());
    }

    #[test]
    fn add_and_return_contract_call_succeeds() {
        let mut state = StateManager::new();
        // PUSH1 2 PUSH1 3 ADD PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN
        let code: Vec<u8> = "600260030160005260206000f3".from_hex().unwrap();
        state.put_code(&Address::from_low_u64_be(2), code.clone());

        let env_info = vm::EnvInfo::default();
        let schedule = Schedule::new_homestead();
        let cache = Arc::new(evm::SharedCache::default());
        let mut substate = Substate::new();

        let mut params = base_params();
        params.code = Some(Arc::new(code));
        params.code_hash = None;

        let result = {
            let mut ex = Executive::new(&mut state, &env_info, &schedule, cache);
            ex.call(params, &mut substate).unwrap()
        };
        match result {
            MessageCallResult::Success(_, data) => {
                assert_eq!(U256::from_big_endian(&data), U256::from(5));
            }
            other => panic!("expected Success, got {other:?}"),
        }
    }
}
