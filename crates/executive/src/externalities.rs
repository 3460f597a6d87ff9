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

//! The `vm::Ext` implementation: the seam between a running `Interpreter`
//! and the `StateManager`. Every CALL/CREATE traps unconditionally (the
//! `Executive` frame loop resolves traps by recursing and feeding the
//! result back through `ResumeCall`/`ResumeCreate`), so this type never
//! itself runs a child frame to completion.
//!
//! `StateManager`'s accessors take `&mut self` (account lookups populate
//! the cache on first touch) while `Ext`'s read methods take `&self`; the
//! `RefCell` bridges that, the same way the citahub-cita-vm `DataProvider`
//! reference wraps its `State` in `Rc<RefCell<_>>`.

use account_state::StateManager;
use ethereum_types::{Address, H256, U256};
use std::cell::RefCell;
use std::sync::Arc;
use vm::{
    ActionParams, ActionValue, CallType, ContractCreateResult, CreateContractAddress, EnvInfo,
    Ext, MessageCallResult, ParamsType, Schedule, TrapKind,
};

/// Address-independent properties of the enclosing call, snapshotted once
/// so `Ext` methods don't need the full `ActionParams`.
pub struct OriginInfo {
    address: Address,
    origin: Address,
    gas_price: U256,
    value: U256,
}

impl OriginInfo {
    pub fn from(params: &ActionParams) -> Self {
        OriginInfo {
            address: params.address,
            origin: params.origin,
            gas_price: params.gas_price,
            value: params.value.value(),
        }
    }
}

/// keccak256(rlp([sender, nonce]))[12..], the only address-derivation
/// scheme in scope (CREATE2's salted scheme is a post-Homestead Non-goal).
pub fn contract_address(sender: &Address, nonce: u64) -> Address {
    let mut stream = rlp::RlpStream::new_list(2);
    stream.append(sender);
    stream.append(&nonce);
    let hash = keccak_hash::keccak(stream.as_raw());
    Address::from_slice(&hash.as_bytes()[12..])
}

pub struct Externalities<'a> {
    state: RefCell<&'a mut StateManager>,
    env_info: &'a EnvInfo,
    schedule: &'a Schedule,
    depth: usize,
    origin_info: &'a OriginInfo,
    substate: &'a mut account_state::Substate,
    static_flag: bool,
}

impl<'a> Externalities<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        state: &'a mut StateManager,
        env_info: &'a EnvInfo,
        schedule: &'a Schedule,
        depth: usize,
        origin_info: &'a OriginInfo,
        substate: &'a mut account_state::Substate,
        static_flag: bool,
    ) -> Self {
        Externalities {
            state: RefCell::new(state),
            env_info,
            schedule,
            depth,
            origin_info,
            substate,
            static_flag,
        }
    }
}

impl<'a> Ext for Externalities<'a> {
    fn storage_at(&self, key: &H256) -> vm::Result<H256> {
        Ok(self.state.borrow_mut().get_storage(&self.origin_info.address, key))
    }

    fn set_storage(&mut self, key: H256, value: H256) -> vm::Result<()> {
        if self.static_flag {
            return Err(vm::Error::MutableCallInStaticContext);
        }
        self.state.borrow_mut().put_storage(&self.origin_info.address, key, value);
        Ok(())
    }

    fn add_sstore_refund(&mut self, refund: usize) {
        self.substate.sstore_clears_refund += refund as i128;
    }

    fn exists(&self, address: &Address) -> vm::Result<bool> {
        Ok(self.state.borrow_mut().exists(address))
    }

    fn exists_and_not_null(&self, address: &Address) -> vm::Result<bool> {
        let mut state = self.state.borrow_mut();
        Ok(state.exists(address) && !state.is_empty(address))
    }

    fn balance(&self, address: &Address) -> vm::Result<U256> {
        Ok(self.state.borrow_mut().get_balance(address))
    }

    fn sha3(&self, data: &[u8]) -> H256 {
        keccak_hash::keccak(data)
    }

    fn blockhash(&mut self, number: &U256) -> H256 {
        if *number >= U256::from(self.env_info.number) {
            return H256::zero();
        }
        self.env_info.block_hash(number.low_u64())
    }

    fn create(
        &mut self,
        gas: &U256,
        value: &U256,
        code: &[u8],
        address_scheme: CreateContractAddress,
        trap: bool,
    ) -> ::std::result::Result<ContractCreateResult, TrapKind> {
        let mut state = self.state.borrow_mut();
        let nonce = state.get_nonce(&self.origin_info.address);
        let address = contract_address(&self.origin_info.address, nonce);
        state.inc_nonce(&self.origin_info.address);
        drop(state);

        let params = ActionParams {
            code_address: address,
            address,
            sender: self.origin_info.address,
            origin: self.origin_info.origin,
            gas: *gas,
            gas_price: self.origin_info.gas_price,
            value: ActionValue::Transfer(*value),
            code: Some(Arc::new(code.to_vec())),
            code_hash: Some(keccak_hash::keccak(code)),
            data: None,
            call_type: CallType::None,
            address_scheme,
            params_type: ParamsType::Embedded,
        };

        debug_assert!(trap, "the interpreter always traps CREATE");
        Err(TrapKind::Create(params, address))
    }

    #[allow(clippy::too_many_arguments)]
    fn call(
        &mut self,
        gas: &U256,
        sender_address: &Address,
        receive_address: &Address,
        value: Option<U256>,
        data: &[u8],
        code_address: &Address,
        call_type: CallType,
        trap: bool,
    ) -> ::std::result::Result<MessageCallResult, TrapKind> {
        let mut state = self.state.borrow_mut();
        let code = state.get_code(code_address);
        let code_hash = state.code_hash(code_address);
        drop(state);

        let mut params = ActionParams {
            sender: *sender_address,
            address: *receive_address,
            value: ActionValue::Apparent(self.origin_info.value),
            code_address: *code_address,
            origin: self.origin_info.origin,
            gas: *gas,
            gas_price: self.origin_info.gas_price,
            code: if code.is_empty() { None } else { Some(code) },
            code_hash: Some(code_hash),
            data: Some(data.to_vec()),
            call_type,
            address_scheme: CreateContractAddress::FromSenderAndNonce,
            params_type: ParamsType::Separate,
        };
        if let Some(value) = value {
            params.value = ActionValue::Transfer(value);
        }

        debug_assert!(trap, "the interpreter always traps CALL/CALLCODE/DELEGATECALL");
        Err(TrapKind::Call(params))
    }

    fn extcodesize(&self, address: &Address) -> vm::Result<Option<usize>> {
        let mut state = self.state.borrow_mut();
        if state.exists(address) {
            Ok(Some(state.code_size(address)))
        } else {
            Ok(None)
        }
    }

    fn extcode(&self, address: &Address) -> vm::Result<Option<Arc<Vec<u8>>>> {
        let mut state = self.state.borrow_mut();
        if state.exists(address) {
            Ok(Some(state.get_code(address)))
        } else {
            Ok(None)
        }
    }

    fn log(&mut self, topics: Vec<H256>, data: &[u8]) -> vm::Result<()> {
        if self.static_flag {
            return Err(vm::Error::MutableCallInStaticContext);
        }
        self.substate.logs.push(account_state::LogEntry {
            address: self.origin_info.address,
            topics,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn suicide(&mut self, refund_address: &Address) -> vm::Result<()> {
        if self.static_flag {
            return Err(vm::Error::MutableCallInStaticContext);
        }
        let address = self.origin_info.address;
        let mut state = self.state.borrow_mut();
        let balance = state.get_balance(&address);
        if &address != refund_address {
            state.add_balance(refund_address, balance);
        }
        state.sub_balance(&address, balance);
        self.substate.suicides.insert(address);
        Ok(())
    }

    fn schedule(&self) -> &Schedule {
        self.schedule
    }

    fn env_info(&self) -> &EnvInfo {
        self.env_info
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn is_static(&self) -> bool {
        self.static_flag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use account_state::Substate;

    #[test]
    fn contract_address_derivation_is_deterministic() {
        let sender = Address::from_low_u64_be(1);
        assert_eq!(contract_address(&sender, 7), contract_address(&sender, 7));
        assert_ne!(contract_address(&sender, 7), contract_address(&sender, 8));
    }

    #[test]
    fn log_is_rejected_in_static_context() {
        let mut state = StateManager::new();
        let env_info = EnvInfo::default();
        let schedule = Schedule::new_homestead();
        let origin = OriginInfo {
            address: Address::zero(),
            origin: Address::zero(),
            gas_price: U256::zero(),
            value: U256::zero(),
        };
        let mut substate = Substate::new();
        let mut ext = Externalities::new(&mut state, &env_info, &schedule, 0, &origin, &mut substate, true);
        assert!(ext.log(vec![], &[]).is_err());
    }

    #[test]
    fn suicide_transfers_balance_to_refund_target() {
        let mut state = StateManager::new();
        let target = Address::from_low_u64_be(9);
        state.put_balance(&Address::zero(), U256::from(100));
        let env_info = EnvInfo::default();
        let schedule = Schedule::new_homestead();
        let origin = OriginInfo {
            address: Address::zero(),
            origin: Address::zero(),
            gas_price: U256::zero(),
            value: U256::zero(),
        };
        let mut substate = Substate::new();
        {
            let mut ext = Externalities::new(&mut state, &env_info, &schedule, 0, &origin, &mut substate, false);
            ext.suicide(&target).unwrap();
        }
        assert_eq!(state.get_balance(&target), U256::from(100));
        assert_eq!(state.get_balance(&Address::zero()), U256::zero());
        assert!(substate.suicides.contains(&Address::zero()));
    }
}
