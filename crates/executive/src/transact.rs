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

//! Transaction application: intrinsic gas, nonce/balance checks, gas
//! settlement and self-destruct cleanup around a single `Executive::call`
//! or `Executive::create`, grounded on the citahub-cita-vm reference's
//! `get_gas_prepare`/`get_refund`/`clear`/`exec` functions.

use crate::executive::{tx_contract_address, Executive};
use crate::Error;
use account_state::{Bloom, StateManager, Substate};
use ethereum_types::{Address, U256};
use vm::{ActionParams, ActionValue, CallType, ContractCreateResult, CreateContractAddress, EnvInfo, MessageCallResult, ParamsType, Schedule};

/// A signed transaction, reduced to the fields `run_tx` needs. Signature
/// recovery happens upstream of this crate (§1 Non-goals).
pub struct SignedTransaction {
    pub sender: Address,
    pub to: Option<Address>,
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: U256,
    pub value: U256,
    pub data: Vec<u8>,
}

/// Outcome of applying one transaction.
#[derive(Debug)]
pub struct TransactOutcome {
    pub gas_used: U256,
    pub created_address: Option<Address>,
    pub logs: Vec<account_state::LogEntry>,
    pub logs_bloom: Bloom,
    pub reverted: bool,
}

/// Fold a transaction's logs into a receipt-level bloom (§4.5: "each of
/// which ORs the contract address and all topics").
fn logs_bloom(logs: &[account_state::LogEntry]) -> Bloom {
    let mut bloom = Bloom::new();
    for log in logs {
        bloom.accrue_log(&log.address, &log.topics);
    }
    bloom
}

fn intrinsic_gas(schedule: &Schedule, is_create: bool, data: &[u8]) -> U256 {
    let mut gas = U256::from(schedule.tx_gas);
    if is_create {
        gas += U256::from(schedule.tx_create_gas);
    }
    for byte in data {
        gas += U256::from(if *byte == 0 {
            schedule.tx_data_zero_gas
        } else {
            schedule.tx_data_non_zero_gas
        });
    }
    gas
}

/// Apply a signed transaction against `state`, per §6's `run_tx`: deduct
/// up-front gas, increment the sender's nonce, dispatch to a call or a
/// create, settle the refund-capped unused gas back to the sender and the
/// rest to the block's coinbase, then process self-destructs.
pub fn run_tx(
    state: &mut StateManager,
    env_info: &EnvInfo,
    schedule: &Schedule,
    tx: &SignedTransaction,
) -> Result<TransactOutcome, Error> {
    let is_create = tx.to.is_none();
    let gas_prepare = intrinsic_gas(schedule, is_create, &tx.data);
    if tx.gas_limit < gas_prepare {
        return Err(Error::NotEnoughBaseGas);
    }

    let sender_nonce = state.get_nonce(&tx.sender);
    if sender_nonce != tx.nonce {
        return Err(Error::InvalidNonce);
    }

    let gas_cost = tx.gas_price * tx.gas_limit;
    if state.get_balance(&tx.sender) < gas_cost + tx.value {
        return Err(Error::NotEnoughBalance);
    }

    state.sub_balance(&tx.sender, gas_cost);
    state.inc_nonce(&tx.sender);

    let mut substate = Substate::new();
    let cache = std::sync::Arc::new(evm::SharedCache::default());
    let call_code = if !is_create {
        Some(executive_code(state, &tx.to.expect("is_create is false")))
    } else {
        None
    };
    let mut executive = Executive::new(state, env_info, schedule, cache);

    let (gas_left, created_address, reverted) = if is_create {
        let address = tx_contract_address(&tx.sender, sender_nonce);
        let params = ActionParams {
            address,
            code_address: address,
            sender: tx.sender,
            origin: tx.sender,
            gas: tx.gas_limit - gas_prepare,
            gas_price: tx.gas_price,
            value: ActionValue::Transfer(tx.value),
            code: Some(std::sync::Arc::new(tx.data.clone())),
            code_hash: Some(keccak_hash::keccak(&tx.data)),
            data: None,
            call_type: CallType::None,
            address_scheme: CreateContractAddress::FromSenderAndNonce,
            params_type: ParamsType::Embedded,
        };
        match executive.create(params, &mut substate)? {
            ContractCreateResult::Created(addr, gas_left) => (gas_left, Some(addr), false),
            ContractCreateResult::Reverted(gas_left, _) => (gas_left, None, true),
            ContractCreateResult::Failed => (U256::zero(), None, true),
        }
    } else {
        let to = tx.to.expect("is_create is false");
        let params = ActionParams {
            address: to,
            code_address: to,
            sender: tx.sender,
            origin: tx.sender,
            gas: tx.gas_limit - gas_prepare,
            gas_price: tx.gas_price,
            value: ActionValue::Transfer(tx.value),
            code: Some(call_code.expect("call_code computed for non-create transaction")),
            code_hash: None,
            data: Some(tx.data.clone()),
            call_type: CallType::Call,
            address_scheme: CreateContractAddress::FromSenderAndNonce,
            params_type: ParamsType::Separate,
        };
        match executive.call(params, &mut substate)? {
            MessageCallResult::Success(gas_left, _) => (gas_left, None, false),
            MessageCallResult::Reverted(gas_left, _) => (gas_left, None, true),
            MessageCallResult::Failed => (U256::zero(), None, true),
        }
    };

    let gas_used = tx.gas_limit - gas_prepare - gas_left;
    let refund_bound = if reverted {
        U256::zero()
    } else {
        let sstore_refund = U256::from(std::cmp::max(substate.sstore_clears_refund, 0) as u64);
        let suicide_refund = U256::from(substate.suicides.len()) * U256::from(schedule.suicide_refund_gas);
        sstore_refund + suicide_refund
    };
    let max_refund = gas_used / U256::from(schedule.max_refund_quotient);
    let refund = std::cmp::min(refund_bound, max_refund);

    let total_gas_left = gas_left + gas_prepare + refund;
    state.add_balance(&tx.sender, tx.gas_price * total_gas_left);
    let coinbase_fee = tx.gas_price * (tx.gas_limit - total_gas_left);
    state.add_balance(&env_info.author, coinbase_fee);

    if !reverted {
        for address in substate.suicides.iter() {
            state.put_balance(address, U256::zero());
            state.put_code(address, Vec::new());
        }
    }

    let logs = if reverted { Vec::new() } else { substate.logs };
    Ok(TransactOutcome {
        gas_used: tx.gas_limit - total_gas_left,
        created_address,
        logs_bloom: logs_bloom(&logs),
        logs,
        reverted,
    })
}

fn executive_code(state: &mut StateManager, address: &Address) -> std::sync::Arc<Vec<u8>> {
    state.get_code(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hex::FromHex;

    fn env() -> EnvInfo {
        EnvInfo::default()
    }

    #[test]
    fn rejects_nonce_mismatch() {
        let mut state = StateManager::new();
        state.put_balance(&Address::from_low_u64_be(1), U256::from(1_000_000_000u64));
        let schedule = Schedule::new_homestead();
        let tx = SignedTransaction {
            sender: Address::from_low_u64_be(1),
            to: Some(Address::from_low_u64_be(2)),
            nonce: 5,
            gas_price: U256::from(1),
            gas_limit: U256::from(100_000),
            value: U256::zero(),
            data: Vec::new(),
        };
        let result = run_tx(&mut state, &env(), &schedule, &tx);
        assert!(matches!(result, Err(Error::InvalidNonce)));
    }

    #[test]
    fn plain_transfer_charges_intrinsic_gas_and_moves_value() {
        let mut state = StateManager::new();
        let sender = Address::from_low_u64_be(1);
        let receiver = Address::from_low_u64_be(2);
        state.put_balance(&sender, U256::from(1_000_000_000u64));
        let schedule = Schedule::new_homestead();
        let tx = SignedTransaction {
            sender,
            to: Some(receiver),
            nonce: 0,
            gas_price: U256::from(1),
            gas_limit: U256::from(21_000),
            value: U256::from(500),
            data: Vec::new(),
        };
        let outcome = run_tx(&mut state, &env(), &schedule, &tx).unwrap();
        assert!(!outcome.reverted);
        assert_eq!(outcome.gas_used, U256::from(21_000));
        assert_eq!(state.get_balance(&receiver), U256::from(500));
        assert_eq!(state.get_nonce(&sender), 1);
    }

    #[test]
    fn create_deploys_code_returned_by_init_code() {
        let mut state = StateManager::new();
        let sender = Address::from_low_u64_be(1);
        state.put_balance(&sender, U256::from(10_000_000_000u64));
        let schedule = Schedule::new_homestead();
        // PUSH1 1 PUSH1 0 MSTORE8 PUSH1 1 PUSH1 0 RETURN: deploys a 1-byte contract (0x01).
        let init_code: Vec<u8> = "600160005360016000f3".from_hex().unwrap();
        let tx = SignedTransaction {
            sender,
            to: None,
            nonce: 0,
            gas_price: U256::from(1),
            gas_limit: U256::from(1_000_000),
            value: U256::zero(),
            data: init_code,
        };
        let outcome = run_tx(&mut state, &env(), &schedule, &tx).unwrap();
        assert!(!outcome.reverted);
        let address = outcome.created_address.expect("contract should be created");
        assert_eq!(&state.get_code(&address)[..], &[0x01][..]);
    }

    #[test]
    fn emitted_log_is_folded_into_the_receipt_bloom() {
        let mut state = StateManager::new();
        let sender = Address::from_low_u64_be(1);
        let contract = Address::from_low_u64_be(2);
        state.put_balance(&sender, U256::from(1_000_000_000u64));
        // PUSH1 0 PUSH1 0 LOG0 STOP: emits a topic-less, data-less log.
        state.put_code(&contract, "60006000a000".from_hex().unwrap());
        let schedule = Schedule::new_homestead();
        let tx = SignedTransaction {
            sender,
            to: Some(contract),
            nonce: 0,
            gas_price: U256::from(1),
            gas_limit: U256::from(100_000),
            value: U256::zero(),
            data: Vec::new(),
        };
        let outcome = run_tx(&mut state, &env(), &schedule, &tx).unwrap();
        assert!(!outcome.reverted);
        assert_eq!(outcome.logs.len(), 1);
        assert_eq!(outcome.logs[0].address, contract);
        assert!(outcome.logs_bloom.check(contract.as_bytes()));
    }
}
