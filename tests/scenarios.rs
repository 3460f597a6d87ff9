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

//! End-to-end scenarios exercised through the `evmcore` façade: a signed
//! transaction or a bare call, start to finish, against a fresh
//! `StateManager`.

use ethereum_types::{Address, U256};
use evmcore::{
    run_call, run_tx, ActionParams, ActionValue, CallType, CreateContractAddress, EnvInfo,
    EvmConfig, MessageCallResult, ParamsType, SignedTransaction, StateManager,
};
use rustc_hex::FromHex;
use std::sync::Arc;

fn hex_code(s: &str) -> Vec<u8> {
    s.from_hex().unwrap()
}

/// Scenario 1: plain value transfer with no code at the receiver.
#[test]
fn plain_value_transfer() {
    let mut state = StateManager::new();
    let a = Address::from_low_u64_be(1);
    let b = Address::from_low_u64_be(2);
    state.put_balance(&a, U256::from(1_000_000));

    let schedule = evmcore::Schedule::new_homestead();
    let env_info = EnvInfo::default();
    let tx = SignedTransaction {
        sender: a,
        to: Some(b),
        nonce: 0,
        gas_price: U256::from(1),
        gas_limit: U256::from(21_000),
        value: U256::from(100),
        data: Vec::new(),
    };

    let outcome = run_tx(&mut state, &env_info, &schedule, &tx).unwrap();

    assert!(!outcome.reverted);
    assert_eq!(outcome.gas_used, U256::from(21_000));
    assert_eq!(state.get_balance(&a), U256::from(1_000_000 - 100 - 21_000));
    assert_eq!(state.get_balance(&b), U256::from(100));
    assert!(state.exists(&b));
}

/// Scenario 2: `ADD` then `RETURN` a 32-byte word.
#[test]
fn add_and_return() {
    let mut state = StateManager::new();
    let config = EvmConfig::default();
    let env_info = EnvInfo::default();

    let code = hex_code("600260030160005260206000f3");
    let mut params = ActionParams::new();
    params.gas = U256::from(100_000);
    params.code = Some(Arc::new(code));

    let result = run_call(&config, &mut state, &env_info, params).unwrap();
    match result {
        MessageCallResult::Success(gas_left, data) => {
            assert_eq!(U256::from_big_endian(&data), U256::from(5));
            assert!(gas_left < U256::from(100_000));
        }
        other => panic!("expected Success, got {other:?}"),
    }
}

/// Scenario 3: an SSTORE clearing a nonzero slot to zero earns the full
/// clear refund and is charged the reset (not the set) price.
#[test]
fn sstore_clear_refund() {
    let mut state = StateManager::new();
    let config = EvmConfig::default();
    let env_info = EnvInfo::default();
    let contract = Address::from_low_u64_be(7);
    state.put_storage(&contract, ethereum_types::H256::zero(), ethereum_types::H256::from_low_u64_be(1));

    // PUSH1 0 PUSH1 0 SSTORE
    let code = hex_code("6000600055");
    let mut params = ActionParams::new();
    params.address = contract;
    params.code_address = contract;
    params.gas = U256::from(100_000);
    params.code = Some(Arc::new(code));

    let result = run_call(&config, &mut state, &env_info, params).unwrap();
    match result {
        MessageCallResult::Success(gas_left, _) => {
            let gas_for_sstore_and_pushes = U256::from(100_000) - gas_left;
            // 2 PUSH1 (3 each) + SSTORE reset (5000).
            assert_eq!(gas_for_sstore_and_pushes, U256::from(5006));
        }
        other => panic!("expected Success, got {other:?}"),
    }
    assert_eq!(
        state.get_storage(&contract, &ethereum_types::H256::zero()),
        ethereum_types::H256::zero()
    );
}

/// Scenario 4: a nested CALL given all available gas runs out of gas on an
/// infinite loop; the parent observes a `0` on its stack and keeps running
/// on its own remaining gas rather than propagating the failure.
#[test]
fn out_of_gas_in_nested_call_does_not_fail_parent() {
    let mut state = StateManager::new();
    let config = EvmConfig::default();
    let env_info = EnvInfo::default();
    let callee = Address::from_low_u64_be(9);

    // JUMPDEST PUSH1 0 JUMP: an infinite loop that only ever burns gas.
    state.put_code(&callee, hex_code("5b600056"));

    // PUSH1 0 PUSH1 0 PUSH1 0 PUSH1 0 PUSH1 0 PUSH20 <callee> GAS CALL
    // PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN — forwards all gas, then
    // returns CALL's result word.
    let mut code = hex_code("6000600060006000600073").to_vec();
    code.extend_from_slice(callee.as_bytes());
    code.extend_from_slice(&hex_code("5af160005260206000f3"));

    let mut params = ActionParams::new();
    params.gas = U256::from(50_000);
    params.code = Some(Arc::new(code));

    let result = run_call(&config, &mut state, &env_info, params).unwrap();
    match result {
        MessageCallResult::Success(_, data) => {
            // CALL pushed 0 (failure) onto the parent's stack; MSTORE/RETURN
            // echoes that word back out.
            assert_eq!(U256::from_big_endian(&data), U256::zero());
        }
        other => panic!("expected the parent to complete normally, got {other:?}"),
    }
}

/// Scenario 5: CREATE whose init-code returns more than the 24576-byte
/// limit deploys nothing and consumes the whole gas allowance.
#[test]
fn create_with_oversize_return_deploys_nothing() {
    let mut state = StateManager::new();
    let sender = Address::from_low_u64_be(1);
    state.put_balance(&sender, U256::from(10_000_000_000u64));
    let schedule = evmcore::Schedule::new_homestead();
    let env_info = EnvInfo::default();

    // PUSH3 0x006001 (24577) PUSH1 0 RETURN: returns 24577 zero bytes.
    let init_code = hex_code("620060016000f3");
    let tx = SignedTransaction {
        sender,
        to: None,
        nonce: 0,
        gas_price: U256::from(1),
        gas_limit: U256::from(5_000_000),
        value: U256::zero(),
        data: init_code,
    };

    let outcome = run_tx(&mut state, &env_info, &schedule, &tx).unwrap();
    assert!(outcome.reverted);
    assert!(outcome.created_address.is_none());
    assert_eq!(outcome.gas_used, U256::from(5_000_000));
}

/// Scenario 6: DELEGATECALL runs the callee's code in the caller's own
/// context — `ADDRESS`/`CALLER`/`CALLVALUE` and storage all stay the
/// caller's.
#[test]
fn delegatecall_preserves_caller_context() {
    let mut state = StateManager::new();
    let config = EvmConfig::default();
    let env_info = EnvInfo::default();

    let library = Address::from_low_u64_be(50);
    let proxy = Address::from_low_u64_be(51);
    let original_caller = Address::from_low_u64_be(1);

    // ADDRESS PUSH1 0 SSTORE: writes its own ADDRESS into storage slot 0.
    state.put_code(&library, hex_code("30600055"));

    // Hand-built the way the interpreter itself would construct a
    // DELEGATECALL's child `ActionParams`: `address` stays the delegating
    // contract's own (`proxy`), `sender` is the delegating frame's own
    // caller (`original_caller`) rather than `proxy` itself, and `value`
    // is inherited (`Apparent`, no transfer) rather than popped fresh.
    let mut params = ActionParams::new();
    params.address = proxy;
    params.code_address = library;
    params.sender = original_caller;
    params.origin = original_caller;
    params.gas = U256::from(100_000);
    params.call_type = CallType::DelegateCall;
    params.value = ActionValue::Apparent(U256::from(7));
    params.code = Some(Arc::new(state.get_code(&library).to_vec()));
    params.params_type = ParamsType::Separate;
    params.address_scheme = CreateContractAddress::FromSenderAndNonce;

    let result = run_call(&config, &mut state, &env_info, params).unwrap();
    assert!(matches!(result, MessageCallResult::Success(_, _)));

    let stored = state.get_storage(&proxy, &ethereum_types::H256::zero());
    assert_eq!(Address::from_slice(&stored.as_bytes()[12..]), proxy);
    assert!(state.get_storage(&library, &ethereum_types::H256::zero()).is_zero());
}
