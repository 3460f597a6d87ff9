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

//! Action (call/create) parameters.

use ethereum_types::{Address, H256, U256};
use std::sync::Arc;

/// Transfer-of-value semantics attached to an action.
#[derive(Clone, Debug)]
pub enum ActionValue {
    /// Value transferred as part of the call; debited from the sender,
    /// credited to the receiver.
    Transfer(U256),
    /// No transfer takes place (DELEGATECALL): `callValue` is inherited from
    /// the parent frame for `CALLVALUE` purposes only.
    Apparent(U256),
}

impl ActionValue {
    /// Construct a transferring value.
    pub fn transfer(value: U256) -> ActionValue {
        ActionValue::Transfer(value)
    }

    /// Construct a non-transferring (apparent-only) value.
    pub fn apparent(value: U256) -> ActionValue {
        ActionValue::Apparent(value)
    }

    /// The value as observed by `CALLVALUE` inside the frame.
    pub fn value(&self) -> U256 {
        match *self {
            ActionValue::Transfer(x) | ActionValue::Apparent(x) => x,
        }
    }
}

/// How the child frame relates to its caller.
#[derive(PartialEq, Clone, Copy, Debug)]
pub enum CallType {
    /// Not a sub-call: this is the outermost frame of a message call.
    None,
    /// CALL: new context, value transfer allowed.
    Call,
    /// CALLCODE: caller's context (address/storage), callee's code, value transfer allowed.
    CallCode,
    /// DELEGATECALL: caller's full context including `sender`/`value`, no value transfer.
    DelegateCall,
}

/// How a CREATE derives the address of the new contract.
#[derive(PartialEq, Clone, Copy, Debug)]
pub enum CreateContractAddress {
    /// `keccak256(rlp([sender, nonce]))[12..]` — the only scheme in scope
    /// (CREATE2's salted scheme is a post-Homestead Non-goal).
    FromSenderAndNonce,
}

/// Complete specification of a message call or contract creation, passed to
/// the interpreter and threaded through `CallDispatcher`.
#[derive(Clone, Debug)]
pub struct ActionParams {
    /// Address of the account whose code is executing (`ADDRESS`).
    pub address: Address,
    /// Address of the account whose code is actually run (differs from
    /// `address` under CALLCODE/DELEGATECALL).
    pub code_address: Address,
    /// Immediate caller (`CALLER`).
    pub sender: Address,
    /// Transaction signer (`ORIGIN`), unchanged through the whole call tree.
    pub origin: Address,
    /// Gas made available to this frame.
    pub gas: U256,
    /// Gas price of the enclosing transaction.
    pub gas_price: U256,
    /// Value semantics for this action.
    pub value: ActionValue,
    /// Code to execute; `None` for a plain value transfer to a non-contract.
    pub code: Option<Arc<Vec<u8>>>,
    /// keccak256 of `code`, if known, to avoid rehashing.
    pub code_hash: Option<H256>,
    /// Call data (`CALLDATA*`), or init-code for a contract creation.
    pub data: Option<Vec<u8>>,
    /// How this frame relates to its caller.
    pub call_type: CallType,
    /// Address-derivation scheme when this is a contract creation.
    pub address_scheme: CreateContractAddress,
    /// Message call vs. contract creation.
    pub params_type: ParamsType,
}

/// Distinguishes a plain call from a contract creation when both share the
/// `ActionParams` shape.
#[derive(PartialEq, Clone, Copy, Debug)]
pub enum ParamsType {
    /// Message call against existing (or non-existent, empty) code.
    Separate,
    /// Contract creation: `data` is init-code, executed with empty call-data.
    Embedded,
}

impl ActionParams {
    /// Bare `ActionParams` with zeroed fields, useful as a test/builder base.
    pub fn new() -> ActionParams {
        ActionParams {
            address: Address::zero(),
            code_address: Address::zero(),
            sender: Address::zero(),
            origin: Address::zero(),
            gas: U256::zero(),
            gas_price: U256::zero(),
            value: ActionValue::Transfer(U256::zero()),
            code: None,
            code_hash: None,
            data: None,
            call_type: CallType::None,
            address_scheme: CreateContractAddress::FromSenderAndNonce,
            params_type: ParamsType::Separate,
        }
    }
}

impl Default for ActionParams {
    fn default() -> Self {
        ActionParams::new()
    }
}
