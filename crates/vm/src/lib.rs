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

//! Shared types, traits, errors and gas schedule for the EVM interpreter
//! and its host.

mod action_params;
mod env_info;
mod error;
mod return_data;
mod schedule;
mod traits;

pub use crate::action_params::{
    ActionParams, ActionValue, CallType, CreateContractAddress, ParamsType,
};
pub use crate::env_info::{EnvInfo, LAST_BLOCK_HASHES};
pub use crate::error::{Error, ExecTrapError, ExecTrapResult, Result, TrapError, TrapKind};
pub use crate::return_data::{ContractCreateResult, GasLeft, MessageCallResult, ReturnData};
pub use crate::schedule::{Schedule, MAX_REFUND_QUOTIENT};
pub use crate::traits::{Exec, Ext, ResumeCall, ResumeCreate};

/// Precompiled-contract address range, §4.2 / §6.
pub const PRECOMPILE_ADDRESSES: [ethereum_types::Address; 4] = [
    ethereum_types::H160([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]),
    ethereum_types::H160([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2]),
    ethereum_types::H160([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3]),
    ethereum_types::H160([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 4]),
];

/// keccak256 of the empty byte string; the `codeHash` of a non-contract
/// account (§3 Account, `accountIsEmpty`).
pub fn empty_code_hash() -> ethereum_types::H256 {
    keccak_hash::keccak(&[])
}
