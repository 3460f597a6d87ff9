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

//! Traits at the Interpreter <-> CallDispatcher/StateManager seam.

use crate::action_params::ActionParams;
use crate::env_info::EnvInfo;
use crate::error::{ExecTrapResult, TrapError};
use crate::return_data::{ContractCreateResult, GasLeft, MessageCallResult};
use crate::schedule::Schedule;
use ethereum_types::{Address, H256, U256};

/// Everything the Interpreter needs from the host (CallDispatcher +
/// StateManager) to execute the "async handlers" named in spec §4.1:
/// BALANCE, EXTCODESIZE/COPY, SLOAD, SSTORE, BLOCKHASH, CALL-family,
/// SELFDESTRUCT. Implemented by `ethcore_executive::Externalities`.
pub trait Ext {
    /// Read a word from the executing account's storage.
    fn storage_at(&self, key: &H256) -> crate::error::Result<H256>;

    /// Write a word to the executing account's storage. A zero `value`
    /// deletes the key (§3 Storage).
    fn set_storage(&mut self, key: H256, value: H256) -> crate::error::Result<()>;

    /// Accrue a gas refund into the substate (SSTORE clears, SELFDESTRUCT),
    /// capped only later at settlement time by `max_refund_quotient`.
    fn add_sstore_refund(&mut self, refund: usize);

    /// True if `address` is known to the StateManager (has been touched or
    /// has non-empty state), used by CALL's new-account surcharge.
    fn exists(&self, address: &Address) -> crate::error::Result<bool>;

    /// True if `address` exists and is non-empty (§3: nonce/balance/code all zero).
    fn exists_and_not_null(&self, address: &Address) -> crate::error::Result<bool>;

    /// Balance of `address`.
    fn balance(&self, address: &Address) -> crate::error::Result<U256>;

    /// keccak256 hash of the given data (`SHA3`/address derivation).
    fn sha3(&self, data: &[u8]) -> H256;

    /// Hash of the block at `number`, per `EnvInfo::block_hash`.
    fn blockhash(&mut self, number: &U256) -> H256;

    /// Execute a CREATE. Returns a trap when the frame must suspend for the
    /// CallDispatcher to run the child and resume via `ResumeCreate`.
    fn create(
        &mut self,
        gas: &U256,
        value: &U256,
        code: &[u8],
        address_scheme: crate::action_params::CreateContractAddress,
        trap: bool,
    ) -> ::std::result::Result<ContractCreateResult, TrapKindCreate>;

    /// Execute a CALL/CALLCODE/DELEGATECALL. Returns a trap when the frame
    /// must suspend for the CallDispatcher to run the child and resume via
    /// `ResumeCall`.
    #[allow(clippy::too_many_arguments)]
    fn call(
        &mut self,
        gas: &U256,
        sender_address: &Address,
        receive_address: &Address,
        value: Option<U256>,
        data: &[u8],
        code_address: &Address,
        call_type: crate::action_params::CallType,
        trap: bool,
    ) -> ::std::result::Result<MessageCallResult, TrapKindCall>;

    /// Size in bytes of `address`'s code.
    fn extcodesize(&self, address: &Address) -> crate::error::Result<Option<usize>>;

    /// Bytes of `address`'s code.
    fn extcode(&self, address: &Address) -> crate::error::Result<Option<std::sync::Arc<Vec<u8>>>>;

    /// Append a log entry for the executing account.
    fn log(&mut self, topics: Vec<H256>, data: &[u8]) -> crate::error::Result<()>;

    /// Mark the executing account for destruction, transferring its balance
    /// to `refund_address`.
    fn suicide(&mut self, refund_address: &Address) -> crate::error::Result<()>;

    /// The active gas schedule.
    fn schedule(&self) -> &Schedule;

    /// The active block context.
    fn env_info(&self) -> &EnvInfo;

    /// Nesting depth of the current frame.
    fn depth(&self) -> usize;

    /// True inside a read-only (static) context (reserved: no STATICCALL
    /// opcode in scope, but MutableCallInStaticContext is a defined error).
    fn is_static(&self) -> bool;
}

/// Marker carried by `Ext::create`'s trap path; kept distinct from
/// `vm::TrapKind` so `Ext` does not need to know about `ActionParams`
/// construction, which is the CallDispatcher's job.
pub type TrapKindCreate = crate::error::TrapKind;
/// See `TrapKindCreate`.
pub type TrapKindCall = crate::error::TrapKind;

/// An Interpreter instance, type-erased so the CallDispatcher can hold a
/// heterogeneous stack of suspended frames.
pub trait Exec {
    /// Run to completion or suspend with a trap describing the required
    /// child call/create.
    fn exec(self: Box<Self>, ext: &mut dyn Ext) -> ExecTrapResult<GasLeft>;
}

/// Resume a frame previously suspended on a CALL trap, now that the child
/// call has produced a result.
pub trait ResumeCall {
    /// Feed the child's result back in and continue execution.
    fn resume_call(self: Box<Self>, result: MessageCallResult, ext: &mut dyn Ext) -> Box<dyn Exec>;
}

/// Resume a frame previously suspended on a CREATE trap.
pub trait ResumeCreate {
    /// Feed the child's result back in and continue execution.
    fn resume_create(
        self: Box<Self>,
        result: ContractCreateResult,
        ext: &mut dyn Ext,
    ) -> Box<dyn Exec>;
}

pub use crate::error::TrapError as ExtTrapError;
