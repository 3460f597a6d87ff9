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

//! Call dispatcher: drives the interpreter, resolves CALL/CREATE traps
//! against the state store, and applies transactions and blocks on top.

pub mod block;
pub mod executive;
pub mod externalities;
pub mod transact;

pub use crate::executive::Executive;
pub use crate::externalities::Externalities;
pub use crate::transact::{run_tx, SignedTransaction, TransactOutcome};
pub use crate::block::{run_block, Block, BlockOutcome, OmmerHeader};

use derive_more::Display;

/// Errors raised applying a transaction or a block, layered over the
/// frame-level `vm::Error` the same way `ethcore::error::Error` wraps
/// `vm::Error` in the teacher.
#[derive(Debug, Display)]
pub enum Error {
    /// A frame-level VM error escaped to the top (§7 band 3, host failures).
    #[display(fmt = "VM error: {_0}")]
    Vm(vm::Error),
    /// The supplied nonce does not match the sender's current nonce.
    #[display(fmt = "Invalid transaction nonce")]
    InvalidNonce,
    /// Sender's balance cannot cover `gas_price * gas_limit + value`.
    #[display(fmt = "Sender balance too low to cover gas and value")]
    NotEnoughBalance,
    /// `gas_limit` is below the transaction's intrinsic gas cost.
    #[display(fmt = "Gas limit below intrinsic gas cost")]
    NotEnoughBaseGas,
    /// `gas_limit` exceeds the block's gas limit.
    #[display(fmt = "Transaction gas limit exceeds block gas limit")]
    ExceedsBlockGasLimit,
}

impl std::error::Error for Error {}

impl From<vm::Error> for Error {
    fn from(err: vm::Error) -> Self {
        Error::Vm(err)
    }
}

/// Hooks fired around block and transaction execution (§6's `beforeBlock`/
/// `afterBlock`/`beforeTx`/`afterTx`). Per-opcode `step` tracing already
/// lives in `evm::interpreter`'s informant, so this trait only covers the
/// coarser block/tx granularity the CallDispatcher itself owns.
pub trait Informant {
    /// Called once before a block's transactions are applied.
    fn before_block(&mut self, _number: u64) {}
    /// Called once after a block's transactions are applied.
    fn after_block(&mut self, _number: u64, _gas_used: ethereum_types::U256) {}
    /// Called before applying a single transaction.
    fn before_tx(&mut self, _sender: &ethereum_types::Address) {}
    /// Called after applying a single transaction.
    fn after_tx(&mut self, _outcome: &TransactOutcome) {}
}

/// Default `Informant`: does nothing, at zero cost.
#[derive(Default)]
pub struct NoopInformant;

impl Informant for NoopInformant {}

/// An `Informant` that narrates block/tx boundaries via the `log` facade,
/// matching the teacher's habit of `log::trace!`/`log::debug!` over
/// println-style diagnostics.
#[derive(Default)]
pub struct LoggingInformant;

impl Informant for LoggingInformant {
    fn before_block(&mut self, number: u64) {
        log::debug!("applying block {number}");
    }

    fn after_block(&mut self, number: u64, gas_used: ethereum_types::U256) {
        log::debug!("block {number} done, gas_used={gas_used}");
    }

    fn before_tx(&mut self, sender: &ethereum_types::Address) {
        log::trace!("applying tx from {sender:?}");
    }

    fn after_tx(&mut self, outcome: &TransactOutcome) {
        log::trace!(
            "tx done, gas_used={}, reverted={}",
            outcome.gas_used,
            outcome.reverted
        );
    }
}
