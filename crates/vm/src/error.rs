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

//! VM errors module.

use crate::action_params::ActionParams;
use crate::{ResumeCall, ResumeCreate};
use ethereum_types::Address;
use std::fmt;

/// A call or create that an interpreter has suspended on, to be resolved by
/// the caller and fed back in via `ResumeCall`/`ResumeCreate`.
#[derive(Debug)]
pub enum TrapKind {
    /// A CALL/CALLCODE/DELEGATECALL was requested.
    Call(ActionParams),
    /// A CREATE was requested; second field is the derived contract address.
    Create(ActionParams, Address),
}

/// Like `TrapKind`, but carrying a concrete continuation to resume with.
pub enum TrapError<Call, Create> {
    /// Resume this call once `Call` is resolved.
    Call(ActionParams, Call),
    /// Resume this create once `Create` is resolved.
    Create(ActionParams, Address, Create),
}

/// Errors raised from within a single call frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Execution ran out of gas.
    OutOfGas,
    /// JUMP/JUMPI targeted a position not in `validJumps`.
    BadJumpDestination {
        /// Position the code tried to jump to.
        destination: usize,
    },
    /// Opcode byte does not correspond to a known instruction.
    BadInstruction {
        /// Unrecognized opcode.
        instruction: u8,
    },
    /// Not enough stack elements to execute the instruction.
    StackUnderflow {
        /// Invoked instruction.
        instruction: &'static str,
        /// How many stack elements were requested.
        wanted: usize,
        /// How many elements were on the stack.
        on_stack: usize,
    },
    /// Execution would exceed the stack limit.
    OutOfStack {
        /// Invoked instruction.
        instruction: &'static str,
        /// How many stack elements the instruction wanted to push.
        wanted: usize,
        /// The configured stack limit.
        limit: usize,
    },
    /// Built-in (precompile) contract failed on given input.
    BuiltIn(&'static str),
    /// Execution tried to mutate state while in a static (read-only) context.
    MutableCallInStaticContext,
    /// Invalid code supplied for deployment as a contract.
    InvalidCode,
    /// Failure with no useful frame-level classification; propagated to the
    /// top-level caller as a host-level failure (§7 band 3).
    Internal(String),
    /// The frame executed a `REVERT`.
    Reverted,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::Error::*;
        match *self {
            OutOfGas => write!(f, "Out of gas"),
            BadJumpDestination { destination } => {
                write!(f, "Bad jump destination {destination:x}")
            }
            BadInstruction { instruction } => write!(f, "Bad instruction {instruction:x}"),
            StackUnderflow {
                instruction,
                wanted,
                on_stack,
            } => write!(f, "Stack underflow {instruction} {wanted}/{on_stack}"),
            OutOfStack {
                instruction,
                wanted,
                limit,
            } => write!(f, "Out of stack {instruction} {wanted}/{limit}"),
            BuiltIn(name) => write!(f, "Built-in failed: {name}"),
            MutableCallInStaticContext => write!(f, "Mutable call in static context"),
            InvalidCode => write!(f, "Invalid code to deploy as a contract"),
            Internal(ref msg) => write!(f, "Internal error: {msg}"),
            Reverted => write!(f, "Reverted"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = ::std::result::Result<T, Error>;
pub type TrapResult<T, Call, Create> = ::std::result::Result<Result<T>, TrapError<Call, Create>>;

pub type ExecTrapResult<T> = TrapResult<T, Box<dyn ResumeCall>, Box<dyn ResumeCreate>>;
pub type ExecTrapError = TrapError<Box<dyn ResumeCall>, Box<dyn ResumeCreate>>;
