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

//! Output of a completed frame.

use std::ops::Deref;
use std::sync::Arc;

/// Output produced by RETURN/STOP/SELFDESTRUCT or an exhausted code path.
/// Shared via `Arc` because the same bytes are both the frame's own return
/// value and, on CALL, the blob copied into the parent's memory.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReturnData {
    mem: Arc<Vec<u8>>,
    offset: usize,
    size: usize,
}

impl Deref for ReturnData {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.mem[self.offset..self.offset + self.size]
    }
}

impl ReturnData {
    /// Empty return data.
    pub fn empty() -> Self {
        ReturnData {
            mem: Arc::new(Vec::new()),
            offset: 0,
            size: 0,
        }
    }

    /// A view over `[offset, offset + size)` of `mem`.
    pub fn new(mem: Vec<u8>, offset: usize, size: usize) -> Self {
        ReturnData {
            mem: Arc::new(mem),
            offset,
            size,
        }
    }
}

/// Gas remaining after an opcode/frame completes, with an optional
/// suspend-and-resume marker for the cooperative scheduling model (§5).
#[derive(Debug)]
pub enum GasLeft {
    /// Frame completed; this much gas remains, no return data.
    Known(ethereum_types::U256),
    /// Frame completed with RETURN/STOP data.
    NeedsReturn {
        /// Gas remaining.
        gas_left: ethereum_types::U256,
        /// Data to return to the caller.
        data: ReturnData,
        /// Whether to keep (`true`) or discard (`false`, REVERT) the frame's writes.
        apply_state: bool,
    },
}

/// Outcome of a contract-creation action as observed by the caller.
#[derive(Debug)]
pub enum ContractCreateResult {
    /// Creation succeeded; contract deployed at `address`.
    Created(ethereum_types::Address, ethereum_types::U256),
    /// Creation failed; all gas consumed.
    Failed,
    /// Creation reverted; gas and return data available.
    Reverted(ethereum_types::U256, ReturnData),
}

/// Outcome of a message-call action as observed by the caller.
#[derive(Debug)]
pub enum MessageCallResult {
    /// Call succeeded.
    Success(ethereum_types::U256, ReturnData),
    /// Call failed; all gas consumed.
    Failed,
    /// Call reverted; gas and return data available.
    Reverted(ethereum_types::U256, ReturnData),
}
