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

//! Per-step trace logging. `log::trace!` already costs nothing when the
//! level is disabled, so this needs no feature gate of its own.

use crate::instructions::Instruction;

pub struct EvmInformant {
    depth: usize,
}

impl EvmInformant {
    pub fn new(depth: usize) -> Self {
        EvmInformant { depth }
    }

    pub fn step(&self, pc: usize, instruction: Instruction, gas: ethereum_types::U256) {
        log::trace!(target: "evm", "depth={} pc={} op={:?} gas={}", self.depth, pc, instruction, gas);
    }

    pub fn done(&self) {
        log::trace!(target: "evm", "depth={} execution finished", self.depth);
    }
}
