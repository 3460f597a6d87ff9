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

//! Homestead-era stack-machine EVM interpreter (§4 Interpreter Engine).
//!
//! `interpreter::Interpreter<Cost>` is the only `vm::Exec` implementation in
//! this crate: there is no separate WASM runtime, so a factory simply picks
//! between the `u64` and `U256` gas counters based on how much gas a call
//! was given.

mod cost;
pub mod instructions;
pub mod interpreter;

pub use cost::CostType;
pub use instructions::{Instruction, InstructionInfo};
pub use interpreter::{Interpreter, SharedCache};

use std::sync::Arc;

/// Build an `Interpreter` for `params`, picking a `u64` gas counter when the
/// call fits (the common case, and cheaper) and falling back to `U256` when
/// a caller supplies more gas than `u64` can hold.
pub fn interpreter(
    params: vm::ActionParams,
    cache: Arc<SharedCache>,
    schedule: &vm::Schedule,
    depth: usize,
) -> Box<dyn vm::Exec> {
    if params.gas > ethereum_types::U256::from(u64::max_value()) {
        Box::new(Interpreter::<ethereum_types::U256>::new(
            params, cache, schedule, depth,
        ))
    } else {
        Box::new(Interpreter::<u64>::new(params, cache, schedule, depth))
    }
}
