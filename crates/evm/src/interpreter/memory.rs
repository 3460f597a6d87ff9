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

//! Byte-addressable, word-aligned linear memory with quadratic expansion
//! pricing (§4.1 Memory).

use ethereum_types::U256;
use vm::ReturnData;

/// `true` if `offset + size` fits in a `usize` without overflow — used to
/// reject operations the real EVM would never pay enough gas to reach.
pub fn is_valid_range(offset: usize, size: usize) -> bool {
    offset.checked_add(size).is_some()
}

/// Round `size` up to the next multiple of 32.
fn to_word_size(size: usize) -> usize {
    if size == 0 {
        return 0;
    }
    (size + 31) / 32
}

pub trait Memory {
    fn size(&self) -> usize;
    fn read_slice(&self, offset: usize, size: usize) -> &[u8];
    fn read(&self, offset: usize) -> U256;
    fn write(&mut self, offset: usize, value: U256);
    fn write_byte(&mut self, offset: usize, value: u8);
    fn write_slice(&mut self, offset: usize, data: &[u8]);
    fn writeable_slice(&mut self, offset: U256, size: U256) -> &mut [u8];
    fn dump(&self) -> Vec<u8>;
    fn expand(&mut self, size: usize);
    fn into_return_data(self, offset: U256, size: U256) -> ReturnData;
}

impl Memory for Vec<u8> {
    fn size(&self) -> usize {
        self.len()
    }

    fn read_slice(&self, offset: usize, size: usize) -> &[u8] {
        &self[offset..offset + size]
    }

    fn read(&self, offset: usize) -> U256 {
        U256::from(&self[offset..offset + 32])
    }

    fn write(&mut self, offset: usize, value: U256) {
        let mut bytes = [0u8; 32];
        value.to_big_endian(&mut bytes);
        self[offset..offset + 32].copy_from_slice(&bytes);
    }

    fn write_byte(&mut self, offset: usize, value: u8) {
        self[offset] = value;
    }

    fn write_slice(&mut self, offset: usize, data: &[u8]) {
        if !data.is_empty() {
            self[offset..offset + data.len()].copy_from_slice(data);
        }
    }

    fn writeable_slice(&mut self, offset: U256, size: U256) -> &mut [u8] {
        if size.is_zero() {
            return &mut [];
        }
        let offset = offset.low_u64() as usize;
        let size = size.low_u64() as usize;
        &mut self[offset..offset + size]
    }

    fn dump(&self) -> Vec<u8> {
        self.clone()
    }

    fn expand(&mut self, size: usize) {
        if size > self.len() {
            let new_size = to_word_size(size) * 32;
            self.resize(new_size, 0);
        }
    }

    fn into_return_data(mut self, offset: U256, size: U256) -> ReturnData {
        if size.is_zero() {
            return ReturnData::empty();
        }
        let offset = offset.low_u64() as usize;
        let size = size.low_u64() as usize;
        self.expand(offset + size);
        ReturnData::new(self, offset, size)
    }
}

/// Current and projected quadratic memory-expansion cost, per §4.1:
/// `words = ceil(size / 32)`, `cost = 3*words + words^2 / 512`.
pub fn expansion_gas_cost<Gas: crate::cost::CostType>(
    current_words: usize,
    new_size: usize,
) -> (Gas, usize) {
    let new_words = to_word_size(new_size);
    if new_words <= current_words {
        return (Gas::from_u256(U256::zero()).unwrap_or_else(|_| unreachable!()), current_words);
    }
    let cost = |words: usize| -> U256 {
        let words = U256::from(words);
        U256::from(3) * words + words * words / U256::from(512)
    };
    let delta = cost(new_words) - cost(current_words);
    (
        Gas::from_u256(delta).unwrap_or_else(|_| Gas::from_u256(U256::max_value()).unwrap()),
        new_words,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_rounds_up_to_word_boundary() {
        let mut mem: Vec<u8> = Vec::new();
        mem.expand(1);
        assert_eq!(mem.size(), 32);
        mem.expand(33);
        assert_eq!(mem.size(), 64);
    }

    #[test]
    fn no_expansion_cost_when_not_growing() {
        let (cost, words): (u64, usize) = expansion_gas_cost(2, 32);
        assert_eq!(cost, 0);
        assert_eq!(words, 2);
    }

    #[test]
    fn expansion_cost_is_quadratic() {
        let (cost, words): (u64, usize) = expansion_gas_cost(0, 32);
        assert_eq!(words, 1);
        assert_eq!(cost, 3);
    }
}
