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

//! 2048-bit logs bloom filter (§4.5). No production source for this exists
//! in the teacher's pack (`crates/db/bloom` ships only a `Cargo.toml`), so
//! the algorithm here follows `spec.md` literally, including the §9 Open
//! Question fix to the `or` bound (`i < 256`, not the source's `i <= 256`
//! off-by-one).

use ethereum_types::{Address, H256};

const BYTE_SIZE: usize = 256;
const MASK: u32 = 0x7FF;

/// A 2048-bit (256-byte) Bloom filter over keccak256-hashed entries.
#[derive(Clone, PartialEq, Eq)]
pub struct Bloom([u8; BYTE_SIZE]);

impl Default for Bloom {
    fn default() -> Self {
        Bloom([0u8; BYTE_SIZE])
    }
}

impl Bloom {
    /// An all-zero filter.
    pub fn new() -> Self {
        Bloom::default()
    }

    /// Raw 256-byte representation.
    pub fn as_bytes(&self) -> &[u8; BYTE_SIZE] {
        &self.0
    }

    /// Hash `entry` with keccak-256 and set the three bits it selects.
    pub fn add(&mut self, entry: &[u8]) {
        let hash = keccak_hash::keccak(entry);
        for i in [0usize, 2, 4] {
            let slice = (u32::from(hash[i]) << 8 | u32::from(hash[i + 1])) & MASK;
            self.set_bit(slice as usize);
        }
    }

    fn set_bit(&mut self, slice: usize) {
        let byte_index = BYTE_SIZE - (slice >> 3) - 1;
        let bit = 1u8 << (slice % 8);
        self.0[byte_index] |= bit;
    }

    fn bit_set(&self, slice: usize) -> bool {
        let byte_index = BYTE_SIZE - (slice >> 3) - 1;
        let bit = 1u8 << (slice % 8);
        self.0[byte_index] & bit != 0
    }

    /// True if `entry` may be a member (false positives possible, false
    /// negatives impossible).
    pub fn check(&self, entry: &[u8]) -> bool {
        let hash = keccak_hash::keccak(entry);
        [0usize, 2, 4].iter().all(|&i| {
            let slice = (u32::from(hash[i]) << 8 | u32::from(hash[i + 1])) & MASK;
            self.bit_set(slice as usize)
        })
    }

    /// Byte-wise OR with `other`. Bound is `i < 256` — the source this spec
    /// was distilled from iterates `i <= byteSize`, an off-by-one
    /// out-of-bounds access; treated as a bug per §9.
    pub fn or(&mut self, other: &Bloom) {
        for i in 0..BYTE_SIZE {
            self.0[i] |= other.0[i];
        }
    }

    /// Address and topics of one log entry, folded into this filter (§4.5:
    /// "each of which ORs the contract address and all topics").
    pub fn accrue_log(&mut self, address: &Address, topics: &[H256]) {
        self.add(address.as_bytes());
        for topic in topics {
            self.add(topic.as_bytes());
        }
    }
}

impl std::fmt::Debug for Bloom {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Bloom(0x{})", rustc_hex_fmt(&self.0))
    }
}

fn rustc_hex_fmt(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_check_is_true() {
        let mut b = Bloom::new();
        b.add(b"hello");
        assert!(b.check(b"hello"));
    }

    #[test]
    fn unrelated_entry_usually_absent() {
        let mut b = Bloom::new();
        b.add(b"hello");
        assert!(!b.check(b"completely-different-entry-that-should-not-collide"));
    }

    #[test]
    fn or_is_union() {
        let mut a = Bloom::new();
        a.add(b"alpha");
        let mut c = Bloom::new();
        c.add(b"charlie");
        let mut unioned = a.clone();
        unioned.or(&c);
        assert!(unioned.check(b"alpha"));
        assert!(unioned.check(b"charlie"));
    }
}
