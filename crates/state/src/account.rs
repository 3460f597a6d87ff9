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

//! Account record: `(nonce, balance, stateRoot, codeHash)` plus derived
//! `exists`, grounded on the RLP shape in `pod_account.rs::PodAccount::rlp`.

use ethereum_types::{H256, U256};
use rlp::{DecoderError, Rlp, RlpStream};

/// An account record as defined in spec §3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Number of transactions sent from this account (or, for contracts,
    /// the number of contracts it has created).
    pub nonce: u64,
    /// Wei balance.
    pub balance: U256,
    /// Root of this account's storage trie.
    pub storage_root: H256,
    /// keccak256 of this account's code; equals `empty_code_hash()` for a
    /// non-contract account.
    pub code_hash: H256,
    /// Whether this record has ever been materialized (vs. a synthesized
    /// placeholder for an address never touched).
    pub exists: bool,
}

impl Account {
    /// A brand-new account with zero balance/nonce and no code, as created
    /// implicitly the first time a transfer targets an unknown address.
    pub fn new_basic(balance: U256, nonce: u64) -> Account {
        Account {
            nonce,
            balance,
            storage_root: empty_storage_root(),
            code_hash: vm::empty_code_hash(),
            exists: true,
        }
    }

    /// The non-existent placeholder returned by `get_account` for an address
    /// that has never been touched.
    pub fn non_existent() -> Account {
        Account {
            nonce: 0,
            balance: U256::zero(),
            storage_root: empty_storage_root(),
            code_hash: vm::empty_code_hash(),
            exists: false,
        }
    }

    /// Account just created by CREATE, before code is deployed: balance may
    /// be non-zero (pre-funded), nonce is 1 (EIP-161 convention reused by
    /// the teacher's `new_contract`), code is empty until the init-code
    /// returns.
    pub fn new_contract(balance: U256) -> Account {
        Account {
            nonce: 1,
            balance,
            storage_root: empty_storage_root(),
            code_hash: vm::empty_code_hash(),
            exists: true,
        }
    }

    /// `nonce == 0 ∧ balance == 0 ∧ codeHash == keccak256("")` (§3, §9 Open Questions).
    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero() && self.code_hash == vm::empty_code_hash()
    }

    /// A contract account is one whose code hash differs from the empty-code hash.
    pub fn is_contract(&self) -> bool {
        self.code_hash != vm::empty_code_hash()
    }

    /// RLP-encode as `[nonce, balance, storageRoot, codeHash]`, matching the
    /// field order of `PodAccount::rlp`.
    pub fn rlp_bytes(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(4);
        stream.append(&self.nonce);
        stream.append(&self.balance);
        stream.append(&self.storage_root);
        stream.append(&self.code_hash);
        stream.out()
    }

    /// Inverse of `rlp_bytes`.
    pub fn decode(rlp: &Rlp) -> Result<Account, DecoderError> {
        if rlp.item_count()? != 4 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Account {
            nonce: rlp.val_at(0)?,
            balance: rlp.val_at(1)?,
            storage_root: rlp.val_at(2)?,
            code_hash: rlp.val_at(3)?,
            exists: true,
        })
    }
}

/// Root of an empty storage trie: the keccak256 of the RLP empty-list byte
/// `0x80`, the same sentinel used throughout the Merkle-Patricia-trie family
/// for "no entries".
pub fn empty_storage_root() -> H256 {
    keccak_hash::keccak(&rlp::NULL_RLP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_rlp() {
        let a = Account {
            nonce: 7,
            balance: U256::from(1_000_000u64),
            storage_root: keccak_hash::keccak(b"storage"),
            code_hash: keccak_hash::keccak(b"code"),
            exists: true,
        };
        let bytes = a.rlp_bytes();
        let rlp = Rlp::new(&bytes);
        let decoded = Account::decode(&rlp).unwrap();
        assert_eq!(a, decoded);
    }

    #[test]
    fn non_existent_is_empty() {
        assert!(Account::non_existent().is_empty());
    }

    #[test]
    fn funded_basic_account_is_not_empty() {
        let a = Account::new_basic(U256::from(1), 0);
        assert!(!a.is_empty());
    }
}
