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

//! Precompiled ("builtin") contracts at addresses `0x01`-`0x04` (§4.2).
//! Pinned to the four Frontier/Homestead builtins: no MODEXP (Byzantium),
//! no alt_bn128 pairing/add/mul (Byzantium), no BLAKE2F (Istanbul).

use ethereum_types::{Address, H160, U256};
use parity_bytes::BytesRef;
use ripemd160::Digest as _;
use sha2::Digest as _;

/// A precompiled contract: a fixed gas schedule plus its computation.
pub trait Builtin: Send + Sync {
    /// Gas cost of running this builtin against `input`.
    fn cost(&self, input: &[u8]) -> U256;

    /// Run the builtin, writing its result into `output`. Mirrors
    /// `vm::Ext`'s contract: a `Builtin` never itself runs out of gas —
    /// `cost` is always paid in full up front by the caller — but the
    /// *input* can still be malformed (ECRECOVER) or require an
    /// unsupported path, which this reports as an `Err`.
    fn execute(&self, input: &[u8], output: &mut BytesRef) -> Result<(), &'static str>;
}

/// Addresses `0x01`-`0x04`, in order: ECRECOVER, SHA256, RIPEMD160, IDENTITY.
pub const PRECOMPILE_ADDRESSES: [Address; 4] = [
    H160([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]),
    H160([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2]),
    H160([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3]),
    H160([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 4]),
];

/// Look up the builtin living at `address`, if any.
pub fn builtin_for(address: &Address) -> Option<Box<dyn Builtin>> {
    if *address == PRECOMPILE_ADDRESSES[0] {
        Some(Box::new(EcRecover))
    } else if *address == PRECOMPILE_ADDRESSES[1] {
        Some(Box::new(Sha256))
    } else if *address == PRECOMPILE_ADDRESSES[2] {
        Some(Box::new(Ripemd160))
    } else if *address == PRECOMPILE_ADDRESSES[3] {
        Some(Box::new(Identity))
    } else {
        None
    }
}

/// Number of 32-byte words `len` spans, rounding up.
fn words(len: usize) -> u64 {
    ((len as u64) + 31) / 32
}

/// `ECRECOVER`: recover the signer address from a hash and an
/// (r, s, v) signature. Input is `hash(32) || v(32) || r(32) || s(32)`;
/// output is the 20-byte address right-aligned in 32 bytes, or all-zero
/// if the signature does not recover.
pub struct EcRecover;

impl Builtin for EcRecover {
    fn cost(&self, _input: &[u8]) -> U256 {
        U256::from(3_000)
    }

    fn execute(&self, input: &[u8], output: &mut BytesRef) -> Result<(), &'static str> {
        let mut buf = [0u8; 128];
        let len = core::cmp::min(input.len(), 128);
        buf[..len].copy_from_slice(&input[..len]);

        let hash = &buf[0..32];
        let v = buf[63];
        let r = &buf[64..96];
        let s = &buf[96..128];

        let valid_v = buf[32..63].iter().all(|b| *b == 0) && (v == 27 || v == 28);
        if !valid_v {
            output.write(0, &[0u8; 32]);
            return Ok(());
        }

        let mut sig = [0u8; 65];
        sig[0..32].copy_from_slice(r);
        sig[32..64].copy_from_slice(s);
        sig[64] = v - 27;

        match recover_address(&sig, hash) {
            Some(address) => {
                let mut padded = [0u8; 32];
                padded[12..32].copy_from_slice(address.as_bytes());
                output.write(0, &padded);
            }
            None => {
                output.write(0, &[0u8; 32]);
            }
        }
        Ok(())
    }
}

fn recover_address(signature: &[u8; 65], message: &[u8]) -> Option<Address> {
    use parity_crypto::publickey::{public_to_address, recover, Message, Signature};
    let signature = Signature::from(*signature);
    let message = Message::from_slice(message);
    recover(&signature, &message)
        .ok()
        .map(|public| Address::from_slice(public_to_address(&public).as_bytes()))
}

/// `SHA256`: the plain SHA-2-256 digest, priced `60 + 12` gas per word.
pub struct Sha256;

impl Builtin for Sha256 {
    fn cost(&self, input: &[u8]) -> U256 {
        U256::from(60 + 12 * words(input.len()))
    }

    fn execute(&self, input: &[u8], output: &mut BytesRef) -> Result<(), &'static str> {
        let digest = sha2::Sha256::digest(input);
        output.write(0, &digest);
        Ok(())
    }
}

/// `RIPEMD160`: the digest, left-padded to 32 bytes, priced `600 + 120`
/// gas per word.
pub struct Ripemd160;

impl Builtin for Ripemd160 {
    fn cost(&self, input: &[u8]) -> U256 {
        U256::from(600 + 120 * words(input.len()))
    }

    fn execute(&self, input: &[u8], output: &mut BytesRef) -> Result<(), &'static str> {
        let digest = ripemd160::Ripemd160::digest(input);
        let mut padded = [0u8; 32];
        padded[12..32].copy_from_slice(&digest);
        output.write(0, &padded);
        Ok(())
    }
}

/// `IDENTITY`: copies input to output unchanged, priced `15 + 3` gas per
/// word.
pub struct Identity;

impl Builtin for Identity {
    fn cost(&self, input: &[u8]) -> U256 {
        U256::from(15 + 3 * words(input.len()))
    }

    fn execute(&self, input: &[u8], output: &mut BytesRef) -> Result<(), &'static str> {
        output.write(0, input);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_copies_input() {
        let identity = Identity;
        let input = b"hello world";
        let mut out = vec![0u8; input.len()];
        identity.execute(input, &mut BytesRef::Fixed(&mut out)).unwrap();
        assert_eq!(&out[..], &input[..]);
    }

    #[test]
    fn identity_cost_is_linear_in_words() {
        let identity = Identity;
        assert_eq!(identity.cost(&[]), U256::from(15));
        assert_eq!(identity.cost(&[0u8; 32]), U256::from(18));
        assert_eq!(identity.cost(&[0u8; 33]), U256::from(21));
    }

    #[test]
    fn sha256_matches_known_vector() {
        let sha256 = Sha256;
        let mut out = vec![0u8; 32];
        sha256.execute(b"", &mut BytesRef::Fixed(&mut out)).unwrap();
        // SHA-256 of the empty string, FIPS 180-4 test vector.
        assert_eq!(
            hex(&out),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn ripemd160_pads_digest_to_32_bytes() {
        let ripemd = Ripemd160;
        let mut out = vec![0u8; 32];
        ripemd.execute(b"", &mut BytesRef::Fixed(&mut out)).unwrap();
        assert_eq!(&out[0..12], &[0u8; 12]);
    }

    #[test]
    fn ecrecover_rejects_malformed_v() {
        let ec = EcRecover;
        let input = vec![0u8; 128]; // v=0, neither 27 nor 28
        let mut out = vec![0u8; 32];
        ec.execute(&input, &mut BytesRef::Fixed(&mut out)).unwrap();
        assert_eq!(&out[..], &[0u8; 32][..]);
    }

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}
