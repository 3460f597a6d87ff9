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

//! Cost schedule and other parameterisations for the EVM.

/// Gas used in a transaction divided by this number is the maximum refundable amount.
pub const MAX_REFUND_QUOTIENT: usize = 2;

/// Definition of the cost schedule and other parameterisations for the EVM.
///
/// Pinned to the rules in force at the Homestead hard fork: no RETURNDATA
/// family, no CREATE2, no STATICCALL, no bitwise shifting, no CHAINID, no
/// SELFBALANCE, no EXTCODEHASH, no subroutines.
#[derive(Debug, Clone)]
pub struct Schedule {
    /// Does a failed CREATE still charge the deposit gas and keep the nonce bump.
    pub exceptional_failed_code_deposit: bool,
    /// Does it have a DELEGATECALL instruction.
    pub have_delegate_call: bool,
    /// VM stack limit.
    pub stack_limit: usize,
    /// Max number of nested calls/creates.
    pub max_depth: usize,
    /// Gas prices for instructions in all tiers.
    pub tier_step_gas: [usize; 8],
    /// Gas price for `EXP` opcode.
    pub exp_gas: usize,
    /// Additional gas for `EXP` opcode for each byte of exponent.
    pub exp_byte_gas: usize,
    /// Gas price for `SHA3` opcode.
    pub sha3_gas: usize,
    /// Additional gas for `SHA3` opcode for each word of hashed memory.
    pub sha3_word_gas: usize,
    /// Gas price for loading from storage.
    pub sload_gas: usize,
    /// Gas price for setting a new value into storage (`storage==0`, `new!=0`).
    pub sstore_set_gas: usize,
    /// Gas price for altering an existing value in storage.
    pub sstore_reset_gas: usize,
    /// Gas refund for `SSTORE` clearing (`storage!=0`, `new==0`).
    pub sstore_refund_gas: usize,
    /// Gas price for `JUMPDEST` opcode.
    pub jumpdest_gas: usize,
    /// Gas price for `LOG*`.
    pub log_gas: usize,
    /// Additional gas for data in `LOG*`.
    pub log_data_gas: usize,
    /// Additional gas for each topic in `LOG*`.
    pub log_topic_gas: usize,
    /// Gas price for `CREATE` opcode.
    pub create_gas: usize,
    /// Gas price for `*CALL*` opcodes.
    pub call_gas: usize,
    /// Stipend added to a child call's gas and the parent's budget when value is transferred.
    pub call_stipend: usize,
    /// Additional gas required for value transfer (`CALL`/`CALLCODE`).
    pub call_value_transfer_gas: usize,
    /// Additional gas for creating a new account via `CALL`/`CALLCODE`.
    pub call_new_account_gas: usize,
    /// Refund for `SELFDESTRUCT`.
    pub suicide_refund_gas: usize,
    /// Gas for used memory, first term of the quadratic memory cost.
    pub memory_gas: usize,
    /// Coefficient used to convert memory size to gas price for memory.
    pub quad_coeff_div: usize,
    /// Cost per byte of the returned code when executing `CREATE`.
    pub create_data_gas: usize,
    /// Maximum code size (and CREATE return-data size) accepted from a contract creation.
    pub create_data_limit: usize,
    /// Base transaction cost.
    pub tx_gas: usize,
    /// `CREATE` transaction cost.
    pub tx_create_gas: usize,
    /// Additional cost for a zero byte of transaction data.
    pub tx_data_zero_gas: usize,
    /// Additional cost for a non-zero byte of transaction data.
    pub tx_data_non_zero_gas: usize,
    /// Gas price for copying memory.
    pub copy_gas: usize,
    /// Price of `EXTCODESIZE`.
    pub extcodesize_gas: usize,
    /// Base price of `EXTCODECOPY`.
    pub extcodecopy_base_gas: usize,
    /// Price of `BALANCE`.
    pub balance_gas: usize,
    /// Price of `SELFDESTRUCT`.
    pub suicide_gas: usize,
    /// Additional gas to pay when `SELFDESTRUCT` credits a non-existent account.
    pub suicide_to_new_account_cost: usize,
    /// If `Some(x)`: a child call/create may be forwarded at most
    /// `gas_left - gas_left / x`; `None` disables the cap (all-or-nothing
    /// forwarding, pre-EIP-150 behavior).
    pub sub_gas_cap_divisor: Option<usize>,
    /// Blockhash instruction gas cost.
    pub blockhash_gas: usize,
    /// Maximum amount of gas refundable is `gas_used / max_refund_quotient`.
    pub max_refund_quotient: usize,
}

impl Schedule {
    /// Schedule for the Frontier-era of the Ethereum main net.
    pub fn new_frontier() -> Schedule {
        Self::new(false, false, 21000, None)
    }

    /// Schedule for the Homestead-era of the Ethereum main net, pinned per
    /// this crate's scope: Homestead's DELEGATECALL and failed-code-deposit
    /// rules, the EIP-150 63/64 gas-forwarding cap, and the EIP-170
    /// 24576-byte contract-size limit are all enabled together so that the
    /// three end-to-end behaviors named in scope (delegatecall, gas
    /// forwarding, oversize CREATE) are all exercised by a single schedule.
    pub fn new_homestead() -> Schedule {
        let mut schedule = Self::new(true, true, 53000, Some(64));
        schedule.create_data_limit = 24576;
        schedule
    }

    fn new(efcd: bool, hdc: bool, tcg: usize, sub_gas_cap_divisor: Option<usize>) -> Schedule {
        Schedule {
            exceptional_failed_code_deposit: efcd,
            have_delegate_call: hdc,
            stack_limit: 1024,
            max_depth: 1024,
            tier_step_gas: [0, 2, 3, 5, 8, 10, 20, 0],
            exp_gas: 10,
            exp_byte_gas: 10,
            sha3_gas: 30,
            sha3_word_gas: 6,
            sload_gas: 50,
            sstore_set_gas: 20000,
            sstore_reset_gas: 5000,
            sstore_refund_gas: 15000,
            jumpdest_gas: 1,
            log_gas: 375,
            log_data_gas: 8,
            log_topic_gas: 375,
            create_gas: 32000,
            call_gas: 40,
            call_stipend: 2300,
            call_value_transfer_gas: 9000,
            call_new_account_gas: 25000,
            suicide_refund_gas: 24000,
            memory_gas: 3,
            quad_coeff_div: 512,
            create_data_gas: 200,
            create_data_limit: usize::max_value(),
            tx_gas: 21000,
            tx_create_gas: tcg,
            tx_data_zero_gas: 4,
            tx_data_non_zero_gas: 68,
            copy_gas: 3,
            extcodesize_gas: 20,
            extcodecopy_base_gas: 20,
            balance_gas: 20,
            suicide_gas: 0,
            suicide_to_new_account_cost: 0,
            sub_gas_cap_divisor,
            blockhash_gas: 20,
            max_refund_quotient: MAX_REFUND_QUOTIENT,
        }
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Schedule::new_homestead()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_coeff_is_power_of_two() {
        let s1 = Schedule::new_frontier();
        let s2 = Schedule::new_homestead();
        assert_eq!(s1.quad_coeff_div, 512);
        assert_eq!(s2.quad_coeff_div, 512);
    }

    #[test]
    fn homestead_pins_create_limit_and_gas_cap() {
        let s = Schedule::new_homestead();
        assert_eq!(s.create_data_limit, 24576);
        assert_eq!(s.sub_gas_cap_divisor, Some(64));
        assert!(s.have_delegate_call);
    }
}
